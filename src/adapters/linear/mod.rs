//! Linear classifier adapter: Implementation of PremiumClassifier.
//!
//! Loads a multinomial logistic model exported as JSON and scores one
//! feature row per call.
//!
//! # Encoding
//!
//! Numeric columns are standardized as `(x - mean) / scale` in declaration
//! order, followed by one one-hot block per categorical column. A category the
//! model has never seen encodes to all zeros. Class scores `W·x + b` are turned
//! into probabilities with a max-shifted softmax; the label is the first class
//! with the highest probability.
//!
//! # Integrity
//!
//! When a `manifest.json` sits next to the artifact, the artifact must be
//! listed in it and its SHA-256 digest must match. Without a manifest the model
//! loads with a warning. `cargo run --bin model_manifest -- <model.json>`
//! writes the manifest.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{FeatureRow, Prediction};
use crate::ports::{GatewayError, PremiumClassifier};

/// File name of the integrity manifest.
pub const MANIFEST_FILE: &str = "manifest.json";

const NUMERIC_COLUMNS: [&str; 3] = ["bmi", "city_tier", "income_lpa"];
const CATEGORICAL_COLUMNS: [&str; 3] = ["age_group", "lifestyle_risk", "occupation"];

/// A standardized numeric input column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericFeature {
    pub name: String,
    pub mean: f64,
    pub scale: f64,
}

/// A one-hot encoded input column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalFeature {
    pub name: String,
    pub categories: Vec<String>,
}

/// Model parameters exported by the training pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedLinearModel {
    pub model_version: String,
    pub classes: Vec<String>,
    pub numeric_features: Vec<NumericFeature>,
    pub categorical_features: Vec<CategoricalFeature>,
    /// One row per class, one column per encoded feature
    pub coefficients: Vec<Vec<f64>>,
    /// One intercept per class
    pub intercepts: Vec<f64>,
}

impl ExportedLinearModel {
    /// Width of the encoded feature vector.
    #[must_use]
    pub fn encoded_width(&self) -> usize {
        self.numeric_features.len()
            + self
                .categorical_features
                .iter()
                .map(|c| c.categories.len())
                .sum::<usize>()
    }

    /// Structural checks run once at load time.
    ///
    /// # Errors
    /// Returns `GatewayError::Artifact` describing the first problem found.
    pub fn validate(&self) -> Result<(), GatewayError> {
        let bad = |msg: String| Err(GatewayError::Artifact(msg));

        if self.classes.len() < 2 {
            return bad(format!("need at least 2 classes, got {}", self.classes.len()));
        }
        let unique: HashSet<&str> = self.classes.iter().map(String::as_str).collect();
        if unique.len() != self.classes.len() {
            return bad("duplicate class labels".into());
        }

        let mut seen = HashSet::new();
        for f in &self.numeric_features {
            if !NUMERIC_COLUMNS.contains(&f.name.as_str()) {
                return bad(format!("unknown numeric column {:?}", f.name));
            }
            if !seen.insert(f.name.as_str()) {
                return bad(format!("column {:?} declared twice", f.name));
            }
            if !f.mean.is_finite() || !f.scale.is_finite() || f.scale == 0.0 {
                return bad(format!("column {:?} has an invalid mean/scale", f.name));
            }
        }
        for f in &self.categorical_features {
            if !CATEGORICAL_COLUMNS.contains(&f.name.as_str()) {
                return bad(format!("unknown categorical column {:?}", f.name));
            }
            if !seen.insert(f.name.as_str()) {
                return bad(format!("column {:?} declared twice", f.name));
            }
            if f.categories.is_empty() {
                return bad(format!("column {:?} has no categories", f.name));
            }
        }
        if seen.is_empty() {
            return bad("model declares no input columns".into());
        }

        let width = self.encoded_width();
        if self.coefficients.len() != self.classes.len() {
            return bad(format!(
                "expected {} coefficient rows, got {}",
                self.classes.len(),
                self.coefficients.len()
            ));
        }
        if let Some(row) = self.coefficients.iter().find(|r| r.len() != width) {
            return bad(format!(
                "coefficient row has {} entries, encoded width is {width}",
                row.len()
            ));
        }
        if self.intercepts.len() != self.classes.len() {
            return bad(format!(
                "expected {} intercepts, got {}",
                self.classes.len(),
                self.intercepts.len()
            ));
        }
        let all_finite = self
            .coefficients
            .iter()
            .flatten()
            .chain(self.intercepts.iter())
            .all(|w| w.is_finite());
        if !all_finite {
            return bad("non-finite weight".into());
        }
        Ok(())
    }
}

/// Integrity manifest: artifact file name → SHA-256 hex digest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelManifest {
    pub version: u32,
    pub files: BTreeMap<String, String>,
}

/// Lower-case hex SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Linear premium classifier.
pub struct LinearClassifier {
    model: Option<ExportedLinearModel>,
}

impl LinearClassifier {
    /// Create an adapter with no model loaded.
    #[must_use]
    pub fn new() -> Self {
        Self { model: None }
    }

    /// Build a classifier from in-memory parameters.
    ///
    /// # Errors
    /// Returns error if the parameters are structurally invalid.
    pub fn from_model(model: ExportedLinearModel) -> Result<Self, GatewayError> {
        model.validate()?;
        Ok(Self { model: Some(model) })
    }

    /// Load the model artifact at `path`, verifying it against a sibling
    /// manifest when one exists.
    ///
    /// # Errors
    /// Returns error if the file is missing, unparsable, structurally invalid,
    /// or fails the manifest check.
    pub fn load_model(&mut self, path: &Path) -> Result<(), GatewayError> {
        let bytes = fs::read(path)
            .map_err(|e| GatewayError::Artifact(format!("cannot read {}: {e}", path.display())))?;

        Self::verify_manifest(path, &bytes)?;

        let model: ExportedLinearModel = serde_json::from_slice(&bytes)
            .map_err(|e| GatewayError::Artifact(format!("invalid model JSON: {e}")))?;
        model.validate()?;

        tracing::info!(
            "Loaded model {:?} (version={}, classes={}, encoded_width={})",
            path,
            model.model_version,
            model.classes.len(),
            model.encoded_width()
        );

        self.model = Some(model);
        Ok(())
    }

    fn manifest_path(path: &Path) -> PathBuf {
        path.parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .join(MANIFEST_FILE)
    }

    fn verify_manifest(path: &Path, bytes: &[u8]) -> Result<(), GatewayError> {
        let manifest_path = Self::manifest_path(path);
        if !manifest_path.exists() {
            tracing::warn!(
                "No {MANIFEST_FILE} next to {:?}; loading model without integrity check",
                path
            );
            return Ok(());
        }

        let content = fs::read(&manifest_path)
            .map_err(|e| GatewayError::Integrity(format!("cannot read manifest: {e}")))?;
        let manifest: ModelManifest = serde_json::from_slice(&content)
            .map_err(|e| GatewayError::Integrity(format!("invalid manifest: {e}")))?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| GatewayError::Integrity("artifact path has no file name".into()))?;
        let expected = manifest.files.get(file_name).ok_or_else(|| {
            GatewayError::Integrity(format!("{file_name} is not listed in {MANIFEST_FILE}"))
        })?;

        let actual = sha256_hex(bytes);
        if !expected.eq_ignore_ascii_case(&actual) {
            return Err(GatewayError::Integrity(format!(
                "digest mismatch for {file_name}"
            )));
        }
        tracing::debug!("Model digest verified against {:?}", manifest_path);
        Ok(())
    }

    fn encode(model: &ExportedLinearModel, row: &FeatureRow) -> Result<Vec<f64>, GatewayError> {
        let mut x = Vec::with_capacity(model.encoded_width());
        for f in &model.numeric_features {
            let value = row.numeric(&f.name).ok_or_else(|| {
                GatewayError::Inference(format!("feature row has no numeric column {:?}", f.name))
            })?;
            x.push((value - f.mean) / f.scale);
        }
        for f in &model.categorical_features {
            let value = row.categorical(&f.name).ok_or_else(|| {
                GatewayError::Inference(format!(
                    "feature row has no categorical column {:?}",
                    f.name
                ))
            })?;
            x.extend(
                f.categories
                    .iter()
                    .map(|c| if c == value { 1.0 } else { 0.0 }),
            );
        }
        Ok(x)
    }

    /// Softmax with the max score subtracted first.
    fn softmax(scores: &[f64]) -> Vec<f64> {
        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
        let total: f64 = exps.iter().sum();
        exps.into_iter().map(|e| e / total).collect()
    }
}

impl Default for LinearClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl PremiumClassifier for LinearClassifier {
    fn predict(&self, row: &FeatureRow) -> Result<Prediction, GatewayError> {
        let model = self.model.as_ref().ok_or(GatewayError::NotLoaded)?;
        let x = Self::encode(model, row)?;

        let scores: Vec<f64> = model
            .coefficients
            .iter()
            .zip(&model.intercepts)
            .map(|(weights, b)| weights.iter().zip(&x).map(|(w, v)| w * v).sum::<f64>() + b)
            .collect();
        if scores.iter().any(|s| !s.is_finite()) {
            return Err(GatewayError::Inference("non-finite class score".into()));
        }

        let probs = Self::softmax(&scores);
        let mut best = 0;
        for (i, p) in probs.iter().enumerate() {
            if *p > probs[best] {
                best = i;
            }
        }

        let probabilities = model.classes.iter().cloned().zip(probs).collect();
        Ok(Prediction {
            predicted_category: model.classes[best].clone(),
            probabilities: Some(probabilities),
        })
    }

    fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    fn model_version(&self) -> &str {
        self.model
            .as_ref()
            .map(|m| m.model_version.as_str())
            .unwrap_or("unloaded")
    }
}
