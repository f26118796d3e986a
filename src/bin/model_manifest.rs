//! Manifest utility for Healthquote model artifacts.
//!
//! Writes `manifest.json` next to the model files, binding each file name to
//! its SHA-256 digest so the prediction API refuses a tampered artifact.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin model_manifest -- <model_dir | model_file> [--file <name>]...
//! ```
//!
//! Without `--file`, every `*.json` in the directory except the manifest
//! itself is bound.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use healthquote::adapters::linear::{sha256_hex, ModelManifest, MANIFEST_FILE};

fn usage() -> String {
    "Usage: model_manifest <model_dir | model_file> [--file <name>]...".to_string()
}

fn parse_args() -> Result<(PathBuf, Vec<String>)> {
    let mut args = env::args().skip(1);
    let mut target: Option<PathBuf> = None;
    let mut files = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--file" => {
                let v = args.next().with_context(usage)?;
                files.push(v);
            }
            "-h" | "--help" => bail!(usage()),
            _ => {
                if target.is_none() {
                    target = Some(PathBuf::from(arg));
                } else {
                    bail!(usage());
                }
            }
        }
    }

    let target = target.with_context(usage)?;
    Ok((target, files))
}

fn discover(model_dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(model_dir).with_context(|| format!("Failed to list {model_dir:?}"))? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if path.is_file() && name.ends_with(".json") && name != MANIFEST_FILE {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

fn main() -> Result<()> {
    let (target, mut names) = parse_args()?;

    let model_dir = if target.is_file() {
        let name = target
            .file_name()
            .and_then(|n| n.to_str())
            .context("Model path has no file name")?;
        names.push(name.to_string());
        target
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf()
    } else {
        target
    };

    if names.is_empty() {
        names = discover(&model_dir)?;
    }
    if names.is_empty() {
        bail!("No model JSON found in {model_dir:?}");
    }

    let mut files = BTreeMap::new();
    for name in names {
        let path = model_dir.join(&name);
        let bytes = fs::read(&path).with_context(|| format!("Failed to read {path:?}"))?;
        files.insert(name, sha256_hex(&bytes));
    }

    let manifest = ModelManifest { version: 1, files };
    let manifest_bytes =
        serde_json::to_vec_pretty(&manifest).context("Failed to serialize manifest.json")?;

    let manifest_path = model_dir.join(MANIFEST_FILE);
    fs::write(&manifest_path, &manifest_bytes)
        .with_context(|| format!("Failed to write {manifest_path:?}"))?;

    println!("Wrote manifest: {manifest_path:?}");
    for (name, digest) in &manifest.files {
        println!("  {name}  {digest}");
    }
    Ok(())
}
