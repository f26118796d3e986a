//! Patient records managed by the record store.
//!
//! The stored form omits the id (it is the collection key). BMI and verdict
//! are always recomputed from height and weight, never trusted from input.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::validation::{
    as_object, check_age, optional, parse_float, parse_int, parse_string, required,
    ValidationError, Violations,
};

/// Patient gender as accepted by the record API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Others,
}

impl Gender {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Male" => Some(Self::Male),
            "Female" => Some(Self::Female),
            "Others" => Some(Self::Others),
            _ => None,
        }
    }
}

/// Health verdict derived from the rounded BMI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl Verdict {
    #[must_use]
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            Self::Underweight
        } else if bmi < 25.0 {
            Self::Normal
        } else if bmi < 30.0 {
            Self::Overweight
        } else {
            Self::Obese
        }
    }
}

/// Stored patient fields.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(into = "PatientView")]
pub struct PatientRecord {
    pub name: String,
    pub city: String,
    /// Age in years, 1..=119
    pub age: u32,
    pub gender: Gender,
    /// Height in meters
    pub height: f64,
    /// Weight in kilograms
    pub weight: f64,
}

/// Serialized form of a record: stored fields plus computed health metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientView {
    pub name: String,
    pub city: String,
    pub age: u32,
    pub gender: Gender,
    pub height: f64,
    pub weight: f64,
    pub bmi: f64,
    pub verdict: Verdict,
}

impl From<PatientRecord> for PatientView {
    fn from(r: PatientRecord) -> Self {
        let bmi = r.bmi();
        Self {
            name: r.name,
            city: r.city,
            age: r.age,
            gender: r.gender,
            height: r.height,
            weight: r.weight,
            bmi,
            verdict: Verdict::from_bmi(bmi),
        }
    }
}

impl PatientRecord {
    /// BMI rounded to two decimals.
    #[must_use]
    pub fn bmi(&self) -> f64 {
        let raw = self.weight / (self.height * self.height);
        (raw * 100.0).round() / 100.0
    }

    #[must_use]
    pub fn verdict(&self) -> Verdict {
        Verdict::from_bmi(self.bmi())
    }

    /// Value of a sortable field.
    #[must_use]
    pub fn sort_key(&self, field: SortField) -> f64 {
        match field {
            SortField::Height => self.height,
            SortField::Weight => self.weight,
            SortField::Bmi => self.bmi(),
        }
    }

    /// Check range constraints on an already-typed record.
    ///
    /// # Errors
    /// Returns every violated constraint.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut violations = Violations::default();
        violations.check("age", check_age(i64::from(self.age)));
        violations.check("height", check_positive(self.height));
        violations.check("weight", check_positive(self.weight));
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations.into_error())
        }
    }
}

/// A patient submitted for creation: id plus the stored fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Patient {
    pub id: String,
    pub record: PatientRecord,
}

impl Patient {
    /// Validate a create body.
    ///
    /// # Errors
    /// Returns every missing, mistyped or out-of-range field.
    pub fn from_json(body: &Value) -> Result<Self, ValidationError> {
        let obj = as_object(body)?;
        let mut violations = Violations::default();

        let id = required(obj, "id", &mut violations).and_then(|v| {
            violations.check(
                "id",
                parse_string(v).and_then(|s| {
                    let id = s.trim().to_string();
                    if id.is_empty() {
                        Err("must not be empty".to_string())
                    } else {
                        Ok(id)
                    }
                }),
            )
        });
        let name = required(obj, "name", &mut violations)
            .and_then(|v| violations.check("name", parse_string(v)));
        let city = required(obj, "city", &mut violations)
            .and_then(|v| violations.check("city", parse_string(v)));
        let age = required(obj, "age", &mut violations)
            .and_then(|v| violations.check("age", parse_int(v).and_then(check_age)));
        let gender = required(obj, "gender", &mut violations)
            .and_then(|v| violations.check("gender", parse_gender(v)));
        let height = required(obj, "height", &mut violations)
            .and_then(|v| violations.check("height", parse_float(v).and_then(check_positive)));
        let weight = required(obj, "weight", &mut violations)
            .and_then(|v| violations.check("weight", parse_float(v).and_then(check_positive)));

        match (id, name, city, age, gender, height, weight) {
            (
                Some(id),
                Some(name),
                Some(city),
                Some(age),
                Some(gender),
                Some(height),
                Some(weight),
            ) if violations.is_empty() => Ok(Self {
                id,
                record: PatientRecord {
                    name,
                    city,
                    age,
                    gender,
                    height,
                    weight,
                },
            }),
            _ => Err(violations.into_error()),
        }
    }
}

/// Partial update: only supplied fields are merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientUpdate {
    pub name: Option<String>,
    pub city: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
}

impl PatientUpdate {
    /// Parse an edit body. Absent and null fields are left unset; an `id`
    /// field is ignored since the path names the record.
    ///
    /// # Errors
    /// Returns every supplied field that is mistyped or out of range.
    pub fn from_json(body: &Value) -> Result<Self, ValidationError> {
        let obj = as_object(body)?;
        let mut violations = Violations::default();

        let name = optional(obj, "name").and_then(|v| violations.check("name", parse_string(v)));
        let city = optional(obj, "city").and_then(|v| violations.check("city", parse_string(v)));
        let age = optional(obj, "age")
            .and_then(|v| violations.check("age", parse_int(v).and_then(check_age)));
        let gender =
            optional(obj, "gender").and_then(|v| violations.check("gender", parse_gender(v)));
        let height = optional(obj, "height")
            .and_then(|v| violations.check("height", parse_float(v).and_then(check_positive)));
        let weight = optional(obj, "weight")
            .and_then(|v| violations.check("weight", parse_float(v).and_then(check_positive)));

        if !violations.is_empty() {
            return Err(violations.into_error());
        }
        Ok(Self {
            name,
            city,
            age,
            gender,
            height,
            weight,
        })
    }

    /// Whether no field was supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge supplied fields over `existing`.
    #[must_use]
    pub fn apply(&self, existing: &PatientRecord) -> PatientRecord {
        PatientRecord {
            name: self.name.clone().unwrap_or_else(|| existing.name.clone()),
            city: self.city.clone().unwrap_or_else(|| existing.city.clone()),
            age: self.age.unwrap_or(existing.age),
            gender: self.gender.unwrap_or(existing.gender),
            height: self.height.unwrap_or(existing.height),
            weight: self.weight.unwrap_or(existing.weight),
        }
    }
}

/// Fields the record list can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Height,
    Weight,
    Bmi,
}

impl SortField {
    pub const NAMES: [&'static str; 3] = ["height", "weight", "bmi"];

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "height" => Some(Self::Height),
            "weight" => Some(Self::Weight),
            "bmi" => Some(Self::Bmi),
            _ => None,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

fn check_positive(x: f64) -> Result<f64, String> {
    if x > 0.0 {
        Ok(x)
    } else {
        Err("must be greater than 0".to_string())
    }
}

fn parse_gender(v: &Value) -> Result<Gender, String> {
    parse_string(v).and_then(|s| {
        Gender::parse(&s).ok_or_else(|| "must be one of: Male, Female, Others".to_string())
    })
}
