//! Applicant measurements submitted to the premium predictor.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::features::{self, DerivedFeatures};
use super::validation::{
    as_object, check_age, parse_bool, parse_float, parse_int, parse_string, required,
    ValidationError, Violations,
};

/// Occupation categories known to the premium model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Occupation {
    Retired,
    Freelancer,
    Student,
    GovernmentJob,
    #[serde(alias = "bussiness_owner")]
    BusinessOwner,
    Unemployed,
    PrivateJob,
}

impl Occupation {
    /// Every occupation, in form display order.
    pub const ALL: [Occupation; 7] = [
        Self::Retired,
        Self::Freelancer,
        Self::Student,
        Self::GovernmentJob,
        Self::BusinessOwner,
        Self::Unemployed,
        Self::PrivateJob,
    ];

    /// Wire name of the occupation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Retired => "retired",
            Self::Freelancer => "freelancer",
            Self::Student => "student",
            Self::GovernmentJob => "government_job",
            Self::BusinessOwner => "business_owner",
            Self::Unemployed => "unemployed",
            Self::PrivateJob => "private_job",
        }
    }

    /// Display label used by the web form.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Retired => "Retired",
            Self::Freelancer => "Freelancer",
            Self::Student => "Student",
            Self::GovernmentJob => "Government Job",
            Self::BusinessOwner => "Business Owner",
            Self::Unemployed => "Unemployed",
            Self::PrivateJob => "Private Job",
        }
    }

    /// Parse a wire name. The legacy `bussiness_owner` spelling is accepted.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "bussiness_owner" => Some(Self::BusinessOwner),
            _ => Self::ALL.iter().copied().find(|o| o.as_str() == s),
        }
    }
}

impl std::fmt::Display for Occupation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated applicant, alive for the duration of one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserMeasurement {
    /// Age in whole years, 1..=119
    pub age: u32,
    /// Weight in kilograms
    pub weight: f64,
    /// Height in meters, at most 2.5
    pub height: f64,
    pub smoker: bool,
    /// Trimmed, title-cased city name
    pub city: String,
    pub occupation: Occupation,
    /// Annual income in lakhs per annum
    pub income_lpa: f64,
}

const MAX_HEIGHT_M: f64 = 2.5;

impl UserMeasurement {
    /// Validate a raw JSON body.
    ///
    /// Every field is checked even after a failure, so the error lists all
    /// violated constraints.
    ///
    /// # Errors
    /// Returns [`ValidationError`] if any field is missing, mistyped or out of range.
    pub fn from_json(body: &Value) -> Result<Self, ValidationError> {
        let obj = as_object(body)?;
        let mut violations = Violations::default();

        let age = required(obj, "age", &mut violations)
            .and_then(|v| violations.check("age", parse_int(v).and_then(check_age)));

        let weight = required(obj, "weight", &mut violations).and_then(|v| {
            violations.check(
                "weight",
                parse_float(v).and_then(|w| {
                    if w > 0.0 {
                        Ok(w)
                    } else {
                        Err("must be greater than 0".to_string())
                    }
                }),
            )
        });

        let height = required(obj, "height", &mut violations).and_then(|v| {
            violations.check(
                "height",
                parse_float(v).and_then(|h| {
                    if h > 0.0 && h <= MAX_HEIGHT_M {
                        Ok(h)
                    } else {
                        Err(format!("must be greater than 0 and at most {MAX_HEIGHT_M}"))
                    }
                }),
            )
        });

        let smoker = required(obj, "smoker", &mut violations)
            .and_then(|v| violations.check("smoker", parse_bool(v)));

        let city = required(obj, "city", &mut violations).and_then(|v| {
            violations.check(
                "city",
                parse_string(v).and_then(|c| {
                    let city = normalize_city(&c);
                    if city.is_empty() {
                        Err("must not be empty".to_string())
                    } else {
                        Ok(city)
                    }
                }),
            )
        });

        let occupation = required(obj, "occupation", &mut violations).and_then(|v| {
            violations.check(
                "occupation",
                parse_string(v).and_then(|s| {
                    Occupation::parse(&s).ok_or_else(|| {
                        let allowed: Vec<&str> =
                            Occupation::ALL.iter().map(Occupation::as_str).collect();
                        format!("must be one of: {}", allowed.join(", "))
                    })
                }),
            )
        });

        let income_lpa = required(obj, "income_lpa", &mut violations).and_then(|v| {
            violations.check(
                "income_lpa",
                parse_float(v).and_then(|i| {
                    if i >= 0.0 {
                        Ok(i)
                    } else {
                        Err("must be greater than or equal to 0".to_string())
                    }
                }),
            )
        });

        match (age, weight, height, smoker, city, occupation, income_lpa) {
            (
                Some(age),
                Some(weight),
                Some(height),
                Some(smoker),
                Some(city),
                Some(occupation),
                Some(income_lpa),
            ) if violations.is_empty() => Ok(Self {
                age,
                weight,
                height,
                smoker,
                city,
                occupation,
                income_lpa,
            }),
            _ => Err(violations.into_error()),
        }
    }

    /// Compute the derived model features.
    #[must_use]
    pub fn derive(&self) -> DerivedFeatures {
        features::derive(self)
    }
}

/// City normalization applied once before tier lookup.
#[must_use]
pub fn normalize_city(raw: &str) -> String {
    title_case(raw)
}

/// Trim surrounding whitespace and title-case each word.
///
/// A letter is upper-cased when it follows a non-letter, lower-cased otherwise,
/// so `"  new DELHI "` becomes `"New Delhi"`.
#[must_use]
pub fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_is_letter = false;
    for ch in raw.trim().chars() {
        if ch.is_alphabetic() {
            if prev_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(ch);
            prev_is_letter = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_body() -> Value {
        json!({
            "age": 29,
            "weight": 83,
            "height": 1.72,
            "smoker": true,
            "city": "Delhi",
            "occupation": "private_job",
            "income_lpa": 12
        })
    }

    #[test]
    fn test_valid_measurement() {
        let m = UserMeasurement::from_json(&valid_body()).expect("Should validate");
        assert_eq!(m.age, 29);
        assert!((m.weight - 83.0).abs() < f64::EPSILON);
        assert!(m.smoker);
        assert_eq!(m.city, "Delhi");
        assert_eq!(m.occupation, Occupation::PrivateJob);
    }

    #[test]
    fn test_city_is_normalized() {
        let mut body = valid_body();
        body["city"] = json!("  new DELHI ");
        let m = UserMeasurement::from_json(&body).expect("Should validate");
        assert_eq!(m.city, "New Delhi");

        assert_eq!(normalize_city("mumbai "), "Mumbai");
        assert_eq!(normalize_city("TIRUCHIRAPPALLI"), "Tiruchirappalli");
        assert_eq!(normalize_city("o'brien-town"), "O'Brien-Town");
    }

    #[test]
    fn test_reports_every_violation() {
        let body = json!({
            "age": 0,
            "weight": -3,
            "height": 2.6,
            "smoker": "sometimes",
            "city": "   ",
            "occupation": "astronaut"
        });
        let err = UserMeasurement::from_json(&body).expect_err("Should reject");
        assert_eq!(
            err.fields(),
            vec![
                "age",
                "weight",
                "height",
                "smoker",
                "city",
                "occupation",
                "income_lpa"
            ]
        );
    }

    #[test]
    fn test_age_bounds_are_exclusive() {
        for (age, ok) in [(0, false), (1, true), (119, true), (120, false)] {
            let mut body = valid_body();
            body["age"] = json!(age);
            assert_eq!(UserMeasurement::from_json(&body).is_ok(), ok, "age {age}");
        }
    }

    #[test]
    fn test_height_upper_bound_is_inclusive() {
        let mut body = valid_body();
        body["height"] = json!(2.5);
        assert!(UserMeasurement::from_json(&body).is_ok());
        body["height"] = json!(0);
        let err = UserMeasurement::from_json(&body).expect_err("Should reject");
        assert!(err.has_field("height"));
    }

    #[test]
    fn test_negative_income_rejected() {
        let mut body = valid_body();
        body["income_lpa"] = json!(-1.0);
        let err = UserMeasurement::from_json(&body).expect_err("Should reject");
        assert_eq!(err.fields(), vec!["income_lpa"]);
    }

    #[test]
    fn test_smoker_accepts_tokens() {
        let mut body = valid_body();
        body["smoker"] = json!("No");
        let m = UserMeasurement::from_json(&body).expect("Should validate");
        assert!(!m.smoker);
    }

    #[test]
    fn test_legacy_occupation_spelling() {
        let mut body = valid_body();
        body["occupation"] = json!("bussiness_owner");
        let m = UserMeasurement::from_json(&body).expect("Should validate");
        assert_eq!(m.occupation, Occupation::BusinessOwner);
        assert_eq!(m.occupation.as_str(), "business_owner");
    }

    #[test]
    fn test_non_object_body() {
        let err = UserMeasurement::from_json(&json!([1, 2])).expect_err("Should reject");
        assert_eq!(err.fields(), vec!["body"]);
    }
}
