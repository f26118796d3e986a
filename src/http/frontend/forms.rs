//! Submitted HTML forms and their field checks.
//!
//! Every field arrives as a string so a bad value can be echoed back into the
//! re-rendered form.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::domain::Occupation;

/// Per-field error messages, in form order.
pub type FormErrors = Vec<(&'static str, String)>;

const REQUIRED: &str = "This field is required.";
const NOT_A_CHOICE: &str = "Not a valid choice.";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
}

impl LoginForm {
    /// Username between 3 and 50 characters after trimming.
    ///
    /// # Errors
    /// Returns the field error to display.
    pub fn validate(&self) -> Result<String, FormErrors> {
        let username = self.username.trim();
        let len = username.chars().count();
        if username.is_empty() {
            return Err(vec![("username", REQUIRED.to_string())]);
        }
        if !(3..=50).contains(&len) {
            return Err(vec![(
                "username",
                "Field must be between 3 and 50 characters long.".to_string(),
            )]);
        }
        Ok(username.to_string())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PredictForm {
    pub age: String,
    pub weight: String,
    pub height: String,
    pub income_lpa: String,
    pub smoker: String,
    pub city: String,
    pub occupation: String,
}

impl PredictForm {
    /// Check every field and build the JSON body for the prediction API.
    ///
    /// # Errors
    /// Returns every failing field with its message.
    pub fn validate(&self) -> Result<Value, FormErrors> {
        let mut errors = FormErrors::new();

        let age = number::<i64>(&self.age, "age", &mut errors).filter(|a| {
            check(
                &mut errors,
                "age",
                (1..=120).contains(a),
                "Enter valid age between 1 and 120",
            )
        });
        let weight = number::<f64>(&self.weight, "weight", &mut errors).filter(|w| {
            check(
                &mut errors,
                "weight",
                *w >= 1.0,
                "Weight must be greater than 0",
            )
        });
        let height = number::<f64>(&self.height, "height", &mut errors).filter(|h| {
            check(
                &mut errors,
                "height",
                (0.5..=2.5).contains(h),
                "Height must be between 0.5 and 2.5 meters",
            )
        });
        let income = number::<f64>(&self.income_lpa, "income_lpa", &mut errors)
            .filter(|i| check(&mut errors, "income_lpa", *i >= 0.0, "Income must be non-negative"));

        let smoker = match self.smoker.trim() {
            "True" => Some(true),
            "False" => Some(false),
            "" => {
                errors.push(("smoker", REQUIRED.to_string()));
                None
            }
            _ => {
                errors.push(("smoker", NOT_A_CHOICE.to_string()));
                None
            }
        };

        let city = self.city.trim();
        if city.is_empty() {
            errors.push(("city", REQUIRED.to_string()));
        } else if city.chars().count() < 2 {
            errors.push(("city", "Enter a valid city name".to_string()));
        }

        let occupation = match self.occupation.trim() {
            "" => {
                errors.push(("occupation", REQUIRED.to_string()));
                None
            }
            o => {
                let parsed = Occupation::parse(o);
                if parsed.is_none() {
                    errors.push(("occupation", NOT_A_CHOICE.to_string()));
                }
                parsed
            }
        };

        match (age, weight, height, income, smoker, occupation) {
            (Some(age), Some(weight), Some(height), Some(income), Some(smoker), Some(occupation))
                if errors.is_empty() =>
            {
                Ok(json!({
                    "age": age,
                    "weight": weight,
                    "height": height,
                    "income_lpa": income,
                    "smoker": smoker,
                    "city": city,
                    "occupation": occupation.as_str(),
                }))
            }
            _ => Err(errors),
        }
    }
}

fn number<T: std::str::FromStr>(
    raw: &str,
    field: &'static str,
    errors: &mut FormErrors,
) -> Option<T> {
    let raw = raw.trim();
    if raw.is_empty() {
        errors.push((field, REQUIRED.to_string()));
        return None;
    }
    match raw.parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            errors.push((field, "Not a valid number.".to_string()));
            None
        }
    }
}

fn check(errors: &mut FormErrors, field: &'static str, ok: bool, message: &str) -> bool {
    if !ok {
        errors.push((field, message.to_string()));
    }
    ok
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> PredictForm {
        PredictForm {
            age: "29".into(),
            weight: "83".into(),
            height: "1.72".into(),
            income_lpa: "12".into(),
            smoker: "True".into(),
            city: " Delhi ".into(),
            occupation: "private_job".into(),
        }
    }

    #[test]
    fn test_valid_predict_form_builds_body() {
        let body = form().validate().expect("Should validate");
        assert_eq!(body["age"], 29);
        assert_eq!(body["smoker"], true);
        assert_eq!(body["city"], "Delhi");
        assert_eq!(body["occupation"], "private_job");
    }

    #[test]
    fn test_legacy_occupation_is_canonicalized() {
        let mut f = form();
        f.occupation = "bussiness_owner".into();
        let body = f.validate().expect("Should validate");
        assert_eq!(body["occupation"], "business_owner");
    }

    #[test]
    fn test_predict_form_collects_errors() {
        let f = PredictForm {
            age: "0".into(),
            weight: "heavy".into(),
            height: "3".into(),
            income_lpa: "-1".into(),
            smoker: "Maybe".into(),
            city: "X".into(),
            occupation: "astronaut".into(),
        };
        let errors = f.validate().expect_err("Should reject");
        let fields: Vec<&str> = errors.iter().map(|(f, _)| *f).collect();
        assert_eq!(
            fields,
            vec!["age", "weight", "height", "income_lpa", "smoker", "city", "occupation"]
        );
    }

    #[test]
    fn test_empty_predict_form() {
        let errors = PredictForm::default().validate().expect_err("Should reject");
        assert_eq!(errors.len(), 7);
        assert!(errors.iter().all(|(_, m)| m == REQUIRED));
    }

    #[test]
    fn test_login_username_length() {
        let ok = LoginForm { username: " asha ".into() };
        assert_eq!(ok.validate().expect("Should validate"), "asha");
        assert!(LoginForm { username: "ab".into() }.validate().is_err());
        assert!(LoginForm { username: "a".repeat(51) }.validate().is_err());
        assert!(LoginForm::default().validate().is_err());
    }
}
