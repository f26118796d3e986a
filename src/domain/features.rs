//! Derived model features.
//!
//! Everything here is a pure function of a validated [`UserMeasurement`]:
//! no I/O, no randomness, no caching. Thresholds use strict comparisons
//! (`bmi > 27`, `age < 25`) and must stay that way to match the trained model.

use serde::{Serialize, Serializer};

use super::measurement::{Occupation, UserMeasurement};

/// Tier-1 metros.
pub const TIER_1_CITIES: [&str; 7] = [
    "Mumbai", "Delhi", "Bangalore", "Chennai", "Kolkata", "Hyderabad", "Pune",
];

/// Tier-2 cities.
pub const TIER_2_CITIES: [&str; 48] = [
    "Jaipur",
    "Chandigarh",
    "Indore",
    "Lucknow",
    "Patna",
    "Ranchi",
    "Visakhapatnam",
    "Coimbatore",
    "Bhopal",
    "Nagpur",
    "Vadodara",
    "Surat",
    "Rajkot",
    "Jodhpur",
    "Raipur",
    "Amritsar",
    "Varanasi",
    "Agra",
    "Dehradun",
    "Mysore",
    "Jabalpur",
    "Guwahati",
    "Thiruvananthapuram",
    "Ludhiana",
    "Nashik",
    "Allahabad",
    "Udaipur",
    "Aurangabad",
    "Hubli",
    "Belgaum",
    "Salem",
    "Vijayawada",
    "Tiruchirappalli",
    "Bhavnagar",
    "Gwalior",
    "Dhanbad",
    "Bareilly",
    "Aligarh",
    "Gaya",
    "Kozhikode",
    "Warangal",
    "Kolhapur",
    "Bilaspur",
    "Jalandhar",
    "Noida",
    "Guntur",
    "Asansol",
    "Siliguri",
];

/// Coarse risk label from smoking status and BMI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifestyleRisk {
    Low,
    Medium,
    High,
}

impl LifestyleRisk {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Age bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeGroup {
    Young,
    Adult,
    MiddleAged,
    Senior,
}

impl AgeGroup {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Young => "young",
            Self::Adult => "adult",
            Self::MiddleAged => "middle_aged",
            Self::Senior => "senior",
        }
    }
}

/// Economic bracket of a city. Serialized as the bare tier number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CityTier {
    Tier1,
    Tier2,
    Tier3,
}

impl CityTier {
    #[must_use]
    pub fn number(&self) -> u8 {
        match self {
            Self::Tier1 => 1,
            Self::Tier2 => 2,
            Self::Tier3 => 3,
        }
    }
}

impl Serialize for CityTier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.number())
    }
}

impl std::fmt::Display for CityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Features derived from one measurement. Recomputed on every request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedFeatures {
    /// Unrounded body mass index
    pub bmi: f64,
    pub lifestyle_risk: LifestyleRisk,
    pub city_tier: CityTier,
    pub age_group: AgeGroup,
}

/// Body mass index, `weight / height²`, unrounded.
#[must_use]
pub fn bmi(weight_kg: f64, height_m: f64) -> f64 {
    weight_kg / (height_m * height_m)
}

/// Non-smokers are always low risk.
#[must_use]
pub fn lifestyle_risk(smoker: bool, bmi: f64) -> LifestyleRisk {
    if smoker && bmi > 30.0 {
        LifestyleRisk::High
    } else if smoker && bmi > 27.0 {
        LifestyleRisk::Medium
    } else {
        LifestyleRisk::Low
    }
}

/// Tier lookup; comparison ignores surrounding whitespace and ASCII case.
/// Unknown cities are tier 3.
#[must_use]
pub fn city_tier(city: &str) -> CityTier {
    let city = city.trim();
    if TIER_1_CITIES.iter().any(|c| c.eq_ignore_ascii_case(city)) {
        CityTier::Tier1
    } else if TIER_2_CITIES.iter().any(|c| c.eq_ignore_ascii_case(city)) {
        CityTier::Tier2
    } else {
        CityTier::Tier3
    }
}

#[must_use]
pub fn age_group(age: u32) -> AgeGroup {
    if age < 25 {
        AgeGroup::Young
    } else if age < 45 {
        AgeGroup::Adult
    } else if age < 60 {
        AgeGroup::MiddleAged
    } else {
        AgeGroup::Senior
    }
}

/// Compute all derived features for a validated measurement.
#[must_use]
pub fn derive(m: &UserMeasurement) -> DerivedFeatures {
    let bmi = bmi(m.weight, m.height);
    DerivedFeatures {
        bmi,
        lifestyle_risk: lifestyle_risk(m.smoker, bmi),
        city_tier: city_tier(&m.city),
        age_group: age_group(m.age),
    }
}

/// Column names of the gateway feature row, in table order.
pub const FEATURE_COLUMNS: [&str; 6] = [
    "bmi",
    "age_group",
    "lifestyle_risk",
    "city_tier",
    "income_lpa",
    "occupation",
];

/// The single row handed to the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureRow {
    pub bmi: f64,
    pub age_group: AgeGroup,
    pub lifestyle_risk: LifestyleRisk,
    pub city_tier: CityTier,
    pub income_lpa: f64,
    pub occupation: Occupation,
}

impl FeatureRow {
    /// Assemble the row from a measurement and its derived features.
    #[must_use]
    pub fn new(m: &UserMeasurement, derived: &DerivedFeatures) -> Self {
        Self {
            bmi: derived.bmi,
            age_group: derived.age_group,
            lifestyle_risk: derived.lifestyle_risk,
            city_tier: derived.city_tier,
            income_lpa: m.income_lpa,
            occupation: m.occupation,
        }
    }

    /// Numeric value of a column, if the column is numeric.
    #[must_use]
    pub fn numeric(&self, column: &str) -> Option<f64> {
        match column {
            "bmi" => Some(self.bmi),
            "city_tier" => Some(f64::from(self.city_tier.number())),
            "income_lpa" => Some(self.income_lpa),
            _ => None,
        }
    }

    /// Category value of a column, if the column is categorical.
    #[must_use]
    pub fn categorical(&self, column: &str) -> Option<&'static str> {
        match column {
            "age_group" => Some(self.age_group.as_str()),
            "lifestyle_risk" => Some(self.lifestyle_risk.as_str()),
            "occupation" => Some(self.occupation.as_str()),
            _ => None,
        }
    }
}
