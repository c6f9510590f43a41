use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Square feet per square metre, as used by the EPC register conversions.
pub const SQFT_PER_SQM: f64 = 10.764;

pub fn sqm_to_sqft(sqm: f64) -> f64 {
    sqm * SQFT_PER_SQM
}

/// Identifier wrapper for appraised properties.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyId(pub String);

/// EPC energy efficiency band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnergyRating {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
}

impl EnergyRating {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::A,
            Self::B,
            Self::C,
            Self::D,
            Self::E,
            Self::F,
            Self::G,
        ]
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            "C" => Some(Self::C),
            "D" => Some(Self::D),
            "E" => Some(Self::E),
            "F" => Some(Self::F),
            "G" => Some(Self::G),
            _ => None,
        }
    }

    /// Multiplier applied to a unit value for its energy performance; C is neutral.
    pub const fn condition_factor(self) -> f64 {
        match self {
            Self::A => 1.05,
            Self::B => 1.03,
            Self::C => 1.00,
            Self::D => 0.97,
            Self::E => 0.94,
            Self::F => 0.90,
            Self::G => 0.85,
        }
    }

    /// Ordinal rank where A is 7 and G is 1.
    pub const fn rank(self) -> u8 {
        match self {
            Self::A => 7,
            Self::B => 6,
            Self::C => 5,
            Self::D => 4,
            Self::E => 3,
            Self::F => 2,
            Self::G => 1,
        }
    }

    fn from_rank(rank: u8) -> Self {
        match rank {
            7.. => Self::A,
            6 => Self::B,
            5 => Self::C,
            4 => Self::D,
            3 => Self::E,
            2 => Self::F,
            _ => Self::G,
        }
    }

    pub const fn is_poor(self) -> bool {
        matches!(self, Self::E | Self::F | Self::G)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
            Self::F => "F",
            Self::G => "G",
        }
    }
}

/// Average band across a set of EPC records, rounded to the nearest band.
pub fn average_energy_rating(records: &[EpcRecord]) -> Option<EnergyRating> {
    let ranks: Vec<u32> = records
        .iter()
        .filter_map(|record| record.rating)
        .map(|rating| rating.rank() as u32)
        .collect();

    if ranks.is_empty() {
        return None;
    }

    let average = ranks.iter().sum::<u32>() as f64 / ranks.len() as f64;
    Some(EnergyRating::from_rank(average.round().clamp(1.0, 7.0) as u8))
}

/// Land Registry property type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Flat,
    Terraced,
    SemiDetached,
    Detached,
    Other,
}

impl PropertyType {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "F" => Some(Self::Flat),
            "T" => Some(Self::Terraced),
            "S" => Some(Self::SemiDetached),
            "D" => Some(Self::Detached),
            "O" => Some(Self::Other),
            _ => None,
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::Flat => "F",
            Self::Terraced => "T",
            Self::SemiDetached => "S",
            Self::Detached => "D",
            Self::Other => "O",
        }
    }
}

/// Tenure recorded against a Price Paid transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenureCode {
    Freehold,
    Leasehold,
}

impl TenureCode {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "F" => Some(Self::Freehold),
            "L" => Some(Self::Leasehold),
            _ => None,
        }
    }
}

/// Tenure as understood from listing text or screening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tenure {
    Freehold,
    Leasehold,
    ShareOfFreehold,
    #[default]
    Unknown,
}

/// Recorded sale used as pricing evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparableSale {
    pub address: String,
    pub postcode: String,
    pub price: i64,
    pub sale_date: NaiveDate,
    pub property_type: PropertyType,
    #[serde(default)]
    pub new_build: bool,
    pub tenure: TenureCode,
}

impl ComparableSale {
    /// Sale price brought forward to `as_of` using simple compound appreciation.
    pub fn time_adjusted_price(&self, as_of: NaiveDate, annual_rate: f64) -> i64 {
        let days = (as_of - self.sale_date).num_days();
        if days <= 0 {
            return self.price;
        }

        let years = days as f64 / 365.25;
        (self.price as f64 * (1.0 + annual_rate).powf(years)) as i64
    }
}

/// Floor area and rating record drawn from the EPC register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpcRecord {
    pub address: String,
    pub postcode: String,
    #[serde(default)]
    pub rating: Option<EnergyRating>,
    #[serde(default)]
    pub floor_area_sqm: Option<f64>,
}

impl EpcRecord {
    pub fn floor_area_sqft(&self) -> Option<f64> {
        self.floor_area_sqm
            .filter(|sqm| sqm.is_finite() && *sqm > 0.0)
            .map(sqm_to_sqft)
    }
}

/// A single unit within the block being appraised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSpec {
    pub id: String,
    #[serde(default)]
    pub bedrooms: Option<u8>,
    #[serde(default)]
    pub floor_area_sqft: Option<f64>,
    #[serde(default)]
    pub energy_rating: Option<EnergyRating>,
}

/// Caller supplied snapshot of a listed property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingSnapshot {
    pub property_id: PropertyId,
    pub postcode: String,
    pub asking_price: i64,
    #[serde(default)]
    pub estimated_units: Option<u32>,
    #[serde(default)]
    pub tenure: Tenure,
    #[serde(default)]
    pub tenure_confidence: f64,
    #[serde(default)]
    pub unit_confidence: f64,
    #[serde(default)]
    pub refurb_indicators: Vec<String>,
    #[serde(default)]
    pub description: String,
}

impl ListingSnapshot {
    pub fn price_per_unit(&self) -> Option<i64> {
        match self.estimated_units {
            Some(units) if units > 0 && self.asking_price > 0 => {
                Some(self.asking_price / units as i64)
            }
            _ => None,
        }
    }
}

/// Leading letters of the outward code, e.g. `PR` for `PR9 0NP`.
pub fn postcode_area(postcode: &str) -> String {
    postcode
        .trim()
        .chars()
        .take_while(|ch| ch.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_uppercase()
}

/// Outward code, e.g. `PR9` for `PR9 0NP`.
pub fn postcode_district(postcode: &str) -> String {
    postcode
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase()
}
