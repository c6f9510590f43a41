//! Per-unit valuation and block GDV assembly.
//!
//! Floor area resolves explicit → EPC → typical-by-bedrooms. Price per sqft
//! resolves EPC-matched comparables → regional table → raw comparable median.
//! Comparables are filtered to the subject property type before anything is
//! derived from them.

mod config;
mod engine;
mod floor_area;
mod report;

pub use config::{RegionalRates, ValuationConfig};
pub use engine::ValuationEngine;
pub use floor_area::{FloorAreaSource, TypicalFloorAreas};
pub use report::{BlockGdvReport, BlockValuationRequest, ComparablesSummary, FloorAdjustment};

pub(crate) use engine::upper_median;

use crate::domain::{ComparableSale, EnergyRating, EpcRecord, UnitSpec};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceTier {
    Indicative,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingMethod {
    EpcMatchedPsf,
    RegionalPsf,
    ComparableMedian,
    NoEvidence,
}

impl PricingMethod {
    pub const fn label(self) -> &'static str {
        match self {
            Self::EpcMatchedPsf => "epc_matched_psf",
            Self::RegionalPsf => "regional_psf",
            Self::ComparableMedian => "comparable_median",
            Self::NoEvidence => "no_evidence",
        }
    }
}

/// Substitution applied when the computed value disagreed with the
/// comparable median.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MedianCorrection {
    Floor,
    Cap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationMethod {
    pub pricing: PricingMethod,
    pub correction: Option<MedianCorrection>,
}

impl ValuationMethod {
    pub fn label(&self) -> String {
        match self.correction {
            Some(MedianCorrection::Floor) => format!("{}+median_floor", self.pricing.label()),
            Some(MedianCorrection::Cap) => format!("{}+median_cap", self.pricing.label()),
            None => self.pricing.label().to_string(),
        }
    }
}

impl fmt::Display for ValuationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Pre-fetched evidence for one block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValuationEvidence {
    #[serde(default)]
    pub comparables: Vec<ComparableSale>,
    #[serde(default)]
    pub epcs: Vec<EpcRecord>,
}

impl ValuationEvidence {
    pub fn is_empty(&self) -> bool {
        self.comparables.is_empty() && self.epcs.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitValuation {
    pub unit_id: String,
    pub estimated_value: i64,
    pub value_range_low: i64,
    pub value_range_high: i64,
    pub confidence: ConfidenceTier,
    pub method: ValuationMethod,
    pub price_per_sqft_used: Option<f64>,
    pub floor_area_sqft: f64,
    pub floor_area_source: FloorAreaSource,
    pub energy_rating: Option<EnergyRating>,
    pub comparable_count: usize,
    pub note: String,
}

impl UnitValuation {
    fn no_evidence(
        unit: &UnitSpec,
        floor_area_sqft: f64,
        floor_area_source: FloorAreaSource,
        energy_rating: Option<EnergyRating>,
        postcode: &str,
    ) -> Self {
        Self {
            unit_id: unit.id.clone(),
            estimated_value: 0,
            value_range_low: 0,
            value_range_high: 0,
            confidence: ConfidenceTier::Indicative,
            method: ValuationMethod {
                pricing: PricingMethod::NoEvidence,
                correction: None,
            },
            price_per_sqft_used: None,
            floor_area_sqft,
            floor_area_source,
            energy_rating,
            comparable_count: 0,
            note: format!(
                "no flat comparables and no regional rate for {}; value not estimated",
                postcode.trim().to_ascii_uppercase()
            ),
        }
    }
}
