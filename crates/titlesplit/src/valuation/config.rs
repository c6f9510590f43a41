use super::floor_area::TypicalFloorAreas;
use crate::domain::{postcode_area, PropertyType};
use std::collections::HashMap;

/// Regional flat £/sqft keyed by postcode area.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionalRates {
    rates: HashMap<String, f64>,
}

impl RegionalRates {
    pub fn new<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            rates: entries
                .into_iter()
                .map(|(area, rate)| (area.into().to_ascii_uppercase(), rate))
                .collect(),
        }
    }

    /// Rate for the postcode's area. Unlisted areas return `None`; there is no
    /// national default.
    pub fn rate_for(&self, postcode: &str) -> Option<f64> {
        self.rates.get(&postcode_area(postcode)).copied()
    }
}

impl Default for RegionalRates {
    fn default() -> Self {
        Self::new([
            ("L", 150.0),
            ("M", 200.0),
            ("LS", 180.0),
            ("S", 160.0),
            ("NE", 155.0),
            ("WN", 130.0),
            ("BL", 125.0),
            ("BD", 120.0),
            ("HU", 110.0),
            ("TS", 115.0),
            ("PR", 140.0),
        ])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValuationConfig {
    pub subject_property_type: PropertyType,
    pub annual_appreciation: f64,
    pub regional_rates: RegionalRates,
    pub typical_floor_areas: TypicalFloorAreas,
    /// Values below this share of the comparable median are replaced by the median.
    pub median_floor_ratio: f64,
    /// Values above this multiple of the comparable median are capped.
    pub median_cap_trigger: f64,
    pub median_cap_ratio: f64,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            subject_property_type: PropertyType::Flat,
            annual_appreciation: 0.03,
            regional_rates: RegionalRates::default(),
            typical_floor_areas: TypicalFloorAreas::default(),
            median_floor_ratio: 0.5,
            median_cap_trigger: 2.0,
            median_cap_ratio: 1.5,
        }
    }
}
