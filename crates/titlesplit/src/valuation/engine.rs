use super::config::ValuationConfig;
use super::floor_area::{epc_for_unit, resolve_floor_area, FloorAreaSource};
use super::{
    ConfidenceTier, MedianCorrection, PricingMethod, UnitValuation, ValuationEvidence,
    ValuationMethod,
};
use crate::config::EngineConfig;
use crate::domain::{ComparableSale, EpcRecord, UnitSpec};
use crate::evidence::normalize_address;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::debug;

/// Estimates per-unit values from floor area and comparable evidence.
#[derive(Debug, Clone)]
pub struct ValuationEngine {
    config: Arc<EngineConfig>,
}

impl Default for ValuationEngine {
    fn default() -> Self {
        Self::new(Arc::new(EngineConfig::default()))
    }
}

impl ValuationEngine {
    pub fn new(config: Arc<EngineConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Values one unit. `position` is the unit's index within the block and is
    /// used to pair it with an EPC record when no certificate names it.
    ///
    /// Never fails: missing evidence degrades the method and confidence, and a
    /// complete absence of evidence yields a zero-value indicative result.
    pub fn value_unit(
        &self,
        unit: &UnitSpec,
        position: usize,
        postcode: &str,
        evidence: &ValuationEvidence,
        as_of: NaiveDate,
    ) -> UnitValuation {
        let prepared = PreparedEvidence::new(evidence, &self.config.valuation, as_of);
        self.value_prepared(unit, position, postcode, &prepared)
    }

    pub(crate) fn value_prepared(
        &self,
        unit: &UnitSpec,
        position: usize,
        postcode: &str,
        evidence: &PreparedEvidence<'_>,
    ) -> UnitValuation {
        let config = &self.config.valuation;
        let epc = epc_for_unit(unit, position, evidence.epcs);
        let (floor_area_sqft, floor_area_source) =
            resolve_floor_area(unit, epc, &config.typical_floor_areas);
        let energy_rating = unit.energy_rating.or_else(|| epc.and_then(|record| record.rating));
        let comparable_count = evidence.comparable_count();

        let (pricing, price_per_sqft_used, base_value) =
            if let Some(psf) = evidence.matched_price_per_sqft {
                (PricingMethod::EpcMatchedPsf, Some(psf), floor_area_sqft * psf)
            } else if let Some(psf) = config.regional_rates.rate_for(postcode) {
                (PricingMethod::RegionalPsf, Some(psf), floor_area_sqft * psf)
            } else if let Some(median) = evidence.median_adjusted_price {
                (PricingMethod::ComparableMedian, None, median as f64)
            } else {
                debug!(unit = %unit.id, %postcode, "no pricing evidence for unit");
                return UnitValuation::no_evidence(
                    unit,
                    floor_area_sqft,
                    floor_area_source,
                    energy_rating,
                    postcode,
                );
            };

        let factor = energy_rating.map_or(1.0, |rating| rating.condition_factor());
        let mut estimated_value = (base_value * factor) as i64;
        let mut correction = None;

        if let Some(median) = evidence.median_adjusted_price {
            let median_value = median as f64;
            if (estimated_value as f64) < median_value * config.median_floor_ratio {
                debug!(unit = %unit.id, estimated_value, median, "value below comparable median floor");
                estimated_value = median;
                correction = Some(MedianCorrection::Floor);
            } else if (estimated_value as f64) > median_value * config.median_cap_trigger {
                debug!(unit = %unit.id, estimated_value, median, "value above comparable median cap");
                estimated_value = (median_value * config.median_cap_ratio) as i64;
                correction = Some(MedianCorrection::Cap);
            }
        }

        let variance = variance_for(comparable_count);
        let method = ValuationMethod {
            pricing,
            correction,
        };

        UnitValuation {
            unit_id: unit.id.clone(),
            estimated_value,
            value_range_low: (estimated_value as f64 * (1.0 - variance)) as i64,
            value_range_high: (estimated_value as f64 * (1.0 + variance)) as i64,
            confidence: confidence_for(comparable_count, floor_area_source),
            note: format!("{} based on {} comparables", method.label(), comparable_count),
            method,
            price_per_sqft_used,
            floor_area_sqft,
            floor_area_source,
            energy_rating,
            comparable_count,
        }
    }
}

/// Evidence filtered to the subject property type with derived medians
/// computed once per block.
pub(crate) struct PreparedEvidence<'a> {
    pub(crate) comparables: Vec<&'a ComparableSale>,
    pub(crate) epcs: &'a [EpcRecord],
    pub(crate) median_adjusted_price: Option<i64>,
    pub(crate) matched_price_per_sqft: Option<f64>,
}

impl<'a> PreparedEvidence<'a> {
    pub(crate) fn new(
        evidence: &'a ValuationEvidence,
        config: &ValuationConfig,
        as_of: NaiveDate,
    ) -> Self {
        let comparables: Vec<&ComparableSale> = evidence
            .comparables
            .iter()
            .filter(|sale| {
                sale.price > 0
                    && sale.property_type == config.subject_property_type
                    && !sale.new_build
            })
            .collect();

        let adjusted: Vec<(&ComparableSale, i64)> = comparables
            .iter()
            .map(|sale| (*sale, sale.time_adjusted_price(as_of, config.annual_appreciation)))
            .collect();

        let median_adjusted_price = upper_median(adjusted.iter().map(|(_, price)| *price).collect());

        let matched: Vec<f64> = adjusted
            .iter()
            .filter_map(|(sale, price)| {
                let key = normalize_address(&sale.address);
                evidence
                    .epcs
                    .iter()
                    .find(|epc| normalize_address(&epc.address) == key)
                    .and_then(EpcRecord::floor_area_sqft)
                    .map(|sqft| *price as f64 / sqft)
            })
            .collect();

        Self {
            comparables,
            epcs: &evidence.epcs,
            median_adjusted_price,
            matched_price_per_sqft: upper_median_f64(matched),
        }
    }

    pub(crate) fn comparable_count(&self) -> usize {
        self.comparables.len()
    }
}

/// Upper median (`sorted[len / 2]`), matching how the comparable evidence is
/// summarised elsewhere.
pub(crate) fn upper_median(mut values: Vec<i64>) -> Option<i64> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();
    Some(values[values.len() / 2])
}

fn upper_median_f64(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    Some(values[values.len() / 2])
}

pub(crate) fn variance_for(comparable_count: usize) -> f64 {
    match comparable_count {
        5.. => 0.10,
        2..=4 => 0.15,
        _ => 0.20,
    }
}

pub(crate) fn confidence_for(comparable_count: usize, source: FloorAreaSource) -> ConfidenceTier {
    let measured_area = source != FloorAreaSource::Typical;

    if comparable_count >= 10 && measured_area {
        ConfidenceTier::High
    } else if comparable_count >= 5 || (comparable_count >= 2 && source == FloorAreaSource::Epc) {
        ConfidenceTier::Medium
    } else if comparable_count >= 2 {
        ConfidenceTier::Low
    } else {
        ConfidenceTier::Indicative
    }
}
