use super::engine::{upper_median, PreparedEvidence};
use super::{ConfidenceTier, PricingMethod, UnitValuation, ValuationEngine, ValuationEvidence};
use crate::domain::{ComparableSale, UnitSpec};
use crate::validation::{apply_gdv_floor, sanity_check_gdv, SanityInput, SanityReport};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockValuationRequest {
    pub postcode: String,
    pub asking_price: i64,
    pub units: Vec<UnitSpec>,
    #[serde(default)]
    pub evidence: ValuationEvidence,
    #[serde(default)]
    pub title_split_costs: i64,
    #[serde(default)]
    pub monthly_rent_per_unit: Option<i64>,
    pub as_of: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparablesSummary {
    pub count: usize,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub average_price: Option<i64>,
    pub median_price: Option<i64>,
}

impl ComparablesSummary {
    fn from_sales(sales: &[&ComparableSale]) -> Self {
        let prices: Vec<i64> = sales.iter().map(|sale| sale.price).collect();
        if prices.is_empty() {
            return Self::default();
        }

        Self {
            count: prices.len(),
            min_price: prices.iter().min().copied(),
            max_price: prices.iter().max().copied(),
            average_price: Some(prices.iter().sum::<i64>() / prices.len() as i64),
            median_price: upper_median(prices),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorAdjustment {
    pub original_gdv: i64,
    pub floor_gdv: i64,
    pub adjusted_gdv: i64,
    pub scale_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockGdvReport {
    pub postcode: String,
    pub asking_price: i64,
    pub total_units: usize,
    pub total_sqft: f64,
    pub unit_valuations: Vec<UnitValuation>,
    pub total_gdv: i64,
    pub gdv_range_low: i64,
    pub gdv_range_high: i64,
    pub gdv_confidence: ConfidenceTier,
    pub gross_uplift: i64,
    pub gross_uplift_percent: f64,
    pub title_split_costs: i64,
    pub net_uplift: i64,
    pub net_uplift_percent: f64,
    pub net_profit_per_unit: i64,
    pub comparables_summary: ComparablesSummary,
    pub validation: SanityReport,
    pub floor_adjustment: Option<FloorAdjustment>,
    pub methodology_notes: Vec<String>,
    pub limitations: Vec<String>,
}

impl BlockGdvReport {
    pub fn individual_values(&self) -> Vec<i64> {
        self.unit_valuations
            .iter()
            .map(|valuation| valuation.estimated_value)
            .collect()
    }

    /// Replaces the title-split costs and recomputes the net figures.
    pub fn set_title_split_costs(&mut self, costs: i64) {
        self.title_split_costs = costs;
        self.refresh_totals();
    }

    /// Multiplies every unit value and range by `factor`, rounding values and
    /// upper bounds up and lower bounds down so each range still contains
    /// its value.
    pub(crate) fn rescale_units(&mut self, factor: f64) {
        for valuation in &mut self.unit_valuations {
            valuation.estimated_value = (valuation.estimated_value as f64 * factor).ceil() as i64;
            valuation.value_range_low = (valuation.value_range_low as f64 * factor).floor() as i64;
            valuation.value_range_high =
                (valuation.value_range_high as f64 * factor).ceil() as i64;
        }
        self.refresh_totals();
    }

    fn refresh_totals(&mut self) {
        self.total_gdv = self.unit_valuations.iter().map(|v| v.estimated_value).sum();
        self.gdv_range_low = self.unit_valuations.iter().map(|v| v.value_range_low).sum();
        self.gdv_range_high = self.unit_valuations.iter().map(|v| v.value_range_high).sum();
        self.gross_uplift = self.total_gdv - self.asking_price;
        self.gross_uplift_percent = percent_of(self.gross_uplift, self.asking_price);
        self.net_uplift = self.gross_uplift - self.title_split_costs;
        self.net_uplift_percent = percent_of(self.net_uplift, self.asking_price);
        self.net_profit_per_unit = if self.total_units > 0 {
            self.net_uplift.div_euclid(self.total_units as i64)
        } else {
            0
        };
    }
}

impl ValuationEngine {
    /// Values every unit, aggregates the block, re-checks the result and then
    /// applies the GDV floor if the policy enables it.
    pub fn value_block(&self, request: &BlockValuationRequest) -> BlockGdvReport {
        let config = self.config();
        let prepared = PreparedEvidence::new(&request.evidence, &config.valuation, request.as_of);

        let unit_valuations: Vec<UnitValuation> = request
            .units
            .iter()
            .enumerate()
            .map(|(position, unit)| {
                self.value_prepared(unit, position, &request.postcode, &prepared)
            })
            .collect();

        let gdv_confidence = overall_confidence(&unit_valuations);
        let comparables_summary = ComparablesSummary::from_sales(&prepared.comparables);
        let notes = methodology_notes(
            request,
            &prepared,
            &unit_valuations,
            config.valuation.annual_appreciation,
        );
        let mut report = BlockGdvReport {
            postcode: request.postcode.trim().to_ascii_uppercase(),
            asking_price: request.asking_price,
            total_units: request.units.len(),
            total_sqft: unit_valuations.iter().map(|v| v.floor_area_sqft).sum(),
            methodology_notes: notes,
            limitations: limitations(gdv_confidence, prepared.comparable_count()),
            unit_valuations,
            total_gdv: 0,
            gdv_range_low: 0,
            gdv_range_high: 0,
            gdv_confidence,
            gross_uplift: 0,
            gross_uplift_percent: 0.0,
            title_split_costs: request.title_split_costs,
            net_uplift: 0,
            net_uplift_percent: 0.0,
            net_profit_per_unit: 0,
            comparables_summary,
            validation: SanityReport::default(),
            floor_adjustment: None,
        };
        report.refresh_totals();

        report.validation = sanity_check_gdv(
            &SanityInput {
                total_gdv: report.total_gdv,
                asking_price: request.asking_price,
                num_units: u32::try_from(request.units.len()).unwrap_or(u32::MAX),
                comparables: &request.evidence.comparables,
                monthly_rent_per_unit: request.monthly_rent_per_unit,
            },
            &config.sanity,
        );

        apply_gdv_floor(&mut report, request.asking_price, &config.sanity.gdv_floor);

        info!(
            postcode = %report.postcode,
            units = report.total_units,
            total_gdv = report.total_gdv,
            confidence = ?report.gdv_confidence,
            passed = report.validation.passed,
            "block valuation complete"
        );

        report
    }
}

fn percent_of(amount: i64, base: i64) -> f64 {
    if base == 0 {
        return 0.0;
    }
    (amount as f64 / base as f64 * 1000.0).round() / 10.0
}

fn overall_confidence(valuations: &[UnitValuation]) -> ConfidenceTier {
    if valuations.is_empty() {
        return ConfidenceTier::Indicative;
    }

    if valuations.iter().all(|v| v.confidence == ConfidenceTier::High) {
        ConfidenceTier::High
    } else if valuations
        .iter()
        .any(|v| v.confidence == ConfidenceTier::Indicative)
    {
        ConfidenceTier::Low
    } else if valuations.iter().all(|v| v.confidence >= ConfidenceTier::Medium) {
        ConfidenceTier::Medium
    } else {
        ConfidenceTier::Low
    }
}

fn methodology_notes(
    request: &BlockValuationRequest,
    prepared: &PreparedEvidence<'_>,
    valuations: &[UnitValuation],
    annual_appreciation: f64,
) -> Vec<String> {
    let mut notes = vec![format!(
        "{} of {} comparable sales retained after excluding other property types, new builds and unpriced sales",
        prepared.comparable_count(),
        request.evidence.comparables.len()
    )];

    if prepared.comparable_count() > 0 {
        notes.push(format!(
            "Sale prices time-adjusted at {:.1}% a year to {}",
            annual_appreciation * 100.0,
            request.as_of
        ));
    }

    let count_method = |method: PricingMethod| {
        valuations
            .iter()
            .filter(|v| v.method.pricing == method)
            .count()
    };
    let regional = count_method(PricingMethod::RegionalPsf);
    if regional > 0 {
        notes.push(format!(
            "Regional £/sqft used for {regional} unit(s) due to limited EPC-matched sales"
        ));
    }
    let unvalued = count_method(PricingMethod::NoEvidence);
    if unvalued > 0 {
        notes.push(format!("{unvalued} unit(s) could not be valued from available evidence"));
    }

    let corrected = valuations.iter().filter(|v| v.method.correction.is_some()).count();
    if corrected > 0 {
        notes.push(format!(
            "{corrected} unit value(s) corrected against the comparable median"
        ));
    }

    notes
}

fn limitations(confidence: ConfidenceTier, comparable_count: usize) -> Vec<String> {
    let mut limitations = vec![
        "Desktop valuation - does not replace RICS Red Book valuation".to_string(),
        "Actual values may differ based on condition and specification".to_string(),
    ];

    if matches!(confidence, ConfidenceTier::Low | ConfidenceTier::Indicative) {
        limitations.push("Limited comparable evidence - professional valuation recommended".to_string());
    }

    if comparable_count < 10 {
        limitations.push(format!(
            "Based on {comparable_count} comparables - additional evidence recommended"
        ));
    }

    limitations
}
