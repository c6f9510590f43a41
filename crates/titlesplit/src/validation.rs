use crate::domain::{ComparableSale, PropertyType};
use crate::valuation::{BlockGdvReport, FloorAdjustment};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Acceptable gross rental yield band as fractions (0.05 = 5%).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YieldBand {
    pub min_yield: f64,
    pub max_yield: f64,
}

impl Default for YieldBand {
    fn default() -> Self {
        Self {
            min_yield: 0.05,
            max_yield: 0.10,
        }
    }
}

/// Proportional uplift applied when total GDV falls below a multiple of the
/// asking price. Surfaced in the report limitations whenever it fires.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GdvFloorPolicy {
    pub enabled: bool,
    pub minimum_ratio: f64,
}

impl Default for GdvFloorPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            minimum_ratio: 1.10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SanityPolicy {
    pub yield_band: YieldBand,
    pub gdv_floor: GdvFloorPolicy,
    pub extreme_gdv_ratio: f64,
    pub high_gdv_ratio: f64,
    pub comparable_price_multiple: f64,
}

impl Default for SanityPolicy {
    fn default() -> Self {
        Self {
            yield_band: YieldBand::default(),
            gdv_floor: GdvFloorPolicy::default(),
            extreme_gdv_ratio: 5.0,
            high_gdv_ratio: 3.0,
            comparable_price_multiple: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YieldOutcome {
    WithinBand,
    ValueTooHigh,
    ConservativeValuation,
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YieldCheck {
    pub valid: bool,
    pub outcome: YieldOutcome,
    /// Gross annual yield as a percentage, two decimal places.
    pub implied_yield: Option<f64>,
    pub corrected_value: Option<i64>,
}

impl YieldCheck {
    pub fn skipped(&self) -> bool {
        self.outcome == YieldOutcome::Skipped
    }
}

/// Checks a unit value against its achievable rent. A yield below the band
/// means the value is too high; above the band is only a conservative note.
pub fn validate_unit_value_against_rent(
    estimated_value: i64,
    monthly_rent: i64,
    band: YieldBand,
) -> YieldCheck {
    if estimated_value <= 0 || monthly_rent <= 0 {
        return YieldCheck {
            valid: true,
            outcome: YieldOutcome::Skipped,
            implied_yield: None,
            corrected_value: None,
        };
    }

    let annual_rent = monthly_rent.saturating_mul(12) as f64;
    let implied = annual_rent / estimated_value as f64;
    let implied_yield = Some((implied * 10_000.0).round() / 100.0);

    if implied < band.min_yield {
        YieldCheck {
            valid: false,
            outcome: YieldOutcome::ValueTooHigh,
            implied_yield,
            corrected_value: Some((annual_rent / band.min_yield).round() as i64),
        }
    } else if implied > band.max_yield {
        YieldCheck {
            valid: true,
            outcome: YieldOutcome::ConservativeValuation,
            implied_yield,
            corrected_value: None,
        }
    } else {
        YieldCheck {
            valid: true,
            outcome: YieldOutcome::WithinBand,
            implied_yield,
            corrected_value: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SanityCheck {
    UnitExceedsBlockPrice,
    GdvRatioExtreme,
    GdvRatioHigh,
    MixedPropertyTypes,
    ComparablePriceMismatch,
    RentYieldMismatch,
    ConservativeValuation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanityFinding {
    pub check: SanityCheck,
    pub message: String,
    pub suggested_value: Option<i64>,
}

impl SanityFinding {
    fn new(check: SanityCheck, message: String) -> Self {
        Self {
            check,
            message,
            suggested_value: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SanityReport {
    pub passed: bool,
    pub issues: Vec<SanityFinding>,
    pub warnings: Vec<SanityFinding>,
}

impl SanityReport {
    pub fn has_issue(&self, check: SanityCheck) -> bool {
        self.issues.iter().any(|finding| finding.check == check)
    }

    pub fn has_warning(&self, check: SanityCheck) -> bool {
        self.warnings.iter().any(|finding| finding.check == check)
    }
}

/// Aggregate valuation to re-check.
#[derive(Debug, Clone, Copy)]
pub struct SanityInput<'a> {
    pub total_gdv: i64,
    pub asking_price: i64,
    pub num_units: u32,
    pub comparables: &'a [ComparableSale],
    pub monthly_rent_per_unit: Option<i64>,
}

/// Independent plausibility checks over an already computed GDV.
pub fn sanity_check_gdv(input: &SanityInput<'_>, policy: &SanityPolicy) -> SanityReport {
    let mut issues = Vec::new();
    let mut warnings = Vec::new();
    let units = i64::from(input.num_units);
    let per_unit_gdv = (units > 0).then(|| input.total_gdv / units);

    if let Some(per_unit) = per_unit_gdv {
        if input.asking_price > 0 && per_unit > input.asking_price {
            issues.push(SanityFinding::new(
                SanityCheck::UnitExceedsBlockPrice,
                format!(
                    "average unit value £{per_unit} exceeds the whole-block asking price £{}",
                    input.asking_price
                ),
            ));
        }
    }

    if input.asking_price > 0 {
        let ratio = input.total_gdv as f64 / input.asking_price as f64;
        if ratio > policy.extreme_gdv_ratio {
            issues.push(SanityFinding::new(
                SanityCheck::GdvRatioExtreme,
                format!("GDV is {ratio:.1}x the asking price"),
            ));
        } else if ratio > policy.high_gdv_ratio {
            warnings.push(SanityFinding::new(
                SanityCheck::GdvRatioHigh,
                format!("GDV is {ratio:.1}x the asking price; verify comparables"),
            ));
        }
    }

    let flats = input
        .comparables
        .iter()
        .filter(|sale| sale.property_type == PropertyType::Flat)
        .count();
    let non_flats = input.comparables.len() - flats;
    if flats > 0 && non_flats > 0 {
        warnings.push(SanityFinding::new(
            SanityCheck::MixedPropertyTypes,
            format!("{non_flats} of {} comparables are not flats", input.comparables.len()),
        ));
    }

    if !input.comparables.is_empty() && units > 0 && input.asking_price > 0 {
        let average = input
            .comparables
            .iter()
            .fold(0_i64, |total, sale| total.saturating_add(sale.price))
            / input.comparables.len() as i64;
        let per_unit_asking = input.asking_price / units;
        if average as f64 > per_unit_asking as f64 * policy.comparable_price_multiple {
            issues.push(SanityFinding::new(
                SanityCheck::ComparablePriceMismatch,
                format!(
                    "average comparable £{average} is over {:.0}x the per-unit asking price £{per_unit_asking}",
                    policy.comparable_price_multiple
                ),
            ));
        }
    }

    if let (Some(rent), Some(per_unit)) = (input.monthly_rent_per_unit, per_unit_gdv) {
        let check = validate_unit_value_against_rent(per_unit, rent, policy.yield_band);
        let implied = check.implied_yield.unwrap_or_default();
        match check.outcome {
            YieldOutcome::ValueTooHigh => issues.push(SanityFinding {
                check: SanityCheck::RentYieldMismatch,
                message: format!(
                    "implied yield {implied:.2}% is below {:.1}%; unit value looks too high",
                    policy.yield_band.min_yield * 100.0
                ),
                suggested_value: check.corrected_value,
            }),
            YieldOutcome::ConservativeValuation => warnings.push(SanityFinding::new(
                SanityCheck::ConservativeValuation,
                format!("implied yield {implied:.2}% suggests a conservative valuation"),
            )),
            YieldOutcome::WithinBand | YieldOutcome::Skipped => {}
        }
    }

    if !issues.is_empty() {
        warn!(issues = issues.len(), total_gdv = input.total_gdv, "GDV failed sanity checks");
    }

    SanityReport {
        passed: issues.is_empty(),
        issues,
        warnings,
    }
}

/// Scales every unit up proportionally when the total GDV sits below
/// `minimum_ratio × asking`. A zero GDV cannot be scaled and is left alone.
pub fn apply_gdv_floor(
    report: &mut BlockGdvReport,
    asking_price: i64,
    policy: &GdvFloorPolicy,
) -> Option<FloorAdjustment> {
    if !policy.enabled || asking_price <= 0 || report.total_gdv <= 0 {
        return None;
    }

    let floor_gdv = (asking_price as f64 * policy.minimum_ratio).ceil() as i64;
    if report.total_gdv >= floor_gdv {
        return None;
    }

    let original_gdv = report.total_gdv;
    let scale_factor = floor_gdv as f64 / original_gdv as f64;
    report.rescale_units(scale_factor);

    debug!(original_gdv, floor_gdv, scale_factor, "GDV floor applied");

    let adjustment = FloorAdjustment {
        original_gdv,
        floor_gdv,
        adjusted_gdv: report.total_gdv,
        scale_factor,
    };
    report.limitations.push(format!(
        "GDV floor applied: unit values scaled by {scale_factor:.3} from £{original_gdv} to reach {:.0}% of asking price - review comparable evidence",
        policy.minimum_ratio * 100.0
    ));
    report.floor_adjustment = Some(adjustment.clone());
    Some(adjustment)
}
