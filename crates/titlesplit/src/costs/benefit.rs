use super::{format_gbp, CostBreakdown};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BenefitThresholds {
    pub min_net_per_unit: i64,
    pub strong_net_per_unit: i64,
    /// Maximum acceptable transaction costs as a percentage of asking price.
    pub max_cost_ratio_percent: f64,
    /// Gross uplift that still merits a price negotiation when costs are high.
    pub negotiate_gross_uplift_percent: f64,
}

impl Default for BenefitThresholds {
    fn default() -> Self {
        Self {
            min_net_per_unit: 2_000,
            strong_net_per_unit: 5_000,
            max_cost_ratio_percent: 3.0,
            negotiate_gross_uplift_percent: 15.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenefitEstimate {
    pub current_value: i64,
    pub individual_values_aggregate: i64,
    pub gross_uplift: i64,
    pub gross_uplift_percent: f64,
    pub transaction_costs: i64,
    pub net_uplift: i64,
    pub net_uplift_percent: f64,
    pub net_benefit_per_unit: i64,
    /// Costs as a percentage of asking price, one decimal place.
    pub cost_ratio: f64,
    pub meets_threshold: bool,
    pub cost_ratio_acceptable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BenefitDecision {
    Proceed,
    Review,
    Decline,
}

/// Which row of the decision table fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenefitVerdict {
    StrongProceed,
    Proceed,
    NegotiatePrice,
    Marginal,
    Decline,
}

impl BenefitVerdict {
    pub const fn decision(self) -> BenefitDecision {
        match self {
            Self::StrongProceed | Self::Proceed => BenefitDecision::Proceed,
            Self::NegotiatePrice | Self::Marginal => BenefitDecision::Review,
            Self::Decline => BenefitDecision::Decline,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBenefitAnalysis {
    pub costs: CostBreakdown,
    pub benefits: BenefitEstimate,
    pub decision: BenefitDecision,
    pub verdict: BenefitVerdict,
    pub rationale: String,
}

#[derive(Debug, Clone, Default)]
pub struct CostBenefitAnalyzer {
    thresholds: BenefitThresholds,
}

impl CostBenefitAnalyzer {
    pub fn new(thresholds: BenefitThresholds) -> Self {
        Self { thresholds }
    }

    pub fn estimate_benefits(
        &self,
        asking_price: i64,
        num_units: u32,
        individual_values: &[i64],
        costs: &CostBreakdown,
    ) -> BenefitEstimate {
        let aggregate: i64 = individual_values.iter().sum();
        let gross_uplift = aggregate - asking_price;
        let net_uplift = gross_uplift - costs.total;
        let units = i64::from(num_units);
        let net_benefit_per_unit = if units > 0 {
            net_uplift.div_euclid(units)
        } else {
            0
        };
        let cost_ratio = percent(costs.total, asking_price);

        BenefitEstimate {
            current_value: asking_price,
            individual_values_aggregate: aggregate,
            gross_uplift,
            gross_uplift_percent: percent(gross_uplift, asking_price),
            transaction_costs: costs.total,
            net_uplift,
            net_uplift_percent: percent(net_uplift, asking_price),
            net_benefit_per_unit,
            cost_ratio,
            meets_threshold: net_benefit_per_unit >= self.thresholds.min_net_per_unit,
            cost_ratio_acceptable: cost_ratio <= self.thresholds.max_cost_ratio_percent,
        }
    }

    /// Applies the go/no-go table in order: viable proceed, negotiate on a
    /// strong gross uplift with heavy costs, marginal review, decline.
    pub fn analyze(
        &self,
        asking_price: i64,
        num_units: u32,
        individual_values: &[i64],
        costs: &CostBreakdown,
    ) -> CostBenefitAnalysis {
        let benefits = self.estimate_benefits(asking_price, num_units, individual_values, costs);
        let thresholds = &self.thresholds;
        let per_unit = benefits.net_benefit_per_unit;

        let (verdict, rationale) = if benefits.meets_threshold && benefits.cost_ratio_acceptable {
            if per_unit >= thresholds.strong_net_per_unit {
                (
                    BenefitVerdict::StrongProceed,
                    format!(
                        "Strong opportunity with {} net benefit per unit. Gross uplift of {}% with acceptable cost ratio.",
                        format_gbp(per_unit),
                        benefits.gross_uplift_percent
                    ),
                )
            } else {
                (
                    BenefitVerdict::Proceed,
                    format!(
                        "Viable opportunity with {} net benefit per unit. Meets minimum threshold of {} per unit.",
                        format_gbp(per_unit),
                        format_gbp(thresholds.min_net_per_unit)
                    ),
                )
            }
        } else if benefits.gross_uplift_percent >= thresholds.negotiate_gross_uplift_percent
            && !benefits.cost_ratio_acceptable
        {
            (
                BenefitVerdict::NegotiatePrice,
                format!(
                    "Good gross uplift of {}% but cost ratio of {}% exceeds {}% threshold. Negotiate on price.",
                    benefits.gross_uplift_percent,
                    benefits.cost_ratio,
                    thresholds.max_cost_ratio_percent
                ),
            )
        } else if per_unit > 0 && per_unit < thresholds.min_net_per_unit {
            (
                BenefitVerdict::Marginal,
                format!(
                    "Marginal benefit of {} per unit. May have strategic value but below standard threshold.",
                    format_gbp(per_unit)
                ),
            )
        } else {
            (
                BenefitVerdict::Decline,
                format!(
                    "Transaction costs exceed benefit. Net uplift: {}. Does not meet investment criteria.",
                    format_gbp(benefits.net_uplift)
                ),
            )
        };

        debug!(?verdict, net_per_unit = per_unit, cost_ratio = benefits.cost_ratio, "cost-benefit decided");

        CostBenefitAnalysis {
            costs: costs.clone(),
            benefits,
            decision: verdict.decision(),
            verdict,
            rationale,
        }
    }
}

/// Highest purchase price that still leaves `target_net_per_unit` per unit
/// after costs. Never negative.
pub fn calculate_break_even_price(
    individual_values: &[i64],
    costs: &CostBreakdown,
    num_units: u32,
    target_net_per_unit: i64,
) -> i64 {
    let aggregate: i64 = individual_values.iter().sum();
    let max_price = aggregate - costs.total - target_net_per_unit * i64::from(num_units);
    max_price.max(0)
}

fn percent(amount: i64, base: i64) -> f64 {
    if base <= 0 {
        return 0.0;
    }
    (amount as f64 / base as f64 * 1000.0).round() / 10.0
}
