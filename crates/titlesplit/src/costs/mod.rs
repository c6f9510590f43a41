mod benefit;

pub use benefit::{
    calculate_break_even_price, BenefitDecision, BenefitEstimate, BenefitThresholds,
    BenefitVerdict, CostBenefitAnalysis, CostBenefitAnalyzer,
};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostScenario {
    Min,
    #[default]
    Typical,
    Max,
}

/// Fee quoted at each scenario level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScenarioFee {
    pub min: i64,
    pub typical: i64,
    pub max: i64,
}

impl ScenarioFee {
    pub const fn new(min: i64, typical: i64, max: i64) -> Self {
        Self { min, typical, max }
    }

    pub const fn for_scenario(&self, scenario: CostScenario) -> i64 {
        match scenario {
            CostScenario::Min => self.min,
            CostScenario::Typical => self.typical,
            CostScenario::Max => self.max,
        }
    }
}

/// Land Registry registration fee: the first band whose upper bound covers the
/// unit value, else `above_top_band`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationFees {
    pub bands: Vec<(i64, i64)>,
    pub above_top_band: i64,
}

impl RegistrationFees {
    pub fn fee_for(&self, value: i64) -> i64 {
        self.bands
            .iter()
            .find(|(upper, _)| value <= *upper)
            .map_or(self.above_top_band, |(_, fee)| *fee)
    }
}

impl Default for RegistrationFees {
    fn default() -> Self {
        Self {
            bands: vec![
                (80_000, 20),
                (100_000, 40),
                (200_000, 95),
                (500_000, 135),
                (1_000_000, 270),
            ],
            above_top_band: 455,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CostModel {
    pub solicitor_per_unit: ScenarioFee,
    pub title_plan_per_unit: ScenarioFee,
    pub valuation_per_unit: ScenarioFee,
    pub insurance_per_unit: ScenarioFee,
    pub lender_consent: ScenarioFee,
    pub lender_legal: ScenarioFee,
    pub registration: RegistrationFees,
    pub contingency_rate: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            solicitor_per_unit: ScenarioFee::new(300, 450, 600),
            title_plan_per_unit: ScenarioFee::new(100, 200, 300),
            valuation_per_unit: ScenarioFee::new(150, 250, 350),
            insurance_per_unit: ScenarioFee::new(50, 75, 100),
            lender_consent: ScenarioFee::new(500, 1000, 2500),
            lender_legal: ScenarioFee::new(500, 1000, 2000),
            registration: RegistrationFees::default(),
            contingency_rate: 0.10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostItem {
    SolicitorFees,
    TitlePlans,
    Valuations,
    Insurance,
    LandRegistry,
    LenderConsent,
    LenderLegal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostLineItem {
    pub item: CostItem,
    pub amount: i64,
    pub per_unit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub scenario: CostScenario,
    pub line_items: Vec<CostLineItem>,
    pub subtotal: i64,
    pub contingency: i64,
    pub total: i64,
    pub per_unit: i64,
}

impl CostBreakdown {
    pub fn amount(&self, item: CostItem) -> i64 {
        self.line_items
            .iter()
            .filter(|line| line.item == item)
            .map(|line| line.amount)
            .sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CostEstimator {
    model: CostModel,
}

impl CostEstimator {
    pub fn new(model: CostModel) -> Self {
        Self { model }
    }

    /// Transaction costs of splitting the title into `num_units` registered
    /// units whose post-split values are `individual_values`.
    pub fn estimate(
        &self,
        num_units: u32,
        individual_values: &[i64],
        scenario: CostScenario,
    ) -> CostBreakdown {
        let units = i64::from(num_units);
        let model = &self.model;
        let per_unit = |fee: &ScenarioFee, item| CostLineItem {
            item,
            amount: units * fee.for_scenario(scenario),
            per_unit: true,
        };
        let one_off = |fee: &ScenarioFee, item| CostLineItem {
            item,
            amount: fee.for_scenario(scenario),
            per_unit: false,
        };

        let line_items = vec![
            per_unit(&model.solicitor_per_unit, CostItem::SolicitorFees),
            per_unit(&model.title_plan_per_unit, CostItem::TitlePlans),
            per_unit(&model.valuation_per_unit, CostItem::Valuations),
            per_unit(&model.insurance_per_unit, CostItem::Insurance),
            CostLineItem {
                item: CostItem::LandRegistry,
                amount: individual_values
                    .iter()
                    .map(|value| model.registration.fee_for(*value))
                    .sum(),
                per_unit: true,
            },
            one_off(&model.lender_consent, CostItem::LenderConsent),
            one_off(&model.lender_legal, CostItem::LenderLegal),
        ];

        let subtotal: i64 = line_items.iter().map(|line| line.amount).sum();
        let contingency = (subtotal as f64 * model.contingency_rate).round() as i64;
        let total = subtotal + contingency;

        CostBreakdown {
            scenario,
            line_items,
            subtotal,
            contingency,
            total,
            per_unit: if units > 0 { total / units } else { 0 },
        }
    }
}

/// Whole pounds with thousands separators, e.g. `£22,083`.
pub(crate) fn format_gbp(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if amount < 0 {
        format!("-£{grouped}")
    } else {
        format!("£{grouped}")
    }
}
