use crate::costs::{BenefitThresholds, CostModel};
use crate::validation::SanityPolicy;
use crate::valuation::ValuationConfig;

/// Read-only tables consumed by every engine component.
///
/// Built once at start-up and shared behind an `Arc`; nothing mutates it
/// during a calculation.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub valuation: ValuationConfig,
    pub sanity: SanityPolicy,
    pub costs: CostModel,
    pub benefit: BenefitThresholds,
}
