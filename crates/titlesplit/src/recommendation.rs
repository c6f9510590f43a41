//! Staged investment recommendations.
//!
//! Each stage is a pure function over the evidence held at that point:
//! listing data and screening, then automated enrichment, then manual
//! verification. Callers pick the stage; nothing here carries state between
//! calls.

use crate::costs::format_gbp;
use crate::domain::{EnergyRating, ListingSnapshot, Tenure, TenureCode};
use crate::screening::{ScreeningFlag, ScreeningResult};
use crate::verification::{
    ConsentLikelihood, Impact, ImpactClass, TitleClass, UseClass, VerificationRecord,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationLevel {
    StrongProceed,
    Proceed,
    ProceedWithCaution,
    ReviewRequired,
    LikelyDecline,
    Decline,
    InsufficientData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Initial,
    Enriched,
    PartiallyVerified,
    FullyVerified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenefitConfidence {
    None,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Unknown,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub level: RecommendationLevel,
    pub stage: Stage,
    pub confidence: f64,
    pub headline: String,
    pub summary: String,
    pub positive_factors: Vec<String>,
    pub negative_factors: Vec<String>,
    pub unknown_factors: Vec<String>,
    pub hard_blockers: Vec<String>,
    pub soft_blockers: Vec<String>,
    pub required_actions: Vec<String>,
    pub optional_actions: Vec<String>,
    pub estimated_net_benefit: Option<i64>,
    pub benefit_confidence: BenefitConfidence,
    pub risk_level: RiskLevel,
}

impl Recommendation {
    /// Zero-confidence result for when collaborators supplied nothing usable.
    pub fn insufficient_data(stage: Stage, note: impl Into<String>) -> Self {
        Self {
            level: RecommendationLevel::InsufficientData,
            stage,
            confidence: 0.0,
            headline: "Insufficient data for recommendation".to_string(),
            summary: note.into(),
            positive_factors: Vec::new(),
            negative_factors: Vec::new(),
            unknown_factors: Vec::new(),
            hard_blockers: Vec::new(),
            soft_blockers: Vec::new(),
            required_actions: Vec::new(),
            optional_actions: Vec::new(),
            estimated_net_benefit: None,
            benefit_confidence: BenefitConfidence::None,
            risk_level: RiskLevel::Unknown,
        }
    }
}

/// Enrichment evidence gathered automatically after screening.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnrichmentSignals {
    pub epc_count: usize,
    pub comparable_count: usize,
    pub estimated_uplift: Option<i64>,
    pub average_energy_rating: Option<EnergyRating>,
}

#[derive(Debug, Default)]
struct Factors {
    positive: Vec<String>,
    negative: Vec<String>,
    unknown: Vec<String>,
    hard_blockers: Vec<String>,
    soft_blockers: Vec<String>,
}

pub fn initial_recommendation(
    listing: &ListingSnapshot,
    screening: &ScreeningResult,
) -> Recommendation {
    let mut factors = Factors::default();

    match listing.estimated_units {
        Some(units @ 2..=6) => factors
            .positive
            .push(format!("{units} units - ideal size for title split")),
        Some(units @ 7..=10) => factors
            .positive
            .push(format!("{units} units - good size, manageable complexity")),
        Some(units @ 11..) => factors
            .soft_blockers
            .push(format!("{units} units may be too complex")),
        Some(1) => {}
        Some(0) | None => factors
            .unknown
            .push("Unit count unclear from listing - needs verification".to_string()),
    }

    match listing.tenure {
        Tenure::Freehold if listing.tenure_confidence > 0.8 => {
            factors.positive.push("Freehold tenure stated in listing".to_string())
        }
        Tenure::Freehold => factors
            .positive
            .push("Likely freehold (needs title verification)".to_string()),
        Tenure::Leasehold => factors
            .hard_blockers
            .push("Leasehold - not suitable for title splitting".to_string()),
        Tenure::ShareOfFreehold => factors
            .hard_blockers
            .push("Share of freehold - already split, no opportunity".to_string()),
        Tenure::Unknown => factors
            .unknown
            .push("Tenure not stated - critical to verify".to_string()),
    }

    if let Some(price) = listing.price_per_unit() {
        let formatted = format_gbp(price);
        if price < 40_000 {
            factors.positive.push(format!("Low entry at {formatted}/unit"));
        } else if price < 60_000 {
            factors.positive.push(format!("Reasonable pricing at {formatted}/unit"));
        } else if price < 80_000 {
            factors.negative.push(format!("Higher entry at {formatted}/unit"));
        } else {
            factors.soft_blockers.push(format!("Premium pricing at {formatted}/unit"));
        }
    }

    if !listing.refurb_indicators.is_empty() {
        factors
            .positive
            .push("Refurbishment opportunity - value-add potential".to_string());
    }

    for rejection in &screening.rejections {
        let label = humanize(&rejection.code());
        if *rejection == ScreeningFlag::ConfirmedLeasehold {
            factors.hard_blockers.push(label);
        } else {
            factors.soft_blockers.push(label);
        }
    }
    factors
        .negative
        .extend(screening.warnings.iter().map(|warning| humanize(&warning.code())));

    let (level, headline) = if !factors.hard_blockers.is_empty() {
        (
            RecommendationLevel::Decline,
            "Not suitable - deal-breaking issues identified",
        )
    } else if factors.soft_blockers.len() >= 2 {
        (
            RecommendationLevel::LikelyDecline,
            "Significant concerns - likely not viable",
        )
    } else if factors.unknown.len() >= 3 {
        (
            RecommendationLevel::ReviewRequired,
            "Insufficient data - requires investigation",
        )
    } else if factors.positive.len() >= 3 && factors.negative.len() <= 1 {
        (
            RecommendationLevel::Proceed,
            "Promising opportunity - proceed to due diligence",
        )
    } else if factors.positive.len() >= 2 {
        (
            RecommendationLevel::ProceedWithCaution,
            "Potential opportunity - verify key items",
        )
    } else {
        (
            RecommendationLevel::ReviewRequired,
            "Mixed signals - requires deeper analysis",
        )
    };

    let mut required_actions = Vec::new();
    if listing.tenure == Tenure::Unknown {
        required_actions.push("Verify freehold tenure via Land Registry (£3)".to_string());
    }
    if listing.estimated_units.is_none() {
        required_actions.push("Confirm unit count from EPC data or viewing".to_string());
    }
    required_actions.push("Order title register to check for charges/restrictions".to_string());

    build(
        level,
        Stage::Initial,
        0.4,
        headline,
        factors,
        Actions {
            required: required_actions,
            optional: strings(&[
                "Request agent call for more details",
                "Check planning portal for history",
                "Review EPC certificates for each unit",
            ]),
        },
        None,
        BenefitConfidence::None,
        RiskLevel::Unknown,
    )
}

pub fn enriched_recommendation(
    listing: &ListingSnapshot,
    signals: &EnrichmentSignals,
) -> Recommendation {
    let mut factors = Factors::default();
    let units = listing.estimated_units.unwrap_or(0) as usize;

    match listing.tenure {
        Tenure::Freehold => factors.positive.push("Freehold tenure confirmed/likely".to_string()),
        Tenure::Leasehold => factors.hard_blockers.push("Leasehold tenure".to_string()),
        Tenure::ShareOfFreehold | Tenure::Unknown => {}
    }

    if let Some(count @ 2..=8) = listing.estimated_units {
        factors.positive.push(format!("{count} units - suitable scale"));
    }

    let epc_coverage = signals.epc_count > 0 && signals.epc_count >= units;
    if epc_coverage {
        factors
            .positive
            .push(format!("EPC data found for all {} units", signals.epc_count));
    } else if signals.epc_count > 0 {
        factors.negative.push(format!(
            "Only {} EPCs found - may be missing units",
            signals.epc_count
        ));
    } else {
        factors
            .unknown
            .push("No EPC data - floor areas unverified".to_string());
    }

    match signals.comparable_count {
        count @ 10.. => factors
            .positive
            .push(format!("Strong comparable evidence ({count} sales)")),
        count @ 5..=9 => factors
            .positive
            .push(format!("Good comparable evidence ({count} sales)")),
        count @ 3..=4 => factors
            .negative
            .push(format!("Limited comparables ({count} sales)")),
        _ => factors
            .unknown
            .push("Insufficient comparable sales data".to_string()),
    }

    let uplift = signals.estimated_uplift.filter(|uplift| *uplift != 0);
    if let Some(uplift) = uplift {
        let formatted = format_gbp(uplift);
        if uplift >= 50_000 {
            factors
                .positive
                .push(format!("Strong gross uplift potential: {formatted}"));
        } else if uplift >= 25_000 {
            factors
                .positive
                .push(format!("Good gross uplift potential: {formatted}"));
        } else if uplift >= 10_000 {
            factors
                .negative
                .push(format!("Modest uplift potential: {formatted}"));
        } else {
            factors.soft_blockers.push(format!("Limited uplift: {formatted}"));
        }
    }

    match signals.average_energy_rating {
        Some(rating) if rating.is_poor() => factors.positive.push(format!(
            "Average EPC {} - EPC uplift opportunity",
            rating.label()
        )),
        Some(EnergyRating::D) => factors
            .positive
            .push("EPC D - some improvement potential".to_string()),
        _ => {}
    }

    let (level, headline) = if !factors.hard_blockers.is_empty() {
        (
            RecommendationLevel::Decline,
            "Not viable - critical issues identified",
        )
    } else if factors.soft_blockers.len() >= 2 {
        (
            RecommendationLevel::LikelyDecline,
            "Marginal opportunity - significant concerns",
        )
    } else if factors.positive.len() >= 4 && factors.negative.is_empty() {
        (
            RecommendationLevel::StrongProceed,
            "Strong opportunity - priority for due diligence",
        )
    } else if factors.positive.len() >= 3 {
        (
            RecommendationLevel::Proceed,
            "Good opportunity - proceed to verification",
        )
    } else if factors.positive.len() >= 2 {
        (
            RecommendationLevel::ProceedWithCaution,
            "Potential opportunity - address concerns",
        )
    } else {
        (
            RecommendationLevel::ReviewRequired,
            "Further investigation needed",
        )
    };

    // Tenths so the additive confidence stays exact.
    let coverage_points = [epc_coverage, signals.comparable_count >= 5, uplift.is_some()]
        .iter()
        .filter(|hit| **hit)
        .count();
    let confidence = ((5 + coverage_points).min(8)) as f64 / 10.0;

    build(
        level,
        Stage::Enriched,
        confidence,
        headline,
        factors,
        Actions {
            required: strings(&[
                "Order official title copies from Land Registry",
                "Arrange viewing to verify unit layout",
                "Check planning portal for conversion consent",
            ]),
            optional: Vec::new(),
        },
        uplift,
        if signals.comparable_count >= 5 {
            BenefitConfidence::Medium
        } else {
            BenefitConfidence::Low
        },
        RiskLevel::Medium,
    )
}

/// Recommendation from a manual verification record. `impacts` are the
/// assessed impacts of the same record; their negative findings and
/// follow-up actions are carried through.
pub fn verified_recommendation(
    record: &VerificationRecord,
    impacts: &[Impact],
    estimated_net_benefit: Option<i64>,
) -> Recommendation {
    let mut factors = Factors::default();

    if let Some(title) = &record.title.verification {
        match title.tenure_confirmed {
            Some(TenureCode::Freehold) => factors
                .positive
                .push("Freehold tenure verified via Land Registry".to_string()),
            Some(TenureCode::Leasehold) => factors
                .hard_blockers
                .push("Leasehold tenure - not suitable".to_string()),
            None => {}
        }

        match title.is_single_title {
            Some(true) => factors
                .positive
                .push("Single title confirmed - clear for splitting".to_string()),
            Some(false) => factors
                .hard_blockers
                .push("Already split into multiple titles".to_string()),
            None => {}
        }

        match title.title_class {
            Some(TitleClass::Absolute) => factors
                .positive
                .push("Absolute title class - best quality".to_string()),
            Some(TitleClass::Possessory) => factors
                .soft_blockers
                .push("Possessory title - requires insurance".to_string()),
            Some(TitleClass::Qualified) | None => {}
        }
    }

    for charge in &record.title.charges {
        match charge.consent_likelihood {
            Some(ConsentLikelihood::Refused) => factors
                .hard_blockers
                .push(format!("Lender consent refused: {}", charge.lender_name)),
            Some(ConsentLikelihood::Unlikely) => factors
                .soft_blockers
                .push(format!("Lender consent unlikely: {}", charge.lender_name)),
            Some(ConsentLikelihood::Likely) => factors
                .positive
                .push(format!("Lender consent likely: {}", charge.lender_name)),
            Some(ConsentLikelihood::Uncertain) | None => {}
        }
    }

    for covenant in &record.title.covenants {
        if covenant.blocks_split() {
            factors
                .hard_blockers
                .push(format!("Covenant blocks split: {}", covenant.summary));
        } else if covenant.affects_title_split == Some(true) {
            factors
                .soft_blockers
                .push(format!("Covenant concern: {}", covenant.summary));
        }
    }

    if let Some(status) = &record.planning.planning_status {
        match status.current_use_class {
            Some(UseClass::C3) => factors.positive.push("C3 use class confirmed".to_string()),
            Some(UseClass::SuiGeneris) => factors
                .soft_blockers
                .push("Sui generis use class - may complicate".to_string()),
            Some(UseClass::C4) | None => {}
        }

        match status.original_conversion_consented {
            Some(true) => factors
                .positive
                .push("Original conversion properly consented".to_string()),
            Some(false) => factors
                .hard_blockers
                .push("Conversion not consented - regularisation needed".to_string()),
            None => {}
        }
    }

    if record
        .planning
        .hmo_licensing
        .as_ref()
        .is_some_and(|hmo| hmo.unlicensed())
    {
        factors
            .hard_blockers
            .push("HMO licence required but not held".to_string());
    }

    if let Some(physical) = &record.physical {
        if physical.all_self_contained() {
            factors
                .positive
                .push("All units verified as self-contained".to_string());
        } else if !physical.non_self_contained().is_empty() {
            factors
                .hard_blockers
                .push("Not all units self-contained".to_string());
        }
    }

    factors.hard_blockers.extend(record.red_flags.iter().cloned());
    factors.positive.extend(record.green_flags.iter().cloned());

    factors.negative.extend(
        impacts
            .iter()
            .filter(|impact| {
                matches!(
                    impact.class,
                    ImpactClass::MajorNegative | ImpactClass::MinorNegative
                )
            })
            .map(|impact| impact.headline.clone()),
    );

    let (level, headline) = if !factors.hard_blockers.is_empty() {
        (
            RecommendationLevel::Decline,
            "Do not proceed - verified blockers present",
        )
    } else if factors.soft_blockers.len() >= 2 {
        (
            RecommendationLevel::LikelyDecline,
            "Significant verified concerns - likely not viable",
        )
    } else if factors.positive.len() >= 5 && factors.soft_blockers.is_empty() {
        (
            RecommendationLevel::StrongProceed,
            "Verified opportunity - proceed to purchase",
        )
    } else if factors.positive.len() >= 4 {
        (
            RecommendationLevel::Proceed,
            "Good verified opportunity - proceed",
        )
    } else {
        (
            RecommendationLevel::ProceedWithCaution,
            "Proceed with noted concerns",
        )
    };

    let blocked = !factors.hard_blockers.is_empty();
    let required = if blocked {
        vec!["Do not proceed".to_string()]
    } else {
        let mut actions: Vec<String> = Vec::new();
        for action in impacts.iter().flat_map(|impact| &impact.required_actions) {
            if !actions.contains(action) {
                actions.push(action.clone());
            }
        }
        actions.push("Proceed to offer".to_string());
        actions
    };
    let optional = impacts
        .iter()
        .flat_map(|impact| impact.mitigation_options.iter().cloned())
        .collect();

    let stage = if record.is_fully_verified() {
        Stage::FullyVerified
    } else {
        Stage::PartiallyVerified
    };
    let risk_level = if factors.positive.len() > factors.soft_blockers.len() {
        RiskLevel::Low
    } else {
        RiskLevel::Medium
    };
    let benefit = estimated_net_benefit.filter(|benefit| *benefit != 0);

    build(
        level,
        stage,
        if blocked { 0.95 } else { 0.9 },
        headline,
        factors,
        Actions { required, optional },
        estimated_net_benefit,
        if benefit.is_some() {
            BenefitConfidence::High
        } else {
            BenefitConfidence::Medium
        },
        risk_level,
    )
}

struct Actions {
    required: Vec<String>,
    optional: Vec<String>,
}

#[allow(clippy::too_many_arguments)]
fn build(
    level: RecommendationLevel,
    stage: Stage,
    confidence: f64,
    headline: &str,
    factors: Factors,
    actions: Actions,
    estimated_net_benefit: Option<i64>,
    benefit_confidence: BenefitConfidence,
    risk_level: RiskLevel,
) -> Recommendation {
    Recommendation {
        level,
        stage,
        confidence,
        headline: headline.to_string(),
        summary: summary(level, &factors),
        positive_factors: factors.positive,
        negative_factors: factors.negative,
        unknown_factors: factors.unknown,
        hard_blockers: factors.hard_blockers,
        soft_blockers: factors.soft_blockers,
        required_actions: actions.required,
        optional_actions: actions.optional,
        estimated_net_benefit,
        benefit_confidence,
        risk_level,
    }
}

fn summary(level: RecommendationLevel, factors: &Factors) -> String {
    match level {
        RecommendationLevel::Decline => "This property has critical issues that make it unsuitable for title splitting. Do not proceed.".to_string(),
        RecommendationLevel::StrongProceed => format!(
            "Strong opportunity with {} positive factors identified. Recommend proceeding to due diligence as a priority.",
            factors.positive.len()
        ),
        RecommendationLevel::Proceed => format!(
            "Good opportunity with {} positive factors. {}",
            factors.positive.len(),
            if factors.negative.is_empty() {
                "No significant concerns."
            } else {
                "Minor concerns to address."
            }
        ),
        RecommendationLevel::ProceedWithCaution => format!(
            "Potential opportunity but {} concerns noted. Verify key items before committing.",
            factors.negative.len()
        ),
        RecommendationLevel::ReviewRequired => format!(
            "Mixed signals with {} unknown factors. Further investigation required before assessment.",
            factors.unknown.len()
        ),
        RecommendationLevel::LikelyDecline | RecommendationLevel::InsufficientData => {
            "Assessment pending - insufficient data for recommendation.".to_string()
        }
    }
}

/// `red_flag_condition_risk` -> `Red Flag Condition Risk`.
fn humanize(code: &str) -> String {
    code.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PropertyId;
    use crate::screening::initial_screen;
    use crate::verification::{
        ChargeType, ExistingCharge, ImpactAssessor, PhysicalVerification, PlanningStatus,
        TitleVerification, UnitVerification,
    };

    fn listing(tenure: Tenure, units: Option<u32>, asking_price: i64) -> ListingSnapshot {
        ListingSnapshot {
            property_id: PropertyId("rm-100".to_string()),
            postcode: "PR9 0NP".to_string(),
            asking_price,
            estimated_units: units,
            tenure,
            tenure_confidence: 0.9,
            unit_confidence: 0.8,
            refurb_indicators: vec!["requires modernisation".to_string()],
            description: String::new(),
        }
    }

    fn verified_record() -> VerificationRecord {
        let mut record = VerificationRecord::new(PropertyId("rm-100".to_string()));
        record.title.verification = Some(TitleVerification {
            tenure_confirmed: Some(TenureCode::Freehold),
            is_single_title: Some(true),
            title_class: Some(TitleClass::Absolute),
            ..TitleVerification::default()
        });
        record.planning.planning_status = Some(PlanningStatus {
            current_use_class: Some(UseClass::C3),
            original_conversion_consented: Some(true),
            in_article_4_area: None,
        });
        record.physical = Some(PhysicalVerification {
            units: vec![UnitVerification {
                unit_identifier: "Flat 1".to_string(),
                is_self_contained: Some(true),
                bedrooms: Some(1),
                floor_area_sqft: Some(480.0),
            }],
            structural_concerns: Vec::new(),
        });
        record
    }

    #[test]
    fn initial_stage_proceeds_on_cheap_freehold_block() {
        let block = listing(Tenure::Freehold, Some(4), 150_000);
        let recommendation = initial_recommendation(&block, &initial_screen(&block));

        assert_eq!(recommendation.level, RecommendationLevel::Proceed);
        assert_eq!(recommendation.stage, Stage::Initial);
        assert_eq!(recommendation.confidence, 0.4);
        assert_eq!(recommendation.positive_factors.len(), 4);
        assert!(recommendation.positive_factors[2].contains("£37,500/unit"));
        assert_eq!(
            recommendation.required_actions,
            vec!["Order title register to check for charges/restrictions".to_string()]
        );
    }

    #[test]
    fn initial_stage_declines_leasehold_from_screening() {
        let block = listing(Tenure::Leasehold, Some(4), 150_000);
        let recommendation = initial_recommendation(&block, &initial_screen(&block));

        assert_eq!(recommendation.level, RecommendationLevel::Decline);
        assert_eq!(
            recommendation.hard_blockers,
            vec![
                "Leasehold - not suitable for title splitting".to_string(),
                "Confirmed Leasehold".to_string()
            ]
        );
    }

    #[test]
    fn initial_stage_flags_unknowns_for_review() {
        let mut block = listing(Tenure::Unknown, None, 150_000);
        block.refurb_indicators.clear();
        let recommendation = initial_recommendation(&block, &initial_screen(&block));

        assert_eq!(recommendation.level, RecommendationLevel::ReviewRequired);
        assert_eq!(recommendation.unknown_factors.len(), 2);
        assert_eq!(recommendation.negative_factors, vec!["Unit Count Unclear".to_string()]);
        assert_eq!(recommendation.required_actions.len(), 3);
    }

    #[test]
    fn enriched_confidence_adds_coverage_and_caps() {
        let block = listing(Tenure::Freehold, Some(4), 280_000);
        let signals = EnrichmentSignals {
            epc_count: 4,
            comparable_count: 12,
            estimated_uplift: Some(95_000),
            average_energy_rating: Some(EnergyRating::E),
        };

        let recommendation = enriched_recommendation(&block, &signals);

        assert_eq!(recommendation.level, RecommendationLevel::StrongProceed);
        assert_eq!(recommendation.confidence, 0.8);
        assert_eq!(recommendation.estimated_net_benefit, Some(95_000));
        assert_eq!(recommendation.benefit_confidence, BenefitConfidence::Medium);
        assert!(recommendation
            .positive_factors
            .contains(&"Average EPC E - EPC uplift opportunity".to_string()));

        let thin = enriched_recommendation(
            &block,
            &EnrichmentSignals {
                epc_count: 0,
                comparable_count: 2,
                estimated_uplift: None,
                average_energy_rating: None,
            },
        );
        assert_eq!(thin.confidence, 0.5);
        assert_eq!(thin.unknown_factors.len(), 2);
    }

    #[test]
    fn enriched_small_uplift_is_a_soft_blocker() {
        let block = listing(Tenure::Freehold, Some(4), 280_000);
        let recommendation = enriched_recommendation(
            &block,
            &EnrichmentSignals {
                epc_count: 2,
                comparable_count: 4,
                estimated_uplift: Some(-4_000),
                average_energy_rating: None,
            },
        );

        assert_eq!(recommendation.soft_blockers, vec!["Limited uplift: -£4,000".to_string()]);
        assert_eq!(recommendation.level, RecommendationLevel::ProceedWithCaution);
    }

    #[test]
    fn verified_stage_strong_when_everything_checks_out() {
        let record = verified_record();
        let impacts = ImpactAssessor::new().assess(&record);
        let recommendation = verified_recommendation(&record, &impacts, Some(42_000));

        assert_eq!(recommendation.stage, Stage::FullyVerified);
        assert_eq!(recommendation.level, RecommendationLevel::StrongProceed);
        assert_eq!(recommendation.confidence, 0.9);
        assert_eq!(recommendation.benefit_confidence, BenefitConfidence::High);
        assert_eq!(recommendation.risk_level, RiskLevel::Low);
        assert_eq!(recommendation.required_actions, vec!["Proceed to offer".to_string()]);
    }

    #[test]
    fn verified_stage_declines_on_refused_consent() {
        let mut record = verified_record();
        record.physical = None;
        record.title.charges.push(ExistingCharge {
            lender_name: "Northern Bank".to_string(),
            charge_type: ChargeType::LegalCharge,
            is_all_monies_charge: None,
            has_consent_restriction: None,
            consent_likelihood: Some(ConsentLikelihood::Refused),
            consent_fee_quoted: None,
        });
        let impacts = ImpactAssessor::new().assess(&record);

        let recommendation = verified_recommendation(&record, &impacts, None);

        assert_eq!(recommendation.stage, Stage::PartiallyVerified);
        assert_eq!(recommendation.level, RecommendationLevel::Decline);
        assert_eq!(recommendation.confidence, 0.95);
        assert_eq!(recommendation.required_actions, vec!["Do not proceed".to_string()]);
        assert!(recommendation
            .hard_blockers
            .contains(&"Lender consent refused: Northern Bank".to_string()));
    }

    #[test]
    fn humanize_title_cases_codes() {
        assert_eq!(humanize("red_flag_condition_risk"), "Red Flag Condition Risk");
        assert_eq!(humanize("large_block"), "Large Block");
    }

    #[test]
    fn insufficient_data_has_zero_confidence() {
        let recommendation =
            Recommendation::insufficient_data(Stage::Enriched, "No comparables or EPCs supplied");
        assert_eq!(recommendation.level, RecommendationLevel::InsufficientData);
        assert_eq!(recommendation.confidence, 0.0);
        assert_eq!(recommendation.summary, "No comparables or EPCs supplied");
    }
}
