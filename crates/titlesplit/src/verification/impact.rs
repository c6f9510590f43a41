use super::{
    BreachRisk, ConsentLikelihood, ExistingCharge, HmoLicensing, PhysicalVerification,
    RestrictiveCovenant, TitleClass, TitleVerification, UseClass, VerificationRecord,
};
use crate::domain::TenureCode;
use crate::score::{ImpactScore, Score};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Ordinal strength of an impact, worst first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactClass {
    Blocker,
    MajorNegative,
    MinorNegative,
    Neutral,
    MinorPositive,
    MajorPositive,
    Enabler,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactCategory {
    Title,
    Planning,
    Physical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Impact {
    pub category: ImpactCategory,
    pub field: String,
    pub observed_value: String,
    pub class: ImpactClass,
    pub score: ImpactScore,
    pub headline: String,
    pub explanation: String,
    pub cost_impact: Option<i64>,
    pub time_impact_weeks: Option<u32>,
    pub required_actions: Vec<String>,
    pub mitigation_options: Vec<String>,
}

impl Impact {
    fn new(
        category: ImpactCategory,
        field: &str,
        observed_value: impl Into<String>,
        class: ImpactClass,
        score: i16,
    ) -> Self {
        Self {
            category,
            field: field.to_string(),
            observed_value: observed_value.into(),
            class,
            score: ImpactScore::new(score),
            headline: String::new(),
            explanation: String::new(),
            cost_impact: None,
            time_impact_weeks: None,
            required_actions: Vec::new(),
            mitigation_options: Vec::new(),
        }
    }

    fn headline(mut self, headline: impl Into<String>, explanation: impl Into<String>) -> Self {
        self.headline = headline.into();
        self.explanation = explanation.into();
        self
    }

    fn cost(mut self, amount: i64) -> Self {
        self.cost_impact = Some(amount);
        self
    }

    fn weeks(mut self, weeks: u32) -> Self {
        self.time_impact_weeks = Some(weeks);
        self
    }

    fn actions(mut self, actions: &[&str]) -> Self {
        self.required_actions = actions.iter().map(|action| action.to_string()).collect();
        self
    }

    fn mitigations(mut self, options: &[&str]) -> Self {
        self.mitigation_options = options.iter().map(|option| option.to_string()).collect();
        self
    }

    pub fn is_blocker(&self) -> bool {
        self.class == ImpactClass::Blocker
    }
}

/// Rule tables mapping verified facts to deal impacts.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImpactAssessor;

impl ImpactAssessor {
    pub fn new() -> Self {
        Self
    }

    /// Every impact the record supports, title first, then planning and
    /// physical findings.
    pub fn assess(&self, record: &VerificationRecord) -> Vec<Impact> {
        let mut impacts = Vec::new();

        if let Some(title) = &record.title.verification {
            impacts.extend(self.assess_title(title));
        }
        impacts.extend(record.title.charges.iter().map(|c| self.assess_charge(c)));
        impacts.extend(record.title.covenants.iter().map(|c| self.assess_covenant(c)));

        if let Some(use_class) = record
            .planning
            .planning_status
            .as_ref()
            .and_then(|status| status.current_use_class)
        {
            impacts.push(self.assess_use_class(use_class));
        }
        if let Some(hmo) = &record.planning.hmo_licensing {
            impacts.extend(self.assess_hmo_licensing(hmo));
        }
        if let Some(physical) = &record.physical {
            impacts.extend(self.assess_physical(physical));
        }

        debug!(
            property_id = %record.property_id.0,
            impacts = impacts.len(),
            blockers = impacts.iter().filter(|impact| impact.is_blocker()).count(),
            "verification assessed"
        );
        impacts
    }

    pub fn assess_title(&self, title: &TitleVerification) -> Vec<Impact> {
        let mut impacts = Vec::new();
        if let Some(tenure) = title.tenure_confirmed {
            impacts.push(self.assess_tenure(tenure));
        }
        if let Some(single) = title.is_single_title {
            impacts.push(self.assess_single_title(single));
        }
        if let Some(class) = title.title_class {
            impacts.push(self.assess_title_class(class));
        }
        impacts
    }

    pub fn assess_tenure(&self, tenure: TenureCode) -> Impact {
        match tenure {
            TenureCode::Freehold => Impact::new(
                ImpactCategory::Title,
                "tenure_confirmed",
                "freehold",
                ImpactClass::Enabler,
                30,
            )
            .headline(
                "Freehold tenure confirmed",
                "Title register confirms freehold tenure - essential for title splitting.",
            ),
            TenureCode::Leasehold => Impact::new(
                ImpactCategory::Title,
                "tenure_confirmed",
                "leasehold",
                ImpactClass::Blocker,
                ImpactScore::MIN,
            )
            .headline(
                "BLOCKER: Leasehold tenure",
                "Leasehold tenure prevents title splitting without acquiring freehold first.",
            )
            .actions(&["Do not proceed with title split strategy"]),
        }
    }

    pub fn assess_single_title(&self, is_single_title: bool) -> Impact {
        if is_single_title {
            Impact::new(
                ImpactCategory::Title,
                "is_single_title",
                "Yes - all units on single title",
                ImpactClass::Enabler,
                20,
            )
            .headline(
                "Single title confirmed",
                "All units on single freehold title - ideal for splitting.",
            )
        } else {
            Impact::new(
                ImpactCategory::Title,
                "is_single_title",
                "No - multiple titles exist",
                ImpactClass::Blocker,
                ImpactScore::MIN,
            )
            .headline(
                "BLOCKER: Already split",
                "Units already on separate titles - no splitting opportunity.",
            )
        }
    }

    pub fn assess_title_class(&self, class: TitleClass) -> Impact {
        match class {
            TitleClass::Absolute => Impact::new(
                ImpactCategory::Title,
                "title_class",
                "Absolute title",
                ImpactClass::MinorPositive,
                5,
            )
            .headline("Absolute title - best class", "Highest level of state guarantee."),
            TitleClass::Qualified => Impact::new(
                ImpactCategory::Title,
                "title_class",
                "Qualified title",
                ImpactClass::MinorNegative,
                -10,
            )
            .headline(
                "Qualified title - minor concern",
                "Land Registry has excepted a specific matter. Check what is excepted.",
            )
            .cost(500)
            .actions(&["Review the qualification", "Obtain title insurance quote"]),
            TitleClass::Possessory => Impact::new(
                ImpactCategory::Title,
                "title_class",
                "Possessory title",
                ImpactClass::MajorNegative,
                -30,
            )
            .headline(
                "Possessory title - requires insurance",
                "Limited state guarantee. Many lenders won't lend on possessory title.",
            )
            .cost(1_500)
            .weeks(4)
            .actions(&["Check if title upgrade possible", "Obtain title insurance quote"]),
        }
    }

    pub fn assess_use_class(&self, use_class: UseClass) -> Impact {
        let base = |class, score| {
            Impact::new(
                ImpactCategory::Planning,
                "current_use_class",
                use_class.label(),
                class,
                score,
            )
        };

        match use_class {
            UseClass::C3 => base(ImpactClass::Enabler, 15).headline(
                "C3 Use Class - standard residential",
                "Standard residential use. Title split doesn't require planning.",
            ),
            UseClass::C4 => base(ImpactClass::MinorNegative, -10)
                .headline(
                    "C4 Use Class - small HMO",
                    "HMO use. Check Article 4 direction and licensing requirements.",
                )
                .actions(&["Verify Article 4 status", "Confirm HMO licensing"]),
            UseClass::SuiGeneris => base(ImpactClass::MajorNegative, -25)
                .headline(
                    "Sui Generis - complex planning",
                    "Large HMO or specialist use. Mandatory HMO licensing applies.",
                )
                .cost(2_000)
                .weeks(12),
        }
    }

    pub fn assess_charge(&self, charge: &ExistingCharge) -> Impact {
        if charge.consent_likelihood == Some(ConsentLikelihood::Refused) {
            return Impact::new(
                ImpactCategory::Title,
                "existing_charge",
                format!("{} - consent refused", charge.lender_name),
                ImpactClass::Blocker,
                ImpactScore::MIN,
            )
            .headline(
                format!("BLOCKER: {} refused consent", charge.lender_name),
                "Lender has refused consent for title split.",
            )
            .actions(&["Negotiate with lender", "Consider full repayment before split"]);
        }

        let mut base_score: i16 = -15;
        if charge.is_all_monies_charge == Some(true) {
            base_score -= 10;
        }
        if charge.has_consent_restriction == Some(true) {
            base_score -= 10;
        }

        let (class, score) = match charge.consent_likelihood {
            Some(ConsentLikelihood::Likely) => (ImpactClass::MinorNegative, -10),
            Some(ConsentLikelihood::Unlikely) => (ImpactClass::MajorNegative, -30),
            Some(ConsentLikelihood::Uncertain) | Some(ConsentLikelihood::Refused) | None => {
                (ImpactClass::MajorNegative, base_score)
            }
        };

        Impact::new(
            ImpactCategory::Title,
            "existing_charge",
            format!("{} ({})", charge.lender_name, charge.charge_type.code()),
            class,
            score,
        )
        .headline(
            format!("Existing charge: {}", charge.lender_name),
            "Lender consent required for title split.",
        )
        .cost(charge.consent_fee_quoted.filter(|fee| *fee > 0).unwrap_or(1_500))
        .weeks(4)
        .actions(&["Apply for lender consent"])
    }

    pub fn assess_covenant(&self, covenant: &RestrictiveCovenant) -> Impact {
        let short: String = covenant.summary.chars().take(50).collect();

        if covenant.affects_title_split == Some(true) {
            if covenant.breach_risk == Some(BreachRisk::High) {
                return Impact::new(
                    ImpactCategory::Title,
                    "restrictive_covenant",
                    short,
                    ImpactClass::MajorNegative,
                    -35,
                )
                .headline(
                    "Covenant may block split",
                    format!("Covenant restricts: {}", covenant.summary),
                )
                .cost(
                    covenant
                        .insurance_cost_estimate
                        .filter(|cost| *cost > 0)
                        .unwrap_or(1_500),
                )
                .actions(&["Review covenant wording", "Obtain title insurance quote"])
                .mitigations(&["Indemnity insurance", "Apply to release the covenant"]);
            }

            return Impact::new(
                ImpactCategory::Title,
                "restrictive_covenant",
                short,
                ImpactClass::MinorNegative,
                -15,
            )
            .headline(
                "Covenant noted - review required",
                format!("Covenant: {}", covenant.summary),
            )
            .actions(&["Review with solicitor"]);
        }

        Impact::new(
            ImpactCategory::Title,
            "restrictive_covenant",
            "Not affecting split",
            ImpactClass::Neutral,
            0,
        )
        .headline(
            "Covenant - not affecting split",
            "Does not appear to affect title splitting.",
        )
    }

    pub fn assess_hmo_licensing(&self, hmo: &HmoLicensing) -> Vec<Impact> {
        let mut impacts = Vec::new();

        if hmo.requires_mandatory_licence == Some(true) {
            if hmo.licence_held == Some(true) {
                let number = hmo.licence_number.as_deref().unwrap_or("unknown");
                impacts.push(
                    Impact::new(
                        ImpactCategory::Planning,
                        "hmo_mandatory_licence",
                        "Required - licence held",
                        ImpactClass::Neutral,
                        0,
                    )
                    .headline(
                        "Mandatory HMO licence in place",
                        format!("Licence #{number} held."),
                    )
                    .actions(&["Confirm transferability"]),
                );
            } else {
                impacts.push(
                    Impact::new(
                        ImpactCategory::Planning,
                        "hmo_mandatory_licence",
                        "Required - NO LICENCE",
                        ImpactClass::Blocker,
                        ImpactScore::MIN,
                    )
                    .headline(
                        "BLOCKER: No mandatory HMO licence",
                        "Operating without licence is criminal offence.",
                    )
                    .cost(5_000)
                    .actions(&["Verify licence status", "Factor into negotiation"]),
                );
            }
        }

        if hmo.fire_safety_compliant == Some(false) {
            impacts.push(
                Impact::new(
                    ImpactCategory::Planning,
                    "hmo_fire_safety",
                    "Non-compliant",
                    ImpactClass::MajorNegative,
                    -35,
                )
                .headline(
                    "Fire safety non-compliant",
                    "Property does not meet fire safety requirements.",
                )
                .cost(5_000)
                .actions(&["Obtain fire risk assessment", "Budget for works"]),
            );
        }

        impacts
    }

    pub fn assess_physical(&self, physical: &PhysicalVerification) -> Vec<Impact> {
        let mut impacts = Vec::new();

        let failing = physical.non_self_contained();
        if !failing.is_empty() {
            let names = failing
                .iter()
                .map(|unit| unit.unit_identifier.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            impacts.push(
                Impact::new(
                    ImpactCategory::Physical,
                    "self_contained",
                    format!("Not self-contained: {names}"),
                    ImpactClass::MajorNegative,
                    -40,
                )
                .headline(
                    format!("Units not self-contained: {names}"),
                    "Self-containment required for mortgageability.",
                )
                .cost(10_000 * failing.len() as i64)
                .actions(&["Assess conversion feasibility", "Recalculate values"]),
            );
        } else if physical.all_self_contained() {
            impacts.push(
                Impact::new(
                    ImpactCategory::Physical,
                    "self_contained",
                    "All units self-contained",
                    ImpactClass::Enabler,
                    25,
                )
                .headline(
                    "All units self-contained",
                    "Each unit has own entrance, kitchen, bathroom.",
                ),
            );
        }

        if !physical.structural_concerns.is_empty() {
            let observed = physical
                .structural_concerns
                .iter()
                .take(2)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ");
            impacts.push(
                Impact::new(
                    ImpactCategory::Physical,
                    "structural_concerns",
                    observed,
                    ImpactClass::MajorNegative,
                    -50,
                )
                .headline(
                    "Structural concerns identified",
                    format!("Issues: {}", physical.structural_concerns.join(", ")),
                )
                .cost(15_000)
                .weeks(8)
                .actions(&["Commission structural engineer report"]),
            );
        }

        impacts
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalImpact {
    pub total_score: Score,
    pub has_blockers: bool,
    pub blockers: Vec<String>,
    pub additional_cost: i64,
    /// Longest single delay; concurrent delays do not stack.
    pub timeline_extension_weeks: u32,
    pub impact_count: usize,
    pub positive_count: usize,
    pub negative_count: usize,
}

pub fn calculate_total_impact(impacts: &[Impact]) -> TotalImpact {
    let blockers: Vec<String> = impacts
        .iter()
        .filter(|impact| impact.is_blocker())
        .map(|impact| impact.headline.clone())
        .collect();

    TotalImpact {
        total_score: impacts
            .iter()
            .fold(Score::ZERO, |total, impact| total + impact.score),
        has_blockers: !blockers.is_empty(),
        blockers,
        additional_cost: impacts.iter().filter_map(|impact| impact.cost_impact).sum(),
        timeline_extension_weeks: impacts
            .iter()
            .filter_map(|impact| impact.time_impact_weeks)
            .max()
            .unwrap_or(0),
        impact_count: impacts.len(),
        positive_count: impacts.iter().filter(|impact| impact.score.is_positive()).count(),
        negative_count: impacts.iter().filter(|impact| impact.score.is_negative()).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PropertyId;
    use crate::verification::{ChargeType, PlanningStatus, TitleInputs, UnitVerification};

    fn charge(likelihood: Option<ConsentLikelihood>) -> ExistingCharge {
        ExistingCharge {
            lender_name: "Northern Bank".to_string(),
            charge_type: ChargeType::LegalCharge,
            is_all_monies_charge: Some(true),
            has_consent_restriction: Some(true),
            consent_likelihood: likelihood,
            consent_fee_quoted: None,
        }
    }

    #[test]
    fn leasehold_and_split_titles_are_blockers() {
        let assessor = ImpactAssessor::new();
        let leasehold = assessor.assess_tenure(TenureCode::Leasehold);
        assert_eq!(leasehold.class, ImpactClass::Blocker);
        assert_eq!(leasehold.score, ImpactScore::BLOCKER);
        assert_eq!(leasehold.headline, "BLOCKER: Leasehold tenure");

        let split = assessor.assess_single_title(false);
        assert!(split.is_blocker());
        assert_eq!(assessor.assess_single_title(true).score.value(), 20);
        assert_eq!(assessor.assess_tenure(TenureCode::Freehold).score.value(), 30);
    }

    #[test]
    fn charge_scores_follow_consent_likelihood() {
        let assessor = ImpactAssessor::new();

        let refused = assessor.assess_charge(&charge(Some(ConsentLikelihood::Refused)));
        assert!(refused.is_blocker());
        assert_eq!(refused.headline, "BLOCKER: Northern Bank refused consent");
        assert_eq!(refused.cost_impact, None);

        let likely = assessor.assess_charge(&charge(Some(ConsentLikelihood::Likely)));
        assert_eq!((likely.class, likely.score.value()), (ImpactClass::MinorNegative, -10));

        let unlikely = assessor.assess_charge(&charge(Some(ConsentLikelihood::Unlikely)));
        assert_eq!(unlikely.score.value(), -30);

        let unknown = assessor.assess_charge(&charge(None));
        assert_eq!((unknown.class, unknown.score.value()), (ImpactClass::MajorNegative, -35));
        assert_eq!(unknown.cost_impact, Some(1_500));
        assert_eq!(unknown.time_impact_weeks, Some(4));
        assert_eq!(unknown.observed_value, "Northern Bank (legal_charge)");
    }

    #[test]
    fn high_risk_covenant_uses_insurance_estimate() {
        let covenant = RestrictiveCovenant {
            summary: "Not to use the property other than as a single private dwellinghouse"
                .to_string(),
            affects_title_split: Some(true),
            breach_risk: Some(BreachRisk::High),
            insurance_cost_estimate: Some(900),
        };

        let impact = ImpactAssessor::new().assess_covenant(&covenant);

        assert_eq!(impact.score.value(), -35);
        assert_eq!(impact.cost_impact, Some(900));
        assert_eq!(impact.observed_value.chars().count(), 50);

        let benign = RestrictiveCovenant {
            affects_title_split: Some(false),
            ..covenant
        };
        assert_eq!(ImpactAssessor::new().assess_covenant(&benign).class, ImpactClass::Neutral);
    }

    #[test]
    fn physical_findings_scale_with_failing_units() {
        let physical = PhysicalVerification {
            units: vec![
                UnitVerification {
                    unit_identifier: "Flat 1".to_string(),
                    is_self_contained: Some(false),
                    bedrooms: Some(1),
                    floor_area_sqft: None,
                },
                UnitVerification {
                    unit_identifier: "Flat 2".to_string(),
                    is_self_contained: Some(false),
                    bedrooms: Some(1),
                    floor_area_sqft: None,
                },
            ],
            structural_concerns: vec!["Rear wall bowing".to_string()],
        };

        let impacts = ImpactAssessor::new().assess_physical(&physical);

        assert_eq!(impacts.len(), 2);
        assert_eq!(impacts[0].headline, "Units not self-contained: Flat 1, Flat 2");
        assert_eq!(impacts[0].cost_impact, Some(20_000));
        assert_eq!(impacts[1].score.value(), -50);
        assert_eq!(
            impacts[1].required_actions,
            vec!["Commission structural engineer report".to_string()]
        );
    }

    #[test]
    fn totals_take_longest_delay_and_collect_blockers() {
        let mut record = VerificationRecord::new(PropertyId("rm-7".to_string()));
        record.title = TitleInputs {
            verification: Some(TitleVerification {
                tenure_confirmed: Some(TenureCode::Freehold),
                is_single_title: Some(true),
                title_class: Some(TitleClass::Possessory),
                ..TitleVerification::default()
            }),
            charges: vec![charge(Some(ConsentLikelihood::Refused))],
            covenants: Vec::new(),
        };
        record.planning.planning_status = Some(PlanningStatus {
            current_use_class: Some(UseClass::SuiGeneris),
            ..PlanningStatus::default()
        });

        let impacts = ImpactAssessor::new().assess(&record);
        let total = calculate_total_impact(&impacts);

        assert_eq!(total.impact_count, 5);
        // 30 + 20 - 30 - 100 - 25
        assert_eq!(total.total_score, Score::new(-105));
        assert_eq!(total.blockers, vec!["BLOCKER: Northern Bank refused consent".to_string()]);
        assert_eq!(total.additional_cost, 3_500);
        assert_eq!(total.timeline_extension_weeks, 12);
        assert_eq!(total.positive_count, 2);
        assert_eq!(total.negative_count, 3);
    }
}
