//! Composite opportunity score, the narrower title-split score and the
//! letter tier that combines them.

use crate::domain::{average_energy_rating, EnergyRating, EpcRecord, Tenure};
use crate::score::{Score, ScoreBucket};
use serde::{Deserialize, Serialize};

pub const TENURE_CAP: u32 = 30;
pub const FINANCIAL_CAP: u32 = 25;
pub const CONDITION_CAP: u32 = 20;
pub const RISK_CAP: u32 = 15;
pub const DATA_CONFIDENCE_CAP: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceAssessment {
    Undervalued,
    Fair,
    Overvalued,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefurbScope {
    #[default]
    None,
    Cosmetic,
    Light,
    Medium,
    Heavy,
}

/// Qualitative read of a listing supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingAssessment {
    pub single_title_likely: bool,
    pub single_title_evidence: String,
    pub self_contained: Option<bool>,
    pub price_assessment: PriceAssessment,
    pub refurb_needed: bool,
    pub refurb_scope: RefurbScope,
    pub red_flags: Vec<String>,
    pub amber_flags: Vec<String>,
    pub blockers: Vec<String>,
}

/// Everything the scorer reads, assembled per request.
#[derive(Debug, Clone, Copy)]
pub struct OpportunitySignals<'a> {
    pub tenure: Tenure,
    pub tenure_confidence: f64,
    pub estimated_units: u32,
    pub unit_confidence: f64,
    pub gross_uplift_percent: Option<f64>,
    pub assessment: &'a ListingAssessment,
    pub epcs: &'a [EpcRecord],
    pub comparable_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecommendationTier {
    A,
    B,
    C,
    D,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub opportunity_score: Score,
    pub title_split_score: Score,
    pub tier: RecommendationTier,
    pub has_blockers: bool,
    pub tenure: ScoreBucket,
    pub financial: ScoreBucket,
    pub condition: ScoreBucket,
    pub risk: ScoreBucket,
    pub data_confidence: ScoreBucket,
    pub average_energy_rating: Option<EnergyRating>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OpportunityScorer;

impl OpportunityScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, signals: &OpportunitySignals<'_>) -> ScoreBreakdown {
        let average_rating = average_energy_rating(signals.epcs);
        let tenure = tenure_bucket(signals);
        let financial = financial_bucket(signals);
        let condition = condition_bucket(signals.assessment, average_rating);
        let risk = risk_bucket(signals.assessment);
        let data_confidence = data_confidence_bucket(signals);

        let opportunity_score = [tenure, financial, condition, risk, data_confidence]
            .iter()
            .map(ScoreBucket::score)
            .sum::<Score>()
            .clamp(0, 100);
        let title_split_score = title_split_score(signals);
        let has_blockers = !signals.assessment.blockers.is_empty();

        ScoreBreakdown {
            opportunity_score,
            title_split_score,
            tier: recommendation_tier(opportunity_score, title_split_score, has_blockers),
            has_blockers,
            tenure,
            financial,
            condition,
            risk,
            data_confidence,
            average_energy_rating: average_rating,
        }
    }
}

fn tenure_bucket(signals: &OpportunitySignals<'_>) -> ScoreBucket {
    let mut bucket = ScoreBucket::empty(TENURE_CAP);
    match signals.tenure {
        Tenure::Freehold => {
            bucket.award(20);
            if signals.tenure_confidence > 0.8 {
                bucket.award(5);
            }
        }
        Tenure::Unknown => bucket.award(10),
        Tenure::Leasehold | Tenure::ShareOfFreehold => {}
    }
    if signals.assessment.single_title_likely {
        bucket.award(5);
    }
    bucket
}

fn financial_bucket(signals: &OpportunitySignals<'_>) -> ScoreBucket {
    let mut bucket = ScoreBucket::empty(FINANCIAL_CAP);
    let band = match signals.gross_uplift_percent {
        Some(uplift) if uplift >= 30.0 => 25,
        Some(uplift) if uplift >= 20.0 => 20,
        Some(uplift) if uplift >= 15.0 => 15,
        Some(uplift) if uplift >= 10.0 => 10,
        Some(uplift) if uplift >= 5.0 => 5,
        _ => 0,
    };
    bucket.award(band);
    if signals.assessment.price_assessment == PriceAssessment::Undervalued {
        bucket.award(5);
    }
    bucket
}

fn condition_bucket(
    assessment: &ListingAssessment,
    average_rating: Option<EnergyRating>,
) -> ScoreBucket {
    let mut bucket = ScoreBucket::empty(CONDITION_CAP);
    if assessment.refurb_needed {
        bucket.award(10);
        match assessment.refurb_scope {
            RefurbScope::Medium | RefurbScope::Heavy => bucket.award(5),
            RefurbScope::Light => bucket.award(3),
            RefurbScope::None | RefurbScope::Cosmetic => {}
        }
    }
    match average_rating {
        Some(rating) if rating.is_poor() => bucket.award(5),
        Some(EnergyRating::D) => bucket.award(3),
        _ => {}
    }
    bucket
}

fn risk_bucket(assessment: &ListingAssessment) -> ScoreBucket {
    let mut bucket = ScoreBucket::full(RISK_CAP);
    let deduction = assessment.red_flags.len() * 5
        + assessment.amber_flags.len() * 2
        + assessment.blockers.len() * 3;
    bucket.deduct(u32::try_from(deduction).unwrap_or(u32::MAX));
    bucket
}

fn data_confidence_bucket(signals: &OpportunitySignals<'_>) -> ScoreBucket {
    let mut bucket = ScoreBucket::empty(DATA_CONFIDENCE_CAP);
    for confidence in [signals.unit_confidence, signals.tenure_confidence] {
        if confidence > 0.8 {
            bucket.award(3);
        } else if confidence > 0.6 {
            bucket.award(1);
        }
    }

    let epc_count = signals.epcs.len();
    if epc_count > 0 && epc_count >= signals.estimated_units as usize {
        bucket.award(2);
    } else if epc_count > 0 {
        bucket.award(1);
    }

    if signals.comparable_count >= 5 {
        bucket.award(2);
    } else if signals.comparable_count >= 3 {
        bucket.award(1);
    }
    bucket
}

/// Title-split suitability: freehold 40, single title 25, self-contained
/// units 20, unit-count sweet spot 15.
pub fn title_split_score(signals: &OpportunitySignals<'_>) -> Score {
    let mut freehold = ScoreBucket::empty(40);
    if signals.tenure == Tenure::Freehold {
        freehold.award(30);
        if signals.tenure_confidence > 0.9 {
            freehold.award(10);
        } else if signals.tenure_confidence > 0.7 {
            freehold.award(5);
        }
    }

    let mut single_title = ScoreBucket::empty(25);
    if signals.assessment.single_title_likely {
        single_title.award(20);
        if signals
            .assessment
            .single_title_evidence
            .to_lowercase()
            .contains("single")
        {
            single_title.award(5);
        }
    }

    let mut self_contained = ScoreBucket::empty(20);
    match signals.assessment.self_contained {
        Some(true) => self_contained.award(20),
        None => self_contained.award(5),
        Some(false) => {}
    }

    let mut unit_count = ScoreBucket::empty(15);
    unit_count.award(match signals.estimated_units {
        3..=6 => 15,
        2 | 7 | 8 => 10,
        9.. => 5,
        _ => 0,
    });

    [freehold, single_title, self_contained, unit_count]
        .iter()
        .map(ScoreBucket::score)
        .sum::<Score>()
        .clamp(0, 100)
}

/// Any blocker forces D; otherwise `0.6 × opportunity + 0.4 × title split`
/// against 75/55/35.
pub fn recommendation_tier(
    opportunity_score: Score,
    title_split_score: Score,
    has_blockers: bool,
) -> RecommendationTier {
    if has_blockers {
        return RecommendationTier::D;
    }

    let combined =
        f64::from(opportunity_score.value()) * 0.6 + f64::from(title_split_score.value()) * 0.4;
    if combined >= 75.0 {
        RecommendationTier::A
    } else if combined >= 55.0 {
        RecommendationTier::B
    } else if combined >= 35.0 {
        RecommendationTier::C
    } else {
        RecommendationTier::D
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn epc(rating: EnergyRating) -> EpcRecord {
        EpcRecord {
            address: "Flat".to_string(),
            postcode: "L4 0TH".to_string(),
            rating: Some(rating),
            floor_area_sqm: Some(45.0),
        }
    }

    fn strong_assessment() -> ListingAssessment {
        ListingAssessment {
            single_title_likely: true,
            single_title_evidence: "Sold as a single freehold title".to_string(),
            self_contained: Some(true),
            price_assessment: PriceAssessment::Undervalued,
            refurb_needed: true,
            refurb_scope: RefurbScope::Heavy,
            ..ListingAssessment::default()
        }
    }

    fn signals<'a>(
        assessment: &'a ListingAssessment,
        epcs: &'a [EpcRecord],
    ) -> OpportunitySignals<'a> {
        OpportunitySignals {
            tenure: Tenure::Freehold,
            tenure_confidence: 0.95,
            estimated_units: 4,
            unit_confidence: 0.9,
            gross_uplift_percent: Some(34.0),
            assessment,
            epcs,
            comparable_count: 8,
        }
    }

    #[test]
    fn buckets_respect_their_caps() {
        let assessment = strong_assessment();
        let epcs = vec![epc(EnergyRating::F); 4];
        let breakdown = OpportunityScorer::new().score(&signals(&assessment, &epcs));

        assert_eq!(breakdown.tenure.earned(), 30);
        assert_eq!(breakdown.financial.earned(), 25);
        assert_eq!(breakdown.condition.earned(), 20);
        assert_eq!(breakdown.risk.earned(), 15);
        assert_eq!(breakdown.data_confidence.earned(), 10);
        assert_eq!(breakdown.opportunity_score.value(), 100);
        assert_eq!(breakdown.title_split_score.value(), 100);
        assert_eq!(breakdown.tier, RecommendationTier::A);
    }

    #[test]
    fn flags_drain_the_risk_bucket_to_zero() {
        let assessment = ListingAssessment {
            red_flags: vec!["subsidence".to_string(), "knotweed".to_string()],
            amber_flags: vec!["ground rent".to_string(); 3],
            ..ListingAssessment::default()
        };
        let breakdown = OpportunityScorer::new().score(&signals(&assessment, &[]));
        assert_eq!(breakdown.risk.earned(), 0);
    }

    #[test]
    fn blockers_force_tier_d() {
        let assessment = ListingAssessment {
            blockers: vec!["Leasehold flats already sold off".to_string()],
            ..strong_assessment()
        };
        let breakdown = OpportunityScorer::new().score(&signals(&assessment, &[]));

        assert!(breakdown.has_blockers);
        assert_eq!(breakdown.risk.earned(), 12);
        assert_eq!(breakdown.tier, RecommendationTier::D);
    }

    #[test]
    fn epc_coverage_requires_records() {
        let assessment = ListingAssessment::default();
        let mut input = signals(&assessment, &[]);
        input.estimated_units = 0;
        input.unit_confidence = 0.0;
        input.tenure_confidence = 0.0;
        input.comparable_count = 0;

        let breakdown = OpportunityScorer::new().score(&input);
        assert_eq!(breakdown.data_confidence.earned(), 0);
    }

    #[test]
    fn unit_count_sweet_spot() {
        let assessment = ListingAssessment {
            self_contained: Some(false),
            ..ListingAssessment::default()
        };
        let mut input = signals(&assessment, &[]);
        input.tenure = Tenure::Unknown;

        for (units, expected) in [(1, 0), (2, 10), (5, 15), (8, 10), (12, 5)] {
            input.estimated_units = units;
            assert_eq!(title_split_score(&input).value(), expected, "units={units}");
        }
    }

    #[test]
    fn tier_thresholds() {
        let tier = |opportunity, title| {
            recommendation_tier(Score::new(opportunity), Score::new(title), false)
        };
        assert_eq!(tier(80, 70), RecommendationTier::A);
        assert_eq!(tier(60, 50), RecommendationTier::B);
        assert_eq!(tier(40, 30), RecommendationTier::C);
        assert_eq!(tier(30, 20), RecommendationTier::D);
    }
}
