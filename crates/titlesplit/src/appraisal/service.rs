use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::costs::{CostBenefitAnalysis, CostBenefitAnalyzer, CostEstimator, CostScenario};
use crate::domain::{ListingSnapshot, PropertyId, UnitSpec};
use crate::recommendation::{
    enriched_recommendation, initial_recommendation, verified_recommendation, EnrichmentSignals,
    Recommendation, Stage,
};
use crate::scoring::{ListingAssessment, OpportunityScorer, OpportunitySignals, ScoreBreakdown};
use crate::screening::{initial_screen, ScreeningResult};
use crate::valuation::{BlockGdvReport, BlockValuationRequest, ValuationEngine, ValuationEvidence};
use crate::verification::{
    calculate_total_impact, Impact, ImpactAssessor, RepositoryError, TotalImpact,
    VerificationRecord, VerificationRepository,
};

/// Everything known about a listing at the time of the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppraisalRequest {
    pub listing: ListingSnapshot,
    /// Unit schedule; when empty, `listing.estimated_units` placeholder units
    /// are valued on typical floor areas.
    #[serde(default)]
    pub units: Vec<UnitSpec>,
    #[serde(default)]
    pub evidence: ValuationEvidence,
    #[serde(default)]
    pub assessment: ListingAssessment,
    #[serde(default)]
    pub monthly_rent_per_unit: Option<i64>,
    #[serde(default)]
    pub scenario: CostScenario,
    pub as_of: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct Appraisal {
    pub property_id: PropertyId,
    pub stage: Stage,
    pub screening: ScreeningResult,
    pub valuation: Option<BlockGdvReport>,
    pub cost_benefit: Option<CostBenefitAnalysis>,
    pub score: ScoreBreakdown,
    pub impacts: Vec<Impact>,
    pub impact_summary: Option<TotalImpact>,
    pub recommendation: Recommendation,
}

/// Stored verification record with its assessed impacts.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationOutcome {
    pub property_id: PropertyId,
    pub fully_verified: bool,
    pub completion_percent: f64,
    pub impacts: Vec<Impact>,
    pub summary: TotalImpact,
}

/// Composes the engine components with an injected verification store.
pub struct AppraisalService<R> {
    engine: ValuationEngine,
    estimator: CostEstimator,
    analyzer: CostBenefitAnalyzer,
    scorer: OpportunityScorer,
    assessor: ImpactAssessor,
    repository: Arc<R>,
}

impl<R> AppraisalService<R>
where
    R: VerificationRepository + 'static,
{
    pub fn new(repository: Arc<R>, config: Arc<EngineConfig>) -> Self {
        Self {
            estimator: CostEstimator::new(config.costs.clone()),
            analyzer: CostBenefitAnalyzer::new(config.benefit),
            scorer: OpportunityScorer::new(),
            assessor: ImpactAssessor::new(),
            engine: ValuationEngine::new(config),
            repository,
        }
    }

    /// Appraises a listing at the furthest stage its evidence supports: a
    /// stored verification record, then enrichment evidence, then listing
    /// data alone.
    pub fn appraise(&self, request: AppraisalRequest) -> Result<Appraisal, AppraisalServiceError> {
        validate_listing(&request.listing)?;

        let listing = &request.listing;
        let screening = initial_screen(listing);
        let units = unit_schedule(&request);
        let verification = self.repository.fetch(&listing.property_id)?;

        let priced = if units.is_empty() || (request.evidence.is_empty() && verification.is_none())
        {
            None
        } else {
            Some(self.price_block(&request, units))
        };

        let (valuation, cost_benefit) = match priced {
            Some((report, analysis)) => (Some(report), Some(analysis)),
            None => (None, None),
        };

        let comparable_count = valuation
            .as_ref()
            .map_or(0, |report| report.comparables_summary.count);
        let estimated_units = valuation.as_ref().map_or_else(
            || listing.estimated_units.unwrap_or(0),
            |report| u32::try_from(report.total_units).unwrap_or(u32::MAX),
        );
        let score = self.scorer.score(&OpportunitySignals {
            tenure: listing.tenure,
            tenure_confidence: listing.tenure_confidence,
            estimated_units,
            unit_confidence: listing.unit_confidence,
            gross_uplift_percent: valuation.as_ref().map(|report| report.gross_uplift_percent),
            assessment: &request.assessment,
            epcs: &request.evidence.epcs,
            comparable_count,
        });

        let (stage, impacts, impact_summary, recommendation) = match &verification {
            Some(record) => {
                let impacts = self.assessor.assess(record);
                let summary = calculate_total_impact(&impacts);
                let net_benefit = cost_benefit
                    .as_ref()
                    .map(|analysis| analysis.benefits.net_uplift);
                let recommendation = verified_recommendation(record, &impacts, net_benefit);
                (recommendation.stage, impacts, Some(summary), recommendation)
            }
            None => {
                let recommendation = match &valuation {
                    Some(report) => enriched_recommendation(
                        listing,
                        &EnrichmentSignals {
                            epc_count: request.evidence.epcs.len(),
                            comparable_count,
                            estimated_uplift: Some(report.gross_uplift),
                            average_energy_rating: score.average_energy_rating,
                        },
                    ),
                    None if !request.evidence.is_empty() => Recommendation::insufficient_data(
                        Stage::Enriched,
                        "Evidence supplied but no units to value; provide a unit schedule or unit count.",
                    ),
                    None => initial_recommendation(listing, &screening),
                };
                (recommendation.stage, Vec::new(), None, recommendation)
            }
        };

        info!(
            property_id = %listing.property_id.0,
            stage = ?stage,
            level = ?recommendation.level,
            tier = ?score.tier,
            "appraisal complete"
        );

        Ok(Appraisal {
            property_id: listing.property_id.clone(),
            stage,
            screening,
            valuation,
            cost_benefit,
            score,
            impacts,
            impact_summary,
            recommendation,
        })
    }

    /// Stores a verification record, replacing any earlier one for the
    /// property, and returns its assessed impacts.
    pub fn record_verification(
        &self,
        record: VerificationRecord,
    ) -> Result<VerificationOutcome, AppraisalServiceError> {
        if record.property_id.0.trim().is_empty() {
            return Err(AppraisalServiceError::InvalidRequest(
                "property_id must not be empty".to_string(),
            ));
        }

        let impacts = self.assessor.assess(&record);
        let summary = calculate_total_impact(&impacts);
        let outcome = VerificationOutcome {
            property_id: record.property_id.clone(),
            fully_verified: record.is_fully_verified(),
            completion_percent: record.completion_percent(),
            impacts,
            summary,
        };

        self.repository.save(record)?;
        if outcome.summary.has_blockers {
            warn!(
                property_id = %outcome.property_id.0,
                blockers = ?outcome.summary.blockers,
                "verification recorded blockers"
            );
        }
        Ok(outcome)
    }

    pub fn verification(
        &self,
        property_id: &PropertyId,
    ) -> Result<VerificationRecord, AppraisalServiceError> {
        let record = self
            .repository
            .fetch(property_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    /// Values the block, costs the split at the requested scenario and feeds
    /// the costs back into the report's net figures.
    fn price_block(
        &self,
        request: &AppraisalRequest,
        units: Vec<UnitSpec>,
    ) -> (BlockGdvReport, CostBenefitAnalysis) {
        let mut report = self.engine.value_block(&BlockValuationRequest {
            postcode: request.listing.postcode.clone(),
            asking_price: request.listing.asking_price,
            units,
            evidence: request.evidence.clone(),
            title_split_costs: 0,
            monthly_rent_per_unit: request.monthly_rent_per_unit,
            as_of: request.as_of,
        });

        let values = report.individual_values();
        let num_units = u32::try_from(values.len()).unwrap_or(u32::MAX);
        let costs = self.estimator.estimate(num_units, &values, request.scenario);
        report.set_title_split_costs(costs.total);
        let analysis =
            self.analyzer
                .analyze(request.listing.asking_price, num_units, &values, &costs);

        (report, analysis)
    }
}

fn validate_listing(listing: &ListingSnapshot) -> Result<(), AppraisalServiceError> {
    if listing.property_id.0.trim().is_empty() {
        return Err(AppraisalServiceError::InvalidRequest(
            "listing.property_id must not be empty".to_string(),
        ));
    }
    if listing.postcode.trim().is_empty() {
        return Err(AppraisalServiceError::InvalidRequest(
            "listing.postcode must not be empty".to_string(),
        ));
    }
    if listing.asking_price < 0 {
        return Err(AppraisalServiceError::InvalidRequest(
            "listing.asking_price must not be negative".to_string(),
        ));
    }
    Ok(())
}

fn unit_schedule(request: &AppraisalRequest) -> Vec<UnitSpec> {
    if !request.units.is_empty() {
        return request.units.clone();
    }

    let count = request.listing.estimated_units.unwrap_or(0);
    (1..=count)
        .map(|index| UnitSpec {
            id: format!("Unit {index}"),
            bedrooms: None,
            floor_area_sqft: None,
            energy_rating: None,
        })
        .collect()
}

/// Error raised by the appraisal service.
#[derive(Debug, thiserror::Error)]
pub enum AppraisalServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
