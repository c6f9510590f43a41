//! Appraisal orchestration: screening, valuation, costs, scoring and the
//! staged recommendation behind one service and its HTTP router.

pub mod router;
pub mod service;

pub use router::appraisal_router;
pub use service::{
    Appraisal, AppraisalRequest, AppraisalService, AppraisalServiceError, VerificationOutcome,
};
