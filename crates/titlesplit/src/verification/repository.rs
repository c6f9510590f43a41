use super::VerificationRecord;
use crate::domain::PropertyId;

/// Storage for verification records keyed by property.
pub trait VerificationRepository: Send + Sync {
    /// Inserts or replaces the record for its property.
    fn save(&self, record: VerificationRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &PropertyId) -> Result<Option<VerificationRecord>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
