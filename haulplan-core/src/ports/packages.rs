use async_trait::async_trait;

use crate::error::SourceError;
use crate::package::Package;

/// Read access to the packages awaiting delivery.
#[async_trait]
pub trait PackageSource: Send + Sync {
    /// Return every pending package ordered by id.
    async fn list(&self) -> Result<Vec<Package>, SourceError>;
}
