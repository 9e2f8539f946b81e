use crate::affiliation::Affiliation;
use crate::types::{Alert, RepositoryDescriptor};

/// Error raised by an [`AlertSource`] implementation.
pub type SourceError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Lazy repository listing; yields pages on demand.
pub type Repositories<'a> =
    Box<dyn Iterator<Item = Result<RepositoryDescriptor, SourceError>> + 'a>;

/// Outcome of querying one repository's open alerts.
#[derive(Debug)]
pub enum AlertFetch {
    Alerts(Vec<Alert>),
    /// The platform refused access to alerts (Dependabot disabled for the repository).
    Disabled,
    Failed(SourceError),
}

/// Remote platform the aggregation pipeline reads from.
pub trait AlertSource {
    /// Login of the identity the source is authenticated as.
    fn authenticated_login(&self) -> Result<String, SourceError>;

    /// Accessible repositories for `affiliation`, sorted by full name ascending.
    fn repositories<'a>(&'a self, affiliation: &Affiliation) -> Repositories<'a>;

    /// All open alerts of `repo`, in delivery order.
    fn open_alerts(&self, repo: &RepositoryDescriptor) -> AlertFetch;
}
