pub mod affiliation;
pub mod aggregate;
pub mod context;
pub mod cwe;
pub mod source;
pub mod token;
pub mod types;

pub use affiliation::Affiliation;
pub use aggregate::{get_dependabot_data, AggregateError, AggregateOptions};
pub use context::RunContext;
pub use cwe::{has_cisa_cwe, has_owasp_cwe};
pub use source::{AlertFetch, AlertSource, Repositories, SourceError};
pub use token::{get_github_token, TokenProviderError};
pub use types::*;
