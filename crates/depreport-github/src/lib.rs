//! Blocking GitHub REST client feeding the depreport aggregation pipeline.

mod client;
mod error;
mod pages;

pub use client::{alert_fetch, GithubClient, GithubClientBuilder, User, DEFAULT_API_URL};
pub use error::GithubError;
pub use pages::{next_link, Paginated};
