//! Configuration fetchers.
//!
//! Two interchangeable strategies produce a [`ConfigDocument`]: the
//! interactive fetcher drives an SSH scrape session for screen-scraped
//! devices, and the API fetcher performs a keygen + retrieve exchange for
//! REST-exposed devices. Which one runs is decided entirely by the device
//! profile; everything downstream is strategy-agnostic.

mod api;
mod interactive;

pub use api::ApiFetcher;
pub use interactive::InteractiveFetcher;

use async_trait::async_trait;

use crate::config::RunConfig;
use crate::device::AccessMethod;
use crate::error::FetchError;
use crate::metrics::RunMetrics;
use crate::scrape::ConfigDocument;

/// A strategy for retrieving one device's configuration snapshot.
#[async_trait]
pub trait ConfigFetcher: Send + Sync {
    /// Run one fetch attempt.
    ///
    /// The recorder observes mid-attempt milestones (connection success);
    /// failure accounting is done by the caller from the returned error,
    /// which carries exactly one classification.
    async fn fetch(&self, metrics: &mut RunMetrics) -> Result<ConfigDocument, FetchError>;
}

/// Build the fetcher selected by the run's device profile.
pub fn build_fetcher(config: &RunConfig) -> Result<Box<dyn ConfigFetcher>, FetchError> {
    match &config.profile.access {
        AccessMethod::Interactive(spec) => {
            Ok(Box::new(InteractiveFetcher::new(config, spec.clone())?))
        }
        AccessMethod::Api(spec) => Ok(Box::new(ApiFetcher::new(config, spec.clone())?)),
    }
}
