pub mod executor;
pub mod fixture_source;
pub mod mapper;
pub mod progress_tracker;
pub mod winestro_api_client;
pub mod winestro_models;

#[cfg(test)]
pub(crate) mod test_support;

pub use executor::{SyncError, SyncExecutor, SyncSettings};
pub use fixture_source::FixtureSource;
pub use progress_tracker::ProgressTracker;
pub use winestro_api_client::{ErpSource, WinestroApiClient, WinestroError};
