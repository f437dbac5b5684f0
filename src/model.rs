pub mod app_config;
pub mod link;

pub use app_config::{AppConfig, HarvestConfig, LoggingConfig, OutputConfig};
pub use link::{CanonicalLink, Candidate, RawPage, ResultEntry, ResultSet, Source, SourceFailure, Stats, Strategy};
