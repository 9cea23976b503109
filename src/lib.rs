pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{HttpPageFetcher, JsonlPublisher, OpenAiCompletionClient};
#[cfg(feature = "cli")]
pub use config::CliArgs;
pub use config::ScraperConfig;
pub use core::{
    engine::{RunSummary, ScraperEngine},
    extractor::ProfileExtractor,
    processor::ProfileProcessor,
};
pub use utils::error::{Result, ScraperError};
