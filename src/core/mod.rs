pub mod engine;
pub mod extractor;
pub mod processor;
pub mod retry;
pub mod router;
pub mod selector;

pub use crate::domain::model::{IncomingProfile, Outcome, ProfileInfo, RouteDecision};
pub use crate::domain::ports::{CompletionBackend, FetchOutcome, PageFetcher, Publisher};
pub use crate::utils::error::Result;
