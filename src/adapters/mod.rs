// Adapters layer: concrete implementations of the domain ports
pub mod http;
pub mod jsonl;

pub use http::{HttpPageFetcher, OpenAiCompletionClient};
pub use jsonl::{decode_record, encode_record, read_messages, JsonlPublisher};
