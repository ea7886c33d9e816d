//! Card pipeline for the infinite facts feed.
//!
//! A [`CardRequest`] is turned into a prompt, sent to a
//! [`CompletionClient`](factstream_llm::traits::CompletionClient), and the
//! answer is parsed, filtered against the [`DedupStore`] and assembled into
//! [`FactCard`]s. [`FactService::get_cards`] is the only entry point callers
//! need and it never fails: every problem degrades to an empty list.
//!
//! # Examples
//! ```no_run
//! use factstream_common::LlmConfig;
//! use factstream_core::{CardRequest, FactService};
//!
//! # #[tokio::main]
//! # async fn main() -> factstream_common::Result<()> {
//! let client = factstream_llm::build_client(&LlmConfig::default(), None, 0)?;
//! let service = FactService::with_fresh_dedup(client);
//! let cards = service.get_cards(&CardRequest::new("volcanoes")).await;
//! for card in &cards {
//!     println!("{}: {}", card.id, card.headline);
//! }
//! # Ok(())
//! # }
//! ```
pub mod assembler;
pub mod card;
pub mod dedup;
pub mod feed;
pub mod mock;
pub mod normalize;
pub mod parser;
pub mod prompt;
pub mod service;

pub use card::{CardRequest, FactCard};
pub use dedup::{DedupStore, InMemoryDedupStore};
pub use feed::{FeedAction, FeedSession};
pub use mock::MockCardSource;
pub use service::{CardSource, FactService};
