//! The offer negotiation state machine and the store seam it runs over.

pub mod engine;
pub mod store;

pub use engine::{NegotiationEngine, NegotiationOutcome};
pub use store::{InMemoryMarketStore, MarketStore, WriteSet};
