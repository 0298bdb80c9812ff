//! Integration with the external image-analysis suggestion service.
//!
//! The marketplace treats image analysis as an opaque collaborator: it takes
//! a captured image and hands back suggested title, description and
//! categories for a request item. Nothing in the negotiation engine depends
//! on it, and every failure path degrades to manual entry.

pub mod client;
pub mod types;

pub use client::{DisabledAnalyzer, HttpVisionClient, ImageAnalyzer, VisionError};
pub use types::{clamp_categories, ImagePayload, ItemSuggestion, SourceLink};
