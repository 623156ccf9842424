//! Server crate for the movie similarity engine.
//!
//! The orchestrator resolves user and movie queries against a fitted
//! neighbor index; `ActiveRecommender` keeps the live snapshot and swaps
//! in rebuilt ones.

pub mod active;
pub mod error;
pub mod orchestrator;

pub use active::ActiveRecommender;
pub use error::{RecommendError, Result};
pub use orchestrator::{Recommender, SimilarMovie, UserRecommendation, UNKNOWN_TITLE};
