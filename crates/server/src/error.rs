//! Error types for the recommendation layer.

use data_loader::{DataLoadError, UserId};
use similarity::SimilarityError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecommendError {
    /// The user has no ratings, so there is nothing to seed a search with
    #[error("Unknown user id {0}: no ratings found")]
    UnknownUser(UserId),

    #[error(transparent)]
    Similarity(#[from] SimilarityError),

    #[error(transparent)]
    DataLoad(#[from] DataLoadError),
}

pub type Result<T> = std::result::Result<T, RecommendError>;
