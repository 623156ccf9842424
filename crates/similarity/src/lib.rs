//! # Similarity Crate
//!
//! Item-based nearest-neighbor search over a sparse movie x user rating
//! matrix: "movies rated like this one".
//!
//! ## Components
//!
//! - **id_map**: `IdentifierMapper`, dense indices for sparse user/movie ids
//! - **matrix**: `RatingMatrix`, CSR storage of (movie, user) -> rating
//! - **metric**: `DistanceMetric` (cosine, euclidean, manhattan) over sparse rows
//! - **engine**: `NeighborIndex`, exact brute-force k-nearest search
//!
//! ## Example Usage
//!
//! ```ignore
//! use similarity::{DistanceMetric, IdentifierMapper, NeighborIndex, RatingMatrix};
//! use std::sync::Arc;
//!
//! let ids = Arc::new(IdentifierMapper::build(&dataset.ratings)?);
//! let matrix = Arc::new(RatingMatrix::build(&dataset.ratings, &ids)?);
//! let index = NeighborIndex::fit(matrix, ids)?;
//!
//! for neighbor in index.query(3, 10, DistanceMetric::Cosine)? {
//!     println!("{} at {:.4}", neighbor.movie_id, neighbor.distance);
//! }
//! ```
//!
//! Everything here is immutable after construction. To pick up new ratings,
//! build a new matrix and index and swap the shared reference.

pub mod config;
pub mod engine;
pub mod error;
pub mod id_map;
pub mod matrix;
pub mod metric;

// Re-export commonly used types
pub use config::{CandidatePolicy, SearchConfig};
pub use engine::{Neighbor, NeighborIndex};
pub use error::{IdKind, Result, SimilarityError};
pub use id_map::{IdMap, IdentifierMapper};
pub use matrix::{RatingMatrix, RowView};
pub use metric::DistanceMetric;

use data_loader::Rating;
use std::sync::Arc;

/// Build identifier maps, matrix and a fitted index in one pass
pub fn build_index(ratings: &[Rating], config: SearchConfig) -> Result<NeighborIndex> {
    let ids = Arc::new(IdentifierMapper::build(ratings)?);
    let matrix = Arc::new(RatingMatrix::build(ratings, &ids)?);
    NeighborIndex::with_config(matrix, ids, config)
}
