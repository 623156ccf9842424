//! # Data Loader Crate
//!
//! Loads MovieLens-style rating dumps into plain Rust values.
//!
//! ## Main Components
//!
//! - **types**: `Rating`, `Movie`, `MovieTitleIndex`, `Dataset`
//! - **parser**: CSV (`ratings.csv`, `movies.csv`) and `::` (`ratings.dat`, `movies.dat`) parsers
//! - **loader**: layout detection and parallel loading of a data directory
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::Dataset;
//! use std::path::Path;
//!
//! let dataset = Dataset::load_from_dir(Path::new("data/ml-latest-small"))?;
//! let titles = dataset.title_index();
//!
//! println!("{} ratings, movie 1 is {:?}", dataset.ratings.len(), titles.title(1));
//! ```

pub mod error;
pub mod types;
pub mod parser;
pub mod loader;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use loader::DataLayout;
pub use types::{Dataset, Movie, MovieId, MovieTitleIndex, Rating, UserId};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_dataset() {
        let dataset = Dataset::default();
        let (ratings, movies) = dataset.counts();

        assert_eq!(ratings, 0);
        assert_eq!(movies, 0);
        assert!(dataset.title_index().is_empty());
        assert!(dataset.ratings_by_user().is_empty());
    }

    #[test]
    fn test_rating_is_copy() {
        let rating = Rating {
            user_id: 1,
            movie_id: 1193,
            rating: 5.0,
            timestamp: 978300760,
        };
        let copy = rating;

        assert_eq!(rating, copy);
    }
}
