//! Core domain types for the rating dataset.
//!
//! - `Rating`: one (user, movie, rating) observation
//! - `Movie`: one catalog entry
//! - `MovieTitleIndex`: immutable movie id -> title lookup
//! - `Dataset`: everything loaded from a data directory

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Type Aliases
// =============================================================================
// These make the domain clearer and prevent mixing up user IDs with movie IDs

/// External identifier of a user, as found in the ratings file
pub type UserId = u32;

/// External identifier of a movie, shared by the ratings file and the catalog
pub type MovieId = u32;

// =============================================================================
// Observations
// =============================================================================

/// A single rating a user gave to a movie.
///
/// Duplicate (user, movie) pairs are kept as-is; consumers decide what a
/// repeated pair means.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    #[serde(rename = "movieId")]
    pub movie_id: MovieId,
    /// Usually 0.5 to 5.0 in half steps, not enforced
    pub rating: f32,
    /// Unix timestamp when rating was made
    pub timestamp: i64,
}

// =============================================================================
// Catalog
// =============================================================================

/// Represents a movie in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    /// Year extracted from title (e.g., "Toy Story (1995)")
    pub year: Option<u16>,
    /// Raw genre labels, split on `|`
    pub genres: Vec<String>,
}

/// Immutable movie id -> display title lookup.
///
/// Built once from the catalog and handed to whoever needs to render titles.
#[derive(Debug, Clone, Default)]
pub struct MovieTitleIndex {
    titles: HashMap<MovieId, String>,
}

impl MovieTitleIndex {
    /// Build the index from catalog entries. Later entries win on duplicate ids.
    pub fn from_movies<'a, I>(movies: I) -> Self
    where
        I: IntoIterator<Item = &'a Movie>,
    {
        let titles = movies
            .into_iter()
            .map(|movie| (movie.id, movie.title.clone()))
            .collect();
        Self { titles }
    }

    pub fn title(&self, movie_id: MovieId) -> Option<&str> {
        self.titles.get(&movie_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// Case-insensitive substring search over titles.
    ///
    /// Exact matches come first, then substring matches; both groups are
    /// ordered by movie id so the output is stable.
    pub fn search(&self, needle: &str) -> Vec<(MovieId, &str)> {
        let needle = needle.to_lowercase();
        let mut matches: Vec<(bool, MovieId, &str)> = self
            .titles
            .iter()
            .filter_map(|(&id, title)| {
                let lower = title.to_lowercase();
                if lower == needle {
                    Some((false, id, title.as_str()))
                } else if lower.contains(&needle) {
                    Some((true, id, title.as_str()))
                } else {
                    None
                }
            })
            .collect();
        matches.sort_unstable_by_key(|&(partial, id, _)| (partial, id));
        matches
            .into_iter()
            .map(|(_, id, title)| (id, title))
            .collect()
    }
}

// =============================================================================
// Dataset
// =============================================================================

/// Everything loaded from one data directory.
///
/// `ratings` keeps file order, which matters for last-write-wins and for
/// stable tie-breaking when picking a user's favourite movie.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub ratings: Vec<Rating>,
    pub movies: Vec<Movie>,
}

impl Dataset {
    pub fn new(ratings: Vec<Rating>, movies: Vec<Movie>) -> Self {
        Self { ratings, movies }
    }

    /// Build the title lookup for this catalog
    pub fn title_index(&self) -> MovieTitleIndex {
        MovieTitleIndex::from_movies(&self.movies)
    }

    /// Group ratings per user, preserving the original order inside each group
    pub fn ratings_by_user(&self) -> HashMap<UserId, Vec<Rating>> {
        let mut by_user: HashMap<UserId, Vec<Rating>> = HashMap::new();
        for rating in &self.ratings {
            by_user.entry(rating.user_id).or_default().push(*rating);
        }
        by_user
    }

    /// Get counts for debugging/validation: (ratings, movies in catalog)
    pub fn counts(&self) -> (usize, usize) {
        (self.ratings.len(), self.movies.len())
    }
}
