//! # Recommendation Orchestrator
//!
//! Turns the neighbor index into answers a person can read:
//! 1. `find_similar`: neighbors of a movie, optionally with distances
//! 2. `recommend_for_user`: pick the user's top-rated movie as the seed,
//!    find its neighbors, render them as titles
//!
//! All collaborators are passed in at construction and never change. A new
//! dataset means a new `Recommender` (see [`crate::ActiveRecommender`]).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use data_loader::{Dataset, MovieId, MovieTitleIndex, Rating, UserId};
use similarity::{build_index, DistanceMetric, NeighborIndex, SearchConfig};

use crate::error::{RecommendError, Result};

/// Rendered in place of a title the catalog doesn't know
pub const UNKNOWN_TITLE: &str = "<title unknown>";

/// One row of a `find_similar` answer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarMovie {
    pub movie_id: MovieId,
    pub title: String,
    /// Only filled when distances were asked for
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

/// A user recommendation together with the movie it was derived from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRecommendation {
    pub user_id: UserId,
    pub seed: Rating,
    pub seed_title: String,
    pub movies: Vec<SimilarMovie>,
}

impl UserRecommendation {
    pub fn titles(&self) -> Vec<String> {
        self.movies.iter().map(|m| m.title.clone()).collect()
    }
}

/// Query front end over one immutable dataset snapshot
#[derive(Debug, Clone)]
pub struct Recommender {
    index: Arc<NeighborIndex>,
    titles: Arc<MovieTitleIndex>,
    /// Each user's ratings in original input order
    user_ratings: Arc<HashMap<UserId, Vec<Rating>>>,
}

impl Recommender {
    pub fn new(
        index: Arc<NeighborIndex>,
        titles: Arc<MovieTitleIndex>,
        user_ratings: HashMap<UserId, Vec<Rating>>,
    ) -> Self {
        Self {
            index,
            titles,
            user_ratings: Arc::new(user_ratings),
        }
    }

    /// Build ids, matrix, fitted index and lookups from a loaded dataset
    #[instrument(skip_all, fields(n_ratings = dataset.ratings.len()))]
    pub fn from_dataset(dataset: &Dataset, config: SearchConfig) -> Result<Self> {
        let start = Instant::now();
        let index = build_index(&dataset.ratings, config)?;
        let (movies, users) = index.matrix().shape();
        info!(
            movies,
            users,
            nnz = index.matrix().nnz(),
            elapsed = ?start.elapsed(),
            "Built neighbor index"
        );

        Ok(Self::new(
            Arc::new(index),
            Arc::new(dataset.title_index()),
            dataset.ratings_by_user(),
        ))
    }

    pub fn index(&self) -> &NeighborIndex {
        &self.index
    }

    pub fn titles(&self) -> &MovieTitleIndex {
        &self.titles
    }

    /// A user's ratings in input order, empty for unknown users
    pub fn user_ratings(&self, user_id: UserId) -> &[Rating] {
        self.user_ratings
            .get(&user_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Title for display, falling back to [`UNKNOWN_TITLE`]
    pub fn title_of(&self, movie_id: MovieId) -> &str {
        match self.titles.title(movie_id) {
            Some(title) => title,
            None => {
                warn!(movie_id, "No title in catalog");
                UNKNOWN_TITLE
            }
        }
    }

    /// Neighbors of `movie_id`; `show_distance` only adds the distances
    #[instrument(skip(self))]
    pub fn find_similar(
        &self,
        movie_id: MovieId,
        k: usize,
        metric: DistanceMetric,
        show_distance: bool,
    ) -> Result<Vec<SimilarMovie>> {
        let neighbors = self.index.query(movie_id, k, metric)?;
        Ok(neighbors
            .into_iter()
            .map(|n| SimilarMovie {
                movie_id: n.movie_id,
                title: self.title_of(n.movie_id).to_string(),
                distance: show_distance.then_some(n.distance),
            })
            .collect())
    }

    /// The user's highest rated movie.
    ///
    /// When several ratings share the maximum, the first one in the user's
    /// original rating order is the seed. NaN ratings are skipped; a user
    /// whose ratings are all NaN falls back to their first rating.
    pub fn seed_for_user(&self, user_id: UserId) -> Result<Rating> {
        let ratings = self.user_ratings(user_id);
        let mut best: Option<&Rating> = None;
        for rating in ratings.iter().filter(|r| !r.rating.is_nan()) {
            match best {
                Some(current) if rating.rating.total_cmp(&current.rating).is_le() => {}
                _ => best = Some(rating),
            }
        }
        best
            .or_else(|| ratings.first())
            .copied()
            .ok_or(RecommendError::UnknownUser(user_id))
    }

    /// Titles of the `k` movies closest to the user's top-rated movie
    pub fn recommend_for_user(&self, user_id: UserId, k: usize) -> Result<Vec<String>> {
        Ok(self.recommend_for_user_detailed(user_id, k)?.titles())
    }

    /// Same as `recommend_for_user`, keeping the seed and distances
    #[instrument(skip(self))]
    pub fn recommend_for_user_detailed(&self, user_id: UserId, k: usize) -> Result<UserRecommendation> {
        let seed = self.seed_for_user(user_id)?;
        debug!(seed_movie = seed.movie_id, seed_rating = seed.rating, "Selected seed movie");

        let metric = self.index.config().metric;
        let movies = self.find_similar(seed.movie_id, k, metric, true)?;

        Ok(UserRecommendation {
            user_id,
            seed,
            seed_title: self.title_of(seed.movie_id).to_string(),
            movies,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::Movie;

    fn rating(user_id: UserId, movie_id: MovieId, value: f32) -> Rating {
        Rating {
            user_id,
            movie_id,
            rating: value,
            timestamp: 0,
        }
    }

    fn movie(id: MovieId, title: &str) -> Movie {
        Movie {
            id,
            title: title.to_string(),
            year: None,
            genres: Vec::new(),
        }
    }

    fn create_test_dataset() -> Dataset {
        let ratings = vec![
            // User 1 rates 2 and 3 equally high; 2 comes first
            rating(1, 1, 3.0),
            rating(1, 2, 5.0),
            rating(1, 3, 5.0),
            rating(2, 1, 4.0),
            rating(2, 2, 4.0),
            rating(2, 4, 1.0),
            rating(3, 3, 5.0),
            rating(3, 4, 5.0),
            rating(3, 99, 2.0),
        ];
        let movies = vec![
            movie(1, "Toy Story (1995)"),
            movie(2, "Jumanji (1995)"),
            movie(3, "Grumpier Old Men (1995)"),
            movie(4, "Waiting to Exhale (1995)"),
        ];
        Dataset::new(ratings, movies)
    }

    fn create_test_recommender() -> Recommender {
        Recommender::from_dataset(&create_test_dataset(), SearchConfig::default()).unwrap()
    }

    #[test]
    fn test_seed_is_first_max_rating() {
        let recommender = create_test_recommender();

        let seed = recommender.seed_for_user(1).unwrap();
        assert_eq!(seed.movie_id, 2);
        assert_eq!(seed.rating, 5.0);

        let seed = recommender.seed_for_user(2).unwrap();
        assert_eq!(seed.movie_id, 1);
    }

    #[test]
    fn test_seed_skips_nan_ratings() {
        let ratings = vec![
            rating(5, 1, f32::NAN),
            rating(5, 2, 3.0),
            rating(5, 3, 4.5),
            rating(5, 4, f32::NAN),
            rating(6, 1, f32::NAN),
            rating(6, 2, f32::NAN),
            rating(2, 1, 4.0),
        ];
        let dataset = Dataset::new(ratings, Vec::new());
        let recommender = Recommender::from_dataset(&dataset, SearchConfig::default()).unwrap();

        // NaN first or last makes no difference
        assert_eq!(recommender.seed_for_user(5).unwrap().movie_id, 3);

        let seed = recommender.seed_for_user(6).unwrap();
        assert_eq!(seed.movie_id, 1);
        assert!(seed.rating.is_nan());
    }

    #[test]
    fn test_unknown_user() {
        let recommender = create_test_recommender();

        let err = recommender.recommend_for_user(42, 3).unwrap_err();
        assert!(matches!(err, RecommendError::UnknownUser(42)));
    }

    #[test]
    fn test_recommend_excludes_seed() {
        let recommender = create_test_recommender();

        let rec = recommender.recommend_for_user_detailed(1, 3).unwrap();
        assert_eq!(rec.seed_title, "Jumanji (1995)");
        assert_eq!(rec.movies.len(), 3);
        assert!(rec.movies.iter().all(|m| m.movie_id != 2));
        // Movie 1 shares both raters with movie 2
        assert_eq!(rec.movies[0].movie_id, 1);

        let titles = recommender.recommend_for_user(1, 3).unwrap();
        assert_eq!(titles, rec.titles());
    }

    #[test]
    fn test_missing_title_uses_sentinel() {
        let recommender = create_test_recommender();

        let all = recommender
            .find_similar(3, 10, DistanceMetric::Cosine, false)
            .unwrap();
        assert_eq!(all.len(), 4);
        let unknown = all.iter().find(|m| m.movie_id == 99).unwrap();
        assert_eq!(unknown.title, UNKNOWN_TITLE);
    }

    #[test]
    fn test_show_distance_is_additive() {
        let recommender = create_test_recommender();

        let plain = recommender
            .find_similar(4, 3, DistanceMetric::Cosine, false)
            .unwrap();
        let with_distance = recommender
            .find_similar(4, 3, DistanceMetric::Cosine, true)
            .unwrap();

        assert!(plain.iter().all(|m| m.distance.is_none()));
        assert!(with_distance.iter().all(|m| m.distance.is_some()));
        let plain_ids: Vec<MovieId> = plain.iter().map(|m| m.movie_id).collect();
        let other_ids: Vec<MovieId> = with_distance.iter().map(|m| m.movie_id).collect();
        assert_eq!(plain_ids, other_ids);
    }

    #[test]
    fn test_unknown_movie_is_not_masked() {
        let recommender = create_test_recommender();

        let err = recommender
            .find_similar(1234, 3, DistanceMetric::Cosine, false)
            .unwrap_err();
        assert!(matches!(
            err,
            RecommendError::Similarity(similarity::SimilarityError::UnknownMovie(1234))
        ));
    }
}
