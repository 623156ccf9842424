//! Neighbor Search Engine - exact k-nearest movies
//!
//! Brute force over every row of the rating matrix:
//! 1. Resolve the query movie to its row
//! 2. Compute the distance from that row to every *other* row
//! 3. Keep the k smallest, ties broken by ascending row index
//!
//! The query row is excluded by identity before ranking, so a duplicate
//! movie at distance zero can never push the query itself out of (or into)
//! the result.
//!
//! Fitting only caches per-row squared norms. Nothing is mutated by a query,
//! so one `NeighborIndex` behind an `Arc` serves any number of threads.

use crate::config::{CandidatePolicy, SearchConfig};
use crate::error::{Result, SimilarityError};
use crate::id_map::IdentifierMapper;
use crate::matrix::RatingMatrix;
use crate::metric::DistanceMetric;
use data_loader::MovieId;
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// One neighbor of a query movie
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    pub movie_id: MovieId,
    /// Row of this movie in the rating matrix
    #[serde(skip)]
    pub index: usize,
    pub distance: f64,
}

/// Fitted brute-force index over the rows of a [`RatingMatrix`]
#[derive(Debug, Clone)]
pub struct NeighborIndex {
    matrix: Arc<RatingMatrix>,
    ids: Arc<IdentifierMapper>,
    /// Squared L2 norm of each row, shared by cosine and euclidean
    sq_norms: Vec<f64>,
    config: SearchConfig,
}

impl NeighborIndex {
    /// Fit with the default config (cosine, clamp)
    pub fn fit(matrix: Arc<RatingMatrix>, ids: Arc<IdentifierMapper>) -> Result<Self> {
        Self::with_config(matrix, ids, SearchConfig::default())
    }

    /// Fit on a matrix and the identifier maps it was built with
    #[instrument(skip_all, fields(movies = matrix.n_movies(), metric = %config.metric))]
    pub fn with_config(
        matrix: Arc<RatingMatrix>,
        ids: Arc<IdentifierMapper>,
        config: SearchConfig,
    ) -> Result<Self> {
        let (rows, cols) = matrix.shape();
        if rows != ids.movies().len() || cols != ids.users().len() {
            return Err(SimilarityError::ShapeMismatch {
                rows,
                cols,
                movies: ids.movies().len(),
                users: ids.users().len(),
            });
        }

        let sq_norms: Vec<f64> = matrix.rows().map(|row| row.squared_norm()).collect();
        debug!(rows, cols, "Fitted neighbor index");

        Ok(Self {
            matrix,
            ids,
            sq_norms,
            config,
        })
    }

    pub fn config(&self) -> SearchConfig {
        self.config
    }

    pub fn ids(&self) -> &IdentifierMapper {
        &self.ids
    }

    pub fn matrix(&self) -> &RatingMatrix {
        &self.matrix
    }

    /// How many neighbors any query can return at most (M - 1)
    pub fn candidate_count(&self) -> usize {
        self.matrix.n_movies().saturating_sub(1)
    }

    /// `query` with the configured metric
    pub fn nearest(&self, movie_id: MovieId, k: usize) -> Result<Vec<Neighbor>> {
        self.query(movie_id, k, self.config.metric)
    }

    /// The `k` movies closest to `movie_id` under `metric`, nearest first.
    ///
    /// Never contains `movie_id` itself. Equal distances are ordered by
    /// ascending row index, which is ascending movie id.
    #[instrument(skip(self))]
    pub fn query(&self, movie_id: MovieId, k: usize, metric: DistanceMetric) -> Result<Vec<Neighbor>> {
        let query_row = self
            .ids
            .movie_index(movie_id)
            .ok_or(SimilarityError::UnknownMovie(movie_id))?;
        let k = self.resolve_k(k)?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let query = self
            .matrix
            .row(query_row)
            .ok_or(SimilarityError::UnknownMovie(movie_id))?;
        let query_norm = self.sq_norms[query_row];

        let mut scored: Vec<(usize, f64)> = self
            .sq_norms
            .par_iter()
            .enumerate()
            .filter(|&(row, _)| row != query_row)
            .filter_map(|(row, &norm)| {
                let candidate = self.matrix.row(row)?;
                Some((row, metric.distance(query, query_norm, candidate, norm)))
            })
            .collect();

        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, by_distance_then_index);
            scored.truncate(k);
        }
        scored.sort_unstable_by(by_distance_then_index);

        let neighbors: Vec<Neighbor> = scored
            .into_iter()
            .filter_map(|(index, distance)| {
                self.ids.movie_id(index).map(|movie_id| Neighbor {
                    movie_id,
                    index,
                    distance,
                })
            })
            .collect();

        debug!("Found {} neighbors", neighbors.len());
        Ok(neighbors)
    }

    fn resolve_k(&self, k: usize) -> Result<usize> {
        let available = self.candidate_count();
        if k <= available {
            return Ok(k);
        }
        match self.config.candidate_policy {
            CandidatePolicy::Clamp => {
                warn!(requested = k, available, "Clamping k to the number of other movies");
                Ok(available)
            }
            CandidatePolicy::Strict => Err(SimilarityError::InsufficientCandidates {
                requested: k,
                available,
            }),
        }
    }
}

fn by_distance_then_index(a: &(usize, f64), b: &(usize, f64)) -> Ordering {
    a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0))
}
