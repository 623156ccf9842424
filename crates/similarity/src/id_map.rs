//! Bijection between external ids and dense matrix indices.
//!
//! External ids are sparse (MovieLens movie ids go past 190000 for under
//! 10000 movies). Rows and columns of the rating matrix need dense indices
//! in `[0, count)`. `IdMap` holds both directions and is built once, sorted
//! ascending by external id so repeated builds agree.

use crate::error::{Result, SimilarityError};
use data_loader::{MovieId, Rating, UserId};
use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;
use tracing::{debug, instrument};

/// Forward (id -> index) and inverse (index -> id) tables for one id space
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdMap<K: Hash + Eq> {
    forward: HashMap<K, usize>,
    inverse: Vec<K>,
}

impl<K> IdMap<K>
where
    K: Copy + Ord + Hash,
{
    /// Build from any sequence of ids; duplicates collapse to one index
    pub fn from_ids<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = K>,
    {
        let inverse: Vec<K> = ids.into_iter().collect::<BTreeSet<K>>().into_iter().collect();
        let forward: HashMap<K, usize> = inverse
            .iter()
            .enumerate()
            .map(|(index, &id)| (id, index))
            .collect();

        debug_assert_eq!(forward.len(), inverse.len());
        debug_assert!(inverse.iter().enumerate().all(|(i, id)| forward[id] == i));

        Self { forward, inverse }
    }

    /// Dense index of an external id
    pub fn index_of(&self, id: K) -> Option<usize> {
        self.forward.get(&id).copied()
    }

    /// External id at a dense index
    pub fn id_of(&self, index: usize) -> Option<K> {
        self.inverse.get(index).copied()
    }

    pub fn contains(&self, id: K) -> bool {
        self.forward.contains_key(&id)
    }

    /// All ids in index order (ascending)
    pub fn ids(&self) -> &[K] {
        &self.inverse
    }

    pub fn len(&self) -> usize {
        self.inverse.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inverse.is_empty()
    }
}

/// User and movie id maps built together from one observation set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierMapper {
    users: IdMap<UserId>,
    movies: IdMap<MovieId>,
}

impl IdentifierMapper {
    /// Build both maps from the full observation set
    ///
    /// Fails with `EmptyDataset` when there is nothing to index.
    #[instrument(skip(ratings), fields(n_ratings = ratings.len()))]
    pub fn build(ratings: &[Rating]) -> Result<Self> {
        if ratings.is_empty() {
            return Err(SimilarityError::EmptyDataset);
        }

        let users = IdMap::from_ids(ratings.iter().map(|r| r.user_id));
        let movies = IdMap::from_ids(ratings.iter().map(|r| r.movie_id));
        debug!(users = users.len(), movies = movies.len(), "Built identifier maps");

        Ok(Self { users, movies })
    }

    pub fn users(&self) -> &IdMap<UserId> {
        &self.users
    }

    pub fn movies(&self) -> &IdMap<MovieId> {
        &self.movies
    }

    pub fn user_index(&self, user_id: UserId) -> Option<usize> {
        self.users.index_of(user_id)
    }

    pub fn movie_index(&self, movie_id: MovieId) -> Option<usize> {
        self.movies.index_of(movie_id)
    }

    pub fn movie_id(&self, index: usize) -> Option<MovieId> {
        self.movies.id_of(index)
    }

    pub fn user_id(&self, index: usize) -> Option<UserId> {
        self.users.id_of(index)
    }
}
