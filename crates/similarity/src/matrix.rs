//! Sparse movie x user rating matrix.
//!
//! Rows are movies, columns are users, both addressed by the dense indices
//! of an [`IdentifierMapper`]. Storage is CSR (`sprs::CsMat`), so a row is a
//! contiguous slice of sorted column indices plus values and absent cells
//! cost nothing. The matrix is immutable once built.

use crate::error::{IdKind, Result, SimilarityError};
use crate::id_map::IdentifierMapper;
use data_loader::Rating;
use sprs::{CsMat, TriMat};
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Borrowed view of one movie row: sorted user indices and their ratings
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    pub indices: &'a [usize],
    pub values: &'a [f32],
}

impl RowView<'_> {
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Sum of squared values, the implicit zeros contribute nothing
    pub fn squared_norm(&self) -> f64 {
        self.values
            .iter()
            .map(|&v| f64::from(v) * f64::from(v))
            .sum()
    }
}

/// Immutable sparse rating matrix of shape (movies, users)
#[derive(Debug, Clone)]
pub struct RatingMatrix {
    csr: CsMat<f32>,
}

impl RatingMatrix {
    /// Build the matrix from observations, addressing cells through `ids`.
    ///
    /// A repeated (user, movie) pair overwrites the earlier cell value; the
    /// last observation in input order wins. Ids missing from `ids` fail the
    /// whole build with `UnknownIdentifier`.
    #[instrument(skip_all, fields(n_ratings = ratings.len()))]
    pub fn build(ratings: &[Rating], ids: &IdentifierMapper) -> Result<Self> {
        if ratings.is_empty() {
            return Err(SimilarityError::EmptyDataset);
        }

        let mut cells: HashMap<(usize, usize), f32> = HashMap::with_capacity(ratings.len());
        for rating in ratings {
            let row = ids
                .movie_index(rating.movie_id)
                .ok_or(SimilarityError::UnknownIdentifier {
                    kind: IdKind::Movie,
                    id: rating.movie_id,
                })?;
            let col = ids
                .user_index(rating.user_id)
                .ok_or(SimilarityError::UnknownIdentifier {
                    kind: IdKind::User,
                    id: rating.user_id,
                })?;
            cells.insert((row, col), rating.rating);
        }

        let shape = (ids.movies().len(), ids.users().len());
        let mut triplets = TriMat::with_capacity(shape, cells.len());
        for ((row, col), value) in cells {
            triplets.add_triplet(row, col, value);
        }
        // Cells are unique here, so the summing of duplicates in to_csr never kicks in
        let csr: CsMat<f32> = triplets.to_csr();

        debug!(
            movies = shape.0,
            users = shape.1,
            nnz = csr.nnz(),
            "Built rating matrix"
        );
        Ok(Self { csr })
    }

    /// (movies, users)
    pub fn shape(&self) -> (usize, usize) {
        self.csr.shape()
    }

    pub fn n_movies(&self) -> usize {
        self.csr.rows()
    }

    pub fn n_users(&self) -> usize {
        self.csr.cols()
    }

    /// Number of stored ratings
    pub fn nnz(&self) -> usize {
        self.csr.nnz()
    }

    /// Fraction of cells that hold a rating
    pub fn density(&self) -> f64 {
        let (rows, cols) = self.shape();
        if rows == 0 || cols == 0 {
            return 0.0;
        }
        self.nnz() as f64 / (rows as f64 * cols as f64)
    }

    /// Rating stored at (movie_index, user_index), `None` when absent
    pub fn get(&self, movie_index: usize, user_index: usize) -> Option<f32> {
        self.csr.get(movie_index, user_index).copied()
    }

    /// Sparse view of one movie row
    pub fn row(&self, movie_index: usize) -> Option<RowView<'_>> {
        if movie_index >= self.n_movies() {
            return None;
        }
        let range = self.csr.indptr().outer_inds_sz(movie_index);
        Some(RowView {
            indices: &self.csr.indices()[range.clone()],
            values: &self.csr.data()[range],
        })
    }

    /// Iterate all rows in index order
    pub fn rows(&self) -> impl Iterator<Item = RowView<'_>> + '_ {
        (0..self.n_movies()).filter_map(move |i| self.row(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(user_id: u32, movie_id: u32, value: f32) -> Rating {
        Rating {
            user_id,
            movie_id,
            rating: value,
            timestamp: 0,
        }
    }

    fn small_ratings() -> Vec<Rating> {
        vec![
            rating(1, 1, 4.0),
            rating(1, 3, 4.0),
            rating(1, 6, 4.0),
            rating(2, 1, 5.0),
        ]
    }

    #[test]
    fn test_build_small_matrix() {
        let ratings = small_ratings();
        let ids = IdentifierMapper::build(&ratings).unwrap();
        let matrix = RatingMatrix::build(&ratings, &ids).unwrap();

        assert_eq!(matrix.shape(), (3, 2));
        assert_eq!(matrix.nnz(), 4);

        let user_1 = ids.user_index(1).unwrap();
        let user_2 = ids.user_index(2).unwrap();
        assert_eq!(matrix.get(0, user_1), Some(4.0));
        assert_eq!(matrix.get(0, user_2), Some(5.0));
        assert_eq!(matrix.get(1, user_2), None);
    }

    #[test]
    fn test_last_write_wins() {
        let mut ratings = small_ratings();
        ratings.push(rating(1, 1, 2.0));
        let ids = IdentifierMapper::build(&ratings).unwrap();
        let matrix = RatingMatrix::build(&ratings, &ids).unwrap();

        let user_1 = ids.user_index(1).unwrap();
        assert_eq!(matrix.get(0, user_1), Some(2.0));
        // Overwritten, not summed or averaged
        assert_eq!(matrix.nnz(), 4);
    }

    #[test]
    fn test_last_write_wins_reversed() {
        let ratings = vec![rating(7, 9, 1.0), rating(7, 9, 3.5), rating(7, 9, 0.5)];
        let ids = IdentifierMapper::build(&ratings).unwrap();
        let matrix = RatingMatrix::build(&ratings, &ids).unwrap();

        assert_eq!(matrix.get(0, 0), Some(0.5));
    }

    #[test]
    fn test_unknown_identifier() {
        let ids = IdentifierMapper::build(&small_ratings()).unwrap();

        let err = RatingMatrix::build(&[rating(1, 42, 3.0)], &ids).unwrap_err();
        assert_eq!(
            err,
            SimilarityError::UnknownIdentifier {
                kind: IdKind::Movie,
                id: 42
            }
        );

        let err = RatingMatrix::build(&[rating(99, 1, 3.0)], &ids).unwrap_err();
        assert_eq!(
            err,
            SimilarityError::UnknownIdentifier {
                kind: IdKind::User,
                id: 99
            }
        );
    }

    #[test]
    fn test_row_view_is_sorted() {
        let ratings = vec![
            rating(30, 1, 1.0),
            rating(10, 1, 2.0),
            rating(20, 1, 3.0),
            rating(20, 2, 5.0),
        ];
        let ids = IdentifierMapper::build(&ratings).unwrap();
        let matrix = RatingMatrix::build(&ratings, &ids).unwrap();

        let row = matrix.row(0).unwrap();
        assert_eq!(row.indices, &[0, 1, 2]);
        assert_eq!(row.values, &[2.0, 3.0, 1.0]);
        assert_eq!(row.squared_norm(), 14.0);

        assert_eq!(matrix.row(1).unwrap().nnz(), 1);
        assert!(matrix.row(2).is_none());
        assert_eq!(matrix.rows().count(), 2);
    }

    #[test]
    fn test_density() {
        let ratings = small_ratings();
        let ids = IdentifierMapper::build(&ratings).unwrap();
        let matrix = RatingMatrix::build(&ratings, &ids).unwrap();

        assert!((matrix.density() - 4.0 / 6.0).abs() < 1e-12);
    }
}
