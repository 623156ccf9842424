//! Dataset loading from a directory.
//!
//! Picks the file layout, parses ratings and catalog in parallel and logs
//! what was loaded. Validation of ids against each other is left to the
//! consumers: a rating for a movie missing from the catalog is legal and
//! only affects title rendering.

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, instrument};

/// The two on-disk layouts of the MovieLens dumps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataLayout {
    /// ratings.csv + movies.csv with a header row
    Csv,
    /// ratings.dat + movies.dat separated by `::`
    Dat,
}

impl DataLayout {
    /// Detect the layout of `data_dir`, preferring CSV when both exist
    pub fn detect(data_dir: &Path) -> Result<Self> {
        if data_dir.join("ratings.csv").is_file() {
            Ok(DataLayout::Csv)
        } else if data_dir.join("ratings.dat").is_file() {
            Ok(DataLayout::Dat)
        } else {
            Err(DataLoadError::MissingDataset {
                dir: data_dir.display().to_string(),
            })
        }
    }

    fn paths(self, data_dir: &Path) -> (PathBuf, PathBuf) {
        match self {
            DataLayout::Csv => (data_dir.join("ratings.csv"), data_dir.join("movies.csv")),
            DataLayout::Dat => (data_dir.join("ratings.dat"), data_dir.join("movies.dat")),
        }
    }
}

impl Dataset {
    /// Load ratings and catalog from a directory
    ///
    /// Both files are parsed in parallel with `rayon::join`; the first error
    /// wins and nothing partial is returned.
    #[instrument]
    pub fn load_from_dir(data_dir: &Path) -> Result<Self> {
        let layout = DataLayout::detect(data_dir)?;
        let (ratings_path, movies_path) = layout.paths(data_dir);
        info!(?layout, "Loading dataset from {}", data_dir.display());

        let start = Instant::now();
        let (ratings, movies) = rayon::join(
            || match layout {
                DataLayout::Csv => parser::parse_ratings_csv(&ratings_path),
                DataLayout::Dat => parser::parse_ratings_dat(&ratings_path),
            },
            || match layout {
                DataLayout::Csv => parser::parse_movies_csv(&movies_path),
                DataLayout::Dat => parser::parse_movies_dat(&movies_path),
            },
        );

        let ratings = ratings?;
        let movies = movies?;
        debug!(elapsed = ?start.elapsed(), "Parsed data files");

        info!(
            "Loaded {} ratings and {} catalog entries",
            ratings.len(),
            movies.len()
        );

        Ok(Dataset::new(ratings, movies))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_detect_layout() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            DataLayout::detect(dir.path()),
            Err(DataLoadError::MissingDataset { .. })
        ));

        fs::write(dir.path().join("ratings.dat"), "").unwrap();
        assert_eq!(DataLayout::detect(dir.path()).unwrap(), DataLayout::Dat);

        fs::write(dir.path().join("ratings.csv"), "").unwrap();
        assert_eq!(DataLayout::detect(dir.path()).unwrap(), DataLayout::Csv);
    }

    #[test]
    fn test_load_csv_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("ratings.csv"),
            "userId,movieId,rating,timestamp\n1,1,4.0,1\n1,3,4.0,2\n1,6,4.0,3\n2,1,5.0,4\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("movies.csv"),
            "movieId,title,genres\n1,Toy Story (1995),Animation\n3,Grumpier Old Men (1995),Comedy\n",
        )
        .unwrap();

        let dataset = Dataset::load_from_dir(dir.path()).unwrap();
        assert_eq!(dataset.counts(), (4, 2));
        assert_eq!(dataset.title_index().title(1), Some("Toy Story (1995)"));
    }

    #[test]
    fn test_missing_catalog_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("ratings.csv"),
            "userId,movieId,rating,timestamp\n1,1,4.0,1\n",
        )
        .unwrap();

        let err = Dataset::load_from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, DataLoadError::FileNotFound { .. }));
    }

    #[test]
    fn test_load_dataset() {
        // Requires the ml-latest-small files under data/ at the workspace root
        let data_dir = Path::new("../../data/ml-latest-small");

        if data_dir.exists() {
            let dataset = Dataset::load_from_dir(data_dir).unwrap();
            let (ratings, movies) = dataset.counts();

            assert_eq!(ratings, 100836);
            assert_eq!(movies, 9742);
        }
    }
}
