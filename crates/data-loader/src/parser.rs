//! Parsers for the two MovieLens file layouts.
//!
//! CSV layout (ml-latest, ml-latest-small), with a header row:
//! - ratings.csv: userId,movieId,rating,timestamp
//! - movies.csv: movieId,title,genres
//!
//! `::` layout (ml-1m), no header, ISO-8859-1 encoded:
//! - ratings.dat: userId::movieId::rating::timestamp
//! - movies.dat: movieId::title::genres

use crate::error::{DataLoadError, Result};
use crate::types::*;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

// =============================================================================
// CSV layout
// =============================================================================

/// Row of movies.csv before the title and genres are post-processed
#[derive(Debug, Deserialize)]
struct MovieRecord {
    #[serde(rename = "movieId")]
    movie_id: MovieId,
    title: String,
    genres: String,
}

impl From<MovieRecord> for Movie {
    fn from(record: MovieRecord) -> Self {
        Movie {
            id: record.movie_id,
            year: extract_year_from_title(&record.title),
            genres: split_genres(&record.genres),
            title: record.title,
        }
    }
}

fn open_csv(path: &Path) -> Result<csv::Reader<File>> {
    let file = File::open(path).map_err(|_| DataLoadError::FileNotFound {
        path: path.display().to_string(),
    })?;
    Ok(csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file))
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Parse a ratings.csv file, keeping file order
pub fn parse_ratings_csv(path: &Path) -> Result<Vec<Rating>> {
    let mut reader = open_csv(path)?;
    reader
        .deserialize::<Rating>()
        .map(|record| {
            record.map_err(|source| DataLoadError::CsvError {
                file: file_label(path),
                source,
            })
        })
        .collect()
}

/// Parse a movies.csv file
pub fn parse_movies_csv(path: &Path) -> Result<Vec<Movie>> {
    let mut reader = open_csv(path)?;
    reader
        .deserialize::<MovieRecord>()
        .map(|record| {
            record.map(Movie::from).map_err(|source| DataLoadError::CsvError {
                file: file_label(path),
                source,
            })
        })
        .collect()
}

// =============================================================================
// `::` layout
// =============================================================================

/// Helper function to read a file with ISO-8859-1 encoding (Latin-1)
///
/// Each byte maps directly to the Unicode code point of the same value.
fn read_lines_latin1(path: &Path) -> Result<Vec<String>> {
    let mut file = File::open(path).map_err(|_| DataLoadError::FileNotFound {
        path: path.display().to_string(),
    })?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    let content: String = bytes.iter().map(|&b| b as char).collect();

    Ok(content.lines().map(|s| s.to_string()).collect())
}

/// Cursor over the `::` separated fields of one line
struct Fields<'a> {
    parts: std::str::Split<'a, &'static str>,
    file: &'static str,
    line: usize,
}

impl<'a> Fields<'a> {
    fn new(line_text: &'a str, file: &'static str, line: usize) -> Self {
        Self {
            parts: line_text.split("::"),
            file,
            line,
        }
    }

    fn error(&self, reason: String) -> DataLoadError {
        DataLoadError::ParseError {
            file: self.file.to_string(),
            line: self.line,
            reason,
        }
    }

    fn next_str(&mut self, name: &str) -> Result<&'a str> {
        match self.parts.next() {
            Some(value) => Ok(value),
            None => Err(self.error(format!("Missing {}", name))),
        }
    }

    fn next_parsed<T>(&mut self, name: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.next_str(name)?;
        raw.trim()
            .parse()
            .map_err(|e| self.error(format!("Invalid {}: {}", name, e)))
    }
}

/// Parse the ratings.dat file
pub fn parse_ratings_dat(path: &Path) -> Result<Vec<Rating>> {
    let lines = read_lines_latin1(path)?;
    let mut ratings = Vec::with_capacity(lines.len());

    for (idx, line) in lines.iter().enumerate() {
        let line_trimmed = line.trim();
        if line_trimmed.is_empty() {
            continue;
        }

        let mut fields = Fields::new(line_trimmed, "ratings.dat", idx + 1);
        ratings.push(Rating {
            user_id: fields.next_parsed("userId")?,
            movie_id: fields.next_parsed("movieId")?,
            rating: fields.next_parsed("rating")?,
            timestamp: fields.next_parsed("timestamp")?,
        });
    }
    Ok(ratings)
}

/// Parse the movies.dat file
///
/// The title often includes year in parentheses: "Toy Story (1995)"
/// Genres are pipe-separated: "Animation|Children's|Comedy"
pub fn parse_movies_dat(path: &Path) -> Result<Vec<Movie>> {
    let lines = read_lines_latin1(path)?;
    let mut movies = Vec::with_capacity(lines.len());

    for (idx, line) in lines.iter().enumerate() {
        let line_trimmed = line.trim();
        if line_trimmed.is_empty() {
            continue;
        }

        let mut fields = Fields::new(line_trimmed, "movies.dat", idx + 1);
        let id = fields.next_parsed("movieId")?;
        let title = fields.next_str("title")?;
        let genres = fields.next_str("genres")?;

        movies.push(Movie {
            id,
            title: title.to_string(),
            year: extract_year_from_title(title),
            genres: split_genres(genres),
        });
    }
    Ok(movies)
}

// =============================================================================
// Shared helpers
// =============================================================================

/// Extract year from movie title
///
/// Example: "Toy Story (1995)" -> Some(1995)
///          "Movie Title" -> None
pub(crate) fn extract_year_from_title(title: &str) -> Option<u16> {
    let trimmed = title.trim_end();
    let start = trimmed.rfind('(')?;
    let end = trimmed.rfind(')')?;
    if start < end {
        let year_str = &trimmed[start + 1..end];
        if year_str.len() == 4 {
            return year_str.parse::<u16>().ok();
        }
    }
    None
}

/// Split pipe-separated genres, dropping the "(no genres listed)" marker
fn split_genres(s: &str) -> Vec<String> {
    s.split('|')
        .map(str::trim)
        .filter(|g| !g.is_empty() && *g != "(no genres listed)")
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &[u8]) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents).unwrap();
        path
    }

    #[test]
    fn test_extract_year() {
        assert_eq!(extract_year_from_title("Toy Story (1995)"), Some(1995));
        assert_eq!(extract_year_from_title("Babylon 5 (1994) "), Some(1994));
        assert_eq!(extract_year_from_title("Movie Title"), None);
        assert_eq!(extract_year_from_title("Fame (Remake)"), None);
    }

    #[test]
    fn test_split_genres() {
        assert_eq!(split_genres("Action|Sci-Fi"), vec!["Action", "Sci-Fi"]);
        assert!(split_genres("(no genres listed)").is_empty());
    }

    #[test]
    fn test_parse_ratings_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "ratings.csv",
            b"userId,movieId,rating,timestamp\n1,1,4.0,964982703\n1,3,4.0,964981247\n2,1,5.0,964982224\n",
        );

        let ratings = parse_ratings_csv(&path).unwrap();
        assert_eq!(ratings.len(), 3);
        assert_eq!(ratings[1].movie_id, 3);
        assert_eq!(ratings[2].user_id, 2);
        assert_eq!(ratings[2].rating, 5.0);
    }

    #[test]
    fn test_parse_movies_csv_with_quoted_title() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "movies.csv",
            b"movieId,title,genres\n1,Toy Story (1995),Adventure|Animation\n11,\"American President, The (1995)\",Comedy|Drama|Romance\n",
        );

        let movies = parse_movies_csv(&path).unwrap();
        assert_eq!(movies.len(), 2);
        assert_eq!(movies[1].title, "American President, The (1995)");
        assert_eq!(movies[1].year, Some(1995));
        assert_eq!(movies[1].genres.len(), 3);
    }

    #[test]
    fn test_parse_ratings_csv_bad_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "ratings.csv",
            b"userId,movieId,rating,timestamp\n1,abc,4.0,964982703\n",
        );

        let err = parse_ratings_csv(&path).unwrap_err();
        assert!(matches!(err, DataLoadError::CsvError { .. }));
    }

    #[test]
    fn test_parse_dat_files() {
        let dir = tempfile::tempdir().unwrap();
        let ratings = write_file(dir.path(), "ratings.dat", b"1::1193::5::978300760\n\n1::661::3::978302109\n");
        // 0xE9 is 'é' in Latin-1
        let movies = write_file(dir.path(), "movies.dat", b"1::Caf\xe9 Society (1995)::Drama\n");

        let ratings = parse_ratings_dat(&ratings).unwrap();
        assert_eq!(ratings.len(), 2);
        assert_eq!(ratings[0].movie_id, 1193);
        assert_eq!(ratings[1].rating, 3.0);

        let movies = parse_movies_dat(&movies).unwrap();
        assert_eq!(movies[0].title, "Café Society (1995)");
        assert_eq!(movies[0].genres, vec!["Drama"]);
    }

    #[test]
    fn test_parse_dat_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "ratings.dat", b"1::1::5::1\n1::2\n");

        match parse_ratings_dat(&path) {
            Err(DataLoadError::ParseError { line, reason, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(reason, "Missing rating");
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file() {
        let err = parse_ratings_csv(Path::new("/nonexistent/ratings.csv")).unwrap_err();
        assert!(matches!(err, DataLoadError::FileNotFound { .. }));
    }
}
