//! Distance metrics over sparse rating rows.
//!
//! Every metric treats an unrated cell as a real zero component. Two rows
//! only need to be walked together over their stored entries; the squared
//! norms are computed once per row and passed in.

use crate::error::SimilarityError;
use crate::matrix::RowView;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Distance used to rank neighbor rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// 1 - cos(angle), clipped to [0, 2]. A zero row is at distance 1 from everything.
    #[default]
    Cosine,
    /// L2 distance
    Euclidean,
    /// L1 distance
    Manhattan,
}

impl DistanceMetric {
    /// Distance between two rows given their precomputed squared norms
    pub fn distance(self, a: RowView<'_>, a_sq_norm: f64, b: RowView<'_>, b_sq_norm: f64) -> f64 {
        match self {
            DistanceMetric::Cosine => {
                if a_sq_norm == 0.0 || b_sq_norm == 0.0 {
                    return 1.0;
                }
                let similarity = dot(a, b) / (a_sq_norm.sqrt() * b_sq_norm.sqrt());
                (1.0 - similarity).clamp(0.0, 2.0)
            }
            DistanceMetric::Euclidean => (a_sq_norm + b_sq_norm - 2.0 * dot(a, b)).max(0.0).sqrt(),
            DistanceMetric::Manhattan => manhattan(a, b),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::Manhattan => "manhattan",
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceMetric {
    type Err = SimilarityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(DistanceMetric::Cosine),
            "euclidean" | "l2" => Ok(DistanceMetric::Euclidean),
            "manhattan" | "l1" => Ok(DistanceMetric::Manhattan),
            _ => Err(SimilarityError::UnknownMetric(s.to_string())),
        }
    }
}

/// Dot product of two sparse rows with sorted indices
fn dot(a: RowView<'_>, b: RowView<'_>) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut sum = 0.0;
    while i < a.indices.len() && j < b.indices.len() {
        match a.indices[i].cmp(&b.indices[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                sum += f64::from(a.values[i]) * f64::from(b.values[j]);
                i += 1;
                j += 1;
            }
        }
    }
    sum
}

/// L1 distance; entries present in only one row count against the zero
fn manhattan(a: RowView<'_>, b: RowView<'_>) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut sum = 0.0;
    while i < a.indices.len() && j < b.indices.len() {
        match a.indices[i].cmp(&b.indices[j]) {
            Ordering::Less => {
                sum += f64::from(a.values[i]).abs();
                i += 1;
            }
            Ordering::Greater => {
                sum += f64::from(b.values[j]).abs();
                j += 1;
            }
            Ordering::Equal => {
                sum += (f64::from(a.values[i]) - f64::from(b.values[j])).abs();
                i += 1;
                j += 1;
            }
        }
    }
    sum += a.values[i..].iter().map(|&v| f64::from(v).abs()).sum::<f64>();
    sum += b.values[j..].iter().map(|&v| f64::from(v).abs()).sum::<f64>();
    sum
}
