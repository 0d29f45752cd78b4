//! This module provides utilities for loading point sets from files.
//!
//! The format is deliberately plain: one point per line, coordinates separated by
//! whitespace and/or commas. Blank lines and lines starting with `#` are ignored.
//! Every point must have the same number of coordinates.

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};
use thiserror::Error;

/// Represents all possible errors that can occur while loading a point set.
#[derive(Error, Debug)]
pub enum DataLoaderError {
    /// Wraps a standard I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Occurs when a coordinate cannot be parsed into a float.
    #[error("Parse error on line {line}: Failed to parse float from '{token}'")]
    ParseFloat { line: usize, token: String },
    /// Occurs when a point has a different number of coordinates than the first one.
    #[error("Dimension mismatch on line {line}: expected {expected} coordinates, found {found}.")]
    DimensionMismatch {
        line: usize,
        expected: usize,
        found: usize,
    },
    /// Occurs when a data line holds separators but no coordinates.
    #[error("Format error on line {line}: The point has no coordinates.")]
    NoCoordinates { line: usize },
    /// Occurs when the input contains no points at all.
    #[error("Format error: The input contains no points.")]
    Empty,
}

/// A point set read from a file.
#[derive(Clone, Debug, PartialEq)]
pub struct PointSet {
    /// The points, in file order.
    pub points: Vec<Vec<f64>>,
    /// The number of coordinates of every point.
    pub dim: usize,
}

/// Parses a point set from any buffered reader.
pub fn parse_points(reader: impl BufRead) -> Result<PointSet, DataLoaderError> {
    let mut points: Vec<Vec<f64>> = Vec::new();
    let mut dim = 0;

    for (line_index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        // Line numbers in messages are 1-based.
        let line_number = line_index + 1;
        let point = trimmed
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .map(|token| {
                token.parse::<f64>().map_err(|_| DataLoaderError::ParseFloat {
                    line: line_number,
                    token: token.to_string(),
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;

        if point.is_empty() {
            return Err(DataLoaderError::NoCoordinates { line: line_number });
        }
        if points.is_empty() {
            dim = point.len();
        } else if point.len() != dim {
            return Err(DataLoaderError::DimensionMismatch {
                line: line_number,
                expected: dim,
                found: point.len(),
            });
        }
        points.push(point);
    }

    if points.is_empty() {
        return Err(DataLoaderError::Empty);
    }
    Ok(PointSet { points, dim })
}

/// Loads a point set from a text file.
///
/// # Arguments
/// * `path`: The path to the file.
///
/// # Returns
/// The [`PointSet`], or a [`DataLoaderError`] describing the first problem found.
pub fn load_points(path: impl AsRef<Path>) -> Result<PointSet, DataLoaderError> {
    let file = File::open(path)?;
    parse_points(BufReader::new(file))
}
