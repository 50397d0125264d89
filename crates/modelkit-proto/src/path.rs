//! Dotted field paths.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Separator between the segments of a field path.
pub const PATH_SEPARATOR: char = '.';

/// A field path such as `Profile.BestPost.Title`.
///
/// Each segment names a field on the model reached by the previous segments.
/// Segments are kept exactly as written; normalising them to wire names is
/// the registry's job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Build a path from already split segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse and validate a dotted path.
    ///
    /// Every segment must be a non-empty ASCII identifier.
    pub fn parse(path: &str) -> Result<Self, Error> {
        let parsed = Self::from(path);
        if parsed.is_empty() {
            return Err(Error::InvalidPath {
                path: path.to_string(),
                reason: "path is empty".to_string(),
            });
        }
        for segment in &parsed.segments {
            let valid = !segment.is_empty()
                && segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                && !segment.starts_with(|c: char| c.is_ascii_digit());
            if !valid {
                return Err(Error::InvalidPath {
                    path: path.to_string(),
                    reason: format!("'{}' is not a valid identifier", segment),
                });
            }
        }
        Ok(parsed)
    }

    /// The segments of this path.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the path has no segment at all.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The last segment, if any.
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Append a segment.
    pub fn push(&mut self, segment: impl Into<String>) {
        self.segments.push(segment.into());
    }

    /// Every non-empty prefix of this path, shortest first.
    ///
    /// `a.b.c` yields `a`, `a.b` and `a.b.c`.
    pub fn prefixes(&self) -> impl Iterator<Item = FieldPath> + '_ {
        (1..=self.segments.len()).map(move |n| FieldPath {
            segments: self.segments[..n].to_vec(),
        })
    }

    /// Render the path with the separator.
    pub fn join(&self) -> String {
        let mut sep = [0u8; 4];
        self.segments.join(&*PATH_SEPARATOR.encode_utf8(&mut sep))
    }

    /// Consume the path, returning its segments.
    pub fn into_segments(self) -> Vec<String> {
        self.segments
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join())
    }
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        if path.is_empty() {
            return Self::default();
        }
        Self::from_segments(path.split(PATH_SEPARATOR))
    }
}

impl From<String> for FieldPath {
    fn from(path: String) -> Self {
        Self::from(path.as_str())
    }
}

impl From<&String> for FieldPath {
    fn from(path: &String) -> Self {
        Self::from(path.as_str())
    }
}

impl FromStr for FieldPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
