//! Hierarchical feature paths
//!
//! A [`FeaturePath`] is the position of a filter tree node, kept as a list of
//! segments from the top-level node down, e.g. `["CT", "GTV_T",
//! "original_shape_Volume"]`. The string form joins the segments with
//! [`SEPARATOR`] and is only produced when a path is displayed or serialized.
//! Segments can never contain the separator, so the string form always
//! parses back to the same path.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::PathError;

/// Separator between segments in the string form of a path.
pub const SEPARATOR: char = '|';

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FeaturePath {
    segments: Vec<String>,
}

impl FeaturePath {
    /// Creates a path from its segments.
    ///
    /// # Examples
    ///
    /// ```
    /// use radiomics_filter::path::FeaturePath;
    ///
    /// let path = FeaturePath::new(["CT", "GTV", "original_shape_Volume"])?;
    /// assert_eq!(path.to_string(), "CT|GTV|original_shape_Volume");
    /// assert_eq!(path.depth(), 3);
    /// assert!(FeaturePath::new(["CT", "a|b"]).is_err());
    /// # Ok::<(), radiomics_filter::PathError>(())
    /// ```
    pub fn new<I, S>(segments: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments = segments.into_iter().map(Into::into).collect::<Vec<_>>();
        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        for segment in &segments {
            check_segment(segment)?;
        }
        Ok(Self { segments })
    }

    /// Path of `self` extended by one segment.
    pub fn child(&self, segment: impl Into<String>) -> Result<Self, PathError> {
        let segment = segment.into();
        check_segment(&segment)?;
        let mut segments = self.segments.clone();
        segments.push(segment);
        Ok(Self { segments })
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments; top-level nodes have depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn last(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }

    /// Segments below the top-level node.
    #[must_use]
    pub fn relative(&self) -> &[String] {
        &self.segments[1..]
    }

    /// Path made of the first `depth` segments.
    pub(crate) fn prefix(&self, depth: usize) -> Self {
        Self {
            segments: self.segments[..depth].to_vec(),
        }
    }
}

fn check_segment(segment: &str) -> Result<(), PathError> {
    if segment.is_empty() {
        return Err(PathError::EmptySegment);
    }
    if segment.contains(SEPARATOR) {
        return Err(PathError::SeparatorInSegment {
            segment: segment.to_owned(),
        });
    }
    Ok(())
}

impl fmt::Display for FeaturePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{SEPARATOR}")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

impl FromStr for FeaturePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PathError::Empty);
        }
        Self::new(s.split(SEPARATOR))
    }
}

impl TryFrom<String> for FeaturePath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FeaturePath> for String {
    fn from(path: FeaturePath) -> Self {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> FeaturePath {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        let p = path("CT|shape|volume");
        assert_eq!(p.segments(), ["CT", "shape", "volume"]);
        assert_eq!(p.to_string(), "CT|shape|volume");
        assert_eq!(p.last(), "volume");
        assert_eq!(p.relative(), ["shape", "volume"]);
    }

    #[test]
    fn test_invalid_paths() {
        assert!(matches!("".parse::<FeaturePath>(), Err(PathError::Empty)));
        assert!(matches!(
            "CT||volume".parse::<FeaturePath>(),
            Err(PathError::EmptySegment)
        ));
        assert!(matches!(
            FeaturePath::new(Vec::<String>::new()),
            Err(PathError::Empty)
        ));
        assert!(matches!(
            path("CT").child("a|b"),
            Err(PathError::SeparatorInSegment { .. })
        ));
    }

    #[test]
    fn test_prefix_and_child() {
        let p = path("CT|shape|volume");
        assert_eq!(p.prefix(1), path("CT"));
        assert_eq!(p.prefix(2), path("CT|shape"));
        assert_eq!(p.prefix(3), p);
        assert_eq!(path("CT|shape").child("volume").unwrap(), p);
    }

    #[test]
    fn test_serde_as_string() {
        let p = path("PT|GTV|original_firstorder_Mean");
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "\"PT|GTV|original_firstorder_Mean\"");
        assert_eq!(serde_json::from_str::<FeaturePath>(&json).unwrap(), p);
        assert!(serde_json::from_str::<FeaturePath>("\"\"").is_err());
    }
}
