//! Dataset identification
//!
//! `DatasetId` tags recovery log segments with the intermediate dataset the
//! writer produces, so tooling can find every segment of one result.

use std::fmt;

/// Identifier of a produced intermediate dataset
///
/// # Example
///
/// ```
/// use spindle_protocol::DatasetId;
///
/// let dataset = DatasetId::new("pagerank-ranks");
/// assert_eq!(dataset.as_str(), "pagerank-ranks");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetId(String);

impl DatasetId {
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DatasetId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for DatasetId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for DatasetId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
