//! Navigation Layer
//!
//! Every page image gets a root view (the full image) followed by one view
//! per detected region. Clicking a view shows the next one; the last region
//! leads back to the root.

pub mod graph;

pub use graph::{CycleBuilder, ImageCycle, NavigationGraph};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MultiplexError;

/// Identifier of a rendered view
///
/// Written as `<image>.` for the root view and `<image>.<rank>` for regions,
/// where `<image>` is the 1-based position of the image on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ViewId {
    image_index: usize,
    rank: Option<usize>,
}

impl ViewId {
    /// Full-image view of the image at 0-based `image_index`
    pub fn root(image_index: usize) -> Self {
        Self {
            image_index,
            rank: None,
        }
    }

    /// Region view with 1-based `rank`
    pub fn region(image_index: usize, rank: usize) -> Self {
        Self {
            image_index,
            rank: Some(rank),
        }
    }

    /// 0-based index of the source image
    pub fn image_index(&self) -> usize {
        self.image_index
    }

    pub fn rank(&self) -> Option<usize> {
        self.rank
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rank {
            Some(rank) => write!(f, "{}.{}", self.image_index + 1, rank),
            None => write!(f, "{}.", self.image_index + 1),
        }
    }
}

impl FromStr for ViewId {
    type Err = MultiplexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MultiplexError::InvalidIdentifier(s.to_string());

        let (image, rank) = s.split_once('.').ok_or_else(invalid)?;
        let image: usize = image.parse().map_err(|_| invalid())?;
        if image == 0 {
            return Err(invalid());
        }

        if rank.is_empty() {
            return Ok(Self::root(image - 1));
        }
        let rank: usize = rank.parse().map_err(|_| invalid())?;
        if rank == 0 {
            return Err(invalid());
        }
        Ok(Self::region(image - 1, rank))
    }
}

impl From<ViewId> for String {
    fn from(id: ViewId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for ViewId {
    type Error = MultiplexError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(ViewId::root(0).to_string(), "1.");
        assert_eq!(ViewId::region(0, 2).to_string(), "1.2");
        assert_eq!(ViewId::region(9, 11).to_string(), "10.11");
    }

    #[test]
    fn test_parse() {
        assert_eq!("1.".parse::<ViewId>().unwrap(), ViewId::root(0));
        assert_eq!("3.4".parse::<ViewId>().unwrap(), ViewId::region(2, 4));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for text in ["", "1", "0.", "1.0", "a.1", "1.b", ".1", "1.2.3"] {
            assert!(
                matches!(text.parse::<ViewId>(), Err(MultiplexError::InvalidIdentifier(_))),
                "{text:?} should not parse"
            );
        }
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&ViewId::region(1, 3)).unwrap();
        assert_eq!(json, "\"2.3\"");
        let parsed: ViewId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ViewId::region(1, 3));
    }
}
