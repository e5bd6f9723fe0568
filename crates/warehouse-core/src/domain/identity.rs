//! Store-assigned entity identity

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Identity of an entity
///
/// Entities are created `Unassigned`; a repository's `add` back-fills the
/// identity generated by the store. Anything that needs a persisted row
/// (association rows, lookups by id) goes through [`Identity::require`].
/// Serializes as the id or `null`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<i64>", into = "Option<i64>")]
pub enum Identity {
    #[default]
    Unassigned,
    Assigned(i64),
}

impl Identity {
    /// The assigned id, if any
    pub fn value(&self) -> Option<i64> {
        match self {
            Self::Assigned(id) => Some(*id),
            Self::Unassigned => None,
        }
    }

    pub fn is_assigned(&self) -> bool {
        matches!(self, Self::Assigned(_))
    }

    /// The assigned id, or `InvalidArgument` naming the unpersisted entity
    pub fn require(&self, entity: &str) -> Result<i64> {
        self.value().ok_or_else(|| {
            Error::InvalidArgument(format!("{} has not been persisted yet", entity))
        })
    }
}

impl From<i64> for Identity {
    fn from(id: i64) -> Self {
        Self::Assigned(id)
    }
}

impl From<Option<i64>> for Identity {
    fn from(id: Option<i64>) -> Self {
        id.map_or(Self::Unassigned, Self::Assigned)
    }
}

impl From<Identity> for Option<i64> {
    fn from(id: Identity) -> Self {
        id.value()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Assigned(id) => write!(f, "{}", id),
            Self::Unassigned => write!(f, "-"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unassigned() {
        let id = Identity::default();
        assert!(!id.is_assigned());
        assert_eq!(id.value(), None);
        assert_eq!(id.to_string(), "-");
    }

    #[test]
    fn test_require_on_unassigned_fails() {
        let err = Identity::Unassigned.require("Product").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(err.to_string().contains("Product"));
    }

    #[test]
    fn test_require_on_assigned() {
        assert_eq!(Identity::from(7).require("Order").unwrap(), 7);
    }

    #[test]
    fn test_serializes_as_nullable_id() {
        assert_eq!(serde_json::to_string(&Identity::Assigned(3)).unwrap(), "3");
        assert_eq!(serde_json::to_string(&Identity::Unassigned).unwrap(), "null");
        let parsed: Identity = serde_json::from_str("12").unwrap();
        assert_eq!(parsed, Identity::Assigned(12));
    }
}
