//! Relation kinds and their inverse mapping.
//!
//! Every relation is stored twice: once as written and once mirrored with the
//! inverse kind. The table here is the only place that pairing is defined.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RelationKind {
    Subtask,
    Parenttask,
    Related,
    DuplicateOf,
    Duplicates,
    Blocking,
    Blocked,
    Precedes,
    Follows,
    CopiedFrom,
    CopiedTo,
}

impl RelationKind {
    pub const ALL: [RelationKind; 11] = [
        RelationKind::Subtask,
        RelationKind::Parenttask,
        RelationKind::Related,
        RelationKind::DuplicateOf,
        RelationKind::Duplicates,
        RelationKind::Blocking,
        RelationKind::Blocked,
        RelationKind::Precedes,
        RelationKind::Follows,
        RelationKind::CopiedFrom,
        RelationKind::CopiedTo,
    ];

    /// The kind used for the mirror row stored in the opposite direction.
    pub const fn inverse(self) -> RelationKind {
        match self {
            RelationKind::Subtask => RelationKind::Parenttask,
            RelationKind::Parenttask => RelationKind::Subtask,
            RelationKind::Related => RelationKind::Related,
            RelationKind::DuplicateOf => RelationKind::Duplicates,
            RelationKind::Duplicates => RelationKind::DuplicateOf,
            RelationKind::Blocking => RelationKind::Blocked,
            RelationKind::Blocked => RelationKind::Blocking,
            RelationKind::Precedes => RelationKind::Follows,
            RelationKind::Follows => RelationKind::Precedes,
            RelationKind::CopiedFrom => RelationKind::CopiedTo,
            RelationKind::CopiedTo => RelationKind::CopiedFrom,
        }
    }

    /// Integer code persisted in the `relation_kind` column.
    pub const fn code(self) -> u8 {
        match self {
            RelationKind::Subtask => 1,
            RelationKind::Parenttask => 2,
            RelationKind::Related => 3,
            RelationKind::DuplicateOf => 4,
            RelationKind::Duplicates => 5,
            RelationKind::Blocking => 6,
            RelationKind::Blocked => 7,
            RelationKind::Precedes => 8,
            RelationKind::Follows => 9,
            RelationKind::CopiedFrom => 10,
            RelationKind::CopiedTo => 11,
        }
    }

    pub fn from_code(code: u8) -> Result<Self> {
        RelationKind::ALL
            .into_iter()
            .find(|kind| kind.code() == code)
            .ok_or_else(|| Error::InvalidRelationKind(code.to_string()))
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            RelationKind::Subtask => "subtask",
            RelationKind::Parenttask => "parenttask",
            RelationKind::Related => "related",
            RelationKind::DuplicateOf => "duplicateof",
            RelationKind::Duplicates => "duplicates",
            RelationKind::Blocking => "blocking",
            RelationKind::Blocked => "blocked",
            RelationKind::Precedes => "precedes",
            RelationKind::Follows => "follows",
            RelationKind::CopiedFrom => "copiedfrom",
            RelationKind::CopiedTo => "copiedto",
        }
    }

    /// Symmetric kinds are their own inverse.
    pub const fn is_symmetric(self) -> bool {
        matches!(self, RelationKind::Related)
    }

    /// Whether rows of this kind must stay acyclic.
    pub const fn checks_cycles(self) -> bool {
        !self.is_symmetric()
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|ch| *ch != '_' && *ch != '-')
            .map(|ch| ch.to_ascii_lowercase())
            .collect();
        RelationKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| Error::InvalidRelationKind(s.trim().to_string()))
    }
}

// Stored as the integer code so the row shape stays stable if names change.
impl Serialize for RelationKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for RelationKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let code = u8::deserialize(deserializer)?;
        RelationKind::from_code(code).map_err(serde::de::Error::custom)
    }
}
