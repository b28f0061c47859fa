//! Wire-level entity types shared by the API client and the stores.
//!
//! Field names follow the server's camelCase JSON. Partial request bodies
//! (`*Draft`, `*Patch`) skip absent fields entirely so the server only sees
//! what the caller set.

pub mod bug;
pub mod project;
pub mod team;
pub mod user;

pub use bug::{Bug, BugDraft, BugPatch, BugPriority, BugStatus};
pub use project::{Project, ProjectDraft, ProjectPatch};
pub use team::{Team, TeamDraft, TeamMember, TeamPatch};
pub use user::{LoginCredentials, RegisterData, User, UserPatch};

use serde::Deserialize;
use std::fmt;

/// Response envelope used by every project/bug/team endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// Entities addressed by a server-assigned string id.
pub trait Keyed {
    fn key(&self) -> &str;
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

/// Lowercase and drop separators so `In Progress`, `in-progress` and
/// `in_progress` all compare equal.
pub(crate) fn normalize(input: &str) -> String {
    input
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}
