//! Volunteer roster entry.

use serde::{Deserialize, Serialize};

/// Volunteer gender, used for display grouping only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Brother,
    Sister,
}

/// A roster member.
///
/// Identity is `id`; `name` is relied on for login lookup and assumed unique
/// upstream. Records created locally carry a temporary id until the gateway
/// returns the permanent one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volunteer {
    pub id: String,
    pub name: String,
    pub gender: Gender,
    /// Whether this volunteer may be placed at a public-witnessing stand.
    pub can_do_public_witnessing: bool,
}

impl Volunteer {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        gender: Gender,
        can_do_public_witnessing: bool,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            gender,
            can_do_public_witnessing,
        }
    }
}

/// Sort a volunteer list by name for stable display.
pub fn sort_by_name(volunteers: &mut [Volunteer]) {
    volunteers.sort_by(|a, b| a.name.cmp(&b.name));
}
