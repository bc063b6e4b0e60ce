//! Comments attached to a service instance.

use serde::{Deserialize, Serialize};

/// A comment on a service instance.
///
/// Authorship is immutable; only the authoring user may edit or delete.
/// Displayed and exported in `created_at` ascending order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub text: String,
    /// ISO-8601 timestamp.
    pub created_at: String,
}

/// Sort comments chronologically for display and export.
pub fn sort_by_created_at(comments: &mut [Comment]) {
    comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
}
