//! Login sessions and the remembered display name.

use crate::models::{Gender, Volunteer};
use std::fs;
use std::path::Path;

/// Role the session was opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    Leader,
    Volunteer,
}

/// Transient login session, never persisted.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: Volunteer,
    pub role: UserRole,
}

impl Session {
    /// A leader session uses a synthetic record that is not in the roster.
    pub fn leader() -> Self {
        Self {
            user: Volunteer::new("leader", "Leader", Gender::Brother, true),
            role: UserRole::Leader,
        }
    }

    pub fn volunteer(user: Volunteer) -> Self {
        Self {
            user,
            role: UserRole::Volunteer,
        }
    }
}

/// Load the remembered login name, if any. Used only to pre-fill the login
/// form, never as a credential.
pub fn load_remembered_name(path: impl AsRef<Path>) -> Option<String> {
    let name = fs::read_to_string(path).ok()?;
    let name = name.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Persist the remembered login name. Failures are logged and ignored; this
/// is a convenience, not state the app depends on.
pub fn store_remembered_name(path: impl AsRef<Path>, name: &str) {
    if let Err(e) = fs::write(path.as_ref(), name) {
        tracing::warn!(error = %e, "Failed to store remembered name");
    }
}
