// SPDX-License-Identifier: MIT

//! Service-Roster: client core for a volunteer field-service signup system.
//!
//! This crate provides the domain model, the remote gateway client, the
//! optimistic-update synchronization controller, and the two interactive
//! assignment engines (door-to-door pairing and the public-witnessing spot
//! grid) backed by a spreadsheet-style remote API.

pub mod assign;
pub mod config;
pub mod error;
pub mod export;
pub mod gateway;
pub mod models;
pub mod session;
pub mod sync;

pub use error::{AppError, Result};
pub use sync::SyncController;
