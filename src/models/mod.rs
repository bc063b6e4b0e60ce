// SPDX-License-Identifier: MIT

//! Data models shared with the remote gateway.
//!
//! Wire shapes are camelCase JSON, matching the spreadsheet backend's
//! contract exactly.

pub mod comment;
pub mod instance;
pub mod schedule;
pub mod volunteer;

pub use comment::Comment;
pub use instance::{ServiceInstance, MAX_INSTANCES_PER_DAY};
pub use schedule::{ServiceForm, ServiceSchedule, ServiceType};
pub use volunteer::{Gender, Volunteer};
