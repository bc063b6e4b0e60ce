// SPDX-License-Identifier: MIT

//! Interactive assignment engines.
//!
//! Both engines model drag-and-drop as an explicit pending move (a volunteer
//! plus its origin) set on pick-up and consumed on drop. Invalid transitions
//! (self-drop, unrecognized source) are no-ops; capacity violations are
//! refused with a guidance message and leave state untouched.
//!
//! Each engine tracks which instance id it was last seeded from, so a
//! background poll refreshing the canonical store does not clobber unsaved
//! edits; re-seeding happens only when a different instance is opened.

pub mod pairing;
pub mod spot_grid;

pub use pairing::{PairingBoard, MAX_GROUP_SIZE};
pub use spot_grid::{SpotGrid, CELL_CAPACITY};
