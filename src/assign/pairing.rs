// SPDX-License-Identifier: MIT

//! Door-to-door pairing board: grouping applicants into teams of 2-3.

use crate::error::{AppError, Result};
use crate::export;
use crate::models::{volunteer, ServiceInstance, Volunteer};

/// Maximum members per pairing group.
pub const MAX_GROUP_SIZE: usize = 3;

/// Where a dragged volunteer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Unassigned,
    Group(usize),
}

#[derive(Debug, Clone)]
struct Drag {
    volunteer: Volunteer,
    origin: Origin,
}

/// In-progress pairing state for one service instance.
///
/// A volunteer is always in exactly one place: the unassigned pool or a
/// single group. The unassigned pool stays sorted by name; group order is
/// insertion order.
#[derive(Debug, Clone)]
pub struct PairingBoard {
    instance_id: String,
    unassigned: Vec<Volunteer>,
    groups: Vec<Vec<Volunteer>>,
    drag: Option<Drag>,
}

impl PairingBoard {
    /// Seed the board from an instance's persisted pairs; applicants not in
    /// any saved group start unassigned.
    pub fn open(instance: &ServiceInstance) -> Self {
        let groups = instance.pairs.clone();
        let mut unassigned: Vec<Volunteer> = instance
            .applicants
            .iter()
            .filter(|a| !groups.iter().flatten().any(|m| m.id == a.id))
            .cloned()
            .collect();
        volunteer::sort_by_name(&mut unassigned);

        Self {
            instance_id: instance.id.clone(),
            unassigned,
            groups,
            drag: None,
        }
    }

    /// Apply a refreshed instance record. Re-seeds only when the record is
    /// for a different instance, so background polls never reset unsaved
    /// edits on the open board.
    pub fn refresh(&mut self, instance: &ServiceInstance) {
        if self.instance_id != instance.id {
            *self = Self::open(instance);
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn unassigned(&self) -> &[Volunteer] {
        &self.unassigned
    }

    pub fn groups(&self) -> &[Vec<Volunteer>] {
        &self.groups
    }

    /// The groups in persistable form (the instance's `pairs`).
    pub fn pairs(&self) -> Vec<Vec<Volunteer>> {
        self.groups.clone()
    }

    /// Pick up a volunteer from wherever they currently sit.
    pub fn start_drag(&mut self, volunteer_id: &str) -> Result<()> {
        if let Some(v) = self.unassigned.iter().find(|v| v.id == volunteer_id) {
            self.drag = Some(Drag {
                volunteer: v.clone(),
                origin: Origin::Unassigned,
            });
            return Ok(());
        }
        for (i, group) in self.groups.iter().enumerate() {
            if let Some(v) = group.iter().find(|v| v.id == volunteer_id) {
                self.drag = Some(Drag {
                    volunteer: v.clone(),
                    origin: Origin::Group(i),
                });
                return Ok(());
            }
        }
        Err(AppError::NotFound(format!(
            "volunteer {volunteer_id} is not on the board"
        )))
    }

    pub fn cancel_drag(&mut self) {
        self.drag = None;
    }

    /// Drop the dragged volunteer onto another unassigned volunteer, forming
    /// a new 2-person group. Only unassigned-to-unassigned drops form
    /// groups; anything else is a no-op.
    pub fn drop_on_volunteer(&mut self, target_id: &str) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        if drag.origin != Origin::Unassigned || drag.volunteer.id == target_id {
            return;
        }
        let Some(target) = self.unassigned.iter().find(|v| v.id == target_id).cloned() else {
            return;
        };

        self.unassigned
            .retain(|v| v.id != drag.volunteer.id && v.id != target_id);
        self.groups.push(vec![drag.volunteer, target]);
    }

    /// Drop the dragged volunteer onto an existing group, appending them and
    /// removing them from their previous location. Refused when the group is
    /// already full; dropping onto the origin group is a no-op.
    pub fn drop_on_group(&mut self, target: usize) -> Result<()> {
        let Some(drag) = self.drag.take() else {
            return Ok(());
        };
        if target >= self.groups.len() || drag.origin == Origin::Group(target) {
            return Ok(());
        }
        if self.groups[target].len() >= MAX_GROUP_SIZE {
            return Err(AppError::Refused(format!(
                "a group holds at most {MAX_GROUP_SIZE} members"
            )));
        }

        let mut target = target;
        match drag.origin {
            Origin::Unassigned => {
                self.unassigned.retain(|v| v.id != drag.volunteer.id);
            }
            Origin::Group(i) => {
                self.groups[i].retain(|v| v.id != drag.volunteer.id);
                if self.groups[i].is_empty() {
                    self.groups.remove(i);
                    if target > i {
                        target -= 1;
                    }
                }
            }
        }
        self.groups[target].push(drag.volunteer);
        Ok(())
    }

    /// Drop the dragged volunteer back into the unassigned pool. Only drags
    /// originating from a group do anything; the group is pruned if it
    /// becomes empty.
    pub fn drop_on_unassigned(&mut self) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        let Origin::Group(i) = drag.origin else {
            return;
        };

        self.groups[i].retain(|v| v.id != drag.volunteer.id);
        if self.groups[i].is_empty() {
            self.groups.remove(i);
        }
        self.unassigned.push(drag.volunteer);
        volunteer::sort_by_name(&mut self.unassigned);
    }

    /// Dissolve a group, returning all its members to the unassigned pool.
    pub fn unpair(&mut self, group_index: usize) {
        if group_index >= self.groups.len() {
            return;
        }
        let group = self.groups.remove(group_index);
        self.unassigned.extend(group);
        volunteer::sort_by_name(&mut self.unassigned);
    }

    /// Render the board as a downloadable CSV sheet.
    pub fn export_csv(&self, instance: &ServiceInstance) -> String {
        export::pairing_sheet(instance, &self.groups, &self.unassigned)
    }
}
