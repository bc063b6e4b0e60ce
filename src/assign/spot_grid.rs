// SPDX-License-Identifier: MIT

//! Public-witnessing spot grid: placing applicants into spot x group cells.

use crate::error::{AppError, Result};
use crate::export;
use crate::models::{volunteer, ServiceInstance, Volunteer};
use std::collections::BTreeMap;

/// Maximum volunteers per grid cell.
pub const CELL_CAPACITY: usize = 3;

#[derive(Debug, Clone)]
struct Drag {
    volunteer: Volunteer,
    /// Cell the drag started from; `None` for the unassigned pool.
    from_key: Option<String>,
}

/// In-progress spot assignments for one service instance.
///
/// The grid is the Cartesian product of configured spot and group names;
/// placements live in a sparse map keyed `"<spot>-<group>"`. The unassigned
/// pool is never stored, it is recomputed from the applicants.
#[derive(Debug, Clone)]
pub struct SpotGrid {
    instance_id: String,
    spots: Vec<String>,
    groups: Vec<String>,
    assignments: BTreeMap<String, Vec<Volunteer>>,
    drag: Option<Drag>,
}

impl SpotGrid {
    /// Seed the grid from an instance's persisted assignments.
    pub fn open(instance: &ServiceInstance, spots: Vec<String>, groups: Vec<String>) -> Self {
        let mut assignments = instance.assignments.clone();
        assignments.retain(|_, cell| !cell.is_empty());
        Self {
            instance_id: instance.id.clone(),
            spots,
            groups,
            assignments,
            drag: None,
        }
    }

    /// Apply a refreshed instance record; re-seeds only for a different
    /// instance so background polls never reset unsaved edits.
    pub fn refresh(&mut self, instance: &ServiceInstance) {
        if self.instance_id != instance.id {
            *self = Self::open(instance, self.spots.clone(), self.groups.clone());
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn spots(&self) -> &[String] {
        &self.spots
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    fn key(spot: &str, group: &str) -> String {
        format!("{spot}-{group}")
    }

    /// The volunteers placed in one cell.
    pub fn cell(&self, spot: &str, group: &str) -> &[Volunteer] {
        self.assignments
            .get(&Self::key(spot, group))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The sparse placement map in persistable form.
    pub fn assignments(&self) -> &BTreeMap<String, Vec<Volunteer>> {
        &self.assignments
    }

    /// Applicants not currently placed in any cell, sorted by name.
    pub fn unassigned(&self, applicants: &[Volunteer]) -> Vec<Volunteer> {
        let placed: std::collections::HashSet<&str> = self
            .assignments
            .values()
            .flatten()
            .map(|v| v.id.as_str())
            .collect();
        let mut pool: Vec<Volunteer> = applicants
            .iter()
            .filter(|v| !placed.contains(v.id.as_str()))
            .cloned()
            .collect();
        volunteer::sort_by_name(&mut pool);
        pool
    }

    /// Pick up a volunteer from the unassigned pool.
    pub fn start_drag_from_pool(&mut self, volunteer: Volunteer) {
        self.drag = Some(Drag {
            volunteer,
            from_key: None,
        });
    }

    /// Pick up a volunteer already placed in a cell.
    pub fn start_drag_from_cell(&mut self, spot: &str, group: &str, volunteer_id: &str) -> Result<()> {
        let key = Self::key(spot, group);
        let volunteer = self
            .assignments
            .get(&key)
            .and_then(|cell| cell.iter().find(|v| v.id == volunteer_id))
            .cloned()
            .ok_or_else(|| {
                AppError::NotFound(format!("volunteer {volunteer_id} is not in cell {key}"))
            })?;
        self.drag = Some(Drag {
            volunteer,
            from_key: Some(key),
        });
        Ok(())
    }

    pub fn cancel_drag(&mut self) {
        self.drag = None;
    }

    /// Drop the dragged volunteer onto a cell. Refused when the cell is
    /// full; dropping onto the origin cell is a no-op.
    pub fn drop_on_cell(&mut self, spot: &str, group: &str) -> Result<()> {
        let Some(drag) = self.drag.take() else {
            return Ok(());
        };
        let target = Self::key(spot, group);
        if drag.from_key.as_deref() == Some(target.as_str()) {
            return Ok(());
        }
        if self.assignments.get(&target).map_or(0, Vec::len) >= CELL_CAPACITY {
            return Err(AppError::Refused(format!(
                "a cell holds at most {CELL_CAPACITY} volunteers"
            )));
        }

        if let Some(from) = drag.from_key {
            self.remove_by_id(&from, &drag.volunteer.id);
        }
        self.assignments.entry(target).or_default().push(drag.volunteer);
        Ok(())
    }

    /// Drop the dragged volunteer onto the unassigned zone. Only drags that
    /// originated from a cell are accepted; pool-origin drags are a no-op.
    pub fn drop_on_unassigned(&mut self) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        let Some(from) = drag.from_key else {
            return;
        };
        self.remove_by_id(&from, &drag.volunteer.id);
    }

    /// Explicit remove button on a placed volunteer.
    pub fn remove_from_cell(&mut self, spot: &str, group: &str, volunteer_id: &str) {
        self.remove_by_id(&Self::key(spot, group), volunteer_id);
    }

    fn remove_by_id(&mut self, key: &str, volunteer_id: &str) {
        if let Some(cell) = self.assignments.get_mut(key) {
            cell.retain(|v| v.id != volunteer_id);
            if cell.is_empty() {
                self.assignments.remove(key);
            }
        }
    }

    /// Render the grid as a downloadable CSV sheet.
    pub fn export_csv(&self, instance: &ServiceInstance) -> String {
        export::spot_sheet(instance, &self.spots, &self.groups, &self.assignments)
    }
}
