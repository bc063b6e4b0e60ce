// SPDX-License-Identifier: MIT

//! Recurring weekly schedule templates.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of service a slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceType {
    #[serde(rename = "door-to-door")]
    DoorToDoor,
    #[serde(rename = "public-stand")]
    PublicStand,
    /// Mixed slot: a public stand staffed alongside door-to-door work.
    /// Volunteers without stand eligibility get annotated in exports.
    #[serde(rename = "public-stand&door-to-door")]
    PublicStandAndDoorToDoor,
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceType::DoorToDoor => "door-to-door",
            ServiceType::PublicStand => "public-stand",
            ServiceType::PublicStandAndDoorToDoor => "public-stand&door-to-door",
        };
        f.write_str(s)
    }
}

/// A recurring weekly service slot, managed by the leader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSchedule {
    /// Absent until the gateway assigns one; locally created templates carry
    /// a temporary id while their save is in flight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// 0 = Sunday .. 6 = Saturday. The remote store may deliver 7 for
    /// Sunday; see [`normalize_day_of_week`].
    pub day_of_week: u8,
    pub time: String,
    pub leader: String,
    pub phone_number: String,
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    pub location: String,
    /// 0 = deadline on the service day, 1 = the day before.
    pub deadline_day_offset: u8,
    /// "HH:MM"
    pub deadline_time: String,
}

impl ServiceSchedule {
    /// Client-side validation, run before any optimistic mutation.
    pub fn validate(&self) -> Result<()> {
        if self.day_of_week > 6 {
            return Err(AppError::Validation(format!(
                "dayOfWeek must be 0..=6, got {}",
                self.day_of_week
            )));
        }
        if self.deadline_day_offset > 1 {
            return Err(AppError::Validation(format!(
                "deadlineDayOffset must be 0 or 1, got {}",
                self.deadline_day_offset
            )));
        }
        validate_time(&self.time)?;
        validate_time(&self.deadline_time)?;
        Ok(())
    }
}

/// Check a "HH:MM" time string.
pub fn validate_time(time: &str) -> Result<()> {
    chrono::NaiveTime::parse_from_str(time, "%H:%M")
        .map_err(|_| AppError::Validation(format!("malformed time string: {time:?}")))?;
    Ok(())
}

/// Map the remote store's Sunday encoding (7) onto ours (0).
pub fn normalize_day_of_week(day: u8) -> u8 {
    if day == 7 {
        0
    } else {
        day
    }
}

/// Fields for creating an ad hoc instance from the service form
/// (everything a schedule has except identity and weekday, which come from
/// the selected date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceForm {
    pub time: String,
    pub leader: String,
    pub phone_number: String,
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    pub location: String,
    pub deadline_day_offset: u8,
    pub deadline_time: String,
}

impl ServiceForm {
    pub fn validate(&self) -> Result<()> {
        if self.deadline_day_offset > 1 {
            return Err(AppError::Validation(format!(
                "deadlineDayOffset must be 0 or 1, got {}",
                self.deadline_day_offset
            )));
        }
        validate_time(&self.time)?;
        validate_time(&self.deadline_time)?;
        Ok(())
    }
}
