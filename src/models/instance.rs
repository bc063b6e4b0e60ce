// SPDX-License-Identifier: MIT

//! Materialized, dated service occurrences.

use crate::models::comment::Comment;
use crate::models::schedule::{ServiceSchedule, ServiceType};
use crate::models::volunteer::Volunteer;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// At most this many instances may exist for a single date
/// (enforced client-side at creation time).
pub const MAX_INSTANCES_PER_DAY: usize = 3;

/// A concrete dated occurrence of a service, materialized from a template or
/// created ad hoc.
///
/// `applicants` holds full volunteer snapshots taken at application time;
/// membership checks go by `id`. `assignments` and `pairs` are optional
/// sparse groupings maintained by the assignment engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInstance {
    pub id: String,
    /// "YYYY-MM-DD"
    pub date: String,
    pub day_of_week: u8,
    pub time: String,
    pub leader: String,
    pub phone_number: String,
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    pub location: String,
    pub deadline_day_offset: u8,
    pub deadline_time: String,
    #[serde(default)]
    pub applicants: Vec<Volunteer>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    /// Spot-grid placements, keyed "<spot>-<group>", at most 3 per cell.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub assignments: BTreeMap<String, Vec<Volunteer>>,
    /// Door-to-door pairings, groups of 2-3.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pairs: Vec<Vec<Volunteer>>,
}

impl ServiceInstance {
    /// Materialize an instance from a weekly template for a concrete date.
    pub fn from_schedule(
        schedule: &ServiceSchedule,
        id: impl Into<String>,
        date: impl Into<String>,
        day_of_week: u8,
    ) -> Self {
        Self {
            id: id.into(),
            date: date.into(),
            day_of_week,
            time: schedule.time.clone(),
            leader: schedule.leader.clone(),
            phone_number: schedule.phone_number.clone(),
            service_type: schedule.service_type,
            location: schedule.location.clone(),
            deadline_day_offset: schedule.deadline_day_offset,
            deadline_time: schedule.deadline_time.clone(),
            applicants: Vec::new(),
            comments: Vec::new(),
            assignments: BTreeMap::new(),
            pairs: Vec::new(),
        }
    }

    pub fn has_applicant(&self, volunteer_id: &str) -> bool {
        self.applicants.iter().any(|v| v.id == volunteer_id)
    }

    /// Cutoff for applying or canceling: `deadline_time` on the service
    /// day, or on the day before when `deadline_day_offset` is 1.
    ///
    /// `None` when the stored date or time does not parse; such an
    /// instance never closes.
    pub fn application_deadline(&self) -> Option<NaiveDateTime> {
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()?;
        let time = NaiveTime::parse_from_str(&self.deadline_time, "%H:%M").ok()?;
        let day = date - Duration::days(i64::from(self.deadline_day_offset));
        Some(day.and_time(time))
    }

    pub fn is_application_open(&self, now: NaiveDateTime) -> bool {
        self.application_deadline().map_or(true, |deadline| now <= deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::volunteer::Gender;

    fn schedule() -> ServiceSchedule {
        ServiceSchedule {
            id: Some("s1".to_string()),
            day_of_week: 6,
            time: "10:00".to_string(),
            leader: "Dan".to_string(),
            phone_number: "010-1234".to_string(),
            service_type: ServiceType::PublicStand,
            location: "Square".to_string(),
            deadline_day_offset: 0,
            deadline_time: "08:00".to_string(),
        }
    }

    #[test]
    fn materializes_from_schedule() {
        let inst = ServiceInstance::from_schedule(&schedule(), "i1", "2026-03-07", 6);
        assert_eq!(inst.id, "i1");
        assert_eq!(inst.date, "2026-03-07");
        assert_eq!(inst.location, "Square");
        assert!(inst.applicants.is_empty());
        assert!(inst.pairs.is_empty());
    }

    #[test]
    fn wire_shape_omits_empty_groupings() {
        let inst = ServiceInstance::from_schedule(&schedule(), "i1", "2026-03-07", 6);
        let json = serde_json::to_value(&inst).unwrap();
        assert!(json.get("assignments").is_none());
        assert!(json.get("pairs").is_none());
        assert_eq!(json["dayOfWeek"], 6);
    }

    #[test]
    fn deadline_falls_on_service_day_or_the_day_before() {
        let mut inst = ServiceInstance::from_schedule(&schedule(), "i1", "2026-03-07", 6);
        // Offset 0: 08:00 on the service day itself.
        assert_eq!(
            inst.application_deadline(),
            Some(
                NaiveDate::from_ymd_opt(2026, 3, 7)
                    .unwrap()
                    .and_hms_opt(8, 0, 0)
                    .unwrap()
            )
        );

        inst.deadline_day_offset = 1;
        inst.deadline_time = "18:00".to_string();
        assert_eq!(
            inst.application_deadline(),
            Some(
                NaiveDate::from_ymd_opt(2026, 3, 6)
                    .unwrap()
                    .and_hms_opt(18, 0, 0)
                    .unwrap()
            )
        );
    }

    #[test]
    fn application_window_closes_after_the_deadline() {
        let inst = ServiceInstance::from_schedule(&schedule(), "i1", "2026-03-07", 6);
        let deadline = inst.application_deadline().unwrap();
        assert!(inst.is_application_open(deadline - chrono::Duration::minutes(1)));
        assert!(inst.is_application_open(deadline));
        assert!(!inst.is_application_open(deadline + chrono::Duration::minutes(1)));
    }

    #[test]
    fn unparseable_deadline_never_closes() {
        let mut inst = ServiceInstance::from_schedule(&schedule(), "i1", "someday", 6);
        assert_eq!(inst.application_deadline(), None);
        assert!(inst.is_application_open(
            NaiveDate::from_ymd_opt(2099, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        ));

        inst.date = "2026-03-07".to_string();
        inst.deadline_time = "late".to_string();
        assert_eq!(inst.application_deadline(), None);
    }

    #[test]
    fn deserializes_without_optional_groupings() {
        let json = serde_json::json!({
            "id": "i1",
            "date": "2026-03-07",
            "dayOfWeek": 6,
            "time": "10:00",
            "leader": "Dan",
            "phoneNumber": "010-1234",
            "type": "public-stand",
            "location": "Square",
            "deadlineDayOffset": 0,
            "deadlineTime": "08:00",
            "applicants": [
                {"id": "v1", "name": "Ana", "gender": "sister", "canDoPublicWitnessing": true}
            ],
            "comments": []
        });
        let inst: ServiceInstance = serde_json::from_value(json).unwrap();
        assert!(inst.has_applicant("v1"));
        assert!(!inst.has_applicant("v2"));
        assert!(inst.assignments.is_empty());
        assert_eq!(inst.applicants[0].gender, Gender::Sister);
    }
}
