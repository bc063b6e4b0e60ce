// SPDX-License-Identifier: MIT

//! CSV sheet builders for the assignment engines.
//!
//! Output is UTF-8 with a byte-order mark so spreadsheet apps pick the right
//! encoding. Fields containing the delimiter, quotes, or newlines are
//! double-quote-wrapped with internal quotes doubled. These files are
//! produced for download only; nothing here is ever parsed back.

use crate::models::{comment, ServiceInstance, ServiceType, Volunteer};
use std::collections::BTreeMap;

/// Byte-order mark prepended to every sheet.
pub const UTF8_BOM: &str = "\u{feff}";

/// Quote a CSV field if it needs it.
fn field(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Member name, annotated when the volunteer cannot staff a stand but the
/// instance mixes stand and door-to-door work.
fn member_name(volunteer: &Volunteer, service_type: ServiceType) -> String {
    if service_type == ServiceType::PublicStandAndDoorToDoor && !volunteer.can_do_public_witnessing
    {
        format!("{} (door-to-door only)", volunteer.name)
    } else {
        volunteer.name.clone()
    }
}

fn header_lines(instance: &ServiceInstance) -> Vec<String> {
    vec![
        field(&format!("Service: {} {}", instance.date, instance.time)),
        field(&format!("Type: {}", instance.service_type)),
        field(&format!("Location: {}", instance.location)),
    ]
}

fn comments_section(instance: &ServiceInstance) -> Option<String> {
    if instance.comments.is_empty() {
        return None;
    }
    let mut comments = instance.comments.clone();
    comment::sort_by_created_at(&mut comments);

    let mut lines = vec!["Comments".to_string(), "Author,Text,Posted".to_string()];
    for c in &comments {
        lines.push(
            [field(&c.author_name), field(&c.text), field(&c.created_at)].join(","),
        );
    }
    Some(lines.join("\n"))
}

/// Build the pairing sheet: one row per group, a trailing row for
/// unassigned members, then the instance's comments.
pub fn pairing_sheet(
    instance: &ServiceInstance,
    groups: &[Vec<Volunteer>],
    unassigned: &[Volunteer],
) -> String {
    let mut sections = vec![header_lines(instance).join("\n")];

    let mut table = vec!["Group,Members".to_string()];
    for (i, group) in groups.iter().enumerate() {
        let names = group
            .iter()
            .map(|v| member_name(v, instance.service_type))
            .collect::<Vec<_>>()
            .join("  ");
        table.push(format!("Group {},{}", i + 1, field(&names)));
    }
    sections.push(table.join("\n"));

    if !unassigned.is_empty() {
        let mut row = vec!["Unassigned".to_string()];
        row.extend(
            unassigned
                .iter()
                .map(|v| field(&member_name(v, instance.service_type))),
        );
        sections.push(row.join(","));
    }

    if let Some(comments) = comments_section(instance) {
        sections.push(comments);
    }

    format!("{}{}", UTF8_BOM, sections.join("\n\n"))
}

/// Build the spot-grid sheet: one row per group, one column per spot,
/// cell contents are the placed members' names.
pub fn spot_sheet(
    instance: &ServiceInstance,
    spots: &[String],
    groups: &[String],
    assignments: &BTreeMap<String, Vec<Volunteer>>,
) -> String {
    let mut sections = vec![header_lines(instance).join("\n")];

    let mut table = Vec::with_capacity(groups.len() + 1);
    let mut header = vec!["Group".to_string()];
    header.extend(spots.iter().map(|s| field(s)));
    table.push(header.join(","));

    for group in groups {
        let mut row = vec![field(group)];
        for spot in spots {
            let key = format!("{spot}-{group}");
            let names = assignments
                .get(&key)
                .map(|cell| {
                    cell.iter()
                        .map(|v| member_name(v, instance.service_type))
                        .collect::<Vec<_>>()
                        .join("  ")
                })
                .unwrap_or_default();
            row.push(field(&names));
        }
        table.push(row.join(","));
    }
    sections.push(table.join("\n"));

    if let Some(comments) = comments_section(instance) {
        sections.push(comments);
    }

    format!("{}{}", UTF8_BOM, sections.join("\n\n"))
}
