use crate::schedule::{total_cells, SlotAssignment, Timetable};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Acceptance thresholds for a generated timetable. These are product
/// heuristics, not load-bearing rules; `timetabled.toml` may override any
/// of them per workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VarietyConfig {
    pub min_distinct_courses: usize,
    pub min_distinct_faculty: usize,
    pub max_rooms: usize,
    pub max_repetition_ratio: f64,
    pub min_fill_ratio: f64,
}

impl Default for VarietyConfig {
    fn default() -> Self {
        Self {
            min_distinct_courses: 2,
            min_distinct_faculty: 2,
            max_rooms: 2,
            max_repetition_ratio: 0.8,
            min_fill_ratio: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VarietyReport {
    pub valid: bool,
    pub issues: Vec<String>,
    pub filled_cells: usize,
    pub total_cells: usize,
    pub distinct_courses: usize,
    pub distinct_faculty: usize,
    pub distinct_rooms: usize,
}

#[derive(Default)]
struct DimensionStats {
    counts: HashMap<String, usize>,
}

impl DimensionStats {
    fn record(&mut self, value: &str) {
        if !value.is_empty() {
            *self.counts.entry(value.to_string()).or_insert(0) += 1;
        }
    }

    fn distinct(&self) -> usize {
        self.counts.len()
    }

    fn max_repetition(&self) -> usize {
        self.counts.values().copied().max().unwrap_or(0)
    }
}

/// Score a canonical timetable against the variety/fill heuristics. A
/// degenerate generation (one subject everywhere, a single room per cell,
/// a mostly-empty week) produces a non-empty issue list; it is up to the
/// caller whether to enhance, warn, or save anyway.
pub fn validate(timetable: &Timetable, cfg: &VarietyConfig) -> VarietyReport {
    let filled = timetable.filled_cells();
    let total = total_cells();

    if filled.is_empty() {
        return VarietyReport {
            valid: false,
            issues: vec!["no timetable data".to_string()],
            filled_cells: 0,
            total_cells: total,
            distinct_courses: 0,
            distinct_faculty: 0,
            distinct_rooms: 0,
        };
    }

    let mut courses = DimensionStats::default();
    let mut faculty = DimensionStats::default();
    let mut rooms = DimensionStats::default();
    for (_, _, a) in &filled {
        courses.record(&a.course_code);
        faculty.record(&a.faculty_initials);
        rooms.record(&a.room);
    }

    let filled_count = filled.len();
    let mut issues = Vec::new();

    if courses.distinct() < cfg.min_distinct_courses {
        issues.push("needs more course variety".to_string());
    }
    if faculty.distinct() < cfg.min_distinct_faculty {
        issues.push("needs more faculty variety".to_string());
    }
    if rooms.distinct() > cfg.max_rooms {
        issues.push(format!(
            "too many rooms; cap at 1-{} per schedule",
            cfg.max_rooms
        ));
    }
    if rooms.distinct() == 0 {
        issues.push("no rooms assigned".to_string());
    }

    let over_ratio = |max_rep: usize| max_rep as f64 / filled_count as f64 > cfg.max_repetition_ratio;
    if over_ratio(courses.max_repetition()) {
        issues.push("course over-repeated".to_string());
    }
    if over_ratio(faculty.max_repetition()) {
        issues.push("faculty over-repeated".to_string());
    }
    if over_ratio(rooms.max_repetition()) {
        issues.push("room over-repeated".to_string());
    }

    if (filled_count as f64 / total as f64) < cfg.min_fill_ratio {
        issues.push("too sparse".to_string());
    }

    VarietyReport {
        valid: issues.is_empty(),
        issues,
        filled_cells: filled_count,
        total_cells: total,
        distinct_courses: courses.distinct(),
        distinct_faculty: faculty.distinct(),
        distinct_rooms: rooms.distinct(),
    }
}

struct CandidatePools {
    courses: &'static [&'static str],
    faculty: &'static [&'static str],
    rooms: &'static [&'static str],
}

const FIRST_YEAR: CandidatePools = CandidatePools {
    courses: &["CSE-101", "MAT-102", "PHY-103", "ENG-104"],
    faculty: &["(ARM)", "(SKD)", "(TNH)", "(MJR)"],
    rooms: &["101", "LAB-1"],
};
const SECOND_YEAR: CandidatePools = CandidatePools {
    courses: &["CSE-201", "CSE-203", "MAT-205", "EEE-202"],
    faculty: &["(ARM)", "(SKD)", "(TNH)", "(MJR)"],
    rooms: &["201", "LAB-2"],
};
const THIRD_YEAR: CandidatePools = CandidatePools {
    courses: &["CSE-301", "CSE-303", "CSE-305", "MAT-307"],
    faculty: &["(RHM)", "(SKD)", "(FAR)", "(MJR)"],
    rooms: &["301", "LAB-3"],
};
const FOURTH_YEAR: CandidatePools = CandidatePools {
    courses: &["CSE-401", "CSE-403", "CSE-405", "CSE-407"],
    faculty: &["(RHM)", "(ARM)", "(FAR)", "(TNH)"],
    rooms: &["401", "LAB-4"],
};

fn pools_for_year(year: u32) -> &'static CandidatePools {
    match year {
        1 => &FIRST_YEAR,
        2 => &SECOND_YEAR,
        4 => &FOURTH_YEAR,
        _ => &THIRD_YEAR,
    }
}

/// Infer the academic-year bucket from the course codes already present.
/// Codes in this domain carry a 3-digit number whose leading digit is the
/// year (CSE-301 -> third year). No match defaults to a middle bucket.
fn infer_year(timetable: &Timetable) -> u32 {
    for (_, _, a) in timetable.filled_cells() {
        if let Some(year) = leading_level_digit(&a.course_code) {
            return year;
        }
    }
    2
}

fn leading_level_digit(code: &str) -> Option<u32> {
    let bytes = code.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i - start == 3 {
                let lead = (bytes[start] - b'0') as u32;
                if (1..=4).contains(&lead) {
                    return Some(lead);
                }
            }
        } else {
            i += 1;
        }
    }
    None
}

/// Deterministic best-effort rewrite of an invalid timetable: walk the
/// filled cells in canonical order and rotate each dimension through a
/// small fixed pool. Bounded repetition and a room pool no larger than the
/// room cap fall out of the rotation; the result is semantically arbitrary
/// on purpose. Never mutates the input.
pub fn enhance(timetable: &Timetable) -> Timetable {
    let pools = pools_for_year(infer_year(timetable));
    let mut out = timetable.clone();
    let cells: Vec<(&'static str, &'static str)> = timetable
        .filled_cells()
        .into_iter()
        .map(|(day, slot, _)| (day, slot))
        .collect();
    for (i, (day, slot)) in cells.into_iter().enumerate() {
        let rewritten = SlotAssignment {
            course_code: pools.courses[i % pools.courses.len()].to_string(),
            faculty_initials: pools.faculty[i % pools.faculty.len()].to_string(),
            room: pools.rooms[i % pools.rooms.len()].to_string(),
        };
        out.0
            .get_mut(day)
            .expect("canonical day present")
            .insert(slot.to_string(), rewritten);
    }
    out
}
