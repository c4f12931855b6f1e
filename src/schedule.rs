use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const DAYS: [&str; 6] = [
    "MONDAY",
    "TUESDAY",
    "WEDNESDAY",
    "THURSDAY",
    "FRIDAY",
    "SATURDAY",
];

/// Weekday grid: nine 50-minute periods.
pub const WEEKDAY_SLOTS: [&str; 9] = [
    "9:30 am-10:20 am",
    "10:20 am-11:10 am",
    "11:10 am-12:00 pm",
    "12:00 pm-12:50 pm",
    "12:50 pm-1:40 pm",
    "1:40 pm-2:30 pm",
    "2:30 pm-3:20 pm",
    "3:20 pm-4:10 pm",
    "4:10 pm-5:00 pm",
];

/// Saturday runs mornings only.
pub const SATURDAY_SLOTS: [&str; 3] = [
    "9:30 am-10:20 am",
    "10:20 am-11:10 am",
    "11:10 am-12:00 pm",
];

pub fn slots_for_day(day: &str) -> &'static [&'static str] {
    if day == "SATURDAY" {
        &SATURDAY_SLOTS
    } else {
        &WEEKDAY_SLOTS
    }
}

pub fn total_cells() -> usize {
    DAYS.iter().map(|d| slots_for_day(d).len()).sum()
}

/// One scheduled class in a day x slot cell. All fields are stored in their
/// normalized form: course uppercased with whitespace removed, faculty
/// initials uppercased inside a single pair of parentheses, room uppercased
/// with internal whitespace collapsed to hyphens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotAssignment {
    #[serde(default)]
    pub course_code: String,
    #[serde(default)]
    pub faculty_initials: String,
    #[serde(default)]
    pub room: String,
}

/// Canonical weekly timetable: day name -> slot label -> assignment.
/// Every canonical day key is always present; a missing slot key means
/// "no class". Only canonical slot labels are ever written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timetable(pub BTreeMap<String, BTreeMap<String, SlotAssignment>>);

impl Timetable {
    pub fn empty() -> Self {
        let mut days = BTreeMap::new();
        for day in DAYS {
            days.insert(day.to_string(), BTreeMap::new());
        }
        Timetable(days)
    }

    pub fn assignment(&self, day: &str, slot: &str) -> Option<&SlotAssignment> {
        self.0.get(day).and_then(|d| d.get(slot))
    }

    /// Filled cells in canonical walk order: days as declared, then slots as
    /// declared for that day. The enhancer and the validator both depend on
    /// this order being stable.
    pub fn filled_cells(&self) -> Vec<(&'static str, &'static str, &SlotAssignment)> {
        let mut out = Vec::new();
        for day in DAYS {
            for slot in slots_for_day(day) {
                if let Some(a) = self.assignment(day, slot) {
                    out.push((day, *slot, a));
                }
            }
        }
        out
    }

    pub fn filled_count(&self) -> usize {
        self.filled_cells().len()
    }
}

// Alternate field names seen in model output, in priority order. The
// canonical serialized name leads each list so that re-normalizing our own
// output is the identity.
const COURSE_KEYS: [&str; 6] = [
    "courseCode",
    "courseName",
    "course",
    "subject",
    "subjectCode",
    "code",
];
const FACULTY_KEYS: [&str; 6] = [
    "facultyInitials",
    "facultyName",
    "faculty",
    "teacher",
    "instructor",
    "prof",
];
const ROOM_KEYS: [&str; 5] = ["room", "location", "venue", "lab", "classroom"];

/// Case-insensitive exact match against the six canonical day names.
pub fn reconcile_day_key(candidate: &str) -> Option<&'static str> {
    let t = candidate.trim();
    DAYS.into_iter().find(|d| d.eq_ignore_ascii_case(t))
}

/// Match a raw time-range string against a day's canonical slot labels.
/// Both sides are compared in canonical textual form, so casing, spacing,
/// separator and dash variants all reconcile.
pub fn reconcile_slot_key(candidate: &str, slots: &[&'static str]) -> Option<&'static str> {
    let canon = canonical_slot(candidate)?;
    slots.iter().copied().find(|s| *s == canon)
}

fn canonical_slot(candidate: &str) -> Option<String> {
    let dashed: String = candidate
        .chars()
        .map(|c| if is_dash(c) { '-' } else { c })
        .collect();
    let squeezed = dashed.split_whitespace().collect::<Vec<_>>().join(" ");
    let (start, end) = squeezed.split_once('-')?;
    let start = canonical_time(start)?;
    let end = canonical_time(end)?;
    Some(format!("{}-{}", start, end))
}

fn is_dash(c: char) -> bool {
    matches!(
        c,
        '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}' | '\u{2212}'
    )
}

/// Re-emit one half of a time range as `<hour>:<minute-2-digit> <am|pm>`.
/// Accepts colon, dot, or no separator between hour and minute.
fn canonical_time(half: &str) -> Option<String> {
    let t = half.trim().to_ascii_lowercase();
    let (num_part, meridiem) = if let Some(p) = t.strip_suffix("am") {
        (p, "am")
    } else if let Some(p) = t.strip_suffix("pm") {
        (p, "pm")
    } else {
        return None;
    };
    let digits: String = num_part.chars().filter(|c| c.is_ascii_digit()).collect();
    let (hour, minute): (u32, u32) = match digits.len() {
        1 | 2 => (digits.parse().ok()?, 0),
        3 => (digits[..1].parse().ok()?, digits[1..].parse().ok()?),
        4 => (digits[..2].parse().ok()?, digits[2..].parse().ok()?),
        _ => return None,
    };
    if hour == 0 || hour > 12 || minute > 59 {
        return None;
    }
    Some(format!("{}:{:02} {}", hour, minute, meridiem))
}

fn first_field(cell: &serde_json::Map<String, Value>, keys: &[&str]) -> String {
    for key in keys {
        let Some(v) = cell.get(*key) else {
            continue;
        };
        let text = match v {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => continue,
        };
        if !text.is_empty() {
            return text;
        }
    }
    String::new()
}

fn normalize_course(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

fn normalize_faculty(s: &str) -> String {
    let stripped: String = s.chars().filter(|&c| c != '(' && c != ')').collect();
    let t = stripped.trim();
    if t.is_empty() {
        String::new()
    } else {
        format!("({})", t.to_uppercase())
    }
}

fn normalize_room(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_uppercase()
}

/// Extract course/faculty/room from an assignment-like object. Returns None
/// when all three are empty after trimming; such a cell is never written.
pub fn coerce_assignment(cell: &Value) -> Option<SlotAssignment> {
    let obj = cell.as_object()?;
    let course = first_field(obj, &COURSE_KEYS);
    let faculty = first_field(obj, &FACULTY_KEYS);
    let room = first_field(obj, &ROOM_KEYS);
    if course.is_empty() && faculty.is_empty() && room.is_empty() {
        return None;
    }
    Some(SlotAssignment {
        course_code: normalize_course(&course),
        faculty_initials: normalize_faculty(&faculty),
        room: normalize_room(&room),
    })
}

/// Build the canonical timetable from a recovered payload. Reconciliation
/// misses are not errors; an unmatched day or slot simply leaves its cells
/// absent.
pub fn normalize_payload(raw: &Value) -> Timetable {
    let root = unwrap_schedule_root(raw);
    let mut out = Timetable::empty();
    let Some(obj) = root.as_object() else {
        return out;
    };
    for (key, day_value) in obj {
        let Some(day) = reconcile_day_key(key) else {
            continue;
        };
        let slots = slots_for_day(day);
        let day_map = out.0.get_mut(day).expect("skeleton has every day");
        match day_value {
            Value::Object(cells) => {
                for (slot_key, cell) in cells {
                    let Some(slot) = reconcile_slot_key(slot_key, slots) else {
                        continue;
                    };
                    if let Some(a) = coerce_assignment(cell) {
                        day_map.insert(slot.to_string(), a);
                    }
                }
            }
            // Some generations emit a day's classes as an ordered list;
            // position i maps to the i-th canonical slot for that day.
            Value::Array(cells) => {
                for (i, cell) in cells.iter().enumerate() {
                    let Some(slot) = slots.get(i) else {
                        break;
                    };
                    if let Some(a) = coerce_assignment(cell) {
                        day_map.insert(slot.to_string(), a);
                    }
                }
            }
            _ => {}
        }
    }
    out
}

fn unwrap_schedule_root(raw: &Value) -> &Value {
    let mut cur = raw;
    // Generations sometimes nest the grid under "timetable" or "data",
    // occasionally both.
    for _ in 0..2 {
        let Some(obj) = cur.as_object() else {
            break;
        };
        let nested = obj
            .get("timetable")
            .or_else(|| obj.get("data"))
            .filter(|v| v.is_object());
        match nested {
            Some(inner) => cur = inner,
            None => break,
        }
    }
    cur
}
