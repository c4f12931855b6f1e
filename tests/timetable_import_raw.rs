
use serde_json::json;
use test_support::{error_code, request_err, request_ok, spawn_sidecar};

const DAYS: [&str; 6] = [
    "MONDAY",
    "TUESDAY",
    "WEDNESDAY",
    "THURSDAY",
    "FRIDAY",
    "SATURDAY",
];

#[test]
fn fenced_model_response_normalizes_to_the_canonical_grid() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let raw = "Sure! Here is the schedule you asked for:\n```json\n{\n  \"timetable\": {\n    \"monday\": {\n      \"9:30AM-10:20AM\": { \"subject\": \"cse 201\", \"teacher\": \"arm\", \"venue\": \"Room 201\" },\n      \"10:20 am \u{2013} 11:10 am\": { \"course\": \"MAT-205\", \"prof\": \"(skd)\", \"room\": \"LAB 2\" }\n    },\n    \"Saturday\": [ { \"courseName\": \"PHY-101\", \"instructor\": \"tnh\", \"classroom\": \"201\" } ]\n  }\n}\n```\nLet me know if you want changes.";

    let result = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "timetable.importRaw",
        json!({ "raw": raw }),
    );

    let timetable = result.get("timetable").unwrap();
    let days = timetable.as_object().unwrap();
    assert_eq!(days.len(), 6);
    for day in DAYS {
        assert!(days.contains_key(day), "missing day key {day}");
    }

    let monday_first = timetable
        .pointer("/MONDAY/9:30 am-10:20 am")
        .expect("monday first slot");
    assert_eq!(
        monday_first.get("courseCode").and_then(|v| v.as_str()),
        Some("CSE201")
    );
    assert_eq!(
        monday_first.get("facultyInitials").and_then(|v| v.as_str()),
        Some("(ARM)")
    );
    assert_eq!(
        monday_first.get("room").and_then(|v| v.as_str()),
        Some("ROOM-201")
    );

    // The en-dash slot key reconciled onto the second canonical slot.
    let monday_second = timetable
        .pointer("/MONDAY/10:20 am-11:10 am")
        .expect("monday second slot");
    assert_eq!(
        monday_second.get("facultyInitials").and_then(|v| v.as_str()),
        Some("(SKD)")
    );

    // Array day entries map by slot index.
    let saturday_first = timetable
        .pointer("/SATURDAY/9:30 am-10:20 am")
        .expect("saturday first slot");
    assert_eq!(
        saturday_first.get("courseCode").and_then(|v| v.as_str()),
        Some("PHY-101")
    );

    // Three filled cells out of 48: degenerate, unenhanceable, surfaced.
    assert_eq!(result.get("enhanced").and_then(|v| v.as_bool()), Some(false));
    let issues: Vec<String> = result
        .get("issues")
        .and_then(|v| v.as_array())
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    assert!(issues.contains(&"too sparse".to_string()), "{issues:?}");
}

#[test]
fn unrecoverable_text_reports_malformed_payload() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let error = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "timetable.importRaw",
        json!({ "raw": "I'm sorry, I can't produce a schedule right now." }),
    );
    assert_eq!(error_code(&error), "malformed_payload");
}

#[test]
fn object_without_schedule_days_reports_no_data_issue() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let result = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "timetable.importRaw",
        json!({ "raw": "{\"note\": \"please try again\"}" }),
    );
    let issues = result.get("issues").and_then(|v| v.as_array()).unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].as_str(), Some("no timetable data"));
}

#[test]
fn degenerate_full_grid_is_enhanced_in_place() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    // Every weekday cell gets the same class; the variety pass rewrites it.
    let mut days = serde_json::Map::new();
    for day in ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"] {
        let mut cells = serde_json::Map::new();
        for slot in [
            "9:30 am-10:20 am",
            "10:20 am-11:10 am",
            "11:10 am-12:00 pm",
            "12:00 pm-12:50 pm",
            "12:50 pm-1:40 pm",
            "1:40 pm-2:30 pm",
        ] {
            cells.insert(
                slot.to_string(),
                json!({ "course": "CSE-301", "teacher": "ARM", "room": "301" }),
            );
        }
        days.insert(day.to_string(), serde_json::Value::Object(cells));
    }
    let raw = serde_json::Value::Object(days).to_string();

    let result = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "timetable.importRaw",
        json!({ "raw": raw }),
    );
    assert_eq!(result.get("enhanced").and_then(|v| v.as_bool()), Some(true));
    assert_eq!(
        result.get("issues").and_then(|v| v.as_array()).unwrap().len(),
        0
    );

    // Third-year codes were inferred from the input.
    let first = result
        .get("timetable")
        .and_then(|t| t.pointer("/MONDAY/9:30 am-10:20 am"))
        .expect("first cell");
    let code = first.get("courseCode").and_then(|v| v.as_str()).unwrap();
    assert!(code.starts_with("CSE-3") || code.starts_with("MAT-3"), "{code}");
}
