
use serde_json::json;
use test_support::{error_code, request_err, request_ok, spawn_sidecar, temp_dir};

fn three_room_payload() -> String {
    let rooms = ["101", "201", "301"];
    let mut days = serde_json::Map::new();
    let mut i = 0usize;
    for day in ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"] {
        let mut cells = serde_json::Map::new();
        for slot in [
            "9:30 am-10:20 am",
            "10:20 am-11:10 am",
            "11:10 am-12:00 pm",
            "12:00 pm-12:50 pm",
        ] {
            cells.insert(
                slot.to_string(),
                json!({
                    "course": if i % 2 == 0 { "CSE-201" } else { "MAT-205" },
                    "teacher": if i % 2 == 0 { "ARM" } else { "SKD" },
                    "room": rooms[i % 3]
                }),
            );
            i += 1;
        }
        days.insert(day.to_string(), serde_json::Value::Object(cells));
    }
    serde_json::Value::Object(days).to_string()
}

#[test]
fn workspace_toml_overrides_variety_thresholds() {
    let workspace = temp_dir("timetabled-config-variety");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    // Default room cap is 2: a 3-room grid is degenerate, and the enhancer
    // kicks in (successfully, since the grid is otherwise healthy).
    let before = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "timetable.importRaw",
        json!({ "raw": three_room_payload() }),
    );
    assert_eq!(before.get("enhanced").and_then(|v| v.as_bool()), Some(true));

    std::fs::write(
        workspace.join("timetabled.toml"),
        r#"
[generation]
api_key_env = "TIMETABLED_TEST_KEY_THAT_IS_NOT_SET"

[variety]
max_rooms = 3
"#,
    )
    .expect("write workspace config");

    let selected = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(
        selected.get("generationConfigured").and_then(|v| v.as_bool()),
        Some(false)
    );

    // With the cap raised to 3 the same payload passes untouched.
    let after = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "timetable.importRaw",
        json!({ "raw": three_room_payload() }),
    );
    assert_eq!(after.get("enhanced").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(
        after.get("issues").and_then(|v| v.as_array()).unwrap().len(),
        0
    );
}

#[test]
fn generation_without_an_api_key_is_not_configured() {
    let workspace = temp_dir("timetabled-generation-unconfigured");
    std::fs::write(
        workspace.join("timetabled.toml"),
        "[generation]\napi_key_env = \"TIMETABLED_TEST_KEY_THAT_IS_NOT_SET\"\n",
    )
    .expect("write workspace config");

    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let org = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "orgs.create",
        json!({ "name": "North Campus" }),
    );
    let org_id = org.get("orgId").and_then(|v| v.as_str()).unwrap().to_string();

    let error = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "timetable.generate",
        json!({ "orgId": org_id }),
    );
    assert_eq!(error_code(&error), "not_configured");
}

#[test]
fn invalid_workspace_config_refuses_the_workspace() {
    let workspace = temp_dir("timetabled-config-invalid");
    std::fs::write(workspace.join("timetabled.toml"), "[variety]\nmax_rooms = \"two\"\n")
        .expect("write workspace config");

    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let error = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(error_code(&error), "bad_config");
}
