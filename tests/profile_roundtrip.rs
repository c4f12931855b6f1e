
use serde_json::json;
use test_support::{request_ok, spawn_sidecar, temp_dir};

#[test]
fn preferences_save_and_reload_per_user() {
    let workspace = temp_dir("timetabled-profile");
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

    // Unknown user: empty profile, not an error.
    let empty = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "profile.get",
        json!({ "orgId": org_id, "userKey": "admin@example.edu" }),
    );
    assert!(empty.get("preferences").unwrap().is_null());

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "profile.save",
        json!({
            "orgId": org_id,
            "userKey": "admin@example.edu",
            "preferences": "prefer morning labs, keep Friday afternoons free"
        }),
    );
    let loaded = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "profile.get",
        json!({ "orgId": org_id, "userKey": "admin@example.edu" }),
    );
    assert_eq!(
        loaded.get("preferences").and_then(|v| v.as_str()),
        Some("prefer morning labs, keep Friday afternoons free")
    );
    assert!(loaded.get("updatedAt").and_then(|v| v.as_str()).is_some());

    // Saving again overwrites in place.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "profile.save",
        json!({
            "orgId": org_id,
            "userKey": "admin@example.edu",
            "preferences": "no classes after 3 pm"
        }),
    );
    let reloaded = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "profile.get",
        json!({ "orgId": org_id, "userKey": "admin@example.edu" }),
    );
    assert_eq!(
        reloaded.get("preferences").and_then(|v| v.as_str()),
        Some("no classes after 3 pm")
    );

    // Profiles are keyed per user.
    let other = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "profile.get",
        json!({ "orgId": org_id, "userKey": "viewer@example.edu" }),
    );
    assert!(other.get("preferences").unwrap().is_null());
}
