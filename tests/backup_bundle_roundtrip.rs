
use serde_json::json;
use test_support::{error_code, request_err, request_ok, spawn_sidecar, temp_dir};

#[test]
fn exported_bundle_restores_into_a_fresh_workspace() {
    let source = temp_dir("timetabled-bundle-src");
    let target = temp_dir("timetabled-bundle-dst");
    let bundle = source.join("export").join("campus.ttbundle");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": source.to_string_lossy() }),
    );
    let org = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "orgs.create",
        json!({ "name": "North Campus" }),
    );
    let org_id = org.get("orgId").and_then(|v| v.as_str()).unwrap().to_string();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "subjects.upsert",
        json!({ "orgId": org_id, "code": "CSE-201", "title": "Data Structures" }),
    );

    let exported = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "workspace.exportBundle",
        json!({ "outPath": bundle.to_string_lossy() }),
    );
    assert_eq!(
        exported.get("bundleFormat").and_then(|v| v.as_str()),
        Some("timetabled-workspace-v1")
    );
    assert_eq!(
        exported
            .get("dbSha256")
            .and_then(|v| v.as_str())
            .map(str::len),
        Some(64)
    );

    // Fresh workspace starts empty, then picks up the bundle's contents.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "workspace.select",
        json!({ "path": target.to_string_lossy() }),
    );
    let empty = request_ok(&mut stdin, &mut reader, "6", "orgs.list", json!({}));
    assert_eq!(
        empty
            .get("organizations")
            .and_then(|v| v.as_array())
            .unwrap()
            .len(),
        0
    );

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "workspace.importBundle",
        json!({ "inPath": bundle.to_string_lossy() }),
    );
    let restored = request_ok(&mut stdin, &mut reader, "8", "orgs.list", json!({}));
    let orgs = restored
        .get("organizations")
        .and_then(|v| v.as_array())
        .unwrap();
    assert_eq!(orgs.len(), 1);
    assert_eq!(orgs[0].get("name").and_then(|v| v.as_str()), Some("North Campus"));
    assert_eq!(orgs[0].get("subjectCount").and_then(|v| v.as_i64()), Some(1));
}

#[test]
fn importing_a_non_bundle_fails_and_keeps_the_workspace_usable() {
    let workspace = temp_dir("timetabled-bundle-bad");
    let not_a_bundle = workspace.join("garbage.zip");
    std::fs::write(&not_a_bundle, b"not a zip at all").expect("write garbage");

    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "orgs.create",
        json!({ "name": "Kept Campus" }),
    );

    let error = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "workspace.importBundle",
        json!({ "inPath": not_a_bundle.to_string_lossy() }),
    );
    assert_eq!(error_code(&error), "import_failed");

    // The original database survived the failed import.
    let listed = request_ok(&mut stdin, &mut reader, "4", "orgs.list", json!({}));
    assert_eq!(
        listed
            .get("organizations")
            .and_then(|v| v.as_array())
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn export_requires_a_workspace() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let error = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.exportBundle",
        json!({ "outPath": "/tmp/nowhere.ttbundle" }),
    );
    assert_eq!(error_code(&error), "no_workspace");
}
