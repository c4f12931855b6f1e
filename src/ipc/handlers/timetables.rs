use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{now_rfc3339, opt_bool, require_db, require_org, require_str};
use crate::ipc::types::{AppState, Request};
use crate::pipeline;
use crate::schedule::normalize_payload;
use rusqlite::OptionalExtension;
use serde_json::json;

/// Viewer read path, keyed by the join token rather than the org id.
fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let token = match require_str(req, "orgToken") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let include_draft = opt_bool(req, "includeDraft").unwrap_or(false);

    let org: Option<(String, String)> = match conn
        .query_row(
            "SELECT id, name FROM organizations WHERE token = ?",
            [token],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()
    {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let Some((org_id, org_name)) = org else {
        return err(&req.id, "not_found", "unknown organization token", None);
    };

    let row: Option<(String, i64, Option<String>)> = match conn
        .query_row(
            "SELECT data, published, updated_at FROM timetables WHERE org_id = ?",
            [&org_id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .optional()
    {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let Some((data, published, updated_at)) = row else {
        return err(&req.id, "not_found", "no timetable for this organization", None);
    };
    if published == 0 && !include_draft {
        return err(&req.id, "not_found", "no published timetable yet", None);
    }

    let timetable: serde_json::Value = match serde_json::from_str(&data) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "corrupt_timetable", e.to_string(), None),
    };

    ok(
        &req.id,
        json!({
            "orgId": org_id,
            "orgName": org_name,
            "timetable": timetable,
            "published": published != 0,
            "updatedAt": updated_at
        }),
    )
}

fn handle_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let org_id = match require_str(req, "orgId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    if let Err(e) = require_org(conn, req, org_id) {
        return e;
    }
    let Some(raw_timetable) = req.params.get("timetable") else {
        return err(&req.id, "bad_params", "missing params.timetable", None);
    };
    let publish = opt_bool(req, "publish").unwrap_or(false);

    // Cheap idempotent pass: whatever the caller hands us lands in storage
    // as a canonical grid with every day key present.
    let timetable = normalize_payload(raw_timetable);
    let data = match serde_json::to_string(&timetable) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };

    let updated_at = now_rfc3339();
    let result = conn.execute(
        "INSERT INTO timetables(org_id, data, published, updated_at)
         VALUES(?, ?, ?, ?)
         ON CONFLICT(org_id)
         DO UPDATE SET data = excluded.data,
                       published = excluded.published,
                       updated_at = excluded.updated_at",
        (org_id, &data, publish as i64, &updated_at),
    );

    match result {
        Ok(_) => ok(
            &req.id,
            json!({
                "published": publish,
                "updatedAt": updated_at,
                "filledCells": timetable.filled_count()
            }),
        ),
        Err(e) => err(
            &req.id,
            "db_insert_failed",
            e.to_string(),
            Some(json!({ "table": "timetables" })),
        ),
    }
}

fn handle_publish(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let org_id = match require_str(req, "orgId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(publish) = opt_bool(req, "publish") else {
        return err(&req.id, "bad_params", "missing params.publish", None);
    };

    let updated_at = now_rfc3339();
    match conn.execute(
        "UPDATE timetables SET published = ?, updated_at = ? WHERE org_id = ?",
        (publish as i64, &updated_at, org_id),
    ) {
        Ok(0) => err(&req.id, "not_found", "no timetable to publish", None),
        Ok(_) => ok(&req.id, json!({ "published": publish, "updatedAt": updated_at })),
        Err(e) => err(&req.id, "db_update_failed", e.to_string(), None),
    }
}

/// Run the normalization pipeline on pasted model output, no generation
/// call involved. Saving the result is a separate decision.
fn handle_import_raw(state: &mut AppState, req: &Request) -> serde_json::Value {
    let raw = match require_str(req, "raw") {
        Ok(v) => v,
        Err(e) => return e,
    };

    match pipeline::run(raw, &state.config.variety) {
        Ok(outcome) => ok(
            &req.id,
            json!({
                "timetable": outcome.timetable,
                "issues": outcome.issues,
                "enhanced": outcome.enhanced
            }),
        ),
        Err(failure) => {
            log::warn!("importRaw: {}", failure);
            err(
                &req.id,
                "malformed_payload",
                "could not read a timetable out of that text; please try again with a different response",
                None,
            )
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "timetable.get" => Some(handle_get(state, req)),
        "timetable.save" => Some(handle_save(state, req)),
        "timetable.publish" => Some(handle_publish(state, req)),
        "timetable.importRaw" => Some(handle_import_raw(state, req)),
        _ => None,
    }
}
