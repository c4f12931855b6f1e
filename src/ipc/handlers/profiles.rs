use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{now_rfc3339, require_db, require_org, require_str};
use crate::ipc::types::{AppState, Request};
use rusqlite::OptionalExtension;
use serde_json::json;
use uuid::Uuid;

fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let org_id = match require_str(req, "orgId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let user_key = match require_str(req, "userKey") {
        Ok(v) => v,
        Err(e) => return e,
    };

    let row: Option<(String, Option<String>)> = match conn
        .query_row(
            "SELECT preferences, updated_at FROM profiles
             WHERE org_id = ? AND user_key = ?",
            (org_id, user_key),
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()
    {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    // A user with no saved profile is a normal state, not an error.
    match row {
        Some((preferences, updated_at)) => ok(
            &req.id,
            json!({ "preferences": preferences, "updatedAt": updated_at }),
        ),
        None => ok(&req.id, json!({ "preferences": null, "updatedAt": null })),
    }
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
    let user_key = match require_str(req, "userKey") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let preferences = req
        .params
        .get("preferences")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .trim()
        .to_string();

    let updated_at = now_rfc3339();
    let id = Uuid::new_v4().to_string();
    let result = conn.execute(
        "INSERT INTO profiles(id, org_id, user_key, preferences, updated_at)
         VALUES(?, ?, ?, ?, ?)
         ON CONFLICT(org_id, user_key)
         DO UPDATE SET preferences = excluded.preferences,
                       updated_at = excluded.updated_at",
        (&id, org_id, user_key, &preferences, &updated_at),
    );

    match result {
        Ok(_) => ok(&req.id, json!({ "updatedAt": updated_at })),
        Err(e) => err(
            &req.id,
            "db_insert_failed",
            e.to_string(),
            Some(json!({ "table": "profiles" })),
        ),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "profile.get" => Some(handle_get(state, req)),
        "profile.save" => Some(handle_save(state, req)),
        _ => None,
    }
}
