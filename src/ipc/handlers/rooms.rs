use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{opt_i64, opt_str, require_db, require_org, require_str};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use uuid::Uuid;

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let org_id = match require_str(req, "orgId") {
        Ok(v) => v,
        Err(e) => return e,
    };

    let mut stmt = match conn.prepare(
        "SELECT id, name, capacity FROM rooms WHERE org_id = ? ORDER BY name",
    ) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let rows = stmt
        .query_map([org_id], |row| {
            let id: String = row.get(0)?;
            let name: String = row.get(1)?;
            let capacity: Option<i64> = row.get(2)?;
            Ok(json!({ "id": id, "name": name, "capacity": capacity }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>());

    match rows {
        Ok(rooms) => ok(&req.id, json!({ "rooms": rooms })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_upsert(state: &mut AppState, req: &Request) -> serde_json::Value {
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
    let name = match require_str(req, "name") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let capacity = opt_i64(req, "capacity");

    match opt_str(req, "id") {
        Some(id) => {
            let updated = conn.execute(
                "UPDATE rooms SET name = ?, capacity = ? WHERE id = ? AND org_id = ?",
                (name, capacity, id, org_id),
            );
            match updated {
                Ok(0) => err(&req.id, "not_found", "room not found", None),
                Ok(_) => ok(&req.id, json!({ "id": id, "name": name, "capacity": capacity })),
                Err(e) => err(&req.id, "db_update_failed", e.to_string(), None),
            }
        }
        None => {
            let id = Uuid::new_v4().to_string();
            match conn.execute(
                "INSERT INTO rooms(id, org_id, name, capacity) VALUES(?, ?, ?, ?)",
                (&id, org_id, name, capacity),
            ) {
                Ok(_) => ok(&req.id, json!({ "id": id, "name": name, "capacity": capacity })),
                Err(e) => err(
                    &req.id,
                    "db_insert_failed",
                    e.to_string(),
                    Some(json!({ "table": "rooms" })),
                ),
            }
        }
    }
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let org_id = match require_str(req, "orgId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let id = match require_str(req, "id") {
        Ok(v) => v,
        Err(e) => return e,
    };

    match conn.execute("DELETE FROM rooms WHERE id = ? AND org_id = ?", (id, org_id)) {
        Ok(0) => err(&req.id, "not_found", "room not found", None),
        Ok(_) => ok(&req.id, json!({ "ok": true })),
        Err(e) => err(&req.id, "db_delete_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "rooms.list" => Some(handle_list(state, req)),
        "rooms.upsert" => Some(handle_upsert(state, req)),
        "rooms.delete" => Some(handle_delete(state, req)),
        _ => None,
    }
}
