use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{opt_str, require_db, require_org, require_str};
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
        "SELECT f.id, f.name, f.initials, f.department_id, d.name
         FROM faculty f
         LEFT JOIN departments d ON d.id = f.department_id
         WHERE f.org_id = ?
         ORDER BY f.name",
    ) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let rows = stmt
        .query_map([org_id], |row| {
            let id: String = row.get(0)?;
            let name: String = row.get(1)?;
            let initials: String = row.get(2)?;
            let department_id: Option<String> = row.get(3)?;
            let department_name: Option<String> = row.get(4)?;
            Ok(json!({
                "id": id,
                "name": name,
                "initials": initials,
                "departmentId": department_id,
                "departmentName": department_name
            }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>());

    match rows {
        Ok(faculty) => ok(&req.id, json!({ "faculty": faculty })),
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
    let initials = match require_str(req, "initials") {
        Ok(v) => v.to_uppercase(),
        Err(e) => return e,
    };
    let department_id = opt_str(req, "departmentId");

    match opt_str(req, "id") {
        Some(id) => {
            let updated = conn.execute(
                "UPDATE faculty SET name = ?, initials = ?, department_id = ?
                 WHERE id = ? AND org_id = ?",
                (name, &initials, department_id, id, org_id),
            );
            match updated {
                Ok(0) => err(&req.id, "not_found", "faculty member not found", None),
                Ok(_) => ok(&req.id, json!({ "id": id, "name": name, "initials": initials })),
                Err(e) => err(&req.id, "db_update_failed", e.to_string(), None),
            }
        }
        None => {
            let id = Uuid::new_v4().to_string();
            match conn.execute(
                "INSERT INTO faculty(id, org_id, name, initials, department_id)
                 VALUES(?, ?, ?, ?, ?)",
                (&id, org_id, name, &initials, department_id),
            ) {
                Ok(_) => ok(&req.id, json!({ "id": id, "name": name, "initials": initials })),
                Err(e) => err(
                    &req.id,
                    "db_insert_failed",
                    e.to_string(),
                    Some(json!({ "table": "faculty" })),
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

    match conn.execute(
        "DELETE FROM faculty WHERE id = ? AND org_id = ?",
        (id, org_id),
    ) {
        Ok(0) => err(&req.id, "not_found", "faculty member not found", None),
        Ok(_) => ok(&req.id, json!({ "ok": true })),
        Err(e) => err(&req.id, "db_delete_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "faculty.list" => Some(handle_list(state, req)),
        "faculty.upsert" => Some(handle_upsert(state, req)),
        "faculty.delete" => Some(handle_delete(state, req)),
        _ => None,
    }
}
