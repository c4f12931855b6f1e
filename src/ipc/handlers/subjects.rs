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
        "SELECT s.id, s.code, s.title, s.department_id, d.name
         FROM subjects s
         LEFT JOIN departments d ON d.id = s.department_id
         WHERE s.org_id = ?
         ORDER BY s.code",
    ) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let rows = stmt
        .query_map([org_id], |row| {
            let id: String = row.get(0)?;
            let code: String = row.get(1)?;
            let title: String = row.get(2)?;
            let department_id: Option<String> = row.get(3)?;
            let department_name: Option<String> = row.get(4)?;
            Ok(json!({
                "id": id,
                "code": code,
                "title": title,
                "departmentId": department_id,
                "departmentName": department_name
            }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>());

    match rows {
        Ok(subjects) => ok(&req.id, json!({ "subjects": subjects })),
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
    // Course codes are stored the way the normalizer emits them so prompts
    // and normalized grids agree.
    let code = match require_str(req, "code") {
        Ok(v) => v.split_whitespace().collect::<String>().to_uppercase(),
        Err(e) => return e,
    };
    let title = match require_str(req, "title") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let department_id = opt_str(req, "departmentId");

    match opt_str(req, "id") {
        Some(id) => {
            let updated = conn.execute(
                "UPDATE subjects SET code = ?, title = ?, department_id = ?
                 WHERE id = ? AND org_id = ?",
                (&code, title, department_id, id, org_id),
            );
            match updated {
                Ok(0) => err(&req.id, "not_found", "subject not found", None),
                Ok(_) => ok(&req.id, json!({ "id": id, "code": code, "title": title })),
                Err(e) => err(&req.id, "db_update_failed", e.to_string(), None),
            }
        }
        None => {
            let id = Uuid::new_v4().to_string();
            match conn.execute(
                "INSERT INTO subjects(id, org_id, code, title, department_id)
                 VALUES(?, ?, ?, ?, ?)",
                (&id, org_id, &code, title, department_id),
            ) {
                Ok(_) => ok(&req.id, json!({ "id": id, "code": code, "title": title })),
                Err(e) => err(
                    &req.id,
                    "db_insert_failed",
                    e.to_string(),
                    Some(json!({ "table": "subjects" })),
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
        "DELETE FROM subjects WHERE id = ? AND org_id = ?",
        (id, org_id),
    ) {
        Ok(0) => err(&req.id, "not_found", "subject not found", None),
        Ok(_) => ok(&req.id, json!({ "ok": true })),
        Err(e) => err(&req.id, "db_delete_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "subjects.list" => Some(handle_list(state, req)),
        "subjects.upsert" => Some(handle_upsert(state, req)),
        "subjects.delete" => Some(handle_delete(state, req)),
        _ => None,
    }
}
