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
        "SELECT id, name FROM departments WHERE org_id = ? ORDER BY name",
    ) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let rows = stmt
        .query_map([org_id], |row| {
            let id: String = row.get(0)?;
            let name: String = row.get(1)?;
            Ok(json!({ "id": id, "name": name }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>());

    match rows {
        Ok(departments) => ok(&req.id, json!({ "departments": departments })),
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

    match opt_str(req, "id") {
        Some(id) => {
            let updated = conn.execute(
                "UPDATE departments SET name = ? WHERE id = ? AND org_id = ?",
                (name, id, org_id),
            );
            match updated {
                Ok(0) => err(&req.id, "not_found", "department not found", None),
                Ok(_) => ok(&req.id, json!({ "id": id, "name": name })),
                Err(e) => err(&req.id, "db_update_failed", e.to_string(), None),
            }
        }
        None => {
            let id = Uuid::new_v4().to_string();
            match conn.execute(
                "INSERT INTO departments(id, org_id, name) VALUES(?, ?, ?)",
                (&id, org_id, name),
            ) {
                Ok(_) => ok(&req.id, json!({ "id": id, "name": name })),
                Err(e) => err(
                    &req.id,
                    "db_insert_failed",
                    e.to_string(),
                    Some(json!({ "table": "departments" })),
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

    let tx = match conn.unchecked_transaction() {
        Ok(t) => t,
        Err(e) => return err(&req.id, "db_tx_failed", e.to_string(), None),
    };

    // Faculty and subjects keep their rows, just lose the link.
    for sql in [
        "UPDATE faculty SET department_id = NULL WHERE department_id = ? AND org_id = ?",
        "UPDATE subjects SET department_id = NULL WHERE department_id = ? AND org_id = ?",
    ] {
        if let Err(e) = tx.execute(sql, (id, org_id)) {
            let _ = tx.rollback();
            return err(&req.id, "db_update_failed", e.to_string(), None);
        }
    }

    let deleted = match tx.execute(
        "DELETE FROM departments WHERE id = ? AND org_id = ?",
        (id, org_id),
    ) {
        Ok(n) => n,
        Err(e) => {
            let _ = tx.rollback();
            return err(&req.id, "db_delete_failed", e.to_string(), None);
        }
    };
    if deleted == 0 {
        let _ = tx.rollback();
        return err(&req.id, "not_found", "department not found", None);
    }

    if let Err(e) = tx.commit() {
        return err(&req.id, "db_commit_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "departments.list" => Some(handle_list(state, req)),
        "departments.upsert" => Some(handle_upsert(state, req)),
        "departments.delete" => Some(handle_delete(state, req)),
        _ => None,
    }
}
