use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{now_rfc3339, require_db, require_str};
use crate::ipc::types::{AppState, Request};
use rusqlite::OptionalExtension;
use serde_json::json;
use uuid::Uuid;

fn handle_orgs_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return ok(&req.id, json!({ "organizations": [] }));
    };

    // Counts let the admin dashboard render without extra round trips.
    let mut stmt = match conn.prepare(
        "SELECT
           o.id,
           o.name,
           o.token,
           (SELECT COUNT(*) FROM departments d WHERE d.org_id = o.id) AS department_count,
           (SELECT COUNT(*) FROM subjects s WHERE s.org_id = o.id) AS subject_count,
           (SELECT COUNT(*) FROM faculty f WHERE f.org_id = o.id) AS faculty_count,
           (SELECT COUNT(*) FROM rooms r WHERE r.org_id = o.id) AS room_count,
           COALESCE((SELECT t.published FROM timetables t WHERE t.org_id = o.id), 0)
         FROM organizations o
         ORDER BY o.name",
    ) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let rows = stmt
        .query_map([], |row| {
            let id: String = row.get(0)?;
            let name: String = row.get(1)?;
            let token: String = row.get(2)?;
            let department_count: i64 = row.get(3)?;
            let subject_count: i64 = row.get(4)?;
            let faculty_count: i64 = row.get(5)?;
            let room_count: i64 = row.get(6)?;
            let published: i64 = row.get(7)?;
            Ok(json!({
                "id": id,
                "name": name,
                "token": token,
                "departmentCount": department_count,
                "subjectCount": subject_count,
                "facultyCount": faculty_count,
                "roomCount": room_count,
                "timetablePublished": published != 0
            }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>());

    match rows {
        Ok(organizations) => ok(&req.id, json!({ "organizations": organizations })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_orgs_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let name = match require_str(req, "name") {
        Ok(v) => v.to_string(),
        Err(e) => return e,
    };

    let org_id = Uuid::new_v4().to_string();
    // The token is what viewers type to join; it never changes.
    let token = Uuid::new_v4().to_string();
    if let Err(e) = conn.execute(
        "INSERT INTO organizations(id, name, token, created_at) VALUES(?, ?, ?, ?)",
        (&org_id, &name, &token, now_rfc3339()),
    ) {
        return err(
            &req.id,
            "db_insert_failed",
            e.to_string(),
            Some(json!({ "table": "organizations" })),
        );
    }

    ok(&req.id, json!({ "orgId": org_id, "name": name, "token": token }))
}

fn handle_orgs_resolve_token(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let token = match require_str(req, "token") {
        Ok(v) => v,
        Err(e) => return e,
    };

    let row: Option<(String, String)> = match conn
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

    match row {
        Some((id, name)) => ok(&req.id, json!({ "orgId": id, "name": name })),
        None => err(&req.id, "not_found", "unknown organization token", None),
    }
}

fn handle_orgs_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let org_id = match require_str(req, "orgId") {
        Ok(v) => v.to_string(),
        Err(e) => return e,
    };

    let exists: Option<i64> = match conn
        .query_row(
            "SELECT 1 FROM organizations WHERE id = ?",
            [&org_id],
            |r| r.get(0),
        )
        .optional()
    {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    if exists.is_none() {
        return err(&req.id, "not_found", "organization not found", None);
    }

    let tx = match conn.unchecked_transaction() {
        Ok(t) => t,
        Err(e) => return err(&req.id, "db_tx_failed", e.to_string(), None),
    };

    // Explicit dependency order; no ON DELETE CASCADE in the schema.
    for (table, sql) in [
        ("timetables", "DELETE FROM timetables WHERE org_id = ?"),
        ("profiles", "DELETE FROM profiles WHERE org_id = ?"),
        ("subjects", "DELETE FROM subjects WHERE org_id = ?"),
        ("faculty", "DELETE FROM faculty WHERE org_id = ?"),
        ("rooms", "DELETE FROM rooms WHERE org_id = ?"),
        ("departments", "DELETE FROM departments WHERE org_id = ?"),
        ("organizations", "DELETE FROM organizations WHERE id = ?"),
    ] {
        if let Err(e) = tx.execute(sql, [&org_id]) {
            let _ = tx.rollback();
            return err(
                &req.id,
                "db_delete_failed",
                e.to_string(),
                Some(json!({ "table": table })),
            );
        }
    }

    if let Err(e) = tx.commit() {
        return err(&req.id, "db_commit_failed", e.to_string(), None);
    }

    ok(&req.id, json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "orgs.list" => Some(handle_orgs_list(state, req)),
        "orgs.create" => Some(handle_orgs_create(state, req)),
        "orgs.resolveToken" => Some(handle_orgs_resolve_token(state, req)),
        "orgs.delete" => Some(handle_orgs_delete(state, req)),
        _ => None,
    }
}
