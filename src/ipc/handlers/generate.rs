use crate::genai::{build_prompt, PromptContext};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{opt_str, require_db, require_org, require_str};
use crate::ipc::types::{AppState, Request};
use crate::pipeline;
use rusqlite::{Connection, OptionalExtension};
use serde_json::json;

fn roster(conn: &Connection, sql: &str, org_id: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([org_id], |row| row.get::<_, String>(0))?;
    rows.collect()
}

fn handle_generate(state: &mut AppState, req: &Request) -> serde_json::Value {
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
    let Some(generator) = state.generator.as_ref() else {
        return err(
            &req.id,
            "not_configured",
            "no generation service configured; set the API key and reselect the workspace",
            None,
        );
    };

    // Context for the prompt: rosters, the caller's saved preferences, and
    // whatever is currently stored for this organization.
    let subjects = roster(
        conn,
        "SELECT code || ' ' || title FROM subjects WHERE org_id = ? ORDER BY code",
        org_id,
    );
    let faculty = roster(
        conn,
        "SELECT '(' || initials || ') ' || name FROM faculty WHERE org_id = ? ORDER BY name",
        org_id,
    );
    let rooms = roster(
        conn,
        "SELECT name FROM rooms WHERE org_id = ? ORDER BY name",
        org_id,
    );
    let (subjects, faculty, rooms) = match (subjects, faculty, rooms) {
        (Ok(s), Ok(f), Ok(r)) => (s, f, r),
        (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
            return err(&req.id, "db_query_failed", e.to_string(), None)
        }
    };

    let preferences: Option<String> = match opt_str(req, "userKey") {
        Some(user_key) => match conn
            .query_row(
                "SELECT preferences FROM profiles WHERE org_id = ? AND user_key = ?",
                (org_id, user_key),
                |r| r.get(0),
            )
            .optional()
        {
            Ok(v) => v,
            Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
        },
        None => None,
    };

    let prior: Option<String> = match conn
        .query_row(
            "SELECT data FROM timetables WHERE org_id = ?",
            [org_id],
            |r| r.get(0),
        )
        .optional()
    {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let prompt = build_prompt(&PromptContext {
        preferences: preferences.as_deref(),
        instructions: opt_str(req, "instructions"),
        prior_timetable: prior.as_deref(),
        subjects: &subjects,
        faculty: &faculty,
        rooms: &rooms,
    });

    log::info!("generating timetable for org {} via {}", org_id, generator.model());
    let raw = match generator.complete(&prompt) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("generation failed: {e:?}");
            return err(&req.id, "generation_failed", format!("{e}"), None);
        }
    };

    match pipeline::run(&raw, &state.config.variety) {
        Ok(outcome) => ok(
            &req.id,
            json!({
                "timetable": outcome.timetable,
                "issues": outcome.issues,
                "enhanced": outcome.enhanced,
                "model": generator.model()
            }),
        ),
        Err(failure) => {
            log::warn!("generate: {}", failure);
            err(
                &req.id,
                "malformed_payload",
                "the model response was not usable; please rephrase and generate again",
                None,
            )
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "timetable.generate" => Some(handle_generate(state, req)),
        _ => None,
    }
}
