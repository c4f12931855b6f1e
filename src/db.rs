use rusqlite::Connection;
use std::path::Path;

pub const DB_FILE: &str = "timetabled.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS organizations(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            token TEXT NOT NULL UNIQUE,
            created_at TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS departments(
            id TEXT PRIMARY KEY,
            org_id TEXT NOT NULL,
            name TEXT NOT NULL,
            FOREIGN KEY(org_id) REFERENCES organizations(id),
            UNIQUE(org_id, name)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_departments_org ON departments(org_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS faculty(
            id TEXT PRIMARY KEY,
            org_id TEXT NOT NULL,
            name TEXT NOT NULL,
            initials TEXT NOT NULL,
            department_id TEXT,
            FOREIGN KEY(org_id) REFERENCES organizations(id),
            FOREIGN KEY(department_id) REFERENCES departments(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_faculty_org ON faculty(org_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS rooms(
            id TEXT PRIMARY KEY,
            org_id TEXT NOT NULL,
            name TEXT NOT NULL,
            capacity INTEGER,
            FOREIGN KEY(org_id) REFERENCES organizations(id)
        )",
        [],
    )?;
    conn.execute("CREATE INDEX IF NOT EXISTS idx_rooms_org ON rooms(org_id)", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS subjects(
            id TEXT PRIMARY KEY,
            org_id TEXT NOT NULL,
            code TEXT NOT NULL,
            title TEXT NOT NULL,
            department_id TEXT,
            FOREIGN KEY(org_id) REFERENCES organizations(id),
            FOREIGN KEY(department_id) REFERENCES departments(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_subjects_org ON subjects(org_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS profiles(
            id TEXT PRIMARY KEY,
            org_id TEXT NOT NULL,
            user_key TEXT NOT NULL,
            preferences TEXT NOT NULL,
            updated_at TEXT,
            FOREIGN KEY(org_id) REFERENCES organizations(id),
            UNIQUE(org_id, user_key)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_profiles_org ON profiles(org_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS timetables(
            org_id TEXT PRIMARY KEY,
            data TEXT NOT NULL,
            published INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT,
            FOREIGN KEY(org_id) REFERENCES organizations(id)
        )",
        [],
    )?;

    // Early workspaces stored timetables without a draft/published split.
    ensure_timetables_published(&conn)?;

    Ok(conn)
}

fn ensure_timetables_published(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "timetables", "published")? {
        return Ok(());
    }
    // Pre-split rows were always visible to viewers; keep them that way.
    conn.execute(
        "ALTER TABLE timetables ADD COLUMN published INTEGER NOT NULL DEFAULT 1",
        [],
    )?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}
