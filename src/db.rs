use std::path::Path;
use std::time::Duration;

use rusqlite::{
    params, Connection, DatabaseName, OptionalExtension, Result, Row, TransactionBehavior,
};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::domain::person::{NewPerson, Person, PersonUpdate};

pub const SEED_PERSONS: [(&str, i64, &str); 3] = [
    ("Bjarne Bogen", 48, "Bergen"),
    ("Ella Evensen", 20, "Elverum"),
    ("Hilde Hov", 22, "Hamar"),
];

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: [Migration; 1] = [Migration {
    version: 1,
    name: "persons_table_v1",
    sql: r#"
CREATE TABLE IF NOT EXISTS persons (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT,
    age INTEGER,
    residence TEXT
);
"#,
}];

/// Opens the database and brings its schema up to date. Run once per process,
/// before any [`connect`].
pub fn open_connection(path: &Path) -> Result<Connection> {
    let mut conn = Connection::open(path)?;
    conn.pragma_update(None::<DatabaseName>, "journal_mode", "WAL")?;
    configure_for_speed(&conn)?;
    apply_migrations(&mut conn)?;
    Ok(conn)
}

/// Opens a connection to an already migrated database. Writes nothing, so any
/// number of these can be opened concurrently.
pub fn connect(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    configure_for_speed(&conn)?;
    Ok(conn)
}

fn configure_for_speed(conn: &Connection) -> Result<()> {
    conn.pragma_update(None::<DatabaseName>, "synchronous", "NORMAL")?;
    conn.pragma_update(None::<DatabaseName>, "temp_store", "MEMORY")?;
    conn.pragma_update(None::<DatabaseName>, "busy_timeout", 5000i64)?;
    conn.busy_timeout(Duration::from_millis(5000))?;
    Ok(())
}

fn apply_migrations(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    tx.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL
);
"#,
    )?;

    for migration in MIGRATIONS {
        let already_applied: Option<i64> = tx
            .query_row(
                "SELECT version FROM schema_migrations WHERE version = ?1",
                params![migration.version],
                |row| row.get(0),
            )
            .optional()?;

        if already_applied.is_some() {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            params![migration.version, migration.name, now_utc_rfc3339()],
        )?;
    }

    tx.commit()
}

fn now_utc_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .expect("RFC3339 formatting for UTC timestamp should never fail")
}

/// Inserts the demo rows when the table is empty. Returns how many were added.
pub fn seed_if_empty(conn: &mut Connection) -> Result<usize> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let existing: i64 = tx.query_row("SELECT COUNT(*) FROM persons", [], |row| row.get(0))?;
    if existing > 0 {
        return Ok(0);
    }
    for (name, age, residence) in SEED_PERSONS {
        tx.execute(
            "INSERT INTO persons (name, age, residence) VALUES (?1, ?2, ?3)",
            params![name, age, residence],
        )?;
    }
    tx.commit()?;
    Ok(SEED_PERSONS.len())
}

fn person_from_row(row: &Row<'_>) -> Result<Person> {
    Ok(Person {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        age: row.get(2)?,
        residence: row.get(3)?,
    })
}

pub fn list_persons(conn: &Connection) -> Result<Vec<Person>> {
    let mut stmt = conn.prepare("SELECT id, name, age, residence FROM persons ORDER BY id ASC")?;
    let mut rows = stmt.query([])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(person_from_row(row)?);
    }
    Ok(result)
}

#[cfg(test)]
pub fn get_person(conn: &Connection, id: i64) -> Result<Option<Person>> {
    conn.query_row(
        "SELECT id, name, age, residence FROM persons WHERE id = ?1",
        params![id],
        person_from_row,
    )
    .optional()
}

pub fn insert_person(conn: &Connection, person: &NewPerson) -> Result<i64> {
    conn.execute(
        "INSERT INTO persons (name, age, residence) VALUES (?1, ?2, ?3)",
        params![person.name, person.age, person.residence],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Returns the number of rows replaced; zero means no row has `update.id`.
pub fn update_person(conn: &Connection, update: &PersonUpdate) -> Result<usize> {
    conn.execute(
        "UPDATE persons SET name = ?1, age = ?2, residence = ?3 WHERE id = ?4",
        params![update.name, update.age, update.residence, update.id],
    )
}

pub fn delete_person(conn: &Connection, id: i64) -> Result<usize> {
    conn.execute("DELETE FROM persons WHERE id = ?1", params![id])
}
