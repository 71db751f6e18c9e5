use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::db;
use crate::domain::person::{NewPerson, Person, PersonUpdate};

/// The durable home of every `Person` row.
///
/// `Store` itself holds no connection. Each caller opens a [`StoreSession`],
/// which owns one SQLite connection for its lifetime and closes it on drop,
/// so every API request gets its own handle regardless of how it exits.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

pub struct StoreSession {
    conn: Connection,
}

/// Result of a write that targets a single row by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Applied,
    NotFound,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the database directory and schema, then seeds the demo rows
    /// when the table is empty. Returns the number of rows seeded.
    pub fn bootstrap(&self) -> Result<usize, StoreError> {
        ensure_parent_dir(&self.path)?;
        let mut conn = db::open_connection(&self.path)?;
        let seeded = db::seed_if_empty(&mut conn)?;
        if seeded > 0 {
            tracing::info!(path = %self.path.display(), seeded, "seeded empty persons table");
        }
        Ok(seeded)
    }

    /// Opens a request-scoped connection. The schema must already exist; see
    /// [`Store::bootstrap`].
    pub fn session(&self) -> Result<StoreSession, StoreError> {
        let conn = db::connect(&self.path)?;
        Ok(StoreSession { conn })
    }
}

impl StoreSession {
    pub fn list(&self) -> Result<Vec<Person>, StoreError> {
        Ok(db::list_persons(&self.conn)?)
    }

    pub fn insert(&self, person: &NewPerson) -> Result<i64, StoreError> {
        Ok(db::insert_person(&self.conn, person)?)
    }

    pub fn update(&self, update: &PersonUpdate) -> Result<RowOutcome, StoreError> {
        Ok(row_outcome(db::update_person(&self.conn, update)?))
    }

    pub fn delete(&self, id: i64) -> Result<RowOutcome, StoreError> {
        Ok(row_outcome(db::delete_person(&self.conn, id)?))
    }
}

fn row_outcome(changed: usize) -> RowOutcome {
    if changed == 0 {
        RowOutcome::NotFound
    } else {
        RowOutcome::Applied
    }
}

fn ensure_parent_dir(path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Db(rusqlite::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(err) => write!(f, "I/O error: {}", err),
            StoreError::Db(err) => write!(f, "database error: {}", err),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StoreError::Io(err) => Some(err),
            StoreError::Db(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        StoreError::Io(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        StoreError::Db(value)
    }
}
