//! The dashboard session: one user editing one table against one server.
//!
//! [`Session`] holds the last rows fetched from the server (the snapshot)
//! and the rows the user edits (the working copy). Triggers are handled one
//! at a time to completion; [`event_loop`] feeds them in from a queue.

use std::time::Duration;

use crate::client::PersonApi;
use crate::domain::person::{Person, PersonField};
use crate::reconcile::{self, SaveOutcome, SavePhase};

pub mod event_loop;
pub mod input;
pub mod view;

pub const MSG_FETCHING: &str = "fetching data from server...";
pub const MSG_LOADED: &str = "data loaded";
pub const MSG_UNSAVED: &str = "unsaved changes";
pub const MSG_MATCHES: &str = "copy matches server";
pub const MSG_NOTHING_TO_SAVE: &str = "nothing to save";
pub const MSG_SAVED: &str = "changes saved";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Fetching,
    Editing { dirty: bool },
    Saving,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    Tick,
    AddRow,
    /// `row` is a zero-based index into the working copy.
    EditCell {
        row: usize,
        field: PersonField,
        value: String,
    },
    RemoveRow {
        row: usize,
    },
    TableChanged,
    Save,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Session<A> {
    api: A,
    server_rows: Vec<Person>,
    working: Vec<Person>,
    loaded: bool,
    phase: Phase,
    message: String,
    retry_after: Duration,
}

impl<A: PersonApi> Session<A> {
    pub fn new(api: A, retry_after: Duration) -> Self {
        Self {
            api,
            server_rows: Vec::new(),
            working: Vec::new(),
            loaded: false,
            phase: Phase::Idle,
            message: MSG_FETCHING.to_string(),
            retry_after,
        }
    }

    pub fn handle(&mut self, trigger: Trigger) -> Flow {
        tracing::debug!(?trigger, phase = ?self.phase, "handling trigger");
        match trigger {
            Trigger::Tick => self.tick(),
            Trigger::AddRow => {
                self.working.push(Person::blank());
                self.table_changed();
            }
            Trigger::EditCell { row, field, value } => self.edit_cell(row, field, &value),
            Trigger::RemoveRow { row } => self.remove_row(row),
            Trigger::TableChanged => self.table_changed(),
            Trigger::Save => self.save(),
            Trigger::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    /// True until the first successful fetch, and again after a save whose
    /// reload failed.
    pub fn polling(&self) -> bool {
        !self.loaded
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn server_rows(&self) -> &[Person] {
        &self.server_rows
    }

    pub fn working(&self) -> &[Person] {
        &self.working
    }

    #[cfg(test)]
    pub fn api(&self) -> &A {
        &self.api
    }

    fn tick(&mut self) {
        if self.loaded {
            return;
        }
        self.phase = Phase::Fetching;
        match self.api.list() {
            Ok(rows) => {
                self.server_rows = rows.clone();
                self.working = rows;
                self.loaded = true;
                self.phase = Phase::Editing { dirty: false };
                self.message = MSG_LOADED.to_string();
                tracing::info!(rows = self.server_rows.len(), "loaded persons");
            }
            Err(err) => {
                tracing::warn!("fetch failed: {err}");
                let message = format!(
                    "could not fetch data ({err}); retrying in {} seconds",
                    self.retry_after.as_secs_f64()
                );
                self.phase = Phase::Error(message.clone());
                self.message = message;
            }
        }
    }

    fn edit_cell(&mut self, row: usize, field: PersonField, value: &str) {
        let Some(person) = self.working.get_mut(row) else {
            self.reject(format!("row {} does not exist", row + 1));
            return;
        };
        if let Err(err) = person.set_field(field, value) {
            self.reject(err.to_string());
            return;
        }
        self.table_changed();
    }

    fn remove_row(&mut self, row: usize) {
        if row >= self.working.len() {
            self.reject(format!("row {} does not exist", row + 1));
            return;
        }
        self.working.remove(row);
        self.table_changed();
    }

    fn reject(&mut self, message: String) {
        tracing::debug!("edit rejected: {message}");
        self.message = message;
    }

    fn table_changed(&mut self) {
        let dirty = self.working != self.server_rows;
        self.phase = Phase::Editing { dirty };
        self.message = if dirty { MSG_UNSAVED } else { MSG_MATCHES }.to_string();
    }

    fn save(&mut self) {
        if self.working == self.server_rows {
            self.message = MSG_NOTHING_TO_SAVE.to_string();
            return;
        }
        self.phase = Phase::Saving;
        match reconcile::save(&self.api, &self.server_rows, &self.working) {
            Ok(SaveOutcome::Saved(rows)) => {
                self.server_rows = rows.clone();
                self.working = rows;
                self.phase = Phase::Editing { dirty: false };
                self.message = MSG_SAVED.to_string();
            }
            Ok(SaveOutcome::NothingToSave) => {
                self.phase = Phase::Editing { dirty: false };
                self.message = MSG_NOTHING_TO_SAVE.to_string();
            }
            Err(err) => {
                if err.phase == SavePhase::Refresh {
                    self.loaded = false;
                }
                let message = err.to_string();
                self.phase = Phase::Error(message.clone());
                self.message = message;
            }
        }
    }
}
