use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt;

use crate::client::{ClientError, PersonApi};
use crate::domain::person::{NewPerson, Person, PersonUpdate};

/// The calls needed to make the server match a working copy, in the order
/// they are issued: creates, then updates, then deletes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavePlan {
    pub additions: Vec<NewPerson>,
    pub changes: Vec<PersonUpdate>,
    pub removals: Vec<i64>,
}

impl SavePlan {
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.changes.is_empty() && self.removals.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    NothingToSave,
    /// Every call succeeded; carries the freshly listed server rows.
    Saved(Vec<Person>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavePhase {
    Create,
    Update,
    Delete,
    Refresh,
}

/// First failed call of a save. Calls issued before it stay applied.
#[derive(Debug)]
pub struct ReconcileError {
    pub phase: SavePhase,
    pub source: ClientError,
}

impl fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.phase {
            SavePhase::Create => "failed to add persons",
            SavePhase::Update => "failed to update persons",
            SavePhase::Delete => "failed to delete persons",
            SavePhase::Refresh => "changes saved but reload failed",
        };
        write!(f, "{}: {}", prefix, self.source)
    }
}

impl Error for ReconcileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// Diffs `working` against `snapshot`.
///
/// Rows carrying an id the snapshot does not know are neither additions nor
/// changes; the refresh after a save drops them from view.
pub fn plan(snapshot: &[Person], working: &[Person]) -> SavePlan {
    let by_id: HashMap<i64, &Person> = snapshot
        .iter()
        .filter_map(|person| person.id.map(|id| (id, person)))
        .collect();

    let additions = working
        .iter()
        .filter(|person| person.id.is_none())
        .map(Person::to_new_person)
        .collect();

    let changes = working
        .iter()
        .filter(|person| {
            person
                .id
                .and_then(|id| by_id.get(&id))
                .is_some_and(|known| !known.same_fields(person))
        })
        .filter_map(Person::to_update)
        .collect();

    let kept: HashSet<i64> = working.iter().filter_map(|person| person.id).collect();
    let removals = snapshot
        .iter()
        .filter_map(|person| person.id)
        .filter(|id| !kept.contains(id))
        .collect();

    SavePlan {
        additions,
        changes,
        removals,
    }
}

/// Pushes the working copy to the server and returns the refreshed rows.
///
/// Stops at the first failed call without undoing earlier ones.
pub fn save(
    api: &dyn PersonApi,
    snapshot: &[Person],
    working: &[Person],
) -> Result<SaveOutcome, ReconcileError> {
    if working == snapshot {
        return Ok(SaveOutcome::NothingToSave);
    }

    let plan = plan(snapshot, working);
    tracing::info!(
        additions = plan.additions.len(),
        changes = plan.changes.len(),
        removals = plan.removals.len(),
        "saving working copy"
    );
    if plan.is_empty() {
        tracing::debug!("rows differ only in order or unknown ids; refreshing");
    }

    for person in &plan.additions {
        api.create(person).map_err(fail(SavePhase::Create))?;
    }
    for update in &plan.changes {
        api.update(update).map_err(fail(SavePhase::Update))?;
    }
    for id in &plan.removals {
        api.delete(*id).map_err(fail(SavePhase::Delete))?;
    }

    let refreshed = api.list().map_err(fail(SavePhase::Refresh))?;
    Ok(SaveOutcome::Saved(refreshed))
}

fn fail(phase: SavePhase) -> impl Fn(ClientError) -> ReconcileError {
    move |source| {
        tracing::warn!(?phase, "save aborted: {source}");
        ReconcileError { phase, source }
    }
}
