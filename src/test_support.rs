use std::cell::RefCell;

use crate::client::{ClientError, PersonApi};
use crate::domain::person::{NewPerson, Person, PersonUpdate};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List,
    Create(NewPerson),
    Update(PersonUpdate),
    Delete(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    List,
    Create,
    Update,
    Delete,
}

impl Call {
    fn kind(&self) -> CallKind {
        match self {
            Call::List => CallKind::List,
            Call::Create(_) => CallKind::Create,
            Call::Update(_) => CallKind::Update,
            Call::Delete(_) => CallKind::Delete,
        }
    }
}

#[derive(Default)]
struct FakeState {
    rows: Vec<Person>,
    next_id: i64,
    calls: Vec<Call>,
    down: bool,
    fail_nth: Option<(CallKind, usize)>,
}

/// In-memory server that records every call and can be told to fail.
#[derive(Default)]
pub struct FakeApi {
    state: RefCell<FakeState>,
}

pub fn person(id: Option<i64>, name: &str, age: i64, residence: &str) -> Person {
    Person {
        id,
        name: Some(name.to_string()),
        age: Some(age),
        residence: Some(residence.to_string()),
    }
}

impl FakeApi {
    pub fn with_rows(rows: Vec<Person>) -> Self {
        let next_id = rows.iter().filter_map(|row| row.id).max().unwrap_or(0) + 1;
        Self {
            state: RefCell::new(FakeState {
                rows,
                next_id,
                ..FakeState::default()
            }),
        }
    }

    pub fn rows(&self) -> Vec<Person> {
        self.state.borrow().rows.clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Every call fails with a transport error while down.
    pub fn set_down(&self, down: bool) {
        self.state.borrow_mut().down = down;
    }

    /// Fails the `nth` (1-based) call of `kind` counted from now.
    pub fn fail_nth(&self, kind: CallKind, nth: usize) {
        self.state.borrow_mut().fail_nth = Some((kind, nth));
    }

    fn record(&self, call: Call) -> Result<(), ClientError> {
        let mut state = self.state.borrow_mut();
        let kind = call.kind();
        state.calls.push(call);
        if state.down {
            return Err(ClientError::Transport("connection refused".to_string()));
        }
        if let Some((fail_kind, remaining)) = state.fail_nth {
            if fail_kind == kind {
                if remaining <= 1 {
                    state.fail_nth = None;
                    return Err(ClientError::Status {
                        code: 500,
                        body: None,
                    });
                }
                state.fail_nth = Some((fail_kind, remaining - 1));
            }
        }
        Ok(())
    }
}

impl PersonApi for FakeApi {
    fn list(&self) -> Result<Vec<Person>, ClientError> {
        self.record(Call::List)?;
        Ok(self.rows())
    }

    fn create(&self, person: &NewPerson) -> Result<(), ClientError> {
        self.record(Call::Create(person.clone()))?;
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        state.rows.push(Person {
            id: Some(id),
            name: person.name.clone(),
            age: person.age,
            residence: person.residence.clone(),
        });
        Ok(())
    }

    fn update(&self, update: &PersonUpdate) -> Result<(), ClientError> {
        self.record(Call::Update(update.clone()))?;
        let mut state = self.state.borrow_mut();
        let row = state
            .rows
            .iter_mut()
            .find(|row| row.id == Some(update.id))
            .ok_or(ClientError::Status {
                code: 404,
                body: None,
            })?;
        row.name = update.name.clone();
        row.age = update.age;
        row.residence = update.residence.clone();
        Ok(())
    }

    fn delete(&self, id: i64) -> Result<(), ClientError> {
        self.record(Call::Delete(id))?;
        let mut state = self.state.borrow_mut();
        let before = state.rows.len();
        state.rows.retain(|row| row.id != Some(id));
        if state.rows.len() == before {
            return Err(ClientError::Status {
                code: 404,
                body: None,
            });
        }
        Ok(())
    }
}
