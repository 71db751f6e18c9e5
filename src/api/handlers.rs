use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::error::{ApiError, StatusBody};
use super::AppState;
use crate::domain::person::{NewPerson, Person, PersonUpdate};
use crate::store::{RowOutcome, StoreError, StoreSession};

type StatusReply = (StatusCode, Json<StatusBody>);

pub async fn list_persons(State(state): State<AppState>) -> Result<Json<Vec<Person>>, ApiError> {
    let persons = with_session(&state, |session| session.list()).await?;
    Ok(Json(persons))
}

pub async fn create_person(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<StatusReply, ApiError> {
    let person = parse_new_person(&body)?;
    let id = with_session(&state, move |session| session.insert(&person)).await?;
    tracing::debug!(id, "person created");
    Ok((StatusCode::CREATED, Json(StatusBody::ok("created"))))
}

pub async fn update_person(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<StatusReply, ApiError> {
    let update: PersonUpdate = serde_json::from_slice(&body)?;
    let id = update.id;
    match with_session(&state, move |session| session.update(&update)).await? {
        RowOutcome::Applied => Ok((StatusCode::OK, Json(StatusBody::ok("updated")))),
        RowOutcome::NotFound => Err(ApiError::NotFound(id)),
    }
}

pub async fn delete_person(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<StatusReply, ApiError> {
    let id = raw_id.trim().parse::<i64>().map_err(|_| {
        ApiError::InvalidPayload(format!("'{}' is not a valid person id", raw_id))
    })?;
    match with_session(&state, move |session| session.delete(id)).await? {
        RowOutcome::Applied => Ok((StatusCode::OK, Json(StatusBody::ok("deleted")))),
        RowOutcome::NotFound => Err(ApiError::NotFound(id)),
    }
}

fn parse_new_person(body: &[u8]) -> Result<NewPerson, ApiError> {
    let person: NewPerson = serde_json::from_slice(body)?;
    if let Some(id) = person.id {
        return Err(ApiError::InvalidPayload(format!(
            "id {} supplied on create; ids are assigned by the server",
            id
        )));
    }
    Ok(person)
}

/// Runs `work` on the blocking pool against a connection opened for this
/// request alone. The session is dropped, closing the connection, before the
/// result is returned.
async fn with_session<T, F>(state: &AppState, work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&StoreSession) -> Result<T, StoreError> + Send + 'static,
{
    let store = state.store.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let session = store.session()?;
        work(&session)
    })
    .await?;
    Ok(outcome?)
}
