use std::error::Error;
use std::fmt;
use std::io::Read;
use std::time::Duration;

use crate::api::StatusBody;
use crate::domain::person::{NewPerson, Person, PersonUpdate};

/// The four CRUD calls the dashboard needs. Reconciliation and the session
/// state machine only ever talk to the server through this trait.
pub trait PersonApi {
    fn list(&self) -> Result<Vec<Person>, ClientError>;
    fn create(&self, person: &NewPerson) -> Result<(), ClientError>;
    fn update(&self, update: &PersonUpdate) -> Result<(), ClientError>;
    fn delete(&self, id: i64) -> Result<(), ClientError>;
}

pub struct HttpPersonApi {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpPersonApi {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn persons_url(&self) -> String {
        format!("{}/persons", self.base_url)
    }

    fn send_json(&self, method: &str, body: &impl serde::Serialize) -> Result<(), ClientError> {
        let payload = serde_json::to_string(body)?;
        let response = self
            .agent
            .request(method, &self.persons_url())
            .set("Content-Type", "application/json")
            .send_string(&payload);
        check(response).map(|_| ())
    }
}

impl PersonApi for HttpPersonApi {
    fn list(&self) -> Result<Vec<Person>, ClientError> {
        let response = check(self.agent.get(&self.persons_url()).call())?;
        let body = read_body(response)?;
        Ok(serde_json::from_str(&body)?)
    }

    fn create(&self, person: &NewPerson) -> Result<(), ClientError> {
        self.send_json("POST", person)
    }

    fn update(&self, update: &PersonUpdate) -> Result<(), ClientError> {
        self.send_json("PUT", update)
    }

    fn delete(&self, id: i64) -> Result<(), ClientError> {
        let url = format!("{}/{}", self.persons_url(), id);
        check(self.agent.delete(&url).call()).map(|_| ())
    }
}

fn check(result: Result<ureq::Response, ureq::Error>) -> Result<ureq::Response, ClientError> {
    match result {
        Ok(response) => Ok(response),
        Err(ureq::Error::Status(code, response)) => {
            let raw = read_body(response).unwrap_or_default();
            let body = serde_json::from_str::<StatusBody>(&raw).ok();
            Err(ClientError::Status { code, body })
        }
        Err(ureq::Error::Transport(transport)) => Err(ClientError::Transport(transport.to_string())),
    }
}

fn read_body(response: ureq::Response) -> Result<String, ClientError> {
    let mut body = String::new();
    response.into_reader().read_to_string(&mut body)?;
    Ok(body)
}

#[derive(Debug)]
pub enum ClientError {
    Transport(String),
    Status { code: u16, body: Option<StatusBody> },
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Transport(message) => write!(f, "server unreachable: {}", message),
            ClientError::Status {
                code,
                body: Some(body),
            } => write!(f, "server answered {} ({}): {}", code, body.status, body.message),
            ClientError::Status { code, body: None } => write!(f, "server answered {}", code),
            ClientError::Io(err) => write!(f, "I/O error: {}", err),
            ClientError::Json(err) => write!(f, "JSON error: {}", err),
        }
    }
}

impl Error for ClientError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ClientError::Io(err) => Some(err),
            ClientError::Json(err) => Some(err),
            ClientError::Transport(_) | ClientError::Status { .. } => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(value: std::io::Error) -> Self {
        ClientError::Io(value)
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(value: serde_json::Error) -> Self {
        ClientError::Json(value)
    }
}
