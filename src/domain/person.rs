use std::error::Error;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One row of the `persons` table as it travels over the wire.
///
/// `id` is `None` only for rows created in a dashboard working copy that
/// have not been saved yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Person {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub age: Option<i64>,
    pub residence: Option<String>,
}

impl Person {
    pub fn blank() -> Self {
        Self::default()
    }

    /// Structural equality over every field except `id`.
    pub fn same_fields(&self, other: &Person) -> bool {
        self.name == other.name && self.age == other.age && self.residence == other.residence
    }

    pub fn set_field(&mut self, field: PersonField, raw: &str) -> Result<(), InvalidFieldValue> {
        let value = normalize_cell(raw);
        match field {
            PersonField::Name => self.name = value.map(str::to_string),
            PersonField::Residence => self.residence = value.map(str::to_string),
            PersonField::Age => {
                self.age = match value {
                    Some(text) => Some(text.parse::<i64>().map_err(|_| InvalidFieldValue {
                        field,
                        value: raw.to_string(),
                    })?),
                    None => None,
                }
            }
        }
        Ok(())
    }

    pub fn to_new_person(&self) -> NewPerson {
        NewPerson {
            id: None,
            name: self.name.clone(),
            age: self.age,
            residence: self.residence.clone(),
        }
    }

    /// Returns `None` for rows that have never been persisted.
    pub fn to_update(&self) -> Option<PersonUpdate> {
        Some(PersonUpdate {
            id: self.id?,
            name: self.name.clone(),
            age: self.age,
            residence: self.residence.clone(),
        })
    }
}

/// Create payload. `name`, `age` and `residence` must be present but may be
/// null. A non-null `id` is accepted by the parser so that it can be rejected
/// with a precise message instead of an unknown-field error.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct NewPerson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(deserialize_with = "Option::deserialize")]
    pub name: Option<String>,
    #[serde(deserialize_with = "Option::deserialize")]
    pub age: Option<i64>,
    #[serde(deserialize_with = "Option::deserialize")]
    pub residence: Option<String>,
}

/// Update payload: full replacement of every non-id field of row `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PersonUpdate {
    pub id: i64,
    #[serde(deserialize_with = "Option::deserialize")]
    pub name: Option<String>,
    #[serde(deserialize_with = "Option::deserialize")]
    pub age: Option<i64>,
    #[serde(deserialize_with = "Option::deserialize")]
    pub residence: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonField {
    Name,
    Age,
    Residence,
}

impl PersonField {
    pub fn as_str(self) -> &'static str {
        match self {
            PersonField::Name => "name",
            PersonField::Age => "age",
            PersonField::Residence => "residence",
        }
    }
}

impl FromStr for PersonField {
    type Err = ParsePersonFieldError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(PersonField::Name),
            "age" => Ok(PersonField::Age),
            "residence" => Ok(PersonField::Residence),
            other => Err(ParsePersonFieldError {
                value: other.to_string(),
            }),
        }
    }
}

fn normalize_cell(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
        None
    } else {
        Some(trimmed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePersonFieldError {
    value: String,
}

impl fmt::Display for ParsePersonFieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown column '{}', expected one of: name, age, residence",
            self.value
        )
    }
}

impl Error for ParsePersonFieldError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidFieldValue {
    field: PersonField,
    value: String,
}

impl fmt::Display for InvalidFieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' is not a valid value for column '{}'",
            self.value,
            self.field.as_str()
        )
    }
}

impl Error for InvalidFieldValue {}
