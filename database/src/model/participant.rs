use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    consts::consts::{EMAIL, UPDATED_ATTRIBUTES},
    persistence::storage::Document,
};

/// A participant record exactly as stored, keyed by `email`.
///
/// Attributes pass through untouched: nothing beyond the key is guaranteed to be present and
/// `work` / `home` keep whatever shape the client sent, unknown fields included.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(transparent)]
pub struct Participant(Document);

impl Participant {
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.0.get(attribute)
    }

    pub fn email(&self) -> Option<&str> {
        self.get(EMAIL).and_then(Value::as_str)
    }

    pub fn set(&mut self, attribute: &str, value: impl Into<Value>) {
        self.0.insert(attribute.to_string(), value.into());
    }

    /// Copy holding only those of `attributes` that are present
    pub fn pick(&self, attributes: &[&str]) -> Participant {
        let picked = attributes
            .iter()
            .filter_map(|attribute| {
                self.get(attribute)
                    .map(|value| (attribute.to_string(), value.clone()))
            })
            .collect();

        Participant(picked)
    }

    pub fn as_document(&self) -> &Document {
        &self.0
    }

    pub fn new_test(email: &str) -> Self {
        let document = json!({
            "email": email,
            "firstname": "John",
            "lastname": "Doe",
            "dob": "2000/02/22",
            "active": true,
            "work": { "companyname": "XYZ Company", "salary": 5000, "currency": "USD" },
            "home": { "country": "Pakistan", "city": "Lahore" }
        });

        Participant(document.as_object().cloned().unwrap_or_default())
    }
}

impl From<Document> for Participant {
    fn from(document: Document) -> Self {
        Participant(document)
    }
}

/// The attributes written by an update, values carried over verbatim
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ParticipantUpdate {
    attributes: Vec<(String, Value)>,
}

impl ParticipantUpdate {
    pub fn attributes(&self) -> &[(String, Value)] {
        &self.attributes
    }

    pub fn into_attributes(self) -> Vec<(String, Value)> {
        self.attributes
    }
}

impl From<&Participant> for ParticipantUpdate {
    fn from(participant: &Participant) -> Self {
        let attributes = UPDATED_ATTRIBUTES
            .iter()
            .filter_map(|attribute| {
                participant
                    .get(attribute)
                    .map(|value| (attribute.to_string(), value.clone()))
            })
            .collect();

        ParticipantUpdate { attributes }
    }
}
