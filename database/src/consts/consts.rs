use serde::{Deserialize, Serialize};

// Table
pub const PARTICIPANT_TABLE: &str = "Participants";

// Attribute names
pub const EMAIL: &str = "email";
pub const FIRSTNAME: &str = "firstname";
pub const LASTNAME: &str = "lastname";
pub const DOB: &str = "dob";
pub const ACTIVE: &str = "active";
pub const WORK: &str = "work";
pub const HOME: &str = "home";

/// Partition key of the participant table
pub const PARTICIPANT_KEY: &str = EMAIL;

/// Attributes returned by the list views (`/details`, `/details/deleted`)
pub const DETAILS_PROJECTION: [&str; 4] = [EMAIL, FIRSTNAME, LASTNAME, DOB];

/// Attributes returned when reading a single participant
pub const STATUS_PROJECTION: [&str; 5] = [EMAIL, FIRSTNAME, LASTNAME, DOB, ACTIVE];

/// Attributes rewritten by an update, the key is never among them
pub const UPDATED_ATTRIBUTES: [&str; 6] = [FIRSTNAME, LASTNAME, DOB, ACTIVE, WORK, HOME];

/// Attributes echoed back after a soft delete
pub const IDENTITY_ATTRIBUTES: [&str; 4] = [EMAIL, FIRSTNAME, LASTNAME, ACTIVE];

// New Type Pattern -- https://doc.rust-lang.org/rust-by-example/generics/new_types.html
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Email(pub String);

impl Email {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Email {
    fn from(value: &str) -> Self {
        Email(value.to_string())
    }
}

impl From<String> for Email {
    fn from(value: String) -> Self {
        Email(value)
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
