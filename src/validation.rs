use std::sync::LazyLock;

use database::{
    consts::consts::{ACTIVE, DOB, EMAIL, FIRSTNAME, HOME, LASTNAME, WORK},
    model::participant::Participant,
};
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

/// Checked in this order, the first missing one is reported
pub const REQUIRED_PROPERTIES: [&str; 7] = [EMAIL, FIRSTNAME, LASTNAME, DOB, ACTIVE, WORK, HOME];

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern should compile")
});

/// Shape only, `2023/13/45` is accepted
static DOB_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}/[0-9]{2}/[0-9]{2}$").expect("dob pattern should compile"));

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Missing required property: {0}")]
    MissingProperty(&'static str),

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Invalid date of birth format (YYYY/MM/DD)")]
    InvalidDateOfBirth,
}

/// Checks a participant payload before it is stored.
///
/// Presence is checked by key, a property explicitly set to `null` counts as present. Email and
/// dob must be strings matching their patterns, any other JSON type fails the format check.
pub fn validate_participant(data: &Map<String, Value>) -> Result<(), ValidationError> {
    if let Some(missing) = REQUIRED_PROPERTIES
        .into_iter()
        .find(|property| !data.contains_key(*property))
    {
        return Err(ValidationError::MissingProperty(missing));
    }

    if !matches_pattern(&EMAIL_PATTERN, &data[EMAIL]) {
        return Err(ValidationError::InvalidEmail);
    }

    if !matches_pattern(&DOB_PATTERN, &data[DOB]) {
        return Err(ValidationError::InvalidDateOfBirth);
    }

    Ok(())
}

/// Validates and hands the payload back unchanged, unknown properties and value types included
pub fn into_participant(data: Map<String, Value>) -> Result<Participant, ValidationError> {
    validate_participant(&data)?;

    Ok(Participant::from(data))
}

fn matches_pattern(pattern: &Regex, value: &Value) -> bool {
    value.as_str().map_or(false, |s| pattern.is_match(s))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().expect("should be an object").clone()
    }

    fn valid_payload() -> Map<String, Value> {
        payload(json!({
            "email": "johndoe@gmail.com",
            "firstname": "John",
            "lastname": "Doe",
            "dob": "1990/01/01",
            "active": true,
            "work": { "companyname": "XYZ", "salary": 5000, "currency": "USD" },
            "home": { "country": "USA", "city": "New York" }
        }))
    }

    #[test]
    fn complete_payload_is_valid() {
        assert_eq!(validate_participant(&valid_payload()), Ok(()));
    }

    #[rstest]
    #[case(EMAIL)]
    #[case(FIRSTNAME)]
    #[case(LASTNAME)]
    #[case(DOB)]
    #[case(ACTIVE)]
    #[case(WORK)]
    #[case(HOME)]
    fn missing_property_is_named(#[case] property: &'static str) {
        let mut data = valid_payload();
        data.remove(property);

        let error = validate_participant(&data).unwrap_err();

        assert_eq!(error, ValidationError::MissingProperty(property));
        assert_eq!(
            error.to_string(),
            format!("Missing required property: {property}")
        );
    }

    #[test]
    fn first_missing_property_wins() {
        // Given a payload with only an invalid email
        let data = payload(json!({ "email": "not-an-email" }));

        // Then firstname is reported before the bad email
        assert_eq!(
            validate_participant(&data),
            Err(ValidationError::MissingProperty(FIRSTNAME))
        );
    }

    #[test]
    fn null_property_counts_as_present() {
        let mut data = valid_payload();
        data.insert(WORK.to_string(), Value::Null);

        assert_eq!(validate_participant(&data), Ok(()));
    }

    #[rstest]
    #[case(json!("johndoe.gmail.com"))]
    #[case(json!("john doe@gmail.com"))]
    #[case(json!("johndoe@gmail"))]
    #[case(json!("@gmail.com"))]
    #[case(json!(42))]
    #[case(json!(null))]
    fn invalid_email_is_rejected(#[case] email: Value) {
        let mut data = valid_payload();
        data.insert(EMAIL.to_string(), email);

        let error = validate_participant(&data).unwrap_err();

        assert_eq!(error, ValidationError::InvalidEmail);
        assert_eq!(error.to_string(), "Invalid email address");
    }

    #[rstest]
    #[case(json!("1990-01-01"))]
    #[case(json!("90/01/01"))]
    #[case(json!("1990/1/01"))]
    #[case(json!(" 1990/01/01"))]
    #[case(json!(19900101))]
    fn invalid_dob_is_rejected(#[case] dob: Value) {
        let mut data = valid_payload();
        data.insert(DOB.to_string(), dob);

        let error = validate_participant(&data).unwrap_err();

        assert_eq!(error, ValidationError::InvalidDateOfBirth);
        assert_eq!(error.to_string(), "Invalid date of birth format (YYYY/MM/DD)");
    }

    #[rstest]
    #[case("2023/13/45")]
    #[case("9999/99/99")]
    #[case("0000/00/00")]
    fn dob_is_not_calendar_checked(#[case] dob: &str) {
        let mut data = valid_payload();
        data.insert(DOB.to_string(), json!(dob));

        assert_eq!(validate_participant(&data), Ok(()));
    }

    #[test]
    fn email_is_checked_before_dob() {
        let mut data = valid_payload();
        data.insert(EMAIL.to_string(), json!("nope"));
        data.insert(DOB.to_string(), json!("nope"));

        assert_eq!(
            validate_participant(&data),
            Err(ValidationError::InvalidEmail)
        );
    }

    #[test]
    fn valid_payload_is_kept_verbatim() {
        // Given extra properties and values of any type
        let mut data = valid_payload();
        data.insert("phone".to_string(), json!("555-0100"));
        data.insert(
            WORK.to_string(),
            json!({ "salary": "5k", "title": "CTO", "currency": null }),
        );
        data.insert(HOME.to_string(), json!({ "city": "Lahore", "zip": 54000 }));

        // Then the participant holds exactly the payload
        let participant = into_participant(data.clone()).unwrap();

        assert_eq!(participant.as_document(), &data);
        assert_eq!(participant.email(), Some("johndoe@gmail.com"));
    }

    #[rstest]
    #[case(ACTIVE, json!("yes"))]
    #[case(WORK, json!(null))]
    #[case(HOME, json!([]))]
    #[case(FIRSTNAME, json!(7))]
    fn value_types_are_not_checked(#[case] property: &str, #[case] value: Value) {
        let mut data = valid_payload();
        data.insert(property.to_string(), value.clone());

        let participant = into_participant(data).unwrap();

        assert_eq!(participant.get(property), Some(&value));
    }

    #[test]
    fn invalid_payload_is_not_converted() {
        let mut data = valid_payload();
        data.remove(HOME);

        assert_eq!(
            into_participant(data),
            Err(ValidationError::MissingProperty(HOME))
        );
    }
}
