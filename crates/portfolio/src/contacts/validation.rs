//! Field rules for contact-form submissions.
//!
//! Every field is checked so the caller sees all offending fields at once; within a single
//! field the first failing rule wins, which keeps one message per field.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use super::domain::{
    ContactStatus, ContactSubmission, ExperienceLevel, NewContact, StatusUpdateRequest,
};

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 100;
pub const MESSAGE_MIN_CHARS: usize = 10;
pub const MESSAGE_MAX_CHARS: usize = 1000;
pub const PHONE_MAX_CHARS: usize = 20;
const EMAIL_MAX_CHARS: usize = 254;
const EMAIL_LOCAL_MAX_CHARS: usize = 64;

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@([A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,}$",
        )
        .expect("email pattern compiles")
    })
}

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Every violation found in one payload, in field declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldViolation>);

impl ValidationErrors {
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        Self(vec![FieldViolation::new(field, message)])
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.0
    }

    pub fn fields(&self) -> Vec<&'static str> {
        self.0.iter().map(|violation| violation.field).collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for violation in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "{}", violation.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Validates and normalizes a raw submission.
pub fn validate_submission(submission: ContactSubmission) -> Result<NewContact, ValidationErrors> {
    let mut violations = Vec::new();

    let name = bounded_text(
        "name",
        submission.name,
        NAME_MIN_CHARS,
        NAME_MAX_CHARS,
        &mut violations,
    );
    let email = email(submission.email, &mut violations);
    let phone = phone(submission.phone, &mut violations);
    let experience = experience(submission.experience, &mut violations);
    let message = bounded_text(
        "message",
        submission.message,
        MESSAGE_MIN_CHARS,
        MESSAGE_MAX_CHARS,
        &mut violations,
    );

    match (name, email, message) {
        (Some(name), Some(email), Some(message)) if violations.is_empty() => Ok(NewContact {
            name,
            email,
            phone,
            experience,
            message,
        }),
        _ => Err(ValidationErrors(violations)),
    }
}

/// Parses the requested status into the closed set of lifecycle states.
pub fn validate_status_update(
    request: StatusUpdateRequest,
) -> Result<ContactStatus, ValidationErrors> {
    let raw = request
        .new_status
        .as_deref()
        .map(str::trim)
        .unwrap_or_default();
    if raw.is_empty() {
        return Err(ValidationErrors::single("newStatus", "newStatus is required"));
    }

    raw.parse::<ContactStatus>().map_err(|_| {
        let allowed: Vec<&str> = ContactStatus::ALL
            .iter()
            .map(|status| status.label())
            .collect();
        ValidationErrors::single(
            "newStatus",
            format!("newStatus must be one of: {}", allowed.join(", ")),
        )
    })
}

fn bounded_text(
    field: &'static str,
    raw: Option<String>,
    min: usize,
    max: usize,
    violations: &mut Vec<FieldViolation>,
) -> Option<String> {
    let Some(raw) = raw else {
        violations.push(FieldViolation::new(field, format!("{field} is required")));
        return None;
    };

    let trimmed = raw.trim();
    let length = trimmed.chars().count();
    let rejection = if trimmed.is_empty() {
        Some(format!("{field} must not be empty"))
    } else if length < min {
        Some(format!("{field} must be at least {min} characters"))
    } else if length > max {
        Some(format!("{field} must be at most {max} characters"))
    } else {
        None
    };

    match rejection {
        Some(message) => {
            violations.push(FieldViolation::new(field, message));
            None
        }
        None => Some(trimmed.to_string()),
    }
}

fn email(raw: Option<String>, violations: &mut Vec<FieldViolation>) -> Option<String> {
    let trimmed = raw.as_deref().map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        violations.push(FieldViolation::new("email", "email is required"));
        return None;
    }

    let local_length = trimmed
        .split_once('@')
        .map(|(local, _)| local.chars().count())
        .unwrap_or_default();
    if trimmed.chars().count() > EMAIL_MAX_CHARS
        || local_length > EMAIL_LOCAL_MAX_CHARS
        || !email_pattern().is_match(trimmed)
    {
        violations.push(FieldViolation::new(
            "email",
            "email must be a valid email address",
        ));
        return None;
    }

    Some(trimmed.to_string())
}

fn phone(raw: Option<String>, violations: &mut Vec<FieldViolation>) -> Option<String> {
    let trimmed = raw.as_deref().map(str::trim).filter(|value| !value.is_empty())?;
    if trimmed.chars().count() > PHONE_MAX_CHARS {
        violations.push(FieldViolation::new(
            "phone",
            format!("phone must be at most {PHONE_MAX_CHARS} characters"),
        ));
        return None;
    }
    Some(trimmed.to_string())
}

fn experience(
    raw: Option<String>,
    violations: &mut Vec<FieldViolation>,
) -> Option<ExperienceLevel> {
    let trimmed = raw.as_deref().map(str::trim).filter(|value| !value.is_empty())?;
    match trimmed.parse::<ExperienceLevel>() {
        Ok(level) => Some(level),
        Err(_) => {
            let allowed: Vec<&str> = ExperienceLevel::ALL
                .iter()
                .map(|level| level.label())
                .collect();
            violations.push(FieldViolation::new(
                "experience",
                format!("experience must be one of: {}", allowed.join(", ")),
            ));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(name: &str, email: &str, message: &str) -> ContactSubmission {
        ContactSubmission {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            phone: None,
            experience: None,
            message: Some(message.to_string()),
        }
    }

    #[test]
    fn accepts_and_trims_valid_submission() {
        let mut raw = submission(
            "  Sarah Johnson ",
            " sarah@x.com",
            "  I want to learn chess tactics and openings  ",
        );
        raw.phone = Some(" +1-555-0123 ".to_string());
        raw.experience = Some("intermediate".to_string());

        let contact = validate_submission(raw).expect("valid submission");
        assert_eq!(contact.name, "Sarah Johnson");
        assert_eq!(contact.email, "sarah@x.com");
        assert_eq!(contact.phone.as_deref(), Some("+1-555-0123"));
        assert_eq!(contact.experience, Some(ExperienceLevel::Intermediate));
        assert_eq!(contact.message, "I want to learn chess tactics and openings");
    }

    #[test]
    fn reports_every_offending_field_once() {
        let errors = validate_submission(submission("", "bad", "short"))
            .expect_err("invalid submission");
        assert_eq!(errors.fields(), vec!["name", "email", "message"]);
        assert_eq!(errors.violations()[0].message, "name must not be empty");
    }

    #[test]
    fn missing_fields_are_required_violations() {
        let errors =
            validate_submission(ContactSubmission::default()).expect_err("empty payload rejected");
        assert_eq!(errors.fields(), vec!["name", "email", "message"]);
        assert!(errors
            .violations()
            .iter()
            .all(|violation| violation.message.contains("required")));
    }

    #[test]
    fn length_bounds_count_characters_after_trimming() {
        let errors = validate_submission(submission(" J ", "j@chess.org", "   too short   "))
            .expect_err("short fields rejected");
        assert_eq!(errors.fields(), vec!["name", "message"]);

        let accented = validate_submission(submission("Jó", "jo@chess.org", "Ñoño ñoño ñ"))
            .expect("two-character names are accepted");
        assert_eq!(accented.name, "Jó");

        let long_name = "N".repeat(NAME_MAX_CHARS + 1);
        let long_message = "m".repeat(MESSAGE_MAX_CHARS + 1);
        let errors = validate_submission(submission(&long_name, "n@chess.org", &long_message))
            .expect_err("long fields rejected");
        assert_eq!(errors.fields(), vec!["name", "message"]);
    }

    #[test]
    fn rejects_malformed_emails() {
        for email in [
            "plainaddress",
            "@no-local.com",
            "spaces in@chess.com",
            "missing-tld@chess",
            "double..dot@chess.com",
            "trailing@chess.c",
        ] {
            let errors = validate_submission(submission(
                "Magnus",
                email,
                "Looking for endgame coaching",
            ))
            .expect_err("malformed email rejected");
            assert_eq!(errors.fields(), vec!["email"], "{email} should be rejected");
        }

        for email in ["first.last+coach@sub.chess-club.org", "a_b@x.io"] {
            assert!(
                validate_submission(submission("Magnus", email, "Looking for endgame coaching"))
                    .is_ok(),
                "{email} should be accepted"
            );
        }
    }

    #[test]
    fn optional_fields_are_checked_when_present() {
        let mut raw = submission("Judit", "judit@chess.org", "Preparing for a rapid open");
        raw.phone = Some("0".repeat(PHONE_MAX_CHARS + 1));
        raw.experience = Some("grandmaster".to_string());

        let errors = validate_submission(raw).expect_err("optional fields rejected");
        assert_eq!(errors.fields(), vec!["phone", "experience"]);
        assert!(errors.violations()[1].message.contains("complete-beginner"));
    }

    #[test]
    fn status_updates_accept_only_known_states() {
        let request = |raw: Option<&str>| StatusUpdateRequest {
            new_status: raw.map(str::to_string),
        };

        assert_eq!(
            validate_status_update(request(Some(" replied "))),
            Ok(ContactStatus::Replied)
        );
        assert_eq!(
            validate_status_update(request(None))
                .expect_err("missing status")
                .fields(),
            vec!["newStatus"]
        );
        assert!(validate_status_update(request(Some("archived")))
            .expect_err("unknown status")
            .to_string()
            .contains("new, read, replied"));
    }

    #[test]
    fn blank_optional_fields_are_treated_as_absent() {
        let mut raw = submission("Judit", "judit@chess.org", "Preparing for a rapid open");
        raw.phone = Some("   ".to_string());
        raw.experience = Some(String::new());

        let contact = validate_submission(raw).expect("blank optionals accepted");
        assert!(contact.phone.is_none());
        assert!(contact.experience.is_none());
    }
}
