//! Client-side checks run before a mutation is dispatched

use chargeops_core::{EntityKind, Error, Record, Result, types::ID_FIELD};

/// Minimum password length for new accounts
pub const MIN_PASSWORD_LEN: usize = 6;

/// Which mutation a record is being prepared for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// POST of a new record
    Create,
    /// PUT of an existing record
    Update,
}

/// Check a record before it is sent
///
/// # Errors
///
/// Returns [`Error::Validation`] naming the first field that fails.
pub fn validate(kind: EntityKind, record: &Record, intent: Intent) -> Result<()> {
    match kind {
        EntityKind::User => validate_user(record, intent),
        EntityKind::Charger => validate_charger(record),
        EntityKind::Feedback => validate_feedback(record),
        EntityKind::Transaction => Ok(()),
    }
}

fn require(record: &Record, field: &str, label: &str) -> Result<()> {
    if record.text(field).trim().is_empty() && record.number(field).is_none() {
        return Err(Error::validation(field, format!("{label} is required")));
    }
    Ok(())
}

fn validate_user(record: &Record, intent: Intent) -> Result<()> {
    require(record, "name", "Name")?;
    require(record, "email", "Email")?;
    if !record.text("email").contains('@') {
        return Err(Error::validation("email", "Email must contain '@'"));
    }

    let password = record.text("password");
    match intent {
        Intent::Create if password.trim().is_empty() => Err(Error::validation(
            "password",
            "Password is required for new users",
        )),
        _ if !password.is_empty() && password.chars().count() < MIN_PASSWORD_LEN => {
            Err(Error::validation(
                "password",
                format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
            ))
        }
        _ => Ok(()),
    }
}

fn validate_charger(record: &Record) -> Result<()> {
    require(record, "name", "Name")?;
    require(record, "address", "Address")?;
    if let Some(ratings) = record.get("ratings").filter(|v| !v.is_null())
        && !ratings.as_f64().is_some_and(|r| (0.0..=5.0).contains(&r))
    {
        return Err(Error::validation("ratings", "Ratings must be between 0 and 5"));
    }
    Ok(())
}

fn validate_feedback(record: &Record) -> Result<()> {
    match record.number("rating") {
        Some(r) if (1.0..=5.0).contains(&r) => {}
        _ => return Err(Error::validation("rating", "Rating must be between 1 and 5")),
    }
    require(record, "comment", "Comment")
}

/// Shape a record for sending
///
/// Creates drop any `id` (the server assigns it). User updates drop an empty
/// `password` so the stored one is kept.
#[must_use]
pub fn prepare(kind: EntityKind, record: &Record, intent: Intent) -> Record {
    let mut outgoing = record.clone();
    match intent {
        Intent::Create => {
            outgoing.remove(ID_FIELD);
        }
        Intent::Update => {
            if kind == EntityKind::User && outgoing.text("password").trim().is_empty() {
                outgoing.remove("password");
            }
        }
    }
    outgoing
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn user(name: &str, email: &str, password: &str) -> Record {
        Record::new()
            .with("name", name)
            .with("email", email)
            .with("password", password)
    }

    fn failing_field(result: Result<()>) -> String {
        match result {
            Err(Error::Validation { field, .. }) => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_user_create() {
        let record = user("Ada", "ada@example.com", "secret1");
        assert!(validate(EntityKind::User, &record, Intent::Create).is_ok());
    }

    #[rstest]
    #[case(user("", "ada@example.com", "secret1"), "name")]
    #[case(user("Ada", "", "secret1"), "email")]
    #[case(user("Ada", "ada.example.com", "secret1"), "email")]
    #[case(user("Ada", "ada@example.com", ""), "password")]
    #[case(user("Ada", "ada@example.com", "abc"), "password")]
    fn test_user_create_failures(#[case] record: Record, #[case] field: &str) {
        let result = validate(EntityKind::User, &record, Intent::Create);
        assert_eq!(failing_field(result), field);
    }

    #[test]
    fn test_user_update_allows_empty_password() {
        let record = user("Ada", "ada@example.com", "");
        assert!(validate(EntityKind::User, &record, Intent::Update).is_ok());

        let short = user("Ada", "ada@example.com", "abc");
        assert!(validate(EntityKind::User, &short, Intent::Update).is_err());
    }

    #[test]
    fn test_charger_requires_name_and_address() {
        let record = Record::new().with("name", "Alpha 01");
        assert_eq!(
            failing_field(validate(EntityKind::Charger, &record, Intent::Create)),
            "address"
        );

        let ok = record.with("address", "1 Main St").with("ratings", 4.5);
        assert!(validate(EntityKind::Charger, &ok, Intent::Create).is_ok());

        let bad = ok.with("ratings", 7);
        assert_eq!(
            failing_field(validate(EntityKind::Charger, &bad, Intent::Update)),
            "ratings"
        );
    }

    #[rstest]
    #[case(0)]
    #[case(6)]
    fn test_feedback_rating_bounds(#[case] rating: i64) {
        let record = Record::new().with("rating", rating).with("comment", "ok");
        assert_eq!(
            failing_field(validate(EntityKind::Feedback, &record, Intent::Create)),
            "rating"
        );
    }

    #[test]
    fn test_feedback_requires_comment() {
        let record = Record::new().with("rating", "5");
        assert_eq!(
            failing_field(validate(EntityKind::Feedback, &record, Intent::Create)),
            "comment"
        );
    }

    #[test]
    fn test_prepare_strips_empty_password_on_update() {
        let record = user("Ada", "ada@example.com", " ").with("id", 3);
        let outgoing = prepare(EntityKind::User, &record, Intent::Update);
        assert!(!outgoing.contains("password"));
        assert_eq!(outgoing.text("name"), "Ada");
    }

    #[test]
    fn test_prepare_keeps_password_on_update() {
        let record = user("Ada", "ada@example.com", "newpass");
        let outgoing = prepare(EntityKind::User, &record, Intent::Update);
        assert_eq!(outgoing.text("password"), "newpass");
    }

    #[test]
    fn test_prepare_drops_id_on_create() {
        let record = Record::new().with("id", 9).with("name", "Alpha");
        let outgoing = prepare(EntityKind::Charger, &record, Intent::Create);
        assert!(outgoing.id().is_none());
    }
}
