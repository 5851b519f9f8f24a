//! Inner entries
//!
//! Short private journal records. Entries are immutable once written:
//! there is no update path anywhere, deletion is a soft marker and can be
//! undone.

use chrono::NaiveDate;
use chrono::naive::NaiveDateTime;
use uuid::Uuid;

/// Maximum entry length, in characters, after trimming
pub const MAX_ENTRY_LENGTH: usize = 5000;

/// A single inner entry
#[derive(Clone, Debug)]
pub struct Entry {
    /// Entry ID
    pub id: Uuid,

    /// The ID of the owning user
    pub user_id: Uuid,

    /// The entry text, frozen at creation
    pub body_text: String,

    /// Calendar day the entry is filed under, fixed at creation
    pub day_key: NaiveDate,

    /// Creation date
    pub created_at: NaiveDateTime,

    /// Soft-deleted at
    pub deleted_at: Option<NaiveDateTime>,
}

impl Entry {
    /// Is the entry soft-deleted?
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Validate and normalize entry text
///
/// Trims surrounding whitespace first, then bounds the result to
/// `1..=`[`MAX_ENTRY_LENGTH`] characters.
pub fn validate_body_text(text: &str) -> Result<String, &'static str> {
    let text = text.trim();

    if text.is_empty() {
        return Err("Entry can not be empty");
    }

    if text.chars().count() > MAX_ENTRY_LENGTH {
        return Err("Entry can not exceed 5000 characters");
    }

    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_body_text_trims() {
        assert_eq!(Ok("hello".to_string()), validate_body_text("  hello \n"));
    }

    #[test]
    fn test_validate_body_text_rejects_empty() {
        assert!(validate_body_text("").is_err());
        assert!(validate_body_text("   \t\n ").is_err());
    }

    #[test]
    fn test_validate_body_text_length_bounds() {
        let at_limit = "a".repeat(MAX_ENTRY_LENGTH);
        assert!(validate_body_text(&at_limit).is_ok());

        let over_limit = "a".repeat(MAX_ENTRY_LENGTH + 1);
        assert!(validate_body_text(&over_limit).is_err());

        // surrounding whitespace does not count towards the limit
        let padded = format!("  {at_limit}  ");
        assert_eq!(Ok(at_limit), validate_body_text(&padded));
    }
}
