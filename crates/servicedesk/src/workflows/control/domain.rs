use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// In-progress control-code record handed over by the upstream portal once
/// the user identifies at the desk.
///
/// `code`, the claimed names, and `user_uid` are read-only for the screen's
/// lifetime; `day_of_birth` may be replaced wholesale through the correction
/// sub-flow when the authority rejects the claimed value. Field names follow
/// the portal's JSON casing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlCode {
    pub code: String,
    pub first_name: String,
    pub last_name: String,
    pub day_of_birth: String,
    pub user_uid: String,
}

/// Canonical date format exchanged with the identity authority.
pub const WIRE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Render a calendar date in the authority's wire format: zero-padded,
/// 1-based month and day (`2021-03-04`).
pub fn format_wire_date(date: NaiveDate) -> String {
    date.format(WIRE_DATE_FORMAT).to_string()
}

/// One of the five facts the operator must confirm on the physical document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConfirmationItem {
    Photo,
    Valid,
    LastName,
    FirstName,
    DayOfBirth,
}

impl ConfirmationItem {
    pub const ALL: [ConfirmationItem; 5] = [
        ConfirmationItem::Photo,
        ConfirmationItem::Valid,
        ConfirmationItem::LastName,
        ConfirmationItem::FirstName,
        ConfirmationItem::DayOfBirth,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ConfirmationItem::Photo => "photo",
            ConfirmationItem::Valid => "valid",
            ConfirmationItem::LastName => "lastName",
            ConfirmationItem::FirstName => "firstName",
            ConfirmationItem::DayOfBirth => "dayOfBirth",
        }
    }
}

/// The operator's confirmation sheet: five named switches, all off until the
/// corresponding fact has been checked against the document. Toggles are
/// independent and idempotent; order does not matter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checklist {
    pub photo: bool,
    pub valid: bool,
    pub last_name: bool,
    pub first_name: bool,
    pub day_of_birth: bool,
}

impl Checklist {
    pub fn set(&mut self, item: ConfirmationItem, confirmed: bool) {
        match item {
            ConfirmationItem::Photo => self.photo = confirmed,
            ConfirmationItem::Valid => self.valid = confirmed,
            ConfirmationItem::LastName => self.last_name = confirmed,
            ConfirmationItem::FirstName => self.first_name = confirmed,
            ConfirmationItem::DayOfBirth => self.day_of_birth = confirmed,
        }
    }

    pub fn get(self, item: ConfirmationItem) -> bool {
        match item {
            ConfirmationItem::Photo => self.photo,
            ConfirmationItem::Valid => self.valid,
            ConfirmationItem::LastName => self.last_name,
            ConfirmationItem::FirstName => self.first_name,
            ConfirmationItem::DayOfBirth => self.day_of_birth,
        }
    }

    /// Conversion is only permitted once every switch is on.
    pub fn all_confirmed(self) -> bool {
        self.photo && self.valid && self.last_name && self.first_name && self.day_of_birth
    }
}

/// Identifier transcribed from the physical document, typed cell by cell.
///
/// Content is deliberately not validated (the entry widget accepts
/// everything); the empty string is the "unset" sentinel and blocks
/// submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentId(String);

impl DocumentId {
    /// Number of cells in the entry widget.
    pub const LENGTH: usize = 6;

    pub fn unset() -> Self {
        Self(String::new())
    }

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn is_unset(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether every cell of the entry widget has been filled.
    pub fn is_complete(&self) -> bool {
        self.0.chars().count() == Self::LENGTH
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
