//! The in-progress registration form

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::api::HistoryEntry;
use crate::datetime;
use crate::error::{Error, Result};

/// When the registration starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum When {
    #[default]
    Now,
    Future,
}

/// Registration form state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationDraft {
    pub plate: String,
    /// Make name, resolved to a catalog id on submission
    pub make: String,
    pub model: String,
    pub when: When,
    /// `YYYY-MM-DD`, used when `when` is [`When::Future`]
    pub date: String,
    /// `HH:MM` (24-hour), used when `when` is [`When::Future`]
    pub time: String,
    pub days: u32,
}

impl RegistrationDraft {
    /// Empty form starting now, for one day
    pub fn new(now: &NaiveDateTime) -> Self {
        Self {
            plate: String::new(),
            make: String::new(),
            model: String::new(),
            when: When::Now,
            date: datetime::draft_date(now),
            time: datetime::draft_time(now),
            days: 1,
        }
    }

    /// Copy plate, make and model from a past registration
    pub fn repeat(&mut self, entry: &HistoryEntry) {
        self.plate = entry.plate_no.clone().unwrap_or_default();
        self.make = entry.make.clone().unwrap_or_default();
        self.model = entry.model.clone().unwrap_or_default();
    }

    pub fn start_time(&self, now: NaiveDateTime) -> Result<NaiveDateTime> {
        match self.when {
            When::Now => Ok(now),
            When::Future => datetime::parse_start(&self.date, &self.time),
        }
    }

    /// `start` plus `days` whole 24-hour periods
    pub fn end_time(&self, start: NaiveDateTime) -> Result<NaiveDateTime> {
        if self.days < 1 {
            return Err(Error::validation("Number of days must be at least 1."));
        }
        start
            .checked_add_signed(Duration::hours(24 * i64::from(self.days)))
            .ok_or_else(|| Error::validation("Registration end is out of range."))
    }
}

/// Per-field flags for inputs that failed the form check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputErrors {
    pub plate: bool,
    pub make: bool,
    pub model: bool,
    pub read_rules: bool,
}

impl InputErrors {
    pub fn check(draft: &RegistrationDraft, read_rules: bool) -> Self {
        Self {
            plate: draft.plate.trim().is_empty(),
            make: draft.make.trim().is_empty(),
            model: false,
            read_rules: !read_rules,
        }
    }

    pub fn any(&self) -> bool {
        self.plate || self.make || self.model || self.read_rules
    }
}
