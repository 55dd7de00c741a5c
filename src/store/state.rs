//! In-memory state owned by the store

use chrono::NaiveDateTime;

use super::draft::{InputErrors, RegistrationDraft};
use crate::api::{Account, HistoryEntry, VehicleMake};
use crate::auth::Session;

/// Session-scoped lifecycle of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Unauthenticated,
    Authenticating,
    AuthenticatedUnloaded,
    AuthenticatedLoaded,
}

/// What changed in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    Session,
    Data,
    Draft,
    Status,
}

/// Datasets fetched from the API
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreData {
    pub account: Account,
    pub history: Vec<HistoryEntry>,
    pub makes: Vec<VehicleMake>,
    pub rules: String,
}

#[derive(Debug, Clone)]
pub struct StoreState {
    pub session: Option<Session>,
    pub authenticating: bool,
    pub has_loaded: bool,
    pub loading: bool,
    pub submitting: bool,
    /// Last user-visible error; empty when there is none
    pub error: String,
    pub confirmation_message: String,
    pub show_confirmation: bool,
    pub read_rules: bool,
    pub data: StoreData,
    pub draft: RegistrationDraft,
    pub input_errors: InputErrors,
}

impl StoreState {
    pub fn new(now: &NaiveDateTime) -> Self {
        Self {
            session: None,
            authenticating: false,
            has_loaded: false,
            loading: false,
            submitting: false,
            error: String::new(),
            confirmation_message: String::new(),
            show_confirmation: false,
            read_rules: false,
            data: StoreData::default(),
            draft: RegistrationDraft::new(now),
            input_errors: InputErrors::default(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.as_ref().is_some_and(Session::has_token)
    }

    pub fn phase(&self) -> Phase {
        if self.authenticating {
            Phase::Authenticating
        } else if !self.is_authenticated() {
            Phase::Unauthenticated
        } else if self.has_loaded {
            Phase::AuthenticatedLoaded
        } else {
            Phase::AuthenticatedUnloaded
        }
    }

    pub fn remaining_all_day(&self) -> i64 {
        self.data.account.remaining_all_day()
    }

    pub fn is_registration_form_valid(&self) -> bool {
        !self.draft.plate.trim().is_empty() && !self.draft.make.trim().is_empty() && self.read_rules
    }

    pub fn is_profile_incomplete(&self) -> bool {
        self.data.account.is_profile_incomplete()
    }

    /// Clear the form and its error flags
    pub(crate) fn reset_draft(&mut self, now: &NaiveDateTime) {
        self.draft = RegistrationDraft::new(now);
        self.read_rules = false;
        self.input_errors = InputErrors::default();
    }
}
