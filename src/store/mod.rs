//! Application state store for visitor parking.
//!
//! [`ParkingStore`] owns the session, the fetched datasets and the
//! registration form. Every public operation is the outermost scope for its
//! failures: it records a user-visible message in the `error` field and
//! returns the typed error to the caller. Mutations happen under a short
//! exclusive lock that is never held across a network call, and each one
//! is announced to [`ParkingStore::subscribe`] receivers.

mod draft;
mod state;

use log::{debug, error, info, warn};
use std::future::Future;
use std::sync::{Arc, RwLock, RwLockReadGuard};
use tokio::sync::broadcast;

use crate::api::{
    Account, Envelope, HistoryEntry, ParkingApi, ProfileUpdate, RegistrationPayload, VehicleMake,
};
use crate::auth::{Session, TokenStore};
use crate::cache::{CacheKey, OfflineCache};
use crate::config::ClientOptions;
use crate::datetime::{self, Clock, SystemClock};
use crate::error::{Error, Result};
use crate::storage::{FileStorage, MemoryStorage, Storage};

pub use draft::*;
pub use state::*;

pub const MSG_INVALID_PIN: &str = "Please enter a valid PIN.";
pub const MSG_LOGIN_FAILED: &str = "Invalid PIN or server error.";
pub const MSG_NOT_AUTHENTICATED: &str = "Not authenticated.";
pub const MSG_LOAD_FAILED: &str = "Failed to load data.";
pub const MSG_INCOMPLETE_FORM: &str = "Please enter a plate, a make and confirm you have read the rules.";
pub const MSG_SUBMIT_FAILED: &str = "Could not submit registration.";
pub const MSG_REGISTRATION_CREATED: &str = "Registration Created!";
pub const MSG_PROFILE_REQUIRED: &str = "Name, email and phone are required.";
pub const MSG_PROFILE_FAILED: &str = "Could not save your profile.";
pub const MSG_EMAIL_REQUIRED: &str = "Please enter your email address.";
pub const MSG_RECOVERY_FAILED: &str = "Could not send the recovery email.";
pub const MSG_OTP_FAILED: &str = "Invalid or expired code.";

const PARKING_FOR: &str = "24 Hours";

/// Await an API call and require a 200 envelope
async fn checked<T>(call: impl Future<Output = Result<Envelope<T>>>) -> Result<Envelope<T>> {
    call.await?.into_result()
}

fn find_make(makes: &[VehicleMake], name: &str) -> Option<i64> {
    let wanted = name.trim().to_lowercase();
    makes
        .iter()
        .find(|m| m.name.trim().to_lowercase() == wanted)
        .map(|m| m.id)
}

/// Central state store and orchestrator
pub struct ParkingStore {
    api: ParkingApi,
    tokens: TokenStore,
    cache: OfflineCache,
    clock: Arc<dyn Clock>,
    state: RwLock<StoreState>,
    events: broadcast::Sender<StoreEvent>,
}

impl ParkingStore {
    /// Create a store from client options.
    ///
    /// Persists to `options.storage_dir` when set, otherwise keeps the
    /// session and cache in memory.
    pub fn new(options: &ClientOptions) -> Result<Self> {
        let api = ParkingApi::new(&options.base_url, options.http_client()?);
        let storage: Arc<dyn Storage> = match &options.storage_dir {
            Some(dir) => Arc::new(FileStorage::new(dir)),
            None => Arc::new(MemoryStorage::new()),
        };
        Ok(Self::with_parts(api, storage, Arc::new(SystemClock)))
    }

    /// Create a store from explicit collaborators
    pub fn with_parts(api: ParkingApi, storage: Arc<dyn Storage>, clock: Arc<dyn Clock>) -> Self {
        let (events, _) = broadcast::channel(64);
        let state = StoreState::new(&clock.now());
        Self {
            api,
            tokens: TokenStore::new(storage.clone()),
            cache: OfflineCache::new(storage),
            clock,
            state: RwLock::new(state),
            events,
        }
    }

    /// Receive a notification after every state change
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn token_store(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn cache(&self) -> &OfflineCache {
        &self.cache
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn update<R>(&self, event: StoreEvent, f: impl FnOnce(&mut StoreState) -> R) -> R {
        let result = {
            let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
            f(&mut state)
        };
        // No subscribers is fine
        let _ = self.events.send(event);
        result
    }

    fn fail(&self, message: impl Into<String>) {
        let message = message.into();
        self.update(StoreEvent::Status, |s| s.error = message);
    }

    fn token(&self) -> Option<String> {
        self.read()
            .session
            .as_ref()
            .filter(|s| s.has_token())
            .map(|s| s.token.clone())
    }

    fn require_token(&self) -> Result<String> {
        self.token().ok_or_else(|| {
            self.fail(MSG_NOT_AUTHENTICATED);
            Error::auth(MSG_NOT_AUTHENTICATED)
        })
    }

    /// Copy of the whole state
    pub fn snapshot(&self) -> StoreState {
        self.read().clone()
    }

    pub fn phase(&self) -> Phase {
        self.read().phase()
    }

    pub fn session(&self) -> Option<Session> {
        self.read().session.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_authenticated()
    }

    pub fn has_loaded(&self) -> bool {
        self.read().has_loaded
    }

    pub fn data(&self) -> StoreData {
        self.read().data.clone()
    }

    pub fn account(&self) -> Account {
        self.read().data.account.clone()
    }

    pub fn draft(&self) -> RegistrationDraft {
        self.read().draft.clone()
    }

    pub fn error(&self) -> String {
        self.read().error.clone()
    }

    pub fn remaining_all_day(&self) -> i64 {
        self.read().remaining_all_day()
    }

    pub fn is_registration_form_valid(&self) -> bool {
        self.read().is_registration_form_valid()
    }

    pub fn is_profile_incomplete(&self) -> bool {
        self.read().is_profile_incomplete()
    }

    /// Rehydrate the session persisted by a previous run
    pub fn load_auth_from_storage(&self) {
        let session = self.tokens.load();
        debug!("Session restored from storage: {}", session.is_some());
        self.update(StoreEvent::Session, |s| s.session = session);
    }

    /// Exchange a PIN for a session and persist it. A failed attempt also
    /// discards any previously persisted session.
    pub async fn login(&self, pin: &str) -> Result<()> {
        let pin = pin.trim();
        if pin.chars().count() < 2 {
            self.fail(MSG_INVALID_PIN);
            return Err(Error::validation(MSG_INVALID_PIN));
        }

        self.update(StoreEvent::Session, |s| {
            s.authenticating = true;
            s.loading = true;
            s.error.clear();
        });

        let result = self.api.login(pin).await.and_then(|response| {
            if let Some(code) = response.status_code.filter(|c| *c != crate::api::STATUS_OK) {
                return Err(Error::Rejected {
                    status_code: code,
                    message: response.message,
                });
            }
            if !response.session.has_token() {
                return Err(Error::auth("login response did not include a token"));
            }
            Ok(response.session)
        });

        match result {
            Ok(session) => {
                if let Err(e) = self.tokens.save(&session) {
                    warn!("Failed to persist session: {}", e);
                }
                info!("Logged in");
                self.update(StoreEvent::Session, |s| {
                    s.session = Some(session);
                    s.authenticating = false;
                    s.loading = false;
                    s.has_loaded = false;
                });
                Ok(())
            }
            Err(e) => {
                error!("Login failed: {}", e);
                if let Err(clear_err) = self.tokens.clear() {
                    warn!("Failed to clear persisted session: {}", clear_err);
                }
                self.update(StoreEvent::Session, |s| {
                    s.session = None;
                    s.authenticating = false;
                    s.loading = false;
                    s.error = MSG_LOGIN_FAILED.to_string();
                });
                Err(e)
            }
        }
    }

    /// Load everything when authenticated; otherwise do nothing
    pub async fn get_data(&self) -> Result<()> {
        if !self.is_authenticated() {
            return Ok(());
        }
        self.load_all().await
    }

    /// Fetch account, history, makes and rules together.
    ///
    /// The first failure cancels the rest. On failure, whatever the offline
    /// cache holds is adopted instead; only when it holds nothing is the
    /// failure surfaced.
    pub async fn load_all(&self) -> Result<()> {
        let token = self.require_token()?;

        self.update(StoreEvent::Status, |s| {
            s.loading = true;
            s.error.clear();
        });

        let fetched = tokio::try_join!(
            checked(self.api.get_account(&token)),
            checked(self.api.get_history(&token)),
            checked(self.api.get_makes(&token)),
            checked(self.api.get_rules(&token)),
        );

        match fetched {
            Ok((account, history, makes, rules)) => {
                let account = account.data;
                let history = history.data;
                let makes = makes.data;
                let rules = rules.data.and_then(|r| r.rules);

                if let Some(account) = &account {
                    self.cache.write(CacheKey::Account, account);
                }
                if let Some(history) = &history {
                    self.cache.write(CacheKey::History, history);
                }
                if let Some(makes) = &makes {
                    self.cache.write(CacheKey::Makes, makes);
                }
                if let Some(rules) = &rules {
                    self.cache.write(CacheKey::Rules, rules);
                }

                self.adopt(account, history, makes, rules);
                info!("Loaded account data");
                Ok(())
            }
            Err(e) => {
                warn!("Live load failed, trying offline cache: {}", e);

                let account = self.cache.read_as::<Account>(CacheKey::Account);
                let history = self.cache.read_as::<Vec<HistoryEntry>>(CacheKey::History);
                let makes = self.cache.read_as::<Vec<VehicleMake>>(CacheKey::Makes);
                let rules = self.cache.read_as::<String>(CacheKey::Rules);

                if account.is_none() && history.is_none() && makes.is_none() && rules.is_none() {
                    error!("Load failed and the offline cache is empty: {}", e);
                    self.update(StoreEvent::Status, |s| {
                        s.loading = false;
                        s.error = MSG_LOAD_FAILED.to_string();
                    });
                    return Err(e);
                }

                warn!("Serving account data from the offline cache");
                self.adopt(account, history, makes, rules);
                Ok(())
            }
        }
    }

    fn adopt(
        &self,
        account: Option<Account>,
        history: Option<Vec<HistoryEntry>>,
        makes: Option<Vec<VehicleMake>>,
        rules: Option<String>,
    ) {
        self.update(StoreEvent::Data, |s| {
            if let Some(account) = account {
                s.data.account = account;
            }
            if let Some(history) = history {
                s.data.history = history;
            }
            if let Some(makes) = makes {
                s.data.makes = makes;
            }
            if let Some(rules) = rules {
                s.data.rules = rules;
            }
            s.has_loaded = true;
            s.loading = false;
            s.error.clear();
        });
    }

    async fn refresh_makes(&self, token: &str) -> Result<Vec<VehicleMake>> {
        let makes = checked(self.api.get_makes(token))
            .await?
            .data
            .unwrap_or_default();
        self.cache.write(CacheKey::Makes, &makes);
        let copy = makes.clone();
        self.update(StoreEvent::Data, |s| s.data.makes = copy);
        Ok(makes)
    }

    /// Pre-fill make and model from a previous registration of `plate`.
    ///
    /// Failures are logged and never block the form.
    pub async fn resolve_plate(&self, plate: &str) {
        let plate = plate.trim();
        if plate.is_empty() {
            return;
        }
        let Some(token) = self.token() else {
            debug!("Skipping plate lookup without a session");
            return;
        };
        if let Err(e) = self.try_resolve_plate(&token, plate).await {
            warn!("Plate-wise lookup failed: {}", e);
        }
    }

    async fn try_resolve_plate(&self, token: &str, plate: &str) -> Result<()> {
        let records = checked(self.api.get_plate_wise_data(token, plate))
            .await?
            .data
            .unwrap_or_default();
        let Some(hit) = records.into_iter().next() else {
            return Ok(());
        };

        let mut makes = self.read().data.makes.clone();
        if makes.is_empty() {
            makes = self.refresh_makes(token).await?;
        }

        let make_name = hit
            .make_id
            .and_then(|id| makes.iter().find(|m| m.id == id))
            .map(|m| m.name.clone())
            .filter(|name| !name.is_empty());
        let model = hit.model.filter(|m| !m.trim().is_empty());

        self.update(StoreEvent::Draft, |s| {
            if let Some(name) = make_name {
                s.draft.make = name;
            }
            if let Some(model) = model {
                s.draft.model = model;
            }
        });
        Ok(())
    }

    /// Submit the current draft.
    ///
    /// Steps run strictly in order and stop at the first failure: session
    /// check, form and schedule check, make resolution (creating the make
    /// when the catalog lacks it), start/end computation, save, then a
    /// refresh of account and history.
    pub async fn submit_registration(&self) -> Result<()> {
        let token = self.require_token()?;

        let (draft, read_rules, account) = {
            let s = self.read();
            (s.draft.clone(), s.read_rules, s.data.account.clone())
        };

        let input_errors = InputErrors::check(&draft, read_rules);
        if input_errors.any() {
            self.update(StoreEvent::Draft, |s| {
                s.input_errors = input_errors;
                s.error = MSG_INCOMPLETE_FORM.to_string();
            });
            return Err(Error::validation(MSG_INCOMPLETE_FORM));
        }

        // Reject an impossible schedule before any make is created remotely
        if let Err(e) = draft
            .start_time(self.clock.now())
            .and_then(|start| draft.end_time(start))
        {
            self.fail(e.user_message(MSG_INCOMPLETE_FORM));
            return Err(e);
        }

        self.update(StoreEvent::Status, |s| {
            s.submitting = true;
            s.error.clear();
            s.confirmation_message.clear();
            s.input_errors = InputErrors::default();
        });

        match self.save_draft(&token, &draft, &account).await {
            Ok(message) => {
                info!("Registration saved for plate {}", draft.plate.trim());
                let now = self.clock.now();
                self.update(StoreEvent::Draft, |s| {
                    s.confirmation_message = message;
                    s.show_confirmation = true;
                    s.reset_draft(&now);
                });
                self.refresh_after_save(&token).await;
                self.update(StoreEvent::Status, |s| s.submitting = false);
                Ok(())
            }
            Err(e) => {
                error!("Registration failed: {}", e);
                let message = e.user_message(MSG_SUBMIT_FAILED);
                self.update(StoreEvent::Status, |s| {
                    s.submitting = false;
                    s.error = message;
                });
                Err(e)
            }
        }
    }

    async fn save_draft(
        &self,
        token: &str,
        draft: &RegistrationDraft,
        account: &Account,
    ) -> Result<String> {
        let make_id = self.resolve_make_id(token, draft.make.trim()).await?;

        let now = self.clock.now();
        let start = draft.start_time(now)?;
        let end = draft.end_time(start)?;

        let payload = RegistrationPayload {
            account: account.recognized(),
            start_date: datetime::format_date_only(&start),
            is_read_rules: true,
            plate_no: draft.plate.trim().to_string(),
            make_id,
            model: draft.model.trim().to_string(),
            parking_for: PARKING_FOR.to_string(),
            start_time: datetime::format_time_ampm(&start),
            end_time: datetime::format_time_ampm(&end),
            end_date: datetime::format_date_only(&end),
            no_qty: draft.days,
            apply_time: datetime::format_apply_time(&now),
        };

        let saved = checked(self.api.save_registration(token, &payload)).await?;
        Ok(saved
            .message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| MSG_REGISTRATION_CREATED.to_string()))
    }

    async fn resolve_make_id(&self, token: &str, name: &str) -> Result<i64> {
        let existing = find_make(&self.read().data.makes, name);
        if let Some(id) = existing {
            return Ok(id);
        }

        info!("Vehicle make {:?} not in catalog, creating it", name);
        let created = self.api.create_vehicle_make(token, name).await?;
        if !created.is_success() {
            return Err(Error::resolution(format!(
                "Could not create vehicle make \"{}\".",
                name
            )));
        }

        let makes = self.refresh_makes(token).await?;
        find_make(&makes, name).ok_or_else(|| {
            Error::resolution(format!(
                "Vehicle make \"{}\" was created but could not be found.",
                name
            ))
        })
    }

    async fn refresh_after_save(&self, token: &str) {
        let (account, history) = tokio::join!(
            checked(self.api.get_account(token)),
            checked(self.api.get_history(token)),
        );

        match account {
            Ok(envelope) => {
                if let Some(account) = envelope.data {
                    self.cache.write(CacheKey::Account, &account);
                    self.update(StoreEvent::Data, |s| s.data.account = account);
                }
            }
            Err(e) => warn!("Account refresh after save failed: {}", e),
        }

        match history {
            Ok(envelope) => {
                if let Some(history) = envelope.data {
                    self.cache.write(CacheKey::History, &history);
                    self.update(StoreEvent::Data, |s| s.data.history = history);
                }
            }
            Err(e) => warn!("History refresh after save failed: {}", e),
        }
    }

    /// Update the resident's name, email and phone
    pub async fn save_profile(&self, update: ProfileUpdate) -> Result<()> {
        let token = self.require_token()?;

        let name = update.name.trim();
        let email = update.email.trim();
        let phone = update.phone.trim();
        if name.is_empty() || email.is_empty() || phone.is_empty() {
            self.fail(MSG_PROFILE_REQUIRED);
            return Err(Error::validation(MSG_PROFILE_REQUIRED));
        }

        let mut account = self.account();
        account.name = Some(name.to_string());
        account.email = Some(email.to_string());
        account.phone = Some(phone.to_string());

        self.update(StoreEvent::Status, |s| {
            s.loading = true;
            s.error.clear();
        });

        match checked(self.api.save_my_account(&token, &account)).await {
            Ok(_) => {
                info!("Profile saved");
                self.cache.write(CacheKey::Account, &account);
                self.update(StoreEvent::Data, |s| {
                    s.data.account = account;
                    s.loading = false;
                });
                Ok(())
            }
            Err(e) => {
                error!("Profile save failed: {}", e);
                let message = e.user_message(MSG_PROFILE_FAILED);
                self.update(StoreEvent::Status, |s| {
                    s.loading = false;
                    s.error = message;
                });
                Err(e)
            }
        }
    }

    /// Ask the server to email a recovery code; returns the server's message
    pub async fn send_recovery_email(&self, email: &str) -> Result<Option<String>> {
        let email = email.trim();
        if email.is_empty() {
            self.fail(MSG_EMAIL_REQUIRED);
            return Err(Error::validation(MSG_EMAIL_REQUIRED));
        }

        self.update(StoreEvent::Status, |s| s.error.clear());
        match checked(self.api.send_recovery_email(email)).await {
            Ok(envelope) => Ok(envelope.message),
            Err(e) => {
                error!("Recovery email failed: {}", e);
                self.fail(e.user_message(MSG_RECOVERY_FAILED));
                Err(e)
            }
        }
    }

    /// Check a one-time code from the recovery email
    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<()> {
        let (email, otp) = (email.trim(), otp.trim());
        if email.is_empty() || otp.is_empty() {
            self.fail(MSG_OTP_FAILED);
            return Err(Error::validation(MSG_OTP_FAILED));
        }

        self.update(StoreEvent::Status, |s| s.error.clear());
        match checked(self.api.verify_otp(email, otp)).await {
            Ok(_) => Ok(()),
            Err(e) => {
                error!("OTP verification failed: {}", e);
                self.fail(e.user_message(MSG_OTP_FAILED));
                Err(e)
            }
        }
    }

    /// Edit the draft in place
    pub fn update_draft(&self, f: impl FnOnce(&mut RegistrationDraft)) {
        self.update(StoreEvent::Draft, |s| f(&mut s.draft));
    }

    pub fn set_read_rules(&self, read: bool) {
        self.update(StoreEvent::Draft, |s| {
            s.read_rules = read;
            if read {
                s.input_errors.read_rules = false;
            }
        });
    }

    pub fn dismiss_confirmation(&self) {
        self.update(StoreEvent::Status, |s| {
            s.show_confirmation = false;
            s.confirmation_message.clear();
        });
    }

    /// Restore the empty form
    pub fn reset_draft(&self) {
        let now = self.clock.now();
        self.update(StoreEvent::Draft, |s| s.reset_draft(&now));
    }

    /// Start a new draft from a past registration
    pub fn repeat_from_history(&self, entry: &HistoryEntry) {
        self.update(StoreEvent::Draft, |s| {
            s.draft.repeat(entry);
            s.read_rules = false;
            s.input_errors = InputErrors::default();
        });
    }

    /// Forget the session, the offline cache and all loaded state
    pub fn logout(&self) {
        if let Err(e) = self.tokens.clear() {
            warn!("Failed to clear persisted session: {}", e);
        }
        self.cache.clear_all();

        let fresh = StoreState::new(&self.clock.now());
        self.update(StoreEvent::Session, |s| *s = fresh);
        info!("Logged out");
    }
}
