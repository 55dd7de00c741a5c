//! Route guard driven by the store's session and profile state

use log::error;

use crate::store::ParkingStore;

/// Pages of the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Registration,
    History,
    Account,
}

/// Reason attached when a resident must finish their profile first
pub const REASON_COMPLETE_PROFILE: &str = "complete-profile";

/// Outcome of a navigation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Allow,
    Redirect {
        to: Route,
        reason: Option<&'static str>,
    },
}

impl Navigation {
    fn redirect(to: Route) -> Self {
        Navigation::Redirect { to, reason: None }
    }
}

/// Decide whether `to` may be shown.
///
/// Restores the persisted session when none is in memory and loads the
/// account when it has not been loaded, since profile completeness
/// depends on it.
pub async fn guard(store: &ParkingStore, to: Route) -> Navigation {
    if store.session().is_none() {
        store.load_auth_from_storage();
    }
    let authed = store.is_authenticated();

    if to == Route::Login {
        return if authed {
            Navigation::redirect(Route::Registration)
        } else {
            Navigation::Allow
        };
    }

    if !authed {
        return Navigation::redirect(Route::Login);
    }

    if !store.has_loaded() {
        if let Err(e) = store.get_data().await {
            error!("Failed to load account data: {}", e);
        }
    }

    if store.is_profile_incomplete() && to != Route::Account {
        return Navigation::Redirect {
            to: Route::Account,
            reason: Some(REASON_COMPLETE_PROFILE),
        };
    }

    Navigation::Allow
}
