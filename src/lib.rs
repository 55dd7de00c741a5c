//! Visitor Parking Client Library
//!
//! Client-side state and synchronization for visitor-vehicle parking
//! registration: PIN login, account and history loading with an offline
//! cache fallback, and the multi-step registration submission against the
//! parking REST API.
//!
//! # Example
//!
//! ```no_run
//! use visitor_parking_client::prelude::*;
//!
//! # async fn run() -> Result<(), Error> {
//! let options = ClientOptions::new("https://parking.example.com/api")
//!     .with_storage_dir("/var/lib/parking");
//! let store = ParkingStore::new(&options)?;
//!
//! store.load_auth_from_storage();
//! if !store.is_authenticated() {
//!     store.login("1234").await?;
//! }
//! store.get_data().await?;
//!
//! store.update_draft(|draft| {
//!     draft.plate = "ABC123".to_string();
//!     draft.make = "Honda".to_string();
//! });
//! store.set_read_rules(true);
//! store.submit_registration().await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod datetime;
pub mod error;
pub mod fetch;
pub mod navigation;
pub mod storage;
pub mod store;

/// A convenience module for common imports
pub mod prelude {
    pub use crate::api::{Account, HistoryEntry, ParkingApi, ProfileUpdate, VehicleMake};
    pub use crate::auth::{Session, TokenStore};
    pub use crate::cache::{CacheKey, OfflineCache};
    pub use crate::config::ClientOptions;
    pub use crate::error::Error;
    pub use crate::navigation::{guard, Navigation, Route};
    pub use crate::store::{ParkingStore, Phase, RegistrationDraft, StoreEvent, When};
}
