//! Typed wrappers for the parking REST endpoints

mod types;

use reqwest::Client;
use serde_json::Value;

use crate::error::Result;
use crate::fetch::Fetch;

pub use types::*;

/// Client for the parking REST API
#[derive(Debug, Clone)]
pub struct ParkingApi {
    /// Base URL every path is appended to
    base_url: String,

    /// HTTP client used for requests
    client: Client,
}

impl ParkingApi {
    pub fn new(base_url: &str, client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Exchange a PIN for a session
    pub async fn login(&self, pin: &str) -> Result<LoginResponse> {
        let body = LoginRequest {
            pinno: pin.to_string(),
        };
        Fetch::post(&self.client, &self.url("/login/user"))
            .json(&body)?
            .execute()
            .await
    }

    /// Trigger the password-recovery email
    pub async fn send_recovery_email(&self, email: &str) -> Result<Envelope<Value>> {
        Fetch::get(&self.client, &self.url("/login/sendemail/"))
            .query("email", email)
            .execute()
            .await
    }

    /// Verify a one-time code sent by email
    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<Envelope<Value>> {
        Fetch::get(&self.client, &self.url("/login/verifyotp"))
            .query("email", email)
            .query("otp", otp)
            .execute()
            .await
    }

    pub async fn save_my_account(&self, token: &str, account: &Account) -> Result<Envelope<Value>> {
        Fetch::post(&self.client, &self.url("/myaccount/save"))
            .bearer_auth(Some(token))
            .json(account)?
            .execute()
            .await
    }

    pub async fn get_account(&self, token: &str) -> Result<Envelope<Account>> {
        Fetch::get(&self.client, &self.url("/visitorparking/get"))
            .bearer_auth(Some(token))
            .execute()
            .await
    }

    pub async fn get_history(&self, token: &str) -> Result<Envelope<Vec<HistoryEntry>>> {
        Fetch::get(&self.client, &self.url("/previousparking/getpreviousparking"))
            .bearer_auth(Some(token))
            .execute()
            .await
    }

    pub async fn get_makes(&self, token: &str) -> Result<Envelope<Vec<VehicleMake>>> {
        Fetch::get(&self.client, &self.url("/visitorparking/getmake"))
            .bearer_auth(Some(token))
            .execute()
            .await
    }

    pub async fn get_rules(&self, token: &str) -> Result<Envelope<RulesData>> {
        Fetch::get(&self.client, &self.url("/buildingrules/get"))
            .bearer_auth(Some(token))
            .execute()
            .await
    }

    /// Look up prior registrations for a plate
    pub async fn get_plate_wise_data(
        &self,
        token: &str,
        plate_no: &str,
    ) -> Result<Envelope<Vec<PlateRecord>>> {
        Fetch::get(&self.client, &self.url("/visitorparking/getplatewisedata"))
            .bearer_auth(Some(token))
            .query("plateNo", plate_no)
            .execute()
            .await
    }

    /// Register a new vehicle make in the catalog
    pub async fn create_vehicle_make(&self, token: &str, name: &str) -> Result<Envelope<Value>> {
        let body = CreateVehicleRequest {
            vehicle_name: name.to_string(),
        };
        Fetch::post(&self.client, &self.url("/visitorparking/createvehicle"))
            .bearer_auth(Some(token))
            .json(&body)?
            .execute()
            .await
    }

    pub async fn save_registration(
        &self,
        token: &str,
        payload: &RegistrationPayload,
    ) -> Result<Envelope<Value>> {
        Fetch::post(&self.client, &self.url("/visitorparking/save"))
            .bearer_auth(Some(token))
            .json(payload)?
            .execute()
            .await
    }
}
