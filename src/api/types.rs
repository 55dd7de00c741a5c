//! Wire types for the parking API

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::auth::Session;
use crate::error::{Error, Result};

/// `StatusCode` value the API uses for success
pub const STATUS_OK: i64 = 200;

/// Response envelope shared by every endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(rename = "StatusCode", default)]
    pub status_code: i64,

    #[serde(rename = "Data", default = "Option::default")]
    pub data: Option<T>,

    #[serde(rename = "Message", default)]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn is_success(&self) -> bool {
        self.status_code == STATUS_OK
    }

    /// Turn a non-200 `StatusCode` into [`Error::Rejected`]
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::Rejected {
                status_code: self.status_code,
                message: self.message,
            })
        }
    }
}

/// Body of `POST /login/user`
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub pinno: String,
}

/// Login response: a session with an optional status header
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(rename = "StatusCode", default)]
    pub status_code: Option<i64>,

    #[serde(rename = "Message", default)]
    pub message: Option<String>,

    #[serde(flatten)]
    pub session: Session,
}

/// Resident account and allocation counters.
///
/// Only the recognized fields are typed; everything else the server sends
/// is kept in `extra` and sent back untouched on profile saves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Account {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin_no: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin_id: Option<Value>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suite_no: Option<Value>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient::count", skip_serializing_if = "Option::is_none")]
    pub allocate_day: Option<i64>,
    #[serde(default, deserialize_with = "lenient::count", skip_serializing_if = "Option::is_none")]
    pub allocate_night: Option<i64>,
    #[serde(default, deserialize_with = "lenient::count", skip_serializing_if = "Option::is_none")]
    pub allocate_all_day: Option<i64>,
    #[serde(default, deserialize_with = "lenient::count", skip_serializing_if = "Option::is_none")]
    pub taken_day: Option<i64>,
    #[serde(default, deserialize_with = "lenient::count", skip_serializing_if = "Option::is_none")]
    pub taken_night: Option<i64>,
    #[serde(default, deserialize_with = "lenient::count", skip_serializing_if = "Option::is_none")]
    pub taken_all_day: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parking_month: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Decoders for account fields the server does not type consistently
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Text field that may arrive as a number or bool
    pub fn string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
    }

    /// Whole-number counter that may arrive as a float or a string
    pub fn count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let whole = |f: f64| (f.is_finite() && f.fract() == 0.0).then(|| f as i64);
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(whole)),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(whole))
            }
            _ => None,
        })
    }
}

impl Account {
    /// Allocated minus taken all-day permits; may be negative
    pub fn remaining_all_day(&self) -> i64 {
        self.allocate_all_day.unwrap_or(0) - self.taken_all_day.unwrap_or(0)
    }

    /// Name, email or phone is missing
    pub fn is_profile_incomplete(&self) -> bool {
        [&self.name, &self.email, &self.phone]
            .into_iter()
            .any(|field| field.as_deref().map_or(true, |v| v.trim().is_empty()))
    }

    /// Copy holding only the recognized fields
    pub fn recognized(&self) -> Self {
        Self {
            extra: Map::new(),
            ..self.clone()
        }
    }
}

/// A past registration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HistoryEntry {
    #[serde(default)]
    pub plate_no: Option<String>,
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Vehicle make catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleMake {
    #[serde(rename = "Id")]
    pub id: i64,

    #[serde(rename = "Name", default)]
    pub name: String,
}

/// Payload of `GET /buildingrules/get`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesData {
    #[serde(rename = "Rules", default)]
    pub rules: Option<String>,
}

/// Prior registration returned by the plate lookup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlateRecord {
    #[serde(default)]
    pub make_id: Option<i64>,
    #[serde(default)]
    pub model: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `POST /visitorparking/createvehicle`
#[derive(Debug, Clone, Serialize)]
pub struct CreateVehicleRequest {
    #[serde(rename = "VehicleName")]
    pub vehicle_name: String,
}

/// Body of `POST /visitorparking/save`.
///
/// Read-only account fields are merged in alongside the computed
/// registration fields. `ProvinceId` is never sent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegistrationPayload {
    #[serde(flatten)]
    pub account: Account,

    pub start_date: String,
    pub is_read_rules: bool,
    pub plate_no: String,
    pub make_id: i64,
    pub model: String,
    pub parking_for: String,
    pub start_time: String,
    pub end_time: String,
    pub end_date: String,
    pub no_qty: u32,
    pub apply_time: String,
}

/// Profile fields editable from the account page
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn account_keeps_unknown_fields() {
        let account: Account = serde_json::from_value(json!({
            "PinNo": "1234",
            "Name": "Jane",
            "AllocateAllDay": 5,
            "TakenAllDay": 7,
            "Building": "North"
        }))
        .unwrap();

        assert_eq!(account.remaining_all_day(), -2);
        assert_eq!(account.extra.get("Building"), Some(&json!("North")));
        assert!(account.is_profile_incomplete());
        assert!(account.recognized().extra.is_empty());
    }

    #[test]
    fn account_tolerates_loosely_typed_fields() {
        let account: Account = serde_json::from_value(json!({
            "Name": "Jane",
            "Email": "jane@example.com",
            "Phone": 5550100,
            "AllocateAllDay": 6.0,
            "TakenAllDay": "2",
            "TakenDay": null,
            "AllocateDay": "ten"
        }))
        .unwrap();

        assert_eq!(account.phone.as_deref(), Some("5550100"));
        assert_eq!(account.allocate_all_day, Some(6));
        assert_eq!(account.taken_all_day, Some(2));
        assert_eq!(account.taken_day, None);
        assert_eq!(account.allocate_day, None);
        assert_eq!(account.remaining_all_day(), 4);
        assert!(!account.is_profile_incomplete());
    }

    #[test]
    fn empty_account_has_zero_remaining() {
        let account = Account::default();
        assert_eq!(account.remaining_all_day(), 0);
        assert_eq!(serde_json::to_value(&account).unwrap(), json!({}));
    }

    #[test]
    fn envelope_rejects_non_200() {
        let envelope: Envelope<Value> =
            serde_json::from_value(json!({"StatusCode": 409, "Message": "Duplicate"})).unwrap();
        match envelope.into_result() {
            Err(Error::Rejected {
                status_code,
                message,
            }) => {
                assert_eq!(status_code, 409);
                assert_eq!(message.as_deref(), Some("Duplicate"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn login_response_flattens_session() {
        let response: LoginResponse = serde_json::from_value(json!({
            "StatusCode": 200,
            "Token": "abc",
            "Name": "Jane"
        }))
        .unwrap();
        assert_eq!(response.status_code, Some(200));
        assert_eq!(response.session.token, "abc");
        assert_eq!(response.session.display_name.as_deref(), Some("Jane"));
    }
}
