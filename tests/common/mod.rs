#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{json, Value};
use std::sync::Arc;
use visitor_parking_client::api::ParkingApi;
use visitor_parking_client::auth::{Session, TokenStore};
use visitor_parking_client::config::ClientOptions;
use visitor_parking_client::datetime::FixedClock;
use visitor_parking_client::storage::MemoryStorage;
use visitor_parking_client::store::ParkingStore;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "abc";

/// 2025-08-09 13:40 local time
pub fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 8, 9)
        .unwrap()
        .and_hms_opt(13, 40, 0)
        .unwrap()
}

pub fn store_for(server: &MockServer) -> (ParkingStore, Arc<MemoryStorage>) {
    let options = ClientOptions::new(&server.uri());
    let api = ParkingApi::new(&options.base_url, options.http_client().unwrap());
    let storage = Arc::new(MemoryStorage::new());
    let store = ParkingStore::with_parts(api, storage.clone(), Arc::new(FixedClock(now())));
    (store, storage)
}

/// A store whose session was restored from storage
pub fn signed_in_store(server: &MockServer) -> (ParkingStore, Arc<MemoryStorage>) {
    let (store, storage) = store_for(server);
    TokenStore::new(storage.clone())
        .save(&Session::new(TOKEN))
        .unwrap();
    store.load_auth_from_storage();
    (store, storage)
}

pub fn ok(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "StatusCode": 200, "Data": data }))
}

pub fn account_json() -> Value {
    json!({
        "PinNo": "1234",
        "PinId": 42,
        "Name": "Jane Resident",
        "SuiteNo": "1205",
        "Email": "jane@example.com",
        "Phone": "555-0100",
        "AllocateDay": 10,
        "AllocateNight": 4,
        "AllocateAllDay": 6,
        "TakenDay": 2,
        "TakenNight": 0,
        "TakenAllDay": 1,
        "ParkingMonth": "August",
        "BuildingCode": "N1"
    })
}

pub fn history_json() -> Value {
    json!([
        { "PlateNo": "ABC123", "Make": "Honda", "Model": "Civic", "StartDate": "2025-7-1" }
    ])
}

pub fn makes_json() -> Value {
    json!([{ "Id": 1, "Name": "Honda" }, { "Id": 2, "Name": "Ford" }])
}

/// Mount the bulk endpoints; the makes catalog is skipped when `None`
pub async fn mount_load(server: &MockServer, account: Value, history: Value, makes: Option<Value>) {
    let bearer = format!("Bearer {}", TOKEN);

    Mock::given(method("GET"))
        .and(path("/visitorparking/get"))
        .and(header("Authorization", bearer.as_str()))
        .respond_with(ok(account))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/previousparking/getpreviousparking"))
        .and(header("Authorization", bearer.as_str()))
        .respond_with(ok(history))
        .mount(server)
        .await;
    if let Some(makes) = makes {
        Mock::given(method("GET"))
            .and(path("/visitorparking/getmake"))
            .and(header("Authorization", bearer.as_str()))
            .respond_with(ok(makes))
            .mount(server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/buildingrules/get"))
        .and(header("Authorization", bearer.as_str()))
        .respond_with(ok(json!({ "Rules": "Visitors may stay 24 hours." })))
        .mount(server)
        .await;
}
