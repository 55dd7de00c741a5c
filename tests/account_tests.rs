mod common;

use common::*;
use serde_json::json;
use visitor_parking_client::api::ProfileUpdate;
use visitor_parking_client::cache::{CacheKey, OfflineCache};
use visitor_parking_client::error::Error;
use visitor_parking_client::store::{MSG_EMAIL_REQUIRED, MSG_OTP_FAILED, MSG_PROFILE_REQUIRED};
use wiremock::matchers::{any, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_save_profile_updates_account() {
    let mock_server = MockServer::start().await;
    let mut incomplete = account_json();
    incomplete["Phone"] = json!("");
    mount_load(&mock_server, incomplete, history_json(), Some(makes_json())).await;

    Mock::given(method("POST"))
        .and(path("/myaccount/save"))
        .and(header("Authorization", "Bearer abc"))
        .and(body_partial_json(json!({
            "PinNo": "1234",
            "Name": "Jane Resident",
            "Email": "jane@example.com",
            "Phone": "555-0199",
            "BuildingCode": "N1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "StatusCode": 200 })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (store, storage) = signed_in_store(&mock_server);
    store.load_all().await.unwrap();
    assert!(store.is_profile_incomplete());

    store
        .save_profile(ProfileUpdate {
            name: "Jane Resident".to_string(),
            email: "jane@example.com".to_string(),
            phone: " 555-0199 ".to_string(),
        })
        .await
        .unwrap();

    assert!(!store.is_profile_incomplete());
    assert_eq!(store.account().phone.as_deref(), Some("555-0199"));
    let cached = OfflineCache::new(storage).read(CacheKey::Account).unwrap();
    assert_eq!(cached["Phone"], "555-0199");
}

#[tokio::test]
async fn test_save_profile_requires_all_fields() {
    let mock_server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (store, _) = signed_in_store(&mock_server);
    let result = store
        .save_profile(ProfileUpdate {
            name: "Jane".to_string(),
            email: String::new(),
            phone: "555-0100".to_string(),
        })
        .await;

    assert!(matches!(result, Err(Error::Validation(_))));
    assert_eq!(store.error(), MSG_PROFILE_REQUIRED);
}

#[tokio::test]
async fn test_send_recovery_email_is_unauthenticated() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/login/sendemail/"))
        .and(query_param("email", "jane+visitor@example.com"))
        .and(wiremock::matchers::header_exists("Authorization"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/login/sendemail/"))
        .and(query_param("email", "jane+visitor@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "StatusCode": 200,
            "Message": "OTP sent"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (store, _) = signed_in_store(&mock_server);
    let message = store
        .send_recovery_email("jane+visitor@example.com")
        .await
        .unwrap();

    assert_eq!(message.as_deref(), Some("OTP sent"));
}

#[tokio::test]
async fn test_send_recovery_email_requires_address() {
    let mock_server = MockServer::start().await;
    let (store, _) = store_for(&mock_server);

    assert!(store.send_recovery_email("  ").await.is_err());
    assert_eq!(store.error(), MSG_EMAIL_REQUIRED);
}

#[tokio::test]
async fn test_verify_otp() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/login/verifyotp"))
        .and(query_param("email", "jane@example.com"))
        .and(query_param("otp", "482910"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "StatusCode": 200 })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/login/verifyotp"))
        .and(query_param("otp", "000000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "StatusCode": 400 })))
        .mount(&mock_server)
        .await;

    let (store, _) = store_for(&mock_server);
    store.verify_otp("jane@example.com", "482910").await.unwrap();
    assert_eq!(store.error(), "");

    let result = store.verify_otp("jane@example.com", "000000").await;
    assert!(matches!(result, Err(Error::Rejected { status_code: 400, .. })));
    assert_eq!(store.error(), MSG_OTP_FAILED);
}
