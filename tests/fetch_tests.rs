use serde_json::{json, Value};
use std::time::Duration;
use visitor_parking_client::config::ClientOptions;
use visitor_parking_client::error::Error;
use visitor_parking_client::fetch::Fetch;
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_bearer_token_is_attached() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/visitorparking/createvehicle"))
        .and(header("Authorization", "Bearer abc"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({ "VehicleName": "Kia" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "StatusCode": 200 })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = reqwest::Client::new();
    let url = format!("{}/visitorparking/createvehicle", mock_server.uri());
    let result: Value = Fetch::post(&client, &url)
        .bearer_auth(Some("abc"))
        .json(&json!({ "VehicleName": "Kia" }))
        .unwrap()
        .execute()
        .await
        .unwrap();

    assert_eq!(result["StatusCode"], 200);
}

#[tokio::test]
async fn test_missing_token_sends_no_header() {
    let mock_server = MockServer::start().await;

    Mock::given(header_exists("Authorization"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/buildingrules/get"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "StatusCode": 200 })))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = reqwest::Client::new();
    let url = format!("{}/buildingrules/get", mock_server.uri());
    for token in [None, Some("")] {
        let _: Value = Fetch::get(&client, &url)
            .bearer_auth(token)
            .execute()
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_non_success_status_is_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/visitorparking/get"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Token expired"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/previousparking/getpreviousparking"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = reqwest::Client::new();

    let url = format!("{}/visitorparking/get", mock_server.uri());
    match Fetch::get(&client, &url).execute::<Value>().await {
        Err(Error::Status(e)) => {
            assert_eq!(e.status, 403);
            assert_eq!(e.body, "Token expired");
            assert!(e.detail.is_none());
        }
        other => panic!("unexpected result: {:?}", other),
    }

    let url = format!("{}/previousparking/getpreviousparking", mock_server.uri());
    match Fetch::get(&client, &url).execute::<Value>().await {
        Err(Error::Status(e)) => {
            assert_eq!(e.status, 404);
            assert_eq!(e.body, "Not Found");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_configured_timeout_is_a_transport_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/buildingrules/get"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "StatusCode": 200 }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let client = ClientOptions::new(&mock_server.uri())
        .with_request_timeout(Some(Duration::from_millis(100)))
        .http_client()
        .unwrap();
    let url = format!("{}/buildingrules/get", mock_server.uri());

    match Fetch::get(&client, &url).execute::<Value>().await {
        Err(e @ Error::Http(_)) => assert!(e.is_transport()),
        other => panic!("unexpected result: {:?}", other),
    }
}
