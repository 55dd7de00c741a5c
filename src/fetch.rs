//! HTTP client adapter for the parking API

use log::debug;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, RequestBuilder,
};
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

use crate::error::{Error, HttpError};

/// Helper for building and executing HTTP requests
pub struct FetchBuilder<'a> {
    client: &'a Client,
    url: String,
    method: Method,
    headers: HeaderMap,
    query_params: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl<'a> FetchBuilder<'a> {
    /// Create a new FetchBuilder
    pub fn new(client: &'a Client, url: &str, method: Method) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Self {
            client,
            url: url.to_string(),
            method,
            headers,
            query_params: Vec::new(),
            body: None,
        }
    }

    /// Add bearer token authentication to the request.
    ///
    /// An absent or empty token leaves the request unauthenticated.
    pub fn bearer_auth(mut self, token: Option<&str>) -> Self {
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                self.headers.insert(AUTHORIZATION, value);
            }
        }
        self
    }

    /// Append a query parameter; parameters keep insertion order
    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.query_params.push((key.to_string(), value.to_string()));
        self
    }

    /// Add a JSON body to the request
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, Error> {
        let json = serde_json::to_vec(body)?;
        self.body = Some(json);
        Ok(self)
    }

    fn build(&self) -> Result<RequestBuilder, Error> {
        let mut url = Url::parse(&self.url)?;

        if !self.query_params.is_empty() {
            let mut query_pairs = url.query_pairs_mut();
            for (key, value) in &self.query_params {
                query_pairs.append_pair(key, value);
            }
        }

        debug!("{} {}", self.method, url.path());

        let mut req = self.client.request(self.method.clone(), url.as_str());
        req = req.headers(self.headers.clone());

        if let Some(body) = &self.body {
            req = req.body(body.clone());
        }

        Ok(req)
    }

    /// Execute the request and parse the response as JSON.
    ///
    /// Any non-2xx status fails with [`Error::Status`]; nothing is retried.
    pub async fn execute<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let req = self.build()?;
        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Status(HttpError::new(status.as_u16(), text)));
        }

        let result = response.json::<T>().await?;
        Ok(result)
    }
}

/// Helper for creating HTTP requests
pub struct Fetch;

impl Fetch {
    /// Create a GET request
    pub fn get<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::GET)
    }

    /// Create a POST request
    pub fn post<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::POST)
    }
}
