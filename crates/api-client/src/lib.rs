use crate::auth::{parse_wcf_date, Token};
use crate::error::ApiError;
use crate::responses::{
    ApiErrorResponse, DataRequest, DataType, DateRange, GetDataRequest, GetDataResponse,
    Instrument, Property, TokenResponse,
};
use async_trait::async_trait;
use chrono::Utc;
use configuration::DatastreamConfig;
use core_types::{Frequency, Observation, Window};
use reqwest::StatusCode;
use std::sync::Arc;
use tokio::sync::Mutex;

mod auth;
pub mod error;
pub mod mock;
pub mod responses;

// --- Public API ---
pub use mock::MockClient;

/// One request to the time-series service: an opaque expression evaluated for a
/// comma-joined list of tickers over a window of relative day offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub tickers: String,
    pub start: String,
    pub end: String,
    pub frequency: Frequency,
    pub expression: String,
}

impl QueryRequest {
    pub fn new(tickers: &[&str], window: Window, frequency: Frequency, expression: &str) -> Self {
        Self {
            tickers: tickers.join(","),
            start: window.start_param(),
            end: window.end_param(),
            frequency,
            expression: expression.to_string(),
        }
    }

    pub fn ticker_list(&self) -> impl Iterator<Item = &str> {
        self.tickers.split(',').filter(|t| !t.is_empty())
    }
}

/// The abstract interface to a time-series provider. The aggregation engine only
/// depends on this trait, so the live client and a mock can be swapped freely.
#[async_trait]
pub trait TimeSeriesClient: Send + Sync {
    /// Establishes a session. A failure here is systemic and stops a snapshot
    /// before any metric is queried.
    async fn connect(&self) -> Result<(), ApiError> {
        Ok(())
    }

    /// Executes one query and returns a value (or null) per instrument.
    async fn query(&self, request: &QueryRequest) -> Result<Observation, ApiError>;
}

/// A concrete implementation of `TimeSeriesClient` for the Datastream Web Service.
#[derive(Clone)]
pub struct DatastreamClient {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    token: Arc<Mutex<Option<Token>>>,
}

impl DatastreamClient {
    pub fn new(config: &DatastreamConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Http(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            token: Arc::new(Mutex::new(None)),
        })
    }

    /// Returns a valid session token, requesting a new one when the cached token
    /// is missing or about to expire.
    async fn token(&self) -> Result<String, ApiError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.is_valid_at(Utc::now()) {
                return Ok(token.value.clone());
            }
        }

        let fresh = self.request_token().await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    async fn request_token(&self) -> Result<Token, ApiError> {
        let url = format!("{}/GetToken", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("username", &self.username), ("password", &self.password)])
            .send()
            .await
            .map_err(token_failure)?;
        let status = response.status();
        let text = response.text().await.map_err(token_failure)?;

        if !status.is_success() {
            return Err(ApiError::Authentication(fault_message(status, &text)));
        }

        let parsed: TokenResponse = serde_json::from_str(&text)
            .map_err(|e| ApiError::Authentication(format!("Unexpected token response: {e}")))?;
        let expires_at = parse_wcf_date(&parsed.token_expiry).ok_or_else(|| {
            ApiError::Deserialization(format!("Invalid token expiry: {}", parsed.token_expiry))
        })?;

        tracing::info!(%expires_at, "Obtained Datastream session token.");
        Ok(Token {
            value: parsed.token_value,
            expires_at,
        })
    }

    async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }
}

/// Any failure while obtaining a token is systemic.
fn token_failure(e: reqwest::Error) -> ApiError {
    match ApiError::from(e) {
        err @ ApiError::Unreachable(_) => err,
        other => ApiError::Authentication(other.to_string()),
    }
}

fn fault_message(status: StatusCode, text: &str) -> String {
    match serde_json::from_str::<ApiErrorResponse>(text) {
        Ok(fault) if !fault.message.is_empty() => format!("{status}: {} {}", fault.code, fault.message),
        _ => format!("{status}: {text}"),
    }
}

impl DatastreamClient {
    /// One `GetData` round trip with the given session token. A rejected token is
    /// dropped from the cache.
    async fn get_data(&self, request: &QueryRequest, token: &str) -> Result<Observation, ApiError> {
        let is_list = request.ticker_list().count() > 1;
        let body = GetDataRequest {
            data_request: DataRequest {
                data_types: vec![DataType {
                    value: &request.expression,
                    properties: None,
                }],
                date: DateRange {
                    start: &request.start,
                    end: &request.end,
                    frequency: request.frequency.code(),
                    kind: if request.start == request.end { 0 } else { 1 },
                },
                instrument: Instrument {
                    value: &request.tickers,
                    properties: is_list.then(|| {
                        vec![Property {
                            key: "IsSymbolSet".to_string(),
                            value: true,
                        }]
                    }),
                },
                tag: None,
            },
            properties: None,
            token_value: token,
        };

        let url = format!("{}/GetData", self.base_url);
        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            self.invalidate_token().await;
            return Err(ApiError::Authentication(fault_message(status, &text)));
        }
        if !status.is_success() {
            return Err(ApiError::Provider(fault_message(status, &text)));
        }

        let parsed: GetDataResponse =
            serde_json::from_str(&text).map_err(|e| ApiError::Deserialization(e.to_string()))?;

        let values: Vec<_> = parsed
            .data_response
            .data_type_values
            .into_iter()
            .next()
            .map(|dt| {
                dt.symbol_values
                    .into_iter()
                    .map(|sv| {
                        let value = sv.decimal();
                        (sv.symbol, value)
                    })
                    .collect()
            })
            .unwrap_or_default();

        if values.is_empty() {
            return Err(ApiError::EmptyResult);
        }

        tracing::debug!(
            expression = %request.expression,
            start = %request.start,
            returned = values.len(),
            "Datastream query completed."
        );
        Ok(Observation::new(values))
    }
}

#[async_trait]
impl TimeSeriesClient for DatastreamClient {
    async fn connect(&self) -> Result<(), ApiError> {
        self.token().await.map(|_| ())
    }

    /// A token the service rejects before its advertised expiry is renewed once;
    /// only a second rejection is reported as an authentication failure.
    async fn query(&self, request: &QueryRequest) -> Result<Observation, ApiError> {
        let token = self.token().await?;
        match self.get_data(request, &token).await {
            Err(ApiError::Authentication(reason)) => {
                tracing::warn!(%reason, "Session token rejected, logging in again.");
                let token = self.token().await?;
                self.get_data(request, &token).await
            }
            other => other,
        }
    }
}
