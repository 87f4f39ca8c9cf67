//! An in-memory `TimeSeriesClient` with scripted responses, used to exercise the
//! aggregation engine without a network.

use crate::error::ApiError;
use crate::{QueryRequest, TimeSeriesClient};
use async_trait::async_trait;
use core_types::{Observation, Window};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Scripted {
    Respond(Observation),
    Fail(ApiError),
}

/// Responses are keyed by `(expression, window start)`. Unscripted queries
/// return an empty observation.
#[derive(Debug, Default)]
pub struct MockClient {
    responses: HashMap<(String, String), Scripted>,
    delays: HashMap<String, Duration>,
    connect_error: Option<ApiError>,
    calls: Mutex<Vec<QueryRequest>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the values returned for `expression` at `window`.
    pub fn respond(mut self, expression: &str, window: Window, values: &[(&str, Option<Decimal>)]) -> Self {
        let observation = Observation::new(
            values
                .iter()
                .map(|(ticker, value)| (ticker.to_string(), *value))
                .collect(),
        );
        self.responses.insert(
            (expression.to_string(), window.start_param()),
            Scripted::Respond(observation),
        );
        self
    }

    /// Scripts a failure for `expression` at `window`.
    pub fn fail(mut self, expression: &str, window: Window, error: ApiError) -> Self {
        self.responses.insert(
            (expression.to_string(), window.start_param()),
            Scripted::Fail(error),
        );
        self
    }

    /// Delays every response for `expression`.
    pub fn delay(mut self, expression: &str, delay: Duration) -> Self {
        self.delays.insert(expression.to_string(), delay);
        self
    }

    /// Makes `connect` fail with `error`.
    pub fn refuse_connection(mut self, error: ApiError) -> Self {
        self.connect_error = Some(error);
        self
    }

    /// Every request received so far, in arrival order.
    pub fn calls(&self) -> Vec<QueryRequest> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TimeSeriesClient for MockClient {
    async fn connect(&self) -> Result<(), ApiError> {
        match &self.connect_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    async fn query(&self, request: &QueryRequest) -> Result<Observation, ApiError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.clone());
        }

        if let Some(delay) = self.delays.get(&request.expression) {
            tokio::time::sleep(*delay).await;
        }

        let key = (request.expression.clone(), request.start.clone());
        match self.responses.get(&key) {
            Some(Scripted::Respond(observation)) => Ok(observation.clone()),
            Some(Scripted::Fail(error)) => Err(error.clone()),
            None => Ok(Observation::default()),
        }
    }
}
