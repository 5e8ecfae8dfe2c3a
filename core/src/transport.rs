//! The single chokepoint for outbound calls.
//!
//! # Design
//! `Transport` owns the configuration and the executor. It turns an
//! `ApiRequest` into a concrete `HttpRequest` (URL join, default headers,
//! tenant header, JSON body), runs it through the executor exactly once
//! and classifies the outcome:
//!
//! - no response: `Error::Network`
//! - status >= 400: `Error::Api` with the body's `message` when present
//! - undecodable body on a JSON read: `Error::Api` with `INVALID_JSON_MESSAGE`
//!
//! Transport carries no per-call state, so clones (and every resource
//! facade borrowing it) can be used from several threads at once.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::envelope::JsonResponse;
use crate::error::{decode_json_or_none, ApiError, Result};
use crate::http::{HttpExecutor, HttpMethod, HttpRequest, HttpResponse, UreqExecutor};

/// A call relative to the configured base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub json: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            json: None,
            headers: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }
}

#[derive(Clone)]
pub struct Transport {
    config: Arc<ClientConfig>,
    executor: Arc<dyn HttpExecutor>,
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Transport {
    /// Transport over a `ureq` agent built from `config`.
    pub fn new(config: ClientConfig) -> Self {
        let executor = UreqExecutor::new(&config);
        Self::with_executor(config, Arc::new(executor))
    }

    /// Transport over a caller-supplied executor.
    pub fn with_executor(config: ClientConfig, executor: Arc<dyn HttpExecutor>) -> Self {
        Self {
            config: Arc::new(config),
            executor,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Resolve `request` into the exact request the executor will send.
    pub fn build_request(&self, request: &ApiRequest) -> HttpRequest {
        let url = format!(
            "{}/{}",
            self.config.base(),
            request.path.trim_start_matches('/')
        );

        let mut headers = vec![("Accept".to_string(), "application/json".to_string())];
        if let Some(agent) = &self.config.user_agent {
            headers.push(("User-Agent".to_string(), agent.clone()));
        }
        for (name, value) in &request.headers {
            set_header(&mut headers, name, value);
        }

        if let Some(key) = self.config.active_tenant_key() {
            let scheme = self.config.auth_scheme;
            if !has_header(&headers, scheme.header_name()) {
                headers.push((scheme.header_name().to_string(), scheme.header_value(key)));
            }
        }

        let body = request.json.as_ref().map(Value::to_string);
        if body.is_some() && !has_header(&headers, "Content-Type") {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }

        HttpRequest {
            method: request.method,
            url,
            query: request.query.clone(),
            headers,
            body,
        }
    }

    /// Send once; any status >= 400 becomes an `ApiError`.
    pub fn request(&self, request: ApiRequest) -> Result<HttpResponse> {
        let http = self.build_request(&request);
        debug!(
            method = http.method.as_str(),
            url = %http.url,
            query = http.query.len(),
            "sending request"
        );

        let response = self.executor.execute(&http)?;
        debug!(status = response.status, bytes = response.body.len(), "received response");

        if response.status >= 400 {
            let err = ApiError::from_response(response.status, &response.body);
            warn!(status = err.status, message = %err.message, url = %http.url, "api error");
            return Err(err.into());
        }

        Ok(response)
    }

    /// Decoded JSON body. An empty body yields an empty object.
    pub fn request_json(&self, request: ApiRequest) -> Result<Value> {
        let response = self.request(request)?;
        decode_body(&response)
    }

    /// Full envelope; an empty body (e.g. a 304) is not an error.
    pub fn request_json_response(&self, request: ApiRequest) -> Result<JsonResponse> {
        let response = self.request(request)?;
        if response.body.is_empty() {
            return Ok(JsonResponse::new(&response, None));
        }
        let json = decode_body(&response)?;
        Ok(JsonResponse::new(&response, Some(json)))
    }

    /// Decode the whole body into `T`.
    pub fn request_typed<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let response = self.request(request)?;
        let json = decode_body(&response)?;
        serde_json::from_value(json)
            .map_err(|_| ApiError::invalid_json(response.status, &response.body).into())
    }

    /// Decode the body's `data` member into `T`; absent or null gives `T::default()`.
    pub fn request_data<T: DeserializeOwned + Default>(&self, request: ApiRequest) -> Result<T> {
        let response = self.request(request)?;
        let json = decode_body(&response)?;
        match json.get("data") {
            None | Some(Value::Null) => Ok(T::default()),
            Some(data) => serde_json::from_value(data.clone())
                .map_err(|_| ApiError::invalid_json(response.status, &response.body).into()),
        }
    }
}

fn decode_body(response: &HttpResponse) -> Result<Value> {
    if response.body.is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    decode_json_or_none(&response.body)
        .ok_or_else(|| ApiError::invalid_json(response.status, &response.body).into())
}

fn has_header(headers: &[(String, String)], name: &str) -> bool {
    headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
}

fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    match headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
        Some(entry) => *entry = (name.to_string(), value.to_string()),
        None => headers.push((name.to_string(), value.to_string())),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use crate::error::NetworkError;

    /// Replays queued outcomes and records every request it sees.
    #[derive(Default)]
    pub(crate) struct ScriptedExecutor {
        outcomes: Mutex<VecDeque<std::result::Result<HttpResponse, NetworkError>>>,
        pub(crate) seen: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedExecutor {
        pub(crate) fn respond(self, status: u16, headers: &[(&str, &str)], body: &str) -> Self {
            self.outcomes.lock().unwrap().push_back(Ok(HttpResponse {
                status,
                headers: headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                body: body.to_string(),
            }));
            self
        }

        pub(crate) fn fail(self, err: NetworkError) -> Self {
            self.outcomes.lock().unwrap().push_back(Err(err));
            self
        }

        pub(crate) fn last(&self) -> HttpRequest {
            self.seen.lock().unwrap().last().cloned().expect("no request sent")
        }
    }

    impl HttpExecutor for ScriptedExecutor {
        fn execute(&self, request: &HttpRequest) -> std::result::Result<HttpResponse, NetworkError> {
            self.seen.lock().unwrap().push(request.clone());
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .expect("no scripted response left")
        }
    }

    pub(crate) fn transport(config: ClientConfig, executor: ScriptedExecutor) -> (Transport, Arc<ScriptedExecutor>) {
        let executor = Arc::new(executor);
        (Transport::with_executor(config, executor.clone()), executor)
    }
}
