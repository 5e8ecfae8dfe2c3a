//! Root client and read-side resource facades.
//!
//! # Design
//! `TranslatorClient` owns one `Transport`; every facade borrows it and
//! holds nothing else, so facades are free to create and discard. User
//! supplied path segments are percent-encoded with `segment` before they
//! reach a URL.

use std::sync::Arc;

use crate::admin::AdminClient;
use crate::config::ClientConfig;
use crate::envelope::JsonResponse;
use crate::error::Result;
use crate::http::HttpExecutor;
use crate::transport::{ApiRequest, Transport};
use crate::types::{
    Brand, Folder, Format, Health, Language, RevisionInfo, Scope, TranslationBundle,
    TranslationValueResult,
};

pub(crate) fn segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

/// Entry point for the translator API.
#[derive(Debug, Clone)]
pub struct TranslatorClient {
    transport: Transport,
}

impl TranslatorClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            transport: Transport::new(config),
        }
    }

    /// Client over a caller-supplied executor, e.g. a scripted one in tests.
    pub fn with_executor(config: ClientConfig, executor: Arc<dyn HttpExecutor>) -> Self {
        Self {
            transport: Transport::with_executor(config, executor),
        }
    }

    pub fn from_transport(transport: Transport) -> Self {
        Self { transport }
    }

    pub fn config(&self) -> &ClientConfig {
        self.transport.config()
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn health(&self) -> HealthClient<'_> {
        HealthClient { http: &self.transport }
    }

    pub fn languages(&self) -> LanguagesClient<'_> {
        LanguagesClient { http: &self.transport }
    }

    pub fn brands(&self) -> BrandsClient<'_> {
        BrandsClient { http: &self.transport }
    }

    pub fn folders(&self) -> FoldersClient<'_> {
        FoldersClient { http: &self.transport }
    }

    pub fn translations(&self) -> TranslationsClient<'_> {
        TranslationsClient { http: &self.transport }
    }

    pub fn admin(&self) -> AdminClient<'_> {
        AdminClient::new(&self.transport)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HealthClient<'a> {
    http: &'a Transport,
}

impl HealthClient<'_> {
    pub fn get(&self) -> Result<Health> {
        self.http.request_typed(ApiRequest::get("/v1/health"))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LanguagesClient<'a> {
    http: &'a Transport,
}

impl LanguagesClient<'_> {
    /// Enabled languages.
    pub fn index(&self) -> Result<Vec<Language>> {
        self.http.request_data(ApiRequest::get("/v1/languages"))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BrandsClient<'a> {
    http: &'a Transport,
}

impl BrandsClient<'_> {
    pub fn index(&self) -> Result<Vec<Brand>> {
        self.http.request_data(ApiRequest::get("/v1/brands"))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FoldersClient<'a> {
    http: &'a Transport,
}

impl FoldersClient<'_> {
    pub fn index(&self) -> Result<Vec<Folder>> {
        self.http.request_data(ApiRequest::get("/v1/folders"))
    }
}

/// Parameters for `GET /v1/translations`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationsQuery {
    pub lang: String,
    pub folder: Option<String>,
    pub format: Format,
    pub scope: Scope,
    /// Previously seen `ETag`; the server answers 304 when it still matches.
    pub if_none_match: Option<String>,
}

impl Default for TranslationsQuery {
    fn default() -> Self {
        Self {
            lang: "en".to_string(),
            folder: None,
            format: Format::default(),
            scope: Scope::default(),
            if_none_match: None,
        }
    }
}

impl TranslationsQuery {
    pub fn lang(lang: impl Into<String>) -> Self {
        Self {
            lang: lang.into(),
            ..Self::default()
        }
    }

    pub fn folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn if_none_match(mut self, etag: impl Into<String>) -> Self {
        self.if_none_match = Some(etag.into());
        self
    }

    fn to_request(&self) -> ApiRequest {
        let mut req = ApiRequest::get("/v1/translations")
            .query("lang", &self.lang)
            .query("format", self.format.as_str())
            .query("scope", self.scope.as_str());
        if let Some(folder) = self.folder.as_deref().filter(|f| !f.is_empty()) {
            req = req.query("folder", folder);
        }
        if let Some(etag) = self.if_none_match.as_deref().filter(|e| !e.is_empty()) {
            req = req.header("If-None-Match", etag);
        }
        req
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TranslationsClient<'a> {
    http: &'a Transport,
}

impl TranslationsClient<'_> {
    pub fn revision(&self) -> Result<RevisionInfo> {
        let json = self.http.request_json(ApiRequest::get("/v1/translations/revision"))?;
        Ok(RevisionInfo::from_response(&json))
    }

    /// Raw envelope for a listing; a 304 comes back with `json == None`.
    pub fn index_response(&self, query: &TranslationsQuery) -> Result<JsonResponse> {
        self.http.request_json_response(query.to_request())
    }

    /// Listing as a bundle, or `None` when the server answered 304.
    pub fn index(&self, query: &TranslationsQuery) -> Result<Option<TranslationBundle>> {
        let response = self.index_response(query)?;
        if response.is_not_modified() {
            return Ok(None);
        }
        let json = response.json.clone().unwrap_or_default();
        Ok(Some(TranslationBundle::from_response(&json, response.etag())))
    }

    pub fn show(&self, folder: &str, key: &str, lang: &str) -> Result<TranslationValueResult> {
        let path = format!("/v1/translations/{}/{}", segment(folder), segment(key));
        let json = self.http.request_json(ApiRequest::get(path).query("lang", lang))?;
        Ok(TranslationValueResult::from_response(&json))
    }
}
