//! Typed client for the multi-tenant translator API.
//!
//! # Overview
//! Wraps health, languages, brands, folders and translations, both the
//! tenant-facing read surface and the `/v1/admin` write surface, behind one
//! `TranslatorClient`.
//!
//! # Design
//! - `Transport` is the only component that talks HTTP. It joins URLs,
//!   injects default and tenant headers, decodes JSON and maps failures
//!   onto the two-kind `Error` taxonomy. One attempt per call, no retries.
//! - The round-trip itself sits behind `HttpExecutor` (`ureq` by default),
//!   so tests swap in scripted responses without a network.
//! - Resource facades borrow the transport and only build paths, queries
//!   and payloads; result mappers in `types` never fail on missing fields.

pub mod admin;
pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use admin::{AdminClient, BrandsAdminClient, FoldersAdminClient, TranslationsAdminClient};
pub use client::{
    BrandsClient, FoldersClient, HealthClient, LanguagesClient, TranslationsClient,
    TranslationsQuery, TranslatorClient,
};
pub use config::{AuthScheme, ClientConfig, ConfigError};
pub use envelope::JsonResponse;
pub use error::{ApiError, Error, NetworkError, NetworkErrorKind, Result};
pub use http::{HttpExecutor, HttpMethod, HttpRequest, HttpResponse, UreqExecutor};
pub use transport::{ApiRequest, Transport};
pub use types::{
    AdminTranslation, Brand, Deleted, Folder, Format, Health, Language, RevisionInfo, Scope,
    Target, TranslationBundle, TranslationItem, TranslationValueResult, TranslationValues,
    UpsertResult,
};
