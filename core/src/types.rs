//! Request and response DTOs for the translator API.
//!
//! # Design
//! Response types decode leniently: every field has a default, and the
//! `loose` field decoders map `null` to that default and coerce numeric
//! strings and 0/1 flags, so one odd row never fails a listing. The three
//! result mappers (`RevisionInfo`, `UpsertResult`, `TranslationValueResult`)
//! are total functions over `serde_json::Value` and accept numbers where
//! strings are expected; revision stamps are sometimes sent as integers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

// ---------------------------------------------------------------------------
// Query values
// ---------------------------------------------------------------------------

/// Which layer a read returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scope {
    /// Tenant overrides applied on top of base values.
    #[default]
    Merged,
    Base,
    Brand,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Merged => "merged",
            Scope::Base => "base",
            Scope::Brand => "brand",
        }
    }
}

/// Which layer an admin write applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Target {
    Base,
    #[default]
    Brand,
}

impl Target {
    pub fn as_str(self) -> &'static str {
        match self {
            Target::Base => "base",
            Target::Brand => "brand",
        }
    }
}

/// Shape of a translations listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    /// `{folder: {key: value}}`
    #[default]
    Tree,
    /// `{"folder.key": value}`
    Flat,
}

impl Format {
    pub fn as_str(self) -> &'static str {
        match self {
            Format::Tree => "tree",
            Format::Flat => "flat",
        }
    }
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Health {
    #[serde(deserialize_with = "loose::string")]
    pub status: String,
    #[serde(deserialize_with = "loose::string")]
    pub service: String,
    #[serde(deserialize_with = "loose::string")]
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Language {
    #[serde(deserialize_with = "loose::string")]
    pub code: String,
    #[serde(deserialize_with = "loose::string")]
    pub name: String,
    #[serde(deserialize_with = "loose::boolean")]
    pub is_enabled: bool,
    #[serde(deserialize_with = "loose::int")]
    pub sort_order: i64,
}

/// A tenant. `brand_key` is only present in the response to a create.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Brand {
    #[serde(deserialize_with = "loose::int")]
    pub id: i64,
    #[serde(deserialize_with = "loose::string")]
    pub code: String,
    #[serde(deserialize_with = "loose::opt_string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "loose::opt_string")]
    pub brand_key: Option<String>,
    #[serde(deserialize_with = "loose::boolean")]
    pub is_enabled: bool,
    #[serde(deserialize_with = "loose::opt_string")]
    pub created_at: Option<String>,
    #[serde(deserialize_with = "loose::opt_string")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Folder {
    #[serde(deserialize_with = "loose::int")]
    pub id: i64,
    #[serde(deserialize_with = "loose::string")]
    pub code: String,
    #[serde(deserialize_with = "loose::string")]
    pub name: String,
    /// Number of keys in the folder.
    #[serde(deserialize_with = "loose::int")]
    pub size: i64,
}

/// Outcome of an admin delete (folder or translation key).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Deleted {
    #[serde(deserialize_with = "loose::boolean")]
    pub deleted: bool,
}

/// One row of the admin translations listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AdminTranslation {
    #[serde(deserialize_with = "loose::string")]
    pub folder: String,
    #[serde(deserialize_with = "loose::string")]
    pub key: String,
    /// `None` when the key has no value in the listed layer.
    #[serde(deserialize_with = "loose::opt_string")]
    pub value: Option<String>,
    #[serde(deserialize_with = "loose::opt_string")]
    pub note: Option<String>,
}

// ---------------------------------------------------------------------------
// Translations
// ---------------------------------------------------------------------------

/// Values carried by one `TranslationItem`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationValues {
    /// Value for the language named by the enclosing upsert.
    Single(Option<String>),
    /// Language code to value. `None` clears that language.
    PerLanguage(BTreeMap<String, Option<String>>),
}

/// One key to write in an upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationItem {
    pub folder: String,
    pub key: String,
    pub values: TranslationValues,
    /// `Some("")` clears the stored note.
    pub note: Option<String>,
}

impl TranslationItem {
    /// Item with an empty per-language map; fill it with `with_value`.
    pub fn new(folder: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            key: key.into(),
            values: TranslationValues::PerLanguage(BTreeMap::new()),
            note: None,
        }
    }

    /// Item holding one value for the upsert's language.
    pub fn single(folder: impl Into<String>, key: impl Into<String>, value: Option<&str>) -> Self {
        Self {
            folder: folder.into(),
            key: key.into(),
            values: TranslationValues::Single(value.map(str::to_string)),
            note: None,
        }
    }

    /// Set the value for `lang`, converting a single-value item as needed.
    ///
    /// A single value has no language of its own, so converting one drops it.
    pub fn with_value(mut self, lang: impl Into<String>, value: Option<&str>) -> Self {
        let value = value.map(str::to_string);
        match &mut self.values {
            TranslationValues::PerLanguage(map) => {
                map.insert(lang.into(), value);
            }
            TranslationValues::Single(_) => {
                self.values = TranslationValues::PerLanguage(BTreeMap::from([(lang.into(), value)]));
            }
        }
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Values keyed by language, resolving a single value against `lang`.
    pub fn values_for(&self, lang: &str) -> BTreeMap<String, Option<String>> {
        match &self.values {
            TranslationValues::PerLanguage(map) => map.clone(),
            TranslationValues::Single(value) => BTreeMap::from([(lang.to_string(), value.clone())]),
        }
    }

    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        out.insert("folder".to_string(), json!(self.folder));
        out.insert("key".to_string(), json!(self.key));
        match &self.values {
            TranslationValues::Single(value) => {
                out.insert("value".to_string(), json!(value));
            }
            TranslationValues::PerLanguage(map) => {
                out.insert("values".to_string(), json!(map));
            }
        }
        if let Some(note) = &self.note {
            let note = (!note.is_empty()).then(|| note.clone());
            out.insert("note".to_string(), json!(note));
        }
        Value::Object(out)
    }
}

/// Revision stamps for the current tenant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevisionInfo {
    pub brand_code: String,
    pub base_revision: Option<String>,
    pub brand_revision: Option<String>,
    pub effective_revision: Option<String>,
}

impl RevisionInfo {
    pub fn from_response(json: &Value) -> Self {
        let data = data_of(json);
        Self {
            brand_code: string_field(data, "brand_code").unwrap_or_default(),
            base_revision: string_field(data, "base_revision"),
            brand_revision: string_field(data, "brand_revision"),
            effective_revision: string_field(data, "effective_revision"),
        }
    }
}

/// Outcome of an upsert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsertResult {
    pub brand_code: String,
    pub base_revision: Option<String>,
    pub brand_revision: Option<String>,
    pub effective_revision: Option<String>,
    /// Keys that did not exist in the base layer and were created there.
    pub inserted_to_base: i64,
}

impl UpsertResult {
    pub fn from_response(json: &Value) -> Self {
        let data = data_of(json);
        Self {
            brand_code: string_field(data, "brand_code").unwrap_or_default(),
            base_revision: string_field(data, "base_revision"),
            brand_revision: string_field(data, "brand_revision"),
            effective_revision: string_field(data, "effective_revision"),
            inserted_to_base: int_field(data, "inserted_to_base"),
        }
    }
}

/// A single translated value and the revision it was read at.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationValueResult {
    pub revision: String,
    pub value: Value,
}

impl TranslationValueResult {
    pub fn from_response(json: &Value) -> Self {
        Self {
            revision: string_field(json, "revision").unwrap_or_default(),
            value: json.get("value").cloned().unwrap_or(Value::Null),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.value.as_str()
    }
}

/// A full translations listing read with `TranslationsClient::index`.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationBundle {
    pub revision: String,
    /// Validator to send back as `If-None-Match`.
    pub etag: Option<String>,
    pub data: Value,
}

impl TranslationBundle {
    pub fn from_response(json: &Value, etag: Option<&str>) -> Self {
        Self {
            revision: string_field(json, "revision").unwrap_or_default(),
            etag: etag.map(str::to_string),
            data: json.get("data").cloned().unwrap_or(Value::Null),
        }
    }
}

static NULL: Value = Value::Null;

fn data_of(json: &Value) -> &Value {
    match json.get("data") {
        Some(data @ Value::Object(_)) => data,
        _ => &NULL,
    }
}

fn string_field(json: &Value, name: &str) -> Option<String> {
    coerce_string(json.get(name)?)
}

fn int_field(json: &Value, name: &str) -> i64 {
    json.get(name).map(coerce_int).unwrap_or(0)
}

fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn coerce_int(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        Value::Bool(b) => i64::from(*b),
        _ => 0,
    }
}

fn coerce_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        _ => false,
    }
}

/// `deserialize_with` helpers that never fail on a well-formed JSON value.
///
/// `null` maps to the field's default; numbers, numeric strings and 0/1
/// flags are coerced the way the result mappers above coerce them.
mod loose {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(super::coerce_string(&Value::deserialize(d)?).unwrap_or_default())
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(super::coerce_string(&Value::deserialize(d)?))
    }

    pub fn int<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        Ok(super::coerce_int(&Value::deserialize(d)?))
    }

    pub fn boolean<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(super::coerce_bool(&Value::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_result_from_partial_data() {
        let json = json!({"data": {"brand_code": "x", "base_revision": "1", "inserted_to_base": 3}});
        let res = UpsertResult::from_response(&json);
        assert_eq!(res.brand_code, "x");
        assert_eq!(res.base_revision.as_deref(), Some("1"));
        assert_eq!(res.brand_revision, None);
        assert_eq!(res.effective_revision, None);
        assert_eq!(res.inserted_to_base, 3);
    }

    #[test]
    fn upsert_result_never_fails() {
        assert_eq!(UpsertResult::from_response(&json!({})), UpsertResult::default());
        assert_eq!(UpsertResult::from_response(&json!({"data": []})), UpsertResult::default());
        assert_eq!(UpsertResult::from_response(&json!([1, 2])), UpsertResult::default());
        assert_eq!(UpsertResult::from_response(&Value::Null), UpsertResult::default());
    }

    #[test]
    fn upsert_result_coerces_numbers() {
        let json = json!({"data": {"brand_code": "x", "base_revision": 1700000000000_i64, "inserted_to_base": "7"}});
        let res = UpsertResult::from_response(&json);
        assert_eq!(res.base_revision.as_deref(), Some("1700000000000"));
        assert_eq!(res.inserted_to_base, 7);
    }

    #[test]
    fn null_revision_is_absent() {
        let json = json!({"data": {"brand_code": "x", "brand_revision": null}});
        assert_eq!(UpsertResult::from_response(&json).brand_revision, None);
    }

    #[test]
    fn translation_value_result() {
        let res = TranslationValueResult::from_response(&json!({"revision": "r1", "value": "Hello"}));
        assert_eq!(res.revision, "r1");
        assert_eq!(res.as_str(), Some("Hello"));

        let empty = TranslationValueResult::from_response(&json!({}));
        assert_eq!(empty.revision, "");
        assert_eq!(empty.value, Value::Null);
    }

    #[test]
    fn revision_info() {
        let json = json!({"data": {"brand_code": "doncoupon_ru", "effective_revision": "a1b2c3"}});
        let info = RevisionInfo::from_response(&json);
        assert_eq!(info.brand_code, "doncoupon_ru");
        assert_eq!(info.effective_revision.as_deref(), Some("a1b2c3"));
        assert_eq!(info.base_revision, None);
    }

    #[test]
    fn single_item_serializes_value() {
        let item = TranslationItem::single("common", "sitename", Some("Hello"));
        assert_eq!(item.to_json(), json!({"folder": "common", "key": "sitename", "value": "Hello"}));
    }

    #[test]
    fn multi_language_item_serializes_values() {
        let item = TranslationItem::new("common", "sitename")
            .with_value("en", Some("Hello"))
            .with_value("ru", None)
            .with_note("site title");
        assert_eq!(
            item.to_json(),
            json!({
                "folder": "common",
                "key": "sitename",
                "values": {"en": "Hello", "ru": null},
                "note": "site title"
            })
        );
    }

    #[test]
    fn empty_note_is_sent_as_null() {
        let item = TranslationItem::single("common", "k", None).with_note("");
        assert_eq!(item.to_json()["note"], Value::Null);
        assert!(item.to_json().get("note").is_some());
    }

    #[test]
    fn single_value_resolves_against_language() {
        let item = TranslationItem::single("common", "k", Some("Hi"));
        let values = item.values_for("en");
        assert_eq!(values.get("en"), Some(&Some("Hi".to_string())));
    }

    #[test]
    fn resource_dtos_tolerate_missing_fields() {
        let brand: Brand = serde_json::from_value(json!({"code": "b"})).unwrap();
        assert_eq!(brand.code, "b");
        assert!(brand.name.is_none());
        assert!(!brand.is_enabled);

        let folder: Folder = serde_json::from_value(json!({})).unwrap();
        assert_eq!(folder, Folder::default());
    }

    #[test]
    fn resource_dtos_tolerate_null_fields() {
        let folder: Folder =
            serde_json::from_value(json!({"id": 3, "code": "common", "name": null, "size": 12})).unwrap();
        assert_eq!(folder.name, "");
        assert_eq!(folder.size, 12);

        let brand: Brand = serde_json::from_value(json!({
            "id": null, "code": "b", "name": null, "is_enabled": null, "created_at": null
        }))
        .unwrap();
        assert_eq!(brand.id, 0);
        assert!(brand.name.is_none());
        assert!(!brand.is_enabled);
    }

    #[test]
    fn resource_dtos_coerce_loose_types() {
        let brand: Brand =
            serde_json::from_value(json!({"id": "7", "code": "b", "is_enabled": 1})).unwrap();
        assert_eq!(brand.id, 7);
        assert!(brand.is_enabled);

        let lang: Language =
            serde_json::from_value(json!({"code": "en", "is_enabled": "0", "sort_order": "2"})).unwrap();
        assert!(!lang.is_enabled);
        assert_eq!(lang.sort_order, 2);

        let deleted: Deleted = serde_json::from_value(json!({"deleted": "true"})).unwrap();
        assert!(deleted.deleted);
    }

    #[test]
    fn admin_translation_row() {
        let row: AdminTranslation = serde_json::from_value(json!({
            "folder": "common", "key": "sitename", "value": null, "note": "site title"
        }))
        .unwrap();
        assert_eq!(row.key, "sitename");
        assert_eq!(row.value, None);
        assert_eq!(row.note.as_deref(), Some("site title"));
    }
}
