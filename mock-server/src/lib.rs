use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

/// Brand seeded into every fresh app.
pub const DEMO_BRAND_CODE: &str = "demo";
pub const DEMO_BRAND_KEY: &str = "demo-brand-key";

const FIRST_REVISION: u64 = 1_700_000_000_000;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Language {
    pub code: String,
    pub name: String,
    pub is_enabled: bool,
    pub sort_order: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Brand {
    pub id: i64,
    pub code: String,
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_key: Option<String>,
    pub is_enabled: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Folder {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub size: i64,
}

#[derive(Deserialize)]
pub struct CreateBrand {
    pub code: String,
    pub name: Option<String>,
    #[serde(default = "enabled")]
    pub is_enabled: bool,
}

fn enabled() -> bool {
    true
}

#[derive(Deserialize)]
pub struct UpdateBrand {
    pub name: Option<String>,
    pub is_enabled: Option<bool>,
}

#[derive(Deserialize)]
pub struct CreateFolder {
    pub code: String,
    pub name: String,
}

#[derive(Deserialize)]
pub struct RenameFolder {
    pub name: String,
}

#[derive(Deserialize)]
pub struct UpsertItem {
    pub folder: String,
    pub key: String,
    #[serde(default, deserialize_with = "present")]
    pub value: Option<Option<String>>,
    #[serde(default)]
    pub values: Option<BTreeMap<String, Option<String>>>,
    #[serde(default, deserialize_with = "present")]
    pub note: Option<Option<String>>,
}

/// Keeps an explicit `null` apart from a missing field.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[derive(Deserialize)]
pub struct Upsert {
    pub lang: Option<String>,
    #[serde(default = "brand_target")]
    pub target: String,
    pub items: Vec<UpsertItem>,
}

fn brand_target() -> String {
    "brand".to_string()
}

#[derive(Deserialize)]
pub struct ListParams {
    #[serde(default = "english")]
    pub lang: String,
    pub folder: Option<String>,
    #[serde(default = "tree")]
    pub format: String,
    #[serde(default = "merged")]
    pub scope: String,
}

fn english() -> String {
    "en".to_string()
}

fn tree() -> String {
    "tree".to_string()
}

fn merged() -> String {
    "merged".to_string()
}

#[derive(Deserialize)]
pub struct LangParam {
    #[serde(default = "english")]
    pub lang: String,
}

#[derive(Deserialize)]
pub struct TargetParam {
    #[serde(default = "brand_target")]
    pub target: String,
}

struct BrandRecord {
    brand: Brand,
    key: String,
    revision: u64,
}

/// `(lang, folder, key)`
type ValueKey = (String, String, String);

#[derive(Default)]
pub struct Store {
    languages: Vec<Language>,
    brands: Vec<BrandRecord>,
    folders: Vec<Folder>,
    next_id: i64,
    base_revision: u64,
    /// Every `(folder, key)` known to the base layer.
    keys: BTreeSet<(String, String)>,
    notes: BTreeMap<(String, String), String>,
    base: BTreeMap<ValueKey, String>,
    /// Overrides keyed by brand code.
    overrides: BTreeMap<String, BTreeMap<ValueKey, String>>,
}

pub type Db = Arc<RwLock<Store>>;

struct Failure(StatusCode, &'static str);

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "message": self.1 }))).into_response()
    }
}

type Reply<T> = Result<T, Failure>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::seeded()));
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/languages", get(list_languages))
        .route("/v1/brands", get(list_brands))
        .route("/v1/folders", get(list_folders))
        .route("/v1/translations", get(list_translations))
        .route("/v1/translations/revision", get(revision))
        .route("/v1/translations/{folder}/{key}", get(show_translation))
        .route(
            "/v1/admin/translations",
            put(upsert_translations).get(admin_list_translations),
        )
        .route(
            "/v1/admin/translations/{folder}/{key}",
            axum::routing::delete(delete_translation),
        )
        .route("/v1/admin/brands", axum::routing::post(create_brand))
        .route("/v1/admin/brands/{code}", put(update_brand))
        .route("/v1/admin/folders", axum::routing::post(create_folder))
        .route(
            "/v1/admin/folders/{code}",
            put(rename_folder).delete(delete_folder),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

impl Store {
    fn seeded() -> Self {
        let mut store = Store {
            languages: vec![
                Language {
                    code: "en".to_string(),
                    name: "English".to_string(),
                    is_enabled: true,
                    sort_order: 1,
                },
                Language {
                    code: "ru".to_string(),
                    name: "Русский".to_string(),
                    is_enabled: true,
                    sort_order: 2,
                },
            ],
            next_id: 1,
            base_revision: FIRST_REVISION,
            ..Store::default()
        };
        let id = store.take_id();
        store.brands.push(BrandRecord {
            brand: Brand {
                id,
                code: DEMO_BRAND_CODE.to_string(),
                name: Some("Demo".to_string()),
                brand_key: None,
                is_enabled: true,
                created_at: Some(now()),
                updated_at: Some(now()),
            },
            key: DEMO_BRAND_KEY.to_string(),
            revision: FIRST_REVISION,
        });
        let id = store.take_id();
        store.folders.push(Folder {
            id,
            code: "common".to_string(),
            name: "Common".to_string(),
            size: 0,
        });
        store
    }

    fn take_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn brand_index(&self, headers: &HeaderMap) -> Reply<usize> {
        let key = headers
            .get("x-brand-key")
            .and_then(|v| v.to_str().ok())
            .or_else(|| {
                headers
                    .get(header::AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.strip_prefix("Bearer "))
            })
            .ok_or(Failure(StatusCode::UNAUTHORIZED, "Unauthorized"))?;
        self.brands
            .iter()
            .position(|b| b.key == key && b.brand.is_enabled)
            .ok_or(Failure(StatusCode::UNAUTHORIZED, "Unauthorized"))
    }

    fn revisions(&self, brand: usize) -> Value {
        let record = &self.brands[brand];
        json!({
            "brand_code": record.brand.code,
            "base_revision": self.base_revision.to_string(),
            "brand_revision": record.revision.to_string(),
            "effective_revision": effective_revision(self.base_revision, record.revision),
        })
    }

    fn folder_size(&self, code: &str) -> i64 {
        self.keys.iter().filter(|(f, _)| f == code).count() as i64
    }

    fn has_folder(&self, code: &str) -> bool {
        self.folders.iter().any(|f| f.code == code)
    }

    /// Value for one layer (or the merge) of `(lang, folder, key)`.
    fn lookup(&self, brand: &str, scope: &str, id: &ValueKey) -> Option<String> {
        let overridden = self.overrides.get(brand).and_then(|m| m.get(id)).cloned();
        match scope {
            "base" => self.base.get(id).cloned(),
            "brand" => overridden,
            _ => overridden.or_else(|| self.base.get(id).cloned()),
        }
    }
}

fn effective_revision(base: u64, brand: u64) -> String {
    format!("{base:x}{brand:x}")
}

fn now() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    secs.to_string()
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "translator",
        "timestamp": now(),
    }))
}

async fn list_languages(State(db): State<Db>) -> Json<Value> {
    let store = db.read().await;
    let enabled: Vec<&Language> = store.languages.iter().filter(|l| l.is_enabled).collect();
    Json(json!({ "data": enabled }))
}

async fn list_brands(State(db): State<Db>, headers: HeaderMap) -> Reply<Json<Value>> {
    let store = db.read().await;
    store.brand_index(&headers)?;
    let brands: Vec<&Brand> = store.brands.iter().map(|b| &b.brand).collect();
    Ok(Json(json!({ "data": brands })))
}

async fn list_folders(State(db): State<Db>, headers: HeaderMap) -> Reply<Json<Value>> {
    let store = db.read().await;
    store.brand_index(&headers)?;
    let folders: Vec<Folder> = store
        .folders
        .iter()
        .map(|f| Folder {
            size: store.folder_size(&f.code),
            ..f.clone()
        })
        .collect();
    Ok(Json(json!({ "data": folders })))
}

async fn revision(State(db): State<Db>, headers: HeaderMap) -> Reply<Json<Value>> {
    let store = db.read().await;
    let brand = store.brand_index(&headers)?;
    Ok(Json(json!({ "data": store.revisions(brand) })))
}

async fn list_translations(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Reply<Response> {
    let store = db.read().await;
    let brand = store.brand_index(&headers)?;
    let record = &store.brands[brand];
    let revision = effective_revision(store.base_revision, record.revision);
    let folder = params.folder.as_deref().unwrap_or("");
    let etag = format!(
        "W/\"{revision}-{}-{}-{}-{folder}\"",
        params.lang, params.scope, params.format
    );

    let cached = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == etag);
    if cached {
        return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
    }

    let mut tree: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
    for (f, k) in &store.keys {
        if !folder.is_empty() && f != folder {
            continue;
        }
        let id = (params.lang.clone(), f.clone(), k.clone());
        if let Some(value) = store.lookup(&record.brand.code, &params.scope, &id) {
            tree.entry(f.clone()).or_default().insert(k.clone(), value);
        }
    }

    let data = if params.format == "flat" {
        let flat: BTreeMap<String, String> = tree
            .into_iter()
            .flat_map(|(f, keys)| keys.into_iter().map(move |(k, v)| (format!("{f}.{k}"), v)))
            .collect();
        json!(flat)
    } else {
        json!(tree)
    };

    let body = Json(json!({ "revision": revision, "data": data }));
    Ok(([(header::ETAG, etag)], body).into_response())
}

async fn show_translation(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((folder, key)): Path<(String, String)>,
    Query(params): Query<LangParam>,
) -> Reply<Json<Value>> {
    let store = db.read().await;
    let brand = store.brand_index(&headers)?;
    if !store.keys.contains(&(folder.clone(), key.clone())) {
        return Err(Failure(StatusCode::NOT_FOUND, "Translation not found"));
    }
    let record = &store.brands[brand];
    let value = store.lookup(&record.brand.code, "merged", &(params.lang, folder, key));
    Ok(Json(json!({
        "revision": effective_revision(store.base_revision, record.revision),
        "value": value,
    })))
}

async fn upsert_translations(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<Upsert>,
) -> Reply<Json<Value>> {
    let mut store = db.write().await;
    let brand = store.brand_index(&headers)?;
    let to_base = match input.target.as_str() {
        "base" => true,
        "brand" => false,
        _ => return Err(Failure(StatusCode::UNPROCESSABLE_ENTITY, "Invalid target")),
    };
    if let Some(item) = input.items.iter().find(|i| !store.has_folder(&i.folder)) {
        debug!(folder = %item.folder, "upsert into unknown folder");
        return Err(Failure(StatusCode::UNPROCESSABLE_ENTITY, "Unknown folder"));
    }

    let lang = input.lang.unwrap_or_else(english);
    let brand_code = store.brands[brand].brand.code.clone();
    let mut inserted_to_base = 0;

    for item in input.items {
        let pair = (item.folder.clone(), item.key.clone());
        if store.keys.insert(pair.clone()) {
            inserted_to_base += 1;
        }
        match item.note {
            Some(Some(note)) if !note.is_empty() => {
                store.notes.insert(pair.clone(), note);
            }
            Some(_) => {
                store.notes.remove(&pair);
            }
            None => {}
        }

        let values = match (item.values, item.value) {
            (Some(values), _) => values,
            (None, Some(value)) => BTreeMap::from([(lang.clone(), value)]),
            (None, None) => BTreeMap::new(),
        };
        for (value_lang, value) in values {
            let id = (value_lang, item.folder.clone(), item.key.clone());
            let layer = if to_base {
                &mut store.base
            } else {
                store.overrides.entry(brand_code.clone()).or_default()
            };
            match value {
                Some(v) => layer.insert(id, v),
                None => layer.remove(&id),
            };
        }
    }

    if to_base || inserted_to_base > 0 {
        store.base_revision += 1;
    }
    if !to_base {
        store.brands[brand].revision += 1;
    }

    let mut data = store.revisions(brand);
    data["inserted_to_base"] = json!(inserted_to_base);
    Ok(Json(json!({ "data": data })))
}

async fn admin_list_translations(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Reply<Json<Value>> {
    let store = db.read().await;
    let brand = store.brand_index(&headers)?;
    let code = &store.brands[brand].brand.code;
    let folder = params.folder.as_deref().unwrap_or("");
    let rows: Vec<Value> = store
        .keys
        .iter()
        .filter(|(f, _)| folder.is_empty() || f == folder)
        .map(|(f, k)| {
            let id = (params.lang.clone(), f.clone(), k.clone());
            json!({
                "folder": f,
                "key": k,
                "value": store.lookup(code, &params.scope, &id),
                "note": store.notes.get(&(f.clone(), k.clone())),
            })
        })
        .collect();
    Ok(Json(json!({ "data": rows })))
}

async fn delete_translation(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((folder, key)): Path<(String, String)>,
    Query(params): Query<TargetParam>,
) -> Reply<Json<Value>> {
    let mut store = db.write().await;
    let brand = store.brand_index(&headers)?;
    let matches = |id: &ValueKey| id.1 == folder && id.2 == key;

    let deleted = if params.target == "base" {
        let existed = store.keys.remove(&(folder.clone(), key.clone()));
        store.notes.remove(&(folder.clone(), key.clone()));
        store.base.retain(|id, _| !matches(id));
        for layer in store.overrides.values_mut() {
            layer.retain(|id, _| !matches(id));
        }
        if existed {
            store.base_revision += 1;
        }
        existed
    } else {
        let code = store.brands[brand].brand.code.clone();
        let layer = store.overrides.entry(code).or_default();
        let before = layer.len();
        layer.retain(|id, _| !matches(id));
        let removed = layer.len() != before;
        if removed {
            store.brands[brand].revision += 1;
        }
        removed
    };

    Ok(Json(json!({ "data": { "deleted": deleted } })))
}

async fn create_brand(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CreateBrand>,
) -> Reply<(StatusCode, Json<Value>)> {
    let mut store = db.write().await;
    store.brand_index(&headers)?;
    if input.code.is_empty() {
        return Err(Failure(StatusCode::UNPROCESSABLE_ENTITY, "Brand code is required"));
    }
    if store.brands.iter().any(|b| b.brand.code == input.code) {
        return Err(Failure(StatusCode::CONFLICT, "Brand already exists"));
    }

    let key = Uuid::new_v4().simple().to_string();
    let id = store.take_id();
    let brand = Brand {
        id,
        code: input.code,
        name: input.name,
        brand_key: None,
        is_enabled: input.is_enabled,
        created_at: Some(now()),
        updated_at: Some(now()),
    };
    store.brands.push(BrandRecord {
        brand: brand.clone(),
        key: key.clone(),
        revision: FIRST_REVISION,
    });

    let created = Brand {
        brand_key: Some(key),
        ..brand
    };
    Ok((StatusCode::CREATED, Json(json!({ "data": created }))))
}

async fn update_brand(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(code): Path<String>,
    Json(input): Json<UpdateBrand>,
) -> Reply<Json<Value>> {
    let mut store = db.write().await;
    store.brand_index(&headers)?;
    let record = store
        .brands
        .iter_mut()
        .find(|b| b.brand.code == code)
        .ok_or(Failure(StatusCode::NOT_FOUND, "Brand not found"))?;
    if let Some(name) = input.name {
        record.brand.name = Some(name);
    }
    if let Some(is_enabled) = input.is_enabled {
        record.brand.is_enabled = is_enabled;
    }
    record.brand.updated_at = Some(now());
    Ok(Json(json!({ "data": record.brand })))
}

async fn create_folder(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CreateFolder>,
) -> Reply<(StatusCode, Json<Value>)> {
    let mut store = db.write().await;
    store.brand_index(&headers)?;
    if input.code.is_empty() {
        return Err(Failure(StatusCode::UNPROCESSABLE_ENTITY, "Folder code is required"));
    }
    if store.has_folder(&input.code) {
        return Err(Failure(StatusCode::CONFLICT, "Folder already exists"));
    }
    let id = store.take_id();
    let folder = Folder {
        id,
        code: input.code,
        name: input.name,
        size: 0,
    };
    store.folders.push(folder.clone());
    Ok((StatusCode::CREATED, Json(json!({ "data": folder }))))
}

async fn rename_folder(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(code): Path<String>,
    Json(input): Json<RenameFolder>,
) -> Reply<Json<Value>> {
    let mut store = db.write().await;
    store.brand_index(&headers)?;
    let size = store.folder_size(&code);
    let folder = store
        .folders
        .iter_mut()
        .find(|f| f.code == code)
        .ok_or(Failure(StatusCode::NOT_FOUND, "Folder not found"))?;
    folder.name = input.name;
    folder.size = size;
    Ok(Json(json!({ "data": folder })))
}

async fn delete_folder(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(code): Path<String>,
) -> Reply<Json<Value>> {
    let mut store = db.write().await;
    store.brand_index(&headers)?;
    let index = store
        .folders
        .iter()
        .position(|f| f.code == code)
        .ok_or(Failure(StatusCode::NOT_FOUND, "Folder not found"))?;
    store.folders.remove(index);

    let had_keys = store.folder_size(&code) > 0;
    store.keys.retain(|(f, _)| f != &code);
    store.notes.retain(|(f, _), _| f != &code);
    store.base.retain(|id, _| id.1 != code);
    for layer in store.overrides.values_mut() {
        layer.retain(|id, _| id.1 != code);
    }
    if had_keys {
        store.base_revision += 1;
    }
    Ok(Json(json!({ "data": { "deleted": true } })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_store_has_demo_brand_and_common_folder() {
        let store = Store::seeded();
        assert_eq!(store.brands.len(), 1);
        assert_eq!(store.brands[0].brand.code, DEMO_BRAND_CODE);
        assert!(store.has_folder("common"));
        assert_eq!(store.folder_size("common"), 0);
    }

    #[test]
    fn brand_key_not_serialized_when_absent() {
        let store = Store::seeded();
        let json = serde_json::to_value(&store.brands[0].brand).unwrap();
        assert!(json.get("brand_key").is_none());
        assert_eq!(json["code"], DEMO_BRAND_CODE);
    }

    #[test]
    fn brand_resolved_from_either_header() {
        let store = Store::seeded();
        let mut headers = HeaderMap::new();
        assert!(store.brand_index(&headers).is_err());

        headers.insert("x-brand-key", DEMO_BRAND_KEY.parse().unwrap());
        assert_eq!(store.brand_index(&headers).ok(), Some(0));

        let mut bearer = HeaderMap::new();
        bearer.insert(
            header::AUTHORIZATION,
            format!("Bearer {DEMO_BRAND_KEY}").parse().unwrap(),
        );
        assert_eq!(store.brand_index(&bearer).ok(), Some(0));
    }

    #[test]
    fn merged_lookup_prefers_override() {
        let mut store = Store::seeded();
        let id = ("en".to_string(), "common".to_string(), "title".to_string());
        store.base.insert(id.clone(), "Base".to_string());
        assert_eq!(store.lookup("demo", "merged", &id).as_deref(), Some("Base"));
        assert_eq!(store.lookup("demo", "brand", &id), None);

        store
            .overrides
            .entry("demo".to_string())
            .or_default()
            .insert(id.clone(), "Demo".to_string());
        assert_eq!(store.lookup("demo", "merged", &id).as_deref(), Some("Demo"));
        assert_eq!(store.lookup("demo", "base", &id).as_deref(), Some("Base"));
    }

    #[test]
    fn upsert_item_distinguishes_null_from_missing() {
        let item: UpsertItem =
            serde_json::from_str(r#"{"folder":"common","key":"k","value":null}"#).unwrap();
        assert_eq!(item.value, Some(None));
        let item: UpsertItem = serde_json::from_str(r#"{"folder":"common","key":"k"}"#).unwrap();
        assert_eq!(item.value, None);
        assert!(item.values.is_none());
    }
}
