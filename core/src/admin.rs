//! Privileged write surface under `/v1/admin`.

use serde_json::{json, Map, Value};

use crate::client::segment;
use crate::error::Result;
use crate::transport::{ApiRequest, Transport};
use crate::types::{
    AdminTranslation, Brand, Deleted, Folder, Scope, Target, TranslationItem, UpsertResult,
};

#[derive(Debug, Clone, Copy)]
pub struct AdminClient<'a> {
    http: &'a Transport,
}

impl<'a> AdminClient<'a> {
    pub(crate) fn new(http: &'a Transport) -> Self {
        Self { http }
    }

    pub fn brands(&self) -> BrandsAdminClient<'a> {
        BrandsAdminClient { http: self.http }
    }

    pub fn folders(&self) -> FoldersAdminClient<'a> {
        FoldersAdminClient { http: self.http }
    }

    pub fn translations(&self) -> TranslationsAdminClient<'a> {
        TranslationsAdminClient { http: self.http }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BrandsAdminClient<'a> {
    http: &'a Transport,
}

impl BrandsAdminClient<'_> {
    /// Create a tenant. The response is the only place its `brand_key` is returned.
    pub fn create(&self, code: &str, name: Option<&str>, is_enabled: bool) -> Result<Brand> {
        let body = json!({
            "code": code,
            "name": name,
            "is_enabled": is_enabled,
        });
        self.http.request_data(ApiRequest::post("/v1/admin/brands").json(body))
    }

    /// Partial update; `None` fields are left out of the payload.
    pub fn update(&self, code: &str, name: Option<&str>, is_enabled: Option<bool>) -> Result<Brand> {
        let mut body = Map::new();
        if let Some(name) = name {
            body.insert("name".to_string(), json!(name));
        }
        if let Some(enabled) = is_enabled {
            body.insert("is_enabled".to_string(), json!(enabled));
        }
        let path = format!("/v1/admin/brands/{}", segment(code));
        self.http.request_data(ApiRequest::put(path).json(Value::Object(body)))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FoldersAdminClient<'a> {
    http: &'a Transport,
}

impl FoldersAdminClient<'_> {
    pub fn create(&self, code: &str, name: &str) -> Result<Folder> {
        let body = json!({"code": code, "name": name});
        self.http.request_data(ApiRequest::post("/v1/admin/folders").json(body))
    }

    /// Rename.
    pub fn update(&self, code: &str, name: &str) -> Result<Folder> {
        let path = format!("/v1/admin/folders/{}", segment(code));
        self.http.request_data(ApiRequest::put(path).json(json!({"name": name})))
    }

    pub fn delete(&self, code: &str) -> Result<Deleted> {
        let path = format!("/v1/admin/folders/{}", segment(code));
        self.http.request_data(ApiRequest::delete(path))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TranslationsAdminClient<'a> {
    http: &'a Transport,
}

impl TranslationsAdminClient<'_> {
    /// Write `items` for `lang` into the `target` layer.
    pub fn upsert(&self, lang: &str, items: &[TranslationItem], target: Target) -> Result<UpsertResult> {
        let body = json!({
            "lang": lang,
            "target": target.as_str(),
            "items": items.iter().map(TranslationItem::to_json).collect::<Vec<_>>(),
        });
        let json = self.http.request_json(ApiRequest::put("/v1/admin/translations").json(body))?;
        Ok(UpsertResult::from_response(&json))
    }

    /// Rows of the `scope` layer for `lang`, optionally limited to one folder.
    pub fn list(&self, lang: &str, folder: Option<&str>, scope: Scope) -> Result<Vec<AdminTranslation>> {
        let mut req = ApiRequest::get("/v1/admin/translations")
            .query("lang", lang)
            .query("scope", scope.as_str());
        if let Some(folder) = folder.filter(|f| !f.is_empty()) {
            req = req.query("folder", folder);
        }
        self.http.request_data(req)
    }

    /// Delete one key from the `target` layer.
    pub fn delete(&self, folder: &str, key: &str, target: Target) -> Result<Deleted> {
        let path = format!("/v1/admin/translations/{}/{}", segment(folder), segment(key));
        self.http
            .request_data(ApiRequest::delete(path).query("target", target.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::ClientConfig;
    use crate::error::Error;
    use crate::http::HttpMethod;
    use crate::transport::testing::ScriptedExecutor;
    use crate::TranslatorClient;

    fn client(key: &str, exec: ScriptedExecutor) -> (TranslatorClient, Arc<ScriptedExecutor>) {
        let exec = Arc::new(exec);
        let config = ClientConfig::new("https://example.test").with_tenant_key(key);
        (TranslatorClient::with_executor(config, exec.clone()), exec)
    }

    fn respond(status: u16, body: Value) -> ScriptedExecutor {
        ScriptedExecutor::default().respond(status, &[("Content-Type", "application/json")], &body.to_string())
    }

    fn sent_body(exec: &ScriptedExecutor) -> Value {
        serde_json::from_str(exec.last().body.as_deref().expect("request body")).unwrap()
    }

    #[test]
    fn upsert_returns_result() {
        let (c, exec) = client(
            "brand-key",
            respond(200, json!({"data": {
                "brand_code": "doncoupon_ru",
                "base_revision": "1700000000000",
                "brand_revision": "1700000123000",
                "effective_revision": "a1b2c3",
                "inserted_to_base": 3
            }})),
        );

        let items = [TranslationItem::single("common", "sitename", Some("Hello"))];
        let res = c.admin().translations().upsert("ru", &items, Target::Brand).unwrap();
        assert_eq!(res.brand_code, "doncoupon_ru");
        assert_eq!(res.base_revision.as_deref(), Some("1700000000000"));
        assert_eq!(res.inserted_to_base, 3);

        let sent = exec.last();
        assert_eq!(sent.method, HttpMethod::Put);
        assert_eq!(sent.url, "https://example.test/v1/admin/translations");
        assert!(sent.query.is_empty());
        assert_eq!(sent.header("X-Brand-Key"), Some("brand-key"));
        assert_eq!(
            sent_body(&exec),
            json!({"lang": "ru", "target": "brand", "items": [{"folder": "common", "key": "sitename", "value": "Hello"}]})
        );
    }

    #[test]
    fn upsert_unauthorized() {
        let (c, exec) = client("brand-key", respond(401, json!({"message": "Unauthorized"})));
        let items = [TranslationItem::single("common", "sitename", Some("Hello"))];
        let err = c.admin().translations().upsert("ru", &items, Target::Brand).unwrap_err();
        let Error::Api(api) = err else { panic!("expected api error") };
        assert_eq!(api.status, 401);
        assert_eq!(api.message, "Unauthorized");
        assert_eq!(exec.last().header("X-Brand-Key"), Some("brand-key"));
    }

    #[test]
    fn upsert_multi_language_to_base() {
        let (c, exec) = client("brand-key", respond(200, json!({"data": {"brand_code": "b"}})));
        let items = [TranslationItem::new("checkout", "pay")
            .with_value("en", Some("Pay"))
            .with_value("ru", Some("Оплатить"))];
        let res = c.admin().translations().upsert("en", &items, Target::Base).unwrap();
        assert_eq!(res.inserted_to_base, 0);
        let body = sent_body(&exec);
        assert_eq!(body["target"], "base");
        assert_eq!(body["items"][0]["values"]["ru"], "Оплатить");
    }

    #[test]
    fn list_and_delete_translations() {
        let exec = ScriptedExecutor::default()
            .respond(200, &[], r#"{"data":[{"folder":"common","key":"sitename","value":null,"note":"title"}]}"#)
            .respond(200, &[], r#"{"data":{"deleted":true}}"#);
        let (c, exec) = client("brand-key", exec);

        let listing = c.admin().translations().list("en", Some("common"), Scope::Base).unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].key, "sitename");
        assert_eq!(listing[0].value, None);
        assert_eq!(listing[0].note.as_deref(), Some("title"));
        let sent = exec.last();
        assert_eq!(sent.query_param("folder"), Some("common"));
        assert_eq!(sent.query_param("scope"), Some("base"));

        let deleted = c.admin().translations().delete("common", "a/b", Target::Brand).unwrap();
        assert!(deleted.deleted);
        let sent = exec.last();
        assert_eq!(sent.method, HttpMethod::Delete);
        assert_eq!(sent.url, "https://example.test/v1/admin/translations/common/a%2Fb");
        assert_eq!(sent.query_param("target"), Some("brand"));
        assert!(sent.body.is_none());
        assert_eq!(sent.header("Content-Type"), None);
    }

    #[test]
    fn brand_create_returns_brand_key() {
        let (c, exec) = client(
            "admin-brand-key",
            respond(201, json!({"data": {
                "id": 10,
                "code": "doncoupon_ua",
                "name": "Doncoupon UA",
                "brand_key": "secret",
                "is_enabled": true,
                "created_at": "2026-01-16T00:00:00Z",
                "updated_at": "2026-01-16T00:00:00Z"
            }})),
        );
        let brand = c.admin().brands().create("doncoupon_ua", Some("Doncoupon UA"), true).unwrap();
        assert_eq!(brand.code, "doncoupon_ua");
        assert_eq!(brand.brand_key.as_deref(), Some("secret"));
        assert_eq!(exec.last().header("X-Brand-Key"), Some("admin-brand-key"));
        assert_eq!(sent_body(&exec), json!({"code": "doncoupon_ua", "name": "Doncoupon UA", "is_enabled": true}));
    }

    #[test]
    fn brand_update_sends_only_given_fields() {
        let (c, exec) = client("k", respond(200, json!({"data": {"id": 1, "code": "b", "is_enabled": false}})));
        let brand = c.admin().brands().update("b b", None, Some(false)).unwrap();
        assert!(!brand.is_enabled);
        assert_eq!(exec.last().url, "https://example.test/v1/admin/brands/b%20b");
        assert_eq!(sent_body(&exec), json!({"is_enabled": false}));
    }

    #[test]
    fn folder_lifecycle() {
        let exec = ScriptedExecutor::default()
            .respond(201, &[], r#"{"data":{"id":1,"code":"common","name":"Common","size":0}}"#)
            .respond(200, &[], r#"{"data":{"id":1,"code":"common","name":"Shared","size":0}}"#)
            .respond(200, &[], r#"{"data":{"deleted":true}}"#);
        let (c, exec) = client("k", exec);
        let folders = c.admin().folders();

        assert_eq!(folders.create("common", "Common").unwrap().name, "Common");
        assert_eq!(exec.last().method, HttpMethod::Post);

        assert_eq!(folders.update("common", "Shared").unwrap().name, "Shared");
        assert_eq!(sent_body(&exec), json!({"name": "Shared"}));

        assert!(folders.delete("common").unwrap().deleted);
        assert_eq!(exec.last().url, "https://example.test/v1/admin/folders/common");
    }

    #[test]
    fn listings_tolerate_null_and_loose_rows() {
        let exec = ScriptedExecutor::default()
            .respond(200, &[], r#"{"data":[{"id":3,"code":"common","name":null,"size":12}]}"#)
            .respond(200, &[], r#"{"data":[{"id":"1","code":"b","is_enabled":1}]}"#);
        let (c, _exec) = client("k", exec);

        let folders = c.folders().index().unwrap();
        assert_eq!(folders[0].code, "common");
        assert_eq!(folders[0].name, "");
        assert_eq!(folders[0].size, 12);

        let brands = c.brands().index().unwrap();
        assert_eq!(brands[0].id, 1);
        assert!(brands[0].is_enabled);
    }
}
