//! 偏好持久化：按用户 id 读取 / 整条 upsert
//!
//! REST 实现对接 PostgREST 风格的 `profiles` 表；错误分类与动作网关一致。
//! 内存实现用于测试与离线运行。

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::config::GatewaySection;
use crate::gateway::http::client_with_timeout;
use crate::gateway::GatewayError;
use crate::profile::{ProfileSettings, SettingsPatch, SETTINGS_FIELDS};

/// 已登录用户（认证由外部服务负责）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSession {
    pub user_id: String,
    pub access_token: Option<String>,
}

impl UserSession {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            access_token: None,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProfileError {
    #[error("Not signed in")]
    Unauthenticated,

    #[error(transparent)]
    Remote(#[from] GatewayError),

    #[error("Malformed profile record: {0}")]
    Malformed(String),

    #[error("Settings dialog is not open")]
    DialogClosed,
}

/// 偏好存储
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// 读取用户记录；尚无记录时返回 None
    async fn fetch(&self, session: &UserSession) -> Result<Option<ProfileSettings>, ProfileError>;

    /// 以用户 id 为键整条写入全部字段
    async fn upsert(&self, session: &UserSession, settings: &ProfileSettings) -> Result<(), ProfileError>;
}

fn require_user(session: &UserSession) -> Result<&str, ProfileError> {
    let id = session.user_id.trim();
    if id.is_empty() {
        return Err(ProfileError::Unauthenticated);
    }
    Ok(id)
}

/// 内存存储；可模拟服务不可用
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    records: RwLock<HashMap<String, ProfileSettings>>,
    unavailable: AtomicBool,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为 true 时所有读写返回 ServerError
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn insert(&self, user_id: &str, settings: ProfileSettings) {
        self.records.write().await.insert(user_id.to_string(), settings);
    }

    fn check_available(&self) -> Result<(), ProfileError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(GatewayError::from_status(503, Some("Profile service unavailable".into())).into());
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn fetch(&self, session: &UserSession) -> Result<Option<ProfileSettings>, ProfileError> {
        let id = require_user(session)?;
        self.check_available()?;
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn upsert(&self, session: &UserSession, settings: &ProfileSettings) -> Result<(), ProfileError> {
        let id = require_user(session)?;
        self.check_available()?;
        self.records.write().await.insert(id.to_string(), settings.clone());
        Ok(())
    }
}

/// upsert 请求体：id + 全部字段
#[derive(Serialize)]
struct UpsertRow<'a> {
    id: &'a str,
    #[serde(flatten)]
    settings: &'a ProfileSettings,
}

/// PostgREST 风格存储
#[derive(Debug, Clone)]
pub struct RestProfileStore {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl RestProfileStore {
    pub fn new(base_url: &str, anon_key: &str, timeout_secs: u64) -> Self {
        let client = client_with_timeout(timeout_secs, "profile store");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        }
    }

    pub fn from_config(cfg: &GatewaySection) -> Self {
        Self::new(&cfg.base_url, &cfg.anon_key, cfg.timeout_secs)
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/profiles", self.base_url)
    }

    fn authed(&self, req: reqwest::RequestBuilder, session: &UserSession) -> reqwest::RequestBuilder {
        let bearer = session.access_token.as_deref().unwrap_or(&self.anon_key);
        req.header("apikey", &self.anon_key).bearer_auth(bearer)
    }

    async fn read_failure(resp: reqwest::Response) -> ProfileError {
        let status = resp.status().as_u16();
        let message = resp
            .json::<Value>()
            .await
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from));
        GatewayError::from_status(status, message).into()
    }
}

fn network(e: reqwest::Error) -> ProfileError {
    GatewayError::Network(e.to_string()).into()
}

/// 解析 select 结果：空数组 → None；首行按部分字段解码后与默认值合并
pub(crate) fn decode_rows(rows: Value) -> Result<Option<ProfileSettings>, ProfileError> {
    let rows = match rows {
        Value::Array(rows) => rows,
        other => return Err(ProfileError::Malformed(format!("expected array, got {}", other))),
    };
    let Some(row) = rows.into_iter().next() else {
        return Ok(None);
    };
    let patch: SettingsPatch =
        serde_json::from_value(row).map_err(|e| ProfileError::Malformed(e.to_string()))?;
    Ok(Some(ProfileSettings::default().merged(&patch)))
}

#[async_trait]
impl ProfileStore for RestProfileStore {
    async fn fetch(&self, session: &UserSession) -> Result<Option<ProfileSettings>, ProfileError> {
        let id = require_user(session)?;
        let filter = format!("eq.{}", id);
        let select = SETTINGS_FIELDS.join(",");

        let resp = self
            .authed(self.client.get(self.table_url()), session)
            .query(&[("id", filter.as_str()), ("select", select.as_str())])
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(network)?;

        if !resp.status().is_success() {
            return Err(Self::read_failure(resp).await);
        }
        let rows: Value = resp
            .json()
            .await
            .map_err(|e| ProfileError::Malformed(e.to_string()))?;
        decode_rows(rows)
    }

    async fn upsert(&self, session: &UserSession, settings: &ProfileSettings) -> Result<(), ProfileError> {
        let id = require_user(session)?;
        let row = UpsertRow { id, settings };

        let resp = self
            .authed(self.client.post(self.table_url()), session)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&row)
            .send()
            .await
            .map_err(network)?;

        if !resp.status().is_success() {
            return Err(Self::read_failure(resp).await);
        }
        tracing::info!(user = %id, "profile settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::StatusClass;
    use crate::profile::{Language, TextSize};
    use serde_json::json;

    #[tokio::test]
    async fn test_in_memory_round_trip() {
        let store = InMemoryProfileStore::new();
        let session = UserSession::new("user-1");
        assert_eq!(store.fetch(&session).await.unwrap(), None);

        let settings = ProfileSettings {
            language: Language::Kn,
            ..ProfileSettings::default()
        };
        store.upsert(&session, &settings).await.unwrap();
        assert_eq!(store.fetch(&session).await.unwrap(), Some(settings));
    }

    #[tokio::test]
    async fn test_unavailable_and_unauthenticated() {
        let store = InMemoryProfileStore::new();
        store.set_unavailable(true);
        let err = store.fetch(&UserSession::new("user-1")).await.unwrap_err();
        match err {
            ProfileError::Remote(e) => assert_eq!(e.status_class(), Some(StatusClass::ServerError)),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            store.fetch(&UserSession::new(" ")).await.unwrap_err(),
            ProfileError::Unauthenticated
        );
    }

    #[test]
    fn test_upsert_row_flattens_fields() {
        let settings = ProfileSettings::default();
        let value = serde_json::to_value(UpsertRow { id: "u1", settings: &settings }).unwrap();
        assert_eq!(value["id"], "u1");
        assert_eq!(value["text_size"], "medium");
        assert_eq!(value.as_object().unwrap().len(), SETTINGS_FIELDS.len() + 1);
    }

    #[test]
    fn test_decode_rows() {
        assert_eq!(decode_rows(json!([])).unwrap(), None);
        let got = decode_rows(json!([{ "text_size": "small" }])).unwrap().unwrap();
        assert_eq!(got.text_size, TextSize::Small);
        assert!(matches!(decode_rows(json!({})), Err(ProfileError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_rest_store_network_failure() {
        let store = RestProfileStore::new("http://127.0.0.1:9", "anon", 2);
        let err = store.fetch(&UserSession::new("u1")).await.unwrap_err();
        assert!(matches!(err, ProfileError::Remote(GatewayError::Network(_))));
    }
}
