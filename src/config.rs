//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `JANSATHI__*` 覆盖（双下划线表示嵌套，如 `JANSATHI__GATEWAY__BASE_URL=https://...`）。
//! AI 网关密钥不在此处配置，只由托管函数服务从 `functions.api_key_env` 指定的环境变量读取。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub gateway: GatewaySection,
    #[serde(default)]
    pub chat: ChatSection,
    #[serde(default)]
    pub profile: ProfileSection,
    #[serde(default)]
    pub functions: FunctionsSection,
}

/// [app] 段
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
    #[serde(default = "default_app_name")]
    pub name: String,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: default_app_name(),
        }
    }
}

fn default_app_name() -> String {
    "JanSathi".to_string()
}

/// [gateway] 段：托管函数端点、匿名 Key、单次请求超时
#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// 公开的匿名 Key（apikey 头），不是 AI 网关密钥
    #[serde(default)]
    pub anon_key: String,
    #[serde(default = "default_gateway_timeout")]
    pub timeout_secs: u64,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            anon_key: String::new(),
            timeout_secs: default_gateway_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8787".to_string()
}

fn default_gateway_timeout() -> u64 {
    60
}

/// [chat] 段
#[derive(Debug, Clone, Deserialize)]
pub struct ChatSection {
    /// 个人资料页助手的开场白
    #[serde(default = "default_greeting")]
    pub greeting: String,
}

impl Default for ChatSection {
    fn default() -> Self {
        Self {
            greeting: default_greeting(),
        }
    }
}

fn default_greeting() -> String {
    "Hello! I can help you with your profile settings. What would you like to know?".to_string()
}

/// [profile] 段
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileSection {
    #[serde(default = "default_language")]
    pub default_language: String,
}

impl Default for ProfileSection {
    fn default() -> Self {
        Self {
            default_language: default_language(),
        }
    }
}

fn default_language() -> String {
    "en".to_string()
}

/// [functions] 段：托管函数服务监听地址与上游 AI 网关
#[derive(Debug, Clone, Deserialize)]
pub struct FunctionsSection {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_upstream_url")]
    pub upstream_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// 存放上游密钥的环境变量名
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_upstream_timeout")]
    pub timeout_secs: u64,
}

impl Default for FunctionsSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            upstream_url: default_upstream_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_upstream_timeout(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8787".to_string()
}

fn default_upstream_url() -> String {
    "https://ai.gateway.lovable.dev/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "google/gemini-2.5-flash".to_string()
}

fn default_api_key_env() -> String {
    "LOVABLE_API_KEY".to_string()
}

fn default_upstream_timeout() -> u64 {
    90
}

/// 从 config 目录加载配置，环境变量 JANSATHI__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 JANSATHI__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("JANSATHI")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

/// 加载失败时回退默认配置并记录警告
pub fn load_config_or_default(config_path: Option<PathBuf>) -> AppConfig {
    load_config(config_path).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_complete() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.app.name, "JanSathi");
        assert_eq!(cfg.gateway.timeout_secs, 60);
        assert_eq!(cfg.profile.default_language, "en");
        assert_eq!(cfg.functions.api_key_env, "LOVABLE_API_KEY");
        assert!(cfg.gateway.anon_key.is_empty());
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[gateway]\nbase_url = \"https://example.supabase.co\"\ntimeout_secs = 15\n\n[functions]\nmodel = \"test-model\""
        )
        .unwrap();

        let cfg = load_config(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(cfg.gateway.base_url, "https://example.supabase.co");
        assert_eq!(cfg.gateway.timeout_secs, 15);
        assert_eq!(cfg.functions.model, "test-model");
        // 未出现的段保持默认
        assert_eq!(cfg.functions.bind, "0.0.0.0:8787");
    }
}
