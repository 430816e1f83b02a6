//! JanSathi 托管函数服务
//!
//! 对外提供 analyze-medicine / read-prescription / extract-form-data / voice-chat 四个函数，
//! 转发到 OpenAI 兼容的上游 AI 网关。
//!
//! 环境变量:
//! - LOVABLE_API_KEY: 上游密钥（变量名可由 JANSATHI__FUNCTIONS__API_KEY_ENV 修改）
//! - JANSATHI__FUNCTIONS__BIND: 监听地址（默认 0.0.0.0:8787）
//! - RUST_LOG: 日志级别
//!
//! 启动: cargo run --bin jansathi-functions --features functions

#[cfg(feature = "functions")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use std::sync::Arc;

    use anyhow::Context;
    use jansathi::config::load_config_or_default;
    use jansathi::functions::{create_router, FunctionsState, OpenAiCompatibleClient};

    jansathi::observability::init();

    let config = load_config_or_default(None);
    let inference = OpenAiCompatibleClient::from_config(&config.functions);
    let state = Arc::new(FunctionsState::new(Arc::new(inference)));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.functions.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.functions.bind))?;
    tracing::info!(
        "{} functions listening on http://{}",
        config.app.name,
        listener.local_addr()?
    );
    tracing::info!("Upstream: {} ({})", config.functions.upstream_url, config.functions.model);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

#[cfg(not(feature = "functions"))]
fn main() {
    eprintln!("请使用 --features functions 编译: cargo run --bin jansathi-functions --features functions");
    std::process::exit(1);
}
