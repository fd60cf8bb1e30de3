use anyhow::Context;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

// 引入内部模块
use tutor_llm::{GeminiBackend, Tutor};
use tutor_server::logging::init_logging;
use tutor_server::{build_router, AppState, ServerConfig};
use tutor_storage::{db::init_db, Storage};

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    warn!("🛑 Ctrl+C received! Shutting down gracefully...");
}

// =========================================================================
// 主入口 (Main Entry)
// =========================================================================
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A. 加载配置与日志
    // 没有 GOOGLE_API_KEY / DATABASE_URL 时直接退出
    let config = ServerConfig::from_env().context("Failed to load configuration")?;
    let _log_guard = init_logging(&config.log_dir); // 初始化日志，_guard 不能丢

    info!("Starting AI Tutor backend ⚡️");

    // B. 初始化数据库连接 (惰性连接，MySQL 宕机时也能启动)
    info!("Connecting to MySQL...");
    let pool = init_db(&config.database_url).await?;
    let storage = Storage::new(pool);
    info!("📦 Storage module initialized.");

    // C. 选定模型 (整个进程生命周期只选一次)
    let backend = GeminiBackend::new(config.gemini_settings())
        .context("Failed to initialise Gemini client")?;
    let tutor = Tutor::bootstrap(
        Arc::new(backend),
        config.fallback_model(),
        config.tutor_options(),
    )
    .await;
    match tutor.selected_model() {
        Some(model) => info!("🤖 Serving with model {} ({:?})", model, tutor.model_source()),
        None => warn!("⚠️ No usable model; /chat/ will answer 500 until restarted with FALLBACK_MODEL"),
    }

    // D. 启动 HTTP 服务
    let state = AppState::new(Arc::new(tutor), storage.conversations.clone());
    let app = build_router(state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("🚀 Listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server exited unexpectedly")?;

    // E. 清理工作
    info!("👋 AI Tutor backend shutdown complete.");
    Ok(())
}
