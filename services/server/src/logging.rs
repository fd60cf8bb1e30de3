use tracing_appender::non_blocking::WorkerGuard;

// =========================================================================
// 日志配置 (输出到控制台 + 文件)
// =========================================================================
pub fn init_logging(log_dir: &str) -> WorkerGuard {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // 1. 文件输出器：每天生成一个新的日志文件 (logs/tutor.log.2025-xx-xx)
    let file_appender = tracing_appender::rolling::daily(log_dir, "tutor.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // 2. 控制台层 (Console Layer)
    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false) // 不显示模块路径，保持清爽
        .with_thread_ids(true)
        .compact(); // 紧凑模式

    // 3. 文件层 (File Layer)
    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false) // 文件里不要颜色代码
        .with_file(true)
        .with_line_number(true);

    // 4. 注册全局订阅者，RUST_LOG 可以覆盖默认级别
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    guard // 必须返回 guard，否则日志线程会立即销毁
}
