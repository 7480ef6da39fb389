// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// 日志初始化
//
// 控制台横幅仍由 println! 输出, tracing 只负责诊断日志 (写到 stderr).
// RUST_LOG 优先于 --verbose

use tracing_subscriber::EnvFilter;

/// 默认日志级别
const DEFAULT_FILTER: &str = "warn";
/// --verbose 时的日志级别
const VERBOSE_FILTER: &str = "warn,lixo_yolo=debug";

pub fn init(verbose: bool) {
    let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    // 重复初始化时忽略
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
