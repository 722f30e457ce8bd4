//! 로깅 설정 모듈
//!
//! tracing 구독자를 stderr로 초기화합니다. 콘솔 리포트는 stdout을 쓰므로 섞이지 않습니다.

use tracing_subscriber::{fmt, EnvFilter};

/// 로깅 초기화
///
/// `RUST_LOG`가 있으면 그대로 따르고, 없으면 `verbose`일 때 debug,
/// 아니면 warn 수준을 씁니다. 이미 초기화되어 있으면 아무것도 하지 않습니다.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
