//! 통합 로깅 초기화
//!
//! 모든 바이너리는 `tracing` 매크로로 로그를 남기고, 시작 시 한 번
//! `init_logging`으로 fmt 구독자를 설치합니다.
//!
//! # 사용 예시
//! ```rust,no_run
//! use shared::logging::{init_logging, LoggingConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_logging(&LoggingConfig::from_env("tcpserver"))?;
//!     tracing::info!("서버 시작");
//!     Ok(())
//! }
//! ```

pub mod config;

pub use config::LoggingConfig;

use anyhow::{anyhow, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 로깅 시스템 초기화
///
/// `RUST_LOG`가 설정되어 있으면 그 필터를, 아니면 `config.level`을 사용합니다.
/// 이미 전역 구독자가 설치되어 있으면 에러를 반환합니다.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| anyhow!("잘못된 로그 필터 '{}': {}", config.level, e))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target)
        .with_ansi(config.ansi)
        .try_init()
        .map_err(|e| anyhow!("로깅 초기화 실패: {}", e))?;

    info!(service = %config.service_name, "로깅 초기화 완료");
    Ok(())
}
