//! 로깅 설정 관리

use serde::{Deserialize, Serialize};

/// 로깅 시스템 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 서비스 이름 (로그 첫 줄에 기록)
    pub service_name: String,

    /// 기본 필터 (기본값: "info"). `RUST_LOG`가 있으면 그쪽이 우선합니다.
    pub level: String,

    /// 모듈 경로 출력 여부 (기본값: true)
    pub with_target: bool,

    /// 터미널 색상 사용 여부 (기본값: true)
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            service_name: "tcpserver".to_string(),
            level: "info".to_string(),
            with_target: true,
            ansi: true,
        }
    }
}

impl LoggingConfig {
    /// 서비스 이름과 필터로 생성
    pub fn new(service_name: &str, level: &str) -> Self {
        Self {
            service_name: service_name.to_string(),
            level: level.to_string(),
            ..Default::default()
        }
    }

    /// 환경변수에서 설정 로드
    pub fn from_env(service_name: &str) -> Self {
        let mut config = Self {
            service_name: service_name.to_string(),
            ..Default::default()
        };

        if let Ok(val) = std::env::var("log_level") {
            if !val.trim().is_empty() {
                config.level = val;
            }
        }

        if let Ok(val) = std::env::var("LOG_WITH_TARGET") {
            config.with_target = val.to_lowercase() == "true";
        }

        if let Ok(val) = std::env::var("LOG_ANSI") {
            config.ansi = val.to_lowercase() == "true";
        }

        config
    }
}
