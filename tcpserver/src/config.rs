//! TCP 서버 환경 설정 모듈
//!
//! Backend/.env 파일에서 환경변수를 로드하고 관리합니다.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

use crate::protocol::{DEFAULT_MAX_FRAME_SIZE, FRAME_LENGTH_SIZE, OPCODE_SIZE};
use crate::service::dispatch_service::DispatchSettings;

/// TCP 서버 설정 구조체
#[derive(Debug, Clone)]
pub struct TcpServerConfig {
    /// TCP 서버 호스트 주소
    pub host: String,
    /// TCP 서버 포트 번호
    pub port: u16,
    /// 동시 접속 최대 수
    pub max_connections: usize,
    /// 프레임 최대 크기 (opcode + 본문, 바이트)
    pub max_frame_size: usize,
    /// 프레임 없이 유지되는 최대 시간 (초)
    pub idle_timeout_secs: u64,
    /// 응답 쓰기 대기 최대 시간 (초)
    pub write_timeout_secs: u64,
    /// 캠페인 정의 JSON 파일
    pub campaigns_path: Option<PathBuf>,
    /// 로그인 티켓 JSON 파일
    pub tickets_path: Option<PathBuf>,
    /// 기본 로그 레벨 (RUST_LOG가 우선)
    pub log_level: String,
}

impl Default for TcpServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4000,
            max_connections: 1000,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            idle_timeout_secs: 300,
            write_timeout_secs: 10,
            campaigns_path: None,
            tickets_path: None,
            log_level: "info".to_string(),
        }
    }
}

impl TcpServerConfig {
    /// 환경변수에서 설정을 로드합니다.
    ///
    /// 로드 순서:
    /// 1. 프로젝트 루트의 .env 파일 (Backend/.env)
    /// 2. 현재 디렉토리의 .env 파일
    /// 3. 시스템 환경변수
    /// 4. 기본값
    pub fn from_env() -> Result<Self> {
        match Self::load_env_file() {
            Some(path) => info!(".env 파일 로드 성공: {}", path),
            None => warn!(".env 파일을 찾을 수 없습니다. 기본값과 시스템 환경변수를 사용합니다."),
        }

        let defaults = Self::default();
        let config = Self {
            host: std::env::var("tcp_host").unwrap_or(defaults.host),
            port: env_or("tcp_port", defaults.port),
            max_connections: env_or("max_connections", defaults.max_connections),
            max_frame_size: env_or("max_frame_size", defaults.max_frame_size),
            idle_timeout_secs: env_or("idle_timeout_secs", defaults.idle_timeout_secs),
            write_timeout_secs: env_or("write_timeout_secs", defaults.write_timeout_secs),
            campaigns_path: env_path("campaigns_path"),
            tickets_path: env_path("tickets_path"),
            log_level: std::env::var("log_level").unwrap_or(defaults.log_level),
        };

        info!("TCP 서버 설정 로드 완료: {:?}", config);
        Ok(config)
    }

    /// TCP 서버 바인딩 주소를 반환합니다.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// 디스패치 루프 설정
    pub fn dispatch_settings(&self) -> DispatchSettings {
        DispatchSettings {
            max_frame_size: self.max_frame_size,
            idle_timeout: self.idle_timeout(),
            write_timeout: Duration::from_secs(self.write_timeout_secs),
            campaigns_path: self.campaigns_path.clone(),
        }
    }

    /// .env 파일을 로드하고 찾은 경로를 반환합니다.
    ///
    /// 로그 레벨도 .env에서 오므로 로깅 초기화 전에 호출할 수 있도록
    /// 여기서는 로그를 남기지 않습니다. 이미 설정된 환경변수는 덮어쓰지 않으므로
    /// 여러 번 호출해도 결과가 같습니다.
    pub fn load_env_file() -> Option<&'static str> {
        // 여러 위치에서 .env 파일 찾기
        let env_paths = [
            "../.env",    // 상위 디렉토리 (Backend/.env)
            ".env",       // 현재 디렉토리
            "../../.env", // 상위의 상위 디렉토리 (프로젝트 루트)
        ];

        env_paths
            .into_iter()
            .find(|path| Path::new(path).exists() && dotenv::from_filename(path).is_ok())
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("환경변수 {} 값이 잘못되어 기본값 사용: {}", key, raw);
            default
        }),
        Err(_) => default,
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

/// 설정 검증 유틸리티
pub fn validate_config(config: &TcpServerConfig) -> Result<()> {
    // u16 최대값은 65535이므로 0만 검사
    if config.port == 0 {
        anyhow::bail!("유효하지 않은 TCP 포트 번호: {}", config.port);
    }

    if config.host.is_empty() {
        anyhow::bail!("TCP 호스트 주소가 비어있습니다");
    }

    if config.max_connections == 0 {
        anyhow::bail!("max_connections는 0보다 커야 합니다");
    }

    let max_frame_limit = u32::MAX as usize - FRAME_LENGTH_SIZE;
    if config.max_frame_size < OPCODE_SIZE || config.max_frame_size > max_frame_limit {
        anyhow::bail!("유효하지 않은 max_frame_size: {}", config.max_frame_size);
    }

    if config.idle_timeout_secs == 0 {
        anyhow::bail!("idle_timeout_secs는 0보다 커야 합니다");
    }

    if config.write_timeout_secs == 0 {
        anyhow::bail!("write_timeout_secs는 0보다 커야 합니다");
    }

    Ok(())
}
