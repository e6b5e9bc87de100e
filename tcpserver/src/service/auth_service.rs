//! 세션 인증 경계
//!
//! 실제 인증(티켓 발급, 토큰 검증)은 외부 협력자의 몫입니다. 서버는
//! `SessionAuthenticator` 트레이트로만 의존하며, 실행 가능한 바이너리를 위해
//! 설정 파일 기반 정적 티켓 인증기를 제공합니다.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use crate::service::session::AuthenticatedUser;

/// 로그인 티켓 인증기
#[async_trait]
pub trait SessionAuthenticator: Send + Sync {
    /// 티켓을 검증하고 사용자 정보를 반환합니다. 거부 시 None.
    async fn authenticate(&self, ticket: &str) -> Option<AuthenticatedUser>;
}

/// 티켓 파일 형식
#[derive(Debug, Default, Deserialize)]
struct TicketFile {
    tickets: HashMap<String, AuthenticatedUser>,
}

/// 정적 티켓 인증기
#[derive(Debug, Default)]
pub struct StaticTicketAuthenticator {
    tickets: HashMap<String, AuthenticatedUser>,
}

impl StaticTicketAuthenticator {
    pub fn new(tickets: HashMap<String, AuthenticatedUser>) -> Self {
        Self { tickets }
    }

    /// JSON 파일에서 티켓 목록 로드
    ///
    /// ```json
    /// { "tickets": { "abc123": { "user_id": 1, "username": "admin", "rank": 7 } } }
    /// ```
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("티켓 파일 읽기 실패: {}", path.display()))?;
        let file: TicketFile = serde_json::from_str(&raw)
            .with_context(|| format!("티켓 파일 파싱 실패: {}", path.display()))?;

        info!("로그인 티켓 {}개 로드", file.tickets.len());
        Ok(Self::new(file.tickets))
    }

    pub fn insert(&mut self, ticket: &str, user: AuthenticatedUser) {
        self.tickets.insert(ticket.to_string(), user);
    }
}

#[async_trait]
impl SessionAuthenticator for StaticTicketAuthenticator {
    async fn authenticate(&self, ticket: &str) -> Option<AuthenticatedUser> {
        let user = self.tickets.get(ticket).cloned();
        if user.is_none() {
            warn!("알 수 없는 로그인 티켓");
        }
        user
    }
}
