//! 세션
//!
//! 인증된 클라이언트 하나를 나타냅니다. 연결이 세션을 독점 소유하며
//! 인증 시 생성되고 연결 종료 시 사라집니다.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use shared::PlayerState;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;
use tracing::debug;

use crate::protocol::OutgoingPacket;
use crate::tool::error::{HandlerError, HandlerResult};

/// 관리자 기능에 필요한 최소 등급
pub const STAFF_RANK: u8 = 5;

/// 출력 대기열이 가득 찼을 때 기다리는 기본 시간
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// 인증된 사용자 정보
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: u32,
    pub username: String,
    #[serde(default = "default_rank")]
    pub rank: u8,
}

fn default_rank() -> u8 {
    1
}

impl AuthenticatedUser {
    pub fn new(user_id: u32, username: &str, rank: u8) -> Self {
        Self {
            user_id,
            username: username.to_string(),
            rank,
        }
    }
}

/// 클라이언트 세션
#[derive(Debug)]
pub struct Session {
    session_id: u64,
    user: AuthenticatedUser,
    player: Arc<Mutex<PlayerState>>,
    outbound: mpsc::Sender<OutgoingPacket>,
    send_timeout: Duration,
}

impl Session {
    pub fn new(
        session_id: u64,
        user: AuthenticatedUser,
        player: Arc<Mutex<PlayerState>>,
        outbound: mpsc::Sender<OutgoingPacket>,
    ) -> Self {
        Self {
            session_id,
            user,
            player,
            outbound,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    /// 출력 대기열 대기 시간 지정
    pub fn with_send_timeout(mut self, send_timeout: Duration) -> Self {
        self.send_timeout = send_timeout;
        self
    }

    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    pub fn user_id(&self) -> u32 {
        self.user.user_id
    }

    pub fn user(&self) -> &AuthenticatedUser {
        &self.user
    }

    pub fn is_staff(&self) -> bool {
        self.user.rank >= STAFF_RANK
    }

    /// 사용자 게임 상태 (같은 사용자의 세션끼리 공유)
    pub fn player(&self) -> &Arc<Mutex<PlayerState>> {
        &self.player
    }

    /// 출력 채널로 패킷 전송
    ///
    /// 대기열이 가득 차면 `send_timeout`까지만 기다립니다. 응답을 읽지 않는
    /// 클라이언트는 그 뒤로 닫힌 세션으로 취급합니다.
    pub async fn send(&self, packet: OutgoingPacket) -> HandlerResult<()> {
        self.outbound
            .send_timeout(packet, self.send_timeout)
            .await
            .map_err(|e| {
                if let SendTimeoutError::Timeout(_) = e {
                    debug!(
                        session_id = self.session_id,
                        "출력 대기열 포화, 세션 종료 처리"
                    );
                }
                HandlerError::SessionClosed
            })
    }
}
