//! 패킷 디스패치 루프
//!
//! 연결마다 하나씩 실행되며 프레임을 읽어 opcode에 맞는 핸들러를 호출합니다.
//!
//! # 복구 규칙
//!
//! - 알 수 없는 opcode: 디버그 로그만 남기고 무시
//! - 본문 디코딩 실패, 핸들러 에러: 로그 + `GENERIC_ERROR` 응답, 루프 계속
//! - 핸들러 패닉: 태스크 경계에서 잡아 500 응답, 루프 계속
//! - 최대 크기 초과 프레임, I/O 오류, 유휴 타임아웃: 루프 종료
//! - 출력 채널 닫힘 (응답을 읽지 않는 클라이언트 포함): 루프 종료
//!
//! 한 세션의 패킷은 도착 순서대로 하나씩 처리됩니다. 핸들러는 별도 태스크에서
//! 실행되지만 다음 프레임을 읽기 전에 완료를 기다립니다.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use tokio::io::AsyncRead;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::handler::HandlerRegistry;
use crate::protocol::{opcode, read_frame, FrameError, IncomingPacket, OutgoingPacket};
use crate::service::calendar_service::CampaignCatalog;
use crate::service::claim_service::ClaimManager;
use crate::service::player_service::PlayerRegistry;
use crate::service::session::Session;
use crate::tool::error::{ErrorHandler, HandlerError};

/// 디스패치 설정
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub max_frame_size: usize,
    pub idle_timeout: Duration,
    /// 응답 한 건을 소켓에 쓰거나 대기열에 넣을 때 기다리는 최대 시간
    pub write_timeout: Duration,
    /// 리로드 시 다시 읽을 캠페인 파일
    pub campaigns_path: Option<PathBuf>,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            max_frame_size: crate::protocol::DEFAULT_MAX_FRAME_SIZE,
            idle_timeout: Duration::from_secs(300),
            write_timeout: crate::service::session::DEFAULT_SEND_TIMEOUT,
            campaigns_path: None,
        }
    }
}

/// 핸들러가 공유하는 서버 컨텍스트
pub struct ServerContext {
    pub registry: Arc<HandlerRegistry>,
    pub catalog: Arc<CampaignCatalog>,
    pub claims: Arc<ClaimManager>,
    pub players: Arc<PlayerRegistry>,
    pub stats: Arc<DispatchStats>,
    pub settings: DispatchSettings,
}

/// 디스패치 통계
#[derive(Debug, Default)]
pub struct DispatchStats {
    handled: AtomicU64,
    failed: AtomicU64,
    unhandled: AtomicU64,
    malformed: AtomicU64,
    panicked: AtomicU64,
}

/// 통계 스냅샷
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStatsSnapshot {
    pub handled: u64,
    pub failed: u64,
    pub unhandled: u64,
    pub malformed: u64,
    pub panicked: u64,
}

impl DispatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> DispatchStatsSnapshot {
        DispatchStatsSnapshot {
            handled: self.handled.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            unhandled: self.unhandled.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// 패킷 하나의 처리 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled,
    /// 등록된 핸들러 없음
    Unhandled,
    /// 에러 응답 전송 (상태 코드)
    Rejected(u16),
    Panicked,
    /// 출력 채널이 닫혀 더 응답할 수 없음
    Closed,
}

/// 디스패치 루프 종료 사유
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// 클라이언트가 연결을 닫음
    Closed,
    IdleTimeout,
    FrameTooLarge { declared: usize, max: usize },
    Io(String),
    /// 쓰기 태스크가 끝났거나 출력 대기열이 비워지지 않음
    OutputClosed,
}

/// 패킷 디스패처
#[derive(Clone)]
pub struct PacketDispatcher {
    ctx: Arc<ServerContext>,
}

impl PacketDispatcher {
    pub fn new(ctx: Arc<ServerContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &Arc<ServerContext> {
        &self.ctx
    }

    /// 연결이 끝날 때까지 프레임을 읽고 디스패치
    pub async fn run<R>(&self, reader: &mut R, session: &Arc<Session>) -> DisconnectReason
    where
        R: AsyncRead + Unpin,
    {
        let settings = &self.ctx.settings;

        loop {
            let frame = match timeout(
                settings.idle_timeout,
                read_frame(reader, settings.max_frame_size),
            )
            .await
            {
                Err(_) => {
                    info!(session_id = session.session_id(), "유휴 타임아웃");
                    return DisconnectReason::IdleTimeout;
                }
                Ok(Ok(Some(frame))) => frame,
                Ok(Ok(None)) => return DisconnectReason::Closed,
                Ok(Err(FrameError::Oversized { declared, max })) => {
                    warn!(
                        session_id = session.session_id(),
                        "최대 크기 초과 프레임 ({} > {}), 연결 종료", declared, max
                    );
                    return DisconnectReason::FrameTooLarge { declared, max };
                }
                Ok(Err(FrameError::Io(e))) => {
                    debug!(session_id = session.session_id(), "읽기 실패: {}", e);
                    return DisconnectReason::Io(e.to_string());
                }
            };

            if self.dispatch_frame(frame, session).await == DispatchOutcome::Closed {
                info!(session_id = session.session_id(), "출력 채널 닫힘, 연결 종료");
                return DisconnectReason::OutputClosed;
            }
        }
    }

    /// 프레임 하나를 디코딩해서 디스패치
    pub async fn dispatch_frame(&self, frame: Bytes, session: &Arc<Session>) -> DispatchOutcome {
        match IncomingPacket::from_frame(frame) {
            Ok(packet) => self.dispatch(packet, session).await,
            Err(e) => {
                DispatchStats::bump(&self.ctx.stats.malformed);
                self.reject(HandlerError::from(e), "decoder", session).await
            }
        }
    }

    /// 패킷 하나를 핸들러로 전달
    pub async fn dispatch(&self, packet: IncomingPacket, session: &Arc<Session>) -> DispatchOutcome {
        let op = packet.opcode();
        let Some(handler) = self.ctx.registry.resolve(op) else {
            DispatchStats::bump(&self.ctx.stats.unhandled);
            debug!(
                session_id = session.session_id(),
                "처리기 없는 opcode {} ({})",
                op,
                opcode::name(op)
            );
            return DispatchOutcome::Unhandled;
        };

        let name = handler.name();
        let ctx = self.ctx.clone();
        let task_session = session.clone();

        // 핸들러 패닉이 연결 루프까지 번지지 않도록 태스크 경계에서 실행
        let task = tokio::spawn(async move {
            let mut packet = packet;
            handler.handle(&mut packet, &task_session, &ctx).await
        });

        match task.await {
            Ok(Ok(())) => {
                DispatchStats::bump(&self.ctx.stats.handled);
                DispatchOutcome::Handled
            }
            Ok(Err(e)) => {
                DispatchStats::bump(&self.ctx.stats.failed);
                if matches!(e, HandlerError::Malformed(_)) {
                    DispatchStats::bump(&self.ctx.stats.malformed);
                }
                self.reject(e, name, session).await
            }
            Err(join_error) => {
                DispatchStats::bump(&self.ctx.stats.panicked);
                error!(
                    session_id = session.session_id(),
                    "🚨 핸들러 패닉 [{}] opcode {}: {}", name, op, join_error
                );
                let packet = OutgoingPacket::generic_error(500, "internal error");
                if session.send(packet).await.is_err() {
                    debug!(session_id = session.session_id(), "에러 응답 전송 불가");
                    return DispatchOutcome::Closed;
                }
                DispatchOutcome::Panicked
            }
        }
    }

    async fn reject(
        &self,
        error: HandlerError,
        component: &str,
        session: &Session,
    ) -> DispatchOutcome {
        ErrorHandler::handle_error(&error, component, session.session_id());

        if !error.is_reportable() {
            return DispatchOutcome::Closed;
        }

        let code = error.status_code();
        let packet = OutgoingPacket::generic_error(code, &error.client_message());
        if session.send(packet).await.is_err() {
            debug!(session_id = session.session_id(), "에러 응답 전송 불가");
            return DispatchOutcome::Closed;
        }
        DispatchOutcome::Rejected(code)
    }
}
