//! 연결 서비스
//!
//! 연결 하나의 수명을 관리합니다. 로그인 프레임으로 세션을 만들고,
//! 출력 채널을 쓰기 태스크에 연결한 뒤 디스패치 루프를 실행합니다.
//!
//! ```text
//! 읽기 절반 ──► PacketDispatcher ──► 핸들러 ──► Session::send
//!                                                   │ (mpsc)
//! 쓰기 절반 ◄── write_loop ◄────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::handler::calendar_handler::send_calendars;
use crate::protocol::{
    opcode, read_frame, write_frame, FrameError, IncomingPacket, OutgoingPacket, PacketError,
};
use crate::service::auth_service::SessionAuthenticator;
use crate::service::dispatch_service::{DisconnectReason, PacketDispatcher, ServerContext};
use crate::service::session::{AuthenticatedUser, Session};
use crate::tool::error::{ErrorHandler, HandlerResult};

/// 세션당 출력 대기열 크기
pub const OUTBOUND_QUEUE_SIZE: usize = 256;

/// 세션 수립 전 연결 에러
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("최대 연결 수 초과: {max}")]
    TooManyConnections { max: usize },

    #[error("첫 패킷은 로그인이어야 합니다 (받은 opcode: {opcode})")]
    LoginRequired { opcode: u16 },

    #[error("로그인 티켓 거부")]
    LoginRejected,

    #[error("로그인 대기 시간 초과")]
    LoginTimeout,

    #[error("로그인 전에 연결이 닫혔습니다")]
    ClosedBeforeLogin,

    #[error("잘못된 로그인 패킷: {0}")]
    Malformed(#[from] PacketError),

    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// 활성 연결 슬롯 (drop 시 반환)
struct ConnectionSlot<'a>(&'a AtomicUsize);

impl Drop for ConnectionSlot<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// 연결 서비스
pub struct ConnectionService {
    ctx: Arc<ServerContext>,
    dispatcher: PacketDispatcher,
    authenticator: Arc<dyn SessionAuthenticator>,
    next_session_id: AtomicU64,
    active: AtomicUsize,
    max_connections: usize,
}

impl ConnectionService {
    pub fn new(
        ctx: Arc<ServerContext>,
        authenticator: Arc<dyn SessionAuthenticator>,
        max_connections: usize,
    ) -> Self {
        Self {
            dispatcher: PacketDispatcher::new(ctx.clone()),
            ctx,
            authenticator,
            next_session_id: AtomicU64::new(1),
            active: AtomicUsize::new(0),
            max_connections,
        }
    }

    /// 현재 활성 연결 수
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// 연결 하나를 끝까지 처리
    ///
    /// 세션이 수립되면 종료 사유를, 수립 전에 끊기면 에러를 반환합니다.
    pub async fn handle_connection<S>(
        &self,
        stream: S,
        addr: SocketAddr,
    ) -> Result<DisconnectReason, ConnectionError>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let _slot = self.acquire_slot().ok_or(ConnectionError::TooManyConnections {
            max: self.max_connections,
        })?;

        let (mut reader, writer) = tokio::io::split(stream);
        let user = self.login(&mut reader).await?;

        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        let player = self.ctx.players.attach(&user);
        let write_timeout = self.ctx.settings.write_timeout;
        let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE_SIZE);
        let writer_task = tokio::spawn(write_loop(writer, rx, session_id, write_timeout));

        let session =
            Arc::new(Session::new(session_id, user, player, tx).with_send_timeout(write_timeout));
        let user_id = session.user_id();
        info!(
            session_id,
            user_id,
            %addr,
            "✅ 세션 수립: {}",
            session.user().username
        );

        let reason = match self.greet(&session).await {
            Ok(()) => self.dispatcher.run(&mut reader, &session).await,
            Err(e) => {
                ErrorHandler::handle_error(&e, "greeting", session_id);
                DisconnectReason::Io(e.to_string())
            }
        };

        // 출력 채널을 닫아 쓰기 태스크가 남은 패킷을 보내고 끝나게 함
        drop(session);
        if let Err(e) = writer_task.await {
            warn!(session_id, "쓰기 태스크 비정상 종료: {}", e);
        }
        self.ctx.claims.release_locks(user_id);

        info!(session_id, user_id, %addr, "연결 종료: {:?}", reason);
        Ok(reason)
    }

    fn acquire_slot(&self) -> Option<ConnectionSlot<'_>> {
        self.active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.max_connections).then_some(n + 1)
            })
            .ok()
            .map(|_| ConnectionSlot(&self.active))
    }

    async fn login<R>(&self, reader: &mut R) -> Result<AuthenticatedUser, ConnectionError>
    where
        R: AsyncRead + Unpin,
    {
        let settings = &self.ctx.settings;
        let frame = timeout(
            settings.idle_timeout,
            read_frame(reader, settings.max_frame_size),
        )
        .await
        .map_err(|_| ConnectionError::LoginTimeout)??
        .ok_or(ConnectionError::ClosedBeforeLogin)?;

        let mut packet = IncomingPacket::from_frame(frame)?;
        if packet.opcode() != opcode::incoming::SECURE_LOGIN {
            return Err(ConnectionError::LoginRequired {
                opcode: packet.opcode(),
            });
        }

        let ticket = packet.read_text()?;
        self.authenticator
            .authenticate(ticket.trim())
            .await
            .ok_or(ConnectionError::LoginRejected)
    }

    /// 로그인 직후 인사: 인증 완료 + 캠페인별 현황
    async fn greet(&self, session: &Session) -> HandlerResult<()> {
        session
            .send(OutgoingPacket::new(opcode::outgoing::AUTHENTICATION_OK))
            .await?;
        send_calendars(session, &self.ctx).await
    }
}

/// 출력 채널의 패킷을 소켓에 기록
///
/// 패킷 하나의 쓰기가 `write_timeout` 안에 끝나지 않으면 중단합니다.
/// 수신자가 사라지므로 이후 `Session::send`는 즉시 실패합니다.
async fn write_loop<W>(
    writer: W,
    mut rx: mpsc::Receiver<OutgoingPacket>,
    session_id: u64,
    write_timeout: Duration,
) where
    W: AsyncWrite + Unpin,
{
    let mut writer = BufWriter::new(writer);

    while let Some(packet) = rx.recv().await {
        let write = async {
            write_frame(&mut writer, &packet).await?;
            writer.flush().await
        };

        match timeout(write_timeout, write).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                debug!(session_id, "쓰기 실패, 출력 중단: {}", e);
                return;
            }
            Err(_) => {
                warn!(
                    session_id,
                    "클라이언트가 응답을 읽지 않음 ({:?}), 출력 중단", write_timeout
                );
                return;
            }
        }
    }

    match timeout(write_timeout, writer.shutdown()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!(session_id, "쓰기 종료 실패: {}", e),
        Err(_) => debug!(session_id, "쓰기 종료 시간 초과"),
    }
}
