//! TCP 서버 핸들러 레이어
//!
//! opcode 하나에 핸들러 하나가 묶입니다. 레지스트리는 시작 시 한 번 구성된 뒤
//! `Arc`로 공유되어 잠금 없이 동시에 조회됩니다.
//!
//! # 핸들러 계약
//!
//! - 패킷 필드는 작성된 순서대로 읽습니다.
//! - 응답이 필요하면 세션 출력 채널로 보냅니다.
//! - 실패는 `HandlerError`로 반환합니다. 디스패치 루프가 받아서 처리하며
//!   연결은 유지됩니다.
//! - 호출 간 상태를 갖지 않습니다.

pub mod calendar_handler;
pub mod heartbeat_handler;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use crate::protocol::{opcode, IncomingPacket};
use crate::service::dispatch_service::ServerContext;
use crate::service::session::Session;
use crate::tool::error::HandlerResult;

pub use calendar_handler::{
    CalendarForceOpenHandler, CalendarOpenDayHandler, CalendarReloadHandler,
};
pub use heartbeat_handler::LatencyPingHandler;

/// 패킷 핸들러
#[async_trait]
pub trait PacketHandler: Send + Sync {
    /// 로그용 핸들러 이름
    fn name(&self) -> &'static str;

    /// 세션 하나의 패킷 하나 처리
    async fn handle(
        &self,
        packet: &mut IncomingPacket,
        session: &Session,
        ctx: &ServerContext,
    ) -> HandlerResult<()>;
}

/// 레지스트리 구성 에러 (시작 시 치명적)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("opcode {opcode} 중복 등록: 기존 {existing}, 신규 {attempted}")]
    DuplicateOpcode {
        opcode: u16,
        existing: &'static str,
        attempted: &'static str,
    },
}

/// opcode → 핸들러 레지스트리
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<u16, Arc<dyn PacketHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 서버가 처리하는 모든 핸들러 등록
    pub fn with_default_handlers() -> Result<Self, RegistryError> {
        info!("메시지 핸들러 등록 시작");

        let mut registry = Self::new();
        registry.register(opcode::incoming::LATENCY_PING, LatencyPingHandler)?;
        registry.register(opcode::incoming::CALENDAR_OPEN_DAY, CalendarOpenDayHandler)?;
        registry.register(opcode::incoming::CALENDAR_FORCE_OPEN, CalendarForceOpenHandler)?;
        registry.register(opcode::incoming::CALENDAR_RELOAD, CalendarReloadHandler)?;

        info!("✅ 메시지 핸들러 {}개 등록 완료", registry.len());
        Ok(registry)
    }

    /// 핸들러 등록
    ///
    /// # Errors
    ///
    /// * `DuplicateOpcode` - 이미 다른 핸들러가 묶인 opcode
    pub fn register<H>(&mut self, opcode: u16, handler: H) -> Result<(), RegistryError>
    where
        H: PacketHandler + 'static,
    {
        if let Some(existing) = self.handlers.get(&opcode) {
            return Err(RegistryError::DuplicateOpcode {
                opcode,
                existing: existing.name(),
                attempted: handler.name(),
            });
        }

        debug!("핸들러 등록: {} -> {}", opcode, handler.name());
        self.handlers.insert(opcode, Arc::new(handler));
        Ok(())
    }

    /// opcode에 묶인 핸들러 조회 (없으면 None)
    pub fn resolve(&self, opcode: u16) -> Option<Arc<dyn PacketHandler>> {
        self.handlers.get(&opcode).cloned()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// 정렬된 opcode 목록
    pub fn opcodes(&self) -> Vec<u16> {
        let mut opcodes: Vec<u16> = self.handlers.keys().copied().collect();
        opcodes.sort_unstable();
        opcodes
    }
}
