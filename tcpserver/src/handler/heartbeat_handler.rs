//! 지연 측정 핸들러

use async_trait::async_trait;
use tracing::trace;

use crate::handler::PacketHandler;
use crate::protocol::{opcode, IncomingPacket, OutgoingPacket};
use crate::service::dispatch_service::ServerContext;
use crate::service::session::Session;
use crate::tool::error::HandlerResult;

/// `LATENCY_PING` → 같은 id로 `LATENCY_PONG`
pub struct LatencyPingHandler;

#[async_trait]
impl PacketHandler for LatencyPingHandler {
    fn name(&self) -> &'static str {
        "LatencyPingHandler"
    }

    async fn handle(
        &self,
        packet: &mut IncomingPacket,
        session: &Session,
        _ctx: &ServerContext,
    ) -> HandlerResult<()> {
        let id = packet.read_int()?;
        trace!(session_id = session.session_id(), "ping {}", id);

        session
            .send(OutgoingPacket::new(opcode::outgoing::LATENCY_PONG).append_int(id))
            .await
    }
}
