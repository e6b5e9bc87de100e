//! 캘린더 핸들러
//!
//! 날짜 열기, 관리자 강제 열기, 캠페인 리로드를 처리합니다.

use async_trait::async_trait;
use tracing::info;

use crate::handler::PacketHandler;
use crate::protocol::{opcode, IncomingPacket, OutgoingPacket};
use crate::service::calendar_service::CatalogError;
use crate::service::claim_service::{CalendarView, ClaimOutcome};
use crate::service::dispatch_service::ServerContext;
use crate::service::session::Session;
use crate::tool::error::{HandlerError, HandlerResult};

/// 날짜 열기 요청 (text campaign, int day)
pub struct CalendarOpenDayHandler;

#[async_trait]
impl PacketHandler for CalendarOpenDayHandler {
    fn name(&self) -> &'static str {
        "CalendarOpenDayHandler"
    }

    async fn handle(
        &self,
        packet: &mut IncomingPacket,
        session: &Session,
        ctx: &ServerContext,
    ) -> HandlerResult<()> {
        let campaign = packet.read_text()?;
        let day = packet.read_int()?;

        let outcome = ctx.claims.claim(session, &campaign, day, false).await?;
        session.send(compose_door_opened(&outcome)).await
    }
}

/// 관리자 강제 열기 (text campaign, int day)
///
/// 일정, 중복 수령 검사를 모두 건너뜁니다. 캠페인과 날짜는 여전히 유효해야 합니다.
pub struct CalendarForceOpenHandler;

#[async_trait]
impl PacketHandler for CalendarForceOpenHandler {
    fn name(&self) -> &'static str {
        "CalendarForceOpenHandler"
    }

    async fn handle(
        &self,
        packet: &mut IncomingPacket,
        session: &Session,
        ctx: &ServerContext,
    ) -> HandlerResult<()> {
        let campaign = packet.read_text()?;
        let day = packet.read_int()?;

        if !session.is_staff() {
            return Err(HandlerError::Forbidden {
                action: "calendar_force_open",
            });
        }

        let outcome = ctx.claims.claim(session, &campaign, day, true).await?;
        info!(
            session_id = session.session_id(),
            staff = %session.user().username,
            campaign = %campaign,
            day,
            "관리자 강제 열기"
        );
        session.send(compose_door_opened(&outcome)).await
    }
}

/// 캠페인 카탈로그 리로드 (본문 없음)
///
/// 성공하면 요청한 세션에 갱신된 `CALENDAR_DATA`를 다시 보냅니다.
pub struct CalendarReloadHandler;

#[async_trait]
impl PacketHandler for CalendarReloadHandler {
    fn name(&self) -> &'static str {
        "CalendarReloadHandler"
    }

    async fn handle(
        &self,
        _packet: &mut IncomingPacket,
        session: &Session,
        ctx: &ServerContext,
    ) -> HandlerResult<()> {
        if !session.is_staff() {
            return Err(HandlerError::Forbidden {
                action: "calendar_reload",
            });
        }

        let path = ctx
            .settings
            .campaigns_path
            .as_ref()
            .ok_or(CatalogError::NoSource)?;
        let count = ctx.catalog.reload_from_file(path)?;
        info!(
            staff = %session.user().username,
            "캠페인 카탈로그 리로드: {}개",
            count
        );

        send_calendars(session, ctx).await
    }
}

/// 세션 사용자의 모든 캠페인 현황 전송
pub async fn send_calendars(session: &Session, ctx: &ServerContext) -> HandlerResult<()> {
    for name in ctx.catalog.names() {
        let view = ctx.claims.calendar_view(session.user_id(), &name).await?;
        session.send(compose_calendar_data(&view)).await?;
    }
    Ok(())
}

/// `CALENDAR_DATA`
///
/// ```text
/// text name, text image, int current_day, int total_days,
/// int opened_count, int[] opened, int expired_count, int[] expired
/// ```
pub fn compose_calendar_data(view: &CalendarView) -> OutgoingPacket {
    let mut packet = OutgoingPacket::new(opcode::outgoing::CALENDAR_DATA)
        .append_text(&view.campaign)
        .append_text(&view.image)
        .append_int(view.current_day)
        .append_int(view.total_days)
        .append_int(view.opened_days.len() as i32);
    for day in &view.opened_days {
        packet = packet.append_int(*day);
    }

    packet = packet.append_int(view.expired_days.len() as i32);
    for day in &view.expired_days {
        packet = packet.append_int(*day);
    }
    packet
}

/// `CALENDAR_DOOR_OPENED` (bool ok, text product, text image, text item)
pub fn compose_door_opened(outcome: &ClaimOutcome) -> OutgoingPacket {
    OutgoingPacket::new(opcode::outgoing::CALENDAR_DOOR_OPENED)
        .append_bool(true)
        .append_text(&outcome.reward.product_name)
        .append_text(&outcome.reward.custom_image)
        .append_text(outcome.reward.item_name())
}
