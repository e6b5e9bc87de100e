//! TCP 서버 테스트 모듈
//!
//! 각 기능별로 분리된 테스트 파일들을 관리합니다.

mod test_connection;

// 테스트 유틸리티
use std::sync::Arc;

use chrono::NaiveDate;
use shared::{CalendarReward, Campaign, ClaimStore, Clock, RewardItem, UnlockSchedule};
use tokio::sync::mpsc;

use crate::handler::HandlerRegistry;
use crate::protocol::{opcode, IncomingPacket, OutgoingPacket};
use crate::service::{
    AuthenticatedUser, CampaignCatalog, ClaimManager, DispatchSettings, DispatchStats,
    PlayerRegistry, ServerContext, Session,
};

pub const CAMPAIGN: &str = "WINTER2024";

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// 24일짜리 테스트 캠페인 (날짜마다 10 크레딧 + 아이템 하나)
pub fn winter_campaign(schedule: UnlockSchedule) -> Campaign {
    Campaign {
        name: CAMPAIGN.to_string(),
        image: "winter.png".to_string(),
        schedule,
        rewards: (0..24)
            .map(|d| {
                (
                    d,
                    CalendarReward {
                        product_name: format!("gift_{}", d),
                        custom_image: format!("gift_{}.png", d),
                        credits: 10,
                        item: Some(RewardItem {
                            base_item_id: 4000 + d as u32,
                            item_name: format!("xmas_gift_{}", d),
                        }),
                        ..Default::default()
                    },
                )
            })
            .collect(),
    }
}

/// 12월 1일 시작, 만료 잠금 켜진 달력 일정
pub fn december_schedule() -> UnlockSchedule {
    UnlockSchedule::Calendar {
        start_date: date(2024, 12, 1),
        lock_expired: true,
    }
}

/// 테스트용 서버 컨텍스트 생성
pub fn create_test_context(
    registry: HandlerRegistry,
    campaigns: Vec<Campaign>,
    store: Arc<dyn ClaimStore>,
    clock: Arc<dyn Clock>,
    settings: DispatchSettings,
) -> Arc<ServerContext> {
    let catalog = Arc::new(CampaignCatalog::new(campaigns).expect("catalog"));
    Arc::new(ServerContext {
        registry: Arc::new(registry),
        claims: Arc::new(ClaimManager::new(catalog.clone(), store, clock)),
        catalog,
        players: Arc::new(PlayerRegistry::new()),
        stats: Arc::new(DispatchStats::new()),
        settings,
    })
}

/// 테스트용 세션 생성 (출력 패킷은 반환된 수신자로 확인)
pub fn create_test_session(
    ctx: &ServerContext,
    session_id: u64,
    user: AuthenticatedUser,
) -> (Arc<Session>, mpsc::Receiver<OutgoingPacket>) {
    let (tx, rx) = mpsc::channel(64);
    let player = ctx.players.attach(&user);
    (Arc::new(Session::new(session_id, user, player, tx)), rx)
}

pub fn player_user() -> AuthenticatedUser {
    AuthenticatedUser::new(1, "player", 1)
}

pub fn staff_user() -> AuthenticatedUser {
    AuthenticatedUser::new(2, "admin", 7)
}

/// 날짜 열기 요청 패킷
pub fn open_day_packet(op: u16, campaign: &str, day: i32) -> IncomingPacket {
    OutgoingPacket::new(op)
        .append_text(campaign)
        .append_int(day)
        .to_incoming()
}

/// `GENERIC_ERROR` 패킷에서 상태 코드 추출
pub fn error_code(packet: &OutgoingPacket) -> Option<i32> {
    if packet.opcode() != opcode::outgoing::GENERIC_ERROR {
        return None;
    }
    packet.to_incoming().read_int().ok()
}
