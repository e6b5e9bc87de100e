//! TCP 서버 서비스 레이어
//!
//! # 서비스 구조
//!
//! ```text
//! Service Layer
//! ├── TcpGameService (accept 루프, 구성요소 조립)
//! ├── ConnectionService (로그인, 세션 수립, 쓰기 태스크)
//! ├── PacketDispatcher (프레임 → 핸들러, 에러 복구)
//! ├── ClaimManager (자격 판정, 원자적 보상 지급)
//! ├── CampaignCatalog (캠페인 조회, 원자적 리로드)
//! ├── PlayerRegistry (사용자별 게임 상태)
//! └── SessionAuthenticator (로그인 티켓 검증)
//! ```

pub mod auth_service;
pub mod calendar_service;
pub mod claim_service;
pub mod connection_service;
pub mod dispatch_service;
pub mod player_service;
pub mod session;
pub mod tcp_service;

pub use auth_service::{SessionAuthenticator, StaticTicketAuthenticator};
pub use calendar_service::{CampaignCatalog, CatalogError};
pub use claim_service::{CalendarView, ClaimManager, ClaimOutcome};
pub use connection_service::{ConnectionError, ConnectionService};
pub use dispatch_service::{
    DisconnectReason, DispatchOutcome, DispatchSettings, DispatchStats, DispatchStatsSnapshot,
    PacketDispatcher, ServerContext,
};
pub use player_service::PlayerRegistry;
pub use session::{AuthenticatedUser, Session, STAFF_RANK};
pub use tcp_service::TcpGameService;
