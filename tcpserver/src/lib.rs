//! TCP 게임 서버 라이브러리
//!
//! 바이너리 패킷 프로토콜 위에서 캘린더 보상 기능을 제공합니다.
//!
//! # 주요 기능
//!
//! - **프레임 코덱**: 길이 접두 프레임, opcode, 텍스트/정수 필드
//! - **핸들러 레지스트리**: opcode별 핸들러, 중복 등록 거부
//! - **디스패치 루프**: 연결별 순차 처리, 패킷 단위 에러 복구
//! - **보상 수령**: (사용자, 캠페인, 날짜)당 최대 한 번, 관리자 강제 지급
//!
//! # 아키텍처
//!
//! ```text
//! TCP Server
//! ├── Service Layer (비즈니스 로직)
//! │   ├── TcpGameService (accept 루프)
//! │   ├── ConnectionService (세션 수립)
//! │   ├── PacketDispatcher (디스패치 루프)
//! │   ├── ClaimManager (보상 수령)
//! │   └── CampaignCatalog (캠페인 카탈로그)
//! ├── Handler Layer (요청 처리)
//! │   ├── LatencyPingHandler
//! │   ├── CalendarOpenDayHandler
//! │   ├── CalendarForceOpenHandler
//! │   └── CalendarReloadHandler
//! ├── Tool Layer
//! │   └── Error (에러 처리)
//! └── Protocol (프레임 코덱, opcode)
//! ```

/// 환경 설정 관리
pub mod config;

/// 패킷 프레임 코덱과 opcode 정의
pub mod protocol;

/// 비즈니스 로직 서비스 레이어
pub mod service;

/// 요청 처리 핸들러 레이어
pub mod handler;

/// 에러 처리 도구
pub mod tool;

#[cfg(test)]
mod tests;

pub use config::{validate_config, TcpServerConfig};
pub use handler::{HandlerRegistry, PacketHandler, RegistryError};
pub use protocol::{IncomingPacket, OutgoingPacket, PacketError};
pub use service::{ClaimManager, ConnectionService, PacketDispatcher, ServerContext, TcpGameService};
pub use tool::error::{HandlerError, HandlerResult};
