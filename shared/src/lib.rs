//! 게임 서버 공통 라이브러리
//!
//! TCP 서버와 관리 도구가 함께 사용하는 도메인 모델, 에러 타입,
//! 저장소 트레이트, 시간 도구, 로깅 초기화를 제공합니다.
//!
//! # 모듈 구조
//!
//! ```text
//! shared
//! ├── model (캠페인, 보상, 수령 기록, 플레이어 상태)
//! ├── error_handling (도메인 에러 분류)
//! ├── service (수령 기록 저장소 트레이트 및 메모리 구현)
//! ├── tool (시계 추상화)
//! └── logging (tracing 구독자 초기화)
//! ```

pub mod error_handling;
pub mod logging;
pub mod model;
pub mod service;
pub mod tool;

pub use error_handling::{CampaignError, ClaimError, StoreError};
pub use model::{
    CalendarReward, Campaign, ClaimRecord, DayGate, InventoryItem, PlayerState,
    RewardItem, UnlockSchedule,
};
pub use service::{ClaimStore, MemoryClaimStore};
pub use tool::{Clock, FixedClock, SystemClock};
