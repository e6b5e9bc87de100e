//! 도메인 모델

pub mod campaign_model;
pub mod claim_model;
pub mod user_model;

pub use campaign_model::{CalendarReward, Campaign, DayGate, RewardItem, UnlockSchedule};
pub use claim_model::ClaimRecord;
pub use user_model::{InventoryItem, PlayerState, PIXELS_POINTS_TYPE};
