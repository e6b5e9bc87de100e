//! 보상 수령 기록

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 수령 기록
///
/// 보상이 실제로 지급된 경우에만 생성되며 이후 변경되지 않습니다.
/// 캠페인은 이름으로만 참조하므로 캠페인이 다시 로드되어도 기록은 유지됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub user_id: u32,
    pub campaign: String,
    pub day: i32,
    pub granted_at: DateTime<Utc>,
    /// 관리자 강제 지급 여부
    pub forced: bool,
}

impl ClaimRecord {
    pub fn matches(&self, campaign: &str, day: i32) -> bool {
        self.campaign == campaign && self.day == day
    }
}
