//! 플레이어 상태 모델
//!
//! 인증된 사용자의 재화, 배지, 인벤토리를 담습니다.
//! 같은 사용자의 중복 접속은 하나의 상태를 공유합니다.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::CalendarReward;

/// 픽셀 재화의 포인트 타입
pub const PIXELS_POINTS_TYPE: i32 = 0;

/// 인벤토리 아이템 인스턴스
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub item_id: u32,
    pub base_item_id: u32,
    pub item_name: String,
}

/// 플레이어 상태
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub user_id: u32,
    pub username: String,
    pub credits: i32,
    /// 포인트 타입 -> 수량
    pub points: HashMap<i32, i32>,
    pub badges: Vec<String>,
    pub inventory: Vec<InventoryItem>,
}

impl PlayerState {
    pub fn new(user_id: u32, username: &str) -> Self {
        Self {
            user_id,
            username: username.to_string(),
            ..Default::default()
        }
    }

    pub fn points(&self, points_type: i32) -> i32 {
        self.points.get(&points_type).copied().unwrap_or(0)
    }

    pub fn pixels(&self) -> i32 {
        self.points(PIXELS_POINTS_TYPE)
    }

    pub fn has_badge(&self, code: &str) -> bool {
        self.badges.iter().any(|b| b == code)
    }

    /// 보상 지급
    ///
    /// `item`은 보상에 아이템이 있을 때 호출자가 새 ID를 할당해 전달합니다.
    /// 이미 가진 배지는 다시 추가하지 않습니다.
    pub fn credit(&mut self, reward: &CalendarReward, item: Option<InventoryItem>) {
        self.credits = self.credits.saturating_add(reward.credits);

        if reward.pixels != 0 {
            self.add_points(PIXELS_POINTS_TYPE, reward.pixels);
        }
        if reward.points != 0 {
            self.add_points(reward.points_type, reward.points);
        }

        if let Some(badge) = &reward.badge {
            if !self.has_badge(badge) {
                self.badges.push(badge.clone());
            }
        }

        if let Some(item) = item {
            self.inventory.push(item);
        }
    }

    fn add_points(&mut self, points_type: i32, amount: i32) {
        let entry = self.points.entry(points_type).or_insert(0);
        *entry = entry.saturating_add(amount);
    }
}
