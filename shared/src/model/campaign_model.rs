//! 캘린더 캠페인 모델
//!
//! 캠페인은 날짜(0부터 시작)별 보상과 개방 일정을 가집니다.
//! 로드 후에는 변경되지 않으며 모든 세션이 읽기 전용으로 공유합니다.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error_handling::CampaignError;

/// 보상으로 지급되는 가구 아이템
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardItem {
    /// 기본 아이템 ID
    pub base_item_id: u32,
    /// 가구 클래스 이름 (클라이언트 표시용)
    pub item_name: String,
}

/// 하루치 보상 정의
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarReward {
    pub product_name: String,
    pub custom_image: String,
    pub credits: i32,
    /// 픽셀 (포인트 타입 0)
    pub pixels: i32,
    pub points: i32,
    pub points_type: i32,
    pub badge: Option<String>,
    pub item: Option<RewardItem>,
}

impl CalendarReward {
    /// 클라이언트에 표시할 아이템 이름, 아이템이 없으면 빈 문자열
    pub fn item_name(&self) -> &str {
        self.item.as_ref().map(|i| i.item_name.as_str()).unwrap_or("")
    }
}

/// 날짜 개방 일정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UnlockSchedule {
    /// 시작일 기준 달력 개방
    ///
    /// `lock_expired`가 켜져 있으면 오늘 기준 2일보다 오래된 날짜는 수령할 수 없습니다.
    Calendar {
        start_date: NaiveDate,
        #[serde(default)]
        lock_expired: bool,
    },
    /// 순차 개방: 이전 날짜를 수령해야 다음 날짜가 열림
    Sequential,
}

/// 특정 날짜의 개방 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayGate {
    Unlocked,
    Locked,
    Expired,
}

/// 만료 전 수령이 허용되는 지난 날짜 수
pub const EXPIRED_GRACE_DAYS: i64 = 2;

/// 캘린더 캠페인
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub name: String,
    #[serde(default)]
    pub image: String,
    pub schedule: UnlockSchedule,
    pub rewards: BTreeMap<i32, CalendarReward>,
}

impl Campaign {
    pub fn total_days(&self) -> i32 {
        self.rewards.len() as i32
    }

    pub fn reward(&self, day: i32) -> Option<&CalendarReward> {
        self.rewards.get(&day)
    }

    /// 캠페인 정의 검증
    ///
    /// 날짜는 0부터 `total_days - 1`까지 빠짐없이 정의되어야 합니다.
    pub fn validate(&self) -> Result<(), CampaignError> {
        if self.name.trim().is_empty() {
            return Err(CampaignError::EmptyName);
        }

        if self.rewards.is_empty() {
            return Err(CampaignError::NoRewards {
                campaign: self.name.clone(),
            });
        }

        for (expected, day) in self.rewards.keys().enumerate() {
            if *day != expected as i32 {
                return Err(CampaignError::NonContiguousDays {
                    campaign: self.name.clone(),
                    expected: expected as i32,
                    found: *day,
                });
            }
        }

        Ok(())
    }

    /// 시작일로부터 지난 일수 (달력 일정이 아니면 None)
    pub fn days_since_start(&self, today: NaiveDate) -> Option<i64> {
        match &self.schedule {
            UnlockSchedule::Calendar { start_date, .. } => {
                Some((today - *start_date).num_days())
            }
            UnlockSchedule::Sequential => None,
        }
    }

    /// 날짜 개방 상태 판정
    ///
    /// `previous_claimed`는 순차 일정에서만 사용됩니다.
    pub fn gate(&self, day: i32, today: NaiveDate, previous_claimed: bool) -> DayGate {
        match &self.schedule {
            UnlockSchedule::Calendar {
                start_date,
                lock_expired,
            } => {
                let since = (today - *start_date).num_days();
                let day = i64::from(day);

                if since < day {
                    DayGate::Locked
                } else if *lock_expired && since - day > EXPIRED_GRACE_DAYS {
                    DayGate::Expired
                } else {
                    DayGate::Unlocked
                }
            }
            UnlockSchedule::Sequential => {
                if day == 0 || previous_claimed {
                    DayGate::Unlocked
                } else {
                    DayGate::Locked
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campaign(schedule: UnlockSchedule, days: i32) -> Campaign {
        Campaign {
            name: "WINTER2024".to_string(),
            image: "winter.png".to_string(),
            schedule,
            rewards: (0..days)
                .map(|d| {
                    (
                        d,
                        CalendarReward {
                            product_name: format!("day_{}", d),
                            credits: 10,
                            ..Default::default()
                        },
                    )
                })
                .collect(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn test_validate_rejects_gaps() {
        let mut c = campaign(UnlockSchedule::Sequential, 3);
        c.rewards.remove(&1);

        assert_eq!(
            c.validate(),
            Err(CampaignError::NonContiguousDays {
                campaign: "WINTER2024".to_string(),
                expected: 1,
                found: 2,
            })
        );
    }

    #[test]
    fn test_validate_rejects_empty() {
        let c = campaign(UnlockSchedule::Sequential, 0);
        assert!(matches!(c.validate(), Err(CampaignError::NoRewards { .. })));
    }

    #[test]
    fn test_calendar_gate() {
        let c = campaign(
            UnlockSchedule::Calendar {
                start_date: date(2024, 12, 1),
                lock_expired: false,
            },
            24,
        );

        assert_eq!(c.gate(3, date(2024, 12, 4), false), DayGate::Unlocked);
        assert_eq!(c.gate(4, date(2024, 12, 4), false), DayGate::Locked);
        assert_eq!(c.gate(0, date(2024, 11, 30), false), DayGate::Locked);
        // 만료 잠금이 없으면 지난 날짜도 계속 수령 가능
        assert_eq!(c.gate(0, date(2024, 12, 20), false), DayGate::Unlocked);
    }

    #[test]
    fn test_calendar_gate_with_expiry() {
        let c = campaign(
            UnlockSchedule::Calendar {
                start_date: date(2024, 12, 1),
                lock_expired: true,
            },
            24,
        );

        let today = date(2024, 12, 6); // 5일 경과
        assert_eq!(c.gate(3, today, false), DayGate::Unlocked);
        assert_eq!(c.gate(2, today, false), DayGate::Expired);
        assert_eq!(c.gate(6, today, false), DayGate::Locked);
    }

    #[test]
    fn test_sequential_gate() {
        let c = campaign(UnlockSchedule::Sequential, 5);
        let today = date(2024, 1, 1);

        assert_eq!(c.gate(0, today, false), DayGate::Unlocked);
        assert_eq!(c.gate(2, today, false), DayGate::Locked);
        assert_eq!(c.gate(2, today, true), DayGate::Unlocked);
    }

    #[test]
    fn test_schedule_json_shape() {
        let json = r#"{
            "name": "WINTER2024",
            "schedule": { "type": "calendar", "start_date": "2024-12-01", "lock_expired": true },
            "rewards": { "0": { "product_name": "cookie", "credits": 5 } }
        }"#;

        let c: Campaign = serde_json::from_str(json).expect("campaign json");
        assert_eq!(c.total_days(), 1);
        assert_eq!(c.reward(0).map(|r| r.credits), Some(5));
        assert_eq!(c.reward(0).map(|r| r.item_name()), Some(""));
        assert!(c.validate().is_ok());
    }
}
