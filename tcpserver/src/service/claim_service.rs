//! 캘린더 보상 수령 서비스
//!
//! 사용자별 수령 기록을 기준으로 자격을 판정하고 보상을 지급합니다.
//!
//! # 원자성
//!
//! 수령 한 건은 (사용자, 캠페인) 잠금 아래에서 다음 순서로 실행됩니다.
//!
//! ```text
//! 자격 확인 (강제 지급이면 생략)
//!   → 저장소에 기록 + 지급 내역 커밋
//!   → 플레이어 상태에 보상 반영 (동기, await 없음)
//! ```
//!
//! 커밋이 실패하면 아무것도 지급되지 않고, 커밋이 성공하면 같은 poll 안에서
//! 보상이 반영됩니다. 커밋 도중 future가 취소되지 않도록 디스패치 루프는
//! 핸들러를 별도 태스크로 끝까지 실행합니다.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use shared::{
    CalendarReward, Campaign, ClaimError, ClaimRecord, ClaimStore, Clock, DayGate,
    InventoryItem, PlayerState,
};
use tracing::{debug, info, warn};

use crate::service::calendar_service::CampaignCatalog;
use crate::service::session::Session;

/// 수령 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimOutcome {
    pub record: ClaimRecord,
    pub reward: CalendarReward,
    /// 새로 생성된 인벤토리 아이템 (보상에 아이템이 있을 때)
    pub item: Option<InventoryItem>,
}

/// 사용자별 캠페인 진행 현황
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarView {
    pub campaign: String,
    pub image: String,
    pub current_day: i32,
    pub total_days: i32,
    pub opened_days: Vec<i32>,
    pub expired_days: Vec<i32>,
}

type LockKey = (u32, String);

/// 보상 수령 관리자
pub struct ClaimManager {
    catalog: Arc<CampaignCatalog>,
    store: Arc<dyn ClaimStore>,
    clock: Arc<dyn Clock>,
    /// (user_id, campaign) -> 직렬화 잠금
    locks: DashMap<LockKey, Arc<tokio::sync::Mutex<()>>>,
    next_item_id: AtomicU32,
}

impl ClaimManager {
    pub fn new(
        catalog: Arc<CampaignCatalog>,
        store: Arc<dyn ClaimStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog,
            store,
            clock,
            locks: DashMap::new(),
            next_item_id: AtomicU32::new(1),
        }
    }

    /// 세션 사용자의 보상 수령
    pub async fn claim(
        &self,
        session: &Session,
        campaign: &str,
        day: i32,
        force: bool,
    ) -> Result<ClaimOutcome, ClaimError> {
        self.claim_for(session.user_id(), session.player(), campaign, day, force)
            .await
    }

    /// 보상 수령
    ///
    /// # Errors
    ///
    /// * `UnknownCampaign` - 카탈로그에 없는 캠페인 (강제 지급도 동일)
    /// * `InvalidDay` - 캠페인 범위를 벗어난 날짜 (강제 지급도 동일)
    /// * `AlreadyClaimed` - 이미 수령한 날짜 (강제 지급은 생략)
    /// * `NotYetEligible` / `Expired` - 일정상 수령 불가 (강제 지급은 생략)
    /// * `Storage` - 커밋 실패, 아무것도 지급되지 않음
    pub async fn claim_for(
        &self,
        user_id: u32,
        player: &Arc<Mutex<PlayerState>>,
        campaign_name: &str,
        day: i32,
        force: bool,
    ) -> Result<ClaimOutcome, ClaimError> {
        let campaign = self.resolve(campaign_name)?;
        let reward = campaign
            .reward(day)
            .cloned()
            .ok_or_else(|| ClaimError::InvalidDay {
                campaign: campaign.name.clone(),
                day,
                total_days: campaign.total_days(),
            })?;

        let lock = self.lock_for(user_id, &campaign.name);
        let _guard = lock.lock().await;

        if !force {
            self.check_eligibility(user_id, &campaign, day).await?;
        }

        let item = reward.item.as_ref().map(|item| InventoryItem {
            item_id: self.next_item_id.fetch_add(1, Ordering::Relaxed),
            base_item_id: item.base_item_id,
            item_name: item.item_name.clone(),
        });

        let record = ClaimRecord {
            user_id,
            campaign: campaign.name.clone(),
            day,
            granted_at: self.clock.now(),
            forced: force,
        };

        if let Err(e) = self.store.commit_claim(&record, &reward).await {
            warn!(
                user_id,
                campaign = %campaign.name,
                day,
                "수령 커밋 실패, 지급하지 않음: {}",
                e
            );
            return Err(e.into());
        }

        player.lock().credit(&reward, item.clone());

        info!(
            user_id,
            campaign = %campaign.name,
            day,
            forced = force,
            product = %reward.product_name,
            "캘린더 보상 지급"
        );

        Ok(ClaimOutcome {
            record,
            reward,
            item,
        })
    }

    /// 사용자별 캠페인 진행 현황 조회
    pub async fn calendar_view(
        &self,
        user_id: u32,
        campaign_name: &str,
    ) -> Result<CalendarView, ClaimError> {
        let campaign = self.resolve(campaign_name)?;
        let claims = self.store.load_claims(user_id, &campaign.name).await?;
        let opened: BTreeSet<i32> = claims.iter().map(|c| c.day).collect();
        let today = self.clock.today();
        let total_days = campaign.total_days();

        let current_day = match campaign.days_since_start(today) {
            Some(since) => since.clamp(0, i64::from(total_days - 1)) as i32,
            None => (0..total_days)
                .find(|d| !opened.contains(d))
                .unwrap_or(total_days - 1),
        };

        let expired_days = (0..total_days)
            .filter(|d| !opened.contains(d))
            .filter(|d| {
                let previous = *d > 0 && opened.contains(&(d - 1));
                campaign.gate(*d, today, previous) == DayGate::Expired
            })
            .collect();

        Ok(CalendarView {
            campaign: campaign.name.clone(),
            image: campaign.image.clone(),
            current_day,
            total_days,
            opened_days: opened.into_iter().collect(),
            expired_days,
        })
    }

    /// 사용자의 잠금 항목 정리
    ///
    /// 다른 곳에서 사용 중인 잠금은 남겨둡니다.
    pub fn release_locks(&self, user_id: u32) {
        self.locks
            .retain(|(owner, _), lock| *owner != user_id || Arc::strong_count(lock) > 1);
    }

    fn resolve(&self, campaign_name: &str) -> Result<Arc<Campaign>, ClaimError> {
        self.catalog
            .get(campaign_name)
            .ok_or_else(|| ClaimError::UnknownCampaign {
                campaign: campaign_name.to_string(),
            })
    }

    fn lock_for(&self, user_id: u32, campaign: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.locks
            .entry((user_id, campaign.to_string()))
            .or_default()
            .clone()
    }

    async fn check_eligibility(
        &self,
        user_id: u32,
        campaign: &Campaign,
        day: i32,
    ) -> Result<(), ClaimError> {
        let claims = self.store.load_claims(user_id, &campaign.name).await?;

        if claims.iter().any(|c| c.day == day) {
            return Err(ClaimError::AlreadyClaimed {
                user_id,
                campaign: campaign.name.clone(),
                day,
            });
        }

        let previous_claimed = day > 0 && claims.iter().any(|c| c.day == day - 1);
        match campaign.gate(day, self.clock.today(), previous_claimed) {
            DayGate::Unlocked => Ok(()),
            DayGate::Locked => {
                debug!(user_id, campaign = %campaign.name, day, "아직 열리지 않은 날짜");
                Err(ClaimError::NotYetEligible {
                    campaign: campaign.name.clone(),
                    day,
                })
            }
            DayGate::Expired => Err(ClaimError::Expired {
                campaign: campaign.name.clone(),
                day,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use shared::{FixedClock, MemoryClaimStore, RewardItem, UnlockSchedule};

    fn winter(schedule: UnlockSchedule) -> Campaign {
        Campaign {
            name: "WINTER2024".to_string(),
            image: "winter.png".to_string(),
            schedule,
            rewards: (0..24)
                .map(|d| {
                    (
                        d,
                        CalendarReward {
                            product_name: format!("gift_{}", d),
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

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn manager(
        schedule: UnlockSchedule,
        today: NaiveDate,
    ) -> (ClaimManager, Arc<MemoryClaimStore>, Arc<FixedClock>) {
        let catalog = Arc::new(CampaignCatalog::new(vec![winter(schedule)]).expect("catalog"));
        let store = Arc::new(MemoryClaimStore::new());
        let clock = Arc::new(FixedClock::at_date(today));
        (
            ClaimManager::new(catalog, store.clone(), clock.clone()),
            store,
            clock,
        )
    }

    fn player() -> Arc<Mutex<PlayerState>> {
        Arc::new(Mutex::new(PlayerState::new(1, "tester")))
    }

    #[tokio::test]
    async fn test_lock_expired_rejects_old_days() {
        let (manager, _, _) = manager(
            UnlockSchedule::Calendar {
                start_date: date(2024, 12, 1),
                lock_expired: true,
            },
            date(2024, 12, 10),
        );
        let p = player();

        let result = manager.claim_for(1, &p, "WINTER2024", 2, false).await;
        assert!(matches!(result, Err(ClaimError::Expired { day: 2, .. })));

        // 강제 지급은 만료도 무시
        assert!(manager.claim_for(1, &p, "WINTER2024", 2, true).await.is_ok());
        assert!(manager.claim_for(1, &p, "WINTER2024", 8, false).await.is_ok());
    }

    #[tokio::test]
    async fn test_sequential_requires_previous_day() {
        let (manager, _, _) = manager(UnlockSchedule::Sequential, date(2024, 1, 1));
        let p = player();

        assert!(matches!(
            manager.claim_for(1, &p, "WINTER2024", 1, false).await,
            Err(ClaimError::NotYetEligible { day: 1, .. })
        ));
        manager
            .claim_for(1, &p, "WINTER2024", 0, false)
            .await
            .expect("day 0");
        manager
            .claim_for(1, &p, "WINTER2024", 1, false)
            .await
            .expect("day 1");
    }

    #[tokio::test]
    async fn test_item_ids_are_unique() {
        let (manager, _, _) = manager(UnlockSchedule::Sequential, date(2024, 1, 1));
        let p = player();

        let first = manager
            .claim_for(1, &p, "WINTER2024", 0, false)
            .await
            .expect("claim");
        let second = manager
            .claim_for(1, &p, "WINTER2024", 0, true)
            .await
            .expect("forced");

        let first_id = first.item.map(|i| i.item_id);
        let second_id = second.item.map(|i| i.item_id);
        assert!(first_id.is_some());
        assert_ne!(first_id, second_id);
        assert_eq!(p.lock().inventory.len(), 2);
        assert!(second.record.forced);
    }

    #[tokio::test]
    async fn test_calendar_view() {
        let (manager, _, clock) = manager(
            UnlockSchedule::Calendar {
                start_date: date(2024, 12, 1),
                lock_expired: true,
            },
            date(2024, 12, 4),
        );
        let p = player();

        manager
            .claim_for(1, &p, "WINTER2024", 1, false)
            .await
            .expect("claim");
        clock.advance_days(3); // 6일 경과

        let view = manager.calendar_view(1, "WINTER2024").await.expect("view");
        assert_eq!(view.current_day, 6);
        assert_eq!(view.total_days, 24);
        assert_eq!(view.opened_days, vec![1]);
        assert_eq!(view.expired_days, vec![0, 2, 3]);

        assert!(matches!(
            manager.calendar_view(1, "NOPE").await,
            Err(ClaimError::UnknownCampaign { .. })
        ));
    }

    #[tokio::test]
    async fn test_release_locks() {
        let (manager, _, _) = manager(UnlockSchedule::Sequential, date(2024, 1, 1));
        let p = player();

        manager
            .claim_for(1, &p, "WINTER2024", 0, false)
            .await
            .expect("claim");
        assert_eq!(manager.locks.len(), 1);

        manager.release_locks(2);
        assert_eq!(manager.locks.len(), 1);
        manager.release_locks(1);
        assert!(manager.locks.is_empty());
    }
}
