//! 메모리 기반 수령 기록 저장소
//!
//! 단일 프로세스 환경과 테스트에서 사용합니다. 사용자별로 샤딩된
//! DashMap 항목 하나에 기록을 추가하므로 쓰기는 항목 단위로 원자적입니다.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use crate::error_handling::StoreError;
use crate::model::{CalendarReward, ClaimRecord};
use crate::service::ClaimStore;

/// 메모리 수령 기록 저장소
#[derive(Debug, Default)]
pub struct MemoryClaimStore {
    /// user_id -> 수령 기록 목록 (지급 순서)
    claims: DashMap<u32, Vec<ClaimRecord>>,
}

impl MemoryClaimStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 사용자의 전체 수령 기록
    pub fn claims_of(&self, user_id: u32) -> Vec<ClaimRecord> {
        self.claims
            .get(&user_id)
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// 특정 키의 기록 수 (강제 지급 포함)
    pub fn count(&self, user_id: u32, campaign: &str, day: i32) -> usize {
        self.claims
            .get(&user_id)
            .map(|records| records.iter().filter(|r| r.matches(campaign, day)).count())
            .unwrap_or(0)
    }
}

#[async_trait]
impl ClaimStore for MemoryClaimStore {
    async fn load_claims(
        &self,
        user_id: u32,
        campaign: &str,
    ) -> Result<Vec<ClaimRecord>, StoreError> {
        Ok(self
            .claims
            .get(&user_id)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| r.campaign == campaign)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn commit_claim(
        &self,
        record: &ClaimRecord,
        reward: &CalendarReward,
    ) -> Result<(), StoreError> {
        self.claims
            .entry(record.user_id)
            .or_default()
            .push(record.clone());

        debug!(
            user_id = record.user_id,
            campaign = %record.campaign,
            day = record.day,
            product = %reward.product_name,
            "수령 기록 저장"
        );
        Ok(())
    }
}
