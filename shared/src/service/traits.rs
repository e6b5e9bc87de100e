//! 공통 서비스 트레이트 정의
//!
//! 영속성 계층과의 경계입니다. 구현체는 데이터베이스, 파일, 메모리 등
//! 무엇이든 될 수 있으나 아래 원자성 계약을 지켜야 합니다.

use async_trait::async_trait;

use crate::error_handling::StoreError;
use crate::model::{CalendarReward, ClaimRecord};

/// 보상 수령 기록 저장소
///
/// `commit_claim`은 수령 기록과 지급 내역을 하나의 단위로 영속화합니다.
/// 에러를 반환했다면 아무것도 기록되지 않아야 하고, 성공했다면 기록이
/// 즉시 `load_claims`에 보여야 합니다.
#[async_trait]
pub trait ClaimStore: Send + Sync {
    /// 사용자의 특정 캠페인 수령 기록 조회
    async fn load_claims(&self, user_id: u32, campaign: &str)
        -> Result<Vec<ClaimRecord>, StoreError>;

    /// 수령 기록과 지급 내역을 원자적으로 저장
    async fn commit_claim(
        &self,
        record: &ClaimRecord,
        reward: &CalendarReward,
    ) -> Result<(), StoreError>;
}
