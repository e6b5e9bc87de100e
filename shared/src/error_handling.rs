//! 도메인 에러 처리
//!
//! 캠페인 정의, 보상 수령, 저장소에서 발생하는 에러를 분류합니다.
//!
//! # 설계 원칙
//! - 도메인 에러는 타입으로 구분되어 핸들러까지 그대로 전달됨
//! - 클라이언트가 "이미 수령함"과 "잘못된 요청"을 구분할 수 있도록 상태 코드 제공
//! - 저장소 에러는 보상 지급 전에 발생하므로 부분 지급 상태가 없음

use thiserror::Error;

/// 캠페인 정의 검증 에러
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CampaignError {
    #[error("캠페인 이름이 비어있습니다")]
    EmptyName,

    #[error("캠페인 {campaign}에 보상이 없습니다")]
    NoRewards { campaign: String },

    #[error("캠페인 {campaign}의 날짜가 연속적이지 않음: {expected}일차 대신 {found}일차")]
    NonContiguousDays {
        campaign: String,
        expected: i32,
        found: i32,
    },
}

/// 수령 기록 저장소 에러
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("수령 기록 쓰기 실패: {message}")]
    Write { message: String },

    #[error("수령 기록 조회 실패: {message}")]
    Read { message: String },
}

/// 보상 수령 에러
///
/// 핸들러로 반환되는 도메인 에러입니다. 연결을 끊는 원인이 되지 않습니다.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClaimError {
    #[error("알 수 없는 캠페인: {campaign}")]
    UnknownCampaign { campaign: String },

    #[error("유효하지 않은 날짜: {campaign} {day}일차 (전체 {total_days}일)")]
    InvalidDay {
        campaign: String,
        day: i32,
        total_days: i32,
    },

    #[error("이미 수령한 보상: 사용자 {user_id}, {campaign} {day}일차")]
    AlreadyClaimed {
        user_id: u32,
        campaign: String,
        day: i32,
    },

    #[error("아직 열리지 않은 날짜: {campaign} {day}일차")]
    NotYetEligible { campaign: String, day: i32 },

    #[error("수령 기간이 지난 날짜: {campaign} {day}일차")]
    Expired { campaign: String, day: i32 },

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl ClaimError {
    /// 클라이언트 응답용 상태 코드
    pub fn status_code(&self) -> u16 {
        match self {
            Self::UnknownCampaign { .. } => 404,
            Self::InvalidDay { .. } => 422,
            Self::AlreadyClaimed { .. } => 409,
            Self::NotYetEligible { .. } => 403,
            Self::Expired { .. } => 410,
            Self::Storage(_) => 500,
        }
    }
}
