//! 핸들러 에러 처리 시스템
//!
//! 패킷 처리 중 발생하는 모든 에러를 분류하고, 디스패치 루프가
//! 한 곳에서 로깅과 클라이언트 응답 코드를 결정할 수 있게 합니다.

use shared::ClaimError;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::protocol::PacketError;
use crate::service::calendar_service::CatalogError;

/// 핸들러 에러
///
/// 어떤 변형도 연결을 종료시키지 않습니다. 디스패치 루프가 받아서
/// 로그를 남기고 `GENERIC_ERROR` 응답으로 바꿉니다.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("잘못된 패킷: {0}")]
    Malformed(#[from] PacketError),

    #[error("보상 수령 거부: {0}")]
    Claim(#[from] ClaimError),

    #[error("권한 없음: {action}")]
    Forbidden { action: &'static str },

    #[error("캠페인 카탈로그 오류: {0}")]
    Catalog(#[from] CatalogError),

    #[error("세션 출력 채널이 닫혔습니다")]
    SessionClosed,

    #[error("핸들러 내부 오류: {message}")]
    Internal { message: String },
}

impl HandlerError {
    /// 클라이언트 응답용 상태 코드
    ///
    /// 잘못된 요청(400)과 거부된 수령(403/404/409/410/422)을 구분합니다.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Malformed(_) => 400,
            Self::Claim(e) => e.status_code(),
            Self::Forbidden { .. } => 403,
            Self::Catalog(_) | Self::SessionClosed | Self::Internal { .. } => 500,
        }
    }

    /// 클라이언트에 보낼 메시지
    ///
    /// 내부 오류는 상세 내용을 노출하지 않습니다.
    pub fn client_message(&self) -> String {
        match self {
            Self::Malformed(_) => "bad request".to_string(),
            Self::Claim(ClaimError::Storage(_)) => "internal error".to_string(),
            Self::Claim(e) => e.to_string(),
            Self::Forbidden { action } => format!("forbidden: {}", action),
            Self::Catalog(_) | Self::SessionClosed | Self::Internal { .. } => {
                "internal error".to_string()
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Claim(ClaimError::Storage(_)) => ErrorSeverity::Error,
            Self::Claim(_) => ErrorSeverity::Info,
            Self::Malformed(_) | Self::Forbidden { .. } | Self::SessionClosed => {
                ErrorSeverity::Warning
            }
            Self::Catalog(_) => ErrorSeverity::Error,
            Self::Internal { .. } => ErrorSeverity::Critical,
        }
    }

    /// 응답을 보낼 수 있는 에러인지 (출력 채널이 살아있는 경우)
    pub fn is_reportable(&self) -> bool {
        !matches!(self, Self::SessionClosed)
    }
}

/// 결과 타입 별칭
pub type HandlerResult<T> = Result<T, HandlerError>;

/// 에러 심각도 레벨
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// 정보성 - 정상 동작 중 발생하는 예상 가능한 상황 (이미 수령 등)
    Info,
    /// 경고 - 클라이언트 입력 문제, 서비스는 계속 가능
    Warning,
    /// 에러 - 기능에 영향을 주지만 복구 가능
    Error,
    /// 치명적 - 핸들러 버그 또는 패닉
    Critical,
}

/// 에러 핸들러
///
/// 디스패치 루프의 단일 복구 지점에서 호출되어 에러를 심각도별로 기록합니다.
pub struct ErrorHandler;

impl ErrorHandler {
    /// 패킷 처리 에러 로깅
    ///
    /// # Arguments
    ///
    /// * `error` - 처리할 에러
    /// * `component` - 에러가 발생한 컴포넌트 (핸들러 이름)
    /// * `session_id` - 세션 ID
    pub fn handle_error(error: &HandlerError, component: &str, session_id: u64) {
        let code = error.status_code();

        match error.severity() {
            ErrorSeverity::Info => info!(session_id, code, "[{}] {}", component, error),
            ErrorSeverity::Warning => warn!(session_id, code, "[{}] {}", component, error),
            ErrorSeverity::Error => error!(session_id, code, "[{}] {}", component, error),
            ErrorSeverity::Critical => {
                error!(session_id, code, "🚨 CRITICAL: [{}] {}", component, error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::StoreError;

    #[test]
    fn test_rejected_claim_distinct_from_malformed() {
        let malformed = HandlerError::from(PacketError::MissingOpcode { len: 0 });
        let claimed = HandlerError::from(ClaimError::AlreadyClaimed {
            user_id: 1,
            campaign: "WINTER2024".to_string(),
            day: 3,
        });

        assert_eq!(malformed.status_code(), 400);
        assert_eq!(claimed.status_code(), 409);
        assert_eq!(malformed.client_message(), "bad request");
        assert!(claimed.client_message().contains("WINTER2024"));
    }

    #[test]
    fn test_storage_detail_not_exposed() {
        let err = HandlerError::from(ClaimError::from(StoreError::Write {
            message: "db password wrong".to_string(),
        }));

        assert_eq!(err.status_code(), 500);
        assert_eq!(err.client_message(), "internal error");
        assert_eq!(err.severity(), ErrorSeverity::Error);
    }

    #[test]
    fn test_severity_logging_does_not_panic() {
        let errors = vec![
            HandlerError::Forbidden {
                action: "calendar_force_open",
            },
            HandlerError::SessionClosed,
            HandlerError::Internal {
                message: "테스트".to_string(),
            },
        ];

        for e in &errors {
            ErrorHandler::handle_error(e, "test_component", 1);
        }
        assert!(!HandlerError::SessionClosed.is_reportable());
    }
}
