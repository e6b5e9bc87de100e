//! 패킷 opcode 정의
//!
//! 프레임 헤더 바로 뒤의 2바이트 값으로 처리할 핸들러를 선택합니다.

/// 클라이언트 → 서버
pub mod incoming {
    /// 로그인 티켓 (연결의 첫 프레임만 유효)
    pub const SECURE_LOGIN: u16 = 2419;
    /// 지연 측정 요청 (int id)
    pub const LATENCY_PING: u16 = 295;
    /// 캘린더 날짜 열기 (text campaign, int day)
    pub const CALENDAR_OPEN_DAY: u16 = 2257;
    /// 관리자 강제 열기 (text campaign, int day)
    pub const CALENDAR_FORCE_OPEN: u16 = 3889;
    /// 관리자 캠페인 카탈로그 다시 읽기
    pub const CALENDAR_RELOAD: u16 = 1040;
}

/// 서버 → 클라이언트
pub mod outgoing {
    pub const AUTHENTICATION_OK: u16 = 2491;
    /// 지연 측정 응답 (int id)
    pub const LATENCY_PONG: u16 = 10;
    /// 캠페인 상태 (이름, 이미지, 현재 날짜, 전체 날짜, 열린 날짜들, 만료된 날짜들)
    pub const CALENDAR_DATA: u16 = 2531;
    /// 날짜 보상 지급 결과 (bool, 상품명, 이미지, 아이템명)
    pub const CALENDAR_DOOR_OPENED: u16 = 2551;
    /// 요청 거부 (int code, text message)
    pub const GENERIC_ERROR: u16 = 1600;
}

/// 로그용 opcode 이름
pub fn name(opcode: u16) -> &'static str {
    match opcode {
        incoming::SECURE_LOGIN => "SecureLogin",
        incoming::LATENCY_PING => "LatencyPing",
        incoming::CALENDAR_OPEN_DAY => "CalendarOpenDay",
        incoming::CALENDAR_FORCE_OPEN => "CalendarForceOpen",
        incoming::CALENDAR_RELOAD => "CalendarReload",
        _ => "Unknown",
    }
}
