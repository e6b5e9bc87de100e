//! 연결 수립 테스트
//!
//! 로그인 프레임 검사, 인사 패킷, 최대 연결 수를 메모리 스트림으로 확인합니다.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use shared::{FixedClock, MemoryClaimStore};
use tokio::io::DuplexStream;

use super::*;
use crate::protocol::{read_frame, write_frame};
use crate::service::{
    ConnectionError, ConnectionService, DisconnectReason, StaticTicketAuthenticator,
};

fn test_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 50000))
}

fn connection_service(max_connections: usize) -> Arc<ConnectionService> {
    connection_service_with(max_connections, DispatchSettings::default())
}

fn connection_service_with(
    max_connections: usize,
    settings: DispatchSettings,
) -> Arc<ConnectionService> {
    let ctx = create_test_context(
        HandlerRegistry::with_default_handlers().expect("registry"),
        vec![winter_campaign(december_schedule())],
        Arc::new(MemoryClaimStore::new()),
        Arc::new(FixedClock::at_date(date(2024, 12, 5))),
        settings,
    );

    let mut tickets = HashMap::new();
    tickets.insert("player-ticket".to_string(), player_user());
    let authenticator = Arc::new(StaticTicketAuthenticator::new(tickets));

    Arc::new(ConnectionService::new(ctx, authenticator, max_connections))
}

async fn next_packet(client: &mut DuplexStream) -> IncomingPacket {
    let frame = read_frame(client, 64 * 1024)
        .await
        .expect("read")
        .expect("frame");
    IncomingPacket::from_frame(frame).expect("decode")
}

fn login(ticket: &str) -> OutgoingPacket {
    OutgoingPacket::new(opcode::incoming::SECURE_LOGIN).append_text(ticket)
}

/// 로그인 후 인증 완료와 캠페인 현황을 받고, 요청을 처리
#[tokio::test]
async fn test_login_then_open_day() {
    let service = connection_service(10);
    let (mut client, server) = tokio::io::duplex(4096);

    let task = {
        let service = service.clone();
        tokio::spawn(async move { service.handle_connection(server, test_addr()).await })
    };

    write_frame(&mut client, &login("player-ticket")).await.expect("login");
    assert_eq!(
        next_packet(&mut client).await.opcode(),
        opcode::outgoing::AUTHENTICATION_OK
    );

    let mut data = next_packet(&mut client).await;
    assert_eq!(data.opcode(), opcode::outgoing::CALENDAR_DATA);
    assert_eq!(data.read_text().expect("name"), CAMPAIGN);
    assert_eq!(data.read_text().expect("image"), "winter.png");
    assert_eq!(data.read_int().expect("current day"), 4);
    assert_eq!(data.read_int().expect("total days"), 24);
    assert_eq!(data.read_int().expect("opened"), 0);
    assert_eq!(data.read_int().expect("expired"), 2);
    assert_eq!(service.active_connections(), 1);

    let open = OutgoingPacket::new(opcode::incoming::CALENDAR_OPEN_DAY)
        .append_text(CAMPAIGN)
        .append_int(4);
    write_frame(&mut client, &open).await.expect("open");
    assert_eq!(
        next_packet(&mut client).await.opcode(),
        opcode::outgoing::CALENDAR_DOOR_OPENED
    );

    drop(client);
    let reason = task.await.expect("task").expect("session");
    assert_eq!(reason, DisconnectReason::Closed);
    assert_eq!(service.active_connections(), 0);

    println!("✅ 로그인 후 날짜 열기 테스트 통과");
}

/// 첫 프레임이 로그인이 아니면 연결 종료
#[tokio::test]
async fn test_first_frame_must_be_login() {
    let service = connection_service(10);
    let (mut client, server) = tokio::io::duplex(1024);

    let ping = OutgoingPacket::new(opcode::incoming::LATENCY_PING).append_int(1);
    write_frame(&mut client, &ping).await.expect("write");

    let result = service.handle_connection(server, test_addr()).await;
    assert!(matches!(
        result,
        Err(ConnectionError::LoginRequired {
            opcode: opcode::incoming::LATENCY_PING
        })
    ));

    // 서버가 스트림을 닫았으므로 더 읽을 프레임이 없음
    assert!(read_frame(&mut client, 1024).await.expect("eof").is_none());
}

/// 알 수 없는 티켓은 거부
#[tokio::test]
async fn test_unknown_ticket_rejected() {
    let service = connection_service(10);
    let (mut client, server) = tokio::io::duplex(1024);

    write_frame(&mut client, &login("forged")).await.expect("write");

    let result = service.handle_connection(server, test_addr()).await;
    assert!(matches!(result, Err(ConnectionError::LoginRejected)));
    assert_eq!(service.active_connections(), 0);
}

/// 최대 연결 수를 넘으면 즉시 거부
#[tokio::test]
async fn test_max_connections() {
    let service = connection_service(1);
    let (mut first_client, first_server) = tokio::io::duplex(4096);

    let first = {
        let service = service.clone();
        tokio::spawn(async move { service.handle_connection(first_server, test_addr()).await })
    };
    write_frame(&mut first_client, &login("player-ticket"))
        .await
        .expect("login");
    next_packet(&mut first_client).await; // AUTHENTICATION_OK

    let (_second_client, second_server) = tokio::io::duplex(1024);
    let result = service.handle_connection(second_server, test_addr()).await;
    assert!(matches!(
        result,
        Err(ConnectionError::TooManyConnections { max: 1 })
    ));

    drop(first_client);
    first.await.expect("task").expect("session");
    assert_eq!(service.active_connections(), 0);
}

/// 응답을 읽지 않는 클라이언트는 쓰기 시간 초과 후 끊기고 슬롯을 반환
#[tokio::test]
async fn test_stalled_reader_releases_slot() {
    let service = connection_service_with(
        1,
        DispatchSettings {
            idle_timeout: Duration::from_millis(100),
            write_timeout: Duration::from_millis(100),
            ..Default::default()
        },
    );
    let (mut client, server) = tokio::io::duplex(64);

    // 로그인 후 핑만 계속 보내고 응답은 읽지 않음
    let flood = tokio::spawn(async move {
        if write_frame(&mut client, &login("player-ticket")).await.is_ok() {
            let ping = OutgoingPacket::new(opcode::incoming::LATENCY_PING).append_int(7);
            for _ in 0..2000 {
                if write_frame(&mut client, &ping).await.is_err() {
                    break;
                }
            }
        }
        client
    });

    let result = tokio::time::timeout(
        Duration::from_secs(3),
        service.handle_connection(server, test_addr()),
    )
    .await
    .expect("연결이 쓰기 시간 초과 안에 끝나야 함");

    assert_eq!(result.expect("session"), DisconnectReason::OutputClosed);
    assert_eq!(service.active_connections(), 0);

    // 슬롯이 비었으므로 다음 연결을 받을 수 있음
    let (mut next_client, next_server) = tokio::io::duplex(4096);
    let next = {
        let service = service.clone();
        tokio::spawn(async move { service.handle_connection(next_server, test_addr()).await })
    };
    write_frame(&mut next_client, &login("player-ticket"))
        .await
        .expect("login");
    assert_eq!(
        next_packet(&mut next_client).await.opcode(),
        opcode::outgoing::AUTHENTICATION_OK
    );

    drop(next_client);
    next.await.expect("task").expect("session");
    drop(flood.await.expect("flood task"));

    println!("✅ 응답 미수신 클라이언트 정리 테스트 통과");
}
