//! TCP 서버 - 캘린더 보상 게임 서버

use anyhow::{Context, Result};
use shared::logging::{init_logging, LoggingConfig};
use tcpserver::{validate_config, TcpGameService, TcpServerConfig};
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // 로그 레벨이 .env에 있을 수 있으므로 로깅보다 먼저 로드
    TcpServerConfig::load_env_file();
    init_logging(&LoggingConfig::from_env("tcpserver"))?;

    let config = TcpServerConfig::from_env()?;
    validate_config(&config)?;

    let bind_addr = config.bind_address();
    info!("🚀 TCP 서버 시작 중... ({})", bind_addr);

    let server = TcpGameService::from_config(config)?;
    let listener = TcpListener::bind(&bind_addr)
        .await
        .context("TCP 리스너 바인드 실패")?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("종료 신호 대기 실패: {}", e);
        }
    };

    server.run(listener, shutdown).await?;
    info!("🛑 TCP 서버 종료");
    Ok(())
}
