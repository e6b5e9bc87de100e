//! TCP 게임 서버
//!
//! 서비스 구성요소를 조립하고 accept 루프를 실행합니다.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use shared::{ClaimStore, Clock, MemoryClaimStore, SystemClock};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::config::TcpServerConfig;
use crate::handler::HandlerRegistry;
use crate::service::auth_service::{SessionAuthenticator, StaticTicketAuthenticator};
use crate::service::calendar_service::CampaignCatalog;
use crate::service::claim_service::ClaimManager;
use crate::service::connection_service::ConnectionService;
use crate::service::dispatch_service::{DispatchStats, ServerContext};
use crate::service::player_service::PlayerRegistry;

/// TCP 게임 서버
pub struct TcpGameService {
    config: TcpServerConfig,
    ctx: Arc<ServerContext>,
    connections: Arc<ConnectionService>,
}

impl TcpGameService {
    /// 설정 파일 경로에서 카탈로그와 티켓을 읽어 서버 구성
    pub fn from_config(config: TcpServerConfig) -> Result<Self> {
        let catalog = match &config.campaigns_path {
            Some(path) => CampaignCatalog::from_file(path)
                .with_context(|| format!("캠페인 로드 실패: {}", path.display()))?,
            None => {
                warn!("campaigns_path 미설정, 빈 카탈로그로 시작합니다");
                CampaignCatalog::empty()
            }
        };

        let authenticator: Arc<dyn SessionAuthenticator> = match &config.tickets_path {
            Some(path) => Arc::new(StaticTicketAuthenticator::from_file(path)?),
            None => {
                warn!("tickets_path 미설정, 모든 로그인이 거부됩니다");
                Arc::new(StaticTicketAuthenticator::default())
            }
        };

        Self::with_parts(
            config,
            Arc::new(catalog),
            Arc::new(MemoryClaimStore::new()),
            Arc::new(SystemClock),
            authenticator,
        )
    }

    /// 구성요소를 직접 지정해서 서버 구성
    pub fn with_parts(
        config: TcpServerConfig,
        catalog: Arc<CampaignCatalog>,
        store: Arc<dyn ClaimStore>,
        clock: Arc<dyn Clock>,
        authenticator: Arc<dyn SessionAuthenticator>,
    ) -> Result<Self> {
        let registry = HandlerRegistry::with_default_handlers()?;
        let claims = Arc::new(ClaimManager::new(catalog.clone(), store, clock));

        let ctx = Arc::new(ServerContext {
            registry: Arc::new(registry),
            catalog,
            claims,
            players: Arc::new(PlayerRegistry::new()),
            stats: Arc::new(DispatchStats::new()),
            settings: config.dispatch_settings(),
        });

        let connections = Arc::new(ConnectionService::new(
            ctx.clone(),
            authenticator,
            config.max_connections,
        ));

        info!(
            "서버 구성 완료: 캠페인 {}개, 핸들러 {}개",
            ctx.catalog.len(),
            ctx.registry.len()
        );

        Ok(Self {
            config,
            ctx,
            connections,
        })
    }

    pub fn context(&self) -> &Arc<ServerContext> {
        &self.ctx
    }

    pub fn config(&self) -> &TcpServerConfig {
        &self.config
    }

    pub fn active_connections(&self) -> usize {
        self.connections.active_connections()
    }

    /// shutdown future가 끝날 때까지 연결 수락
    ///
    /// 이미 수립된 연결 태스크는 종료시키지 않습니다.
    pub async fn run<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        info!("✅ TCP 서버가 {}에서 실행 중입니다", listener.local_addr()?);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("종료 신호 수신, 연결 수락 중단");
                    break;
                }
                accepted = listener.accept() => {
                    let (stream, addr) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            error!("연결 수락 실패: {}", e);
                            continue;
                        }
                    };

                    if let Err(e) = stream.set_nodelay(true) {
                        debug!("TCP_NODELAY 설정 실패 ({}): {}", addr, e);
                    }

                    let connections = self.connections.clone();
                    tokio::spawn(async move {
                        if let Err(e) = connections.handle_connection(stream, addr).await {
                            warn!(%addr, "세션 수립 실패: {}", e);
                        }
                    });
                }
            }
        }

        let stats = self.ctx.stats.snapshot();
        info!(
            handled = stats.handled,
            failed = stats.failed,
            unhandled = stats.unhandled,
            malformed = stats.malformed,
            panicked = stats.panicked,
            "📊 디스패치 통계"
        );
        Ok(())
    }
}
