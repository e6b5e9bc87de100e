//! 플레이어 상태 레지스트리
//!
//! 같은 사용자가 여러 연결로 접속해도 하나의 `PlayerState`를 공유하게 합니다.
//! 영속성 계층은 이 코어의 범위 밖이므로 상태는 프로세스 수명 동안 유지됩니다.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use shared::PlayerState;
use tracing::debug;

use crate::service::session::AuthenticatedUser;

/// 플레이어 레지스트리
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    players: DashMap<u32, Arc<Mutex<PlayerState>>>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 사용자 상태를 가져오거나 새로 생성
    pub fn attach(&self, user: &AuthenticatedUser) -> Arc<Mutex<PlayerState>> {
        self.players
            .entry(user.user_id)
            .or_insert_with(|| {
                debug!("플레이어 상태 생성: 사용자 {}", user.user_id);
                Arc::new(Mutex::new(PlayerState::new(user.user_id, &user.username)))
            })
            .clone()
    }

    pub fn get(&self, user_id: u32) -> Option<Arc<Mutex<PlayerState>>> {
        self.players.get(&user_id).map(|p| p.clone())
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
