//! 캠페인 카탈로그 서비스
//!
//! 캠페인 정의를 읽기 전용으로 공유합니다. 다시 읽기는 새 맵을 완전히
//! 만든 뒤 포인터만 교체하므로, 조회 중인 세션은 항상 완성된 캠페인을 봅니다.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared::{Campaign, CampaignError};
use thiserror::Error;
use tracing::{info, warn};

/// 카탈로그 로드 에러
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("캠페인 파일 읽기 실패 [{path}]: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("캠페인 파일 파싱 실패: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("잘못된 캠페인 정의: {0}")]
    Invalid(#[from] CampaignError),

    #[error("중복된 캠페인 이름: {0}")]
    DuplicateCampaign(String),

    #[error("캠페인 파일 경로가 설정되지 않았습니다")]
    NoSource,
}

/// 캠페인 파일 형식
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampaignFile {
    pub campaigns: Vec<Campaign>,
}

type CampaignMap = HashMap<String, Arc<Campaign>>;

/// 캠페인 카탈로그
#[derive(Debug, Default)]
pub struct CampaignCatalog {
    campaigns: RwLock<Arc<CampaignMap>>,
}

impl CampaignCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// 캠페인 목록으로 생성 (전체 검증 후)
    pub fn new(campaigns: Vec<Campaign>) -> Result<Self, CatalogError> {
        let catalog = Self::empty();
        catalog.replace(campaigns)?;
        Ok(catalog)
    }

    /// 파일에서 생성
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        Self::new(Self::read_file(path)?)
    }

    /// 캠페인 조회
    pub fn get(&self, name: &str) -> Option<Arc<Campaign>> {
        self.campaigns.read().get(name).cloned()
    }

    /// 현재 캠페인 맵의 스냅샷
    pub fn snapshot(&self) -> Arc<HashMap<String, Arc<Campaign>>> {
        self.campaigns.read().clone()
    }

    /// 이름순 캠페인 이름 목록
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.snapshot().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.campaigns.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 카탈로그 전체 교체
    ///
    /// 모든 캠페인이 검증을 통과해야 교체되며, 하나라도 실패하면 기존 카탈로그를 유지합니다.
    pub fn replace(&self, campaigns: Vec<Campaign>) -> Result<usize, CatalogError> {
        let mut map = CampaignMap::with_capacity(campaigns.len());

        for campaign in campaigns {
            campaign.validate()?;
            let name = campaign.name.clone();
            if map.insert(name.clone(), Arc::new(campaign)).is_some() {
                return Err(CatalogError::DuplicateCampaign(name));
            }
        }

        let count = map.len();
        *self.campaigns.write() = Arc::new(map);

        info!("캠페인 카탈로그 교체 완료: {}개", count);
        Ok(count)
    }

    /// 파일에서 다시 읽기
    pub fn reload_from_file(&self, path: impl AsRef<Path>) -> Result<usize, CatalogError> {
        let path = path.as_ref();
        match Self::read_file(path).and_then(|campaigns| self.replace(campaigns)) {
            Ok(count) => Ok(count),
            Err(e) => {
                warn!("캠페인 다시 읽기 실패, 기존 카탈로그 유지 [{}]: {}", path.display(), e);
                Err(e)
            }
        }
    }

    fn read_file(path: impl AsRef<Path>) -> Result<Vec<Campaign>, CatalogError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let file: CampaignFile = serde_json::from_str(&raw)?;
        Ok(file.campaigns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{CalendarReward, UnlockSchedule};
    use std::io::Write;

    fn campaign(name: &str, days: i32) -> Campaign {
        Campaign {
            name: name.to_string(),
            image: String::new(),
            schedule: UnlockSchedule::Sequential,
            rewards: (0..days).map(|d| (d, CalendarReward::default())).collect(),
        }
    }

    #[test]
    fn test_get_and_names() {
        let catalog =
            CampaignCatalog::new(vec![campaign("WINTER2024", 24), campaign("AUTUMN", 3)])
                .expect("catalog");

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("WINTER2024").map(|c| c.total_days()), Some(24));
        assert!(catalog.get("winter2024").is_none());
        assert_eq!(catalog.names(), vec!["AUTUMN".to_string(), "WINTER2024".to_string()]);
    }

    #[test]
    fn test_invalid_replace_keeps_previous() {
        let catalog = CampaignCatalog::new(vec![campaign("WINTER2024", 24)]).expect("catalog");
        let before = catalog.snapshot();

        let result = catalog.replace(vec![campaign("A", 1), campaign("A", 2)]);
        assert!(matches!(result, Err(CatalogError::DuplicateCampaign(name)) if name == "A"));

        let result = catalog.replace(vec![campaign("EMPTY", 0)]);
        assert!(matches!(result, Err(CatalogError::Invalid(_))));

        assert!(Arc::ptr_eq(&before, &catalog.snapshot()));
    }

    #[test]
    fn test_snapshot_survives_reload() {
        let catalog = CampaignCatalog::new(vec![campaign("WINTER2024", 24)]).expect("catalog");
        let held = catalog.get("WINTER2024").expect("campaign");

        catalog.replace(vec![campaign("WINTER2024", 3)]).expect("replace");

        // 이전에 얻은 참조는 그대로 완전한 캠페인
        assert_eq!(held.total_days(), 24);
        assert_eq!(catalog.get("WINTER2024").map(|c| c.total_days()), Some(3));
    }

    #[test]
    fn test_reload_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        let content = serde_json::to_string(&CampaignFile {
            campaigns: vec![campaign("SPRING", 7)],
        })
        .expect("json");
        file.write_all(content.as_bytes()).expect("write");

        let catalog = CampaignCatalog::empty();
        assert!(catalog.is_empty());
        assert_eq!(catalog.reload_from_file(file.path()).expect("reload"), 1);
        assert!(catalog.get("SPRING").is_some());

        let missing = catalog.reload_from_file("/nonexistent/campaigns.json");
        assert!(matches!(missing, Err(CatalogError::Io { .. })));
        assert!(catalog.get("SPRING").is_some());
    }
}
