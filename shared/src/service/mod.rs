//! 공통 서비스
//!
//! 보상 수령 기록 저장소의 트레이트와 메모리 구현을 제공합니다.

pub mod memory_claim_store;
pub mod traits;

pub use memory_claim_store::MemoryClaimStore;
pub use traits::ClaimStore;
