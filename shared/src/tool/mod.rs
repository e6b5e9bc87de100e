//! 공통 도구

pub mod current_time;

pub use current_time::{Clock, FixedClock, SystemClock};
