//! ports - 抽象 trait 层
//!
//! 定义存储层、后端 RPC 与通知的抽象接口

mod backend;
mod notifier;
mod storage_tier;

pub use backend::*;
pub use notifier::*;
pub use storage_tier::*;
