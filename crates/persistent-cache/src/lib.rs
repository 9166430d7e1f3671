//! kulu-persistent-cache - 多层持久化用户缓存
//!
//! 把同一条记录同时写入多个存储层（快速层、会话层、持久层），
//! 任何一层被系统清理后仍能从其余层恢复：
//! - 写入：扇出到所有层，单层失败不影响整体
//! - 读取：按优先级查找，命中较慢层时回填较快层
//! - 校验：版本不符或超过有效期的记录视为不存在

mod cache;
mod keys;
mod record;
mod slot;
mod stats;

pub use cache::*;
pub use keys::*;
pub use record::*;
pub use slot::*;
