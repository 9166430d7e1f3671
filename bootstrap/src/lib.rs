//! kulu-bootstrap - 统一启动骨架
//!
//! 从配置组装遥测、存储层、持久化缓存和后端客户端

mod health;
mod infrastructure;
mod runtime;

pub use health::*;
pub use infrastructure::*;
pub use runtime::*;
