//! kulu-adapter-session - 会话内存存储层
//!
//! 只在当前进程内有效，进程退出即清空

mod session_tier;

pub use session_tier::*;
