//! kulu-client - 会话与认证门面
//!
//! 调用后端 RPC，并把当前用户、管理员标记和设备标识保存在多层缓存中

pub mod api;
pub mod application;
pub mod domain;
