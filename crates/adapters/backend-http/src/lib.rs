//! kulu-adapter-backend - BaaS 后端 RPC 适配器
//!
//! 通过 PostgREST 风格的 HTTP 接口调用服务端过程：
//! `POST {url}/rest/v1/rpc/{function}`

mod client;
mod config;

pub use client::*;
pub use config::*;
