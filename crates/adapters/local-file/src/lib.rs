//! kulu-adapter-local - 本地文件存储层
//!
//! 快速层：同步读写、跨进程重启保留，每个键对应目录下一个 `<key>.json` 文件

mod file_tier;

pub use file_tier::*;
