//! 存储层 trait 定义

use async_trait::async_trait;
use kulu_errors::AppResult;

/// 键值存储层
///
/// 每个实现对应一种物理存储（本地文件、会话内存、SQLite）。
/// 值是已序列化的字符串，存储层不解析其内容。
#[async_trait]
pub trait StorageTier: Send + Sync {
    /// 存储层名称，用于日志和指标
    fn name(&self) -> &'static str;

    /// 读取键，不存在时返回 None
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// 写入键
    async fn set(&self, key: &str, value: &str) -> AppResult<()>;

    /// 删除键，键不存在不是错误
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// 检查存储层是否可用
    async fn ping(&self) -> AppResult<()> {
        self.get("__kulu_ping__").await.map(|_| ())
    }
}
