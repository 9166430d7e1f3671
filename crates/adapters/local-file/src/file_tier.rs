//! 本地文件存储层实现

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use kulu_errors::{AppError, AppResult};
use kulu_ports::StorageTier;

const FILE_EXTENSION: &str = "json";

/// 本地文件存储层
///
/// 文件 I/O 是同步的，不会在 await 点挂起
pub struct LocalFileTier {
    dir: PathBuf,
}

impl LocalFileTier {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> AppResult<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{}.{}", key, FILE_EXTENSION)))
    }

    fn read(&self, key: &str) -> AppResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::internal(format!(
                "Local file read failed ({}): {}",
                path.display(),
                e
            ))),
        }
    }

    /// 先写临时文件再 rename，保证读者不会看到半截内容
    fn write(&self, key: &str, value: &str) -> AppResult<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).map_err(|e| {
            AppError::internal(format!(
                "Local storage dir create failed ({}): {}",
                self.dir.display(),
                e
            ))
        })?;

        let tmp = path.with_extension(format!("{}.tmp", FILE_EXTENSION));
        let result = fs::File::create(&tmp)
            .and_then(|mut file| {
                file.write_all(value.as_bytes())?;
                file.sync_all()
            })
            .and_then(|_| fs::rename(&tmp, &path));

        result.map_err(|e| {
            let _ = fs::remove_file(&tmp);
            AppError::internal(format!(
                "Local file write failed ({}): {}",
                path.display(),
                e
            ))
        })
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::internal(format!(
                "Local file delete failed ({}): {}",
                path.display(),
                e
            ))),
        }
    }
}

/// 键只允许字母、数字、`_`、`-`、`.`，且不能以 `.` 开头
fn validate_key(key: &str) -> AppResult<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(AppError::validation(format!("Invalid storage key: {:?}", key)))
    }
}

#[async_trait]
impl StorageTier for LocalFileTier {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.read(key)
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.write(key, value)?;
        tracing::trace!(key = %key, bytes = value.len(), "Local file written");
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.remove(key)
    }

    async fn ping(&self) -> AppResult<()> {
        if self.dir.exists() && !self.dir.is_dir() {
            return Err(AppError::internal(format!(
                "Local storage path is not a directory: {}",
                self.dir.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let tier = LocalFileTier::new(dir.path().join("store"));

        assert_eq!(tier.get("kulu_ilan_user").await.unwrap(), None);

        tier.set("kulu_ilan_user", "{\"a\":1}").await.unwrap();
        assert_eq!(
            tier.get("kulu_ilan_user").await.unwrap().as_deref(),
            Some("{\"a\":1}")
        );
        assert!(dir.path().join("store/kulu_ilan_user.json").exists());

        tier.delete("kulu_ilan_user").await.unwrap();
        assert_eq!(tier.get("kulu_ilan_user").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_value() {
        let dir = tempfile::tempdir().unwrap();
        let tier = LocalFileTier::new(dir.path());

        tier.set("k", "first").await.unwrap();
        tier.set("k", "second").await.unwrap();
        assert_eq!(tier.get("k").await.unwrap().as_deref(), Some("second"));
        assert!(!dir.path().join("k.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_delete_missing_key_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let tier = LocalFileTier::new(dir.path().join("never-created"));
        assert!(tier.delete("kulu_ilan_user").await.is_ok());
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let tier = LocalFileTier::new(dir.path());

        for key in ["../escape", "a/b", "", ".hidden"] {
            assert!(tier.set(key, "x").await.is_err(), "key {:?} accepted", key);
        }
    }

    #[tokio::test]
    async fn test_unwritable_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "not a dir").unwrap();

        let tier = LocalFileTier::new(&blocker);
        assert!(tier.set("k", "v").await.is_err());
        assert!(tier.ping().await.is_err());
    }
}
