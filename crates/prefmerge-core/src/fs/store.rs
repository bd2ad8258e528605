use crate::codec::DocumentType;
use crate::core::{DocumentStore, PrefMergeError, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, warn};

/// Document store backed by the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct FsDocumentStore;

impl FsDocumentStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn read(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path)
            .await
            .map_err(|e| PrefMergeError::Read {
                path: path.to_path_buf(),
                source: e,
            })
    }

    async fn write(&self, path: &Path, content: &str) -> Result<bool> {
        match fs::read_to_string(path).await {
            Ok(existing) if existing == content => {
                debug!("[Store] {:?} already up to date", path);
                return Ok(false);
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("[Store] Creating output {:?}", path);
            }
            Err(e) => {
                return Err(PrefMergeError::Write {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
        }

        atomic_write(path, content.as_bytes())
            .await
            .map_err(|e| PrefMergeError::Write {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Ok(true)
    }

    async fn show(&self, path: &Path, content: Option<&str>, doc_type: DocumentType) -> bool {
        let text = match content {
            Some(text) => text.to_string(),
            None => match fs::read_to_string(path).await {
                Ok(text) => text,
                Err(e) => {
                    warn!("[Store] Cannot show {:?}: {}", path, e);
                    return false;
                }
            },
        };
        println!("----- {} ({}) -----", path.display(), doc_type);
        println!("{}", text);
        true
    }
}

/// Write `data` to a temp file next to `dest`, then rename it into place.
pub async fn atomic_write(dest: &Path, data: &[u8]) -> Result<()> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    fs::create_dir_all(&dir).await?;

    let temp_path = dir.join(format!(".tmp_{}", uuid::Uuid::new_v4()));
    fs::write(&temp_path, data).await?;

    if let Err(e) = fs::rename(&temp_path, dest).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(PrefMergeError::Io(e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_reports_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.json");
        let store = FsDocumentStore::new();

        assert!(store.write(&path, "{}\n").await.unwrap());
        assert!(!store.write(&path, "{}\n").await.unwrap());
        assert!(store.write(&path, "{\"a\": 1}\n").await.unwrap());
        assert_eq!(store.read(&path).await.unwrap(), "{\"a\": 1}\n");
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.yaml");
        FsDocumentStore::new().write(&path, "a: 1\n").await.unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("out.yaml")]);
    }

    #[tokio::test]
    async fn test_read_missing_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FsDocumentStore::new()
            .read(&dir.path().join("missing.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, PrefMergeError::Read { .. }));
        assert!(err.is_source_failure());
    }

    #[tokio::test]
    async fn test_show_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsDocumentStore::new();
        assert!(!store.show(&dir.path().join("x"), None, DocumentType::Json).await);
        assert!(store.show(&dir.path().join("x"), Some("<error>"), DocumentType::Json).await);
    }
}
