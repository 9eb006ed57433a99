//! 磁盘上的上传图片与视频
//!
//! 文件平铺在 `media.upload_dir` 中。返回给调用方并存入数据库的路径
//! 相对于 `/images/` 路由，例如
//! `uploads/z5000001-<uuid>-cat.png`.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::errors::{Result, TalkError};
use crate::utils::{MediaType, secure_filename};

/// 从磁盘读回的媒体文件
#[derive(Debug)]
pub struct StoredMedia {
    pub bytes: Vec<u8>,
    pub file_name: String,
}

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    max_upload_bytes: usize,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>, max_upload_bytes: usize) -> Self {
        Self {
            root: root.into(),
            max_upload_bytes,
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    fn prefix(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "uploads".to_string())
    }

    /// 分类、检查大小并写入上传文件；返回媒体类型与存储路径
    pub async fn save(
        &self,
        owner: &str,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<(MediaType, String)> {
        let media_type = MediaType::from_filename(original_name).ok_or_else(|| {
            TalkError::validation(format!(
                "Unsupported file type: {}",
                if original_name.is_empty() { "(none)" } else { original_name }
            ))
        })?;

        if bytes.len() > self.max_upload_bytes {
            return Err(TalkError::payload_too_large(format!(
                "File is larger than {} bytes",
                self.max_upload_bytes
            )));
        }
        if bytes.is_empty() {
            return Err(TalkError::validation("Uploaded file is empty"));
        }

        let safe = secure_filename(original_name);
        let stored_name = format!(
            "{}-{}-{}",
            owner,
            uuid::Uuid::new_v4().simple(),
            if safe.is_empty() { "upload" } else { &safe }
        );

        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(&stored_name), bytes).await?;

        debug!("Stored {} bytes of {} as {}", bytes.len(), media_type, stored_name);
        Ok((media_type, format!("{}/{}", self.prefix(), stored_name)))
    }

    /// 把存储路径（[`save`](Self::save) 的返回值）解析为磁盘文件
    pub fn resolve(&self, stored_path: &str) -> Result<PathBuf> {
        let relative = Path::new(stored_path);
        let mut components = relative.components();

        let file_name = match (components.next(), components.next(), components.next()) {
            (Some(Component::Normal(dir)), Some(Component::Normal(file)), None)
                if dir.to_string_lossy() == self.prefix() =>
            {
                file
            }
            (Some(Component::Normal(file)), None, None) => file,
            _ => return Err(TalkError::not_found(format!("No such media: {}", stored_path))),
        };

        Ok(self.root.join(file_name))
    }

    pub async fn open(&self, stored_path: &str) -> Result<StoredMedia> {
        let path = self.resolve(stored_path)?;
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TalkError::not_found(format!("No such media: {}", stored_path))
            } else {
                e.into()
            }
        })?;

        Ok(StoredMedia {
            bytes,
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        })
    }

    /// 尽力删除已存储的文件
    pub async fn remove(&self, stored_path: &str) {
        if let Ok(path) = self.resolve(stored_path)
            && let Err(e) = tokio::fs::remove_file(&path).await
        {
            debug!("Could not remove {}: {}", path.display(), e);
        }
    }
}
