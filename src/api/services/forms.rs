//! 可上传表单的 multipart 解析

use std::collections::HashMap;

use actix_multipart::Multipart;
use futures_util::StreamExt;

use crate::errors::{Result, TalkError};

/// 文本字段与分段头允许额外占用的字节数
pub const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// 单个表单最多接受的分段数
pub const MAX_FORM_PARTS: usize = 16;

/// multipart 表单中的文件分段
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// 一个 multipart 表单的文本字段与文件分段
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl MultipartForm {
    /// 读取整个请求体。单个分段超过 `max_part_bytes`、全部分段合计超过
    /// `max_part_bytes + FORM_OVERHEAD_BYTES` 或分段数超过 `MAX_FORM_PARTS`
    /// 时返回 `PayloadTooLarge`
    pub async fn collect(mut payload: Multipart, max_part_bytes: usize) -> Result<Self> {
        let mut form = Self::default();
        let max_total = max_part_bytes.saturating_add(FORM_OVERHEAD_BYTES);
        let mut total = 0usize;
        let mut parts = 0usize;

        while let Some(item) = payload.next().await {
            let mut field =
                item.map_err(|e| TalkError::validation(format!("Invalid form data: {}", e)))?;

            parts += 1;
            if parts > MAX_FORM_PARTS {
                return Err(TalkError::payload_too_large("Too many form fields"));
            }

            let name = field.name().unwrap_or("").to_string();
            let file_name = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .map(|f| f.to_string());

            let mut data = Vec::new();
            while let Some(chunk) = field.next().await {
                let bytes = chunk
                    .map_err(|e| TalkError::validation(format!("Failed to read upload: {}", e)))?;
                total += bytes.len();
                if data.len() + bytes.len() > max_part_bytes || total > max_total {
                    return Err(TalkError::payload_too_large(format!(
                        "Uploads are limited to {}",
                        human_size(max_part_bytes)
                    )));
                }
                data.extend_from_slice(&bytes);
            }

            match file_name {
                // 文件框留空时浏览器仍会发送一个空分段
                Some(file_name) if !file_name.is_empty() && !data.is_empty() => {
                    form.files.insert(
                        name,
                        UploadedFile {
                            file_name,
                            bytes: data,
                        },
                    );
                }
                Some(_) => {}
                None => {
                    form.fields
                        .insert(name, String::from_utf8_lossy(&data).into_owned());
                }
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn take_text(&mut self, name: &str) -> String {
        self.fields.remove(name).unwrap_or_default()
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }
}

fn human_size(bytes: usize) -> String {
    const MB: usize = 1024 * 1024;
    if bytes >= MB {
        format!("{} MB", bytes / MB)
    } else {
        format!("{} KB", bytes.div_ceil(1024))
    }
}
