//! OCR API Handlers

use axum::{
    Json,
    extract::{Multipart, State},
};
use serde_json::{Value, json};
use tracing::info;

use super::GatewayState;
use crate::engine::MediaKind;
use crate::error::{OcrError, OcrResult};
use crate::extract::{clean_text, extract_shopping_items};

pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;
const ALLOWED_EXTENSIONS: &[&str] = &["txt", "csv", "png", "jpg", "jpeg", "pdf"];

/// POST /api/ocr/process - 处理上传文件
///
/// 文本文件直接解码，图片与 PDF 送引擎识别，再跑条目抽取。
pub async fn process(
    State(state): State<GatewayState>,
    mut multipart: Multipart,
) -> OcrResult<Json<Value>> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| OcrError::Upload(e.to_string()))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or_default().to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| OcrError::Upload(e.to_string()))?;
            upload = Some((filename, data.to_vec()));
            break;
        }
    }

    let (filename, data) = upload.ok_or(OcrError::MissingFile)?;
    if filename.is_empty() {
        return Err(OcrError::EmptyFilename);
    }

    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(OcrError::UnsupportedType {
            supported: ALLOWED_EXTENSIONS.join(", "),
        });
    }

    let file_size = data.len();
    if file_size > MAX_FILE_SIZE {
        return Err(OcrError::TooLarge {
            max_mb: MAX_FILE_SIZE / (1024 * 1024),
        });
    }

    info!(filename = %filename, size = file_size, "Processing file");

    let (text, file_type, message) = match extension.as_str() {
        "txt" | "csv" => {
            let content = String::from_utf8(data).map_err(|_| OcrError::Encoding)?;
            (
                content,
                extension.clone(),
                "Text file processed successfully".to_string(),
            )
        }
        "png" | "jpg" | "jpeg" => {
            let extracted = state.engine.extract(data, MediaKind::Image).await?;
            (
                clean_text(&extracted.text),
                "image".to_string(),
                "Text extracted successfully from image".to_string(),
            )
        }
        _ => {
            let extracted = state.engine.extract(data, MediaKind::Pdf).await?;
            let pages = extracted.pages_processed.unwrap_or(1);
            (
                clean_text(&extracted.text),
                "pdf".to_string(),
                format!("Text extracted successfully from {pages} page(s)"),
            )
        }
    };

    let items = extract_shopping_items(&text);
    info!(filename = %filename, items = items.len(), "File processed successfully");

    Ok(Json(json!({
        "success": true,
        "text": text,
        "extracted_items": items,
        "items_count": items.len(),
        "file_type": file_type,
        "filename": filename,
        "file_size": file_size,
        "message": message,
    })))
}

/// GET /api/ocr/health - 健康检查
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "ocr-gateway",
        "supported_formats": ALLOWED_EXTENSIONS,
        "max_file_size_mb": MAX_FILE_SIZE / (1024 * 1024),
    }))
}

/// POST /api/ocr/test - 用内置样例验证条目抽取
pub async fn test() -> Json<Value> {
    let test_text = "Shopping List:\n1. Apples\n2. Bread\n3. Milk\n4. Eggs";
    let items = extract_shopping_items(test_text);

    Json(json!({
        "success": true,
        "test_text": test_text,
        "extracted_items": items,
        "message": "Item extraction is working correctly",
    }))
}
