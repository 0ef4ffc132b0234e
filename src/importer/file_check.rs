// ==========================================
// 课程批量导入服务 - 上传文件校验
// ==========================================
// 职责: 扩展名白名单 + 大小上限的廉价前置检查
// 约定: 不读取文件内容；结构有效性以解析器为准
// ==========================================

use tracing::debug;

use crate::config::ImportConfigReader;
use crate::domain::UploadCandidate;
use crate::importer::error::{ImportError, ImportResult};

/// 允许上传的扩展名（小写）
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["csv", "xlsx", "xls"];

/// 按扩展名判断文件类型是否可接受
///
/// 仅检查文件名，不检查字节内容。
pub fn validate_file_type(candidate: &UploadCandidate) -> bool {
    let ext = match candidate.file_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext.to_lowercase(),
        _ => return false,
    };
    ALLOWED_EXTENSIONS.contains(&ext.as_str())
}

/// 渲染人类可读的文件大小（1024 进制，保留 1 位小数）
///
/// # 示例
/// - 0 -> "0 B"
/// - 1024 -> "1.0 KB"
/// - 1536 -> "1.5 KB"
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0usize;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{:.1} {}", value, UNITS[unit])
}

/// 完整的上传前检查: 类型白名单 + 配置的大小上限
///
/// 任一检查失败返回 ImportError（ValidationError 类），
/// 会话保持在 Upload 状态，不触发解析。
pub async fn check_upload_candidate<C: ImportConfigReader + ?Sized>(
    candidate: &UploadCandidate,
    config: &C,
) -> ImportResult<()> {
    if !validate_file_type(candidate) {
        return Err(ImportError::UnsupportedFileType(
            candidate.file_name.clone(),
        ));
    }

    let limit = config
        .get_max_upload_bytes()
        .await
        .map_err(|e| ImportError::ConfigReadError(e.to_string()))?;

    if candidate.declared_size > limit {
        return Err(ImportError::FileTooLarge {
            size: candidate.declared_size,
            limit,
        });
    }

    debug!(
        file = %candidate.file_name,
        size = %format_file_size(candidate.declared_size),
        "上传文件通过前置检查"
    );
    Ok(())
}
