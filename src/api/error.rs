// ==========================================
// 课程批量导入服务 - API层错误类型
// ==========================================
// 职责: 将下层技术错误转换为宿主界面可展示的错误
// ==========================================

use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ===== 业务规则错误 =====
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("无效的状态转换: {0}")]
    InvalidStateTransition(String),

    // ===== 导入错误 =====
    #[error("文件导入失败: {0}")]
    ImportFailed(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    #[error("会话已重置: {0}")]
    SessionReset(String),

    // ===== 数据访问错误 =====
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::UnsupportedFileType(_) | ImportError::FileTooLarge { .. } => {
                ApiError::ValidationError(err.to_string())
            }
            ImportError::InvalidStage { .. } => {
                ApiError::InvalidStateTransition(err.to_string())
            }
            ImportError::SessionReset => ApiError::SessionReset(err.to_string()),
            ImportError::Other(e) => ApiError::Other(e),
            _ => ApiError::ImportFailed(err.to_string()),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::Other(e) => ApiError::Other(e),
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_error_classification() {
        let api_err: ApiError = ImportError::UnsupportedFileType("a.exe".into()).into();
        assert!(matches!(api_err, ApiError::ValidationError(_)));

        let api_err: ApiError = ImportError::EmptyHeader.into();
        assert!(matches!(api_err, ApiError::ImportFailed(_)));

        let api_err: ApiError = ImportError::SessionReset.into();
        assert!(matches!(api_err, ApiError::SessionReset(_)));
    }

    #[test]
    fn test_repository_error_conversion() {
        let repo_err = RepositoryError::NotFound {
            entity: "Course".to_string(),
            id: "c1".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("Course"));
                assert!(msg.contains("c1"));
            }
            _ => panic!("Expected NotFound"),
        }
    }
}
