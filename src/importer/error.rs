// ==========================================
// 课程批量导入服务 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约定: 行级校验/提交失败不走该类型，分别记录在
//       RowOutcome::Invalid 与 CommitRowError 中
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件校验错误（上传阶段即时拒绝） =====
    #[error("不支持的文件类型: {0}（仅支持 .csv/.xlsx/.xls）")]
    UnsupportedFileType(String),

    #[error("文件过大: {size} 字节（上限 {limit} 字节）")]
    FileTooLarge { size: u64, limit: u64 },

    // ===== 文件读取/解析错误（结构性失败，会话停留在 Upload） =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("表头缺失或为空")]
    EmptyHeader,

    #[error("工作簿中没有工作表")]
    NoWorksheet,

    // ===== 工作流错误 =====
    #[error("无效的工作流操作: 当前状态 {stage}，期望 {expected}")]
    InvalidStage { stage: String, expected: String },

    #[error("会话已重置，过期结果被丢弃")]
    SessionReset,

    // ===== 配置错误 =====
    #[error("配置读取失败: {0}")]
    ConfigReadError(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => ImportError::FileNotFound(err.to_string()),
            _ => ImportError::FileReadError(err.to_string()),
        }
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
