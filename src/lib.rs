// ==========================================
// 课程批量导入服务 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 教学管理平台的批量数据导入后端
// 导入流程: 上传 -> 解析/校验 -> 预览 -> 提交 -> 结果
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 文件解析与提交流水线
pub mod importer;

// 配置层 - 导入限制配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 宿主界面接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    CommitResult, CommitRowError, Course, CourseDraft, CourseModule, EntityDraft, ImportBatch,
    ImportStage, ModuleDraft, ParentCourseRef, ParseWarning, ParsedTable, RawRow, ReviewSummary,
    RowOutcome, UploadCandidate, ValidatedRow,
};

// 导入流水线
pub use importer::{
    CommitEngine, CsvParser, ExcelParser, FileParser, ImportError, ImportWorkflow,
    UniversalFileParser,
};

// 仓储
pub use repository::{CatalogRepository, ExistingCatalog, SqliteCatalogRepository};

// API
pub use api::{ApiError, ImportApi, Notifier, TracingNotifier};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "课程批量导入服务";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
