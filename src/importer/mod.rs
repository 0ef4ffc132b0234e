// ==========================================
// 课程批量导入服务 - 导入层
// ==========================================
// 职责: 上传校验、表格解析、逐行校验、提交、工作流编排
// 支持: Excel (.xlsx/.xls), CSV (.csv)
// ==========================================

// 模块声明
pub mod commit_engine;
pub mod error;
pub mod file_check;
pub mod file_parser;
pub mod row_mapper;
pub mod row_validator;
pub mod workflow;

// 重导出核心类型
pub use commit_engine::CommitEngine;
pub use error::{ImportError, ImportResult};
pub use file_check::{check_upload_candidate, format_file_size, validate_file_type};
pub use file_parser::{CsvParser, ExcelParser, FileParser, UniversalFileParser};
pub use row_mapper::{map_row, RawImportRecord};
pub use row_validator::validate_rows;
pub use workflow::{ImportWorkflow, Notifier};
