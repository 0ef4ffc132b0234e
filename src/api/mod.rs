// ==========================================
// 课程批量导入服务 - API 层
// ==========================================
// 职责: 提供宿主界面可消费的命令与可观察状态
// ==========================================

pub mod error;
pub mod import_api;
pub mod notifier;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use import_api::{CommitResponse, ImportApi, ImportStateResponse, SubmitFileResponse};
pub use notifier::TracingNotifier;

// 便于宿主直接引用通知接口
pub use crate::importer::workflow::Notifier;
