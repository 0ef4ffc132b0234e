// ==========================================
// 课程批量导入服务 - 通知实现
// ==========================================
// 职责: Notifier 的日志实现（无界面宿主时的默认通道）
// ==========================================

use tracing::{error, info};

use crate::importer::workflow::Notifier;

/// 把提示写入结构化日志的默认 Notifier
///
/// 宿主界面可用自己的 toast 实现替换；通知即发即忘，
/// 任何一侧的失败都不会传回流水线。
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn report_success(&self, message: &str) {
        info!(target: "course_import::toast", "{}", message);
    }

    fn report_error(&self, message: &str) {
        error!(target: "course_import::toast", "{}", message);
    }
}
