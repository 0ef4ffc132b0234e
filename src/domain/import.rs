// ==========================================
// 课程批量导入服务 - 导入流水线值类型
// ==========================================
// 职责: 定义上传候选、解析结果、逐行校验结论、提交结果
// 数据流: UploadCandidate -> ParsedTable -> Vec<ValidatedRow> -> CommitResult
// ==========================================

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::course::EntityDraft;

/// 上传候选文件
///
/// 用户选择文件后创建；通过文件校验并完成解析后即被丢弃。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadCandidate {
    pub path: PathBuf,        // 文件路径
    pub file_name: String,    // 用户可见文件名（扩展名校验依据）
    pub declared_size: u64,   // 声明的文件大小（字节）
}

impl UploadCandidate {
    pub fn new(path: impl Into<PathBuf>, file_name: impl Into<String>, declared_size: u64) -> Self {
        Self {
            path: path.into(),
            file_name: file_name.into(),
            declared_size,
        }
    }
}

/// 解析后的一行数据
///
/// row_number 为原始文件中的行号（1 起，表头为第 1 行），
/// 空行被跳过后保留原始行号，便于错误信息定位源文件位置。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRow {
    pub row_number: usize,                // 原始行号（1起）
    pub cells: HashMap<String, String>,   // 列名 -> 单元格内容
}

/// 解析阶段的非致命警告（如超出表头宽度的多余单元格）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseWarning {
    pub row_number: usize,  // 原始行号
    pub message: String,    // 警告内容
}

/// 解析后的整张表
///
/// 不变式: 所有行共享表头列集；行序与源文件一致。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedTable {
    pub headers: Vec<String>,         // 表头列名（重名已消歧）
    pub rows: Vec<RawRow>,            // 非空数据行
    pub warnings: Vec<ParseWarning>,  // 解析警告
}

/// 单行校验结论
///
/// 不变式: 一行恰好落入一个分支；reasons 非空当且仅当 Invalid。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RowOutcome {
    /// 待创建（未匹配到已有实体）
    ToCreate { draft: EntityDraft },
    /// 待更新（匹配到已有实体）
    ToUpdate { entity_id: String, draft: EntityDraft },
    /// 无效行（附全部违规原因）
    Invalid { reasons: Vec<String> },
}

/// 校验后的行（保留原始行号）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedRow {
    pub row_number: usize,    // 原始行号（1起）
    pub outcome: RowOutcome,  // 校验结论
}

impl ValidatedRow {
    pub fn is_invalid(&self) -> bool {
        matches!(self.outcome, RowOutcome::Invalid { .. })
    }
}

/// 预览阶段的汇总计数（Reviewing 状态展示用）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub to_create: usize,  // 待创建行数
    pub to_update: usize,  // 待更新行数
    pub invalid: usize,    // 无效行数
}

impl ReviewSummary {
    /// 按行归类汇总；每行恰好计入一个桶
    pub fn from_rows(rows: &[ValidatedRow]) -> Self {
        let mut summary = ReviewSummary::default();
        for row in rows {
            match row.outcome {
                RowOutcome::ToCreate { .. } => summary.to_create += 1,
                RowOutcome::ToUpdate { .. } => summary.to_update += 1,
                RowOutcome::Invalid { .. } => summary.invalid += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.to_create + self.to_update + self.invalid
    }
}

/// 提交阶段的单行失败记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRowError {
    pub row_number: usize,  // 原始行号
    pub message: String,    // 底层失败信息
}

/// 提交结果
///
/// 不变式: 各项计数只在持久化调用确认成功后递增；
/// 成功计数之和 + errors 行数 == 提交的非 Invalid 行数。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitResult {
    pub created_courses: usize,       // 新建课程数
    pub updated_courses: usize,       // 更新课程数
    pub created_modules: usize,       // 新建模块数
    pub updated_modules: usize,       // 更新模块数
    pub errors: Vec<CommitRowError>,  // 逐行失败记录
}

impl CommitResult {
    /// 成功计数合计
    pub fn total_succeeded(&self) -> usize {
        self.created_courses + self.updated_courses + self.created_modules + self.updated_modules
    }
}

/// 导入工作流状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStage {
    /// 等待上传（初始状态）
    Upload,
    /// 预览中（已解析并完成逐行校验）
    Reviewing,
    /// 提交中
    Committing,
    /// 完成（本会话终态，仅 reset 可退出）
    Done,
}

/// 导入批次审计记录（import_batch 表）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: String,           // 批次ID（UUID）
    pub file_name: String,          // 源文件名
    pub total_rows: usize,          // 表中数据行数
    pub created_courses: usize,     // 新建课程数
    pub updated_courses: usize,     // 更新课程数
    pub created_modules: usize,     // 新建模块数
    pub updated_modules: usize,     // 更新模块数
    pub error_count: usize,         // 提交失败行数
    pub elapsed_ms: u64,            // 提交耗时（毫秒）
    pub created_at: DateTime<Utc>,  // 记录时间
}
