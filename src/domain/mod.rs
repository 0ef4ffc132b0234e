// ==========================================
// 课程批量导入服务 - 领域模型层
// ==========================================
// 职责: 定义课程目录实体与导入流水线值类型
// 红线: 不含数据访问逻辑，不含解析/提交逻辑
// ==========================================

pub mod course;
pub mod import;

// 重导出核心类型
pub use course::{
    normalize_key, Course, CourseDraft, CourseModule, EntityDraft, ModuleDraft, ParentCourseRef,
};
pub use import::{
    CommitResult, CommitRowError, ImportBatch, ImportStage, ParseWarning, ParsedTable, RawRow,
    ReviewSummary, RowOutcome, UploadCandidate, ValidatedRow,
};
