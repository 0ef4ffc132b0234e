// ==========================================
// 课程批量导入服务 - 课程目录实体
// ==========================================
// 职责: 定义课程/模块实体及导入草稿类型
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 课程实体（courses 表）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub course_id: String,          // 课程ID（UUID）
    pub code: Option<String>,       // 课程编码（唯一键，可空）
    pub title: String,              // 课程名称
    pub color: Option<String>,      // 展示颜色（可空）
    pub created_at: DateTime<Utc>,  // 创建时间
    pub updated_at: DateTime<Utc>,  // 更新时间
}

/// 课程模块实体（course_modules 表）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseModule {
    pub module_id: String,          // 模块ID（UUID）
    pub course_id: String,          // 所属课程ID
    pub title: String,              // 模块名称
    pub position: Option<i32>,      // 课程内排序（可空）
    pub created_at: DateTime<Utc>,  // 创建时间
    pub updated_at: DateTime<Utc>,  // 更新时间
}

/// 课程草稿（待创建/待更新，尚未落库）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseDraft {
    pub title: String,          // 课程名称（必填，已去除首尾空白）
    pub code: Option<String>,   // 课程编码（选填）
    pub color: Option<String>,  // 展示颜色（选填）
}

/// 模块草稿的父课程引用
///
/// 同批次引用在提交阶段由提交引擎解析为真实课程ID。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParentCourseRef {
    /// 引用目录中已存在的课程
    Existing(String),
    /// 引用同一批次中更早出现的课程草稿（按规范化编码）
    InBatch(String),
}

/// 模块草稿（待创建/待更新，尚未落库）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDraft {
    pub title: String,             // 模块名称（必填，已去除首尾空白）
    pub parent: ParentCourseRef,   // 父课程引用（必填）
    pub position: Option<i32>,     // 课程内排序（选填）
}

/// 实体草稿（课程或模块）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityDraft {
    Course(CourseDraft),
    Module(ModuleDraft),
}

impl EntityDraft {
    /// 是否为课程草稿
    pub fn is_course(&self) -> bool {
        matches!(self, EntityDraft::Course(_))
    }
}

/// 编码/标题匹配用的规范化: 去首尾空白 + 小写
///
/// 创建/更新判定只做精确匹配，不做模糊匹配。
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}
