// ==========================================
// 课程批量导入服务 - 课程目录仓储接口
// ==========================================
// 职责: 定义导入流水线使用的持久化接口（不包含实现）
// 红线: Repository 不含业务逻辑
// ==========================================

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::course::normalize_key;
use crate::domain::{CourseDraft, ImportBatch, ModuleDraft};
use crate::repository::error::RepositoryResult;

// ==========================================
// ExistingCatalog - 已有实体快照
// ==========================================

/// 课程目录快照，供校验阶段做“创建/更新”判定
///
/// 键全部经过 normalize_key 规范化；快照一次性加载，
/// 校验阶段不再访问数据库（保持校验器为纯函数）。
#[derive(Debug, Clone, Default)]
pub struct ExistingCatalog {
    /// 规范化课程编码 -> 课程ID
    courses_by_code: HashMap<String, String>,
    /// (课程ID, 规范化模块名称) -> 模块ID
    modules_by_title: HashMap<(String, String), String>,
}

impl ExistingCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一门已有课程（code 为空的课程无法被匹配，不登记）
    pub fn add_course(&mut self, code: &str, course_id: &str) {
        let key = normalize_key(code);
        if !key.is_empty() {
            self.courses_by_code.insert(key, course_id.to_string());
        }
    }

    /// 登记一个已有模块
    pub fn add_module(&mut self, course_id: &str, title: &str, module_id: &str) {
        self.modules_by_title.insert(
            (course_id.to_string(), normalize_key(title)),
            module_id.to_string(),
        );
    }

    /// 按编码查找已有课程（精确匹配，大小写不敏感）
    pub fn find_course_by_code(&self, code: &str) -> Option<&str> {
        let key = normalize_key(code);
        if key.is_empty() {
            return None;
        }
        self.courses_by_code.get(&key).map(String::as_str)
    }

    /// 在指定课程内按名称查找已有模块
    pub fn find_module(&self, course_id: &str, title: &str) -> Option<&str> {
        self.modules_by_title
            .get(&(course_id.to_string(), normalize_key(title)))
            .map(String::as_str)
    }

    pub fn course_count(&self) -> usize {
        self.courses_by_code.len()
    }
}

// ==========================================
// CatalogRepository Trait
// ==========================================

/// 课程目录仓储接口
///
/// 提交引擎假定每次调用各自原子，不提供跨行事务；
/// 单行失败由调用方记录并继续处理后续行。
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// 加载已有课程/模块快照（校验阶段的匹配依据）
    async fn load_catalog_snapshot(&self) -> RepositoryResult<ExistingCatalog>;

    /// 创建课程，返回新课程ID
    async fn create_course(&self, draft: &CourseDraft) -> RepositoryResult<String>;

    /// 更新已有课程
    async fn update_course(&self, course_id: &str, draft: &CourseDraft) -> RepositoryResult<()>;

    /// 在指定课程下创建模块，返回新模块ID
    ///
    /// # 参数
    /// - draft: 模块草稿（parent 引用已由调用方解析）
    /// - course_id: 解析后的父课程ID
    async fn create_module(&self, draft: &ModuleDraft, course_id: &str)
        -> RepositoryResult<String>;

    /// 更新已有模块
    async fn update_module(&self, module_id: &str, draft: &ModuleDraft) -> RepositoryResult<()>;

    /// 写入导入批次审计记录
    async fn insert_import_batch(&self, batch: &ImportBatch) -> RepositoryResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_matching_is_case_normalized() {
        let mut catalog = ExistingCatalog::new();
        catalog.add_course("CS101", "c1");
        catalog.add_module("c1", "Week One", "m1");

        assert_eq!(catalog.find_course_by_code("cs101"), Some("c1"));
        assert_eq!(catalog.find_course_by_code("  CS101 "), Some("c1"));
        assert_eq!(catalog.find_course_by_code("cs102"), None);

        assert_eq!(catalog.find_module("c1", "WEEK ONE"), Some("m1"));
        assert_eq!(catalog.find_module("c2", "Week One"), None);
    }

    #[test]
    fn test_blank_code_never_matches() {
        let mut catalog = ExistingCatalog::new();
        catalog.add_course("", "c1");
        assert_eq!(catalog.course_count(), 0);
        assert_eq!(catalog.find_course_by_code(""), None);
    }
}
