// ==========================================
// 课程批量导入服务 - 提交引擎
// ==========================================
// 职责: 将校验通过的行逐条写入持久层
// 规则:
// - 严格顺序执行；课程行先于模块行提交（同类内保持原行序）
// - 单行失败仅记录，不中断批次，不重试，不回滚
// - 计数只在持久化调用确认成功后递增
// - 同批次新建课程的ID流向依赖它的模块行
// ==========================================

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::course::normalize_key;
use crate::domain::{
    CommitResult, CommitRowError, EntityDraft, ImportBatch, ParentCourseRef, RowOutcome,
    ValidatedRow,
};
use crate::repository::CatalogRepository;

// ==========================================
// CommitEngine
// ==========================================
pub struct CommitEngine {
    repo: Arc<dyn CatalogRepository>,
}

impl CommitEngine {
    pub fn new(repo: Arc<dyn CatalogRepository>) -> Self {
        Self { repo }
    }

    /// 提交一个校验后的批次
    ///
    /// 不变式: 成功计数之和 + errors 行数 == 输入中的非 Invalid 行数。
    /// 同一批次重复提交不做去重 —— 调用方应在两次提交之间重跑校验。
    pub async fn commit(&self, rows: &[ValidatedRow]) -> CommitResult {
        let mut result = CommitResult::default();

        // 同批次新建课程: 规范化编码 -> 新课程ID
        let mut created_courses: HashMap<String, String> = HashMap::new();

        // 步骤 1: 提交课程行（保持原行序）
        debug!("步骤 1: 提交课程行");
        for row in rows {
            match &row.outcome {
                RowOutcome::ToCreate {
                    draft: EntityDraft::Course(draft),
                } => match self.repo.create_course(draft).await {
                    Ok(course_id) => {
                        result.created_courses += 1;
                        if let Some(code) = draft.code.as_deref() {
                            let key = normalize_key(code);
                            if !key.is_empty() {
                                created_courses.insert(key, course_id);
                            }
                        }
                    }
                    Err(e) => result.errors.push(CommitRowError {
                        row_number: row.row_number,
                        message: e.to_string(),
                    }),
                },
                RowOutcome::ToUpdate {
                    entity_id,
                    draft: EntityDraft::Course(draft),
                } => match self.repo.update_course(entity_id, draft).await {
                    Ok(()) => result.updated_courses += 1,
                    Err(e) => result.errors.push(CommitRowError {
                        row_number: row.row_number,
                        message: e.to_string(),
                    }),
                },
                _ => {}
            }
        }

        // 步骤 2: 提交模块行（课程ID此时已可解析）
        debug!("步骤 2: 提交模块行");
        for row in rows {
            match &row.outcome {
                RowOutcome::ToCreate {
                    draft: EntityDraft::Module(draft),
                } => {
                    let course_id = match &draft.parent {
                        ParentCourseRef::Existing(id) => Some(id.clone()),
                        ParentCourseRef::InBatch(code) => created_courses.get(code).cloned(),
                    };

                    match course_id {
                        Some(course_id) => {
                            match self.repo.create_module(draft, &course_id).await {
                                Ok(_) => result.created_modules += 1,
                                Err(e) => result.errors.push(CommitRowError {
                                    row_number: row.row_number,
                                    message: e.to_string(),
                                }),
                            }
                        }
                        None => result.errors.push(CommitRowError {
                            row_number: row.row_number,
                            message: "引用的课程行未能创建，模块被跳过".to_string(),
                        }),
                    }
                }
                RowOutcome::ToUpdate {
                    entity_id,
                    draft: EntityDraft::Module(draft),
                } => match self.repo.update_module(entity_id, draft).await {
                    Ok(()) => result.updated_modules += 1,
                    Err(e) => result.errors.push(CommitRowError {
                        row_number: row.row_number,
                        message: e.to_string(),
                    }),
                },
                _ => {}
            }
        }

        info!(
            created_courses = result.created_courses,
            updated_courses = result.updated_courses,
            created_modules = result.created_modules,
            updated_modules = result.updated_modules,
            errors = result.errors.len(),
            "批次提交完成"
        );

        result
    }

    /// 提交批次并写入审计记录
    ///
    /// 审计写入失败只记日志，不影响已生成的提交结果。
    pub async fn commit_with_audit(
        &self,
        file_name: &str,
        rows: &[ValidatedRow],
    ) -> CommitResult {
        let started = Instant::now();
        let result = self.commit(rows).await;

        let batch = ImportBatch {
            batch_id: Uuid::new_v4().to_string(),
            file_name: file_name.to_string(),
            total_rows: rows.len(),
            created_courses: result.created_courses,
            updated_courses: result.updated_courses,
            created_modules: result.created_modules,
            updated_modules: result.updated_modules,
            error_count: result.errors.len(),
            elapsed_ms: started.elapsed().as_millis() as u64,
            created_at: Utc::now(),
        };

        if let Err(e) = self.repo.insert_import_batch(&batch).await {
            warn!(error = %e, "导入批次审计记录写入失败");
        }

        result
    }
}
