// ==========================================
// 课程导入API
// ==========================================
// 职责: 封装导入工作流，暴露宿主界面可直接消费的
//       命令（submit_file / confirm_commit / reset）
//       与可观察状态（stage / 预览计数 / 提交合计）
// ==========================================

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::api::error::ApiResult;
use crate::api::notifier::TracingNotifier;
use crate::config::{ConfigManager, ImportConfigReader};
use crate::domain::{CommitResult, CommitRowError, ImportStage, ReviewSummary, UploadCandidate};
use crate::importer::file_parser::{FileParser, UniversalFileParser};
use crate::importer::workflow::{ImportWorkflow, Notifier};
use crate::repository::{CatalogRepository, SqliteCatalogRepository};

// ==========================================
// 响应类型（全部可序列化，供宿主界面渲染）
// ==========================================

/// submit_file 的响应: 进入预览后的计数与解析警告
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitFileResponse {
    pub stage: ImportStage,
    pub summary: ReviewSummary,
    pub warnings: Vec<String>,
}

/// confirm_commit 的响应: 各类合计与逐行失败明细
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitResponse {
    pub stage: ImportStage,
    pub created_courses: usize,
    pub updated_courses: usize,
    pub created_modules: usize,
    pub updated_modules: usize,
    pub errors: Vec<CommitRowError>,
}

impl CommitResponse {
    fn from_result(result: &CommitResult) -> Self {
        Self {
            stage: ImportStage::Done,
            created_courses: result.created_courses,
            updated_courses: result.updated_courses,
            created_modules: result.created_modules,
            updated_modules: result.updated_modules,
            errors: result.errors.clone(),
        }
    }
}

/// 当前会话的可观察状态
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportStateResponse {
    pub stage: ImportStage,
    pub session_id: u64,
    pub summary: Option<ReviewSummary>,
    pub totals: Option<CommitResult>,
}

// ==========================================
// ImportApi
// ==========================================
pub struct ImportApi {
    workflow: Arc<ImportWorkflow>,
}

impl ImportApi {
    /// 按默认组件组装: SQLite 仓储 + 配置表 + 扩展名自适应解析器 + 日志通知
    pub fn new(db_path: &str) -> ApiResult<Self> {
        let repo: Arc<dyn CatalogRepository> = Arc::new(SqliteCatalogRepository::new(db_path)?);
        let config: Arc<dyn ImportConfigReader> = Arc::new(
            ConfigManager::new(db_path)
                .map_err(|e| crate::api::error::ApiError::InternalError(e.to_string()))?,
        );
        let parser: Box<dyn FileParser> = Box::new(UniversalFileParser);
        let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);

        Ok(Self {
            workflow: Arc::new(ImportWorkflow::new(parser, repo, config, notifier)),
        })
    }

    /// 注入自定义组件（测试与嵌入宿主场景）
    pub fn with_components(
        parser: Box<dyn FileParser>,
        repo: Arc<dyn CatalogRepository>,
        config: Arc<dyn ImportConfigReader>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            workflow: Arc::new(ImportWorkflow::new(parser, repo, config, notifier)),
        }
    }

    /// 底层工作流句柄（宿主需要跨任务共享时使用）
    pub fn workflow(&self) -> Arc<ImportWorkflow> {
        Arc::clone(&self.workflow)
    }

    // ==========================================
    // 命令
    // ==========================================

    /// 提交上传文件并进入预览
    #[instrument(skip(self), fields(file = %file_name))]
    pub async fn submit_file(
        &self,
        path: &Path,
        file_name: &str,
        declared_size: u64,
    ) -> ApiResult<SubmitFileResponse> {
        let candidate = UploadCandidate::new(path, file_name, declared_size);
        let summary = self.workflow.submit_file(candidate).await?;

        let warnings = self
            .workflow
            .parse_warnings()
            .into_iter()
            .map(|w| w.message)
            .collect();

        Ok(SubmitFileResponse {
            stage: self.workflow.stage(),
            summary,
            warnings,
        })
    }

    /// 确认提交当前预览批次
    #[instrument(skip(self))]
    pub async fn confirm_commit(&self) -> ApiResult<CommitResponse> {
        let result = self.workflow.confirm_commit().await?;
        Ok(CommitResponse::from_result(&result))
    }

    /// 重置会话，返回新会话ID
    pub fn reset(&self) -> u64 {
        self.workflow.reset()
    }

    // ==========================================
    // 可观察状态
    // ==========================================

    pub fn state(&self) -> ImportStateResponse {
        ImportStateResponse {
            stage: self.workflow.stage(),
            session_id: self.workflow.session_id(),
            summary: self.workflow.review_summary(),
            totals: self.workflow.commit_result(),
        }
    }
}
