// ==========================================
// 课程批量导入服务 - 导入工作流控制器
// ==========================================
// 状态机: Upload -> Reviewing -> Committing -> Done
// 规则:
// - 进入 Reviewing 时立刻完成逐行校验（预览即所得）
// - Reviewing 允许重新上传；Done 仅能通过 reset 退出
// - reset 递增会话ID并丢弃全部会话数据
// - 过期结果防护: 异步操作携带发起时的会话ID，
//   回来时ID不匹配则丢弃，不改动新会话的任何状态
// ==========================================

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::config::ImportConfigReader;
use crate::domain::{
    CommitResult, ImportStage, ParseWarning, ParsedTable, ReviewSummary, UploadCandidate,
    ValidatedRow,
};
use crate::importer::commit_engine::CommitEngine;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_check::check_upload_candidate;
use crate::importer::file_parser::FileParser;
use crate::importer::row_validator::validate_rows;
use crate::repository::CatalogRepository;

// ==========================================
// Notifier - 通知接口（即发即忘）
// ==========================================

/// 宿主界面的提示通道
///
/// 调用失败不传播: 控制器对通知只管发出，不关心结果。
pub trait Notifier: Send + Sync {
    fn report_success(&self, message: &str);
    fn report_error(&self, message: &str);
}

// ==========================================
// 会话状态
// ==========================================

/// 单个导入会话的瞬态数据
///
/// 不变式: candidate/table/validated/result 至多各存一份，
/// 且与当前 stage 匹配。
struct SessionState {
    session_id: u64,                       // 单调递增的会话ID
    stage: ImportStage,                    // 当前状态
    file_name: Option<String>,             // 当前会话的源文件名
    table: Option<ParsedTable>,            // Reviewing 起持有
    validated: Option<Vec<ValidatedRow>>,  // Reviewing 起持有
    result: Option<CommitResult>,          // Done 起持有
}

impl SessionState {
    fn fresh(session_id: u64) -> Self {
        Self {
            session_id,
            stage: ImportStage::Upload,
            file_name: None,
            table: None,
            validated: None,
            result: None,
        }
    }
}

// ==========================================
// ImportWorkflow - 工作流控制器
// ==========================================

/// 导入工作流控制器（单活动会话）
///
/// 解析与提交对调用方异步；行级提交在引擎内部严格串行。
pub struct ImportWorkflow {
    parser: Box<dyn FileParser>,
    repo: Arc<dyn CatalogRepository>,
    config: Arc<dyn ImportConfigReader>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<SessionState>,
}

impl ImportWorkflow {
    pub fn new(
        parser: Box<dyn FileParser>,
        repo: Arc<dyn CatalogRepository>,
        config: Arc<dyn ImportConfigReader>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            parser,
            repo,
            config,
            notifier,
            state: Mutex::new(SessionState::fresh(1)),
        }
    }

    /// 锁中毒时恢复内部值继续使用（状态均为普通数据，无跨行不变式）
    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ==========================================
    // 命令: submit_file / confirm_commit / reset
    // ==========================================

    /// 提交上传文件: 校验 -> 解析 -> 逐行校验 -> 进入 Reviewing
    ///
    /// 文件类型/解析失败返回错误并停留在 Upload；
    /// Reviewing 状态下重复调用视为重新上传。
    pub async fn submit_file(&self, candidate: UploadCandidate) -> ImportResult<ReviewSummary> {
        let session_id = {
            let state = self.lock_state();
            match state.stage {
                ImportStage::Upload | ImportStage::Reviewing => {}
                stage => {
                    return Err(ImportError::InvalidStage {
                        stage: format!("{:?}", stage),
                        expected: "Upload/Reviewing".to_string(),
                    })
                }
            }
            state.session_id
        };

        // 廉价前置检查（扩展名白名单 + 大小上限）
        if let Err(e) = check_upload_candidate(&candidate, self.config.as_ref()).await {
            self.notifier.report_error(&e.to_string());
            return Err(e);
        }

        // 结构性解析; 失败时会话停留在 Upload
        let table = match self.parser.parse(&candidate.path) {
            Ok(table) => table,
            Err(e) => {
                warn!(file = %candidate.file_name, error = %e, "文件解析失败");
                self.notifier.report_error(&e.to_string());
                return Err(e);
            }
        };

        // 进入 Reviewing 前完成逐行校验（预览需要创建/更新/无效计数）
        let catalog = self
            .repo
            .load_catalog_snapshot()
            .await
            .map_err(|e| ImportError::InternalError(e.to_string()))?;
        let validated = validate_rows(&table, &catalog);
        let summary = ReviewSummary::from_rows(&validated);

        {
            let mut state = self.lock_state();
            if state.session_id != session_id {
                debug!(
                    stale = session_id,
                    current = state.session_id,
                    "解析结果来自已重置的会话，丢弃"
                );
                return Err(ImportError::SessionReset);
            }

            state.stage = ImportStage::Reviewing;
            state.file_name = Some(candidate.file_name.clone());
            state.table = Some(table);
            state.validated = Some(validated);
            state.result = None;
        }

        info!(
            file = %candidate.file_name,
            to_create = summary.to_create,
            to_update = summary.to_update,
            invalid = summary.invalid,
            "文件已解析，进入预览"
        );
        self.notifier
            .report_success(&format!("文件 {} 已就绪，可预览导入", candidate.file_name));

        Ok(summary)
    }

    /// 确认提交: Reviewing -> Committing -> Done
    ///
    /// 行级提交失败不阻止到达 Done，失败明细在 CommitResult 中。
    pub async fn confirm_commit(&self) -> ImportResult<CommitResult> {
        let (session_id, file_name, rows) = {
            let mut state = self.lock_state();
            if state.stage != ImportStage::Reviewing {
                return Err(ImportError::InvalidStage {
                    stage: format!("{:?}", state.stage),
                    expected: "Reviewing".to_string(),
                });
            }

            let rows = state.validated.clone().unwrap_or_default();
            let file_name = state.file_name.clone().unwrap_or_default();
            state.stage = ImportStage::Committing;
            (state.session_id, file_name, rows)
        };

        let engine = CommitEngine::new(Arc::clone(&self.repo));
        let result = engine.commit_with_audit(&file_name, &rows).await;

        {
            let mut state = self.lock_state();
            if state.session_id != session_id {
                debug!(
                    stale = session_id,
                    current = state.session_id,
                    "提交结果来自已重置的会话，丢弃"
                );
                return Err(ImportError::SessionReset);
            }

            state.stage = ImportStage::Done;
            state.result = Some(result.clone());
        }

        let message = format!(
            "导入完成: 新建课程 {}、更新课程 {}、新建模块 {}、更新模块 {}、失败 {} 行",
            result.created_courses,
            result.updated_courses,
            result.created_modules,
            result.updated_modules,
            result.errors.len()
        );
        if result.errors.is_empty() {
            self.notifier.report_success(&message);
        } else {
            self.notifier.report_error(&message);
        }

        Ok(result)
    }

    /// 重置会话: 回到 Upload，会话ID递增，丢弃全部会话数据
    ///
    /// # 返回
    /// - 新会话ID
    pub fn reset(&self) -> u64 {
        let mut state = self.lock_state();
        let next = state.session_id + 1;
        *state = SessionState::fresh(next);
        info!(session_id = next, "导入会话已重置");
        next
    }

    // ==========================================
    // 可观察状态（宿主界面渲染用）
    // ==========================================

    pub fn stage(&self) -> ImportStage {
        self.lock_state().stage
    }

    pub fn session_id(&self) -> u64 {
        self.lock_state().session_id
    }

    /// 预览计数（Reviewing 及之后可用）
    pub fn review_summary(&self) -> Option<ReviewSummary> {
        self.lock_state()
            .validated
            .as_deref()
            .map(ReviewSummary::from_rows)
    }

    /// 逐行校验明细（预览列表渲染用）
    pub fn validated_rows(&self) -> Option<Vec<ValidatedRow>> {
        self.lock_state().validated.clone()
    }

    /// 解析阶段的非致命警告
    pub fn parse_warnings(&self) -> Vec<ParseWarning> {
        self.lock_state()
            .table
            .as_ref()
            .map(|t| t.warnings.clone())
            .unwrap_or_default()
    }

    /// 提交结果（Done 状态可用）
    pub fn commit_result(&self) -> Option<CommitResult> {
        self.lock_state().result.clone()
    }
}
