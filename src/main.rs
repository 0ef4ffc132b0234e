// ==========================================
// 课程批量导入服务 - 命令行入口
// ==========================================
// 用法: lms-course-import <文件.csv|.xlsx|.xls> [数据库路径]
// 流程: 上传 -> 预览计数 -> 提交 -> 打印合计
// ==========================================

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use course_import::api::ImportApi;
use course_import::{logging, APP_NAME, VERSION};
use tracing::{error, info};

/// 默认数据库路径: <数据目录>/lms-course-import/catalog.db
fn default_db_path() -> PathBuf {
    let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("lms-course-import").join("catalog.db")
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    info!("==================================================");
    info!("{} v{}", APP_NAME, VERSION);
    info!("==================================================");

    let mut args = std::env::args().skip(1);
    let file_arg = match args.next() {
        Some(arg) => arg,
        None => {
            error!("用法: lms-course-import <文件.csv|.xlsx|.xls> [数据库路径]");
            return ExitCode::FAILURE;
        }
    };
    let db_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(default_db_path);

    if let Some(parent) = db_path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            error!(error = %e, "无法创建数据目录");
            return ExitCode::FAILURE;
        }
    }
    info!(db = %db_path.display(), "使用数据库");

    let file_path = Path::new(&file_arg);
    let file_name = file_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file_arg.clone());
    let declared_size = std::fs::metadata(file_path).map(|m| m.len()).unwrap_or(0);

    let api = match ImportApi::new(&db_path.to_string_lossy()) {
        Ok(api) => api,
        Err(e) => {
            error!(error = %e, "初始化失败");
            return ExitCode::FAILURE;
        }
    };

    // 上传 + 预览
    let preview = match api.submit_file(file_path, &file_name, declared_size).await {
        Ok(resp) => resp,
        Err(e) => {
            error!(error = %e, "文件未通过校验或解析");
            return ExitCode::FAILURE;
        }
    };
    info!(
        to_create = preview.summary.to_create,
        to_update = preview.summary.to_update,
        invalid = preview.summary.invalid,
        "预览就绪"
    );
    for warning in &preview.warnings {
        info!("解析警告: {}", warning);
    }

    // 提交
    let outcome = match api.confirm_commit().await {
        Ok(resp) => resp,
        Err(e) => {
            error!(error = %e, "提交失败");
            return ExitCode::FAILURE;
        }
    };

    info!(
        created_courses = outcome.created_courses,
        updated_courses = outcome.updated_courses,
        created_modules = outcome.created_modules,
        updated_modules = outcome.updated_modules,
        "导入完成"
    );
    for err in &outcome.errors {
        error!(row = err.row_number, "行提交失败: {}", err.message);
    }

    // 结果以 JSON 输出到标准输出，便于脚本消费
    match serde_json::to_string_pretty(&outcome) {
        Ok(json) => println!("{json}"),
        Err(e) => error!(error = %e, "结果序列化失败"),
    }

    if outcome.errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
