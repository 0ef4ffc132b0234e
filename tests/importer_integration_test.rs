// ==========================================
// 导入流水线集成测试
// ==========================================
// 测试目标: 真实 SQLite + 真实 CSV 文件的完整导入流程
// ==========================================


use course_import::api::ImportApi;
use course_import::domain::{ImportStage, RowOutcome};
use course_import::logging;
use test_helpers::{create_test_db, seed_course, seed_module, write_csv};

fn open(db_path: &str) -> rusqlite::Connection {
    rusqlite::Connection::open(db_path).expect("打开测试数据库失败")
}

async fn submit(
    api: &ImportApi,
    csv: &tempfile::NamedTempFile,
) -> course_import::api::SubmitFileResponse {
    let size = std::fs::metadata(csv.path()).unwrap().len();
    api.submit_file(csv.path(), "import.csv", size)
        .await
        .expect("submit_file 应当成功")
}

#[tokio::test]
async fn test_full_flow_creates_courses_and_modules() {
    logging::init_test();
    let (_db_file, db_path) = create_test_db().unwrap();
    let api = ImportApi::new(&db_path).unwrap();

    let csv = write_csv(
        "type,title,code,course\n\
         course,Intro to CS,CS101,\n\
         course,Algebra,MATH201,\n\
         module,Week One,,CS101\n\
         module,Linear Equations,,MATH201\n",
    );

    let preview = submit(&api, &csv).await;
    assert_eq!(api.state().stage, ImportStage::Reviewing);
    assert_eq!(preview.summary.to_create, 4);
    assert_eq!(preview.summary.invalid, 0);

    let outcome = api.confirm_commit().await.unwrap();
    assert_eq!(api.state().stage, ImportStage::Done);
    assert_eq!(outcome.created_courses, 2);
    assert_eq!(outcome.created_modules, 2);
    assert!(outcome.errors.is_empty());

    let conn = open(&db_path);
    let courses: i64 = conn
        .query_row("SELECT COUNT(*) FROM courses", [], |r| r.get(0))
        .unwrap();
    let modules: i64 = conn
        .query_row("SELECT COUNT(*) FROM course_modules", [], |r| r.get(0))
        .unwrap();
    assert_eq!(courses, 2);
    assert_eq!(modules, 2);

    // 审计记录已写入
    let batches: i64 = conn
        .query_row("SELECT COUNT(*) FROM import_batch", [], |r| r.get(0))
        .unwrap();
    assert_eq!(batches, 1);
}

#[tokio::test]
async fn test_three_row_csv_title_required_code_optional() {
    logging::init_test();
    let (_db_file, db_path) = create_test_db().unwrap();
    let api = ImportApi::new(&db_path).unwrap();

    let csv = write_csv(
        "title,code\n\
         Intro to CS,CS101\n\
         ,CS102\n\
         Algebra,\n",
    );

    let preview = submit(&api, &csv).await;

    // 第 3 行缺名称无效；第 4 行缺编码仍可创建
    assert_eq!(preview.summary.to_create, 2);
    assert_eq!(preview.summary.to_update, 0);
    assert_eq!(preview.summary.invalid, 1);

    let rows = api.workflow().validated_rows().unwrap();
    assert_eq!(rows.len(), 3);
    assert!(matches!(rows[0].outcome, RowOutcome::ToCreate { .. }));
    match &rows[1].outcome {
        RowOutcome::Invalid { reasons } => {
            assert_eq!(rows[1].row_number, 3);
            assert!(reasons[0].contains("名称"));
        }
        other => panic!("第 3 行应为无效, got {:?}", other),
    }
    assert!(matches!(rows[2].outcome, RowOutcome::ToCreate { .. }));
}

#[tokio::test]
async fn test_update_existing_entities_by_normalized_key() {
    logging::init_test();
    let (_db_file, db_path) = create_test_db().unwrap();
    {
        let conn = open(&db_path);
        seed_course(&conn, "c1", "CS101", "Intro to CS");
        seed_module(&conn, "m1", "c1", "Week One");
    }
    let api = ImportApi::new(&db_path).unwrap();

    let csv = write_csv(
        "title,code,course\n\
         Intro to CS (2026),cs101,\n\
         WEEK ONE,,CS101\n",
    );

    let preview = submit(&api, &csv).await;
    assert_eq!(preview.summary.to_update, 2);
    assert_eq!(preview.summary.to_create, 0);

    let outcome = api.confirm_commit().await.unwrap();
    assert_eq!(outcome.updated_courses, 1);
    assert_eq!(outcome.updated_modules, 1);
    assert!(outcome.errors.is_empty());

    let conn = open(&db_path);
    let title: String = conn
        .query_row("SELECT title FROM courses WHERE course_id='c1'", [], |r| {
            r.get(0)
        })
        .unwrap();
    assert_eq!(title, "Intro to CS (2026)");

    // 不新增实体
    let courses: i64 = conn
        .query_row("SELECT COUNT(*) FROM courses", [], |r| r.get(0))
        .unwrap();
    assert_eq!(courses, 1);
}

#[tokio::test]
async fn test_partial_failure_duplicate_code_in_batch() {
    logging::init_test();
    let (_db_file, db_path) = create_test_db().unwrap();
    let api = ImportApi::new(&db_path).unwrap();

    // 两行课程同编码: 第一行创建成功，第二行触发唯一约束失败；
    // 模块引用该编码，应落到成功创建的那门课程上
    let csv = write_csv(
        "type,title,code,course\n\
         course,Intro,CS101,\n\
         course,Intro duplicated,CS101,\n\
         module,Week One,,CS101\n",
    );

    let preview = submit(&api, &csv).await;
    assert_eq!(preview.summary.to_create, 3);

    let outcome = api.confirm_commit().await.unwrap();
    assert_eq!(outcome.created_courses, 1);
    assert_eq!(outcome.created_modules, 1);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].row_number, 3);

    // 成功合计 + 失败行数 = 非无效行数
    let succeeded = outcome.created_courses
        + outcome.updated_courses
        + outcome.created_modules
        + outcome.updated_modules;
    assert_eq!(succeeded + outcome.errors.len(), 3);

    // 模块挂在成功创建的课程下
    let conn = open(&db_path);
    let course_title: String = conn
        .query_row(
            "SELECT c.title FROM course_modules m
             JOIN courses c ON c.course_id = m.course_id",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(course_title, "Intro");
}

#[tokio::test]
async fn test_row_numbers_preserved_through_blank_rows() {
    logging::init_test();
    let (_db_file, db_path) = create_test_db().unwrap();
    let api = ImportApi::new(&db_path).unwrap();

    let csv = write_csv(
        "title,code\n\
         Intro,CS101\n\
         ,\n\
         ,CS999\n",
    );

    submit(&api, &csv).await;

    let rows = api.workflow().validated_rows().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].row_number, 2);
    // 第 3 行为空行被跳过；缺名称的无效行仍报告原始行号 4
    assert_eq!(rows[1].row_number, 4);
    assert!(rows[1].is_invalid());
}

#[tokio::test]
async fn test_parse_failure_stays_in_upload() {
    logging::init_test();
    let (_db_file, db_path) = create_test_db().unwrap();
    let api = ImportApi::new(&db_path).unwrap();

    // 空文件: 无表头，结构性解析失败
    let csv = write_csv("");
    let result = api.submit_file(csv.path(), "empty.csv", 0).await;

    assert!(result.is_err());
    assert_eq!(api.state().stage, ImportStage::Upload);
    assert!(api.state().summary.is_none());
}

#[tokio::test]
async fn test_unsupported_extension_rejected_before_parse() {
    logging::init_test();
    let (_db_file, db_path) = create_test_db().unwrap();
    let api = ImportApi::new(&db_path).unwrap();

    let result = api
        .submit_file(std::path::Path::new("/tmp/notes.txt"), "notes.txt", 10)
        .await;

    match result {
        Err(course_import::api::ApiError::ValidationError(_)) => {}
        other => panic!("应为 ValidationError, got {:?}", other.map(|_| ())),
    }
    assert_eq!(api.state().stage, ImportStage::Upload);
}
