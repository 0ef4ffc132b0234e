// ==========================================
// 课程批量导入服务 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键/超时）
// - 集中建表逻辑，保证导入流水线所需的表结构存在
// ==========================================

use rusqlite::Connection;
use std::time::Duration;
use tracing::debug;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema 版本
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化课程目录与导入相关表结构
///
/// 幂等：全部使用 CREATE TABLE IF NOT EXISTS，可在已有库上重复执行。
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    debug!("初始化数据库表结构");

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version     INTEGER PRIMARY KEY,
            applied_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS courses (
            course_id   TEXT PRIMARY KEY,
            code        TEXT,                -- 课程编码（可空；非空时唯一）
            title       TEXT NOT NULL,
            color       TEXT,
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_courses_code
            ON courses(code) WHERE code IS NOT NULL;

        CREATE TABLE IF NOT EXISTS course_modules (
            module_id   TEXT PRIMARY KEY,
            course_id   TEXT NOT NULL REFERENCES courses(course_id),
            title       TEXT NOT NULL,
            position    INTEGER,             -- 模块在课程内的排序（可空）
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_course_modules_course
            ON course_modules(course_id);

        CREATE TABLE IF NOT EXISTS import_batch (
            batch_id         TEXT PRIMARY KEY,
            file_name        TEXT NOT NULL,
            total_rows       INTEGER NOT NULL,
            created_courses  INTEGER NOT NULL,
            updated_courses  INTEGER NOT NULL,
            created_modules  INTEGER NOT NULL,
            updated_modules  INTEGER NOT NULL,
            error_count      INTEGER NOT NULL,
            elapsed_ms       INTEGER NOT NULL,
            created_at       TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS config (
            key    TEXT PRIMARY KEY,
            value  TEXT NOT NULL
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_version'",
        [],
        |row| row.get(0),
    )?;

    if has_table == 0 {
        return Ok(None);
    }

    conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
        row.get(0)
    })
}
