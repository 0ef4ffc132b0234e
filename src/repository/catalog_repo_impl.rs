// ==========================================
// 课程批量导入服务 - 课程目录仓储实现 (SQLite)
// ==========================================
// 职责: CatalogRepository 的 rusqlite 实现
// 约束: 所有查询使用参数化，防止 SQL 注入
// ==========================================

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::debug;
use uuid::Uuid;

use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::{CourseDraft, ImportBatch, ModuleDraft};
use crate::repository::catalog_repo::{CatalogRepository, ExistingCatalog};
use crate::repository::error::{RepositoryError, RepositoryResult};

// ==========================================
// SqliteCatalogRepository
// ==========================================
pub struct SqliteCatalogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCatalogRepository {
    /// 打开数据库并确保表结构存在
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（测试与内存库场景）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            init_schema(&guard)?;
        }
        Ok(Self { conn })
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

#[async_trait]
impl CatalogRepository for SqliteCatalogRepository {
    async fn load_catalog_snapshot(&self) -> RepositoryResult<ExistingCatalog> {
        let conn = self.lock()?;
        let mut catalog = ExistingCatalog::new();

        {
            let mut stmt =
                conn.prepare("SELECT course_id, code FROM courses WHERE code IS NOT NULL")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;
            for row in rows {
                let (course_id, code) = row?;
                catalog.add_course(&code, &course_id);
            }
        }

        {
            let mut stmt = conn.prepare("SELECT module_id, course_id, title FROM course_modules")?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?;
            for row in rows {
                let (module_id, course_id, title) = row?;
                catalog.add_module(&course_id, &title, &module_id);
            }
        }

        debug!(courses = catalog.course_count(), "课程目录快照已加载");
        Ok(catalog)
    }

    async fn create_course(&self, draft: &CourseDraft) -> RepositoryResult<String> {
        let conn = self.lock()?;
        let course_id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO courses (course_id, code, title, color, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![course_id, draft.code, draft.title, draft.color, now],
        )?;

        Ok(course_id)
    }

    async fn update_course(&self, course_id: &str, draft: &CourseDraft) -> RepositoryResult<()> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();

        let affected = conn.execute(
            "UPDATE courses SET title = ?2, color = COALESCE(?3, color), updated_at = ?4
             WHERE course_id = ?1",
            params![course_id, draft.title, draft.color, now],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Course".to_string(),
                id: course_id.to_string(),
            });
        }
        Ok(())
    }

    async fn create_module(
        &self,
        draft: &ModuleDraft,
        course_id: &str,
    ) -> RepositoryResult<String> {
        let conn = self.lock()?;
        let module_id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO course_modules (module_id, course_id, title, position, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![module_id, course_id, draft.title, draft.position, now],
        )?;

        Ok(module_id)
    }

    async fn update_module(&self, module_id: &str, draft: &ModuleDraft) -> RepositoryResult<()> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();

        let affected = conn.execute(
            "UPDATE course_modules SET title = ?2, position = COALESCE(?3, position), updated_at = ?4
             WHERE module_id = ?1",
            params![module_id, draft.title, draft.position, now],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "CourseModule".to_string(),
                id: module_id.to_string(),
            });
        }
        Ok(())
    }

    async fn insert_import_batch(&self, batch: &ImportBatch) -> RepositoryResult<()> {
        let conn = self.lock()?;

        conn.execute(
            "INSERT INTO import_batch (batch_id, file_name, total_rows,
                 created_courses, updated_courses, created_modules, updated_modules,
                 error_count, elapsed_ms, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                batch.batch_id,
                batch.file_name,
                batch.total_rows as i64,
                batch.created_courses as i64,
                batch.updated_courses as i64,
                batch.created_modules as i64,
                batch.updated_modules as i64,
                batch.error_count as i64,
                batch.elapsed_ms as i64,
                batch.created_at.to_rfc3339(),
            ],
        )?;

        Ok(())
    }
}
