// ==========================================
// 课程批量导入服务 - 配置管理器
// ==========================================
// 职责: 配置加载与查询
// 存储: config 表 (key-value)
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// 配置键名
pub mod config_keys {
    /// 允许上传的最大文件大小（字节）
    pub const MAX_UPLOAD_BYTES: &str = "import.max_upload_bytes";
}

/// 默认最大上传大小: 10 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 从 config 表读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }
}

#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_max_upload_bytes(&self) -> Result<u64, Box<dyn Error>> {
        match self.get_config_value(config_keys::MAX_UPLOAD_BYTES)? {
            Some(raw) => match raw.parse::<u64>() {
                Ok(v) => Ok(v),
                Err(_) => {
                    warn!(value = %raw, "配置值无法解析为整数，回退到默认上传大小限制");
                    Ok(DEFAULT_MAX_UPLOAD_BYTES)
                }
            },
            None => Ok(DEFAULT_MAX_UPLOAD_BYTES),
        }
    }
}
