// ==========================================
// 课程批量导入服务 - 配置层
// ==========================================
// 职责: 导入限制配置的读取
// 存储: config 表
// ==========================================

pub mod config_manager;
pub mod import_config_trait;

pub use config_manager::{config_keys, ConfigManager, DEFAULT_MAX_UPLOAD_BYTES};
pub use import_config_trait::ImportConfigReader;
