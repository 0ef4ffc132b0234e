// ==========================================
// 课程批量导入服务 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入流水线所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::error::Error;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 文件校验阶段读取导入限制
// 实现者: ConfigManager（从 config 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 获取允许上传的最大文件大小（字节）
    ///
    /// # 默认值
    /// - 10 MiB
    async fn get_max_upload_bytes(&self) -> Result<u64, Box<dyn Error>>;
}
