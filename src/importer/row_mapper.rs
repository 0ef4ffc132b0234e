// ==========================================
// 课程批量导入服务 - 行字段映射器
// ==========================================
// 职责: 将解析后的单元格映射为中间导入记录
// 约定: 列名支持别名；取值统一去除首尾空白，空串视为缺失
// ==========================================

use std::collections::HashMap;

use crate::domain::RawRow;

/// 中间导入记录（字段映射结果，尚未校验）
#[derive(Debug, Clone, Default)]
pub struct RawImportRecord {
    pub row_number: usize,              // 原始行号（1起）
    pub kind: Option<String>,           // 行类型列原始值（course/module）
    pub title: Option<String>,          // 名称
    pub code: Option<String>,           // 课程编码（课程行）
    pub color: Option<String>,          // 展示颜色（课程行）
    pub parent_course: Option<String>,  // 父课程编码（模块行）
    pub position: Option<String>,       // 排序原始值（模块行，校验阶段再解析）
}

/// 列名别名表
mod columns {
    pub const KIND: [&str; 3] = ["type", "kind", "row type"];
    pub const TITLE: [&str; 2] = ["title", "name"];
    pub const CODE: [&str; 2] = ["code", "course code"];
    pub const COLOR: [&str; 2] = ["color", "colour"];
    pub const PARENT: [&str; 3] = ["course", "parent course", "parent"];
    pub const POSITION: [&str; 3] = ["position", "order", "sort order"];
}

/// 按别名列表取值（大小写不敏感），空白值视为缺失
fn get_string(cells: &HashMap<String, String>, aliases: &[&str]) -> Option<String> {
    for alias in aliases {
        for (key, value) in cells {
            if key.eq_ignore_ascii_case(alias) {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
    }
    None
}

/// 将单行映射为中间导入记录（纯函数，不做业务校验）
pub fn map_row(row: &RawRow) -> RawImportRecord {
    RawImportRecord {
        row_number: row.row_number,
        kind: get_string(&row.cells, &columns::KIND),
        title: get_string(&row.cells, &columns::TITLE),
        code: get_string(&row.cells, &columns::CODE),
        color: get_string(&row.cells, &columns::COLOR),
        parent_course: get_string(&row.cells, &columns::PARENT),
        position: get_string(&row.cells, &columns::POSITION),
    }
}
