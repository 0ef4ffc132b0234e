// ==========================================
// 课程批量导入服务 - 逐行校验器
// ==========================================
// 职责: 将解析表逐行判定为 待创建/待更新/无效
// 红线: 纯函数，不做任何持久化 I/O；同一输入必得同一输出
// 规则:
// - 名称必填；模块行额外要求父课程引用
// - 父课程须为已有课程，或同一表中更早出现的课程草稿
//   （前向引用视为无效行）
// - 创建/更新判定: 课程按编码、模块按课程内名称做
//   大小写规范化后的精确匹配
// ==========================================

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::domain::course::normalize_key;
use crate::domain::{
    CourseDraft, EntityDraft, ModuleDraft, ParentCourseRef, ParsedTable, RowOutcome, ValidatedRow,
};
use crate::importer::row_mapper::{map_row, RawImportRecord};
use crate::repository::ExistingCatalog;

/// 行类型判定结果
enum RowKind {
    Course,
    Module,
    Unknown(String),
}

/// 判定行类型: 显式类型列优先，否则按父课程引用是否存在推断
fn classify(record: &RawImportRecord) -> RowKind {
    match record.kind.as_deref() {
        Some(raw) => match raw.trim().to_lowercase().as_str() {
            "course" => RowKind::Course,
            "module" => RowKind::Module,
            other => RowKind::Unknown(other.to_string()),
        },
        None => {
            if record.parent_course.is_some() {
                RowKind::Module
            } else {
                RowKind::Course
            }
        }
    }
}

/// 对整张解析表做逐行校验
///
/// # 参数
/// - table: 解析后的表（行序与源文件一致）
/// - catalog: 已有课程/模块快照（注入，不在此处加载）
///
/// # 返回
/// - Vec<ValidatedRow>: 与输入行序一一对应；每行恰好一个结论
pub fn validate_rows(table: &ParsedTable, catalog: &ExistingCatalog) -> Vec<ValidatedRow> {
    // 预扫描: 本表中所有课程行声明的编码（用于区分
    // “前向引用”与“编码完全不存在”两种失败原因）
    let all_batch_codes: HashSet<String> = table
        .rows
        .iter()
        .map(map_row)
        .filter(|rec| matches!(classify(rec), RowKind::Course))
        .filter_map(|rec| rec.code.as_deref().map(normalize_key))
        .filter(|code| !code.is_empty())
        .collect();

    // 已经出现过的课程草稿编码 -> 该行的判定（在batch中创建 / 匹配到已有课程）
    let mut earlier_courses: HashMap<String, ParentCourseRef> = HashMap::new();

    let mut results = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        let record = map_row(row);
        let outcome = match classify(&record) {
            RowKind::Course => validate_course_row(&record, catalog, &mut earlier_courses),
            RowKind::Module => {
                validate_module_row(&record, catalog, &earlier_courses, &all_batch_codes)
            }
            RowKind::Unknown(raw) => RowOutcome::Invalid {
                reasons: vec![format!("无法识别的行类型: {}", raw)],
            },
        };

        results.push(ValidatedRow {
            row_number: row.row_number,
            outcome,
        });
    }

    debug!(rows = results.len(), "逐行校验完成");
    results
}

fn validate_course_row(
    record: &RawImportRecord,
    catalog: &ExistingCatalog,
    earlier_courses: &mut HashMap<String, ParentCourseRef>,
) -> RowOutcome {
    let mut reasons = Vec::new();

    if record.title.is_none() {
        reasons.push("课程名称不能为空".to_string());
    }

    if !reasons.is_empty() {
        return RowOutcome::Invalid { reasons };
    }

    let draft = CourseDraft {
        title: record.title.clone().unwrap_or_default(),
        code: record.code.clone(),
        color: record.color.clone(),
    };

    // 创建/更新判定: 课程编码的规范化精确匹配；无编码则恒为创建
    let existing_id = record
        .code
        .as_deref()
        .and_then(|code| catalog.find_course_by_code(code))
        .map(str::to_string);

    // 登记本行编码，供后续模块行解析父课程引用
    if let Some(code) = record.code.as_deref() {
        let key = normalize_key(code);
        if !key.is_empty() {
            let parent_ref = match &existing_id {
                Some(id) => ParentCourseRef::Existing(id.clone()),
                None => ParentCourseRef::InBatch(key.clone()),
            };
            earlier_courses.entry(key).or_insert(parent_ref);
        }
    }

    match existing_id {
        Some(entity_id) => RowOutcome::ToUpdate {
            entity_id,
            draft: EntityDraft::Course(draft),
        },
        None => RowOutcome::ToCreate {
            draft: EntityDraft::Course(draft),
        },
    }
}

fn validate_module_row(
    record: &RawImportRecord,
    catalog: &ExistingCatalog,
    earlier_courses: &HashMap<String, ParentCourseRef>,
    all_batch_codes: &HashSet<String>,
) -> RowOutcome {
    let mut reasons = Vec::new();

    if record.title.is_none() {
        reasons.push("模块名称不能为空".to_string());
    }

    let parent = match record.parent_course.as_deref() {
        None => {
            reasons.push("父课程引用不能为空".to_string());
            None
        }
        Some(raw) => {
            // 解析顺序: 已有课程 -> 同表更早出现的课程草稿 -> 失败
            if let Some(id) = catalog.find_course_by_code(raw) {
                Some(ParentCourseRef::Existing(id.to_string()))
            } else if let Some(parent_ref) = earlier_courses.get(&normalize_key(raw)) {
                Some(parent_ref.clone())
            } else if all_batch_codes.contains(&normalize_key(raw)) {
                // 编码在表中出现，但在当前行之后 —— 前向引用不允许
                reasons.push(format!("课程 \"{}\" 在本次导入中尚未定义", raw));
                None
            } else {
                reasons.push(format!("课程 \"{}\" 不存在", raw));
                None
            }
        }
    };

    let position = match record.position.as_deref() {
        None => None,
        Some(raw) => match raw.parse::<i32>() {
            Ok(v) => Some(v),
            Err(_) => {
                reasons.push(format!("排序值必须为整数: {}", raw));
                None
            }
        },
    };

    if !reasons.is_empty() {
        return RowOutcome::Invalid { reasons };
    }

    let title = record.title.clone().unwrap_or_default();
    let parent = match parent {
        Some(p) => p,
        None => {
            return RowOutcome::Invalid {
                reasons: vec!["父课程引用不能为空".to_string()],
            }
        }
    };

    // 创建/更新判定: 仅当父课程为已有课程时，才可能匹配到已有模块
    if let ParentCourseRef::Existing(course_id) = &parent {
        if let Some(module_id) = catalog.find_module(course_id, &title) {
            return RowOutcome::ToUpdate {
                entity_id: module_id.to_string(),
                draft: EntityDraft::Module(ModuleDraft {
                    title,
                    parent,
                    position,
                }),
            };
        }
    }

    RowOutcome::ToCreate {
        draft: EntityDraft::Module(ModuleDraft {
            title,
            parent,
            position,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ParseWarning, RawRow};

    fn table(rows: Vec<(usize, Vec<(&str, &str)>)>) -> ParsedTable {
        ParsedTable {
            headers: vec!["type".into(), "title".into(), "code".into(), "course".into()],
            rows: rows
                .into_iter()
                .map(|(row_number, pairs)| RawRow {
                    row_number,
                    cells: pairs
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                })
                .collect(),
            warnings: Vec::<ParseWarning>::new(),
        }
    }

    #[test]
    fn test_title_required_code_optional() {
        // 表头 title,code；第 2 行缺名称，第 3 行缺编码
        let table = table(vec![
            (2, vec![("title", "Intro to CS"), ("code", "CS101")]),
            (3, vec![("title", ""), ("code", "CS102")]),
            (4, vec![("title", "Algebra"), ("code", "")]),
        ]);
        let catalog = ExistingCatalog::new();

        let rows = validate_rows(&table, &catalog);

        assert_eq!(rows.len(), 3);
        assert!(matches!(rows[0].outcome, RowOutcome::ToCreate { .. }));
        match &rows[1].outcome {
            RowOutcome::Invalid { reasons } => {
                assert_eq!(reasons.len(), 1);
                assert!(reasons[0].contains("名称"));
            }
            other => panic!("expected Invalid, got {:?}", other),
        }
        // 编码为选填，缺编码仍为待创建
        assert!(matches!(rows[2].outcome, RowOutcome::ToCreate { .. }));
    }

    #[test]
    fn test_update_vs_create_by_normalized_code() {
        let mut catalog = ExistingCatalog::new();
        catalog.add_course("CS101", "c1");

        let table = table(vec![
            (2, vec![("title", "Intro (rev)"), ("code", "cs101")]),
            (3, vec![("title", "New course"), ("code", "CS999")]),
        ]);

        let rows = validate_rows(&table, &catalog);

        match &rows[0].outcome {
            RowOutcome::ToUpdate { entity_id, .. } => assert_eq!(entity_id, "c1"),
            other => panic!("expected ToUpdate, got {:?}", other),
        }
        assert!(matches!(rows[1].outcome, RowOutcome::ToCreate { .. }));
    }

    #[test]
    fn test_module_resolves_earlier_draft_not_forward_reference() {
        let catalog = ExistingCatalog::new();
        let table = table(vec![
            (2, vec![("title", "Intro"), ("code", "CS101")]),
            (3, vec![("title", "Week One"), ("course", "CS101")]),
            (4, vec![("title", "Week One"), ("course", "CS202")]),
            (5, vec![("title", "Advanced"), ("code", "CS202")]),
        ]);

        let rows = validate_rows(&table, &catalog);

        // 第 3 行引用更早的课程草稿 -> 待创建（InBatch 引用）
        match &rows[1].outcome {
            RowOutcome::ToCreate {
                draft: EntityDraft::Module(m),
            } => assert_eq!(m.parent, ParentCourseRef::InBatch("cs101".into())),
            other => panic!("expected module ToCreate, got {:?}", other),
        }
        // 第 4 行前向引用第 5 行的课程 -> 无效
        match &rows[2].outcome {
            RowOutcome::Invalid { reasons } => {
                assert!(reasons[0].contains("尚未定义"));
            }
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_module_unknown_course_and_missing_title_collects_all_reasons() {
        let catalog = ExistingCatalog::new();
        let table = table(vec![(2, vec![("type", "module"), ("course", "GHOST")])]);

        let rows = validate_rows(&table, &catalog);

        match &rows[0].outcome {
            RowOutcome::Invalid { reasons } => {
                // 所有违规原因都要收集，而非只报第一条
                assert_eq!(reasons.len(), 2);
                assert!(reasons.iter().any(|r| r.contains("模块名称")));
                assert!(reasons.iter().any(|r| r.contains("不存在")));
            }
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_module_update_match_within_existing_course() {
        let mut catalog = ExistingCatalog::new();
        catalog.add_course("CS101", "c1");
        catalog.add_module("c1", "Week One", "m1");

        let table = table(vec![(2, vec![("title", "WEEK ONE"), ("course", "CS101")])]);

        let rows = validate_rows(&table, &catalog);

        match &rows[0].outcome {
            RowOutcome::ToUpdate { entity_id, .. } => assert_eq!(entity_id, "m1"),
            other => panic!("expected ToUpdate, got {:?}", other),
        }
    }

    #[test]
    fn test_validator_is_deterministic() {
        let mut catalog = ExistingCatalog::new();
        catalog.add_course("CS101", "c1");

        let table = table(vec![
            (2, vec![("title", "Intro"), ("code", "CS101")]),
            (3, vec![("title", "Week One"), ("course", "CS101")]),
            (4, vec![("title", "")]),
        ]);

        let first = validate_rows(&table, &catalog);
        let second = validate_rows(&table, &catalog);
        assert_eq!(first, second);
    }

    #[test]
    fn test_every_row_gets_exactly_one_outcome() {
        let catalog = ExistingCatalog::new();
        let table = table(vec![
            (2, vec![("title", "A"), ("code", "X1")]),
            (3, vec![("title", "")]),
            (4, vec![("title", "M"), ("course", "X1")]),
        ]);

        let rows = validate_rows(&table, &catalog);
        assert_eq!(rows.len(), 3);

        let summary = crate::domain::ReviewSummary::from_rows(&rows);
        assert_eq!(summary.total(), 3);
    }
}
