// ==========================================
// 课程批量导入服务 - 表格文件解析器
// ==========================================
// 支持: CSV (.csv) / Excel (.xlsx/.xls)
// 约定:
// - 表头 = 第一个非空行；重名列按 _2/_3 后缀消歧
// - 缺失的行尾单元格按空串处理；超出表头宽度的内容记警告
// - 全空行跳过，但保留原始行号（1 起，表头为第 1 行）
// ==========================================

use std::fs::File;
use std::path::Path;

use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use tracing::debug;

use crate::domain::{ParseWarning, ParsedTable, RawRow};
use crate::importer::error::{ImportError, ImportResult};

// ==========================================
// FileParser Trait
// ==========================================

/// 表格文件解析器接口
///
/// 实现者: CsvParser / ExcelParser / UniversalFileParser
pub trait FileParser: Send + Sync {
    /// 将文件解析为规范化的内存表
    ///
    /// # 返回
    /// - Ok(ParsedTable): 解析成功（可能带非致命警告）
    /// - Err(ImportError): 结构性失败（格式无法解码、表头缺失等）
    fn parse(&self, file_path: &Path) -> ImportResult<ParsedTable>;
}

// ==========================================
// 表格组装（CSV/Excel 公用）
// ==========================================

/// 由 (原始行号, 单元格列表) 序列组装 ParsedTable
///
/// 表头检测、重名消歧、行宽对齐、空行跳过都在这里完成，
/// 使两种文件格式共享同一套语义。
fn assemble_table(raw_rows: Vec<(usize, Vec<String>)>) -> ImportResult<ParsedTable> {
    let mut iter = raw_rows.into_iter();

    // 表头 = 第一个非空行
    let header_cells = loop {
        match iter.next() {
            Some((_, cells)) => {
                if cells.iter().any(|c| !c.trim().is_empty()) {
                    break cells;
                }
            }
            None => return Err(ImportError::EmptyHeader),
        }
    };

    let headers = disambiguate_headers(&header_cells);

    let mut rows = Vec::new();
    let mut warnings = Vec::new();

    for (row_number, cells) in iter {
        // 全空行跳过，原始行号不回收
        if cells.iter().all(|c| c.trim().is_empty()) {
            continue;
        }

        // 超出表头宽度的非空单元格: 忽略但记录警告
        let extra_content = cells
            .iter()
            .skip(headers.len())
            .filter(|c| !c.trim().is_empty())
            .count();
        if extra_content > 0 {
            warnings.push(ParseWarning {
                row_number,
                message: format!("第 {} 行有 {} 个超出表头宽度的单元格，已忽略", row_number, extra_content),
            });
        }

        // 与表头对齐: 缺失的行尾单元格按空串处理
        let cells_map = headers
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                let value = cells.get(idx).map(|c| c.trim().to_string()).unwrap_or_default();
                (header.clone(), value)
            })
            .collect();

        rows.push(RawRow {
            row_number,
            cells: cells_map,
        });
    }

    debug!(
        columns = headers.len(),
        rows = rows.len(),
        warnings = warnings.len(),
        "表格解析完成"
    );

    Ok(ParsedTable {
        headers,
        rows,
        warnings,
    })
}

/// 表头消歧: 重名列追加 _2/_3 后缀，空表头单元格命名为 column_N
fn disambiguate_headers(cells: &[String]) -> Vec<String> {
    let mut headers: Vec<String> = Vec::with_capacity(cells.len());

    for (idx, cell) in cells.iter().enumerate() {
        let base = {
            let trimmed = cell.trim();
            if trimmed.is_empty() {
                format!("column_{}", idx + 1)
            } else {
                trimmed.to_string()
            }
        };

        let mut name = base.clone();
        let mut n = 2;
        while headers.contains(&name) {
            name = format!("{}_{}", base, n);
            n += 1;
        }
        headers.push(name);
    }

    headers
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse(&self, file_path: &Path) -> ImportResult<ParsedTable> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false) // 表头检测由 assemble_table 统一处理
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let mut raw_rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            let cells: Vec<String> = record.iter().map(str::to_string).collect();
            // 行号 1 起，与源文件一致
            raw_rows.push((idx + 1, cells));
        }

        assemble_table(raw_rows)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse(&self, file_path: &Path) -> ImportResult<ParsedTable> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        // open_workbook_auto 同时覆盖 .xlsx 与 .xls
        let mut workbook = open_workbook_auto(file_path)?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or(ImportError::NoWorksheet)?;

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

        // 已用区域可能不从第 1 行开始，行号按工作表绝对行计
        let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);

        let mut raw_rows = Vec::new();
        for (idx, data_row) in range.rows().enumerate() {
            let cells: Vec<String> = data_row.iter().map(|cell| cell.to_string()).collect();
            raw_rows.push((first_row + idx + 1, cells));
        }

        assemble_table(raw_rows)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn parse(&self, file_path: &Path) -> ImportResult<ParsedTable> {
        let ext = file_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => CsvParser.parse(file_path),
            "xlsx" | "xls" => ExcelParser.parse(file_path),
            _ => Err(ImportError::UnsupportedFileType(ext)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(content: &str) -> NamedTempFile {
        let mut temp_file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(temp_file, "{}", content).unwrap();
        temp_file
    }

    #[test]
    fn test_csv_parser_basic() {
        let file = csv_file("title,code\nIntro to CS,CS101\nAlgebra,MATH201\n");

        let table = CsvParser.parse(file.path()).unwrap();

        assert_eq!(table.headers, vec!["title", "code"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].row_number, 2);
        assert_eq!(table.rows[0].cells.get("title"), Some(&"Intro to CS".to_string()));
        assert_eq!(table.rows[1].cells.get("code"), Some(&"MATH201".to_string()));
        assert!(table.warnings.is_empty());
    }

    #[test]
    fn test_header_is_first_non_empty_row() {
        let file = csv_file(",\n,\ntitle,code\nIntro,CS101\n");

        let table = CsvParser.parse(file.path()).unwrap();

        assert_eq!(table.headers, vec!["title", "code"]);
        assert_eq!(table.rows.len(), 1);
        // 数据行保留源文件中的绝对行号
        assert_eq!(table.rows[0].row_number, 4);
    }

    #[test]
    fn test_duplicate_headers_get_suffix() {
        let file = csv_file("title,title,code\na,b,c\n");

        let table = CsvParser.parse(file.path()).unwrap();

        assert_eq!(table.headers, vec!["title", "title_2", "code"]);
        assert_eq!(table.rows[0].cells.get("title"), Some(&"a".to_string()));
        assert_eq!(table.rows[0].cells.get("title_2"), Some(&"b".to_string()));
    }

    #[test]
    fn test_missing_trailing_cells_become_empty() {
        let file = csv_file("title,code,color\nIntro,CS101\n");

        let table = CsvParser.parse(file.path()).unwrap();

        assert_eq!(table.rows[0].cells.get("color"), Some(&"".to_string()));
        assert!(table.warnings.is_empty());
    }

    #[test]
    fn test_extra_cells_recorded_as_warning() {
        let file = csv_file("title,code\nIntro,CS101,stray,more\n");

        let table = CsvParser.parse(file.path()).unwrap();

        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.warnings.len(), 1);
        assert_eq!(table.warnings[0].row_number, 2);
        // 超出部分不进入单元格映射
        assert_eq!(table.rows[0].cells.len(), 2);
    }

    #[test]
    fn test_blank_rows_skipped_but_numbers_preserved() {
        let file = csv_file("title,code\nIntro,CS101\n,\nAlgebra,MATH201\n");

        let table = CsvParser.parse(file.path()).unwrap();

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].row_number, 2);
        // 第 3 行为空行被跳过，第二条数据仍指向第 4 行
        assert_eq!(table.rows[1].row_number, 4);
    }

    #[test]
    fn test_empty_file_is_empty_header_error() {
        let file = csv_file("");
        let err = CsvParser.parse(file.path()).unwrap_err();
        assert!(matches!(err, ImportError::EmptyHeader));
    }

    #[test]
    fn test_file_not_found() {
        let err = CsvParser.parse(Path::new("non_existent.csv")).unwrap_err();
        assert!(matches!(err, ImportError::FileNotFound(_)));
    }

    #[test]
    fn test_universal_parser_rejects_unknown_extension() {
        let err = UniversalFileParser.parse(Path::new("notes.txt")).unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFileType(_)));
    }
}
