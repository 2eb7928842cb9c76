use crate::error::StorageError;
use chrono::Local;
use indexmap::{IndexMap, IndexSet};
use pch_domain::{Cell, Table};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// On-disk table encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Tsv,
    /// Array of objects, one per row
    Json,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "tsv" => Some(Self::Tsv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    fn delimiter(self) -> Option<char> {
        match self {
            Self::Csv => Some(','),
            Self::Tsv => Some('\t'),
            Self::Json => None,
        }
    }
}

fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "xlsx" | "xls"))
}

/// `<prefix>_<YYYYMMDD_HHMMSS>.csv` in the current directory.
pub fn timestamped_output_path(prefix: &str) -> PathBuf {
    PathBuf::from(format!("{}_{}.csv", prefix, Local::now().format("%Y%m%d_%H%M%S")))
}

/// Read a table, choosing the format from the extension.
///
/// Files with an unrecognised extension are tried as JSON first and then as
/// comma-separated text.
pub fn read_table(path: &Path) -> Result<Table, StorageError> {
    let text = std::fs::read_to_string(path)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let table = match TableFormat::from_path(path) {
        Some(TableFormat::Json) => parse_json(text)?,
        Some(format) => parse_delimited(text, format.delimiter().unwrap_or(','))?,
        None if is_spreadsheet(path) => {
            return Err(StorageError::UnsupportedFormat(format!(
                "{} (save the sheet as .csv)",
                path.display()
            )));
        }
        None => match parse_json(text) {
            Ok(table) => table,
            Err(e) => {
                debug!("{} is not JSON ({}); reading as CSV", path.display(), e);
                parse_delimited(text, ',')?
            }
        },
    };

    info!(
        "Read {} rows x {} columns from {}",
        table.row_count(),
        table.column_count(),
        path.display()
    );
    Ok(table)
}

/// Write a table and return the path actually written.
///
/// Spreadsheet requests are written as CSV next to the requested path.
/// Unknown extensions are rejected.
pub fn write_table(table: &Table, path: &Path) -> Result<PathBuf, StorageError> {
    let (path, format) = if is_spreadsheet(path) {
        let fallback = path.with_extension("csv");
        warn!(
            "Spreadsheet output is not supported; writing {} instead",
            fallback.display()
        );
        (fallback, TableFormat::Csv)
    } else {
        let format = TableFormat::from_path(path)
            .ok_or_else(|| StorageError::UnsupportedFormat(path.display().to_string()))?;
        (path.to_path_buf(), format)
    };

    let data = match format.delimiter() {
        Some(delim) => to_delimited(table, delim),
        None => to_json(table)?,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, data)?;
    info!("Wrote {} rows to {}", table.row_count(), path.display());
    Ok(path)
}

/// Parse delimited text with a header row.
///
/// Fields may be double-quoted, with `""` for a literal quote and line
/// breaks allowed inside quotes. An empty unquoted field reads as null.
/// Short rows are padded with nulls; long rows are an error.
pub fn parse_delimited(text: &str, delim: char) -> Result<Table, StorageError> {
    let mut records = split_records(text, delim)?.into_iter();

    let Some((_, header)) = records.next() else {
        return Ok(Table::default());
    };
    let columns: Vec<String> = header
        .into_iter()
        .map(|c| c.unwrap_or_default().trim().to_string())
        .collect();
    let mut table = Table::new(columns);

    for (line, mut row) in records {
        if row.len() > table.column_count() {
            return Err(StorageError::Parse {
                line,
                message: format!(
                    "expected {} fields, saw {}",
                    table.column_count(),
                    row.len()
                ),
            });
        }
        row.resize(table.column_count(), None);
        table.push_row(row)?;
    }
    Ok(table)
}

/// Records with the 1-based line each one starts on. Blank lines are dropped.
fn split_records(text: &str, delim: char) -> Result<Vec<(usize, Vec<Cell>)>, StorageError> {
    let mut records = Vec::new();
    let mut record: Vec<Cell> = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = text.chars().peekable();

    let finish_field = |field: &mut String, quoted: &mut bool, record: &mut Vec<Cell>| {
        let value = std::mem::take(field);
        record.push(if value.is_empty() && !*quoted { None } else { Some(value) });
        *quoted = false;
    };

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() && !quoted => {
                in_quotes = true;
                quoted = true;
            }
            c if c == delim => finish_field(&mut field, &mut quoted, &mut record),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                finish_field(&mut field, &mut quoted, &mut record);
                let done = std::mem::take(&mut record);
                if !(done.len() == 1 && done[0].is_none()) {
                    records.push((record_line, done));
                }
                line += 1;
                record_line = line;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(StorageError::Parse {
            line: record_line,
            message: "unterminated quoted field".to_string(),
        });
    }
    if !field.is_empty() || quoted || !record.is_empty() {
        finish_field(&mut field, &mut quoted, &mut record);
        records.push((record_line, record));
    }
    Ok(records)
}

pub fn to_delimited(table: &Table, delim: char) -> String {
    let mut out = String::new();
    push_record(&mut out, table.columns().iter().map(String::as_str), delim);
    for row in table.rows() {
        push_record(&mut out, row.iter().map(|c| c.as_deref().unwrap_or("")), delim);
    }
    out
}

fn push_record<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>, delim: char) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(delim);
        }
        if field.contains(delim) || field.contains(['"', '\n', '\r']) {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out.push('\n');
}

/// Parse a JSON array of flat objects. Columns appear in first-seen order.
pub fn parse_json(text: &str) -> Result<Table, StorageError> {
    let objects: Vec<IndexMap<String, Value>> = serde_json::from_str(text)?;

    let columns: IndexSet<&str> = objects
        .iter()
        .flat_map(|object| object.keys().map(String::as_str))
        .collect();

    let mut table = Table::new(columns.iter().copied());
    for object in &objects {
        let row = columns
            .iter()
            .map(|key| match object.get(*key) {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(other) => Some(other.to_string()),
            })
            .collect();
        table.push_row(row)?;
    }
    Ok(table)
}

pub fn to_json(table: &Table) -> Result<String, StorageError> {
    let objects: Vec<IndexMap<&str, Option<&str>>> = table
        .rows()
        .iter()
        .map(|row| {
            table
                .columns()
                .iter()
                .map(String::as_str)
                .zip(row.iter().map(|c| c.as_deref()))
                .collect()
        })
        .collect();
    serde_json::to_string_pretty(&objects).map_err(|e| StorageError::Serialize(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(TableFormat::from_path(Path::new("a.CSV")), Some(TableFormat::Csv));
        assert_eq!(TableFormat::from_path(Path::new("a.tsv")), Some(TableFormat::Tsv));
        assert_eq!(TableFormat::from_path(Path::new("a.json")), Some(TableFormat::Json));
        assert_eq!(TableFormat::from_path(Path::new("a.xlsx")), None);
        assert_eq!(TableFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_parse_quoted_fields() {
        let text = "id,prompt\n1,\"hello, world\"\n2,\"say \"\"hi\"\"\"\n3,\"two\nlines\"\n";
        let table = parse_delimited(text, ',').unwrap();
        assert_eq!(table.columns(), &["id".to_string(), "prompt".to_string()]);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.get(0, 1), Some("hello, world"));
        assert_eq!(table.get(1, 1), Some("say \"hi\""));
        assert_eq!(table.get(2, 1), Some("two\nlines"));
    }

    #[test]
    fn test_empty_fields_and_short_rows() {
        let table = parse_delimited("a,b,c\r\n1,,\"\"\r\n2\r\n\r\n", ',').unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.get(0, 1), None);
        assert_eq!(table.get(0, 2), Some(""));
        assert_eq!(table.get(1, 0), Some("2"));
        assert_eq!(table.get(1, 2), None);
    }

    #[test]
    fn test_long_row_is_an_error() {
        let err = parse_delimited("a\n1\n2,3\n", ',').unwrap_err();
        assert!(matches!(err, StorageError::Parse { line: 3, .. }));
    }

    #[test]
    fn test_unterminated_quote() {
        let err = parse_delimited("a\n\"open\n", ',').unwrap_err();
        assert!(err.to_string().contains("unterminated"));
    }

    #[test]
    fn test_writer_quotes_only_when_needed() {
        let mut table = Table::new(["prompt", "out"]);
        table
            .push_row(vec![Some("a,b".into()), Some("plain".into())])
            .unwrap();
        table.push_row(vec![Some("q\"".into()), None]).unwrap();
        assert_eq!(
            to_delimited(&table, ','),
            "prompt,out\n\"a,b\",plain\n\"q\"\"\",\n"
        );
        assert_eq!(to_delimited(&table, '\t'), "prompt\tout\na,b\tplain\n\"q\"\"\"\t\n");
    }

    #[test]
    fn test_json_keeps_column_order_and_nulls() {
        let table = parse_json(r#"[{"prompt": "hi", "id": 1}, {"prompt": null, "extra": true}]"#).unwrap();
        assert_eq!(
            table.columns(),
            &["prompt".to_string(), "id".to_string(), "extra".to_string()]
        );
        assert_eq!(table.get(0, 1), Some("1"));
        assert_eq!(table.get(1, 0), None);
        assert_eq!(table.get(1, 2), Some("true"));

        let json = to_json(&table).unwrap();
        assert!(json.find("\"prompt\"").unwrap() < json.find("\"id\"").unwrap());
        assert!(json.contains("null"));
    }

    #[test]
    fn test_timestamped_output_path() {
        let path = timestamped_output_path("enriched_prompts");
        let name = path.to_str().unwrap();
        assert!(name.starts_with("enriched_prompts_"));
        assert!(name.ends_with(".csv"));
        // prefix + '_' + YYYYMMDD_HHMMSS + ".csv"
        assert_eq!(name.len(), "enriched_prompts_".len() + 15 + 4);
    }
}
