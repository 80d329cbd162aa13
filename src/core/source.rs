use crate::domain::model::Record;
use crate::utils::error::{CheckError, FileErrorKind, Result};
use std::io::Read;
use std::path::Path;

pub const TABLE_EXTENSION: &str = "csv";
pub const FIELD_DELIMITER: u8 = b';';
const EXPECTED_COLUMNS: [&str; 2] = ["host", "ports"];
const MISSING_MARKERS: [&str; 6] = ["", "nan", "NaN", "null", "NULL", "None"];

/// 來源表格中依行號排序的項目
#[derive(Debug)]
pub enum SourceEntry {
    Record(Record),
    /// 該列驗證失敗 (DataInvalidFormat)
    Invalid(CheckError),
}

#[derive(Debug, Default)]
pub struct SourceTable {
    entries: Vec<SourceEntry>,
}

impl SourceTable {
    /// 讀取並驗證 `Host;Ports` 表格。檔案層級的錯誤直接回傳，
    /// 列層級的錯誤保留在表格內，不中斷其餘列的讀取。
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let shown = path.display().to_string();

        if !path.is_file() {
            return Err(CheckError::file(
                FileErrorKind::FileMissing,
                format!("file {} not found", shown),
            ));
        }

        if !has_table_extension(path) {
            return Err(CheckError::file(
                FileErrorKind::WrongExtension,
                format!("file {} must be .{}", shown, TABLE_EXTENSION),
            ));
        }

        let file = std::fs::File::open(path)?;
        let table = Self::from_reader(file)?;
        tracing::debug!(
            "Loaded {} records ({} invalid rows) from {}",
            table.records().count(),
            table.row_errors().count(),
            shown
        );
        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(FIELD_DELIMITER)
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.to_lowercase())
            .collect();
        if headers != EXPECTED_COLUMNS {
            return Err(CheckError::file(
                FileErrorKind::SchemaError,
                "the table should have columns \"Host\" and \"Ports\"",
            ));
        }

        let mut entries = Vec::new();
        for (index, row) in reader.records().enumerate() {
            let row = row?;
            let line = row
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(index + 2);

            let host = normalize_field(row.get(0));
            let ports = match normalize_field(row.get(1)) {
                None => None,
                Some(raw) => match parse_ports(&raw) {
                    Some(ports) => Some(ports),
                    None => {
                        tracing::debug!("Dropping line {}: invalid ports '{}'", line, raw);
                        entries.push(SourceEntry::Invalid(CheckError::data(
                            line,
                            format!("all ports must be int ({})", raw),
                        )));
                        continue;
                    }
                },
            };

            // 缺少主機仍保留該筆記錄，讓後續階段以同一種錯誤處理
            if host.is_none() {
                entries.push(SourceEntry::Invalid(CheckError::data(
                    line,
                    "host must be not None",
                )));
            }
            entries.push(SourceEntry::Record(Record::new(line, host, ports)));
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[SourceEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<SourceEntry> {
        self.entries
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.entries.iter().filter_map(|entry| match entry {
            SourceEntry::Record(record) => Some(record),
            SourceEntry::Invalid(_) => None,
        })
    }

    pub fn row_errors(&self) -> impl Iterator<Item = &CheckError> {
        self.entries.iter().filter_map(|entry| match entry {
            SourceEntry::Invalid(err) => Some(err),
            SourceEntry::Record(_) => None,
        })
    }

    /// 單一狀態欄位：只回報最後一個列錯誤
    pub fn status(&self) -> Option<&CheckError> {
        self.row_errors().last()
    }

    /// 取出最後一個列錯誤，其餘項目一併捨棄
    pub fn into_status(self) -> Option<CheckError> {
        self.entries.into_iter().rev().find_map(|entry| match entry {
            SourceEntry::Invalid(err) => Some(err),
            SourceEntry::Record(_) => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 副檔名需完全相符，`hosts.CSV` 不接受
fn has_table_extension(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(TABLE_EXTENSION)
}

fn normalize_field(value: Option<&str>) -> Option<String> {
    match value {
        Some(v) if !MISSING_MARKERS.contains(&v) => Some(v.to_string()),
        _ => None,
    }
}

/// 逗號分隔的埠號清單；任何非數字或超出範圍的項目都使整列無效
pub fn parse_ports(raw: &str) -> Option<Vec<u16>> {
    raw.split(',')
        .map(|token| {
            if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            token.parse::<u16>().ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn table(content: &str) -> SourceTable {
        SourceTable::from_reader(content.as_bytes()).unwrap()
    }

    fn csv_file(content: &str) -> NamedTempFile {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_ports_keeps_order() {
        assert_eq!(parse_ports("80,443"), Some(vec![80, 443]));
        assert_eq!(parse_ports("8080"), Some(vec![8080]));
        assert_eq!(parse_ports("443,80,443"), Some(vec![443, 80, 443]));
    }

    #[test]
    fn test_parse_ports_rejects_non_digits() {
        assert_eq!(parse_ports("80,abc"), None);
        assert_eq!(parse_ports("80,"), None);
        assert_eq!(parse_ports(" 80"), None);
        assert_eq!(parse_ports("-1"), None);
        assert_eq!(parse_ports("70000"), None);
    }

    #[test]
    fn test_missing_ports_are_none() {
        let table = table("Host;Ports\na.example;\nb.example;nan\nc.example\n");
        let records: Vec<&Record> = table.records().collect();

        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.ports.is_none()));
        assert_eq!(records[0].host.as_deref(), Some("a.example"));
        assert!(table.status().is_none());
    }

    #[test]
    fn test_bad_ports_row_is_dropped() {
        let table = table("Host;Ports\na.example;80,abc\nb.example;443\n");

        let records: Vec<&Record> = table.records().collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].host.as_deref(), Some("b.example"));
        assert_eq!(records[0].ports, Some(vec![443]));

        let errors: Vec<&CheckError> = table.row_errors().collect();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            CheckError::DataInvalidFormat { line: 2, message } if message == "all ports must be int (80,abc)"
        ));
    }

    #[test]
    fn test_missing_host_keeps_record_and_flags_row() {
        let table = table("Host;Ports\n;80\n");

        assert_eq!(table.row_errors().count(), 1);
        let records: Vec<&Record> = table.records().collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].host, None);
        assert_eq!(records[0].ports, Some(vec![80]));
        assert!(matches!(table.entries()[0], SourceEntry::Invalid(_)));
    }

    #[test]
    fn test_status_reports_last_row_error() {
        let table = table("Host;Ports\n;80\nb.example;x\nc.example;22\n");

        assert_eq!(table.row_errors().count(), 2);
        assert!(matches!(
            table.status(),
            Some(CheckError::DataInvalidFormat { line: 3, .. })
        ));
    }

    #[test]
    fn test_into_status_keeps_last_row_error() {
        let invalid = table("Host;Ports\na.example;80,x\n;443\nb.example;\n");
        match invalid.into_status() {
            Some(CheckError::DataInvalidFormat { line, message }) => {
                assert_eq!(line, 3);
                assert_eq!(message, "host must be not None");
            }
            other => panic!("unexpected status {:?}", other),
        }
        assert!(table("Host;Ports\na.example;80\n").into_status().is_none());
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let table = table("HOST;ports\nexample.com;80,443\n");
        assert_eq!(table.records().count(), 1);
    }

    #[test]
    fn test_wrong_schema_is_fatal() {
        let err = SourceTable::from_reader("X;Y\nexample.com;80\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            CheckError::FileInvalidFormat { kind: FileErrorKind::SchemaError, .. }
        ));

        let err = SourceTable::from_reader("Ports;Host\n80;example.com\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            CheckError::FileInvalidFormat { kind: FileErrorKind::SchemaError, .. }
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SourceTable::load(dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(
            err,
            CheckError::FileInvalidFormat { kind: FileErrorKind::FileMissing, .. }
        ));
    }

    #[test]
    fn test_load_wrong_extension() {
        let mut file = Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(b"Host;Ports\nexample.com;80\n").unwrap();

        let err = SourceTable::load(file.path()).unwrap_err();
        assert!(matches!(
            err,
            CheckError::FileInvalidFormat { kind: FileErrorKind::WrongExtension, .. }
        ));
    }

    #[test]
    fn test_table_extension_is_exact() {
        assert!(has_table_extension(Path::new("hosts.csv")));
        assert!(has_table_extension(Path::new("dir.v2/hosts.csv")));
        assert!(!has_table_extension(Path::new("hosts.CSV")));
        assert!(!has_table_extension(Path::new("hosts")));
        assert!(!has_table_extension(Path::new("hosts.csv.bak")));
    }

    #[test]
    fn test_load_csv_file() {
        let file = csv_file("Host;Ports\nexample.com;80,443\n127.0.0.1;\n");
        let table = SourceTable::load(file.path()).unwrap();

        let records: Vec<&Record> = table.records().collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].line, 2);
        assert_eq!(records[0].ports, Some(vec![80, 443]));
        assert_eq!(records[1].host.as_deref(), Some("127.0.0.1"));
        assert_eq!(records[1].ports, None);
    }
}
