//! CSV reader with encoding and delimiter auto-detection.
//!
//! Produces a [`WideTable`] with typed cells; no reshape logic here.

use std::path::Path;

use crate::error::{ParseError, ParseResult};
use crate::models::{CellValue, WideTable};

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParsedCsv {
    /// Parsed rows
    pub table: WideTable,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.to_string()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.to_string(),
        // UTF-8, ASCII and anything unknown: lossy UTF-8
        _ => {
            let text = String::from_utf8_lossy(bytes).to_string();
            text.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(text)
        }
    }
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [';', ',', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV text with an explicit delimiter.
///
/// The first record is the header row. Blank lines are skipped; short rows
/// are padded with empty cells and extra cells are ignored.
///
/// # Example
/// ```ignore
/// use panelshape::parser::parse_str;
///
/// let table = parse_str("name;Revenue 2020\nAcme;100", ';').unwrap();
///
/// assert_eq!(table.len(), 1);
/// assert_eq!(table.columns(), &["name", "Revenue 2020"]);
/// ```
pub fn parse_str(content: &str, delimiter: char) -> ParseResult<WideTable> {
    if content.trim().is_empty() {
        return Err(ParseError::EmptyFile);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ParseError::Malformed {
            line: 1,
            message: e.to_string(),
        })?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(ParseError::NoHeaders);
    }

    let mut table = WideTable::new(headers);

    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| ParseError::Malformed {
            line: e.position().map(|p| p.line() as usize).unwrap_or(idx + 2),
            message: e.to_string(),
        })?;

        if record.iter().all(|v| v.trim().is_empty()) {
            continue;
        }

        table.push_row(record.iter().map(CellValue::infer).collect());
    }

    Ok(table)
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> ParseResult<ParsedCsv> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);
    let table = parse_str(&content, delimiter)?;

    Ok(ParsedCsv {
        table,
        encoding,
        delimiter,
    })
}

/// Parse a CSV file with auto-detection of encoding and delimiter.
pub fn parse_csv_file_auto<P: AsRef<Path>>(path: P) -> ParseResult<ParsedCsv> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_bytes_auto(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_csv() {
        let table = parse_str("name;Revenue 2020\nAcme;100\nBeta;25", ';').unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, "name"), Some(&CellValue::from("Acme")));
        assert_eq!(table.cell(0, "Revenue 2020"), Some(&CellValue::Number(100.0)));
        assert_eq!(table.cell(1, "name"), Some(&CellValue::from("Beta")));
    }

    #[test]
    fn test_quoted_values() {
        let csv = "name,Revenue 2020/2021\n\"Acme, Inc.\",\"1.5\"";
        let table = parse_str(csv, ',').unwrap();

        assert_eq!(table.cell(0, "name"), Some(&CellValue::from("Acme, Inc.")));
        assert_eq!(table.cell(0, "Revenue 2020/2021"), Some(&CellValue::Number(1.5)));
    }

    #[test]
    fn test_empty_lines_skipped() {
        let table = parse_str("a;b\n1;2\n;\n3;4\n", ';').unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_missing_values() {
        let table = parse_str("a;b;c\n1;;3\n4", ';').unwrap();

        assert_eq!(table.cell(0, "b"), Some(&CellValue::Empty));
        assert_eq!(table.cell(1, "c"), Some(&CellValue::Empty));
    }

    #[test]
    fn test_extra_columns_ignored() {
        let table = parse_str("a;b\n1;2;3;4", ';').unwrap();
        assert_eq!(table.rows()[0].len(), 2);
    }

    #[test]
    fn test_headers_kept_as_read() {
        let table = parse_str("Name;Revenue 2020 \nAcme;1\n", ';').unwrap();
        assert_eq!(table.columns(), &["Name", "Revenue 2020 "]);
    }

    #[test]
    fn test_leading_zero_ids_stay_text() {
        let table = parse_str("ID;Revenue 2020\n00123;1\n123;2\n", ';').unwrap();
        assert_eq!(table.cell(0, "ID"), Some(&CellValue::from("00123")));
        assert_eq!(table.cell(1, "ID"), Some(&CellValue::Number(123.0)));
    }

    #[test]
    fn test_duplicate_headers_made_unique() {
        let table = parse_str("Name;Revenue 2020;Revenue 2020\nAcme;1;2", ';').unwrap();
        assert_eq!(table.columns(), &["Name", "Revenue 2020", "Revenue 2020.1"]);
    }

    #[test]
    fn test_empty_csv_error() {
        let result = parse_str("", ';');
        assert!(matches!(result, Err(ParseError::EmptyFile)));
    }

    #[test]
    fn test_detect_delimiter_semicolon() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
    }

    #[test]
    fn test_detect_delimiter_comma() {
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
    }

    #[test]
    fn test_detect_delimiter_tab() {
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
    }

    #[test]
    fn test_auto_parse() {
        let csv = "name;Employees 2019\nAcme;30\nBeta;25";
        let result = parse_bytes_auto(csv.as_bytes()).unwrap();

        assert_eq!(result.delimiter, ';');
        assert_eq!(result.table.len(), 2);
        assert_eq!(result.table.columns(), &["name", "Employees 2019"]);
    }

    #[test]
    fn test_utf8_bom_stripped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"name,Revenue 2020\nAcme,1");
        let result = parse_bytes_auto(&bytes).unwrap();

        assert_eq!(result.table.columns()[0], "name");
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");
        std::fs::write(&path, "Name,Revenue 2020\nAcme,100\n").unwrap();

        let parsed = parse_csv_file_auto(&path).unwrap();
        assert_eq!(parsed.delimiter, ',');
        assert_eq!(parsed.table.len(), 1);
    }
}
