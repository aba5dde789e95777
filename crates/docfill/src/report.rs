//! Rendering of scan and replace results.
//!
//! - `table`: aligned columns for humans
//! - `json`: the pretty-printed result object
//! - `csv`: one row per location (scan) or per file (replace), RFC 4180 quoted

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::path::Path;

use docfill_config::OutputFormat;
use docfill_core::{ReplaceResult, ScanResult};

use crate::error::CliError;

const SCAN_CSV_HEADER: [&str; 8] = [
    "name",
    "kind",
    "pattern",
    "file_name",
    "file_path",
    "section",
    "occurrences",
    "context",
];

const REPLACE_CSV_HEADER: [&str; 7] = [
    "file_path",
    "success",
    "replacements",
    "backup_path",
    "output_path",
    "error",
    "backup_error",
];

/// Render a scan result.
pub(crate) fn scan_report(result: &ScanResult, format: OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Json => json(result),
        OutputFormat::Csv => {
            let rows = result.placeholders.iter().flat_map(|placeholder| {
                placeholder.locations.iter().map(move |location| {
                    vec![
                        placeholder.name.clone(),
                        placeholder.kind.to_string(),
                        placeholder.pattern.clone(),
                        location.file_name.clone(),
                        display(&location.file_path),
                        location.section.clone(),
                        location.occurrences.to_string(),
                        location.context.clone(),
                    ]
                })
            });
            Ok(csv(&SCAN_CSV_HEADER, rows))
        }
        OutputFormat::Table => {
            if result.placeholders.is_empty() {
                return Ok("No placeholders found.\n".to_owned());
            }
            let rows: Vec<Vec<String>> = result
                .placeholders
                .iter()
                .map(|placeholder| {
                    let files: BTreeSet<&Path> = placeholder
                        .locations
                        .iter()
                        .map(|l| l.file_path.as_path())
                        .collect();
                    let sections: BTreeSet<&str> = placeholder
                        .locations
                        .iter()
                        .map(|l| l.section.as_str())
                        .collect();
                    vec![
                        placeholder.name.clone(),
                        placeholder.kind.to_string(),
                        placeholder.total_occurrences.to_string(),
                        files.len().to_string(),
                        sections.into_iter().collect::<Vec<_>>().join(", "),
                    ]
                })
                .collect();
            Ok(table(
                &["NAME", "KIND", "OCCURRENCES", "FILES", "SECTIONS"],
                &rows,
            ))
        }
    }
}

/// Render a replace result.
pub(crate) fn replace_report(
    result: &ReplaceResult,
    format: OutputFormat,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Json => json(result),
        OutputFormat::Csv => {
            let rows = result.files.iter().map(|file| {
                vec![
                    display(&file.file_path),
                    file.success.to_string(),
                    file.replacements.to_string(),
                    file.backup_path.as_deref().map(display).unwrap_or_default(),
                    file.output_path.as_deref().map(display).unwrap_or_default(),
                    file.error
                        .as_ref()
                        .map(|e| e.message.clone())
                        .unwrap_or_default(),
                    file.backup_error.clone().unwrap_or_default(),
                ]
            });
            Ok(csv(&REPLACE_CSV_HEADER, rows))
        }
        OutputFormat::Table => {
            if result.files.is_empty() {
                return Ok("No documents processed.\n".to_owned());
            }
            let rows: Vec<Vec<String>> = result
                .files
                .iter()
                .map(|file| {
                    let status = if file.success { "ok" } else { "failed" };
                    let target = file
                        .output_path
                        .as_deref()
                        .map_or_else(|| "-".to_owned(), display);
                    let note = match (&file.error, &file.backup_error) {
                        (Some(error), _) => error.message.clone(),
                        (None, Some(backup_error)) => format!("backup: {backup_error}"),
                        (None, None) => String::new(),
                    };
                    vec![
                        display(&file.file_path),
                        status.to_owned(),
                        file.replacements.to_string(),
                        target,
                        note,
                    ]
                })
                .collect();
            Ok(table(
                &["FILE", "STATUS", "REPLACEMENTS", "OUTPUT", "NOTE"],
                &rows,
            ))
        }
    }
}

fn json<T: serde::Serialize>(value: &T) -> Result<String, CliError> {
    let mut rendered = serde_json::to_string_pretty(value)?;
    rendered.push('\n');
    Ok(rendered)
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

/// Left-aligned columns separated by two spaces. Trailing padding is trimmed.
fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header: Vec<String> = headers.iter().map(|h| (*h).to_owned()).collect();
    for row in std::iter::once(&header).chain(rows) {
        let mut line = String::new();
        for (i, (cell, width)) in row.iter().zip(&widths).enumerate() {
            if i > 0 {
                line.push_str("  ");
            }
            line.push_str(cell);
            let padding = width.saturating_sub(cell.chars().count());
            line.extend(std::iter::repeat_n(' ', padding));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn csv<I>(header: &[&str], rows: I) -> String
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut out = String::new();
    push_csv_record(&mut out, header.iter().copied());
    for row in rows {
        push_csv_record(&mut out, row.iter().map(String::as_str));
    }
    out
}

fn push_csv_record<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&csv_field(field));
    }
    out.push_str("\r\n");
}

fn csv_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use docfill_core::{
        BatchStatus, FileReplaceResult, Placeholder, PlaceholderKind, PlaceholderLocation,
    };
    use pretty_assertions::assert_eq;

    use super::*;

    fn location(file: &str, section: &str, occurrences: usize, context: &str) -> PlaceholderLocation {
        PlaceholderLocation {
            file_name: file.to_owned(),
            file_path: PathBuf::from(format!("/docs/{file}")),
            occurrences,
            context: context.to_owned(),
            section: section.to_owned(),
        }
    }

    fn scan_result() -> ScanResult {
        let placeholders = vec![
            Placeholder {
                name: "client_name".to_owned(),
                kind: PlaceholderKind::Text,
                pattern: r"\{\{([^}]+)\}\}".to_owned(),
                locations: vec![
                    location("a.docx", "Body", 2, "Dear {{client_name}}, welcome"),
                    location("a.docx", "Header0", 1, "{{client_name}}"),
                    location("b.docx", "Body", 1, "To: {{client_name}}"),
                ],
                total_occurrences: 4,
            },
            Placeholder {
                name: "logo".to_owned(),
                kind: PlaceholderKind::Image,
                pattern: r"\{\{([^}]+)\}\}".to_owned(),
                locations: vec![location("a.docx", "Body (Table)", 1, "say \"hi\"")],
                total_occurrences: 1,
            },
        ];
        ScanResult {
            status: BatchStatus::Succeeded,
            total_files: 2,
            scanned_files: 2,
            failed_files: 0,
            total_placeholders: placeholders.len(),
            total_occurrences: 5,
            placeholders,
            errors: Vec::new(),
            duration: Duration::from_millis(12),
        }
    }

    fn replace_result() -> ReplaceResult {
        ReplaceResult {
            status: BatchStatus::Succeeded,
            files: vec![
                FileReplaceResult {
                    file_path: PathBuf::from("/docs/a.docx"),
                    success: true,
                    replacements: 3,
                    backup_path: Some(PathBuf::from("/docs/a.20260101-120000.bak.docx")),
                    output_path: Some(PathBuf::from("/docs/a.docx")),
                    error: None,
                    backup_error: None,
                    unreplaced: Vec::new(),
                },
                FileReplaceResult {
                    file_path: PathBuf::from("/docs/b.docx"),
                    success: true,
                    replacements: 0,
                    backup_path: None,
                    output_path: None,
                    error: None,
                    backup_error: Some("disk full".to_owned()),
                    unreplaced: Vec::new(),
                },
            ],
            total_files: 2,
            successful_files: 2,
            failed_files: 0,
            total_replacements: 3,
            unused_mappings: vec!["unused".to_owned()],
            dry_run: false,
            duration: Duration::from_millis(40),
        }
    }

    #[test]
    fn test_scan_table() {
        let report = scan_report(&scan_result(), OutputFormat::Table).unwrap();
        assert_eq!(
            report,
            concat!(
                "NAME         KIND   OCCURRENCES  FILES  SECTIONS\n",
                "client_name  text   4            2      Body, Header0\n",
                "logo         image  1            1      Body (Table)\n",
            )
        );
    }

    #[test]
    fn test_scan_table_empty() {
        let mut result = scan_result();
        result.placeholders.clear();
        let report = scan_report(&result, OutputFormat::Table).unwrap();
        assert_eq!(report, "No placeholders found.\n");
    }

    #[test]
    fn test_scan_csv_quotes_fields() {
        let report = scan_report(&scan_result(), OutputFormat::Csv).unwrap();
        let lines: Vec<&str> = report.split("\r\n").collect();

        assert_eq!(
            lines[0],
            "name,kind,pattern,file_name,file_path,section,occurrences,context"
        );
        assert_eq!(
            lines[1],
            r#"client_name,text,\{\{([^}]+)\}\},a.docx,/docs/a.docx,Body,2,"Dear {{client_name}}, welcome""#
        );
        assert_eq!(
            lines[4],
            r#"logo,image,\{\{([^}]+)\}\},a.docx,/docs/a.docx,Body (Table),1,"say ""hi""""#
        );
        // Header, four locations, and the empty string after the final CRLF
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn test_scan_json() {
        let report = scan_report(&scan_result(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&report).unwrap();

        assert_eq!(value["status"], "succeeded");
        assert_eq!(value["total_occurrences"], 5);
        assert_eq!(value["duration_ms"], 12);
        assert_eq!(value["placeholders"][1]["kind"], "image");
        assert_eq!(value["placeholders"][0]["locations"][1]["section"], "Header0");
    }

    #[test]
    fn test_replace_table() {
        let report = replace_report(&replace_result(), OutputFormat::Table).unwrap();
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("FILE          STATUS  REPLACEMENTS  OUTPUT"));
        assert!(lines[1].starts_with("/docs/a.docx  ok      3             /docs/a.docx"));
        assert!(lines[2].ends_with("-             backup: disk full"));
    }

    #[test]
    fn test_replace_csv() {
        let report = replace_report(&replace_result(), OutputFormat::Csv).unwrap();
        assert_eq!(
            report,
            concat!(
                "file_path,success,replacements,backup_path,output_path,error,backup_error\r\n",
                "/docs/a.docx,true,3,/docs/a.20260101-120000.bak.docx,/docs/a.docx,,\r\n",
                "/docs/b.docx,true,0,,,,disk full\r\n",
            )
        );
    }

    #[test]
    fn test_replace_json() {
        let report = replace_report(&replace_result(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&report).unwrap();

        assert_eq!(value["total_replacements"], 3);
        assert_eq!(value["unused_mappings"][0], "unused");
        assert_eq!(value["files"][1]["backup_error"], "disk full");
    }

    #[test]
    fn test_csv_field() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("line\nbreak"), "\"line\nbreak\"");
        assert_eq!(csv_field(r#"say "x""#), r#""say ""x""""#);
    }
}
