//! Append-only record of generated documents

use chrono::NaiveDateTime;
use serde_json::{Map, Value};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const LOG_DIR: &str = "logs";
pub const LOG_FILE: &str = "submission_log.txt";

/// `[2024-01-15 09:30:00] Generated file: <pdf>, data: {...}`
pub fn format_entry(timestamp: NaiveDateTime, pdf: &Path, data: &Map<String, Value>) -> String {
    format!(
        "[{}] Generated file: {}, data: {}\n",
        timestamp.format("%Y-%m-%d %H:%M:%S"),
        pdf.display(),
        Value::Object(data.clone())
    )
}

#[derive(Debug, Clone)]
pub struct SubmissionLog {
    path: PathBuf,
}

impl SubmissionLog {
    /// Log file `logs/submission_log.txt` under `base_dir`
    pub fn in_dir(base_dir: &Path) -> Self {
        Self {
            path: base_dir.join(LOG_DIR).join(LOG_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(
        &self,
        timestamp: NaiveDateTime,
        pdf: &Path,
        data: &Map<String, Value>,
    ) -> std::io::Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(format_entry(timestamp, pdf, data).as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .and_then(|d| d.and_hms_opt(h, m, s))
            .unwrap()
    }

    #[test]
    fn test_format_entry() {
        let mut data = Map::new();
        data.insert("template_type".into(), "Invoice_AD_Template.docx".into());
        data.insert("invoice_no".into(), "发票-1".into());

        assert_eq!(
            format_entry(at(9, 30, 0), Path::new("output/x.pdf"), &data),
            "[2024-01-15 09:30:00] Generated file: output/x.pdf, data: {\"template_type\":\"Invoice_AD_Template.docx\",\"invoice_no\":\"发票-1\"}\n"
        );
    }

    #[test]
    fn test_append_keeps_previous_entries() {
        let dir = tempfile::tempdir().unwrap();
        let log = SubmissionLog::in_dir(dir.path());

        log.append(at(9, 0, 0), Path::new("a.pdf"), &Map::new())
            .unwrap();
        log.append(at(10, 0, 0), Path::new("b.pdf"), &Map::new())
            .unwrap();

        let text = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "[2024-01-15 09:00:00] Generated file: a.pdf, data: {}",
                "[2024-01-15 10:00:00] Generated file: b.pdf, data: {}",
            ]
        );
    }
}
