mod cli;
mod html;
mod json;

pub use cli::{print_cli_table, TerminalObserver};
pub use html::print_html;
pub use json::print_json;

use crate::model::{Detection, ScanReport};
use anyhow::Result;

/// Label shown for detections that have no metadata record.
pub const NOT_IN_DATASET: &str = "Not in dataset";

/// Placeholder for missing metadata fields.
pub const UNKNOWN: &str = "Unknown";

/// Output format for scan results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format
    Table,
    /// JSON format for programmatic use
    Json,
    /// HTML report format
    Html,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "html" => Ok(OutputFormat::Html),
            _ => Err(format!(
                "Unknown format: {}. Use 'table', 'json', or 'html'",
                s
            )),
        }
    }
}

/// One rendered result row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionRow {
    pub id: String,
    pub name: String,
    pub store_url: Option<String>,
    pub category: String,
    pub overview: String,
}

impl From<&Detection> for DetectionRow {
    fn from(detection: &Detection) -> Self {
        let id = detection.candidate.id.clone();
        let metadata = detection.metadata.as_ref();
        let display_name = metadata.and_then(|m| m.display_name.clone());

        Self {
            store_url: display_name.as_ref().map(|_| store_url(&id)),
            name: display_name.unwrap_or_else(|| NOT_IN_DATASET.to_string()),
            category: metadata
                .and_then(|m| m.category.clone())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| UNKNOWN.to_string()),
            overview: metadata
                .and_then(|m| m.overview.clone())
                .filter(|o| !o.is_empty())
                .unwrap_or_else(|| UNKNOWN.to_string()),
            id,
        }
    }
}

pub fn store_url(id: &str) -> String {
    format!("https://chromewebstore.google.com/detail/{}", id)
}

pub fn print_report(report: &ScanReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => print_cli_table(report),
        OutputFormat::Json => print_json(report),
        OutputFormat::Html => print_html(report),
    }
}

/// Format report to string for file output.
///
/// The table layout only exists on the terminal, so `Table` is written as JSON.
pub fn format_report_to_string(report: &ScanReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Html => Ok(html::generate_html_string(report)),
        OutputFormat::Table => Ok(serde_json::to_string_pretty(report)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Candidate, MetadataRecord};

    #[test]
    fn test_row_for_unlisted_detection() {
        let detection = Detection {
            candidate: Candidate::new("abc", "icon.png"),
            metadata: None,
        };
        let row = DetectionRow::from(&detection);

        assert_eq!(row.name, NOT_IN_DATASET);
        assert_eq!(row.category, UNKNOWN);
        assert_eq!(row.overview, UNKNOWN);
        assert!(row.store_url.is_none());
    }

    #[test]
    fn test_row_for_listed_detection() {
        let detection = Detection {
            candidate: Candidate::new("abc", "icon.png"),
            metadata: Some(MetadataRecord {
                display_name: Some("Alpha".to_string()),
                category: Some(String::new()),
                overview: Some("An extension".to_string()),
            }),
        };
        let row = DetectionRow::from(&detection);

        assert_eq!(row.name, "Alpha");
        assert_eq!(row.category, UNKNOWN);
        assert_eq!(row.overview, "An extension");
        assert_eq!(
            row.store_url.as_deref(),
            Some("https://chromewebstore.google.com/detail/abc")
        );
    }

    #[test]
    fn test_table_file_output_is_json() {
        let report = ScanReport {
            scan_time: chrono::Utc::now(),
            duration: std::time::Duration::from_millis(10),
            summary: crate::model::ProgressUpdate {
                scanned: 1,
                detected: 1,
                total: 1,
            },
            detections: vec![Detection {
                candidate: Candidate::new("abc", "icon.png"),
                metadata: None,
            }],
        };

        let text = format_report_to_string(&report, OutputFormat::Table).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["detections"][0]["candidate"]["id"], "abc");
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("html".parse::<OutputFormat>(), Ok(OutputFormat::Html));
        assert!("sarif".parse::<OutputFormat>().is_err());
    }
}
