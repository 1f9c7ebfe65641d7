//! HTML report output format.
//!
//! Generates a self-contained HTML report with styling for easy viewing and sharing.

use super::DetectionRow;
use crate::model::ScanReport;
use anyhow::Result;

/// Generate and print HTML report output
pub fn print_html(report: &ScanReport) -> Result<()> {
    let html = generate_html_string(report);
    println!("{}", html);
    Ok(())
}

/// Generate HTML as a string (for file output)
pub fn generate_html_string(report: &ScanReport) -> String {
    let summary = &report.summary;
    let mut html = String::new();

    html.push_str(&format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>extprobe Report - {}</title>
    <style>
        :root {{
            --bg-color: #1a1a2e;
            --card-bg: #16213e;
            --text-color: #eee;
            --text-muted: #888;
            --border-color: #0f3460;
            --detected: #28a745;
            --accent: #0f3460;
        }}
        * {{ box-sizing: border-box; margin: 0; padding: 0; }}
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: var(--bg-color);
            color: var(--text-color);
            line-height: 1.6;
            padding: 2rem;
        }}
        .container {{ max-width: 1200px; margin: 0 auto; }}
        header {{
            display: flex;
            justify-content: space-between;
            align-items: center;
            margin-bottom: 2rem;
            padding-bottom: 1rem;
            border-bottom: 1px solid var(--border-color);
        }}
        h1 {{ font-size: 1.75rem; font-weight: 600; }}
        .timestamp {{ color: var(--text-muted); font-size: 0.9rem; }}
        .stats {{
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(180px, 1fr));
            gap: 1rem;
            margin-bottom: 2rem;
        }}
        .stat-card {{
            background: var(--card-bg);
            padding: 1.25rem;
            border-radius: 8px;
            border: 1px solid var(--border-color);
        }}
        .stat-value {{ font-size: 2rem; font-weight: 700; }}
        .stat-label {{ color: var(--text-muted); font-size: 0.85rem; }}
        table {{
            width: 100%;
            border-collapse: collapse;
            background: var(--card-bg);
            border-radius: 8px;
            overflow: hidden;
        }}
        th, td {{
            padding: 0.75rem 1rem;
            text-align: left;
            border-bottom: 1px solid var(--border-color);
        }}
        th {{ background: var(--accent); font-weight: 600; }}
        a {{ color: #6ea8fe; }}
        .status-pill {{ padding: 0.25rem 0.5rem; border-radius: 4px; font-size: 0.75rem; font-weight: 600; }}
        .status-pill.detected {{ background: var(--detected); color: white; }}
        .placeholder {{ text-align: center; padding: 2rem; color: var(--text-muted); }}
        footer {{ text-align: center; color: var(--text-muted); font-size: 0.8rem; margin-top: 2rem; padding-top: 1rem; border-top: 1px solid var(--border-color); }}
    </style>
</head>
<body>
    <div class="container">
        <header>
            <h1>extprobe Report</h1>
            <span class="timestamp">{}</span>
        </header>
"#,
        report.scan_time.format("%Y-%m-%d"),
        report.scan_time.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    html.push_str(&format!(
        r#"        <div class="stats">
            <div class="stat-card">
                <div class="stat-value">{}</div>
                <div class="stat-label">Extensions</div>
            </div>
            <div class="stat-card">
                <div class="stat-value">{}</div>
                <div class="stat-label">Scanned</div>
            </div>
            <div class="stat-card">
                <div class="stat-value">{}</div>
                <div class="stat-label">Detected</div>
            </div>
            <div class="stat-card">
                <div class="stat-value">{}%</div>
                <div class="stat-label">Progress</div>
            </div>
        </div>
"#,
        summary.total,
        summary.scanned,
        summary.detected,
        summary.percent()
    ));

    html.push_str(
        r#"        <section>
            <table>
                <thead>
                    <tr>
                        <th>Extension ID</th>
                        <th>Name</th>
                        <th>Category</th>
                        <th>Overview</th>
                        <th>Status</th>
                    </tr>
                </thead>
                <tbody>
"#,
    );

    if report.detections.is_empty() {
        html.push_str(
            r#"                    <tr><td class="placeholder" colspan="5">No extensions detected</td></tr>
"#,
        );
    }

    for detection in &report.detections {
        let row = DetectionRow::from(detection);
        let name_cell = match &row.store_url {
            Some(url) => format!(
                r#"<a href="{}" target="_blank" rel="noopener">{}</a>"#,
                html_escape(url),
                html_escape(&row.name)
            ),
            None => html_escape(&row.name),
        };

        html.push_str(&format!(
            r#"                    <tr>
                        <td>{}</td>
                        <td>{}</td>
                        <td>{}</td>
                        <td>{}</td>
                        <td><span class="status-pill detected">Detected</span></td>
                    </tr>
"#,
            html_escape(&row.id),
            name_cell,
            html_escape(&row.category),
            html_escape(&row.overview)
        ));
    }

    html.push_str(
        r#"                </tbody>
            </table>
        </section>
"#,
    );

    html.push_str(&format!(
        r#"        <footer>
            Generated by extprobe in {:.1}s
        </footer>
    </div>
</body>
</html>
"#,
        report.duration.as_secs_f64()
    ));

    html
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Candidate, Detection, MetadataRecord, ProgressUpdate};
    use chrono::Utc;
    use std::time::Duration;

    fn report(detections: Vec<Detection>) -> ScanReport {
        ScanReport {
            scan_time: Utc::now(),
            duration: Duration::from_millis(1500),
            summary: ProgressUpdate {
                scanned: 3,
                detected: detections.len(),
                total: 3,
            },
            detections,
        }
    }

    #[test]
    fn test_html_escapes_metadata() {
        let html = generate_html_string(&report(vec![Detection {
            candidate: Candidate::new("abc", "icon.png"),
            metadata: Some(MetadataRecord {
                display_name: Some("<script>alert(1)</script>".to_string()),
                category: None,
                overview: Some("Tom & Jerry".to_string()),
            }),
        }]));

        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("Tom &amp; Jerry"));
        assert!(html.contains("https://chromewebstore.google.com/detail/abc"));
    }

    #[test]
    fn test_html_placeholder_when_empty() {
        let html = generate_html_string(&report(Vec::new()));
        assert!(html.contains("No extensions detected"));
        assert!(!html.contains("status-pill detected\">Detected"));
    }

    #[test]
    fn test_html_unlisted_row() {
        let html = generate_html_string(&report(vec![Detection {
            candidate: Candidate::new("zzz", "data.json"),
            metadata: None,
        }]));

        assert!(html.contains("Not in dataset"));
        assert!(!html.contains("chromewebstore.google.com/detail/zzz"));
    }
}
