use anyhow::{Context, Result};
use chrono::Utc;
use std::fs;
use std::path::Path;
use tera::{Context as TeraContext, Tera};

use crate::models::{Severity, Stage, StageResult};

pub struct JsonExporter;

impl JsonExporter {
    pub fn export(target: &str, results: &[StageResult], path: &Path) -> Result<()> {
        let output = ExportData {
            generated_at: Utc::now().to_rfc3339(),
            target: target.to_string(),
            stages: results
                .iter()
                .filter(|r| r.stage != Stage::Report)
                .cloned()
                .collect(),
        };
        let json = serde_json::to_string_pretty(&output)?;
        fs::write(path, json).with_context(|| format!("Failed to write to {}", path.display()))?;
        Ok(())
    }
}

pub struct HtmlExporter;

impl HtmlExporter {
    pub fn export(target: &str, results: &[StageResult], path: &Path) -> Result<()> {
        let template = Self::get_template();
        let mut tera = Tera::default();
        tera.add_raw_template("report", &template)?;

        let scan_stages: Vec<&StageResult> = results
            .iter()
            .filter(|r| r.stage != Stage::Report)
            .collect();

        let severity_count = |severity: Severity| -> usize {
            scan_stages
                .iter()
                .filter(|r| r.stage != Stage::Discovery && r.stage != Stage::HttpProbe)
                .flat_map(|r| r.findings.iter())
                .filter(|f| f.severity == severity)
                .count()
        };

        let mut context = TeraContext::new();
        context.insert("target", target);
        context.insert(
            "scan_time",
            &Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        );
        context.insert(
            "host_count",
            &scan_stages
                .iter()
                .find(|r| r.stage == Stage::Discovery)
                .map(|r| r.findings.len())
                .unwrap_or(0),
        );
        context.insert(
            "live_count",
            &scan_stages
                .iter()
                .find(|r| r.stage == Stage::HttpProbe)
                .map(|r| r.findings.len())
                .unwrap_or(0),
        );
        context.insert("critical_count", &severity_count(Severity::Critical));
        context.insert("high_count", &severity_count(Severity::High));
        context.insert("medium_count", &severity_count(Severity::Medium));
        context.insert("low_count", &severity_count(Severity::Low));

        let sections: Vec<StageSection> = scan_stages
            .iter()
            .map(|result| StageSection {
                label: result.stage.label().to_string(),
                status: result.status.to_string(),
                status_class: Self::status_class(result),
                items: format!("{}/{}", result.succeeded(), result.attempted),
                findings: result
                    .findings
                    .iter()
                    .map(|f| FindingRow {
                        subject: f.subject.clone(),
                        severity: f.severity.to_string(),
                        severity_class: f.severity.to_string().to_lowercase(),
                        detail: f.detail.clone(),
                    })
                    .collect(),
                failures: result
                    .failures
                    .iter()
                    .map(|f| FailureRow {
                        key: f.key.clone(),
                        reason: f.reason.to_string(),
                    })
                    .collect(),
            })
            .collect();
        context.insert("sections", &sections);

        let html = tera.render("report", &context)?;
        fs::write(path, html).with_context(|| format!("Failed to write to {}", path.display()))?;
        Ok(())
    }

    fn status_class(result: &StageResult) -> String {
        match result.status {
            crate::models::StageStatus::Complete => "complete",
            crate::models::StageStatus::PartiallyFailed => "partial",
            crate::models::StageStatus::Failed => "failed",
            _ => "pending",
        }
        .to_string()
    }

    fn get_template() -> String {
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Recon Report: {{ target }}</title>
    <style>
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: #0d1117; color: #c9d1d9; line-height: 1.6; }
        .container { max-width: 1200px; margin: 0 auto; padding: 2rem; }
        h1 { color: #58a6ff; margin-bottom: 0.5rem; }
        h2 { color: #c9d1d9; margin: 2rem 0 0.5rem; }
        .subtitle { color: #8b949e; margin-bottom: 2rem; }
        .summary { display: grid; grid-template-columns: repeat(auto-fit, minmax(150px, 1fr)); gap: 1rem; margin-bottom: 2rem; }
        .stat { background: #161b22; border: 1px solid #30363d; border-radius: 6px; padding: 1rem; text-align: center; }
        .stat-value { font-size: 2rem; font-weight: bold; }
        .stat-label { color: #8b949e; font-size: 0.875rem; }
        .critical .stat-value { color: #f85149; }
        .high .stat-value { color: #f85149; }
        .medium .stat-value { color: #d29922; }
        .low .stat-value { color: #58a6ff; }
        .hosts .stat-value { color: #3fb950; }
        table { width: 100%; border-collapse: collapse; background: #161b22; border: 1px solid #30363d; border-radius: 6px; overflow: hidden; margin-bottom: 1rem; }
        th, td { padding: 0.75rem 1rem; text-align: left; border-bottom: 1px solid #30363d; }
        th { background: #21262d; color: #c9d1d9; font-weight: 600; }
        tr:hover { background: #21262d; }
        .badge { padding: 0.25rem 0.5rem; border-radius: 4px; font-size: 0.75rem; font-weight: 600; }
        .badge.complete { background: #3fb95033; color: #3fb950; }
        .badge.partial { background: #d2992233; color: #d29922; }
        .badge.failed { background: #f8514933; color: #f85149; }
        .badge.pending { background: #8b949e33; color: #8b949e; }
        .badge.critical { background: #f8514933; color: #f85149; }
        .badge.high { background: #f8514933; color: #f85149; }
        .badge.medium { background: #d2992233; color: #d29922; }
        .badge.low { background: #58a6ff33; color: #58a6ff; }
        .badge.info { background: #8b949e33; color: #8b949e; }
        .detail { color: #8b949e; font-size: 0.875rem; }
        .failure { color: #f85149; font-size: 0.875rem; }
    </style>
</head>
<body>
    <div class="container">
        <h1>Recon Report: {{ target }}</h1>
        <p class="subtitle">Generated: {{ scan_time }}</p>

        <div class="summary">
            <div class="stat hosts">
                <div class="stat-value">{{ host_count }}</div>
                <div class="stat-label">Hosts</div>
            </div>
            <div class="stat hosts">
                <div class="stat-value">{{ live_count }}</div>
                <div class="stat-label">Live</div>
            </div>
            <div class="stat critical">
                <div class="stat-value">{{ critical_count }}</div>
                <div class="stat-label">Critical</div>
            </div>
            <div class="stat high">
                <div class="stat-value">{{ high_count }}</div>
                <div class="stat-label">High</div>
            </div>
            <div class="stat medium">
                <div class="stat-value">{{ medium_count }}</div>
                <div class="stat-label">Medium</div>
            </div>
            <div class="stat low">
                <div class="stat-value">{{ low_count }}</div>
                <div class="stat-label">Low</div>
            </div>
        </div>

        {% for section in sections %}
        <h2>{{ section.label }} <span class="badge {{ section.status_class }}">{{ section.status }}</span> <span class="detail">{{ section.items }} items</span></h2>
        {% if section.findings %}
        <table>
            <thead>
                <tr>
                    <th>Subject</th>
                    <th>Severity</th>
                    <th>Detail</th>
                </tr>
            </thead>
            <tbody>
                {% for finding in section.findings %}
                <tr>
                    <td>{{ finding.subject }}</td>
                    <td><span class="badge {{ finding.severity_class }}">{{ finding.severity }}</span></td>
                    <td class="detail">{{ finding.detail }}</td>
                </tr>
                {% endfor %}
            </tbody>
        </table>
        {% endif %}
        {% if section.failures %}
        <table>
            <thead>
                <tr>
                    <th>Failed Item</th>
                    <th>Reason</th>
                </tr>
            </thead>
            <tbody>
                {% for failure in section.failures %}
                <tr>
                    <td>{{ failure.key }}</td>
                    <td class="failure">{{ failure.reason }}</td>
                </tr>
                {% endfor %}
            </tbody>
        </table>
        {% endif %}
        {% endfor %}
    </div>
</body>
</html>"#
            .to_string()
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
struct ExportData {
    generated_at: String,
    target: String,
    stages: Vec<StageResult>,
}

#[derive(serde::Serialize)]
struct StageSection {
    label: String,
    status: String,
    status_class: String,
    items: String,
    findings: Vec<FindingRow>,
    failures: Vec<FailureRow>,
}

#[derive(serde::Serialize)]
struct FindingRow {
    subject: String,
    severity: String,
    severity_class: String,
    detail: String,
}

#[derive(serde::Serialize)]
struct FailureRow {
    key: String,
    reason: String,
}
