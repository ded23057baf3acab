//! Attendance report and exports (admin)

use crate::client::backend::BackendClient;
use crate::client::token::SessionToken;
use crate::error::ClientResult;
use presenca_common::api::{AttendanceReport, ExportFormat};
use std::path::{Path, PathBuf};
use tracing::info;

/// Widest bar in [`render_chart`], in characters
pub const CHART_WIDTH: usize = 40;

#[derive(Debug, Clone)]
pub struct ReportService {
    backend: BackendClient,
}

impl ReportService {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }

    pub async fn fetch(&self, token: &SessionToken) -> ClientResult<AttendanceReport> {
        let report = self.backend.report(token).await?;
        info!(
            total = report.total_usuarios,
            present = report.presentes,
            absent = report.ausentes,
            "Report fetched"
        );
        Ok(report)
    }

    /// Download an export; `out` defaults to `usuarios.<ext>` in the working
    /// directory
    pub async fn export(
        &self,
        token: &SessionToken,
        format: ExportFormat,
        out: Option<&Path>,
    ) -> ClientResult<PathBuf> {
        let path = out
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(format.default_file_name()));

        let bytes = self.backend.export(format, token).await?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, &bytes)?;

        info!(%format, path = %path.display(), bytes = bytes.len(), "Export saved");
        Ok(path)
    }
}

/// Horizontal bar chart of the report counts
pub fn render_chart(report: &AttendanceReport, width: usize) -> String {
    let rows = [
        ("Total", report.total_usuarios),
        ("Presentes", report.presentes),
        ("Ausentes", report.ausentes),
    ];
    let max = rows.iter().map(|(_, n)| *n).max().unwrap_or(0);
    let label_width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);

    let mut chart = String::new();
    for (label, count) in rows {
        let bar = if max == 0 {
            0
        } else {
            ((count as u128 * width as u128 + max as u128 / 2) / max as u128) as usize
        };
        chart.push_str(&format!(
            "{:<label_width$} │{} {}\n",
            label,
            "█".repeat(bar),
            count,
            label_width = label_width
        ));
    }
    chart
}
