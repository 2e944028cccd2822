use crate::collector::ReportItem;
use crate::error::CollectorError;
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

/// Renders the collected periods into a markdown document. Periods come out
/// sorted ascending; with the zero-padded `YYYY-MM` format that is also
/// chronological order.
pub fn render_markdown(periods: &[(String, Vec<ReportItem>)]) -> String {
    let mut sorted: Vec<&(String, Vec<ReportItem>)> = periods.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let mut out = String::new();
    out.push_str("# Daily report digest\n\n");
    out.push_str(&format!(
        "Generated: {}\n\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    ));

    for (period, items) in sorted {
        out.push_str(&format!("## {} ({} items)\n\n", period, items.len()));

        if items.is_empty() {
            out.push_str("*no data*\n\n");
            continue;
        }

        for (i, item) in items.iter().enumerate() {
            out.push_str(&format!("### {}. {}\n\n", i + 1, item.text));
            if let Some(link) = &item.link {
                out.push_str(&format!("Link: {}\n\n", link));
            }
            out.push_str("---\n\n");
        }
    }

    out
}

/// Writes the artifact fresh, overwriting any previous file at `path`.
pub fn write_markdown(
    periods: &[(String, Vec<ReportItem>)],
    path: &Path,
) -> Result<(), CollectorError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    fs::write(path, render_markdown(periods))?;
    tracing::info!("📝 wrote report digest to {}", path.display());
    Ok(())
}

/// Reads a rendered report back and computes the sibling path a CSV summary
/// of it should be written to. The caller does the summarizing.
pub fn summary_source(md_path: &Path) -> Result<(String, PathBuf), CollectorError> {
    let content = fs::read_to_string(md_path).map_err(|e| {
        CollectorError::Persistence(format!("could not read {}: {}", md_path.display(), e))
    })?;

    let stem = md_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("report");
    let csv_path = md_path.with_file_name(format!("{stem}-summary.csv"));

    Ok((content, csv_path))
}
