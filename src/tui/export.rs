use crate::model::AnalysisResult;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::mpsc as std_mpsc;
use std::sync::OnceLock;
use std::time::Duration;

// Global clipboard manager channel - initialized once on first use
static CLIPBOARD_SENDER: OnceLock<std_mpsc::Sender<String>> = OnceLock::new();

/// `pharma-analysis-{drug}-{timestamp}.json`, with the drug reduced to a filesystem-safe slug.
pub fn export_file_name(result: &AnalysisResult, timestamp: &str) -> String {
    let slug: String = result
        .drug
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    let slug = slug.trim_matches('-');
    let slug = if slug.is_empty() { "result" } else { slug };
    format!("pharma-analysis-{slug}-{timestamp}.json")
}

/// Export the result as JSON into `dir`. Returns the path written.
pub fn export_result_json(result: &AnalysisResult, dir: &Path) -> Result<PathBuf> {
    let timestamp = time::OffsetDateTime::now_utc()
        .format(time::macros::format_description!(
            "[year][month][day]-[hour][minute][second]"
        ))
        .context("format export timestamp")?;
    let path = dir.join(export_file_name(result, &timestamp));
    crate::orchestrator::export_json(&path, result)?;
    Ok(path)
}

/// Export into the current working directory, returning the absolute path.
pub fn export_to_current_dir(result: &AnalysisResult) -> Result<PathBuf> {
    let current_dir = std::env::current_dir().context("get current directory")?;
    export_result_json(result, &current_dir)
}

/// Initialize the clipboard manager thread if not already initialized.
/// Operations run sequentially on one background thread, and each clipboard instance is kept
/// alive long enough for clipboard managers on Linux to read it.
fn init_clipboard_manager() -> Result<&'static std_mpsc::Sender<String>> {
    CLIPBOARD_SENDER.get_or_init(|| {
        let (tx, rx) = std_mpsc::channel::<String>();

        std::thread::spawn(move || {
            use arboard::Clipboard;

            for text in rx {
                if let Ok(mut clipboard) = Clipboard::new() {
                    if clipboard.set_text(&text).is_ok() {
                        std::thread::sleep(Duration::from_secs(2));
                    }
                }
            }
        });

        tx
    });

    CLIPBOARD_SENDER
        .get()
        .ok_or_else(|| anyhow::anyhow!("Failed to initialize clipboard manager"))
}

/// Queue text for the clipboard without blocking the UI thread.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let sender = init_clipboard_manager()?;
    sender
        .send(text.to_string())
        .map_err(|_| anyhow::anyhow!("Clipboard manager channel closed"))?;
    Ok(())
}
