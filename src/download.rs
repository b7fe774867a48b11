//! Download trigger for generated report artifacts.
//!
//! Opening a report never touches session state; a link that fails to open is logged and
//! otherwise ignored.

use crate::model::AnalysisResult;
use crate::render::artifact_filename;
use crate::service::{ServiceClient, ServiceError};
use anyhow::{Context, Result};
use reqwest::Url;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Opens an artifact URL in a new viewing context.
pub trait ArtifactOpener: Send + Sync {
    fn open(&self, url: &Url) -> std::io::Result<()>;
}

/// Hands the URL to the system's default browser.
pub struct BrowserOpener;

impl ArtifactOpener for BrowserOpener {
    fn open(&self, url: &Url) -> std::io::Result<()> {
        open::that(url.as_str())
    }
}

/// `{base}/reports/{filename}`, with the filename percent-encoded as a single path segment.
pub fn report_url(base: &Url, filename: &str) -> Result<Url, ServiceError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ServiceError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .push("reports")
        .push(filename);
    Ok(url)
}

/// Open the result's report, returning the URL that was handed to the opener. Does nothing
/// when the result has no usable report path.
pub fn download(result: &AnalysisResult, base: &Url, opener: &dyn ArtifactOpener) -> Option<Url> {
    let filename = artifact_filename(&result.report_path)?;
    let url = match report_url(base, filename) {
        Ok(url) => url,
        Err(e) => {
            warn!(error = %e, "could not build report URL");
            return None;
        }
    };
    info!(%url, "opening report");
    if let Err(e) = opener.open(&url) {
        warn!(%url, error = %e, "failed to open report");
    }
    Some(url)
}

/// Fetch the result's report and write it into `dir` under its own filename.
pub async fn save_report(
    client: &ServiceClient,
    result: &AnalysisResult,
    dir: &Path,
) -> Result<Option<PathBuf>> {
    let Some(filename) = artifact_filename(&result.report_path) else {
        return Ok(None);
    };
    let bytes = client
        .fetch_report(filename)
        .await
        .with_context(|| format!("fetch report {filename}"))?;
    std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let path = dir.join(filename);
    std::fs::write(&path, &bytes).with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), bytes = bytes.len(), "saved report");
    Ok(Some(path))
}

/// Default directory for saved reports: the user's download directory, else the working dir.
pub fn default_report_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::fixtures::sample_result;
    use crate::testutil::{serve_once, test_config};
    use std::sync::Mutex;

    /// Records URLs instead of launching a browser.
    #[derive(Default)]
    pub(crate) struct RecordingOpener {
        pub opened: Mutex<Vec<String>>,
        pub fail: bool,
    }

    impl ArtifactOpener for RecordingOpener {
        fn open(&self, url: &Url) -> std::io::Result<()> {
            self.opened.lock().unwrap().push(url.to_string());
            if self.fail {
                return Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no browser"));
            }
            Ok(())
        }
    }

    fn base() -> Url {
        Url::parse("http://localhost:5000/").unwrap()
    }

    #[test]
    fn opens_reports_path_for_derived_filename() {
        let opener = RecordingOpener::default();
        let url = download(&sample_result(), &base(), &opener).unwrap();
        assert_eq!(url.path(), "/reports/metformin_2024.pdf");
        assert_eq!(
            *opener.opened.lock().unwrap(),
            vec!["http://localhost:5000/reports/metformin_2024.pdf".to_string()]
        );
    }

    #[test]
    fn empty_report_path_does_nothing() {
        let mut result = sample_result();
        result.report_path.clear();
        let opener = RecordingOpener::default();
        assert!(download(&result, &base(), &opener).is_none());
        assert!(opener.opened.lock().unwrap().is_empty());
    }

    #[test]
    fn open_failure_is_not_propagated() {
        let opener = RecordingOpener {
            fail: true,
            ..Default::default()
        };
        assert!(download(&sample_result(), &base(), &opener).is_some());
        assert_eq!(opener.opened.lock().unwrap().len(), 1);
    }

    #[test]
    fn report_url_respects_base_prefix_and_encodes() {
        let prefixed = Url::parse("https://example.com/pharma/").unwrap();
        assert_eq!(
            report_url(&prefixed, "a b.pdf").unwrap().as_str(),
            "https://example.com/pharma/reports/a%20b.pdf"
        );
    }

    #[tokio::test]
    async fn save_report_writes_fetched_bytes() {
        let (base_url, server) = serve_once(200, "application/pdf", b"%PDF-1.7 body".to_vec()).await;
        let client = ServiceClient::new(&test_config(&base_url)).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let path = save_report(&client, &sample_result(), dir.path())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(path, dir.path().join("metformin_2024.pdf"));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.7 body");
        assert_eq!(server.await.unwrap().path, "/reports/metformin_2024.pdf");
    }

    #[tokio::test]
    async fn save_report_without_path_is_none() {
        let client = ServiceClient::new(&test_config("http://127.0.0.1:9")).unwrap();
        let mut result = sample_result();
        result.report_path.clear();
        let dir = tempfile::tempdir().unwrap();
        assert!(save_report(&client, &result, dir.path()).await.unwrap().is_none());
    }
}
