//! Candidate files backed by paths on disk

use anyhow::{Context, Result};
use pdftools_core::{sniff_mime_type, CandidateFile, PageCount, PageCountError, PageCounter};
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

pub type LocalFile = CandidateFile<PathBuf>;

/// Bytes read from the start of a file to sniff its type
const SNIFF_LEN: usize = 16;

/// Describe a local file the way a browser picker would: name, size and a
/// MIME type sniffed from its first bytes.
pub async fn candidate_from_path(path: &Path) -> Result<LocalFile> {
    let metadata = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("Cannot read {}", path.display()))?;
    if !metadata.is_file() {
        anyhow::bail!("{} is not a file", path.display());
    }

    let mut head = [0u8; SNIFF_LEN];
    let mut file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("Cannot open {}", path.display()))?;
    let read = file.read(&mut head).await?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mime_type = sniff_mime_type(&name, &head[..read]);

    Ok(CandidateFile::new(
        name,
        metadata.len(),
        mime_type,
        path.to_path_buf(),
    ))
}

pub async fn candidates_from_paths(paths: &[PathBuf]) -> Result<Vec<LocalFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(candidate_from_path(path).await?);
    }
    Ok(files)
}

/// Read a file and count its pages on the blocking pool. Any failure,
/// including a panicking parser, yields `Unknown`.
pub async fn resolve_page_count<C>(counter: C, path: &Path) -> PageCount
where
    C: PageCounter + Send + 'static,
{
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => return PageCount::from_result(Err(PageCountError::ReadError(e.to_string()))),
    };
    let result = tokio::task::spawn_blocking(move || counter.page_count(&bytes))
        .await
        .unwrap_or_else(|e| Err(PageCountError::ParseError(e.to_string())));
    PageCount::from_result(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdftools_core::{LopdfPageCounter, PDF_MIME};

    #[tokio::test]
    async fn test_candidate_sniffs_pdf_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan");
        std::fs::write(&path, b"%PDF-1.4\n%fake").unwrap();

        let file = candidate_from_path(&path).await.unwrap();
        assert_eq!(file.name, "scan");
        assert_eq!(file.size, 14);
        assert_eq!(file.mime_type, PDF_MIME);
        assert_eq!(file.handle, path);
    }

    #[tokio::test]
    async fn test_empty_file_falls_back_to_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.png");
        std::fs::write(&path, b"").unwrap();

        let file = candidate_from_path(&path).await.unwrap();
        assert_eq!(file.mime_type, "image/png");
        assert_eq!(file.size, 0);
    }

    #[tokio::test]
    async fn test_missing_path_is_an_error() {
        let err = candidate_from_path(Path::new("/no/such/file.pdf"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("/no/such/file.pdf"));
    }

    #[tokio::test]
    async fn test_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(candidate_from_path(dir.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_unreadable_pdf_has_unknown_page_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"%PDF-1.7 truncated").unwrap();

        assert_eq!(
            resolve_page_count(LopdfPageCounter, &path).await,
            PageCount::Unknown
        );
        assert_eq!(
            resolve_page_count(LopdfPageCounter, &dir.path().join("gone.pdf")).await,
            PageCount::Unknown
        );
    }

    struct PanickingCounter;

    impl PageCounter for PanickingCounter {
        fn page_count(&self, _bytes: &[u8]) -> Result<u32, PageCountError> {
            panic!("parser blew up");
        }
    }

    #[tokio::test]
    async fn test_panicking_parser_yields_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("odd.pdf");
        std::fs::write(&path, b"%PDF-1.7").unwrap();

        assert_eq!(
            resolve_page_count(PanickingCounter, &path).await,
            PageCount::Unknown
        );
    }
}
