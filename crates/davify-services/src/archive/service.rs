use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;

/// Extension of bundled multi-file uploads.
pub const ARCHIVE_EXT: &str = ".tgz";

/// Sanitize a path into a bare archive entry name (no path components).
fn entry_name(path: &Path, fallback: &str) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .unwrap_or(fallback)
        .to_string()
}

/// Archive name derived from the first input, e.g. `photos/` → `photos.tgz`.
pub fn archive_name(first_input: &Path) -> Result<String> {
    let base = first_input
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|s| !s.is_empty())
        .with_context(|| format!("Cannot derive archive name from {}", first_input.display()))?;
    Ok(format!("{}{}", base, ARCHIVE_EXT))
}

/// Bundle `inputs` into a gzip-compressed tar archive at `dest`.
///
/// Files are added under their base name; directories recursively under
/// theirs. Returns the number of top-level entries added.
pub async fn create_archive(dest: &Path, inputs: &[PathBuf]) -> Result<usize> {
    let file = File::create(dest)
        .with_context(|| format!("Failed to create archive {}", dest.display()))?;
    let mut tar = tar::Builder::new(GzEncoder::new(file, Compression::default()));

    let mut added = 0usize;
    for (idx, input) in inputs.iter().enumerate() {
        let metadata = std::fs::metadata(input)
            .with_context(|| format!("Failed to read {}", input.display()))?;
        let name = entry_name(input, &format!("unnamed_{}", idx));

        if metadata.is_dir() {
            tar.append_dir_all(&name, input)
                .with_context(|| format!("Failed to add directory to archive: {}", name))?;
        } else {
            tar.append_path_with_name(input, &name)
                .with_context(|| format!("Failed to add file to archive: {}", name))?;
        }

        tracing::debug!(path = %input.display(), entry = %name, "Added to archive");
        added += 1;
    }

    tar.into_inner()
        .context("Failed to finalize TAR archive")?
        .finish()
        .context("Failed to finalize gzip stream")?;

    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use tempfile::tempdir;

    #[test]
    fn archive_name_uses_base_of_first_input() {
        assert_eq!(archive_name(Path::new("/data/report.pdf")).unwrap(), "report.pdf.tgz");
        assert_eq!(archive_name(Path::new("photos/")).unwrap(), "photos.tgz");
        assert!(archive_name(Path::new("/")).is_err());
    }

    #[tokio::test]
    async fn bundles_files_under_their_base_names() {
        let src = tempdir().unwrap();
        let a = src.path().join("a.txt");
        let b = src.path().join("nested").join("b.txt");
        std::fs::create_dir(src.path().join("nested")).unwrap();
        std::fs::write(&a, b"alpha").unwrap();
        std::fs::write(&b, b"beta").unwrap();

        let out = tempdir().unwrap();
        let dest = out.path().join("bundle.tgz");
        let added = create_archive(&dest, &[a, b]).await.unwrap();
        assert_eq!(added, 2);

        let mut archive = tar::Archive::new(GzDecoder::new(File::open(&dest).unwrap()));
        let names: Vec<String> = archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[tokio::test]
    async fn missing_input_aborts_the_bundle() {
        let out = tempdir().unwrap();
        let dest = out.path().join("bundle.tgz");
        let result = create_archive(&dest, &[PathBuf::from("/no/such/file")]).await;
        assert!(result.is_err());
    }
}
