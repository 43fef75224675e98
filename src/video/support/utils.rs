use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

pub fn canonicalize_existing(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        anyhow::bail!("{} does not exist", path.display());
    }
    path.canonicalize()
        .with_context(|| format!("Failed to canonicalize path {}", path.display()))
}

/// Content identity of a video: SHA-256 over its size and a bounded sample of
/// its bytes, so multi-gigabyte files hash quickly.
pub fn compute_file_hash(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .with_context(|| format!("Failed to open {} for hashing", path.display()))?;
    let file_size = file
        .metadata()
        .with_context(|| format!("Failed to read metadata for {}", path.display()))?
        .len();
    let mut hasher = Sha256::new();
    hasher.update(file_size.to_le_bytes());

    const SAMPLE_SIZE: usize = 64 * 1024;
    const MIN_SAMPLES: u64 = 8;
    const MAX_SAMPLES: u64 = 512;
    const TARGET_STEP: u64 = 8 * 1024 * 1024;
    let full_read_threshold = (SAMPLE_SIZE as u64) * MAX_SAMPLES;

    if file_size <= full_read_threshold {
        let mut buffer = [0u8; 8192];
        loop {
            let read = file
                .read(&mut buffer)
                .with_context(|| format!("Failed to read {} for hashing", path.display()))?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }
    } else {
        let sample_count = (file_size / TARGET_STEP).clamp(MIN_SAMPLES, MAX_SAMPLES);

        let mut buffer = vec![0u8; SAMPLE_SIZE];
        let last_offset = file_size.saturating_sub(SAMPLE_SIZE as u64);
        let step = last_offset / (sample_count - 1);

        for i in 0..sample_count {
            file.seek(SeekFrom::Start(step * i))
                .with_context(|| format!("Failed to seek {} for hashing", path.display()))?;
            let mut read_total = 0;
            while read_total < SAMPLE_SIZE {
                let read = file
                    .read(&mut buffer[read_total..])
                    .with_context(|| format!("Failed to read {} for hashing", path.display()))?;
                if read == 0 {
                    break;
                }
                read_total += read;
            }
            hasher.update(&buffer[..read_total]);
        }
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// MIME type the provider expects for a video container
pub fn mime_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "mpeg" | "mpg" => "video/mpeg",
        "3gp" => "video/3gpp",
        "flv" => "video/x-flv",
        "wmv" => "video/x-ms-wmv",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_follows_content_not_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let a = dir.path().join("a.mp4");
        let b = dir.path().join("b.mp4");
        let c = dir.path().join("c.mp4");
        std::fs::write(&a, b"same bytes").expect("write");
        std::fs::write(&b, b"same bytes").expect("write");
        std::fs::write(&c, b"other bytes").expect("write");

        let hash_a = compute_file_hash(&a).expect("hash");
        assert_eq!(hash_a, compute_file_hash(&b).expect("hash"));
        assert_ne!(hash_a, compute_file_hash(&c).expect("hash"));
        assert_eq!(hash_a.len(), 64);
    }

    #[test]
    fn mime_types_cover_upload_formats() {
        assert_eq!(mime_type_for(Path::new("clip.MP4")), "video/mp4");
        assert_eq!(mime_type_for(Path::new("clip.mov")), "video/quicktime");
        assert_eq!(mime_type_for(Path::new("clip.webm")), "video/webm");
        assert_eq!(mime_type_for(Path::new("clip")), "application/octet-stream");
    }

    #[test]
    fn canonicalize_rejects_missing_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(canonicalize_existing(&dir.path().join("missing.mp4")).is_err());
    }
}
