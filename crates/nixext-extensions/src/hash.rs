//! Content hashing into Nix SRI form

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use nixext_core::CommandRunner;
use sha2::digest::Output;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use crate::error::HashError;

/// Read buffer size for hashing (64 KiB)
const HASH_BUFFER_SIZE: usize = 64 * 1024;

/// Produces an SRI hash (`sha256-…`) for a file
#[async_trait]
pub trait ContentHasher: Send + Sync {
    async fn hash_file(&self, path: &Path) -> Result<String, HashError>;
}

/// SHA-256 in process, converted by `nix hash to-sri`
pub struct NixSriHasher {
    runner: Arc<dyn CommandRunner>,
}

impl NixSriHasher {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl ContentHasher for NixSriHasher {
    async fn hash_file(&self, path: &Path) -> Result<String, HashError> {
        let digest = sha256_file(path).await?;
        let output = self
            .runner
            .run(
                "nix",
                &format!("hash to-sri --type sha256 {:x}", digest),
            )
            .await?;
        Ok(output.trim().to_string())
    }
}

/// SHA-256 encoded to SRI without calling Nix
#[derive(Debug, Clone, Default)]
pub struct LocalSriHasher;

#[async_trait]
impl ContentHasher for LocalSriHasher {
    async fn hash_file(&self, path: &Path) -> Result<String, HashError> {
        let digest = sha256_file(path).await?;
        Ok(format!("sha256-{}", STANDARD.encode(digest)))
    }
}

async fn sha256_file(path: &Path) -> Result<Output<Sha256>, HashError> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || sha256_file_blocking(&path))
        .await
        .map_err(io::Error::other)?
}

fn sha256_file_blocking(path: &Path) -> Result<Output<Sha256>, HashError> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; HASH_BUFFER_SIZE];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nixext_core::ProcessError;
    use std::io::Write;
    use std::sync::Mutex;

    /// Records the arguments and echoes a canned SRI
    struct RecordingRunner(Mutex<Vec<String>>);

    #[async_trait]
    impl CommandRunner for RecordingRunner {
        async fn run(&self, command: &str, args: &str) -> Result<String, ProcessError> {
            self.0.lock().unwrap().push(format!("{} {}", command, args));
            Ok("sha256-fromnix=\n".to_string())
        }
    }

    fn temp_file(content: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file
    }

    #[tokio::test]
    async fn test_local_hasher_matches_known_digest() {
        let file = temp_file(b"hello");
        let hash = LocalSriHasher.hash_file(file.path()).await.unwrap();
        assert_eq!(hash, "sha256-LPJNul+wow4m6DsqxbninhsWHlwfp0JecwQzYpOLmCQ=");
    }

    #[tokio::test]
    async fn test_nix_hasher_passes_hex_digest() {
        let file = temp_file(b"hello");
        let runner = Arc::new(RecordingRunner(Mutex::new(Vec::new())));
        let hasher = NixSriHasher::new(runner.clone());

        let hash = hasher.hash_file(file.path()).await.unwrap();

        assert_eq!(hash, "sha256-fromnix=");
        assert_eq!(
            runner.0.lock().unwrap().as_slice(),
            ["nix hash to-sri --type sha256 2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"]
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let result = LocalSriHasher
            .hash_file(Path::new("/nonexistent/nixext/package.crx"))
            .await;
        assert!(matches!(result, Err(HashError::Io(_))));
    }
}
