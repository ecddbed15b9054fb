//! Named blob storage for trained artifacts

use crate::error::{NeurocogError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

/// Save/load of artifacts by name
pub trait ArtifactStore: Send + Sync {
    /// Store `blob` under `name`, replacing any previous content. Returns its location.
    fn save(&self, name: &str, blob: &[u8]) -> Result<String>;

    /// Read the blob stored under `name`; `ModelNotFound` if absent.
    fn load(&self, name: &str) -> Result<Vec<u8>>;

    fn exists(&self, name: &str) -> bool;
}

/// Directory-backed store; names may contain `/` for subdirectories.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    /// Create or open a store rooted at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| {
            NeurocogError::IoError(std::io::Error::new(
                e.kind(),
                format!("failed to create artifact directory {}: {}", root.display(), e),
            ))
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty() || name.split('/').any(|part| part.is_empty() || part == "." || part == "..") {
            return Err(NeurocogError::InvalidParameter {
                name: "artifact name".to_string(),
                value: name.to_string(),
                reason: "must be a relative path without empty, '.' or '..' segments".to_string(),
            });
        }
        Ok(self.root.join(name))
    }
}

impl ArtifactStore for FsArtifactStore {
    fn save(&self, name: &str, blob: &[u8]) -> Result<String> {
        let path = self.path_for(name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write beside the target, then rename over it: readers never see a partial file.
        let tmp = path.with_extension("tmp");
        {
            let mut file = File::create(&tmp)?;
            file.write_all(blob)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        Ok(path.display().to_string())
    }

    fn load(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.path_for(name)?;
        let mut file = File::open(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => NeurocogError::ModelNotFound(name.to_string()),
            _ => NeurocogError::IoError(e),
        })?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    fn exists(&self, name: &str) -> bool {
        self.path_for(name).map(|p| p.is_file()).unwrap_or(false)
    }
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn save(&self, name: &str, blob: &[u8]) -> Result<String> {
        self.blobs.write().insert(name.to_string(), blob.to_vec());
        Ok(format!("memory://{}", name))
    }

    fn load(&self, name: &str) -> Result<Vec<u8>> {
        self.blobs
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| NeurocogError::ModelNotFound(name.to_string()))
    }

    fn exists(&self, name: &str) -> bool {
        self.blobs.read().contains_key(name)
    }
}
