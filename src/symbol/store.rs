//! # Transient Symbol Artifacts
//!
//! Every symbol produced during a render is stashed here and handed back as
//! an [`Artifact`] guard. Dropping the guard, or calling
//! [`Artifact::release`], deletes the backing data. Release is idempotent and
//! a file that is already gone counts as released.
//!
//! ## Backings
//!
//! | Backing | Storage | Name |
//! |---------|---------|------|
//! | Memory | owned bitmap | none |
//! | Directory | PNG file | `symbol_<timestamp>_<uuid>.png` |
//!
//! File names are unique per stash, so concurrent renders sharing one
//! directory never overwrite each other.

use std::borrow::Cow;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::{GrayImage, ImageFormat};
use thiserror::Error;
use uuid::Uuid;

use super::SymbolImage;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot write symbol artifact {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("cannot read symbol artifact {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("cannot remove symbol artifact {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Backing {
    Memory,
    Directory(PathBuf),
}

/// Owner of transient symbol bitmaps.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    backing: Backing,
    live: Arc<AtomicUsize>,
}

impl Default for ArtifactStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl ArtifactStore {
    /// Keep symbols in memory only.
    pub fn in_memory() -> Self {
        Self {
            backing: Backing::Memory,
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Spill symbols as PNG files into `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            backing: Backing::Directory(dir.into()),
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Artifacts stashed and not yet released.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Take ownership of a symbol for the rest of the render.
    pub fn stash(&self, symbol: SymbolImage) -> Result<Artifact, StoreError> {
        let (source, image) = symbol.into_parts();
        let dims = image.dimensions();

        let (slot, pending) = match &self.backing {
            Backing::Memory => (Slot::Memory(image), None),
            Backing::Directory(dir) => (Slot::File(dir.join(unique_name())), Some(image)),
        };
        self.live.fetch_add(1, Ordering::SeqCst);
        let artifact = Artifact {
            source,
            dims,
            slot,
            released: false,
            live: Arc::clone(&self.live),
        };

        // From here on a failed write is cleaned up by the guard's Drop.
        if let (Slot::File(path), Some(image)) = (&artifact.slot, pending) {
            image
                .save_with_format(path, ImageFormat::Png)
                .map_err(|e| StoreError::Write {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
            log::debug!("stashed {:?} at {}", artifact.source, path.display());
        }

        Ok(artifact)
    }
}

fn unique_name() -> String {
    format!(
        "symbol_{}_{}.png",
        chrono::Local::now().format("%Y%m%d_%H%M%S_%f"),
        Uuid::new_v4().simple()
    )
}

#[derive(Debug)]
enum Slot {
    Memory(GrayImage),
    File(PathBuf),
}

/// Scoped handle to one stashed symbol.
#[derive(Debug)]
pub struct Artifact {
    source: String,
    dims: (u32, u32),
    slot: Slot,
    released: bool,
    live: Arc<AtomicUsize>,
}

impl Artifact {
    /// Encoded text of the symbol.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Intrinsic size in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        self.dims
    }

    /// Backing file, for directory stores.
    pub fn path(&self) -> Option<&Path> {
        match &self.slot {
            Slot::File(path) => Some(path),
            Slot::Memory(_) => None,
        }
    }

    /// The symbol bitmap.
    pub fn load(&self) -> Result<Cow<'_, GrayImage>, StoreError> {
        match &self.slot {
            Slot::Memory(image) => Ok(Cow::Borrowed(image)),
            Slot::File(path) => {
                let image = image::open(path).map_err(|e| StoreError::Read {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
                Ok(Cow::Owned(image.into_luma8()))
            }
        }
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Delete the backing data. Safe to call more than once.
    pub fn release(&mut self) -> Result<(), StoreError> {
        if self.released {
            return Ok(());
        }
        match &mut self.slot {
            Slot::Memory(image) => *image = GrayImage::new(0, 0),
            Slot::File(path) => match std::fs::remove_file(&*path) {
                Ok(()) => log::debug!("removed {}", path.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(StoreError::Remove {
                        path: path.clone(),
                        source,
                    });
                }
            },
        }
        self.released = true;
        self.live.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Drop for Artifact {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            log::warn!("{}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{SymbolStyle, encode};

    fn symbol(value: &str) -> SymbolImage {
        encode(value, 20, &SymbolStyle::default()).unwrap()
    }

    fn files_in(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn test_memory_roundtrip() {
        let store = ArtifactStore::in_memory();
        let mut artifact = store.stash(symbol("A1")).unwrap();
        assert_eq!(store.live(), 1);
        assert!(artifact.path().is_none());
        assert_eq!(artifact.load().unwrap().dimensions(), artifact.dimensions());

        artifact.release().unwrap();
        artifact.release().unwrap();
        assert_eq!(store.live(), 0);
    }

    #[test]
    fn test_file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::in_dir(dir.path());
        {
            let artifact = store.stash(symbol("REEL-042")).unwrap();
            let path = artifact.path().unwrap().to_path_buf();
            assert!(path.exists());
            let loaded = artifact.load().unwrap();
            assert_eq!(loaded.dimensions(), artifact.dimensions());
        }
        assert_eq!(files_in(dir.path()), 0);
        assert_eq!(store.live(), 0);
    }

    #[test]
    fn test_release_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::in_dir(dir.path());
        let mut artifact = store.stash(symbol("X")).unwrap();
        std::fs::remove_file(artifact.path().unwrap()).unwrap();
        artifact.release().unwrap();
        assert!(artifact.is_released());
        assert_eq!(store.live(), 0);
    }

    #[test]
    fn test_names_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::in_dir(dir.path());
        let a = store.stash(symbol("SAME")).unwrap();
        let b = store.stash(symbol("SAME")).unwrap();
        assert_ne!(a.path(), b.path());
        assert_eq!(files_in(dir.path()), 2);
    }

    #[test]
    fn test_failed_write_leaves_nothing_live() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::in_dir(dir.path().join("missing"));
        assert!(matches!(
            store.stash(symbol("A1")),
            Err(StoreError::Write { .. })
        ));
        assert_eq!(store.live(), 0);
    }
}
