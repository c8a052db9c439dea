//! OS shared-memory segments backing the slot table.
//!
//! A segment is a file in a shm-backed directory (`/dev/shm` where the
//! platform provides one) mapped read-write into the process. Creation
//! is exclusive at the OS level; the cache layer turns the lost race
//! into attach semantics. Dropping a [`SegmentBlock`] unmaps the
//! segment from this process only; the underlying memory persists for
//! other processes until the file is removed.

use memmap2::MmapMut;
use shmkv_core::{Error, Result};
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Name of a shared segment, resolvable to its backing path.
///
/// Names follow the POSIX shared-memory convention: non-empty, no path
/// separators. The backing directory defaults to `/dev/shm` when it
/// exists and the OS temp directory otherwise; tests pin it explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentId {
    name: String,
    dir: Option<PathBuf>,
}

impl SegmentId {
    /// A segment name in the default shm directory.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(Error::segment_unavailable(
                &name,
                "segment names must be non-empty and contain no path separators",
            ));
        }
        Ok(Self { name, dir: None })
    }

    /// A segment name rooted at an explicit directory.
    pub fn in_dir(name: impl Into<String>, dir: impl Into<PathBuf>) -> Result<Self> {
        let mut id = Self::new(name)?;
        id.dir = Some(dir.into());
        Ok(id)
    }

    /// The path this identifier resolves to.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        let dir = self.dir.clone().unwrap_or_else(default_shm_dir);
        dir.join(format!("{}.shmkv", self.name))
    }
}

fn default_shm_dir() -> PathBuf {
    let dev_shm = PathBuf::from("/dev/shm");
    if dev_shm.is_dir() {
        dev_shm
    } else {
        std::env::temp_dir()
    }
}

/// A mapped shared segment, owned for the lifetime of a table handle.
pub struct SegmentBlock {
    map: MmapMut,
    path: PathBuf,
    created: bool,
}

impl SegmentBlock {
    /// Create a new segment sized to `bytes` and map it.
    ///
    /// Returns `Ok(None)` when a segment with this identifier already
    /// exists, so the caller can fall back to [`SegmentBlock::open`];
    /// creation is exclusive at the OS level but idempotent one layer
    /// up. A partially created segment is removed before reporting a
    /// failure.
    pub fn create(id: &SegmentId, bytes: u64) -> Result<Option<Self>> {
        let path = id.path();
        if bytes == 0 {
            return Err(Error::segment_unavailable(
                &path,
                "segment size must be non-zero",
            ));
        }

        let file = match OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => return Ok(None),
            Err(err) => return Err(Error::segment_io(&path, "create segment", err)),
        };

        if let Err(err) = file.set_len(bytes) {
            let _ = std::fs::remove_file(&path);
            return Err(Error::segment_io(&path, "size segment", err));
        }

        match unsafe { MmapMut::map_mut(&file) } {
            Ok(map) => Ok(Some(Self {
                map,
                path,
                created: true,
            })),
            Err(err) => {
                let _ = std::fs::remove_file(&path);
                Err(Error::segment_io(&path, "map segment", err))
            }
        }
    }

    /// Map an existing segment in full.
    pub fn open(id: &SegmentId) -> Result<Self> {
        let path = id.path();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|err| {
                let reason = if err.kind() == ErrorKind::NotFound {
                    "segment does not exist"
                } else {
                    "open segment"
                };
                Error::segment_io(&path, reason, err)
            })?;

        let map = unsafe { MmapMut::map_mut(&file) }
            .map_err(|err| Error::segment_io(&path, "map segment", err))?;
        Ok(Self {
            map,
            path,
            created: false,
        })
    }

    /// Backing path of the mapped segment.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when this process laid the segment out, false when it
    /// attached to one created elsewhere.
    #[must_use]
    pub fn created(&self) -> bool {
        self.created
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.map
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.map
    }
}

impl std::fmt::Debug for SegmentBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentBlock")
            .field("path", &self.path)
            .field("len", &self.map.len())
            .field("created", &self.created)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn create_then_reopen() {
        let dir = TempDir::new().unwrap();
        let id = SegmentId::in_dir("seg", dir.path()).unwrap();

        let mut block = SegmentBlock::create(&id, 4096).unwrap().expect("fresh id");
        assert!(block.created());
        assert_eq!(block.len(), 4096);
        block.as_mut_slice()[..4].copy_from_slice(b"mark");
        drop(block);

        let reopened = SegmentBlock::open(&id).unwrap();
        assert!(!reopened.created());
        assert_eq!(&reopened.as_slice()[..4], b"mark");
    }

    #[test]
    fn second_create_reports_existing() {
        let dir = TempDir::new().unwrap();
        let id = SegmentId::in_dir("seg", dir.path()).unwrap();

        let _first = SegmentBlock::create(&id, 1024).unwrap().expect("fresh id");
        assert!(SegmentBlock::create(&id, 1024).unwrap().is_none());
    }

    #[test]
    fn writes_are_visible_across_mappings() {
        let dir = TempDir::new().unwrap();
        let id = SegmentId::in_dir("seg", dir.path()).unwrap();

        let mut writer = SegmentBlock::create(&id, 1024).unwrap().expect("fresh id");
        let reader = SegmentBlock::open(&id).unwrap();

        writer.as_mut_slice()[100] = 0x7f;
        assert_eq!(reader.as_slice()[100], 0x7f);
    }

    #[test]
    fn open_missing_segment_fails() {
        let dir = TempDir::new().unwrap();
        let id = SegmentId::in_dir("absent", dir.path()).unwrap();
        match SegmentBlock::open(&id) {
            Err(shmkv_core::Error::SegmentUnavailable { .. }) => {}
            other => panic!("expected SegmentUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn zero_sized_create_is_rejected() {
        let dir = TempDir::new().unwrap();
        let id = SegmentId::in_dir("seg", dir.path()).unwrap();
        assert!(SegmentBlock::create(&id, 0).is_err());
    }

    #[test]
    fn invalid_names_are_rejected() {
        assert!(SegmentId::new("").is_err());
        assert!(SegmentId::new("a/b").is_err());
        assert!(SegmentId::new("a\\b").is_err());
        assert!(SegmentId::new("plain").is_ok());
    }
}
