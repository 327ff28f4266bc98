//! Named output surfaces for provider command output.
//!
//! Each surface is a file under `<data dir>/output/`. Writes replace the
//! previous content, so the last writer wins.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::Result;

/// Surface shared by every synchronous start.
pub const SHARED_SURFACE: &str = "berth-output";

/// Directory holding all output surfaces.
#[derive(Debug, Clone)]
pub struct OutputSurfaces {
    dir: PathBuf,
}

impl OutputSurfaces {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Surfaces rooted in berth's data directory.
    pub fn in_data_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join("output"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The shared surface used for blocking starts.
    pub fn shared(&self) -> OutputSurface {
        self.named(SHARED_SURFACE)
    }

    /// The dedicated surface for a background start of `codespace_name`.
    pub fn for_start(&self, codespace_name: &str) -> OutputSurface {
        self.named(&format!("start-{}", codespace_name))
    }

    fn named(&self, name: &str) -> OutputSurface {
        let file_name: String = name
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        OutputSurface {
            name: name.to_string(),
            path: self.dir.join(format!("{}.log", file_name)),
        }
    }
}

/// A single named output sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSurface {
    name: String,
    path: PathBuf,
}

impl OutputSurface {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the surface content.
    pub fn write(&self, content: &str) -> Result<()> {
        self.ensure_dir()?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    /// Truncate the surface and return a handle a child process can stream into.
    pub fn open_stream(&self) -> Result<File> {
        self.ensure_dir()?;
        Ok(File::create(&self.path)?)
    }

    /// Current content, empty if nothing was written yet.
    pub fn read(&self) -> Result<String> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}
