use anyhow::{Context, Result};
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

use crate::core::corpus::Corpus;

const MMAP_THRESHOLD: u64 = 1024 * 1024; // 1 MiB

pub enum FileContent {
    Mapped(Mmap),
    Buffered(String),
}

impl FileContent {
    /// View the content as UTF-8; mapped files are validated here.
    pub fn as_str(&self) -> Result<&str> {
        match self {
            FileContent::Mapped(mmap) => {
                std::str::from_utf8(mmap).context("corpus file is not valid UTF-8")
            }
            FileContent::Buffered(s) => Ok(s.as_str()),
        }
    }
}

pub fn read_file_smart<P: AsRef<Path>>(path: P) -> Result<FileContent> {
    let path = path.as_ref();
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Failed to read metadata for {}", path.display()))?;

    if metadata.len() > MMAP_THRESHOLD {
        // Use memory mapping for large corpora
        let file =
            File::open(path).with_context(|| format!("Failed to open file {}", path.display()))?;

        // Safety: We're only reading the file, not modifying it
        let mmap = unsafe { Mmap::map(&file) }
            .with_context(|| format!("Failed to memory-map {}", path.display()))?;

        Ok(FileContent::Mapped(mmap))
    } else {
        // Read small files into memory
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file {}", path.display()))?;

        Ok(FileContent::Buffered(content))
    }
}

/// Read and validate a corpus file.
pub fn load_corpus<P: AsRef<Path>>(path: P) -> Result<Corpus> {
    let path = path.as_ref();
    let content = read_file_smart(path)?;

    let corpus = Corpus::from_json_str(content.as_str()?)
        .with_context(|| format!("Invalid corpus in {}", path.display()))?;

    Ok(corpus)
}

/// Write a payload to `path`, creating parent directories as needed.
pub fn write_payload<P: AsRef<Path>>(path: P, body: &str) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    std::fs::write(path, body).with_context(|| format!("Failed to write {}", path.display()))
}
