use crate::error::Result;
use crate::utils::constants::DEFAULT_BUFFER_SIZE;
use flate2::read::MultiGzDecoder;
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// One archive file, on disk or already in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordSource {
    Path(PathBuf),
    Memory { name: String, bytes: Vec<u8> },
}

impl RecordSource {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        RecordSource::Path(path.into())
    }

    pub fn from_bytes(name: &str, bytes: impl Into<Vec<u8>>) -> Self {
        RecordSource::Memory {
            name: name.to_string(),
            bytes: bytes.into(),
        }
    }

    /// File name used in reports
    pub fn name(&self) -> String {
        match self {
            RecordSource::Path(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            RecordSource::Memory { name, .. } => name.clone(),
        }
    }
}

fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(&GZIP_MAGIC)
}

/// Reads archive lines from plain or gzip-compressed sources
#[derive(Debug, Clone, Default)]
pub struct RecordReader {
    use_mmap: bool,
}

impl RecordReader {
    pub fn new() -> Self {
        Self { use_mmap: false }
    }

    pub fn with_mmap(use_mmap: bool) -> Self {
        Self { use_mmap }
    }

    /// All non-empty lines of a source, line terminators stripped
    pub fn read_lines(&self, source: &RecordSource) -> Result<Vec<String>> {
        match source {
            RecordSource::Path(path) if self.use_mmap => self.read_lines_mmap(path),
            RecordSource::Path(path) => self.read_lines_buffered(path),
            RecordSource::Memory { bytes, .. } => lines_from_bytes(bytes),
        }
    }

    fn read_lines_buffered(&self, path: &Path) -> Result<Vec<String>> {
        let file = File::open(path)?;
        let mut reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file);
        if is_gzip(reader.fill_buf()?) {
            let decoder = MultiGzDecoder::new(reader);
            collect_lines(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, decoder))
        } else {
            collect_lines(reader)
        }
    }

    fn read_lines_mmap(&self, path: &Path) -> Result<Vec<String>> {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Ok(Vec::new());
        }
        // Safety: the archive file is opened read-only and not modified while mapped
        let mmap = unsafe { Mmap::map(&file)? };
        lines_from_bytes(&mmap)
    }
}

/// Lines from an in-memory buffer, decompressing if it is gzip
pub fn lines_from_bytes(bytes: &[u8]) -> Result<Vec<String>> {
    if is_gzip(bytes) {
        collect_lines(BufReader::new(MultiGzDecoder::new(bytes)))
    } else {
        collect_lines(bytes)
    }
}

fn collect_lines<R: BufRead>(mut reader: R) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }
        if !buf.is_empty() {
            lines.push(String::from_utf8_lossy(&buf).into_owned());
        }
    }
    Ok(lines)
}
