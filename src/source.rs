//! Discovery of NAV bulletin files and the merged line stream over them

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::vec::IntoIter;
use tracing::debug;
use walkdir::WalkDir;

const FILE_PREFIX: &str = "nav";
const FILE_EXTENSION: &str = ".txt";

/// Returns true for file names matching `nav*.txt`.
pub fn is_nav_file(name: &str) -> bool {
    name.len() >= FILE_PREFIX.len() + FILE_EXTENSION.len()
        && name.starts_with(FILE_PREFIX)
        && name.ends_with(FILE_EXTENSION)
}

/// Finds all `nav*.txt` files below `root`.
///
/// Files are ordered by file name so that bulletins named by date are read
/// oldest first, regardless of the directory they live in.
pub fn list_nav_files<P: AsRef<Path>>(root: P) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    if !root.is_dir() {
        anyhow::bail!("Data directory not found: {}", root.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry =
            entry.with_context(|| format!("Failed to walk data directory: {}", root.display()))?;
        if entry.file_type().is_file() && entry.file_name().to_str().is_some_and(is_nav_file) {
            files.push(entry.into_path());
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()).then_with(|| a.cmp(b)));

    debug!("Found {} NAV files under {}", files.len(), root.display());
    Ok(files)
}

/// Lines of several files read one after the other, in the given order.
///
/// Files are opened lazily. Invalid UTF-8 is replaced rather than rejected and
/// line terminators (`\n` or `\r\n`) are removed.
pub struct NavLines {
    paths: IntoIter<PathBuf>,
    current: Option<BufReader<File>>,
    path: Option<PathBuf>,
    line_no: usize,
    buf: Vec<u8>,
}

impl NavLines {
    pub fn open(paths: Vec<PathBuf>) -> Self {
        Self {
            paths: paths.into_iter(),
            current: None,
            path: None,
            line_no: 0,
            buf: Vec::new(),
        }
    }

    /// File the last line was read from, or the file that failed to open.
    pub fn current_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// 1-based number of the last line read within `current_path`.
    pub fn current_line(&self) -> usize {
        self.line_no
    }
}

impl Iterator for NavLines {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current.is_none() {
                let path = self.paths.next()?;
                debug!("Reading NAV file {}", path.display());
                let opened = File::open(&path);
                self.line_no = 0;
                match opened {
                    Ok(file) => self.current = Some(BufReader::new(file)),
                    Err(e) => {
                        let err = io::Error::new(
                            e.kind(),
                            format!("Failed to open {}: {e}", path.display()),
                        );
                        self.path = Some(path);
                        return Some(Err(err));
                    }
                }
                self.path = Some(path);
            }
            let Some(reader) = self.current.as_mut() else {
                continue;
            };

            self.buf.clear();
            match reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => self.current = None,
                Ok(_) => {
                    self.line_no += 1;
                    let mut line = String::from_utf8_lossy(&self.buf).into_owned();
                    if line.ends_with('\n') {
                        line.pop();
                        if line.ends_with('\r') {
                            line.pop();
                        }
                    }
                    return Some(Ok(line));
                }
                Err(e) => {
                    self.current = None;
                    return Some(Err(e));
                }
            }
        }
    }
}
