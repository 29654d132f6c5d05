//! Rotating file storage.
//!
//! An archive named `base` is a series of files `base.0`, `base.1`, ...
//! The writer appends to the last file and rolls to a new one once it has
//! reached the roll size; the reader presents all files, in order, as one
//! continuous byte stream. Rolling only happens between two `write` calls,
//! so a record written with a single `write_all` never straddles two files.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{debug, info};

use crate::spage::types::error::{Result, SpageError};

/// Size threshold after which the writer starts a new file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollSize(u64);

impl RollSize {
    pub fn bytes(&self) -> u64 {
        self.0
    }
}

impl Default for RollSize {
    /// One gibibyte.
    fn default() -> Self {
        RollSize(1 << 30)
    }
}

impl From<u64> for RollSize {
    fn from(bytes: u64) -> Self {
        RollSize(bytes)
    }
}

impl fmt::Display for RollSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RollSize {
    type Err = SpageError;

    /// Parses `1024`, `512K`, `64M` or `1G` (binary multiples, case-insensitive).
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || SpageError::InvalidRollSize(s.to_owned());
        let (digits, multiplier) = match s.chars().last().map(|c| c.to_ascii_uppercase()) {
            Some('K') => (&s[..s.len() - 1], 1u64 << 10),
            Some('M') => (&s[..s.len() - 1], 1 << 20),
            Some('G') => (&s[..s.len() - 1], 1 << 30),
            Some(_) => (s, 1),
            None => return Err(invalid()),
        };
        let value: u64 = digits.trim().parse().map_err(|_| invalid())?;
        match value.checked_mul(multiplier) {
            Some(bytes) if bytes > 0 => Ok(RollSize(bytes)),
            _ => Err(invalid()),
        }
    }
}

/// Path of the `index`-th file of the archive `base`.
pub fn segment_path(base: &Path, index: usize) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{}", index));
    PathBuf::from(name)
}

/// Appending writer over an archive's files.
#[derive(Debug)]
pub struct RotatingWriter {
    base: PathBuf,
    roll_size: u64,
    index: usize,
    written: u64,
    file: BufWriter<File>,
}

impl RotatingWriter {
    /// Opens the archive for appending, continuing its last existing file.
    pub fn open(base: impl AsRef<Path>, roll_size: RollSize) -> Result<Self> {
        let base = base.as_ref().to_path_buf();
        let mut index = 0;
        while segment_path(&base, index + 1).exists() {
            index += 1;
        }
        let path = segment_path(&base, index);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();
        info!("Opened {} for writing ({} bytes present)", path.display(), written);

        Ok(Self {
            base,
            roll_size: roll_size.bytes(),
            index,
            written,
            file: BufWriter::new(file),
        })
    }

    /// Index of the file currently written to.
    pub fn index(&self) -> usize {
        self.index
    }

    fn roll(&mut self) -> io::Result<()> {
        self.file.flush()?;
        self.index += 1;
        let path = segment_path(&self.base, self.index);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!("Rolled over to {}", path.display());
        self.file = BufWriter::new(file);
        self.written = 0;
        Ok(())
    }

    /// Flushes buffered bytes and closes the current file.
    pub fn close(mut self) -> Result<()> {
        self.file.flush()?;
        info!("Closed {}", segment_path(&self.base, self.index).display());
        Ok(())
    }
}

impl Write for RotatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written >= self.roll_size {
            self.roll()?;
        }
        self.file.write_all(buf)?;
        self.written += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Sequential reader over an archive's files.
#[derive(Debug)]
pub struct RotatingReader {
    base: PathBuf,
    index: usize,
    file: Option<File>,
}

impl RotatingReader {
    /// Opens the first file of the archive.
    ///
    /// # Errors
    /// Returns an I/O error if `base.0` cannot be opened.
    pub fn open(base: impl AsRef<Path>) -> Result<Self> {
        let base = base.as_ref().to_path_buf();
        let path = segment_path(&base, 0);
        let file = File::open(&path)?;
        info!("Opened {} for reading", path.display());
        Ok(Self {
            base,
            index: 0,
            file: Some(file),
        })
    }

    /// Moves to the next file. Returns `false` when there is none.
    fn advance(&mut self) -> io::Result<bool> {
        let path = segment_path(&self.base, self.index + 1);
        match File::open(&path) {
            Ok(file) => {
                debug!("Continuing with {}", path.display());
                self.index += 1;
                self.file = Some(file);
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.file = None;
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

impl Read for RotatingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            let Some(file) = self.file.as_mut() else {
                return Ok(0);
            };
            let n = file.read(buf)?;
            if n > 0 || !self.advance()? {
                return Ok(n);
            }
        }
    }
}
