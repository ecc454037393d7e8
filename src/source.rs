use crate::error::{AnalyzerError, Result};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// A read-only byte source that supports concurrent positioned reads.
///
/// Implementations must not keep a shared cursor: every worker passes its
/// own offset, so one handle can be read from many threads at once.
pub trait ByteSource: Sync {
    /// Total size in bytes
    fn size(&self) -> io::Result<u64>;

    /// Read into `buf` starting at `offset`, returning the number of bytes read
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize>;
}

impl ByteSource for File {
    fn size(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    #[cfg(unix)]
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        std::os::unix::fs::FileExt::read_at(self, buf, offset)
    }

    #[cfg(windows)]
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        std::os::windows::fs::FileExt::seek_read(self, buf, offset)
    }
}

impl ByteSource for [u8] {
    fn size(&self) -> io::Result<u64> {
        Ok(self.len() as u64)
    }

    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        let start = usize::try_from(offset)
            .unwrap_or(usize::MAX)
            .min(self.len());
        let available = &self[start..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        Ok(n)
    }
}

impl ByteSource for Vec<u8> {
    fn size(&self) -> io::Result<u64> {
        self.as_slice().size()
    }

    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        self.as_slice().read_at(buf, offset)
    }
}

/// An opened input file together with the path it came from
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    file: File,
}

impl FileSource {
    /// Open `path` read-only
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| AnalyzerError::SourceUnavailable {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the file, failing with `SourceUnavailable` if it cannot be sized
    pub fn file_size(&self) -> Result<u64> {
        self.file
            .size()
            .map_err(|source| AnalyzerError::SourceUnavailable {
                path: self.path.clone(),
                source,
            })
    }
}

impl ByteSource for FileSource {
    fn size(&self) -> io::Result<u64> {
        self.file.size()
    }

    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        ByteSource::read_at(&self.file, buf, offset)
    }
}

/// Read up to `buf.len()` bytes at `offset`, stopping early only at end of input.
///
/// Interrupted reads are resumed. Returns the number of bytes filled; a value
/// below `buf.len()` is a short read.
pub fn read_full_at<S: ByteSource + ?Sized>(
    source: &S,
    buf: &mut [u8],
    offset: u64,
) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read_at(&mut buf[filled..], offset + filled as u64) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_slice_read_at() {
        let data = b"hello world".to_vec();
        let mut buf = [0u8; 5];
        assert_eq!(data.read_at(&mut buf, 6).unwrap(), 5);
        assert_eq!(&buf, b"world");
    }

    #[test]
    fn test_slice_read_past_end() {
        let data = b"abc".to_vec();
        let mut buf = [0u8; 8];
        assert_eq!(data.read_at(&mut buf, 2).unwrap(), 1);
        assert_eq!(data.read_at(&mut buf, 10).unwrap(), 0);
    }

    #[test]
    fn test_read_full_reports_short_read() {
        let data = b"0123456789".to_vec();
        let mut buf = [0u8; 6];
        assert_eq!(read_full_at(&data, &mut buf, 7).unwrap(), 3);
        assert_eq!(&buf[..3], b"789");
    }

    #[test]
    fn test_file_source_positioned_reads() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"segment one|segment two").unwrap();
        tmp.flush().unwrap();

        let source = FileSource::open(tmp.path()).unwrap();
        assert_eq!(source.file_size().unwrap(), 23);
        assert_eq!(source.path(), tmp.path());

        let mut buf = [0u8; 11];
        assert_eq!(read_full_at(&source, &mut buf, 12).unwrap(), 11);
        assert_eq!(&buf, b"segment two");
        assert_eq!(read_full_at(&source, &mut buf, 0).unwrap(), 11);
        assert_eq!(&buf, b"segment one");
    }

    /// Interrupts every other call and returns at most two bytes per read
    struct InterruptingSource {
        data: Vec<u8>,
        calls: std::sync::atomic::AtomicUsize,
    }

    impl ByteSource for InterruptingSource {
        fn size(&self) -> io::Result<u64> {
            Ok(self.data.len() as u64)
        }

        fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
            let call = self.calls.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            if call % 2 == 0 {
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            let len = buf.len().min(2);
            self.data.read_at(&mut buf[..len], offset)
        }
    }

    #[test]
    fn test_read_full_resumes_after_interrupt() {
        let source = InterruptingSource {
            data: b"interrupted read".to_vec(),
            calls: std::sync::atomic::AtomicUsize::new(0),
        };
        let mut buf = [0u8; 11];
        assert_eq!(read_full_at(&source, &mut buf, 0).unwrap(), 11);
        assert_eq!(&buf, b"interrupted");
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let result = FileSource::open("/nonexistent/segfreq/input.txt");
        assert!(matches!(
            result,
            Err(AnalyzerError::SourceUnavailable { .. })
        ));
    }
}
