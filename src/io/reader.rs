use crate::core::{Frame, FrameError};
use anyhow::{Context, Result};
use memmap2::Mmap;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Streams fixed-size frames out of any byte source.
///
/// Ends cleanly at EOF on a frame boundary. A partial trailing frame or a
/// read failure yields one error and then ends the stream.
pub struct FrameReader<R> {
    inner: R,
    frame_len: usize,
    buf: Vec<u8>,
    done: bool,
}

impl FrameReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>, frame_len: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).context(format!("Failed to open log {:?}", path))?;
        Ok(Self::new(BufReader::new(file), frame_len))
    }
}

impl<R: Read> FrameReader<R> {
    pub fn new(inner: R, frame_len: usize) -> Self {
        Self {
            inner,
            frame_len,
            buf: vec![0u8; Frame::encoded_len(frame_len)],
            done: false,
        }
    }

    /// Fill `buf` as far as the source allows, returning bytes read
    fn fill(&mut self) -> io::Result<usize> {
        let mut filled = 0;
        while filled < self.buf.len() {
            match self.inner.read(&mut self.buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

impl<R: Read> Iterator for FrameReader<R> {
    type Item = Result<Frame, FrameError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let filled = match self.fill() {
            Ok(n) => n,
            Err(e) => {
                self.done = true;
                return Some(Err(FrameError::Io(e.kind())));
            }
        };

        if filled == 0 {
            self.done = true;
            return None;
        }
        if filled < self.buf.len() {
            self.done = true;
        }
        Some(Frame::decode(&self.buf[..filled], self.frame_len))
    }
}

/// A completed log mapped read-only into memory
pub struct MappedLog {
    // zero-length files cannot be mapped
    mmap: Option<Mmap>,
    frame_len: usize,
}

impl MappedLog {
    pub fn open(path: impl AsRef<Path>, frame_len: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).context(format!("Failed to open log {:?}", path))?;
        let len = file
            .metadata()
            .context(format!("Failed to stat log {:?}", path))?
            .len();

        let mmap = if len == 0 {
            None
        } else {
            // SAFETY: the log is complete and not written while mapped
            Some(unsafe { Mmap::map(&file) }.context(format!("Failed to map log {:?}", path))?)
        };

        Ok(Self { mmap, frame_len })
    }

    pub fn bytes(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or(&[])
    }

    /// Number of complete frames in the log
    pub fn frame_count(&self) -> usize {
        self.bytes().len() / Frame::encoded_len(self.frame_len)
    }

    pub fn has_partial_tail(&self) -> bool {
        self.bytes().len() % Frame::encoded_len(self.frame_len) != 0
    }

    pub fn frames(&self) -> impl Iterator<Item = Result<Frame, FrameError>> + '_ {
        let frame_len = self.frame_len;
        self.bytes()
            .chunks(Frame::encoded_len(frame_len))
            .map(move |chunk| Frame::decode(chunk, frame_len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ChannelType, Label, Xyz};
    use std::io::Cursor;

    fn frame(timestamp: u8) -> Frame {
        Frame::new(
            timestamp,
            Label::compose(0, 1, ChannelType::Gyroscope),
            vec![Xyz::new(1, 2, 3), Xyz::new(-4, -5, -6)],
        )
    }

    #[test]
    fn test_reads_consecutive_frames() {
        let mut bytes = frame(10).encode();
        bytes.extend(frame(20).encode());

        let frames: Vec<_> = FrameReader::new(Cursor::new(bytes), 2).collect();
        assert_eq!(frames, vec![Ok(frame(10)), Ok(frame(20))]);
    }

    #[test]
    fn test_partial_tail_reported_once() {
        let mut bytes = frame(10).encode();
        bytes.extend_from_slice(&[1, 2, 3]);

        let mut reader = FrameReader::new(Cursor::new(bytes), 2);
        assert_eq!(reader.next(), Some(Ok(frame(10))));
        assert_eq!(
            reader.next(),
            Some(Err(FrameError::Truncated { expected: 14, actual: 3 }))
        );
        assert_eq!(reader.next(), None);
    }

    #[test]
    fn test_empty_source() {
        let mut reader = FrameReader::new(Cursor::new(Vec::new()), 85);
        assert!(reader.next().is_none());
    }
}
