use super::{Error, Result};
use bytes::Bytes;
use std::fmt;

const LENGTH_SIZE: usize = 4;
const MAX_LINE_SIZE: usize = 65520;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PktLine {
    Data(Vec<u8>),
    Flush,
}

impl PktLine {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self::Data(bytes)
    }

    pub fn flush() -> Self {
        Self::Flush
    }

    /// Length prefix value; counts the 4 prefix bytes for data lines.
    pub fn size(&self) -> usize {
        match self {
            Self::Data(bytes) => bytes.len() + LENGTH_SIZE,
            Self::Flush => 0,
        }
    }

    pub fn content(&self) -> Option<&[u8]> {
        match self {
            Self::Data(bytes) => Some(bytes),
            Self::Flush => None,
        }
    }

    pub fn is_comment(&self) -> bool {
        self.content().is_some_and(|bytes| bytes.first() == Some(&b'#'))
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = format!("{:04x}", self.size()).into_bytes();
        if let Self::Data(bytes) = self {
            buf.extend_from_slice(bytes);
        }
        buf
    }
}

impl From<&[u8]> for PktLine {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes.into())
    }
}

impl From<&str> for PktLine {
    fn from(value: &str) -> Self {
        Self::new(value.as_bytes().into())
    }
}

impl fmt::Display for PktLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04x}{}",
            self.size(),
            String::from_utf8_lossy(self.content().unwrap_or_default())
        )
    }
}

/// Incremental packet-line reader over a growing byte buffer.
#[derive(Debug, Clone, Default)]
pub struct PktLines {
    buf: Vec<u8>,
    position: usize,
}

impl From<Bytes> for PktLines {
    fn from(value: Bytes) -> Self {
        Self::new(value.to_vec())
    }
}

impl PktLines {
    pub fn new(buf: Vec<u8>) -> Self {
        Self { buf, position: 0 }
    }

    pub fn append(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn remaining(&self) -> &[u8] {
        &self.buf[self.position..]
    }

    pub fn into_remaining(mut self) -> Vec<u8> {
        self.buf.split_off(self.position)
    }

    /// `Ok(None)` when the buffer does not yet hold a complete line.
    pub fn next_line(&mut self) -> Result<Option<PktLine>> {
        let remaining = self.remaining();
        if remaining.len() < LENGTH_SIZE {
            return Ok(None);
        }

        let line_len = line_size(&remaining[..LENGTH_SIZE])?;
        if line_len == 0 {
            self.position += LENGTH_SIZE;
            return Ok(Some(PktLine::flush()));
        }
        if !(LENGTH_SIZE..=MAX_LINE_SIZE).contains(&line_len) {
            return Err(Error::Protocol(format!("invalid pkt-line length {line_len}")));
        }
        if remaining.len() < line_len {
            return Ok(None);
        }

        let line = PktLine::new(remaining[LENGTH_SIZE..line_len].to_vec());
        self.position += line_len;
        Ok(Some(line))
    }
}

/// Iterates over a buffer that already holds the whole response, so a
/// trailing partial line is an error rather than something to wait for.
impl Iterator for PktLines {
    type Item = Result<PktLine>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_line() {
            Ok(None) if !self.remaining().is_empty() => {
                let err = Error::Protocol(format!(
                    "response ends inside a pkt-line: {:?}",
                    String::from_utf8_lossy(self.remaining())
                ));
                self.position = self.buf.len();
                Some(Err(err))
            }
            Err(err) => {
                self.position = self.buf.len();
                Some(Err(err))
            }
            line => line.transpose(),
        }
    }
}

fn line_size(buf: &[u8]) -> Result<usize> {
    std::str::from_utf8(buf)
        .ok()
        .and_then(|len_str| usize::from_str_radix(len_str, 16).ok())
        .ok_or_else(|| {
            Error::Protocol(format!(
                "invalid pkt-line length prefix {:?}",
                String::from_utf8_lossy(buf)
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_prints_to_pkt_line() {
        let line = PktLine::new(b"foobar\n".into());
        let print = format!("{line}");
        assert_eq!(print, "000bfoobar\n");
    }

    #[test]
    fn it_encodes_length_including_prefix() {
        assert_eq!(PktLine::from("abcd").encode(), b"0008abcd".to_vec());
        assert_eq!(PktLine::flush().encode(), b"0000".to_vec());
    }

    #[test]
    fn it_creats_flush_line() {
        let line = PktLine::flush();
        let print = format!("{line}");
        assert_eq!(print, "0000");
    }

    #[test]
    fn it_parses_flush_without_payload() {
        let mut lines = PktLines::new(b"00000008abcd".to_vec());
        assert_eq!(lines.next_line().unwrap(), Some(PktLine::flush()));
        assert_eq!(lines.remaining(), b"0008abcd");
        assert_eq!(lines.next_line().unwrap(), Some(PktLine::from("abcd")));
        assert_eq!(lines.next_line().unwrap(), None);
    }

    #[test]
    fn it_waits_for_complete_line() {
        let mut lines = PktLines::new(b"000bfoo".to_vec());
        assert_eq!(lines.next_line().unwrap(), None);
        lines.append(b"bar\nPACK");
        assert_eq!(lines.next_line().unwrap(), Some(PktLine::from("foobar\n")));
        assert_eq!(lines.into_remaining(), b"PACK".to_vec());
    }

    #[test]
    fn it_rejects_invalid_length() {
        let mut lines = PktLines::new(b"zzzz".to_vec());
        assert!(matches!(lines.next_line(), Err(Error::Protocol(_))));

        let mut lines = PktLines::new(b"0002".to_vec());
        assert!(matches!(lines.next_line(), Err(Error::Protocol(_))));
    }

    #[test]
    fn it_detects_comment_lines() {
        assert!(PktLine::from("# service=git-upload-pack\n").is_comment());
        assert!(!PktLine::from("3b10 HEAD").is_comment());
        assert!(!PktLine::flush().is_comment());
    }

    #[test]
    fn it_retrieves_pkt_lines() {
        let bytes = b"00ab3b1031798a00fdf9b574b5857b1721bc4b0e6bac HEAD\x00multi_ack thin-pack side-band side-band-64k ofs-delta shallow no-progress include-tag multi_ack_detailed agent=git/1.8.1\n003f3b1031798a00fdf9b574b5857b1721bc4b0e6bac refs/heads/master\n0048c4bf7555e2eb4a2b55c7404c742e7e95017ec850 refs/remotes/origin/master\n0000".to_vec();
        let mut lines = PktLines::new(bytes);

        let line = lines.next().unwrap().unwrap();
        assert_eq!(line, PktLine::new(b"3b1031798a00fdf9b574b5857b1721bc4b0e6bac HEAD\x00multi_ack thin-pack side-band side-band-64k ofs-delta shallow no-progress include-tag multi_ack_detailed agent=git/1.8.1\n".into()));

        let line = lines.next().unwrap().unwrap();
        assert_eq!(
            line,
            PktLine::new(b"3b1031798a00fdf9b574b5857b1721bc4b0e6bac refs/heads/master\n".into())
        );

        let line = lines.next().unwrap().unwrap();
        assert_eq!(
            line,
            PktLine::new(
                b"c4bf7555e2eb4a2b55c7404c742e7e95017ec850 refs/remotes/origin/master\n".into()
            )
        );

        let line = lines.next().unwrap().unwrap();
        assert_eq!(line, PktLine::flush());

        assert!(lines.next().is_none());
    }

    #[test]
    fn it_rejects_truncated_response() {
        let mut lines = PktLines::new(b"0008abcd000bfoo".to_vec());
        assert_eq!(lines.next().unwrap().unwrap(), PktLine::from("abcd"));
        assert!(matches!(lines.next(), Some(Err(Error::Protocol(_)))));
        assert!(lines.next().is_none());

        let mut lines = PktLines::new(b"00".to_vec());
        assert!(matches!(lines.next(), Some(Err(Error::Protocol(_)))));
    }
}
