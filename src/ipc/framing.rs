//! Message framing for the driver stream.
//!
//! Two framings are supported: newline-delimited text (the default, handy
//! for replay files) and a 4-byte big-endian length prefix followed by the
//! payload.

use tracing::error;

/// Maximum message payload size (1 MiB).
pub const MAX_MESSAGE_SIZE: u32 = 1_048_576;

/// How messages are delimited on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Framing {
    /// One s-expression per line.
    #[default]
    Lines,
    /// u32 big-endian length, then payload.
    LengthPrefixed,
}

/// Encode one outgoing payload.
pub fn encode(framing: Framing, payload: &str) -> Vec<u8> {
    let bytes = payload.as_bytes();
    let mut out = Vec::with_capacity(bytes.len() + 4);
    match framing {
        Framing::Lines => {
            out.extend_from_slice(bytes);
            out.push(b'\n');
        }
        Framing::LengthPrefixed => {
            let len = bytes.len() as u32;
            out.extend_from_slice(&len.to_be_bytes());
            out.extend_from_slice(bytes);
        }
    }
    out
}

/// Accumulates raw input and yields complete messages.
#[derive(Debug)]
pub struct MessageBuffer {
    framing: Framing,
    read_buf: Vec<u8>,
    /// Dropping the rest of an oversize line until its newline.
    discarding: bool,
}

impl MessageBuffer {
    pub fn new(framing: Framing) -> Self {
        Self {
            framing,
            read_buf: Vec::with_capacity(4096),
            discarding: false,
        }
    }

    /// Append bytes read from the input.
    pub fn push(&mut self, bytes: &[u8]) {
        self.read_buf.extend_from_slice(bytes);
    }

    /// Bytes buffered but not yet part of a complete message.
    pub fn pending(&self) -> usize {
        self.read_buf.len()
    }

    /// Try to extract complete messages from the read buffer.
    pub fn extract_messages(&mut self) -> Vec<String> {
        match self.framing {
            Framing::Lines => self.extract_lines(),
            Framing::LengthPrefixed => self.extract_prefixed(),
        }
    }

    /// Flush a trailing unterminated line at end of input.
    pub fn finish(&mut self) -> Option<String> {
        if self.discarding {
            self.discarding = false;
            self.read_buf.clear();
            return None;
        }
        if self.framing != Framing::Lines || self.read_buf.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&self.read_buf).trim().to_string();
        self.read_buf.clear();
        if line.is_empty() {
            None
        } else {
            Some(line)
        }
    }

    fn extract_lines(&mut self) -> Vec<String> {
        let mut messages = Vec::new();
        while let Some(pos) = self.read_buf.iter().position(|&b| b == b'\n') {
            if self.discarding {
                self.discarding = false;
                self.read_buf.drain(..=pos);
                continue;
            }
            let line = String::from_utf8_lossy(&self.read_buf[..pos]).trim().to_string();
            self.read_buf.drain(..=pos);
            if !line.is_empty() {
                messages.push(line);
            }
        }
        if self.discarding {
            self.read_buf.clear();
        } else if self.read_buf.len() > MAX_MESSAGE_SIZE as usize {
            error!(len = self.read_buf.len(), "line exceeds maximum size");
            self.read_buf.clear();
            self.discarding = true;
        }
        messages
    }

    fn extract_prefixed(&mut self) -> Vec<String> {
        let mut messages = Vec::new();
        loop {
            if self.read_buf.len() < 4 {
                break;
            }
            let len = u32::from_be_bytes([
                self.read_buf[0],
                self.read_buf[1],
                self.read_buf[2],
                self.read_buf[3],
            ]);
            if len > MAX_MESSAGE_SIZE {
                error!(len, "message exceeds maximum size");
                self.read_buf.clear();
                break;
            }
            let total = 4 + len as usize;
            if self.read_buf.len() < total {
                break;
            }
            let payload = String::from_utf8_lossy(&self.read_buf[4..total]).to_string();
            self.read_buf.drain(..total);
            messages.push(payload);
        }
        messages
    }
}
