//! Framing for the `POST /start_game` response body.
//!
//! The server writes one JSON object per simulated day and may or may not put a
//! newline between them, so frames are cut at JSON value boundaries rather than at
//! read boundaries. Partial values stay buffered until the rest arrives.

use bytes::{Buf, BytesMut};
use furrow_protocol::GameTick;
use futures_util::Stream;
use std::io;
use std::pin::Pin;
use tokio_util::codec::{Decoder, FramedRead};
use tokio_util::io::StreamReader;

pub const DEFAULT_MAX_FRAME_BYTES: usize = 1 << 20;

pub type TickStream = Pin<Box<dyn Stream<Item = io::Result<Frame>> + Send>>;

#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Tick(GameTick),
    /// Bytes that could not be turned into a tick. The session skips these.
    Malformed(MalformedFrame),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedFrame {
    pub reason: String,
    pub discarded: usize,
}

#[derive(Debug, Clone)]
pub struct TickDecoder {
    max_frame_bytes: usize,
    oversized: Option<Oversized>,
}

impl TickDecoder {
    pub fn new(max_frame_bytes: usize) -> Self {
        Self {
            max_frame_bytes: max_frame_bytes.max(1),
            oversized: None,
        }
    }

    pub fn max_frame_bytes(&self) -> usize {
        self.max_frame_bytes
    }

    fn too_large(&self, discarded: usize) -> Frame {
        Frame::Malformed(MalformedFrame {
            reason: format!("frame exceeds {} bytes", self.max_frame_bytes),
            discarded,
        })
    }
}

/// Skips the rest of a value that outgrew the frame limit without buffering it.
#[derive(Debug, Clone, Default)]
struct Oversized {
    depth: usize,
    in_string: bool,
    escaped: bool,
    discarded: usize,
}

impl Oversized {
    /// Returns how many leading bytes of `buf` belong to the value and whether it ended.
    fn scan(&mut self, buf: &[u8]) -> (usize, bool) {
        for (i, &b) in buf.iter().enumerate() {
            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if b == b'\\' {
                    self.escaped = true;
                } else if b == b'"' {
                    self.in_string = false;
                    if self.depth == 0 {
                        return (i + 1, true);
                    }
                }
                continue;
            }
            match b {
                b'"' => self.in_string = true,
                b'{' | b'[' => self.depth += 1,
                b'}' | b']' => {
                    self.depth = self.depth.saturating_sub(1);
                    if self.depth == 0 {
                        return (i + 1, true);
                    }
                }
                // A bare scalar ends at whitespace.
                _ if self.depth == 0 && b.is_ascii_whitespace() => return (i, true),
                _ => {}
            }
        }
        (buf.len(), false)
    }
}

impl Default for TickDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_BYTES)
    }
}

impl Decoder for TickDecoder {
    type Item = Frame;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, io::Error> {
        if let Some(skip) = self.oversized.as_mut() {
            let (n, done) = skip.scan(src);
            src.advance(n);
            skip.discarded += n;
            if !done {
                return Ok(None);
            }
            let discarded = skip.discarded;
            self.oversized = None;
            return Ok(Some(self.too_large(discarded)));
        }

        skip_whitespace(src);
        if src.is_empty() {
            return Ok(None);
        }

        let (next, used) = {
            let mut values =
                serde_json::Deserializer::from_slice(&src[..]).into_iter::<serde_json::Value>();
            let next = values.next();
            (next, values.byte_offset())
        };

        match next {
            Some(Ok(value)) => {
                src.advance(used);
                if used > self.max_frame_bytes {
                    return Ok(Some(self.too_large(used)));
                }
                let frame = match serde_json::from_value::<GameTick>(value) {
                    Ok(tick) => Frame::Tick(tick),
                    Err(err) => Frame::Malformed(MalformedFrame {
                        reason: format!("not a game tick: {err}"),
                        discarded: used,
                    }),
                };
                Ok(Some(frame))
            }
            Some(Err(err)) if err.is_eof() => {
                if src.len() > self.max_frame_bytes {
                    self.oversized = Some(Oversized::default());
                    return self.decode(src);
                }
                Ok(None)
            }
            Some(Err(err)) => {
                let discarded = resync_point(src);
                src.advance(discarded);
                Ok(Some(Frame::Malformed(MalformedFrame {
                    reason: format!("invalid json: {err}"),
                    discarded,
                })))
            }
            None => Ok(None),
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, io::Error> {
        if let Some(frame) = self.decode(buf)? {
            return Ok(Some(frame));
        }
        if let Some(skip) = self.oversized.take() {
            let discarded = skip.discarded + buf.len();
            buf.clear();
            return Ok(Some(self.too_large(discarded)));
        }
        skip_whitespace(buf);
        if buf.is_empty() {
            return Ok(None);
        }
        let discarded = buf.len();
        buf.clear();
        Ok(Some(Frame::Malformed(MalformedFrame {
            reason: "stream ended inside a tick".to_string(),
            discarded,
        })))
    }
}

fn skip_whitespace(buf: &mut BytesMut) {
    let n = buf
        .iter()
        .take_while(|b| b.is_ascii_whitespace())
        .count();
    buf.advance(n);
}

// Next newline if there is one, otherwise the next object start.
fn resync_point(buf: &[u8]) -> usize {
    if let Some(nl) = buf.iter().position(|&b| b == b'\n') {
        return nl + 1;
    }
    buf.iter()
        .skip(1)
        .position(|&b| b == b'{')
        .map(|p| p + 1)
        .unwrap_or(buf.len())
}

/// Frames a raw body stream into ticks.
pub fn frame_ticks<S, B>(chunks: S, decoder: TickDecoder) -> TickStream
where
    S: Stream<Item = io::Result<B>> + Send + 'static,
    B: Buf + Send + 'static,
{
    Box::pin(FramedRead::new(StreamReader::new(chunks), decoder))
}
