//! Line-delimited `data: {json}` framing for the streaming transport.
//!
//! The decoder buffers arbitrary byte chunks, so a record split across
//! network reads is reassembled before it is parsed. Framing rules:
//!
//! - lines end in `\n`, an optional trailing `\r` is dropped
//! - `data: ` and `data:` prefixes carry payloads
//! - blank lines, `:` comments and other SSE fields are skipped
//! - a `[DONE]` payload ends the stream; later bytes are discarded
//! - a line longer than [`MAX_LINE_BYTES`] is dropped whole

use serde_json::Value;
use tracing::debug;

use super::response::AgentResponse;

/// Payload that terminates the stream.
pub const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SseLine<'a> {
    Data(&'a str),
    Done,
    Skip,
}

/// Classify a single line (without its line terminator).
pub fn classify_line(line: &str) -> SseLine<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with(':') {
        return SseLine::Skip;
    }
    let Some(data) = trimmed
        .strip_prefix("data: ")
        .or_else(|| trimmed.strip_prefix("data:"))
    else {
        return SseLine::Skip;
    };
    let data = data.trim();
    if data == DONE_SENTINEL {
        SseLine::Done
    } else if data.is_empty() {
        SseLine::Skip
    } else {
        SseLine::Data(data)
    }
}

/// Longest line the decoder buffers before dropping it.
pub const MAX_LINE_BYTES: usize = 1 << 20;

/// Incremental byte-to-payload decoder.
#[derive(Debug)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    /// Bytes of `buffer` already searched for `\n`.
    scanned: usize,
    /// Skipping the rest of an oversized line.
    discarding: bool,
    max_line: usize,
    done: bool,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::with_max_line(MAX_LINE_BYTES)
    }
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            buffer: Vec::new(),
            scanned: 0,
            discarding: false,
            max_line,
            done: false,
        }
    }

    /// Whether the terminator has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Append bytes and return every complete payload they finish.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        if self.done {
            return Vec::new();
        }
        self.buffer.extend_from_slice(bytes);

        let mut payloads = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buffer[self.scanned..].iter().position(|&b| b == b'\n') {
            let end = self.scanned + offset;
            let line = strip_cr(&self.buffer[start..end]);
            if self.discarding {
                self.discarding = false;
            } else if take_line(line, &mut payloads) {
                self.done = true;
                self.buffer.clear();
                self.scanned = 0;
                return payloads;
            }
            start = end + 1;
            self.scanned = start;
        }
        self.scanned = self.buffer.len();
        self.buffer.drain(..start);
        self.scanned -= start;

        if self.buffer.len() > self.max_line {
            debug!(bytes = self.buffer.len(), "dropping oversized stream line");
            self.buffer.clear();
            self.scanned = 0;
            self.discarding = true;
        }
        payloads
    }

    /// Flush a trailing line that arrived without a terminator.
    pub fn finish(&mut self) -> Vec<String> {
        let mut payloads = Vec::new();
        if !self.done
            && !self.discarding
            && !self.buffer.is_empty()
            && take_line(strip_cr(&self.buffer), &mut payloads)
        {
            self.done = true;
        }
        self.buffer.clear();
        self.scanned = 0;
        payloads
    }
}

fn strip_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Returns `true` when the line was the terminator.
fn take_line(line: &[u8], payloads: &mut Vec<String>) -> bool {
    let Ok(line) = std::str::from_utf8(line) else {
        debug!("skipping non-UTF-8 stream line");
        return false;
    };
    match classify_line(line) {
        SseLine::Data(data) => {
            payloads.push(data.to_string());
            false
        }
        SseLine::Done => true,
        SseLine::Skip => false,
    }
}

/// Streaming fold: bytes in, [`AgentResponse`] out.
#[derive(Debug, Default)]
pub struct AgentStream {
    decoder: SseDecoder,
    response: AgentResponse,
}

impl AgentStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next chunk of the response body.
    pub fn feed(&mut self, bytes: &[u8]) {
        for payload in self.decoder.feed(bytes) {
            self.apply_payload(&payload);
        }
    }

    /// Whether the stream terminator has arrived; callers may stop reading.
    pub fn is_done(&self) -> bool {
        self.decoder.is_done()
    }

    /// The response folded so far.
    pub fn response(&self) -> &AgentResponse {
        &self.response
    }

    pub fn finish(mut self) -> AgentResponse {
        for payload in self.decoder.finish() {
            self.apply_payload(&payload);
        }
        self.response
    }

    fn apply_payload(&mut self, payload: &str) {
        match serde_json::from_str::<Value>(payload) {
            Ok(raw) => {
                self.response.push_record(raw);
            }
            Err(e) => {
                debug!(error = %e, "skipping undecodable stream record");
            }
        }
    }
}

/// Fold a complete stream body.
pub fn fold_sse_text(body: &str) -> AgentResponse {
    let mut stream = AgentStream::new();
    stream.feed(body.as_bytes());
    stream.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_line() {
        assert_eq!(classify_line("data: {\"a\":1}"), SseLine::Data("{\"a\":1}"));
        assert_eq!(classify_line("data:{\"a\":1}"), SseLine::Data("{\"a\":1}"));
        assert_eq!(classify_line("data: [DONE]"), SseLine::Done);
        assert_eq!(classify_line("data: "), SseLine::Skip);
        assert_eq!(classify_line(""), SseLine::Skip);
        assert_eq!(classify_line(": keep-alive"), SseLine::Skip);
        assert_eq!(classify_line("event: response.text.delta"), SseLine::Skip);
    }

    #[test]
    fn test_decoder_reassembles_split_lines() {
        let mut dec = SseDecoder::new();
        assert!(dec.feed(b"data: {\"ev").is_empty());
        let out = dec.feed(b"ent\":\"x\"}\r\ndata: {\"event\":\"y\"}\n");
        assert_eq!(out, vec!["{\"event\":\"x\"}", "{\"event\":\"y\"}"]);
    }

    #[test]
    fn test_decoder_stops_at_done() {
        let mut dec = SseDecoder::new();
        let out = dec.feed(b"data: {\"event\":\"a\"}\ndata: [DONE]\ndata: {\"event\":\"b\"}\n");
        assert_eq!(out, vec!["{\"event\":\"a\"}"]);
        assert!(dec.is_done());
        assert!(dec.feed(b"data: {\"event\":\"c\"}\n").is_empty());
        assert!(dec.finish().is_empty());
    }

    #[test]
    fn test_decoder_drops_oversized_line() {
        let mut dec = SseDecoder::with_max_line(16);
        assert!(dec.feed(b"data: {\"event\":\"aaaa").is_empty());
        assert!(dec.feed(b"aaaaaaaaaaaaaaaa").is_empty());
        assert!(dec.feed(b"aaaa\"}\ndata: {\"ok\":1}").is_empty());
        assert_eq!(dec.feed(b"\n"), vec!["{\"ok\":1}"]);
        assert!(dec.finish().is_empty());
    }

    #[test]
    fn test_decoder_long_line_in_small_reads() {
        let payload = format!("{{\"text\":\"{}\"}}", "x".repeat(4096));
        let line = format!("data: {}\n", payload);
        let mut dec = SseDecoder::new();
        let mut out = Vec::new();
        for piece in line.as_bytes().chunks(7) {
            out.extend(dec.feed(piece));
        }
        assert_eq!(out, vec![payload]);
    }

    #[test]
    fn test_decoder_flushes_trailing_line() {
        let mut dec = SseDecoder::new();
        assert!(dec.feed(b"data: {\"event\":\"tail\"}").is_empty());
        assert_eq!(dec.finish(), vec!["{\"event\":\"tail\"}"]);
    }

    #[test]
    fn test_decoder_skips_invalid_utf8() {
        let mut dec = SseDecoder::new();
        let mut bytes = b"data: \xff\xfe\n".to_vec();
        bytes.extend_from_slice(b"data: {}\n");
        assert_eq!(dec.feed(&bytes), vec!["{}"]);
    }

    #[test]
    fn test_stream_skips_malformed_record() {
        let body = concat!(
            "data: {\"event\":\"response.text.delta\",\"data\":{\"text\":\"Hel\"}}\n",
            "data: {\"event\":\"response.text.delta\",\"data\":{\"te\n",
            "data: {\"event\":\"response.text.delta\",\"data\":{\"text\":\"lo\"}}\n",
            "data: [DONE]\n",
        );
        let r = fold_sse_text(body);
        assert_eq!(r.text, "Hello");
        assert_eq!(r.events.len(), 2);
    }

    #[test]
    fn test_stream_fed_byte_by_byte() {
        let body = concat!(
            "event: response\n",
            "data: {\"event\":\"response\",\"data\":{\"content\":[{\"thinking\":{\"text\":\"T\"}}]}}\n\n",
            "data: {\"event\":\"response.tool_use\",\"data\":{\"name\":\"SalesAnalyst\",",
            "\"type\":\"cortex_analyst_text_to_sql\",\"input\":{\"sql\":\"SELECT 1\"}}}\n\n",
            "data: {\"event\":\"response.text.delta\",\"data\":{\"text\":\"ok\"}}\n\n",
            "data: [DONE]\n\n",
        );
        let mut stream = AgentStream::new();
        for b in body.as_bytes() {
            stream.feed(std::slice::from_ref(b));
        }
        assert!(stream.is_done());
        let r = stream.finish();
        assert_eq!(r.thinking, "T");
        assert_eq!(r.sql.as_deref(), Some("SELECT 1"));
        assert_eq!(r.tool_name.as_deref(), Some("SalesAnalyst"));
        assert_eq!(r.text, "ok");
    }

    #[test]
    fn test_stream_without_terminator() {
        let r = fold_sse_text("data: {\"event\":\"response.text\",\"data\":{\"text\":\"end\"}}");
        assert_eq!(r.text, "end");
    }
}
