//! Minimal incremental server-sent-events parser.
//!
//! The runs endpoint streams checkpoints as SSE frames. Frames are separated
//! by a blank line; each frame carries `event:` and one or more `data:`
//! lines. The parser accepts arbitrary chunk boundaries, including ones that
//! split a UTF-8 sequence.

/// One parsed SSE frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SseEvent {
    pub event: Option<String>,
    pub data: String,
}

#[derive(Debug, Default)]
pub(crate) struct SseParser {
    buffer: Vec<u8>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning every frame completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        loop {
            let Some(split) = find_frame_end(&self.buffer) else {
                break;
            };
            let frame: Vec<u8> = self.buffer.drain(..split.end).collect();
            let frame = &frame[..split.start];
            if let Some(event) = parse_frame(&String::from_utf8_lossy(frame)) {
                events.push(event);
            }
        }
        events
    }
}

struct FrameEnd {
    /// Length of the frame body.
    start: usize,
    /// Offset past the separator.
    end: usize,
}

/// Find the first `\n\n` or `\r\n\r\n` separator.
fn find_frame_end(buffer: &[u8]) -> Option<FrameEnd> {
    let mut i = 0;
    while i + 1 < buffer.len() {
        if buffer[i] == b'\n' && buffer[i + 1] == b'\n' {
            return Some(FrameEnd { start: i, end: i + 2 });
        }
        if i + 3 < buffer.len() && &buffer[i..i + 4] == b"\r\n\r\n" {
            return Some(FrameEnd { start: i, end: i + 4 });
        }
        i += 1;
    }
    None
}

fn parse_frame(frame: &str) -> Option<SseEvent> {
    let mut event = None;
    let mut data_lines = Vec::new();

    for line in frame.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(rest) = line.strip_prefix("event:") {
            event = Some(rest.trim_start().to_string());
        } else if let Some(rest) = line.strip_prefix("data:") {
            data_lines.push(rest.strip_prefix(' ').unwrap_or(rest).to_string());
        }
        // Comments (`:`) and unknown fields are ignored.
    }

    if event.is_none() && data_lines.is_empty() {
        return None;
    }
    Some(SseEvent {
        event,
        data: data_lines.join("\n"),
    })
}
