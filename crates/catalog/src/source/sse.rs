//! Minimal Server-Sent Events decoder.
//!
//! Incremental: feed it raw transport chunks, get complete events back.
//! Chunks may split lines, fields, or multi-byte characters anywhere; the
//! decoder buffers bytes and only interprets complete lines. Covers the
//! subset of the SSE wire format the catalog endpoints use: `event` and
//! `data` fields, comment lines, and blank-line dispatch.

/// One decoded event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct SseEvent {
    /// Event name; `"message"` when the stream did not name one.
    pub name: String,
    /// Data payload; multiple `data:` lines are joined with `\n`.
    pub data: String,
}

/// Incremental decoder state.
#[derive(Debug, Default)]
pub(super) struct SseDecoder {
    buffer: Vec<u8>,
    event_name: String,
    data_lines: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a transport chunk, returning every event it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(line) = self.take_line() {
            self.process_line(&line, &mut events);
        }
        events
    }

    /// Remove and return the next complete line from the buffer.
    fn take_line(&mut self) -> Option<String> {
        let newline = self.buffer.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.buffer.drain(..=newline).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    fn process_line(&mut self, line: &str, events: &mut Vec<SseEvent>) {
        if line.is_empty() {
            // Blank line dispatches the buffered event. Events with no data
            // are dropped, matching the wire format's dispatch rule.
            if !self.data_lines.is_empty() {
                let name = if self.event_name.is_empty() {
                    "message".to_string()
                } else {
                    std::mem::take(&mut self.event_name)
                };
                events.push(SseEvent {
                    name,
                    data: self.data_lines.join("\n"),
                });
            }
            self.event_name.clear();
            self.data_lines.clear();
            return;
        }

        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event_name = value.to_string(),
            "data" => self.data_lines.push(value.to_string()),
            _ => {}
        }
    }
}
