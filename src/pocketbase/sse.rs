//! Incremental `text/event-stream` decoder for the realtime connection.
//!
//! Chunks from the HTTP body can split lines (and UTF-8 sequences) at any
//! byte, so input is buffered until a full line is available.

/// One dispatched server-sent event
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SseEvent {
    /// Event name (`message` when the server sent none)
    pub event: String,
    /// Data lines joined with `\n`
    pub data: String,
    /// Last event id, if any
    pub id: Option<String>,
}

#[derive(Debug, Default)]
pub(crate) struct SseParser {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
    id: Option<String>,
}

impl SseParser {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Feed a body chunk, returning every event completed by it
    pub(crate) fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let mut raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            raw.pop();
            if raw.last() == Some(&b'\r') {
                raw.pop();
            }

            let line = String::from_utf8_lossy(&raw);
            if line.is_empty() {
                if let Some(event) = self.dispatch() {
                    events.push(event);
                }
                continue;
            }
            // Comment / keep-alive
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (&*line, ""),
            };
            match field {
                "event" => self.event = Some(value.to_string()),
                "data" => self.data.push(value.to_string()),
                "id" => self.id = Some(value.to_string()),
                _ => {}
            }
        }
        events
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseEvent {
            event: event.unwrap_or_else(|| "message".to_string()),
            data,
            id: self.id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_connect_event() {
        let mut parser = SseParser::new();
        let events = parser.feed(b"id:abc123\nevent:PB_CONNECT\ndata:{\"clientId\":\"abc123\"}\n\n");

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "PB_CONNECT");
        assert_eq!(events[0].data, "{\"clientId\":\"abc123\"}");
        assert_eq!(events[0].id.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_event_split_across_chunks() {
        let mut parser = SseParser::new();
        assert!(parser.feed(b"event: todos/*\r\nda").is_empty());
        assert!(parser.feed(b"ta: {\"action\":\"create\"}\r\n").is_empty());

        let events = parser.feed(b"\r\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "todos/*");
        assert_eq!(events[0].data, "{\"action\":\"create\"}");
    }

    #[test]
    fn test_multiline_data_and_default_name() {
        let mut parser = SseParser::new();
        let events = parser.feed(b"data: first\ndata: second\n\n");

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "message");
        assert_eq!(events[0].data, "first\nsecond");
    }

    #[test]
    fn test_comments_and_empty_events_ignored() {
        let mut parser = SseParser::new();
        let events = parser.feed(b": keep-alive\n\nevent: ping\n\n");
        assert!(events.is_empty());
    }

    #[test]
    fn test_multiple_events_in_one_chunk() {
        let mut parser = SseParser::new();
        let events = parser.feed(b"event:a\ndata:1\n\nevent:b\ndata:2\n\n");

        let names: Vec<&str> = events.iter().map(|e| e.event.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
