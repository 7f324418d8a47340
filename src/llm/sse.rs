//! Server-sent events decoding for streamed chat completions

use std::io::{BufRead, Lines};

use serde::Deserialize;

use crate::core::error::{DocuchatError, Result};

#[derive(Deserialize)]
struct ChunkEvent {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<ErrorEvent>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Deserialize, Default)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEvent {
    message: String,
}

/// Iterator over the text deltas of a `chat/completions` event stream.
///
/// Ends at `data: [DONE]` or end of input. After the first error it yields
/// nothing more.
pub struct ChatEventStream<R> {
    lines: Lines<R>,
    finished: bool,
}

impl<R: BufRead> ChatEventStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            finished: false,
        }
    }

    fn fail(&mut self, err: DocuchatError) -> Option<Result<String>> {
        self.finished = true;
        Some(Err(err))
    }
}

impl<R: BufRead> Iterator for ChatEventStream<R> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            let line = match self.lines.next() {
                None => {
                    self.finished = true;
                    return None;
                }
                Some(Err(e)) => return self.fail(e.into()),
                Some(Ok(line)) => line,
            };

            // Comments, event names and blank separators carry no text.
            let Some(data) = line.strip_prefix("data:") else {
                continue;
            };
            let data = data.trim();
            if data.is_empty() {
                continue;
            }
            if data == "[DONE]" {
                self.finished = true;
                return None;
            }

            let event: ChunkEvent = match serde_json::from_str(data) {
                Ok(event) => event,
                Err(e) => return self.fail(e.into()),
            };
            if let Some(error) = event.error {
                return self.fail(DocuchatError::StreamEvent(error.message));
            }

            let content = event
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.delta.content)
                .filter(|c| !c.is_empty());
            if let Some(content) = content {
                return Some(Ok(content));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn collect(body: &str) -> Vec<Result<String>> {
        ChatEventStream::new(Cursor::new(body.to_string())).collect()
    }

    #[test]
    fn test_text_deltas() {
        let body = concat!(
            ": keep-alive\n\n",
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"Revenue \"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"grew.\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
            "data: [DONE]\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"ignored\"}}]}\n\n",
        );

        let tokens: Vec<String> = collect(body).into_iter().map(|t| t.unwrap()).collect();
        assert_eq!(tokens, vec!["Revenue ", "grew."]);
    }

    #[test]
    fn test_stream_without_done_marker() {
        let body = "data: {\"choices\":[{\"delta\":{\"content\":\"partial\"}}]}\n";
        let tokens: Vec<String> = collect(body).into_iter().map(|t| t.unwrap()).collect();
        assert_eq!(tokens, vec!["partial"]);
    }

    #[test]
    fn test_error_event_stops_stream() {
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n",
            "data: {\"error\":{\"message\":\"quota exceeded\",\"type\":\"insufficient_quota\"}}\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"b\"}}]}\n",
        );

        let items = collect(body);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "a");
        assert!(matches!(&items[1], Err(DocuchatError::StreamEvent(m)) if m == "quota exceeded"));
    }

    #[test]
    fn test_malformed_json() {
        let items = collect("data: {not json}\n");
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(DocuchatError::Json(_))));
    }
}
