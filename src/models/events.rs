use serde::{ Serialize, Deserialize };

/// One newline-delimited JSON line of a `/api/chat` response body.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum StreamEvent {
    #[serde(rename = "final_summary_chunk")] FinalSummaryChunk {
        content: String,
    },
    #[serde(rename = "done")] Done {
        /// Full summary repeated by the backend at the end of the stream.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },
    #[serde(rename = "error")] Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done { .. } | StreamEvent::Error { .. })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChatQuery {
    pub query: String,
}

/// Body of upload / clear replies. Every field is optional; only the status
/// code is authoritative.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct StatusReply {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HealthReply {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backend_event_shapes() {
        let chunk: StreamEvent =
            serde_json::from_str(r#"{"type":"final_summary_chunk","content":"There were "}"#).unwrap();
        assert_eq!(chunk, StreamEvent::FinalSummaryChunk { content: "There were ".into() });

        let done: StreamEvent = serde_json::from_str(r#"{"type":"done"}"#).unwrap();
        assert_eq!(done, StreamEvent::Done { content: None });

        let done_with_summary: StreamEvent =
            serde_json::from_str(r#"{"type":"done","content":"all of it"}"#).unwrap();
        assert_eq!(done_with_summary, StreamEvent::Done { content: Some("all of it".into()) });

        let error: StreamEvent =
            serde_json::from_str(r#"{"type":"error","content":"An error occurred: boom"}"#).unwrap();
        assert!(error.is_terminal());
    }

    #[test]
    fn unknown_type_is_not_a_parse_error() {
        let event: StreamEvent = serde_json::from_str(r#"{"type":"router_decision","value":"SQL"}"#).unwrap();
        assert_eq!(event, StreamEvent::Unknown);
        assert!(!event.is_terminal());
    }

    #[test]
    fn chunk_without_content_is_rejected() {
        assert!(serde_json::from_str::<StreamEvent>(r#"{"type":"final_summary_chunk"}"#).is_err());
        assert!(serde_json::from_str::<StreamEvent>(r#"{"content":"no type"}"#).is_err());
    }
}
