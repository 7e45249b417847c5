//! Newline-delimited JSON request loop over a single service instance.
//!
//! Each request line is an object with an `op` field and the operation's
//! arguments; an optional `id` is echoed back. Every line gets exactly one
//! response line: `{"status":200,"result":...}` on success, otherwise
//! `{"status":<code>,"error":...}` with 400 for malformed requests, 503 when a
//! capability cannot be loaded and 500 for anything else.

use anyhow::Result;
use ml_core::models::{Candidate, SearchResults};
use ml_core::{MlService, ServiceError};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Search {
        query: String,
        #[serde(default)]
        candidates: Vec<Candidate>,
        threshold: Option<f32>,
        top_k: Option<usize>,
    },
    Embed {
        text: String,
    },
    Tags {
        filename: String,
        preview: Option<String>,
    },
    Detect {
        text: String,
    },
    Redact {
        text: String,
        #[serde(rename = "char")]
        redaction_char: Option<char>,
    },
    Assess {
        text: String,
    },
    Status,
}

pub async fn dispatch(service: &MlService, request: Request) -> Result<Value, ServiceError> {
    Ok(match request {
        Request::Search {
            query,
            candidates,
            threshold,
            top_k,
        } => json!(SearchResults::from(
            service
                .search(&query, &candidates, threshold, top_k)
                .await?
        )),
        Request::Embed { text } => json!(service.embed(&text).await?),
        Request::Tags { filename, preview } => json!(
            service
                .generate_file_tags(&filename, preview.as_deref())
                .await?
        ),
        Request::Detect { text } => json!(service.detect(&text).await?),
        Request::Redact {
            text,
            redaction_char,
        } => json!(service.redact(&text, redaction_char).await?),
        Request::Assess { text } => json!(service.assess_sensitivity(&text).await?),
        Request::Status => json!(service.status().await),
    })
}

/// Handles one request line and builds its response object.
pub async fn handle_line(service: &MlService, line: &str) -> Value {
    let raw: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => return json!({ "status": 400, "error": format!("invalid json: {e}") }),
    };
    let id = raw.get("id").cloned();
    let mut response = match serde_json::from_value::<Request>(raw) {
        Err(e) => json!({ "status": 400, "error": format!("invalid request: {e}") }),
        Ok(request) => match dispatch(service, request).await {
            Ok(result) => json!({ "status": 200, "result": result }),
            Err(e) => {
                let status = if e.is_unavailable() { 503 } else { 500 };
                warn!(status, error = %e, "Request failed");
                json!({ "status": status, "error": e.to_string() })
            }
        },
    };
    if let (Some(id), Some(obj)) = (id, response.as_object_mut()) {
        obj.insert("id".into(), id);
    }
    response
}

/// Serves until `reader` reaches EOF. Blank lines are ignored.
pub async fn serve<R, W>(service: &MlService, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut handled = 0usize;
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(service, &line).await;
        let mut out = serde_json::to_vec(&response)?;
        out.push(b'\n');
        writer.write_all(&out).await?;
        writer.flush().await?;
        handled += 1;
    }
    debug!(handled, "Input closed; session finished");
    Ok(())
}
