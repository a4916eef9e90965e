//! HTTP transport over reqwest.
//!
//! Maps a task to `method` + `url` + `headers` + `body`. JSON bodies
//! for `api`/`data`/`notification` tasks; `file` tasks are sent as
//! multipart with their `fileName`/`fileSize` metadata. A 409 response
//! is parsed into the `{clientData, serverData}` conflict payload.

use super::{SyncTransport, TaskReply};
use crate::error::SyncResult;
use async_trait::async_trait;
use outpost_types::{HttpMethod, SyncTask, TaskKind};
use reqwest::multipart::Form;
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for the HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Per-request timeout (ms). A timeout counts as a retriable
    /// failure, not a dead-letter shortcut.
    pub timeout_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_ms: 30_000 }
    }
}

/// Conflict payload returned by the remote service on 409.
#[derive(Debug, Deserialize)]
struct ConflictBody {
    #[serde(rename = "clientData")]
    client_data: Value,
    #[serde(rename = "serverData")]
    server_data: Value,
}

/// reqwest-backed transport.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport with the given configuration.
    pub fn new(config: HttpConfig) -> SyncResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SyncTransport for HttpTransport {
    async fn deliver(&self, task: &SyncTask) -> SyncResult<TaskReply> {
        let method = to_reqwest_method(task.method);
        let mut request = self.client.request(method, &task.url);

        for (name, value) in &task.headers {
            request = request.header(name, value);
        }

        request = if task.kind == TaskKind::File {
            request.multipart(file_form(task))
        } else if let Some(body) = &task.body {
            request.json(body)
        } else {
            request
        };

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                // Timeouts and connection errors are retriable.
                warn!(task_id = %task.id, "request failed: {}", e);
                return Ok(TaskReply::Failure {
                    status: None,
                    message: e.to_string(),
                });
            }
        };

        let status = response.status();
        if status.is_success() {
            debug!(task_id = %task.id, status = status.as_u16(), "task delivered");
            return Ok(TaskReply::Success);
        }

        if status == StatusCode::CONFLICT {
            match response.json::<ConflictBody>().await {
                Ok(body) => {
                    return Ok(TaskReply::Conflict {
                        client_data: body.client_data,
                        server_data: body.server_data,
                    });
                }
                Err(e) => {
                    warn!(task_id = %task.id, "unreadable conflict payload: {}", e);
                    return Ok(TaskReply::Failure {
                        status: Some(status.as_u16()),
                        message: format!("unreadable conflict payload: {e}"),
                    });
                }
            }
        }

        Ok(TaskReply::Failure {
            status: Some(status.as_u16()),
            message: format!("server returned {status}"),
        })
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Builds the multipart form for a file task: the file metadata as
/// text parts plus the JSON body (if any) as a `payload` part.
fn file_form(task: &SyncTask) -> Form {
    let mut form = Form::new();
    if let Some(name) = task.metadata.get("fileName").and_then(Value::as_str) {
        form = form.text("fileName", name.to_string());
    }
    if let Some(size) = task.metadata.get("fileSize").and_then(Value::as_u64) {
        form = form.text("fileSize", size.to_string());
    }
    if let Some(body) = &task.body {
        form = form.text("payload", body.to_string());
    }
    form
}
