//! The hello-world workflow: open a session, write one object, read it back,
//! tear everything down.

use serde_json::{json, Value};
use tracing::info;

use crate::client::ClusterClient;
use crate::config::{SessionConfig, DEFAULT_CONTENT, DEFAULT_OBJECT, DEFAULT_POOL};
use crate::error::SessionError;
use crate::outcome::ExecutionOutcome;
use crate::session::SessionBuilder;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelloRequest {
    pub pool: String,
    pub object: String,
    pub content: Vec<u8>,
}

impl Default for HelloRequest {
    fn default() -> Self {
        Self {
            pool: DEFAULT_POOL.to_string(),
            object: DEFAULT_OBJECT.to_string(),
            content: DEFAULT_CONTENT.as_bytes().to_vec(),
        }
    }
}

#[derive(Debug)]
pub struct HelloReport {
    pub pool: String,
    pub object: String,
    pub read_back: Option<Vec<u8>>,
    pub error: Option<SessionError>,
    pub cleanup_error: Option<SessionError>,
}

impl HelloReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.cleanup_error.is_none()
    }

    /// Cleanup failures outrank whatever the primary operations did.
    #[must_use]
    pub fn to_outcome(&self) -> ExecutionOutcome {
        let mut details = json!({
            "pool": self.pool,
            "object": self.object,
        });
        if let Some(data) = &self.read_back {
            details["bytes"] = json!(data.len());
            details["content"] = json!(String::from_utf8_lossy(data));
        }
        if let Some(err) = &self.error {
            details["error"] = error_details(err);
        }
        if let Some(cleanup) = &self.cleanup_error {
            details["cleanup_error"] = error_details(cleanup);
            return ExecutionOutcome::fatal_cleanup(cleanup.to_string(), details);
        }
        if let Some(err) = &self.error {
            return ExecutionOutcome::failure(err.to_string(), details);
        }
        ExecutionOutcome::success(
            format!("read back object {} from pool {}", self.object, self.pool),
            details,
        )
    }
}

fn error_details(err: &SessionError) -> Value {
    json!({
        "code": err.code(),
        "step": err.step(),
        "status": err.status().code(),
    })
}

/// Runs open → put → get_balanced → close.
///
/// A cleanup failure after a successful open is reported in the returned
/// report; one during a failed open goes to the builder's fatal-cleanup
/// handler.
pub fn run_hello<C: ClusterClient>(
    builder: SessionBuilder<C>,
    config: &SessionConfig,
    request: &HelloRequest,
) -> HelloReport {
    let mut report = HelloReport {
        pool: request.pool.clone(),
        object: request.object.clone(),
        read_back: None,
        error: None,
        cleanup_error: None,
    };

    let mut session = match builder.open(config, &request.pool) {
        Ok(session) => session,
        Err(err) => {
            report.error = Some(err);
            return report;
        }
    };

    let result = session
        .put(&request.object, &request.content)
        .and_then(|()| session.get_balanced(&request.object));
    match result {
        Ok(data) => {
            info!(
                object = %request.object,
                content = %String::from_utf8_lossy(&data),
                "object contents"
            );
            report.read_back = Some(data);
        }
        Err(err) => report.error = Some(err),
    }

    if let Err(err) = session.close() {
        report.cleanup_error = Some(err);
    }
    report
}
