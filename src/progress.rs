//! Batch progress reporting.
//!
//! Reports each item's status transitions while `orius scan` works through a
//! batch. Progress is emitted on **stderr** so stdout remains parseable for
//! scripts.

use std::io::Write;

/// A single status transition of one batch item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchProgressEvent {
    /// The item left the queue and its model calls started.
    Processing {
        file: String,
        n: usize,
        total: usize,
    },
    /// Both calls succeeded.
    Succeeded {
        file: String,
        doc_type: String,
        n: usize,
        total: usize,
    },
    /// The first error raised while processing the item.
    Failed {
        file: String,
        message: String,
        n: usize,
        total: usize,
    },
}

/// Reports batch progress. Implementations write to stderr (human or JSON).
pub trait BatchProgressReporter: Send + Sync {
    fn report(&self, event: BatchProgressEvent);
}

/// Human-friendly progress on stderr: "scan [2/5] rg.jpg  processing...".
pub struct StderrProgress;

impl BatchProgressReporter for StderrProgress {
    fn report(&self, event: BatchProgressEvent) {
        let line = match &event {
            BatchProgressEvent::Processing { file, n, total } => {
                format!("scan [{}/{}] {}  processing...\n", n, total, file)
            }
            BatchProgressEvent::Succeeded {
                file,
                doc_type,
                n,
                total,
            } => format!("scan [{}/{}] {}  ok ({})\n", n, total, file, doc_type),
            BatchProgressEvent::Failed {
                file,
                message,
                n,
                total,
            } => format!("scan [{}/{}] {}  error: {}\n", n, total, file, message),
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl BatchProgressReporter for JsonProgress {
    fn report(&self, event: BatchProgressEvent) {
        let obj = event_json(&event);
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

fn event_json(event: &BatchProgressEvent) -> serde_json::Value {
    match event {
        BatchProgressEvent::Processing { file, n, total } => serde_json::json!({
            "event": "progress",
            "file": file,
            "status": "processing",
            "n": n,
            "total": total
        }),
        BatchProgressEvent::Succeeded {
            file,
            doc_type,
            n,
            total,
        } => serde_json::json!({
            "event": "progress",
            "file": file,
            "status": "success",
            "tipoDocumento": doc_type,
            "n": n,
            "total": total
        }),
        BatchProgressEvent::Failed {
            file,
            message,
            n,
            total,
        } => serde_json::json!({
            "event": "progress",
            "file": file,
            "status": "error",
            "message": message,
            "n": n,
            "total": total
        }),
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl BatchProgressReporter for NoProgress {
    fn report(&self, _event: BatchProgressEvent) {}
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Parses the `--progress` flag value.
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "off" => Ok(ProgressMode::Off),
            "human" => Ok(ProgressMode::Human),
            "json" => Ok(ProgressMode::Json),
            other => Err(format!(
                "invalid progress mode '{}': expected off, human or json",
                other
            )),
        }
    }

    pub fn reporter(&self) -> Box<dyn BatchProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_progress_modes() {
        assert_eq!(ProgressMode::parse("off").unwrap(), ProgressMode::Off);
        assert_eq!(ProgressMode::parse("json").unwrap(), ProgressMode::Json);
        assert!(ProgressMode::parse("loud").is_err());
    }

    #[test]
    fn json_event_shape() {
        let v = event_json(&BatchProgressEvent::Failed {
            file: "rg.jpg".to_string(),
            message: "timeout".to_string(),
            n: 2,
            total: 3,
        });
        assert_eq!(v["status"], "error");
        assert_eq!(v["message"], "timeout");
        assert_eq!(v["n"], 2);
    }
}
