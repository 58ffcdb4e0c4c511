//! Wire-level debugging via the `LOUD_WIRE` environment variable.
//!
//! When `LOUD_WIRE` is set to any value, raw JSON of requests and responses is
//! pretty-printed to stderr with colors.
//!
//! ```bash
//! LOUD_WIRE=1 GOOGLE_CLOUD_PROJECT=my-project cargo run --example weather_conversation
//! ```
//!
//! Green `>>>` marks outgoing requests and red `<<<` incoming responses. Each
//! line carries a timestamp and a request number for correlation. Long
//! base64 payloads are truncated.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use colored::Colorize;

use super::error_helpers::truncate_for_context;

static REQUEST_COUNTER: AtomicUsize = AtomicUsize::new(1);

static ENABLED: OnceLock<bool> = OnceLock::new();

/// Whether `LOUD_WIRE` is set.
///
/// Cached on first use: setting the variable after the first request has no effect.
#[must_use]
pub fn is_enabled() -> bool {
    *ENABLED.get_or_init(|| std::env::var("LOUD_WIRE").is_ok())
}

/// Next request number for correlating requests with responses.
#[must_use]
pub fn next_request_id() -> usize {
    REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Fields holding base64 data that are shortened before printing.
const TRUNCATE_FIELDS: &[&str] = &["data", "thoughtSignature"];

const TRUNCATE_THRESHOLD: usize = 100;

/// Maximum bytes of a non-JSON body to print.
const RAW_BODY_LIMIT: usize = 1000;

fn truncate_long_fields(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                if TRUNCATE_FIELDS.contains(&key.as_str()) {
                    if let serde_json::Value::String(s) = val
                        && s.len() > TRUNCATE_THRESHOLD
                    {
                        *s = truncate_for_context(s, TRUNCATE_THRESHOLD);
                    }
                } else {
                    truncate_long_fields(val);
                }
            }
        }
        serde_json::Value::Array(arr) => {
            for item in arr.iter_mut() {
                truncate_long_fields(item);
            }
        }
        _ => {}
    }
}

fn timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn prefix(request_id: usize) -> String {
    format!(
        "{} {} {}",
        "[LOUD_WIRE]".bold(),
        timestamp().dimmed(),
        format!("[REQ#{}]", request_id).cyan()
    )
}

fn print_json_or_raw(prefix: &str, label: &str, body: &str) {
    if let Ok(mut parsed) = serde_json::from_str::<serde_json::Value>(body) {
        truncate_long_fields(&mut parsed);
        eprintln!("{prefix} {label}:");
        let rendered = colored_json::to_colored_json_auto(&parsed)
            .ok()
            .or_else(|| serde_json::to_string_pretty(&parsed).ok());
        if let Some(rendered) = rendered {
            for line in rendered.lines() {
                eprintln!("{prefix} {line}");
            }
        }
    } else {
        eprintln!(
            "{prefix} {label}: {}",
            truncate_for_context(body, RAW_BODY_LIMIT)
        );
    }
}

/// Log an outgoing HTTP request.
pub fn log_request(request_id: usize, method: &str, url: &str, body: Option<&str>) {
    if !is_enabled() {
        return;
    }

    let prefix = prefix(request_id);
    eprintln!("{prefix} {} {method} {url}", ">>>".green().bold());

    if let Some(body) = body {
        print_json_or_raw(&prefix, &"Body".green().to_string(), body);
    }
}

/// Log an incoming HTTP response status.
pub fn log_response_status(request_id: usize, status: u16) {
    if !is_enabled() {
        return;
    }

    let status_text = if status < 300 {
        format!("{status} OK").green()
    } else {
        format!("{status} ERROR").red()
    };
    eprintln!("{} {} {status_text}", prefix(request_id), "<<<".red().bold());
}

/// Log an incoming HTTP response body.
pub fn log_response_body(request_id: usize, body: &str) {
    if !is_enabled() {
        return;
    }

    print_json_or_raw(&prefix(request_id), &"Response".red().to_string(), body);
}
