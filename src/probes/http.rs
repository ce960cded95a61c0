use super::{CheckResult, PROBE_TIMEOUT};
use reqwest::Client;
use tracing::warn;

/// Generic availability check: GET the configured endpoint and grade the
/// status code. Fallback for bridges without a dedicated check.
pub async fn check_generic(client: &Client, endpoint: &str) -> CheckResult {
    let mut result = CheckResult {
        detail: serde_json::json!({ "method": "generic_http" }),
        ..Default::default()
    };

    match client.get(endpoint).timeout(PROBE_TIMEOUT).send().await {
        Ok(resp) => {
            let code = resp.status().as_u16();
            result.http_code = code;
            if code >= 500 {
                result.critical_failure = true;
            } else if code >= 400 {
                result.degraded_service = true;
            }
        }
        Err(e) if e.is_timeout() => {
            warn!(%endpoint, "Generic check timed out");
            result.critical_failure = true;
            result.timed_out = true;
            result.error = Some("request timeout".to_string());
        }
        Err(e) => {
            warn!(%endpoint, "Generic check failed: {}", e);
            result.critical_failure = true;
            result.http_code = 500;
            result.error = Some(e.to_string());
        }
    }

    result
}
