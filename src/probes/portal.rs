use super::{CheckResult, PROBE_TIMEOUT};
use reqwest::Client;
use tracing::warn;

/// Portal availability check for bridges without a public health API
/// (Arbitrum, Optimism, Polygon): if the official bridge portal serves, the
/// bridge is assumed operational.
pub async fn check(client: &Client, portal_url: &str) -> CheckResult {
    let mut result = CheckResult {
        detail: serde_json::json!({ "method": "portal_check" }),
        ..Default::default()
    };

    match client.get(portal_url).timeout(PROBE_TIMEOUT).send().await {
        Ok(resp) => {
            let code = resp.status().as_u16();
            result.http_code = code;
            if code != 200 {
                result.degraded_service = true;
            }
        }
        Err(e) => {
            warn!(%portal_url, "Portal check failed: {}", e);
            result.critical_failure = true;
            result.http_code = 500;
            result.error = Some(e.to_string());
        }
    }

    result
}
