use super::{CheckResult, PROBE_TIMEOUT};
use reqwest::Client;
use tracing::warn;

const TOKENS_API: &str = "https://stargate.finance/api/v1/tokens";

/// Check Stargate through its tokens API: if the API serves token data, the
/// bridge front end is operational.
pub async fn check(client: &Client) -> CheckResult {
    let mut result = CheckResult {
        detail: serde_json::json!({ "method": "api_check" }),
        ..Default::default()
    };

    match client.get(TOKENS_API).timeout(PROBE_TIMEOUT).send().await {
        Ok(resp) if resp.status().as_u16() == 200 => {
            let tokens_available = match resp.json::<serde_json::Value>().await {
                Ok(body) => body
                    .get("tokens")
                    .and_then(|t| t.as_array())
                    .map(|t| t.len())
                    .unwrap_or(0),
                Err(_) => 0,
            };
            result.detail = serde_json::json!({
                "method": "api_check",
                "tokens_available": tokens_available,
            });
        }
        Ok(resp) => {
            result.degraded_service = true;
            result.http_code = resp.status().as_u16();
        }
        Err(e) => {
            warn!("Stargate API check failed: {}", e);
            result.degraded_service = true;
            result.http_code = 500;
            result.error = Some(e.to_string());
        }
    }

    result
}
