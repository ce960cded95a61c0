use super::{CheckResult, HOP_TIMEOUT};
use reqwest::Client;
use tracing::warn;

const QUOTE_API: &str = "https://api.hop.exchange/v1/quote";

/// Check Hop Protocol by asking for a quote on a small USDC transfer. A valid
/// quote means the bridge is operational end to end.
///
/// Hop's API is intentionally slow (it prices real transfers); hitting the
/// 40s budget is reported as degraded service, not an outage, so the status
/// lands at WARNING rather than DOWN.
pub async fn check(client: &Client) -> CheckResult {
    let mut result = CheckResult {
        detail: serde_json::json!({ "method": "quote_api" }),
        ..Default::default()
    };

    let params = [
        ("amount", "1000000"), // 1 USDC
        ("token", "USDC"),
        ("fromChain", "ethereum"),
        ("toChain", "arbitrum"),
        ("slippage", "0.5"),
    ];

    match client
        .get(QUOTE_API)
        .query(&params)
        .timeout(HOP_TIMEOUT)
        .send()
        .await
    {
        Ok(resp) if resp.status().as_u16() == 200 => {
            let body = resp.json::<serde_json::Value>().await.unwrap_or_default();
            result.detail = serde_json::json!({
                "method": "quote_api",
                "quote_available": body.get("estimatedRecieved").is_some(),
                "bonder_fee": body.get("bonderFee").cloned().unwrap_or(serde_json::json!(0)),
            });
        }
        Ok(resp) => {
            result.degraded_service = true;
            result.http_code = resp.status().as_u16();
        }
        Err(e) if e.is_timeout() => {
            warn!("Hop API timeout after 40s - API is very slow but likely operational");
            result.degraded_service = true;
            // not a real error, just slow; keep 200 so this grades WARNING
            result.http_code = 200;
        }
        Err(e) => {
            warn!("Hop API check failed: {}", e);
            result.degraded_service = true;
            result.http_code = 500;
            result.error = Some(e.to_string());
        }
    }

    result
}
