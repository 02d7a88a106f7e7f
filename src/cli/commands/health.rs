use serde_json::json;

use crate::cli::utils::{output_fields, output_success};
use crate::cli::OutputFormat;
use crate::client::WalletSession;

pub async fn handle(session: &WalletSession, output_format: OutputFormat) -> anyhow::Result<()> {
    let report = session.health().await?;

    output_success(
        &output_format,
        &format!("Service is {}", report.status),
        Some(json!({ "health": report })),
    )?;
    output_fields(
        &output_format,
        &[
            ("uptime", format!("{}s", report.uptime_seconds)),
            (
                "rss",
                report
                    .rss_kb
                    .map(|kb| format!("{} kB", kb))
                    .unwrap_or_else(|| "unknown".to_string()),
            ),
        ],
    );
    Ok(())
}
