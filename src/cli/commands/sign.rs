use serde_json::json;

use crate::cli::utils::{output_fields, output_success};
use crate::cli::OutputFormat;
use crate::eip191::LocalSigner;

/// Produce a ready-to-submit assertion: `message` plus the current timestamp line, signed
pub fn handle(private_key: &str, message: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let signer = LocalSigner::from_hex(private_key)?;
    let assertion = signer.sign_in(message, chrono::Utc::now().timestamp_millis())?;

    output_success(
        &output_format,
        "Message signed",
        Some(json!({ "assertion": assertion })),
    )?;
    output_fields(
        &output_format,
        &[
            ("address", assertion.address.clone()),
            ("timestamp", assertion.timestamp.to_string()),
            ("signature", assertion.signature.clone()),
        ],
    );
    Ok(())
}
