use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_error, output_fields, output_success};
use crate::cli::OutputFormat;
use crate::client::{RequestError, WalletSession};
use crate::eip191::LocalSigner;
use crate::types::{message_timestamp, WalletAuthAssertion};

#[derive(Subcommand)]
pub enum SessionCommands {
    #[command(about = "Bootstrap a session and show its status")]
    Status,

    #[command(about = "Bootstrap, then exchange a wallet signature for an authenticated session")]
    Connect {
        #[arg(long, help = "Wallet address (derived from --private-key when signing locally)")]
        address: Option<String>,
        #[arg(long, help = "0x-prefixed personal-sign signature over --message")]
        signature: Option<String>,
        #[arg(long, help = "Statement to sign with --private-key, or the exact signed text with --signature")]
        message: Option<String>,
        #[arg(long, help = "Signing time in milliseconds since the epoch (defaults to now, or the message's timestamp line)")]
        timestamp: Option<i64>,
        #[arg(long, help = "Sign locally with this hex private key instead of --signature")]
        private_key: Option<String>,
        #[arg(long, help = "Log out again after a successful connect")]
        logout: bool,
    },

    #[command(about = "Bootstrap, then call logout with the CSRF token")]
    Logout,
}

pub async fn handle(cmd: SessionCommands, session: &WalletSession, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        SessionCommands::Status => {
            let status = session.bootstrap().await?;
            output_success(
                &output_format,
                "Session bootstrapped",
                Some(json!({ "session": status })),
            )?;
            output_fields(
                &output_format,
                &[
                    ("authenticated", status.authenticated.to_string()),
                    ("address", status.address.unwrap_or_else(|| "-".to_string())),
                ],
            );
            Ok(())
        }
        SessionCommands::Connect {
            address,
            signature,
            message,
            timestamp,
            private_key,
            logout,
        } => {
            let assertion = build_assertion(address, signature, message, timestamp, private_key)?;

            session.bootstrap().await?;
            match session.connect(&assertion).await {
                Ok(result) => {
                    output_success(
                        &output_format,
                        &format!("Wallet {} connected", result.address),
                        Some(json!({ "connect": result })),
                    )?;
                }
                Err(e) => return report_rejection(&output_format, "connect", e),
            }

            if logout {
                match session.logout().await {
                    Ok(_) => output_success(&output_format, "Logged out", None)?,
                    Err(e) => return report_rejection(&output_format, "logout", e),
                }
            }
            Ok(())
        }
        SessionCommands::Logout => {
            session.bootstrap().await?;
            match session.logout().await {
                Ok(_) => output_success(&output_format, "Logged out", None),
                Err(e) => report_rejection(&output_format, "logout", e),
            }
        }
    }
}

fn build_assertion(
    address: Option<String>,
    signature: Option<String>,
    message: Option<String>,
    timestamp: Option<i64>,
    private_key: Option<String>,
) -> anyhow::Result<WalletAuthAssertion> {
    match (private_key, signature) {
        (Some(key), None) => {
            // --message is the statement; the signing time is appended to it
            let signer = LocalSigner::from_hex(&key)?;
            let timestamp = timestamp.unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
            let statement = message.unwrap_or_else(|| {
                format!(
                    "Sign in to the dataset licensing platform\nnonce: {}",
                    uuid::Uuid::new_v4().simple()
                )
            });
            let mut assertion = signer.sign_in(&statement, timestamp)?;
            if let Some(address) = address {
                assertion.address = address;
            }
            Ok(assertion)
        }
        (None, Some(signature)) => {
            // --message is the exact signed text, including its timestamp line
            let address = address.ok_or_else(|| anyhow::anyhow!("--address is required with --signature"))?;
            let message = message.ok_or_else(|| anyhow::anyhow!("--message is required with --signature"))?;
            let timestamp = timestamp
                .or_else(|| message_timestamp(&message))
                .ok_or_else(|| anyhow::anyhow!("--message has no timestamp line; pass --timestamp"))?;
            Ok(WalletAuthAssertion::new(address, signature, message, timestamp))
        }
        (Some(_), Some(_)) => Err(anyhow::anyhow!("use either --private-key or --signature, not both")),
        (None, None) => Err(anyhow::anyhow!("one of --private-key or --signature is required")),
    }
}

/// CSRF and auth rejections are reported by status; anything else propagates
fn report_rejection(output_format: &OutputFormat, action: &str, err: RequestError) -> anyhow::Result<()> {
    let code = if err.is_csrf_rejected() {
        "CSRF_REJECTED"
    } else if err.is_auth_failure() {
        "AUTH_FAILURE"
    } else {
        return Err(err.into());
    };

    output_error(output_format, &format!("{} rejected: {}", action, err), Some(code))?;
    Err(anyhow::anyhow!("{} rejected", action))
}
