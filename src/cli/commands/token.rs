use clap::Subcommand;
use serde_json::json;

use crate::auth::TokenService;
use crate::cli::{commands::load_config, utils::output_success, OutputFormat};
use crate::types::Principal;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Sign a token for a subject id and role")]
    Issue {
        #[arg(long, help = "Employee or customer id")]
        subject: i64,
        #[arg(long, help = "owner, customer_service, noc, technician or customer")]
        role: String,
    },

    #[command(about = "Check a token's signature, issuer and expiry")]
    Verify {
        #[arg(help = "Bearer token")]
        token: String,
    },
}

pub async fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = load_config()?;
    let tokens = TokenService::from_config(&config.security)?;

    match cmd {
        TokenCommands::Issue { subject, role } => {
            let principal: Principal = role.parse()?;
            let issued = tokens.issue(subject, principal)?;
            output_success(
                output_format,
                &format!("Issued {} token for subject {}", principal, subject),
                Some(json!({
                    "token": issued.token,
                    "issued_at": issued.issued_at,
                    "expires_at": issued.expires_at,
                })),
            )
        }
        TokenCommands::Verify { token } => {
            let verified = tokens.verify(token.trim())?;
            output_success(
                output_format,
                "Token is valid",
                Some(json!({
                    "subject_id": verified.subject_id,
                    "role": verified.principal,
                    "issued_at": verified.issued_at,
                    "expires_at": verified.expires_at,
                })),
            )
        }
    }
}
