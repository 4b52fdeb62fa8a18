use clap::Subcommand;
use serde_json::json;

use crate::auth::PasswordHasher;
use crate::cli::{utils::output_success, OutputFormat};

#[derive(Subcommand)]
pub enum PasswordCommands {
    #[command(about = "Produce a salted argon2 digest for a password")]
    Hash {
        #[arg(help = "Plaintext password")]
        password: String,
    },

    #[command(about = "Check a password against a stored digest")]
    Verify {
        #[arg(help = "Stored digest (PHC string)")]
        digest: String,
        #[arg(help = "Candidate password")]
        password: String,
    },
}

pub async fn handle(cmd: PasswordCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let hasher = PasswordHasher::default();

    match cmd {
        PasswordCommands::Hash { password } => {
            if password.is_empty() {
                anyhow::bail!("password must not be empty");
            }
            let digest = hasher.hash(&password)?;
            output_success(output_format, "Password hashed", Some(json!({ "digest": digest })))
        }
        PasswordCommands::Verify { digest, password } => {
            if !hasher.compare(&digest, &password) {
                anyhow::bail!("password does not match");
            }
            output_success(output_format, "Password matches", None)
        }
    }
}
