//! Interactive reset-password walkthrough against a real tenant.
//!
//! ```sh
//! SIGNET_CLIENT_ID=... SIGNET_AUTHORITY=https://<tenant>.ciamlogin.com/<tenant> \
//!     cargo run --example reset_password -- user@example.com
//! ```

use std::io::{self, BufRead, Write};

use signet::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "signet=debug".into()),
        )
        .init();

    let client_id = std::env::var("SIGNET_CLIENT_ID")?;
    let authority = std::env::var("SIGNET_AUTHORITY")?;
    let username = std::env::args()
        .nth(1)
        .ok_or("usage: reset_password <username>")?;

    let client = NativeAuthClient::new(ClientConfiguration::new(client_id, authority)?);

    let state = match client.reset_password(&username).await {
        ResetPasswordStartOutcome::CodeSent {
            state,
            sent_to,
            code_length,
            ..
        } => {
            println!("A {code_length}-digit code was sent to {sent_to}.");
            state
        }
        ResetPasswordStartOutcome::Error(error) => {
            eprintln!("Could not start the reset: {error}");
            return Ok(());
        }
    };

    let code = prompt("Code: ")?;
    let controller = client.reset_password_controller();
    let password_state = match controller.submit_code(code.trim(), &state).await {
        ResetPasswordVerifyCodeOutcome::PasswordRequired(password_state) => password_state,
        ResetPasswordVerifyCodeOutcome::Error { error, .. } => {
            eprintln!("Code rejected: {error}");
            return Ok(());
        }
    };

    let password = prompt("New password: ")?;
    match controller
        .submit_password(password.trim(), &password_state)
        .await
    {
        ResetPasswordSubmitOutcome::Completed => println!("Password changed."),
        ResetPasswordSubmitOutcome::Error { error, .. } => {
            eprintln!("Password rejected: {error}");
        }
    }
    Ok(())
}

fn prompt(label: &str) -> io::Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}
