// SPDX-FileCopyrightText: 2026 Cellarium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `cellarium login` / `cellarium logout` and the auth-required hint.

use std::io::{BufRead, IsTerminal};
use std::sync::atomic::{AtomicBool, Ordering};

use cellarium_client::{AuthGateway, Credentials};
use cellarium_core::{AuthObserver, CellarError};
use colored::Colorize;
use tracing::info;

/// Prints a sign-in hint the first time authentication is required.
#[derive(Debug, Default)]
pub struct LoginHint {
    shown: AtomicBool,
}

impl AuthObserver for LoginHint {
    fn auth_required(&self) {
        if !self.shown.swap(true, Ordering::SeqCst) {
            eprintln!(
                "{} run {} to sign in",
                "not signed in:".yellow().bold(),
                "cellarium login --username <name>".bold()
            );
        }
    }
}

pub async fn login(auth: &AuthGateway, username: String) -> Result<(), CellarError> {
    let password = read_password()?;
    let credentials = Credentials::new(username, password);
    auth.login(&credentials).await?;
    info!(username = %credentials.username, "signed in");
    println!("{} signed in as {}", "✓".green(), credentials.username.bold());
    Ok(())
}

pub fn logout(auth: &AuthGateway) {
    auth.logout();
    println!("{} signed out", "✓".green());
}

/// Prompts on a TTY; otherwise reads the first line of stdin, so scripts
/// can pipe the password in.
fn read_password() -> Result<String, CellarError> {
    let password = if std::io::stdin().is_terminal() {
        eprint!("Password: ");
        rpassword::read_password()
            .map_err(|e| CellarError::Internal(format!("failed to read password: {e}")))?
    } else {
        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| CellarError::Internal(format!("failed to read password: {e}")))?;
        line.trim_end_matches(['\r', '\n']).to_string()
    };
    if password.is_empty() {
        return Err(CellarError::Validation("password is required".to_string()));
    }
    Ok(password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hint_is_shown_once() {
        let hint = LoginHint::default();
        hint.auth_required();
        hint.auth_required();
        assert!(hint.shown.load(Ordering::SeqCst));
    }
}
