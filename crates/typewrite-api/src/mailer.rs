//! New-user verification mail. Delivery is fire-and-forget: a failed send is
//! logged and never surfaced to the API client.

use anyhow::{Context, Result};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{info, warn};

use typewrite_db::models::UserRow;

use crate::auth::AppState;
use crate::config::SmtpConfig;

pub fn send_verification_email(state: AppState, user: UserRow) {
    let Some(token) = user.email_verify_token.clone() else {
        warn!("user {} has no verification token, skipping email", user.id);
        return;
    };
    let Some(smtp) = state.config.smtp.clone() else {
        info!("SMTP not configured, skipping verification email for {}", user.email);
        return;
    };

    tokio::task::spawn_blocking(move || {
        let link = verification_link(&state, &token);
        match deliver(&smtp, &user, &link) {
            Ok(()) => info!("verification email sent to {}", user.email),
            Err(e) => warn!("verification email to {} failed: {:#}", user.email, e),
        }
    });
}

/// Base URL comes from the first website row; the configured app URL is the
/// fallback for instances without one.
fn verification_link(state: &AppState, token: &str) -> String {
    let path = format!("api/v1/verifyUser/{token}");
    match state.db.first_website() {
        Ok(Some(site)) => typewrite_types::models::Website {
            id: site.id,
            name: site.name,
            domain_name: site.domain_name,
            is_secure: site.is_secure,
        }
        .base_url(&path),
        Ok(None) => format!("{}/{}", state.config.app_url.trim_end_matches('/'), path),
        Err(e) => {
            warn!("website lookup failed, using configured app url: {:#}", e);
            format!("{}/{}", state.config.app_url.trim_end_matches('/'), path)
        }
    }
}

fn deliver(smtp: &SmtpConfig, user: &UserRow, link: &str) -> Result<()> {
    let body = format!(
        "Hi {},\n\nWelcome to TypeWrite. Please verify your email address by \
         opening the link below:\n\n{}\n\nIf you did not sign up, ignore this message.\n",
        user.first_name, link
    );

    let email = Message::builder()
        .from(smtp.from.parse().context("SMTP from address is invalid")?)
        .to(user.email.parse().context("recipient address is invalid")?)
        .subject("Please Verify your Email")
        .body(body)?;

    let mut builder = SmtpTransport::relay(&smtp.host)?.port(smtp.port);
    if !smtp.username.is_empty() {
        builder = builder.credentials(Credentials::new(smtp.username.clone(), smtp.password.clone()));
    }
    builder.build().send(&email)?;
    Ok(())
}
