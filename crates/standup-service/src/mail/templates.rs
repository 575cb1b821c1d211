//! Message templates for the links sent by the auth flows.

use standup_entity::token::TokenPurpose;

/// A rendered subject and HTML body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html: String,
}

/// Render the message for a token of `purpose` linking to `url`.
pub fn for_purpose(purpose: TokenPurpose, url: &str) -> Template {
    match purpose {
        TokenPurpose::VerifyEmail => verification_email(url),
        TokenPurpose::ResetPassword => reset_password_email(url),
        TokenPurpose::ChangeEmail => change_email_verification(url),
        TokenPurpose::DeleteAccount => delete_account_email(url),
    }
}

/// Email address verification after sign-up.
pub fn verification_email(url: &str) -> Template {
    link_template(
        "Verify your email address",
        "verify your email address",
        url,
        None,
    )
}

/// Password reset link.
pub fn reset_password_email(url: &str) -> Template {
    link_template("Reset your password", "reset your password", url, None)
}

/// Confirmation sent to a new address during an email change.
pub fn change_email_verification(url: &str) -> Template {
    link_template(
        "Verify your new email address",
        "verify your new email address",
        url,
        None,
    )
}

/// Account deletion confirmation.
pub fn delete_account_email(url: &str) -> Template {
    link_template(
        "Confirm account deletion",
        "confirm your account deletion",
        url,
        Some("This action cannot be undone."),
    )
}

fn link_template(title: &str, action: &str, url: &str, footer: Option<&str>) -> Template {
    let url = escape_html(url);
    let mut html = format!(
        "<h1>{title}</h1>\n<p>Click the link below to {action}:</p>\n<a href=\"{url}\">{url}</a>\n"
    );
    if let Some(footer) = footer {
        html.push_str(&format!("<p>{footer}</p>\n"));
    }
    Template {
        subject: title.to_string(),
        html,
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
