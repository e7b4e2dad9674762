//! Plain-text and HTML bodies for the two messages the service sends.
//!
//! HTML goes through Tera with autoescaping on, so addresses and enquiry
//! text from the submitter can never inject markup. Plain-text bodies are
//! sent verbatim.

use anyhow::{Context as _, Result};
use tera::{Context, Tera};

pub const VERIFICATION_SUBJECT: &str = "Verify your email address";
pub const ENQUIRY_SUBJECT: &str = "Exciting news! New enquiry awaits";

// Names keep the `.html` suffix; Tera only autoescapes templates named that way.
const VERIFICATION_HTML: (&str, &str) = (
    "verification.html",
    r#"<h1>Verify your email address</h1>
<p>Someone asked to verify <strong>{{ email }}</strong> for this account.</p>
<p><a href="{{ link }}">Verify email</a></p>
<p>If you did not ask for this, you can ignore this email.</p>
"#,
);

const ENQUIRY_HTML: (&str, &str) = (
    "enquiry.html",
    r#"<h1>New enquiry</h1>
<p>From: <strong>{{ name }}</strong> &lt;{{ email }}&gt;</p>
<p style="white-space: pre-wrap">{{ message }}</p>
"#,
);

pub struct Rendered {
    pub html: String,
    pub text: String,
}

/// Link the recipient follows to redeem `token`.
/// Tokens are base64url, so they go into the query string unescaped.
pub fn verification_link(app_url: &str, token: &str) -> String {
    format!("{}/verify-email?token={}", app_url.trim_end_matches('/'), token)
}

pub fn verification_email(app_url: &str, email: &str, token: &str) -> Result<Rendered> {
    let link = verification_link(app_url, token);

    let text = format!(
        "Verify your email address\n\n\
         Someone asked to verify {email} for this account.\n\
         Open the link below to confirm it was you:\n\n\
         {link}\n\n\
         If you did not ask for this, you can ignore this email."
    );

    let mut context = Context::new();
    context.insert("email", email);
    context.insert("link", &link);
    let html = render_html(VERIFICATION_HTML, &context)?;

    Ok(Rendered { html, text })
}

pub fn enquiry_email(name: &str, email: &str, message: &str) -> Result<Rendered> {
    let text = format!(
        "New enquiry\n\n\
         From: {name} <{email}>\n\n\
         {message}"
    );

    let mut context = Context::new();
    context.insert("name", name);
    context.insert("email", email);
    context.insert("message", message);
    let html = render_html(ENQUIRY_HTML, &context)?;

    Ok(Rendered { html, text })
}

fn render_html((name, source): (&str, &str), context: &Context) -> Result<String> {
    let mut tera = Tera::default();
    tera.add_raw_template(name, source)
        .with_context(|| format!("Failed to parse template {name}"))?;
    tera.render(name, context)
        .with_context(|| format!("Failed to render template {name}"))
}
