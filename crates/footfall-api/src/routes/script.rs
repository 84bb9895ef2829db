//! The client tracking script: `GET /a/a.js`.

use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::{Extension, Router, routing::get};
use footfall_core::identity::Identity;

use crate::state::AppState;

/// Placeholder in the script template replaced by the visitor identity.
pub const IDENTITY_PLACEHOLDER: &str = "##USER_ID##";

const SCRIPT_TEMPLATE: &str = include_str!("../../assets/a.js");

/// Renders the script for `identity`.
///
/// The placeholder sits inside a single-quoted JavaScript string, so the
/// identity is escaped for that context; client-echoed identities are not
/// trusted to be base64.
#[must_use]
pub fn render_script(identity: &Identity) -> String {
    SCRIPT_TEMPLATE.replacen(IDENTITY_PLACEHOLDER, &escape_js(identity.as_str()), 1)
}

fn escape_js(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '<' => escaped.push_str("\\x3c"),
            '>' => escaped.push_str("\\x3e"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// GET /a/a.js
async fn client_script(Extension(identity): Extension<Identity>) -> impl IntoResponse {
    ([(CONTENT_TYPE, "application/javascript")], render_script(&identity))
}

/// Returns the router for the client script.
pub fn router() -> Router<AppState> {
    Router::new().route("/a/a.js", get(client_script))
}
