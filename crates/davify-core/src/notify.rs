//! Notification message rendering.
//!
//! The message shown (and handed to whatever clipboard/notification glue the
//! caller wires up) after a successful upload. Templates use `{url}`,
//! `{lifetime}`, and `{hash}` placeholders; literal `\n` sequences in a
//! template become newlines, so patterns survive single-line env vars.

/// Typed fields available to the notification template.
#[derive(Debug, Clone, Copy)]
pub struct Notification<'a> {
    pub url: &'a str,
    pub lifetime: &'a str,
    /// Pre-rendered hash line(s) including trailing newline, or None.
    pub hash: Option<&'a str>,
}

/// Render `pattern` with the notification's fields.
pub fn render_notification(pattern: &str, notification: &Notification<'_>) -> String {
    pattern
        .replace("\\n", "\n")
        .replace("{url}", notification.url)
        .replace("{lifetime}", notification.lifetime)
        .replace("{hash}", notification.hash.unwrap_or(""))
}
