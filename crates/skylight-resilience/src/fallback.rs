//! Fallback content shown in place of a broken UI
//!
//! The bootstrap markup is assembled as a plain string and written straight
//! into the mount point. It must stay independent of the UI component model:
//! by the time it is needed the rendering runtime is presumed broken.

use std::fmt::Write as _;

/// Tips listed under an in-page render failure
pub const RENDER_TIPS: &[&str] = &[
    "Check browser console for detailed error messages",
    "Try reloading the page",
    "Clear browser cache and cookies",
    "Try using an incognito/private browsing window",
    "Check if you're using the latest version of your browser",
];

/// Tips listed when the application failed to load at all
pub const BOOTSTRAP_TIPS: &[&str] = &[
    "Check browser console for detailed error messages (F12)",
    "Clear browser cache and cookies",
    "Try using an incognito/private browsing window",
    "Disable browser extensions temporarily",
    "Check your network connection",
];

/// Marker attribute on the injected bootstrap fallback root
pub const BOOTSTRAP_FALLBACK_MARKER: &str = "data-skylight-fallback";

/// Escape text for inclusion in HTML element content or attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Raw markup shown when activation failed: the message and one reload control
pub fn bootstrap_fallback_markup(message: &str) -> String {
    let mut tips = String::new();
    for tip in BOOTSTRAP_TIPS {
        // Writing into a String cannot fail
        let _ = write!(tips, "<li>{}</li>", escape_html(tip));
    }

    format!(
        r#"<div {marker}="bootstrap" style="min-height: 100vh; padding: 20px; background-color: #FFFFFF; color: #0A0A0A; font-family: Inter, -apple-system, BlinkMacSystemFont, sans-serif;">
  <div style="max-width: 800px; margin: 0 auto; padding: 40px 20px;">
    <h1 style="font-size: 2rem; font-weight: bold; margin-bottom: 1rem; color: #DC2626;">Application Failed to Load</h1>
    <div style="background-color: #FEF2F2; border: 2px solid #FECACA; border-radius: 8px; padding: 20px; margin-bottom: 20px;">
      <h2 style="font-size: 1.25rem; font-weight: 600; margin-bottom: 10px; color: #DC2626;">Error Details:</h2>
      <pre style="font-size: 0.875rem; color: #7F1D1D; overflow: auto; white-space: pre-wrap;">{message}</pre>
    </div>
    <button type="button" onclick="window.location.reload()" style="padding: 10px 20px; background-color: #8A5FFF; color: #FFFFFF; border: none; border-radius: 6px; font-size: 1rem; font-weight: 500; cursor: pointer;">Reload Page</button>
    <div style="margin-top: 30px; padding: 15px; background-color: #EFF6FF; border: 1px solid #93C5FD; border-radius: 8px; font-size: 0.875rem; color: #1E40AF;">
      <strong>Troubleshooting Tips:</strong>
      <ul style="margin-top: 10px; padding-left: 20px;">{tips}</ul>
    </div>
  </div>
</div>"#,
        marker = BOOTSTRAP_FALLBACK_MARKER,
        message = escape_html(message),
        tips = tips,
    )
}
