//! Upload page served at `/`.
//!
//! The page is a single HTML template (`server/assets/upload.html`) with
//! `{{TOKEN}}` placeholders, loaded at compile time. It posts the chosen
//! image to `/api/predict` and shows the label or the error message.

const TEMPLATE: &str = include_str!("assets/upload.html");

const TITLE: &str = "Image Cluster Prediction";

pub fn render_upload_page(max_upload_bytes: usize) -> String {
    let html = TEMPLATE
        .replace("{{TITLE}}", TITLE)
        .replace("{{MAX_UPLOAD_MB}}", &(max_upload_bytes / (1024 * 1024)).to_string());
    blank_remaining(html)
}

/// Replaces any `{{TOKEN}}` left unsubstituted with an empty string.
fn blank_remaining(mut html: String) -> String {
    while let Some(start) = html.find("{{") {
        if let Some(end) = html[start..].find("}}") {
            html.replace_range(start..start + end + 2, "");
        } else {
            break;
        }
    }
    html
}
