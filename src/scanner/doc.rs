//! Doc-comment recognition and normalization.

/// `///` line comments and `/** */` block comments document the item that
/// follows. `////`, `/***` and inner (`//!`, `/*!`) comments do not.
pub fn is_outer_doc(comment: &str) -> bool {
    (comment.starts_with("///") && !comment.starts_with("////"))
        || (comment.starts_with("/**")
            && !comment.starts_with("/***")
            && comment != "/**/")
}

/// Strip delimiters and join the remaining prose lines with single spaces.
///
/// Returns an empty string when no prose remains.
pub fn normalize<S: AsRef<str>>(comments: &[S]) -> String {
    let mut lines = Vec::new();
    for comment in comments {
        let comment = comment.as_ref().trim();
        if let Some(rest) = comment.strip_prefix("///") {
            lines.push(rest.trim().to_string());
        } else if let Some(body) = comment.strip_prefix("/**") {
            let body = body.strip_suffix("*/").unwrap_or(body);
            for line in body.lines() {
                let line = line.trim();
                let line = line.strip_prefix('*').unwrap_or(line);
                lines.push(line.trim().to_string());
            }
        }
    }
    lines.retain(|l| !l.is_empty());
    lines.join(" ")
}
