//! Shell-pasteable reconstruction of an outgoing request.
//!
//! The output is for operators only; nothing parses it back.

use crate::http::{HttpMethod, HttpRequest};

const BANNER: &str = "================ BAW API CALL ===================";
const RULE: &str = "=================================================";

/// Renders `request` as a multi-line `curl` command.
///
/// Headers keep the order of `request.headers`. The body flag is only added
/// for POST requests that carry a body; single quotes inside it are closed,
/// escaped and reopened (`'\''`) so the command survives a POSIX shell.
pub fn render_curl(request: &HttpRequest) -> String {
    let mut command = format!("curl -X {} \"{}\"", request.method, request.url);

    let header_lines = request
        .headers
        .iter()
        .map(|(name, value)| format!(" -H \"{name}: {value}\""))
        .collect::<Vec<_>>();
    if !header_lines.is_empty() {
        command.push_str(" \\\n");
        command.push_str(&header_lines.join(" \\\n"));
    }

    if let (HttpMethod::Post, Some(body)) = (request.method, &request.body) {
        command.push_str(" \\\n  -d '");
        command.push_str(&shell_escape_single_quoted(body));
        command.push('\'');
    }

    command
}

/// Escapes `text` for use inside a single-quoted shell string.
pub fn shell_escape_single_quoted(text: &str) -> String {
    text.replace('\'', "'\\''")
}

/// Wraps a rendered command in the banner that separates one call's log
/// block from the next.
pub fn diagnostic_block(curl: &str) -> String {
    format!("\n{BANNER}\n[BAW API] CURL COMMAND:\n{curl}\n{RULE}\n")
}
