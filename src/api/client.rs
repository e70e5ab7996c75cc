use serde_json::Value;
use yansi::Paint;
use std::sync::atomic::{AtomicBool, Ordering};

static SILENT: AtomicBool = AtomicBool::new(false);

pub fn set_silent(silent: bool) {
    SILENT.store(silent, Ordering::Relaxed);
}

pub fn is_silent() -> bool {
    SILENT.load(Ordering::Relaxed)
}

fn log_output(msg: String) {
    if !is_silent() {
        println!("{}", msg);
    }
}

/// Shared HTTP client with the crate user agent and a per-request timeout.
pub fn build_http_client(timeout: Option<std::time::Duration>) -> reqwest::Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .user_agent(format!("oasis/{}", env!("CARGO_PKG_VERSION")));
    if let Some(t) = timeout {
        builder = builder.timeout(t);
    }
    builder.build()
}

/// Print the curl equivalent of a request.
///
/// `url` must already have secrets masked; header values in `headers` are
/// printed as given.
pub fn log_request(method: &str, url: &str, headers: &[(&str, &str)], body: Option<&Value>) {
    if is_silent() {
        return;
    }
    let mut parts = Vec::new();
    parts.push(Paint::new("curl").fg(yansi::Color::Green).bold().to_string());
    parts.push(format!("-X {}", Paint::new(method).fg(yansi::Color::Yellow).bold()));
    parts.push(format!("'{}'", Paint::new(url).fg(yansi::Color::Cyan)));

    for (name, value) in headers {
        parts.push(format!("{} {}",
            Paint::new("-H").fg(yansi::Color::Magenta),
            Paint::new(format!("'{}: {}'", name, value)).fg(yansi::Color::Magenta)
        ));
    }

    if let Some(d) = body {
        let json_str = serde_json::to_string_pretty(d).unwrap_or_default();
        let escaped_json = json_str.replace("'", "'\\''");
        parts.push(format!("{} {}",
            Paint::new("-d").fg(yansi::Color::Blue),
            Paint::new(format!("'{}'", escaped_json)).fg(yansi::Color::White)
        ));
    }
    log_output(format!("Request:\n{}", parts.join(" ")));
}

/// Print a response summary in dimmed grey.
pub fn log_response(summary: &str) {
    if is_silent() {
        return;
    }
    let response_str = Paint::new(summary).rgb(100, 100, 100).to_string();
    log_output(format!("Response:\n{}", response_str));
}
