//! Markup and script stripping for free text.
//!
//! Used on the inbound user message and again on the model reply before it
//! is relayed. No tag is allowed through.

use std::sync::LazyLock;

use regex::Regex;

static SCRIPT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("valid regex"));

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"</?[A-Za-z!?][^<>]*>").expect("valid regex"));

static ANGLE_BRACKETS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[<>]").expect("valid regex"));

static JAVASCRIPT_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)javascript:").expect("valid regex"));

static EVENT_HANDLER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)on\w+=").expect("valid regex"));

/// Strip markup, `javascript:` references and inline event handlers.
///
/// Idempotent: passes repeat until the text reaches a fixed point, so a
/// removal that splices two fragments into a fresh match is caught too.
/// Every pass only deletes characters, which bounds the loop.
pub fn sanitize(input: &str) -> String {
    let mut current = sanitize_once(input);
    loop {
        let next = sanitize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn sanitize_once(input: &str) -> String {
    let text = SCRIPT_BLOCK.replace_all(input, "");
    let text = TAG.replace_all(&text, "");
    let text = ANGLE_BRACKETS.replace_all(&text, "");
    let text = JAVASCRIPT_SCHEME.replace_all(&text, "");
    let text = EVENT_HANDLER.replace_all(&text, "");
    text.trim().to_string()
}
