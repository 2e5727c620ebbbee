use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;

use docgenius_core::OperationKind;

pub fn render_download(result: &str, kind: OperationKind) -> String {
    static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
    let header = format!(
        "DocGenius - {} Result\nGenerated on: {}\n{}\n\n",
        kind.capitalized(),
        Utc::now().format("%Y-%m-%d"),
        "=".repeat(50)
    );
    let plain = TAG_RE.replace_all(result, "").replace("&nbsp;", " ");
    header + &plain
}
