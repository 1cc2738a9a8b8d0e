//! Plain HTML pages.
//!
//! The report page is a dump: one section per source with its status and
//! the pretty-printed payload. No templates, no client-side code.

use std::fmt::Write;

use crate::outcome::SourceResult;
use crate::pipeline::AggregatedReport;

const STYLE: &str = "body{font-family:sans-serif;max-width:60rem;margin:2rem auto;padding:0 1rem}\
pre{background:#f4f4f4;padding:1rem;overflow-x:auto}\
.success{color:#1a7f37}.empty{color:#9a6700}.failure{color:#cf222e}";

/// Escapes text for use in element content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        escape_html(title)
    )
}

pub fn home_page() -> String {
    page(
        "SEO Dashboard",
        "<h1>SEO Dashboard</h1>\n\
         <form method=\"post\" action=\"/process_url\">\n\
         <label for=\"url\">Site URL or domain</label>\n\
         <input id=\"url\" name=\"url\" type=\"text\" placeholder=\"example.com\" required>\n\
         <button type=\"submit\">Analyze</button>\n\
         </form>\n\
         <p><a href=\"/auth\">Sign in with Google</a> for Analytics and Search Console data.</p>",
    )
}

pub fn report_page(report: &AggregatedReport) -> String {
    let mut body = String::new();
    let _ = writeln!(body, "<h1>Report for {}</h1>", escape_html(&report.target));
    let _ = writeln!(
        body,
        "<p>{} succeeded, {} empty, {} failed</p>",
        report.summary.succeeded, report.summary.empty, report.summary.failed
    );

    for (name, outcome) in &report.sources {
        let _ = writeln!(body, "<section id=\"{name}\">\n<h2>{name}</h2>");
        match outcome {
            SourceResult::Success { data } => {
                let json = serde_json::to_string_pretty(data).unwrap_or_default();
                let _ = writeln!(
                    body,
                    "<p class=\"success\">success</p>\n<pre>{}</pre>",
                    escape_html(&json)
                );
            }
            SourceResult::Empty { reason } => {
                let _ = writeln!(body, "<p class=\"empty\">empty: {}</p>", escape_html(reason));
            }
            SourceResult::Failure { kind, message, .. } => {
                let _ = writeln!(
                    body,
                    "<p class=\"failure\">{kind}: {}</p>",
                    escape_html(message)
                );
            }
        }
        body.push_str("</section>\n");
    }
    body.push_str("<p><a href=\"/\">Back</a></p>");
    page(&format!("Report for {}", report.target), &body)
}

pub fn error_page(message: &str) -> String {
    page(
        "Error",
        &format!(
            "<h1>Error</h1>\n<p>{}</p>\n<p><a href=\"/\">Back</a></p>",
            escape_html(message)
        ),
    )
}
