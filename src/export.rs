//! 会话导出：JSON、Markdown、纯文本与 HTML。
//!
//! # Conversation Export
//!
//! Renders a [`Conversation`] as a string in one of four formats. Writing
//! the result to disk or sharing it is left to the caller.
//!
//! ```rust
//! use deepseek_kit::export::{export, ExportFormat};
//! use deepseek_kit::types::{Conversation, Message};
//!
//! let conv = Conversation::new("Rust tips")
//!     .with_messages(vec![Message::user("Why <T>?"), Message::assistant("Generics.")]);
//! let html = export(&conv, ExportFormat::Html).unwrap();
//! assert!(html.contains("Why &lt;T&gt;?"));
//! assert_eq!("md".parse::<ExportFormat>().unwrap(), ExportFormat::Markdown);
//! ```

use crate::types::{Conversation, Message, MessageRole};
use crate::{Error, ErrorContext, Result};
use std::fmt::{self, Write};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Json,
    Markdown,
    PlainText,
    Html,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Json,
        ExportFormat::Markdown,
        ExportFormat::PlainText,
        ExportFormat::Html,
    ];

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
            Self::PlainText => "txt",
            Self::Html => "html",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Markdown => "text/markdown",
            Self::PlainText => "text/plain",
            Self::Html => "text/html",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "markdown",
            Self::PlainText => "text",
            Self::Html => "html",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" | "application/json" => Ok(Self::Json),
            "markdown" | "md" | "text/markdown" => Ok(Self::Markdown),
            "text" | "txt" | "plain" | "plaintext" | "text/plain" => Ok(Self::PlainText),
            "html" | "htm" | "text/html" => Ok(Self::Html),
            _ => Err(Error::validation_with_context(
                format!("unknown export format '{}'", s),
                ErrorContext::new()
                    .with_field_path("format")
                    .with_details("expected json, markdown, text or html"),
            )),
        }
    }
}

/// Render `conversation` as `format`.
pub fn export(conversation: &Conversation, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(conversation)?),
        ExportFormat::Markdown => Ok(to_markdown(conversation)),
        ExportFormat::PlainText => Ok(to_plain_text(conversation)),
        ExportFormat::Html => Ok(to_html(conversation)),
    }
}

/// `<title>.<ext>` with characters unsafe in file names replaced.
pub fn file_name(conversation: &Conversation, format: ExportFormat) -> String {
    let stem: String = conversation
        .title
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let stem = if stem.trim_matches('_').is_empty() {
        conversation.id.clone()
    } else {
        stem
    };
    format!("{}.{}", stem, format.extension())
}

fn role_label(role: MessageRole) -> &'static str {
    match role {
        MessageRole::System => "System",
        MessageRole::User => "User",
        MessageRole::Assistant => "Assistant",
        MessageRole::Tool => "Tool",
    }
}

fn tool_call_lines(msg: &Message) -> Vec<String> {
    msg.tool_calls
        .iter()
        .map(|c| format!("{}({})", c.name, c.arguments))
        .collect()
}

fn to_markdown(conv: &Conversation) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}\n", conv.title);
    let _ = writeln!(out, "_Created {}_\n", conv.created_at.format("%Y-%m-%d %H:%M UTC"));
    for msg in &conv.messages {
        let _ = writeln!(out, "## {}\n", role_label(msg.role));
        if let Some(reasoning) = msg.reasoning_content.as_deref().filter(|r| !r.is_empty()) {
            for line in reasoning.lines() {
                let _ = writeln!(out, "> {}", line);
            }
            out.push('\n');
        }
        if !msg.content.is_empty() {
            let _ = writeln!(out, "{}\n", msg.content);
        }
        for call in tool_call_lines(msg) {
            let _ = writeln!(out, "- tool call: `{}`", call);
        }
    }
    out.trim_end().to_string() + "\n"
}

fn to_plain_text(conv: &Conversation) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", conv.title);
    let _ = writeln!(out, "Created: {}\n", conv.created_at.to_rfc3339());
    for msg in &conv.messages {
        let _ = writeln!(out, "[{}] {}", msg.role, msg.content);
        for call in tool_call_lines(msg) {
            let _ = writeln!(out, "    -> {}", call);
        }
    }
    out
}

fn to_html(conv: &Conversation) -> String {
    let mut out = String::new();
    let title = escape_html(&conv.title);
    let _ = writeln!(out, "<!DOCTYPE html>");
    let _ = writeln!(out, "<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">");
    let _ = writeln!(out, "<title>{}</title>\n</head>\n<body>", title);
    let _ = writeln!(out, "<h1>{}</h1>", title);
    let _ = writeln!(
        out,
        "<p class=\"created\"><time datetime=\"{}\">{}</time></p>",
        conv.created_at.to_rfc3339(),
        conv.created_at.format("%Y-%m-%d %H:%M UTC")
    );
    for msg in &conv.messages {
        let _ = writeln!(out, "<div class=\"message {}\">", msg.role);
        let _ = writeln!(out, "<h2>{}</h2>", role_label(msg.role));
        if let Some(reasoning) = msg.reasoning_content.as_deref().filter(|r| !r.is_empty()) {
            let _ = writeln!(out, "<blockquote>{}</blockquote>", escape_html(reasoning));
        }
        let _ = writeln!(out, "<p>{}</p>", escape_html(&msg.content).replace('\n', "<br>"));
        for call in tool_call_lines(msg) {
            let _ = writeln!(out, "<pre class=\"tool-call\">{}</pre>", escape_html(&call));
        }
        let _ = writeln!(out, "</div>");
    }
    let _ = writeln!(out, "</body>\n</html>");
    out
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
