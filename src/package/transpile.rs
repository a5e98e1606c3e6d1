//! Command transpiler: one source template → one rendering per agent format
//!
//! Pure transformation. Nothing touches the filesystem here, so a malformed
//! template never leaves a partial output file behind.

use crate::core::error::ReleaseResult;
use crate::package::agent::{AgentTarget, FormatKind, SOURCE_PLACEHOLDER};
use crate::package::template::{CommandTemplate, ParsedTemplate};
use std::path::PathBuf;

/// A command rendered for one agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCommand {
  pub stem: String,
  /// Path relative to the package root (`<command_dir>/<stem><extension>`)
  pub relative_path: PathBuf,
  pub content: String,
}

/// Render one template for one agent
pub fn transpile(template: &CommandTemplate, target: &AgentTarget) -> ReleaseResult<RenderedCommand> {
  let parsed = template.parse()?;
  let body = parsed.body.replace(SOURCE_PLACEHOLDER, target.placeholder);

  let content = match target.format {
    FormatKind::StructuredConfig => render_structured(&parsed, &body),
    FormatKind::WrappedMarkdown => render_wrapped(&parsed, &template.stem, &body),
    FormatKind::PlainMarkdown => body,
  };

  Ok(RenderedCommand {
    stem: template.stem.clone(),
    relative_path: target.command_path(&template.stem),
    content,
  })
}

/// Render every template for one agent; fails on the first malformed template
pub fn transpile_all(templates: &[CommandTemplate], target: &AgentTarget) -> ReleaseResult<Vec<RenderedCommand>> {
  templates.iter().map(|t| transpile(t, target)).collect()
}

fn render_structured(parsed: &ParsedTemplate, body: &str) -> String {
  let description = toml_edit::Value::from(parsed.description.as_str()).to_string();
  format!(
    "description = {}\n\nprompt = \"\"\"\n{}\n\"\"\"\n",
    description,
    escape_multiline_basic(body.trim_end_matches(['\n', '\r']))
  )
}

fn render_wrapped(parsed: &ParsedTemplate, stem: &str, body: &str) -> String {
  let heading = parsed.description.split('.').next().unwrap_or_default().trim();
  let heading = if heading.is_empty() { stem } else { heading };
  format!("# {}\n\n{}", heading, body)
}

/// Escape text for a TOML multi-line basic string so it parses back verbatim
fn escape_multiline_basic(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  let mut quote_run = 0;

  for ch in text.chars() {
    if ch == '"' {
      quote_run += 1;
      // A third consecutive quote would close the string
      if quote_run == 3 {
        out.push_str("\\\"");
        quote_run = 0;
        continue;
      }
      out.push('"');
      continue;
    }
    quote_run = 0;

    match ch {
      '\\' => out.push_str("\\\\"),
      '\n' | '\t' => out.push(ch),
      '\r' => out.push_str("\\r"),
      c if (c as u32) < 0x20 || c as u32 == 0x7f => out.push_str(&format!("\\u{:04X}", c as u32)),
      c => out.push(c),
    }
  }

  out
}
