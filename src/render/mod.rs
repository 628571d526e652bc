//! Markdown comment rendering.
//!
//! Builds the human-readable comment bodies: a count header with a severity
//! emoji per stack, a collapsible details block carrying the destructive
//! warning and the verbatim diff text, and the stage-level aggregate with an
//! optional title heading and destructive banner.

use crate::core::{ClassificationResult, TemplateDiff};

/// Renders the verbatim textual diff shown inside the fenced code block.
/// Concrete rich formatters are external; `bindings::UnifiedDiffFormatter`
/// ships as the default.
pub trait DiffFormatter {
    fn format_human(&self, diff: &TemplateDiff) -> String;
}

/// Emoji handling for rendered comments, in the spirit of terminal emoji
/// toggles: CI logs and some hosts prefer plain ASCII.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderStyle {
    emoji: bool,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self { emoji: true }
    }
}

impl RenderStyle {
    pub fn plain() -> Self {
        Self { emoji: false }
    }

    fn ok(&self) -> &'static str {
        if self.emoji {
            "✅"
        } else {
            "[ok]"
        }
    }

    fn error(&self) -> &'static str {
        if self.emoji {
            "🚨"
        } else {
            "[!!]"
        }
    }

    fn warning(&self) -> &'static str {
        if self.emoji {
            "⚠️"
        } else {
            "[!]"
        }
    }

    fn info(&self) -> &'static str {
        if self.emoji {
            "🆕"
        } else {
            "[+]"
        }
    }
}

pub struct CommentRenderer<'a> {
    style: RenderStyle,
    formatter: &'a dyn DiffFormatter,
}

impl<'a> CommentRenderer<'a> {
    pub fn new(formatter: &'a dyn DiffFormatter, style: RenderStyle) -> Self {
        Self { style, formatter }
    }

    /// Render one stack's comment section.
    ///
    /// An empty diff short-circuits to a single "no changes" line with no
    /// detail block.
    pub fn render_unit(
        &self,
        stack_name: &str,
        diff: &TemplateDiff,
        classification: &ClassificationResult,
    ) -> Vec<String> {
        if diff.is_empty() {
            return vec![format!(
                "No changes for stack: `{stack_name}` {}",
                self.style.ok()
            )];
        }

        let mut lines = vec![
            format!(
                "#### {} Stack: `{}` — {} to create, {} to update, {} to destroy",
                self.severity(classification),
                stack_name,
                classification.created,
                classification.updated,
                classification.removed,
            ),
            String::new(),
            "<details>".to_string(),
            "<summary>Template diff</summary>".to_string(),
            String::new(),
        ];

        if !classification.destructive.is_empty() {
            lines.push(format!("> {} **Destructive changes**", self.style.warning()));
            lines.push(">".to_string());
            for change in &classification.destructive {
                lines.push(format!(
                    "> {} `{}` / `{}` — {}",
                    self.style.error(),
                    change.stack_id,
                    change.logical_id,
                    change.impact,
                ));
            }
            lines.push(String::new());
        }

        lines.push("```shell".to_string());
        lines.extend(self.formatter.format_human(diff).lines().map(str::to_string));
        lines.push("```".to_string());
        lines.push(String::new());
        lines.push("</details>".to_string());
        lines
    }

    /// Render the stage-level aggregate from its members' sections.
    ///
    /// Returns empty when every member body is empty; whether an all-quiet
    /// stage produces a comment at all is the publisher's call.
    pub fn render_group(
        &self,
        stage_name: &str,
        unit_bodies: &[Vec<String>],
        destructive_total: usize,
        title: Option<&str>,
    ) -> Vec<String> {
        if unit_bodies.iter().all(|body| body.is_empty()) {
            return Vec::new();
        }

        let mut lines = Vec::new();
        if let Some(title) = title {
            lines.push(format!("# {title}"));
            lines.push(String::new());
        }
        lines.push(format!("## Stage: `{stage_name}`"));
        if destructive_total > 0 {
            lines.push(String::new());
            lines.push(format!(
                "> {} {destructive_total} destructive change(s) in this stage",
                self.style.error()
            ));
        }
        for body in unit_bodies.iter().filter(|body| !body.is_empty()) {
            lines.push(String::new());
            lines.extend(body.iter().cloned());
        }
        lines
    }

    /// Prepend the configured title to a single stack's body, for fallback
    /// publishing where each stack gets its own comment.
    pub fn with_title(&self, title: Option<&str>, body: Vec<String>) -> Vec<String> {
        match title {
            Some(title) => {
                let mut lines = vec![format!("# {title}"), String::new()];
                lines.extend(body);
                lines
            }
            None => body,
        }
    }

    // Severity precedence: destructive or removed beats updated beats created.
    fn severity(&self, classification: &ClassificationResult) -> &'static str {
        if !classification.destructive.is_empty() || classification.removed > 0 {
            self.style.error()
        } else if classification.updated > 0 {
            self.style.warning()
        } else if classification.created > 0 {
            self.style.info()
        } else {
            self.style.ok()
        }
    }
}
