//! Prompt template loaded from a static resource.
//!
//! The template contains the `{text}` placeholder at least once. `{{` and `}}` stand for literal
//! braces; any other brace usage is rejected when the template is parsed, which happens once at
//! startup so a broken template never reaches a request.

use std::path::{Path, PathBuf};
use thiserror::Error;

const PLACEHOLDER: &str = "text";

/// Errors raised while loading or parsing the prompt template.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Template resource could not be read.
    #[error("Failed to read prompt template {path}: {source}")]
    Read {
        /// Location of the template resource.
        path: PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },
    /// Template content did not follow the placeholder grammar.
    #[error("Prompt template is malformed: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Text,
}

/// Parsed prompt template ready for substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Read and parse the template at `path`.
    pub async fn load(path: &Path) -> Result<Self, TemplateError> {
        let source = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| TemplateError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let template = Self::parse(&source)?;
        tracing::debug!(path = %path.display(), "Loaded prompt template");
        Ok(template)
    }

    /// Parse template source text.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(inner) => name.push(inner),
                            None => {
                                return Err(TemplateError::Malformed(
                                    "unclosed '{' in template".into(),
                                ));
                            }
                        }
                    }
                    if name != PLACEHOLDER {
                        return Err(TemplateError::Malformed(format!(
                            "unknown placeholder '{{{name}}}'"
                        )));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Text);
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => {
                    return Err(TemplateError::Malformed(
                        "single '}' encountered in template".into(),
                    ));
                }
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        if !segments.contains(&Segment::Text) {
            return Err(TemplateError::Malformed(
                "template has no {text} placeholder".into(),
            ));
        }
        Ok(Self { segments })
    }

    /// Substitute `text` into every placeholder.
    pub fn render(&self, text: &str) -> String {
        let mut rendered = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(literal) => rendered.push_str(literal),
                Segment::Text => rendered.push_str(text),
            }
        }
        rendered
    }
}
