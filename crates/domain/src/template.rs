use crate::message::MessageChannel;
use crate::shared::entity::{Entity, ID};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

pub type PlaceholderValues = HashMap<String, String>;

/// Names of every `{{placeholder}}` token in the given text, deduplicated,
/// in order of first appearance.
pub fn extract_placeholders(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let name = &after[..end];
                if !name.is_empty() && !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
                rest = &after[end + 2..];
            }
            None => break,
        }
    }
    names
}

/// The subset of tokens in `text` with no matching key in `values`. A
/// nonempty result means the text cannot be fully rendered yet.
pub fn missing_placeholders(text: &str, values: &PlaceholderValues) -> Vec<String> {
    extract_placeholders(text)
        .into_iter()
        .filter(|name| !values.contains_key(name))
        .collect()
}

/// Replaces every `{{name}}` token with its value in a single pass.
/// Tokens without a value stay verbatim rather than vanishing, and
/// substituted values are never rescanned for tokens.
pub fn render_placeholders(text: &str, values: &PlaceholderValues) -> String {
    let mut rendered = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("{{") {
        rendered.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let name = &after[..end];
                match values.get(name) {
                    Some(value) => rendered.push_str(value),
                    None => {
                        rendered.push_str("{{");
                        rendered.push_str(name);
                        rendered.push_str("}}");
                    }
                }
                rest = &after[end + 2..];
            }
            None => {
                // No closing braces, keep the tail as written
                rendered.push_str(&rest[start..]);
                return rendered;
            }
        }
    }
    rendered.push_str(rest);
    rendered
}

#[derive(Error, Debug, PartialEq)]
pub enum TemplateError {
    #[error("Template is missing values for placeholders: {}", .0.join(", "))]
    MissingPlaceholderValues(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMessage {
    pub subject: Option<String>,
    pub body: String,
}

/// A reusable message body with `{{placeholder}}` tokens. The declared
/// `placeholders` list is what authors promise callers may supply, the
/// body may not reference names outside it.
#[derive(Debug, Clone)]
pub struct MessageTemplate {
    pub id: ID,
    pub name: String,
    pub category: String,
    pub channel: MessageChannel,
    pub is_html: bool,
    pub default_sender: String,
    pub default_subject: Option<String>,
    pub body: String,
    pub placeholders: Vec<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MessageTemplate {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        category: String,
        channel: MessageChannel,
        is_html: bool,
        default_sender: String,
        default_subject: Option<String>,
        body: String,
        placeholders: Vec<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Default::default(),
            name,
            category,
            channel,
            is_html,
            default_sender,
            default_subject,
            body,
            placeholders,
            is_default: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Tokens used by the body or subject that the template does not declare.
    pub fn undeclared_placeholders(&self) -> Vec<String> {
        let mut tokens = extract_placeholders(&self.body);
        if let Some(subject) = &self.default_subject {
            for token in extract_placeholders(subject) {
                if !tokens.contains(&token) {
                    tokens.push(token);
                }
            }
        }
        tokens
            .into_iter()
            .filter(|token| !self.placeholders.contains(token))
            .collect()
    }

    /// Declared or used tokens with no value supplied.
    pub fn missing_values(&self, values: &PlaceholderValues) -> Vec<String> {
        let mut missing = missing_placeholders(&self.body, values);
        if let Some(subject) = &self.default_subject {
            for token in missing_placeholders(subject, values) {
                if !missing.contains(&token) {
                    missing.push(token);
                }
            }
        }
        missing
    }

    pub fn render(&self, values: &PlaceholderValues) -> Result<RenderedMessage, TemplateError> {
        let missing = self.missing_values(values);
        if !missing.is_empty() {
            return Err(TemplateError::MissingPlaceholderValues(missing));
        }
        Ok(RenderedMessage {
            subject: self
                .default_subject
                .as_ref()
                .map(|subject| render_placeholders(subject, values)),
            body: render_placeholders(&self.body, values),
        })
    }
}

impl Entity for MessageTemplate {
    fn id(&self) -> &ID {
        &self.id
    }
}

/// Links a message back to the template and input values that produced it.
/// A retry renders from these stored inputs against the current template
/// body, never from the message's possibly stale rendered content.
#[derive(Debug, Clone)]
pub struct TemplateUsage {
    pub id: ID,
    pub message_id: ID,
    pub template_id: ID,
    pub values: PlaceholderValues,
    pub created_at: DateTime<Utc>,
}

impl TemplateUsage {
    pub fn new(
        message_id: ID,
        template_id: ID,
        values: PlaceholderValues,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Default::default(),
            message_id,
            template_id,
            values,
            created_at: now,
        }
    }
}

impl Entity for TemplateUsage {
    fn id(&self) -> &ID {
        &self.id
    }
}
