//! Prompt Construction
//!
//! Small builder shared by the chat and categorization prompts, plus the two
//! prompt families themselves:
//!
//! - [`chat`]: grounds a free-text question in recent transaction history
//! - [`categorize`]: asks for exactly one label and normalizes the answer
//!
//! Everything here is pure string assembly. Fetching transactions and calling
//! the model is the caller's job.

pub mod categorize;
pub mod chat;

pub use categorize::{build_categorization_prompt, normalize_category, normalize_outcome};
pub use chat::{build_chat_prompt, render_transaction_block, render_transaction_line};

/// Prompt section types
#[derive(Debug, Clone)]
pub enum PromptSection {
    /// Persona the model should adopt
    Role(String),
    /// Bulleted answer requirements
    Rules(Vec<String>),
    /// Text with optional header
    Text {
        header: Option<String>,
        content: String,
    },
}

/// Builder for sectioned prompts
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    sections: Vec<PromptSection>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the persona line
    pub fn role(mut self, persona: &str) -> Self {
        self.sections.push(PromptSection::Role(persona.to_string()));
        self
    }

    /// Add a bulleted list of requirements
    pub fn rules<I, S>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sections
            .push(PromptSection::Rules(rules.into_iter().map(Into::into).collect()));
        self
    }

    /// Add a plain text section
    pub fn text(mut self, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: None,
            content: content.to_string(),
        });
        self
    }

    /// Add a text section under a header
    pub fn section(mut self, header: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: Some(header.to_string()),
            content: content.to_string(),
        });
        self
    }

    /// Add a text section only when `content` is non-blank
    pub fn optional_section(self, header: &str, content: Option<&str>) -> Self {
        match content.map(str::trim).filter(|c| !c.is_empty()) {
            Some(content) => self.section(header, content),
            None => self,
        }
    }

    pub fn build(self) -> String {
        let mut prompt = String::new();

        for section in self.sections {
            match section {
                PromptSection::Role(persona) => {
                    prompt.push_str(&format!("You are {}.\n\n", persona));
                }
                PromptSection::Rules(rules) => {
                    for rule in rules {
                        prompt.push_str(&format!("- {}\n", rule));
                    }
                    prompt.push('\n');
                }
                PromptSection::Text { header, content } => {
                    if let Some(h) = header {
                        prompt.push_str(&format!("{}:\n", h));
                    }
                    prompt.push_str(&content);
                    prompt.push_str("\n\n");
                }
            }
        }

        prompt.trim_end().to_string()
    }
}
