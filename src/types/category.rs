//! Transaction category taxonomy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of labels a transaction can be categorized into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CategoryLabel {
    Food,
    Transport,
    Entertainment,
    Housing,
    Utilities,
    Income,
    Shopping,
    Health,
    Education,
    #[default]
    Miscellaneous,
}

impl CategoryLabel {
    /// Every label, in prompt order
    pub const ALL: [CategoryLabel; 10] = [
        CategoryLabel::Food,
        CategoryLabel::Transport,
        CategoryLabel::Entertainment,
        CategoryLabel::Housing,
        CategoryLabel::Utilities,
        CategoryLabel::Income,
        CategoryLabel::Shopping,
        CategoryLabel::Health,
        CategoryLabel::Education,
        CategoryLabel::Miscellaneous,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryLabel::Food => "Food",
            CategoryLabel::Transport => "Transport",
            CategoryLabel::Entertainment => "Entertainment",
            CategoryLabel::Housing => "Housing",
            CategoryLabel::Utilities => "Utilities",
            CategoryLabel::Income => "Income",
            CategoryLabel::Shopping => "Shopping",
            CategoryLabel::Health => "Health",
            CategoryLabel::Education => "Education",
            CategoryLabel::Miscellaneous => "Miscellaneous",
        }
    }

    /// Comma-separated list used inside prompts
    pub fn enumeration() -> String {
        Self::ALL
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for CategoryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryLabel {
    type Err = String;

    /// Case-insensitive exact match against the taxonomy
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

impl From<CategoryLabel> for String {
    fn from(label: CategoryLabel) -> Self {
        label.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!("food".parse::<CategoryLabel>(), Ok(CategoryLabel::Food));
        assert_eq!("UTILITIES".parse::<CategoryLabel>(), Ok(CategoryLabel::Utilities));
        assert!("Groceries".parse::<CategoryLabel>().is_err());
    }

    #[test]
    fn test_enumeration_lists_all_labels() {
        let list = CategoryLabel::enumeration();
        assert_eq!(list.split(", ").count(), 10);
        assert!(list.starts_with("Food, Transport"));
        assert!(list.ends_with("Miscellaneous"));
    }

    #[test]
    fn test_default_is_miscellaneous() {
        assert_eq!(CategoryLabel::default(), CategoryLabel::Miscellaneous);
    }
}
