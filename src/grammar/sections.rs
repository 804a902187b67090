use crate::error::{GrammarError, Result};

/// The three `%%`-separated parts of a grammar specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSections {
    pub declarations: String,
    /// Rules with comments removed.
    pub rules: String,
    /// Passed through verbatim to backends.
    pub support: String,
    /// Left side of the first rule.
    pub start_symbol: String,
}

impl SpecSections {
    pub fn split(spec: &str) -> Result<Self> {
        let first = spec
            .find("%%")
            .ok_or(GrammarError::MissingSectionMarker("first"))?;
        let rest = &spec[first + 2..];
        let second = rest
            .find("%%")
            .ok_or(GrammarError::MissingSectionMarker("second"))?;

        let rules = strip_comments(&rest[..second], "rules")?;
        let trimmed = rules.trim();
        if trimmed.is_empty() {
            return Err(GrammarError::EmptyRules);
        }

        let colon = trimmed.find(':').ok_or(GrammarError::MissingStartRule)?;
        let start_symbol = trimmed[..colon].trim();
        if !is_identifier(start_symbol) {
            return Err(GrammarError::MissingStartRule);
        }

        Ok(Self {
            declarations: spec[..first].to_string(),
            start_symbol: start_symbol.to_string(),
            rules,
            support: rest[second + 2..].to_string(),
        })
    }
}

/// Removes `/* ... */` comments. Each comment becomes a single space followed
/// by the newlines it contained, so line numbers survive.
pub fn strip_comments(text: &str, section: &'static str) -> Result<String> {
    let mut output = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find("/*") {
        output.push_str(&rest[..open]);
        let body = &rest[open + 2..];
        let close = body
            .find("*/")
            .ok_or(GrammarError::UnmatchedComment(section))?;
        output.push(' ');
        output.extend(body[..close].chars().filter(|&c| c == '\n'));
        rest = &body[close + 2..];
    }
    output.push_str(rest);
    Ok(output)
}

pub fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

pub fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_identifier_char)
}
