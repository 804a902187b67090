use std::collections::HashMap;

use crate::error::{GrammarError, Result};

use super::{
    grammar::{Associativity, Precedence},
    sections::{is_identifier_char, strip_comments},
};

/// Everything the declarations section contributes to the grammar.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Declarations {
    /// Contents of the `%{ ... %}` block, without the markers.
    pub literal_block: String,
    /// The `{ ... }` body of `%union`, braces included.
    pub union: Option<String>,
    /// Tokens in declaration order.
    pub tokens: Vec<String>,
    pub precedence: HashMap<String, Precedence>,
    pub token_members: HashMap<String, String>,
    pub type_members: HashMap<String, String>,
}

enum MemberTarget {
    Token,
    Type,
}

impl Declarations {
    pub fn process(text: &str) -> Result<Self> {
        let mut decl = Self::default();
        let mut text = text.to_string();

        if let Some(open) = text.find("%{") {
            let close = text[open + 2..]
                .find("%}")
                .ok_or(GrammarError::UnmatchedLiteralBlock)?
                + open
                + 2;
            decl.literal_block = text[open + 2..close].to_string();
            blank_out(&mut text, open, close + 2);
        }

        if let Some(start) = text.find("%union") {
            let (open, close) = find_braced(&text, start + "%union".len())?;
            decl.union = Some(text[open..=close].to_string());
            blank_out(&mut text, start, close + 1);
        }

        let text = strip_comments(&text, "declarations")?;

        let mut level = 0;
        for (i, line) in text.lines().enumerate() {
            let line_no = i + 1;
            let mut words = line.split_whitespace();
            let directive = match words.next() {
                Some(d) => d,
                None => continue,
            };
            let words: Vec<&str> = words.collect();

            match directive {
                "%token" => decl.bind_members(line_no, &words, MemberTarget::Token)?,
                "%type" => {
                    if decl.union.is_none() {
                        return Err(GrammarError::TypeWithoutUnion(line_no));
                    }
                    decl.bind_members(line_no, &words, MemberTarget::Type)?;
                }
                "%left" | "%right" | "%nonassoc" => {
                    let associativity = match directive {
                        "%left" => Associativity::Left,
                        "%right" => Associativity::Right,
                        _ => Associativity::NonAssoc,
                    };
                    level += 1;
                    for &word in &words {
                        decl.register_token(word);
                        decl.precedence.insert(
                            word.to_string(),
                            Precedence {
                                associativity,
                                level,
                            },
                        );
                    }
                }
                _ => log::warn!(
                    "declarations line {}: skipping unrecognized line '{}'",
                    line_no,
                    line.trim()
                ),
            }
        }

        log::debug!(
            "declarations: {} tokens, {} with precedence, union: {}",
            decl.tokens.len(),
            decl.precedence.len(),
            decl.union.is_some()
        );
        Ok(decl)
    }

    fn register_token(&mut self, name: &str) {
        if !self.tokens.iter().any(|t| t == name) {
            self.tokens.push(name.to_string());
        }
    }

    /// `<member>` binds the symbol listed right after it.
    fn bind_members(&mut self, line: usize, words: &[&str], target: MemberTarget) -> Result<()> {
        let mut pending: Option<String> = None;
        for &word in words {
            if let Some(inner) = word.strip_prefix('<') {
                let member = match inner.strip_suffix('>') {
                    Some(m) if !m.is_empty() && pending.is_none() => m,
                    _ => {
                        return Err(GrammarError::MalformedUnionMember {
                            line,
                            text: word.to_string(),
                        })
                    }
                };
                if !self.union_declares(member) {
                    return Err(GrammarError::UnknownUnionMember {
                        line,
                        member: member.to_string(),
                    });
                }
                pending = Some(member.to_string());
                continue;
            }

            match target {
                MemberTarget::Token => {
                    self.register_token(word);
                    if let Some(member) = pending.take() {
                        self.token_members.insert(word.to_string(), member);
                    }
                }
                MemberTarget::Type => {
                    if let Some(member) = pending.take() {
                        self.type_members.insert(word.to_string(), member);
                    }
                }
            }
        }
        Ok(())
    }

    fn union_declares(&self, member: &str) -> bool {
        self.union.as_deref().map_or(false, |union| {
            union
                .split(|c: char| !is_identifier_char(c))
                .any(|word| word == member)
        })
    }
}

/// Finds the first `{` at or after `from` and its balanced `}`.
fn find_braced(text: &str, from: usize) -> Result<(usize, usize)> {
    let open = text[from..]
        .find('{')
        .ok_or(GrammarError::IncompleteUnion)?
        + from;
    let mut depth = 0usize;
    for (i, c) in text[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((open, open + i));
                }
            }
            _ => {}
        }
    }
    Err(GrammarError::IncompleteUnion)
}

/// Replaces `text[start..end]` with the newlines it contained.
fn blank_out(text: &mut String, start: usize, end: usize) {
    let newlines: String = text[start..end].chars().filter(|&c| c == '\n').collect();
    text.replace_range(start..end, &newlines);
}
