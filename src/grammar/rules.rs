use std::collections::HashMap;

use crate::error::{GrammarError, Result};

use super::{grammar::Precedence, sections::is_identifier_char, ACCEPT};

/// One alternative as written in the rules section, before its symbols are
/// resolved against the declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRule {
    pub left: String,
    pub right: Vec<String>,
    /// Action text including its braces.
    pub action: Option<String>,
    pub precedence: Option<Precedence>,
    /// Line the alternative started on, 0 for the augmenting rule.
    pub line: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRules {
    /// Rule 0 is `$accept : start ;`.
    pub rules: Vec<RawRule>,
    /// Quoted terminals, quotes included, in order of first appearance.
    pub literals: Vec<String>,
    /// Left sides in order of first appearance, `$accept` first.
    pub non_terminals: Vec<String>,
    /// Left sides of empty alternatives.
    pub epsilon: Vec<String>,
}

#[derive(PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

struct Alternative {
    right: Vec<String>,
    action: Option<String>,
    inherited: Option<Precedence>,
    overridden: Option<Precedence>,
    line: usize,
}

impl Alternative {
    fn new(line: usize) -> Self {
        Self {
            right: Vec::new(),
            action: None,
            inherited: None,
            overridden: None,
            line,
        }
    }
}

/// Character-level scanner over the rules section.
pub struct RuleParser<'a> {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    precedence: &'a HashMap<String, Precedence>,
    side: Side,
    pending_left: Option<String>,
    left: Option<String>,
    alternative: Option<Alternative>,
    output: RawRules,
}

impl<'a> RuleParser<'a> {
    pub fn new(start_symbol: &str, precedence: &'a HashMap<String, Precedence>) -> Self {
        let output = RawRules {
            rules: vec![RawRule {
                left: ACCEPT.to_string(),
                right: vec![start_symbol.to_string()],
                action: None,
                precedence: None,
                line: 0,
            }],
            non_terminals: vec![ACCEPT.to_string()],
            ..RawRules::default()
        };
        Self {
            chars: Vec::new(),
            pos: 0,
            line: 1,
            precedence,
            side: Side::Left,
            pending_left: None,
            left: None,
            alternative: None,
            output,
        }
    }

    pub fn parse(mut self, rules: &str) -> Result<RawRules> {
        self.chars = rules.chars().collect();
        while let Some(c) = self.peek() {
            match c {
                c if c.is_whitespace() => {
                    self.bump();
                }
                ':' => {
                    self.bump();
                    self.open_rule()?;
                }
                '\'' => {
                    let literal = self.scan_literal()?;
                    let precedence = self.precedence.get(&literal).copied();
                    let alternative = self.right_side("quoted literal")?;
                    alternative.right.push(literal.clone());
                    if precedence.is_some() {
                        alternative.inherited = precedence;
                    }
                    if !self.output.literals.contains(&literal) {
                        self.output.literals.push(literal);
                    }
                }
                '{' => {
                    let action = self.scan_action()?;
                    let alternative = self.right_side("action block")?;
                    if alternative.action.is_some() {
                        return Err(self.syntax("second action block in one alternative"));
                    }
                    alternative.action = Some(action);
                }
                '}' => return Err(GrammarError::UnexpectedCloseBrace(self.line)),
                '|' => {
                    self.bump();
                    if self.alternative.is_none() {
                        return Err(self.syntax("'|' without an open rule"));
                    }
                    self.close_alternative();
                    self.alternative = Some(Alternative::new(self.line));
                }
                ';' => {
                    self.bump();
                    if self.alternative.is_none() {
                        return Err(self.syntax("';' without an open rule"));
                    }
                    self.close_alternative();
                    self.left = None;
                    self.side = Side::Left;
                }
                '%' => {
                    self.bump();
                    let directive = self.scan_identifier();
                    if directive != "prec" {
                        return Err(self.syntax(&format!("unknown directive '%{}'", directive)));
                    }
                    let argument = self.scan_prec_argument()?;
                    let precedence = self.precedence.get(&argument).copied();
                    let line = self.line;
                    let alternative = self.right_side("%prec")?;
                    match precedence {
                        Some(p) => alternative.overridden = Some(p),
                        None => log::warn!(
                            "rules line {}: %prec {} has no declared precedence, keeping the inherited one",
                            line,
                            argument
                        ),
                    }
                }
                c if is_identifier_char(c) => {
                    let name = self.scan_identifier();
                    if self.side == Side::Right {
                        let precedence = self.precedence.get(&name).copied();
                        let alternative = self.right_side("symbol")?;
                        alternative.right.push(name);
                        if precedence.is_some() {
                            alternative.inherited = precedence;
                        }
                    } else if let Some(previous) = &self.pending_left {
                        return Err(self.syntax(&format!("expected ':' after '{}'", previous)));
                    } else {
                        self.pending_left = Some(name);
                    }
                }
                c => return Err(self.syntax(&format!("unexpected character '{}'", c))),
            }
        }

        if self.alternative.is_some() || self.pending_left.is_some() {
            return Err(self.syntax("rule not terminated with ';'"));
        }

        log::debug!(
            "rules: {} productions, {} literal tokens",
            self.output.rules.len(),
            self.output.literals.len()
        );
        Ok(self.output)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn syntax(&self, message: &str) -> GrammarError {
        GrammarError::Syntax {
            line: self.line,
            message: message.to_string(),
        }
    }

    fn open_rule(&mut self) -> Result<()> {
        if self.side == Side::Right {
            return Err(self.syntax("unexpected ':' in right side"));
        }
        let left = self
            .pending_left
            .take()
            .ok_or_else(|| self.syntax("':' without a left side"))?;
        if !self.output.non_terminals.contains(&left) {
            self.output.non_terminals.push(left.clone());
        }
        self.left = Some(left);
        self.side = Side::Right;
        self.alternative = Some(Alternative::new(self.line));
        Ok(())
    }

    fn right_side(&mut self, what: &str) -> Result<&mut Alternative> {
        if self.side == Side::Left {
            return Err(self.syntax(&format!("{} in left side", what)));
        }
        let line = self.line;
        self.alternative.as_mut().ok_or(GrammarError::Syntax {
            line,
            message: format!("{} outside of a rule", what),
        })
    }

    fn close_alternative(&mut self) {
        let (Some(alternative), Some(left)) = (self.alternative.take(), self.left.clone()) else {
            return;
        };
        if alternative.right.is_empty() && !self.output.epsilon.contains(&left) {
            self.output.epsilon.push(left.clone());
        }
        self.output.rules.push(RawRule {
            left,
            right: alternative.right,
            action: alternative.action,
            precedence: alternative.overridden.or(alternative.inherited),
            line: alternative.line,
        });
    }

    fn scan_identifier(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek().filter(|&c| is_identifier_char(c)) {
            name.push(c);
            self.bump();
        }
        name
    }

    /// Scans `'...'` including the quotes; a backslash escapes the next char.
    fn scan_literal(&mut self) -> Result<String> {
        let line = self.line;
        let quote = self.bump().unwrap_or('\'');
        let mut text = String::from(quote);
        loop {
            let c = self.bump().ok_or(GrammarError::UnmatchedQuote(line))?;
            text.push(c);
            if c == '\\' {
                text.push(self.bump().ok_or(GrammarError::UnmatchedQuote(line))?);
            } else if c == quote {
                return Ok(text);
            }
        }
    }

    /// Scans a brace-balanced `{ ... }` block. Quoted strings and `//`
    /// comments inside the block do not count towards the balance.
    fn scan_action(&mut self) -> Result<String> {
        let line = self.line;
        let mut text = String::new();
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            match c {
                '"' | '\'' => {
                    text.push_str(&self.scan_literal()?);
                    continue;
                }
                '/' if self.chars.get(self.pos + 1) == Some(&'/') => {
                    while let Some(d) = self.peek().filter(|&d| d != '\n') {
                        text.push(d);
                        self.bump();
                    }
                    continue;
                }
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
            text.push(c);
            self.bump();
            if depth == 0 {
                return Ok(text);
            }
        }
        Err(GrammarError::UnmatchedBrace(line))
    }

    fn scan_prec_argument(&mut self) -> Result<String> {
        while self.peek().map_or(false, char::is_whitespace) {
            self.bump();
        }
        match self.peek() {
            None | Some(';') | Some('|') | Some('{') => {
                Err(GrammarError::MissingPrecArgument(self.line))
            }
            Some('\'') => self.scan_literal(),
            Some(c) if is_identifier_char(c) => Ok(self.scan_identifier()),
            Some(_) => {
                let argument: String = self.chars[self.pos..]
                    .iter()
                    .take_while(|c| !c.is_whitespace())
                    .collect();
                Err(GrammarError::MalformedPrec {
                    line: self.line,
                    argument,
                })
            }
        }
    }
}
