use std::collections::HashMap;

use serde::Serialize;

use super::semantic_action::SemanticAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Associativity {
    Left,
    Right,
    NonAssoc,
}

/// Declared precedence of a terminal, inherited by rules. Higher levels bind
/// tighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Precedence {
    pub associativity: Associativity,
    pub level: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Terminal {
    pub index: usize,
    pub name: String,
    pub precedence: Option<Precedence>,
    pub union_member: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonTerminal {
    pub index: usize,
    pub name: String,
    pub union_member: Option<String>,
    /// Indices into `Grammar::productions`, in rule order.
    pub productions: Vec<usize>,
}

impl NonTerminal {
    pub fn new(index: usize, name: String) -> Self {
        Self {
            index,
            name,
            union_member: None,
            productions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbol {
    NonTerminal(NonTerminal),
    Terminal(Terminal),
}

impl Symbol {
    pub fn non_terminal(&self) -> Option<&NonTerminal> {
        match self {
            Symbol::NonTerminal(e) => Some(e),
            Symbol::Terminal(_) => None,
        }
    }

    pub fn mut_non_terminal(&mut self) -> Option<&mut NonTerminal> {
        match self {
            Symbol::NonTerminal(e) => Some(e),
            Symbol::Terminal(_) => None,
        }
    }

    pub fn terminal(&self) -> Option<&Terminal> {
        match self {
            Symbol::Terminal(e) => Some(e),
            Symbol::NonTerminal(_) => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Symbol::NonTerminal(e) => e.name.as_str(),
            Symbol::Terminal(e) => e.name.as_str(),
        }
    }
}

/// `left -> right`, numbered by its position in the rule list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub index: usize,
    pub left: usize,
    pub right: Vec<usize>,
    pub precedence: Option<Precedence>,
    pub action: Option<SemanticAction>,
}

/// A fully resolved grammar.
///
/// Terminals occupy symbol indices `0..terminal_count()` and nonterminals
/// follow, each group in first-declared order. Production 0 is always
/// `$accept -> start_symbol`.
#[derive(Debug, Clone)]
pub struct Grammar {
    pub symbols: Vec<Symbol>,
    pub symbol_table: HashMap<String, usize>,
    pub productions: Vec<Production>,
    pub start_symbol: usize,
    pub accept_symbol: usize,
    pub end_mark: usize,
    pub error_symbol: usize,
    /// Left sides of rules with an empty right side, in discovery order.
    pub epsilon: Vec<usize>,
    pub literal_block: String,
    pub union: Option<String>,
    pub support: String,
    pub(super) terminal_count: usize,
}

impl Grammar {
    pub(super) fn new() -> Self {
        Self {
            symbols: Vec::new(),
            symbol_table: HashMap::new(),
            productions: Vec::new(),
            start_symbol: 0,
            accept_symbol: 0,
            end_mark: 0,
            error_symbol: 0,
            epsilon: Vec::new(),
            literal_block: String::new(),
            union: None,
            support: String::new(),
            terminal_count: 0,
        }
    }

    pub fn terminal_iter(&self) -> impl Iterator<Item = &Terminal> {
        self.symbols.iter().filter_map(|s| s.terminal())
    }

    pub fn non_terminal_iter(&self) -> impl Iterator<Item = &NonTerminal> {
        self.symbols.iter().filter_map(|s| s.non_terminal())
    }

    pub fn terminal_count(&self) -> usize {
        self.terminal_count
    }

    pub fn non_terminal_count(&self) -> usize {
        self.symbols.len() - self.terminal_count
    }

    pub fn is_terminal(&self, index: usize) -> bool {
        index < self.terminal_count
    }

    pub fn get_symbol_index(&self, name: &str) -> Option<usize> {
        self.symbol_table.get(name).cloned()
    }

    pub fn get_symbol_name(&self, index: usize) -> &str {
        self.symbols[index].name()
    }

    /// Declared precedence of a terminal; nonterminals have none.
    pub fn precedence_of(&self, index: usize) -> Option<Precedence> {
        self.symbols[index].terminal().and_then(|t| t.precedence)
    }

    /// Production indices for `left`, empty for terminals.
    pub fn productions_of(&self, left: usize) -> &[usize] {
        self.symbols[left]
            .non_terminal()
            .map_or(&[][..], |nt| nt.productions.as_slice())
    }

    pub(super) fn add_terminal(&mut self, name: &str) -> usize {
        debug_assert_eq!(self.terminal_count, self.symbols.len());
        let idx = self.symbols.len();
        self.symbols.push(Symbol::Terminal(Terminal {
            index: idx,
            name: name.to_string(),
            precedence: None,
            union_member: None,
        }));
        self.symbol_table.insert(name.to_string(), idx);
        self.terminal_count += 1;
        idx
    }

    pub(super) fn add_non_terminal(&mut self, name: &str) -> usize {
        let idx = self.symbols.len();
        self.symbols
            .push(Symbol::NonTerminal(NonTerminal::new(idx, name.to_string())));
        self.symbol_table.insert(name.to_string(), idx);
        idx
    }

    pub(super) fn add_production(
        &mut self,
        left: usize,
        right: Vec<usize>,
        precedence: Option<Precedence>,
        action: Option<SemanticAction>,
    ) -> usize {
        let index = self.productions.len();
        self.productions.push(Production {
            index,
            left,
            right,
            precedence,
            action,
        });
        if let Some(nt) = self.symbols[left].mut_non_terminal() {
            nt.productions.push(index);
        }
        index
    }

    /// First production whose left side and right side equal the given ones.
    pub fn match_production(&self, left: usize, right: &[usize]) -> Option<usize> {
        self.productions
            .iter()
            .position(|p| p.left == left && p.right == right)
    }

    pub fn production_to_vec_str(&self, production: &Production) -> Vec<&str> {
        production
            .right
            .iter()
            .map(|&s| self.get_symbol_name(s))
            .collect()
    }

    pub fn production_to_string(&self, production: &Production) -> String {
        let right = self.production_to_vec_str(production);
        format!(
            "{} -> {}",
            self.get_symbol_name(production.left),
            if right.is_empty() {
                super::EPSILON.to_string()
            } else {
                right.join(" ")
            }
        )
    }
}
