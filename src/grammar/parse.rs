use crate::error::{GrammarError, Result};
use crate::Grammar;

use super::{
    declarations::Declarations, grammar::Symbol, rules::RuleParser, sections::SpecSections,
    semantic_action::SemanticAction, ACCEPT, END_MARK, ERROR,
};

impl Grammar {
    /// Splits a specification and resolves every rule to symbol ids.
    pub fn parse(spec: &str) -> Result<Self> {
        let sections = SpecSections::split(spec)?;
        let decl = Declarations::process(&sections.declarations)?;
        let raw = RuleParser::new(&sections.start_symbol, &decl.precedence)
            .parse(&sections.rules)?;

        if let Some(name) = decl.tokens.iter().find(|t| raw.non_terminals.contains(*t)) {
            return Err(GrammarError::TerminalOnLeft(name.clone()));
        }
        if let Some(name) = raw.non_terminals.iter().find(|n| *n == ERROR) {
            return Err(GrammarError::TerminalOnLeft(name.clone()));
        }

        let mut g = Self::new();
        g.literal_block = decl.literal_block.clone();
        g.union = decl.union.clone();
        g.support = sections.support.clone();

        let terminals = decl
            .tokens
            .iter()
            .map(String::as_str)
            .chain([ERROR, END_MARK])
            .chain(raw.literals.iter().map(String::as_str));
        for name in terminals {
            if g.get_symbol_index(name).is_none() {
                let idx = g.add_terminal(name);
                if let Some(Symbol::Terminal(t)) = g.symbols.get_mut(idx) {
                    t.precedence = decl.precedence.get(name).copied();
                    t.union_member = decl.token_members.get(name).cloned();
                }
            }
        }

        for name in &raw.non_terminals {
            let idx = g.add_non_terminal(name);
            if let Some(nt) = g.symbols[idx].mut_non_terminal() {
                nt.union_member = decl.type_members.get(name).cloned();
            }
        }
        for name in decl.type_members.keys() {
            if !raw.non_terminals.contains(name) {
                log::warn!("%type binding for '{}' ignored: not a nonterminal", name);
            }
        }

        for (i, rule) in raw.rules.iter().enumerate() {
            let left = g
                .get_symbol_index(&rule.left)
                .ok_or_else(|| GrammarError::Internal(format!("lost left side '{}'", rule.left)))?;
            let right = rule
                .right
                .iter()
                .map(|s| {
                    g.get_symbol_index(s)
                        .ok_or_else(|| GrammarError::UndefinedSymbol(s.clone()))
                })
                .collect::<Result<Vec<_>>>()?;
            let action = rule
                .action
                .as_deref()
                .map(|text| SemanticAction::parse(text, i, right.len()))
                .transpose()?;
            g.add_production(left, right, rule.precedence, action);
        }

        g.epsilon = raw
            .epsilon
            .iter()
            .filter_map(|name| g.get_symbol_index(name))
            .collect();

        g.start_symbol = g
            .get_symbol_index(&sections.start_symbol)
            .ok_or(GrammarError::MissingStartRule)?;
        g.accept_symbol = g
            .get_symbol_index(ACCEPT)
            .ok_or_else(|| GrammarError::Internal("missing augmenting symbol".to_string()))?;
        g.end_mark = g
            .get_symbol_index(END_MARK)
            .ok_or_else(|| GrammarError::Internal("missing end marker".to_string()))?;
        g.error_symbol = g
            .get_symbol_index(ERROR)
            .ok_or_else(|| GrammarError::Internal("missing error token".to_string()))?;

        log::debug!(
            "grammar: {} terminals, {} nonterminals, {} rules",
            g.terminal_count(),
            g.non_terminal_count(),
            g.productions.len()
        );
        Ok(g)
    }
}
