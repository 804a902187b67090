use serde::Serialize;

use crate::error::{GrammarError, Result};
use crate::Grammar;

use super::{
    grammar::Precedence,
    lr_dfa::LRFSM,
    semantic_action::SemanticAction,
    slr_table::{Action, Conflict, SLRTable},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerminalEntry {
    pub name: String,
    pub precedence: Option<Precedence>,
    pub union_member: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NonTerminalEntry {
    pub name: String,
    pub union_member: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleEntry {
    /// Goto-table column of the left side.
    pub left: usize,
    /// Number of symbols popped on reduce.
    pub arity: usize,
    /// `left -> right`, for display only.
    pub text: String,
    pub precedence: Option<Precedence>,
    pub action: Option<SemanticAction>,
}

/// Everything a renderer needs to emit a parser, with no reference back to
/// the grammar.
///
/// `actions[state][terminal]` is indexed by terminal id; `gotos[state][column]`
/// by nonterminal id minus the terminal count, so column 0 is `$accept`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrammarTable {
    pub start_symbol: String,
    pub start_state: usize,
    pub end_mark: usize,
    pub terminals: Vec<TerminalEntry>,
    pub non_terminals: Vec<NonTerminalEntry>,
    pub rules: Vec<RuleEntry>,
    pub actions: Vec<Vec<Action>>,
    pub gotos: Vec<Vec<Option<usize>>>,
    pub conflicts: Vec<Conflict>,
    pub literal_block: String,
    pub union: Option<String>,
    pub support: String,
}

impl GrammarTable {
    pub fn new(g: &Grammar, fsm: &LRFSM, table: SLRTable) -> Self {
        let terminal_count = g.terminal_count();

        let terminals = g
            .terminal_iter()
            .map(|t| TerminalEntry {
                name: t.name.clone(),
                precedence: t.precedence,
                union_member: t.union_member.clone(),
            })
            .collect();
        let non_terminals = g
            .non_terminal_iter()
            .map(|nt| NonTerminalEntry {
                name: nt.name.clone(),
                union_member: nt.union_member.clone(),
            })
            .collect();
        let rules = g
            .productions
            .iter()
            .map(|p| RuleEntry {
                left: p.left - terminal_count,
                arity: p.right.len(),
                text: g.production_to_string(p),
                precedence: p.precedence,
                action: p.action.clone(),
            })
            .collect();

        let actions = table
            .actions
            .iter()
            .map(|row| {
                (0..terminal_count)
                    .map(|t| row.get(&t).copied().unwrap_or(Action::Error))
                    .collect()
            })
            .collect();
        let gotos = fsm
            .states
            .iter()
            .map(|s| {
                (terminal_count..g.symbols.len())
                    .map(|nt| s.edges.get(&nt).copied())
                    .collect()
            })
            .collect();

        Self {
            start_symbol: g.get_symbol_name(g.start_symbol).to_string(),
            start_state: fsm.start,
            end_mark: g.end_mark,
            terminals,
            non_terminals,
            rules,
            actions,
            gotos,
            conflicts: table.conflicts,
            literal_block: g.literal_block.clone(),
            union: g.union.clone(),
            support: g.support.clone(),
        }
    }

    pub fn terminal_index(&self, name: &str) -> Option<usize> {
        self.terminals.iter().position(|t| t.name == name)
    }

    pub fn state_count(&self) -> usize {
        self.actions.len()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| GrammarError::Internal(e.to_string()))
    }
}
