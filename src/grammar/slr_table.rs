use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{GrammarError, Result};
use crate::Grammar;

use super::{
    grammar::{Associativity, Precedence},
    lr_dfa::LRFSM,
    nullable_first_follow::FirstFollow,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "target", rename_all = "lowercase")]
pub enum Action {
    Shift(usize),
    Reduce(usize),
    Accept,
    /// No action; what every unwritten cell reads as.
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    ShiftReduce,
    ReduceReduce,
}

/// A conflict settled by the default policy rather than by precedence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub state: usize,
    pub terminal: usize,
    pub kind: ConflictKind,
    pub existing: Action,
    pub proposed: Action,
    pub chosen: Action,
}

/// SLR(1) action table: one action per (state, terminal) cell at most.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SLRTable {
    pub actions: Vec<BTreeMap<usize, Action>>,
    pub conflicts: Vec<Conflict>,
}

impl SLRTable {
    /// Action for a cell; cells never written are `Error`.
    pub fn action(&self, state: usize, terminal: usize) -> Action {
        self.actions
            .get(state)
            .and_then(|row| row.get(&terminal))
            .copied()
            .unwrap_or(Action::Error)
    }

    fn record(&mut self, g: &Grammar, conflict: Conflict) {
        log::warn!(
            "{} conflict in state {} on {}: {:?} vs {:?}, choosing {:?}",
            match conflict.kind {
                ConflictKind::ShiftReduce => "shift/reduce",
                ConflictKind::ReduceReduce => "reduce/reduce",
            },
            conflict.state,
            g.get_symbol_name(conflict.terminal),
            conflict.existing,
            conflict.proposed,
            conflict.chosen
        );
        self.conflicts.push(conflict);
    }

    fn propose_shift(&mut self, g: &Grammar, state: usize, terminal: usize, target: usize) {
        let proposed = Action::Shift(target);
        let chosen = match self.actions[state].get(&terminal).copied() {
            None => proposed,
            Some(Action::Reduce(rule)) => {
                let existing = Action::Reduce(rule);
                match resolve_by_precedence(
                    g.precedence_of(terminal),
                    g.productions[rule].precedence,
                    proposed,
                    existing,
                ) {
                    Some(chosen) => chosen,
                    None => {
                        self.record(
                            g,
                            Conflict {
                                state,
                                terminal,
                                kind: ConflictKind::ShiftReduce,
                                existing,
                                proposed,
                                chosen: proposed,
                            },
                        );
                        proposed
                    }
                }
            }
            Some(existing) => existing,
        };
        self.write(g, state, terminal, chosen);
    }

    fn propose_reduce(&mut self, g: &Grammar, state: usize, terminal: usize, rule: usize) {
        let proposed = Action::Reduce(rule);
        let chosen = match self.actions[state].get(&terminal).copied() {
            None => proposed,
            Some(existing @ Action::Shift(_)) => {
                match resolve_by_precedence(
                    g.precedence_of(terminal),
                    g.productions[rule].precedence,
                    existing,
                    proposed,
                ) {
                    Some(chosen) => chosen,
                    None => {
                        self.record(
                            g,
                            Conflict {
                                state,
                                terminal,
                                kind: ConflictKind::ShiftReduce,
                                existing,
                                proposed,
                                chosen: existing,
                            },
                        );
                        existing
                    }
                }
            }
            Some(Action::Reduce(other)) if other == rule => proposed,
            Some(existing @ Action::Reduce(other)) => {
                match (g.productions[other].precedence, g.productions[rule].precedence) {
                    (Some(a), Some(b)) if a.level != b.level => {
                        if b.level > a.level {
                            proposed
                        } else {
                            existing
                        }
                    }
                    _ => {
                        let chosen = Action::Reduce(other.max(rule));
                        self.record(
                            g,
                            Conflict {
                                state,
                                terminal,
                                kind: ConflictKind::ReduceReduce,
                                existing,
                                proposed,
                                chosen,
                            },
                        );
                        chosen
                    }
                }
            }
            Some(Action::Accept) => {
                self.record(
                    g,
                    Conflict {
                        state,
                        terminal,
                        kind: ConflictKind::ReduceReduce,
                        existing: Action::Accept,
                        proposed,
                        chosen: Action::Accept,
                    },
                );
                Action::Accept
            }
            Some(Action::Error) => proposed,
        };
        self.write(g, state, terminal, chosen);
    }

    fn propose_accept(&mut self, g: &Grammar, state: usize) {
        let terminal = g.end_mark;
        if let Some(existing @ Action::Reduce(_)) = self.actions[state].get(&terminal).copied() {
            self.record(
                g,
                Conflict {
                    state,
                    terminal,
                    kind: ConflictKind::ReduceReduce,
                    existing,
                    proposed: Action::Accept,
                    chosen: Action::Accept,
                },
            );
        }
        self.write(g, state, terminal, Action::Accept);
    }

    fn write(&mut self, g: &Grammar, state: usize, terminal: usize, action: Action) {
        let previous = self.actions[state].insert(terminal, action);
        if previous != Some(action) {
            log::trace!(
                "action[{}, {}] = {:?}",
                state,
                g.get_symbol_name(terminal),
                action
            );
        }
    }
}

/// Settles a shift/reduce pair when both the terminal and the rule carry a
/// precedence. `None` leaves it to the default policy, which is also what a
/// nonassociative tie gets.
fn resolve_by_precedence(
    terminal: Option<Precedence>,
    rule: Option<Precedence>,
    shift: Action,
    reduce: Action,
) -> Option<Action> {
    let (terminal, rule) = (terminal?, rule?);
    if terminal.level > rule.level {
        Some(shift)
    } else if rule.level > terminal.level {
        Some(reduce)
    } else {
        match terminal.associativity {
            Associativity::Right => Some(shift),
            Associativity::Left => Some(reduce),
            Associativity::NonAssoc => None,
        }
    }
}

impl LRFSM {
    /// Fills the SLR(1) action table. Conflicts never abort construction:
    /// they are settled by precedence, or by the default policy (shift over
    /// reduce, higher rule index between reduces) and then logged.
    pub fn to_parsing_table(&self, g: &Grammar, sets: &FirstFollow) -> Result<SLRTable> {
        let mut table = SLRTable {
            actions: vec![BTreeMap::new(); self.len()],
            conflicts: Vec::new(),
        };

        for (state, s) in self.states.iter().enumerate() {
            for item in &s.items {
                if let Some(symbol) = item.next_symbol(g) {
                    if !g.is_terminal(symbol) {
                        continue;
                    }
                    let target = s.edges.get(&symbol).copied().ok_or_else(|| {
                        GrammarError::Internal(format!(
                            "state {} has no transition on {}",
                            state,
                            g.get_symbol_name(symbol)
                        ))
                    })?;
                    table.propose_shift(g, state, symbol, target);
                    continue;
                }

                let production = &g.productions[item.production];
                let rule = g
                    .match_production(production.left, &production.right)
                    .ok_or_else(|| {
                        GrammarError::Internal(format!(
                            "no production matches reducible item {}",
                            item.to_plaintext(g)
                        ))
                    })?;
                if rule == 0 {
                    table.propose_accept(g, state);
                    continue;
                }
                for &terminal in sets.follow(production.left) {
                    table.propose_reduce(g, state, terminal, rule);
                }
            }
        }

        log::debug!(
            "action table: {} states, {} conflicts resolved by default",
            table.actions.len(),
            table.conflicts.len()
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(spec: &str) -> (Grammar, LRFSM, SLRTable) {
        let _ = env_logger::builder().is_test(true).try_init();
        let g = Grammar::parse(spec).unwrap();
        let fsm = g.to_lr_fsm();
        let table = fsm.to_parsing_table(&g, &g.first_follow()).unwrap();
        (g, fsm, table)
    }

    /// The state holding every listed item.
    fn state_with(g: &Grammar, fsm: &LRFSM, items: &[&str]) -> usize {
        fsm.states
            .iter()
            .position(|s| {
                let rendered: Vec<String> = s.items.iter().map(|i| i.to_plaintext(g)).collect();
                items.iter().all(|i| rendered.iter().any(|r| r == i))
            })
            .unwrap()
    }

    fn sym(g: &Grammar, name: &str) -> usize {
        g.get_symbol_index(name).unwrap()
    }

    #[test]
    fn single_accept_on_end_mark() {
        let (g, fsm, table) = build("%% E : E '+' T | T ; T : '0' | '1' ; %%");
        let accepts: Vec<(usize, usize)> = table
            .actions
            .iter()
            .enumerate()
            .flat_map(|(s, row)| {
                row.iter()
                    .filter(|(_, a)| **a == Action::Accept)
                    .map(move |(&t, _)| (s, t))
            })
            .collect();
        let after_start = fsm.goto(0, g.start_symbol).unwrap();
        assert_eq!(accepts, vec![(after_start, g.end_mark)]);
        assert!(table.conflicts.is_empty());
    }

    #[test]
    fn precedence_makes_times_bind_tighter() {
        let (g, fsm, table) = build(
            "%left '+'\n%left '*'\n%%\ne : e '+' e | e '*' e | 'n' ;\n%%",
        );
        let plus_rule = 1;
        let times_rule = 2;

        let after_plus = state_with(&g, &fsm, &["e -> e '+' e .", "e -> e . '*' e"]);
        assert!(matches!(
            table.action(after_plus, sym(&g, "'*'")),
            Action::Shift(_)
        ));
        assert_eq!(
            table.action(after_plus, sym(&g, "'+'")),
            Action::Reduce(plus_rule)
        );

        let after_times = state_with(&g, &fsm, &["e -> e '*' e .", "e -> e . '+' e"]);
        assert_eq!(
            table.action(after_times, sym(&g, "'+'")),
            Action::Reduce(times_rule)
        );
        assert_eq!(
            table.action(after_times, sym(&g, "'*'")),
            Action::Reduce(times_rule)
        );
        assert!(table.conflicts.is_empty());
    }

    #[test]
    fn right_associativity_shifts() {
        let (g, fsm, table) = build("%right '^'\n%% e : e '^' e | 'n' ; %%");
        let s = state_with(&g, &fsm, &["e -> e '^' e ."]);
        assert!(matches!(table.action(s, sym(&g, "'^'")), Action::Shift(_)));
        assert!(table.conflicts.is_empty());
    }

    #[test]
    fn nonassoc_tie_falls_back_to_logged_shift() {
        let (g, fsm, table) = build("%nonassoc '<'\n%% e : e '<' e | 'n' ; %%");
        let s = state_with(&g, &fsm, &["e -> e '<' e ."]);
        let lt = sym(&g, "'<'");
        assert!(matches!(table.action(s, lt), Action::Shift(_)));
        assert_eq!(table.action(s, g.end_mark), Action::Reduce(1));
        assert_eq!(table.conflicts.len(), 1);
        let c = &table.conflicts[0];
        assert_eq!((c.state, c.terminal, c.kind), (s, lt, ConflictKind::ShiftReduce));
        assert_eq!(c.existing, table.action(s, lt));
        assert_eq!(c.proposed, Action::Reduce(1));
        assert!(table
            .actions
            .iter()
            .all(|row| row.values().all(|a| *a != Action::Error)));
    }

    #[test]
    fn dangling_else_defaults_to_shift() {
        let (g, fsm, table) = build("%% s : 'i' s | 'i' s 'e' s | 'x' ; %%");
        let s = state_with(&g, &fsm, &["s -> 'i' s .", "s -> 'i' s . 'e' s"]);
        let e = sym(&g, "'e'");
        assert!(matches!(table.action(s, e), Action::Shift(_)));
        assert_eq!(table.conflicts.len(), 1);
        let c = &table.conflicts[0];
        assert_eq!((c.state, c.terminal, c.kind), (s, e, ConflictKind::ShiftReduce));
        assert_eq!(c.chosen, table.action(s, e));
    }

    #[test]
    fn reduce_reduce_defaults_to_higher_rule() {
        let (g, fsm, table) = build("%% s : a | b ; a : 'x' ; b : 'x' ; %%");
        let s = state_with(&g, &fsm, &["a -> 'x' .", "b -> 'x' ."]);
        assert_eq!(table.action(s, g.end_mark), Action::Reduce(4));
        assert_eq!(table.conflicts.len(), 1);
        assert_eq!(table.conflicts[0].kind, ConflictKind::ReduceReduce);
        assert_eq!(table.conflicts[0].chosen, Action::Reduce(4));
    }

    #[test]
    fn reduce_reduce_equal_precedence_defaults_to_higher_rule() {
        let (g, fsm, table) =
            build("%left P\n%% s : a | b ; a : 'x' %prec P ; b : 'x' %prec P ; %%");
        let s = state_with(&g, &fsm, &["a -> 'x' .", "b -> 'x' ."]);
        assert_eq!(table.action(s, g.end_mark), Action::Reduce(4));
        assert_eq!(table.conflicts.len(), 1);
    }

    #[test]
    fn reduce_reduce_by_precedence() {
        let (g, fsm, table) = build(
            "%left LOW\n%left HIGH\n%% s : a | b ; a : 'x' %prec HIGH ; b : 'x' %prec LOW ; %%",
        );
        let s = state_with(&g, &fsm, &["a -> 'x' .", "b -> 'x' ."]);
        assert_eq!(table.action(s, g.end_mark), Action::Reduce(3));
        assert!(table.conflicts.is_empty());
    }

    #[test]
    fn shifts_target_goto_states() {
        let (g, fsm, table) = build("%% E : E '+' T | T ; T : '0' | '1' ; %%");
        for (state, row) in table.actions.iter().enumerate() {
            for (&t, &a) in row {
                assert!(g.is_terminal(t));
                if let Action::Shift(target) = a {
                    assert_eq!(fsm.goto(state, t), Some(target));
                }
            }
        }
    }
}
