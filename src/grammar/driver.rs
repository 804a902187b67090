use thiserror::Error;

use super::{grammar_table::GrammarTable, slr_table::Action};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecognizeError {
    #[error("unknown terminal '{0}'")]
    UnknownTerminal(String),
    #[error("no action in state {state} for token {position} ('{token}')")]
    NoAction {
        state: usize,
        position: usize,
        token: String,
    },
    #[error("missing goto from state {state} on {non_terminal}")]
    MissingGoto { state: usize, non_terminal: String },
}

impl GrammarTable {
    /// Runs the shift/reduce loop over terminal names. `$end` is appended.
    pub fn recognize<'a, I>(&self, tokens: I) -> Result<(), RecognizeError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut input = tokens
            .into_iter()
            .map(|name| {
                self.terminal_index(name)
                    .ok_or_else(|| RecognizeError::UnknownTerminal(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        input.push(self.end_mark);

        let mut stack = vec![self.start_state];
        let mut position = 0;
        loop {
            let state = stack.last().copied().unwrap_or(self.start_state);
            let lookahead = input[position];
            let action = self
                .actions
                .get(state)
                .and_then(|row| row.get(lookahead))
                .copied()
                .unwrap_or(Action::Error);
            match action {
                Action::Shift(next) => {
                    log::trace!("shift {} -> {}", self.terminals[lookahead].name, next);
                    stack.push(next);
                    position += 1;
                }
                Action::Reduce(rule) => {
                    let entry = &self.rules[rule];
                    log::trace!("reduce {}", entry.text);
                    let missing_goto = |state: usize| RecognizeError::MissingGoto {
                        state,
                        non_terminal: self.non_terminals[entry.left].name.clone(),
                    };
                    if entry.arity >= stack.len() {
                        return Err(missing_goto(state));
                    }
                    stack.truncate(stack.len() - entry.arity);
                    let top = stack.last().copied().unwrap_or(self.start_state);
                    let next = self.gotos[top][entry.left].ok_or_else(|| missing_goto(top))?;
                    stack.push(next);
                }
                Action::Accept => {
                    log::trace!("accept");
                    return Ok(());
                }
                Action::Error => {
                    return Err(RecognizeError::NoAction {
                        state,
                        position,
                        token: self.terminals[lookahead].name.clone(),
                    })
                }
            }
        }
    }
}
