use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::Grammar;

/// An LR(0) item: a production with a dot before `right[position]`.
/// `position == right.len()` means the item is reducible.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct DotProduction {
    pub production: usize,
    pub position: usize,
}

impl DotProduction {
    pub fn new(production: usize) -> Self {
        Self {
            production,
            position: 0,
        }
    }

    pub fn generate_next(&self) -> Self {
        Self {
            production: self.production,
            position: self.position + 1,
        }
    }

    /// Symbol right after the dot, `None` for reducible items.
    pub fn next_symbol(&self, g: &Grammar) -> Option<usize> {
        g.productions[self.production]
            .right
            .get(self.position)
            .copied()
    }

    pub fn is_reducible(&self, g: &Grammar) -> bool {
        self.position >= g.productions[self.production].right.len()
    }

    pub fn to_plaintext(&self, g: &Grammar) -> String {
        let production = &g.productions[self.production];
        let mut output = String::new();
        output.push_str(g.get_symbol_name(production.left));
        output.push_str(" ->");
        for (i, &s) in production.right.iter().enumerate() {
            if i == self.position {
                output.push_str(" .");
            }
            output.push(' ');
            output.push_str(g.get_symbol_name(s));
        }
        if self.position >= production.right.len() {
            output.push_str(" .");
        }
        output
    }
}

/// Item sets are kept sorted, so two states are equal exactly when they hold
/// the same items and the set itself serves as the dedup key.
pub type ItemSet = BTreeSet<DotProduction>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LRState {
    pub items: ItemSet,
    /// Transitions by symbol index.
    pub edges: BTreeMap<usize, usize>,
}

impl LRState {
    fn new(items: ItemSet) -> Self {
        Self {
            items,
            edges: BTreeMap::new(),
        }
    }
}

/// The canonical LR(0) collection and its goto function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LRFSM {
    pub states: Vec<LRState>,
    pub start: usize,
}

impl LRFSM {
    pub fn goto(&self, state: usize, symbol: usize) -> Option<usize> {
        self.states.get(state)?.edges.get(&symbol).copied()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl Grammar {
    /// Adds `N -> . gamma` for every nonterminal `N` right after a dot,
    /// expanding each nonterminal once.
    pub fn closure(&self, items: ItemSet) -> ItemSet {
        let mut queue: Vec<DotProduction> = items.iter().copied().collect();
        let mut expanded: BTreeSet<usize> = BTreeSet::new();
        let mut closure = items;
        while let Some(item) = queue.pop() {
            let symbol = match item.next_symbol(self) {
                Some(s) if !self.is_terminal(s) => s,
                _ => continue,
            };
            if !expanded.insert(symbol) {
                continue;
            }
            for &p in self.productions_of(symbol) {
                let new_item = DotProduction::new(p);
                if closure.insert(new_item) {
                    queue.push(new_item);
                }
            }
        }
        closure
    }

    /// Advances the dot over `symbol` and closes the result; `None` when no
    /// item expects `symbol`.
    pub fn goto(&self, items: &ItemSet, symbol: usize) -> Option<ItemSet> {
        let moved: ItemSet = items
            .iter()
            .filter(|item| item.next_symbol(self) == Some(symbol))
            .map(DotProduction::generate_next)
            .collect();
        if moved.is_empty() {
            None
        } else {
            Some(self.closure(moved))
        }
    }

    /// Builds the canonical collection with a worklist. Symbols are tried
    /// terminals first, each group in declaration order, so state numbering
    /// is deterministic.
    pub fn to_lr_fsm(&self) -> LRFSM {
        let start = self.closure(ItemSet::from([DotProduction::new(0)]));
        let mut index: HashMap<ItemSet, usize> = HashMap::from([(start.clone(), 0)]);
        let mut states = vec![LRState::new(start)];

        let mut u = 0;
        while u < states.len() {
            for symbol in 0..self.symbols.len() {
                let target = match self.goto(&states[u].items, symbol) {
                    Some(t) => t,
                    None => continue,
                };
                let v = match index.get(&target) {
                    Some(&v) => v,
                    None => {
                        let v = states.len();
                        if log::log_enabled!(log::Level::Trace) {
                            let items: Vec<String> =
                                target.iter().map(|i| i.to_plaintext(self)).collect();
                            log::trace!(
                                "state {} = goto({}, {}): [{}]",
                                v,
                                u,
                                self.get_symbol_name(symbol),
                                items.join("; ")
                            );
                        }
                        index.insert(target.clone(), v);
                        states.push(LRState::new(target));
                        v
                    }
                };
                states[u].edges.insert(symbol, v);
            }
            u += 1;
        }

        log::debug!("automaton: {} states", states.len());
        LRFSM { states, start: 0 }
    }
}
