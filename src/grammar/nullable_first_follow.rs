use std::collections::BTreeSet;

use super::Grammar;

/// FIRST and FOLLOW sets for every symbol of a grammar.
///
/// The empty marker is not stored inside the FIRST sets; `nullable` tells
/// whether FIRST(X) contains it. FOLLOW chains through a symbol exactly when
/// `nullable` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstFollow {
    first: Vec<BTreeSet<usize>>,
    nullable: Vec<bool>,
    follow: Vec<BTreeSet<usize>>,
}

impl FirstFollow {
    pub fn first(&self, symbol: usize) -> &BTreeSet<usize> {
        &self.first[symbol]
    }

    pub fn nullable(&self, symbol: usize) -> bool {
        self.nullable[symbol]
    }

    /// Terminals that may follow `symbol`; always empty for terminals.
    pub fn follow(&self, symbol: usize) -> &BTreeSet<usize> {
        &self.follow[symbol]
    }

    /// FIRST of a symbol string, and whether the whole string can vanish.
    pub fn first_of_sequence(&self, sequence: &[usize]) -> (BTreeSet<usize>, bool) {
        let mut first = BTreeSet::new();
        for &symbol in sequence {
            first.extend(self.first[symbol].iter().copied());
            if !self.nullable[symbol] {
                return (first, false);
            }
        }
        (first, true)
    }
}

impl Grammar {
    pub fn first_follow(&self) -> FirstFollow {
        let (first, nullable) = self.calculate_first();
        let mut sets = FirstFollow {
            first,
            nullable,
            follow: Vec::new(),
        };
        sets.follow = self.calculate_follow(&sets);
        sets
    }

    /// Fixed-point FIRST computation.
    ///
    /// Each production is walked left to right, adding FIRST of every symbol
    /// passed, empty marker included, and stopping after the first symbol
    /// whose FIRST lacks the marker. So the marker reaches FIRST(X) as soon as
    /// the walk passes one vanishing symbol, even when a later symbol stops it:
    /// for `X : B 'c' ; B : 'b' | ;` FIRST(X) holds the marker.
    ///
    /// An occurrence of X inside one of X's own productions contributes
    /// nothing. The walk steps over it only when X heads an empty rule, and
    /// otherwise stops there. This under-approximates FIRST(X) when X can
    /// vanish only through some other production, e.g. for
    /// `X : B X 'c' | B ; B : 'b' | ;` the `'c'` is never added.
    fn calculate_first(&self) -> (Vec<BTreeSet<usize>>, Vec<bool>) {
        let n = self.symbols.len();
        let mut first: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];
        let mut nullable = vec![false; n];
        for t in 0..self.terminal_count() {
            first[t].insert(t);
        }
        for &e in &self.epsilon {
            nullable[e] = true;
        }
        let heads_empty_rule = nullable.clone();

        let mut changed = true;
        while changed {
            changed = false;
            for production in &self.productions {
                let left = production.left;
                for &symbol in &production.right {
                    if symbol == left {
                        if heads_empty_rule[left] {
                            continue;
                        }
                        break;
                    }
                    let first_symbol: Vec<usize> = first[symbol].iter().copied().collect();
                    for f in first_symbol {
                        changed |= first[left].insert(f);
                    }
                    if !nullable[symbol] {
                        break;
                    }
                    if !nullable[left] {
                        nullable[left] = true;
                        changed = true;
                    }
                }
            }
        }
        (first, nullable)
    }

    /// Fixed-point FOLLOW computation. `$end` always follows the start symbol.
    fn calculate_follow(&self, sets: &FirstFollow) -> Vec<BTreeSet<usize>> {
        let mut follow: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); self.symbols.len()];
        follow[self.start_symbol].insert(self.end_mark);

        let mut changed = true;
        while changed {
            changed = false;
            for production in &self.productions {
                let left = production.left;
                for (i, &symbol) in production.right.iter().enumerate() {
                    if self.is_terminal(symbol) {
                        continue;
                    }
                    let (first_beta, beta_nullable) =
                        sets.first_of_sequence(&production.right[i + 1..]);
                    for f in first_beta {
                        changed |= follow[symbol].insert(f);
                    }
                    if beta_nullable && left != symbol {
                        let follow_left: Vec<usize> = follow[left].iter().copied().collect();
                        for f in follow_left {
                            changed |= follow[symbol].insert(f);
                        }
                    }
                }
            }
        }
        follow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names<'a>(g: &'a Grammar, set: &BTreeSet<usize>) -> Vec<&'a str> {
        let mut v: Vec<&str> = set.iter().map(|&i| g.get_symbol_name(i)).collect();
        v.sort();
        v
    }

    fn symbol(g: &Grammar, name: &str) -> usize {
        g.get_symbol_index(name).unwrap()
    }

    const EXPR: &str = "%token ID\n%%\n\
        E : E '+' T | T ;\n\
        T : T '*' F | F ;\n\
        F : '(' E ')' | ID ;\n%%\n";

    #[test]
    fn expression_grammar_sets() {
        let g = Grammar::parse(EXPR).unwrap();
        let ff = g.first_follow();
        for nt in ["E", "T", "F"] {
            assert_eq!(names(&g, ff.first(symbol(&g, nt))), vec!["'('", "ID"]);
            assert!(!ff.nullable(symbol(&g, nt)));
        }
        assert_eq!(
            names(&g, ff.follow(symbol(&g, "E"))),
            vec!["$end", "')'", "'+'"]
        );
        assert_eq!(
            names(&g, ff.follow(symbol(&g, "T"))),
            vec!["$end", "')'", "'*'", "'+'"]
        );
        assert_eq!(ff.follow(symbol(&g, "F")), ff.follow(symbol(&g, "T")));
    }

    #[test]
    fn terminal_first_is_itself() {
        let g = Grammar::parse(EXPR).unwrap();
        let ff = g.first_follow();
        for t in g.terminal_iter() {
            assert_eq!(ff.first(t.index), &BTreeSet::from([t.index]));
            assert!(!ff.nullable(t.index));
            assert!(ff.follow(t.index).is_empty());
        }
    }

    #[test]
    fn end_mark_follows_start_symbol() {
        let g = Grammar::parse("%% s : 'a' s | 'b' ; %%").unwrap();
        let ff = g.first_follow();
        assert!(ff.follow(g.start_symbol).contains(&g.end_mark));
    }

    #[test]
    fn epsilon_rules_and_nullable_chains() {
        let g = Grammar::parse("%% s : a b 'c' ; a : 'x' | ; b : a a ; %%").unwrap();
        let ff = g.first_follow();
        let a = symbol(&g, "a");
        let b = symbol(&g, "b");
        assert_eq!(g.epsilon, vec![a]);
        assert!(ff.nullable(a));
        assert!(ff.nullable(b));
        // picked up from `a` before `'c'` stops the walk
        assert!(ff.nullable(g.start_symbol));
        assert_eq!(names(&g, ff.first(g.start_symbol)), vec!["'c'", "'x'"]);
        assert_eq!(names(&g, ff.follow(a)), vec!["'c'", "'x'"]);
        assert_eq!(names(&g, ff.follow(b)), vec!["'c'"]);
    }

    #[test]
    fn empty_marker_survives_a_stopped_walk() {
        let g = Grammar::parse(
            "%% s : a x 'd' ; x : b 'c' ; b : 'y' | ; a : 'z' ; %%",
        )
        .unwrap();
        let ff = g.first_follow();
        let x = symbol(&g, "x");
        assert_eq!(names(&g, ff.first(x)), vec!["'c'", "'y'"]);
        assert!(ff.nullable(x));
        assert!(!g.epsilon.contains(&x));
        assert_eq!(
            names(&g, ff.follow(symbol(&g, "a"))),
            vec!["'c'", "'d'", "'y'"]
        );
        assert!(!ff.nullable(g.start_symbol));
    }

    #[test]
    fn left_recursion_through_empty_rule() {
        let g = Grammar::parse("%% l : l 'a' | ; %%").unwrap();
        let ff = g.first_follow();
        let l = g.start_symbol;
        assert_eq!(names(&g, ff.first(l)), vec!["'a'"]);
        assert!(ff.nullable(l));
        assert_eq!(names(&g, ff.follow(l)), vec!["$end", "'a'"]);
    }

    #[test]
    fn mutual_left_recursion_terminates() {
        let g = Grammar::parse("%% a : b 'p' | 'x' ; b : a 'q' | 'y' ; %%").unwrap();
        let ff = g.first_follow();
        assert_eq!(names(&g, ff.first(symbol(&g, "a"))), vec!["'x'", "'y'"]);
        assert_eq!(names(&g, ff.first(symbol(&g, "b"))), vec!["'x'", "'y'"]);
        assert_eq!(names(&g, ff.follow(symbol(&g, "a"))), vec!["$end", "'q'"]);
    }

    /// Known under-approximation: `x` can vanish (via `x : b`), so `'c'` is
    /// in the true FIRST(x), but the self occurrence in `x : b x 'c'` stops
    /// the walk because `x` heads no empty rule itself.
    #[test]
    fn self_reference_under_approximates_first() {
        let g = Grammar::parse("%% x : b x 'c' | b ; b : 'b' | ; %%").unwrap();
        let ff = g.first_follow();
        let x = g.start_symbol;
        assert!(ff.nullable(x));
        assert!(!g.epsilon.contains(&x));
        assert_eq!(names(&g, ff.first(x)), vec!["'b'"]);
        assert!(!ff.first(x).contains(&symbol(&g, "'c'")));
    }
}
