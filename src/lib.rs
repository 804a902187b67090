extern crate wasm_bindgen;

use wasm_bindgen::prelude::*;

pub mod error;
pub mod grammar;

pub use error::{GrammarError, Result};
pub use grammar::grammar_table::GrammarTable;
pub use grammar::Grammar;

/// Runs the whole pipeline: parse, FIRST/FOLLOW, LR(0) automaton, SLR(1)
/// table.
pub fn compile(spec: &str) -> Result<GrammarTable> {
    let g = Grammar::parse(spec)?;
    let sets = g.first_follow();
    let fsm = g.to_lr_fsm();
    let table = fsm.to_parsing_table(&g, &sets)?;
    Ok(GrammarTable::new(&g, &fsm, table))
}

#[wasm_bindgen]
pub fn grammar_table_to_json(spec: &str) -> String {
    match compile(spec).and_then(|t| t.to_json()) {
        Ok(json) => json,
        Err(e) => serde_json::json!({ "error": e.to_string() }).to_string(),
    }
}

#[cfg(test)]
mod parse_tests {
    use crate::grammar::{grammar::Associativity, ACCEPT, END_MARK, ERROR};

    #[test]
    fn simple_parse() {
        let g = crate::Grammar::parse("%token NUM\n%%\ns : NUM '+' NUM ;\n%%\n").unwrap();

        let s = g.symbol_table.get("s").unwrap().clone();
        let num = g.symbol_table.get("NUM").unwrap().clone();
        let plus = g.symbol_table.get("'+'").unwrap().clone();

        assert_eq!(g.get_symbol_name(s), "s");
        assert_eq!(g.get_symbol_name(num), "NUM");
        assert_eq!(g.start_symbol, s);
        assert_eq!(g.productions[0].left, g.accept_symbol);
        assert_eq!(g.productions[0].right, vec![s]);
        assert_eq!(g.productions[1].right, vec![num, plus, num]);
    }

    #[test]
    fn symbol_order() {
        let g = crate::Grammar::parse("%token B A\n%%\nx : y 'q' A ;\ny : 'p' B | error ;\n%%")
            .unwrap();
        let names: Vec<&str> = g.symbols.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec!["B", "A", ERROR, END_MARK, "'q'", "'p'", ACCEPT, "x", "y"]
        );
        assert_eq!(g.terminal_count(), 6);
        assert_eq!(g.non_terminal_count(), 3);
        assert!(g.is_terminal(g.error_symbol));
        assert!(!g.is_terminal(g.accept_symbol));
    }

    #[test]
    fn whitespace_and_comments_are_free_form() {
        let g = crate::Grammar::parse(
            "  %token ID /* ids */\n%%\n\n  list /* l */ :\n    list ',' ID\n  | ID\n  ;\n%%",
        )
        .unwrap();
        assert_eq!(g.get_symbol_name(g.start_symbol), "list");
        assert_eq!(g.productions.len(), 3);
    }

    #[test]
    fn rule_precedence() {
        let g = crate::Grammar::parse(
            "%left '+' '-'\n%left '*'\n%right UMINUS\n%%\n\
             e : e '+' e | e '*' e | '-' e %prec UMINUS | 'n' ;\n%%",
        )
        .unwrap();
        let level = |i: usize| g.productions[i].precedence.map(|p| p.level);
        assert_eq!(level(1), Some(1));
        assert_eq!(level(2), Some(2));
        assert_eq!(level(3), Some(3));
        assert_eq!(level(4), None);
        assert_eq!(
            g.productions[3].precedence.unwrap().associativity,
            Associativity::Right
        );
    }

    #[test]
    fn precedence_only_tokens_are_terminals() {
        let g = crate::Grammar::parse("%left PLUS\n%%\ne : e PLUS e | 'n' ;\n%%").unwrap();
        let plus = g.get_symbol_index("PLUS").unwrap();
        assert!(g.is_terminal(plus));
        assert_eq!(g.precedence_of(plus).unwrap().level, 1);
    }

    #[test]
    #[should_panic]
    fn no_rules_section() {
        let _g = crate::Grammar::parse("%token A\n").unwrap();
    }

    #[test]
    #[should_panic]
    fn rule_without_semicolon() {
        let _g = crate::Grammar::parse("%%\ns : 'a'\n%%").unwrap();
    }
}
