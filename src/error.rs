use thiserror::Error;

/// Every way turning a grammar specification into a table can fail.
///
/// All of these abort the whole run; no partial table is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("missing {0} '%%' section marker")]
    MissingSectionMarker(&'static str),
    #[error("empty rules section")]
    EmptyRules,
    #[error("missing start rule in rules section")]
    MissingStartRule,
    #[error("unmatched comment in {0} section")]
    UnmatchedComment(&'static str),
    #[error("unmatched '%{{' in declarations section")]
    UnmatchedLiteralBlock,
    #[error("incomplete %union in declarations section")]
    IncompleteUnion,
    #[error("declarations line {line}: malformed union member reference '{text}'")]
    MalformedUnionMember { line: usize, text: String },
    #[error("declarations line {line}: member '{member}' not found in union")]
    UnknownUnionMember { line: usize, member: String },
    #[error("declarations line {0}: %type requires a %union declaration")]
    TypeWithoutUnion(usize),
    #[error("rules line {0}: unmatched quote")]
    UnmatchedQuote(usize),
    #[error("rules line {0}: unmatched '{{'")]
    UnmatchedBrace(usize),
    #[error("rules line {0}: unexpected '}}'")]
    UnexpectedCloseBrace(usize),
    #[error("rules line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error("rules line {line}: invalid %prec argument '{argument}'")]
    MalformedPrec { line: usize, argument: String },
    #[error("rules line {0}: missing %prec argument")]
    MissingPrecArgument(usize),
    #[error("symbol '{0}' is neither a declared token nor the left side of a rule")]
    UndefinedSymbol(String),
    #[error("token '{0}' cannot appear on the left side of a rule")]
    TerminalOnLeft(String),
    #[error("rule {rule}: ${index} is out of range for a rule with {arity} symbols")]
    PlaceholderOutOfRange {
        rule: usize,
        index: usize,
        arity: usize,
    },
    #[error("rule {rule}: malformed semantic action ({message})")]
    MalformedAction { rule: usize, message: String },
    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, GrammarError>;
