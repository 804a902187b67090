use serde::Serialize;

use crate::error::{GrammarError, Result};

use super::sections::is_identifier;

/// A piece of action text as a renderer sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Segment {
    /// Code copied through unchanged.
    Text(String),
    /// `$$`, the value of the rule's left side.
    Result,
    /// `$n`, the value of the n-th right side symbol (1-based).
    Arg(usize),
    /// `$<member>$`
    TypedResult { member: String },
    /// `$<member>n`
    TypedArg { member: String, index: usize },
}

/// Raw action code attached to a rule, with its `$$`/`$n` placeholders
/// located and checked against the rule's arity. Substituting them is up to
/// the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SemanticAction {
    text: String,
    segments: Vec<Segment>,
}

impl SemanticAction {
    pub fn parse(text: &str, rule: usize, arity: usize) -> Result<Self> {
        let malformed = |message: &str| GrammarError::MalformedAction {
            rule,
            message: message.to_string(),
        };

        let chars: Vec<char> = text.chars().collect();
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            match c {
                '"' | '\'' => {
                    current.push(c);
                    i += 1;
                    loop {
                        let d = *chars.get(i).ok_or_else(|| malformed("unterminated literal"))?;
                        current.push(d);
                        i += 1;
                        if d == '\\' {
                            let e = *chars.get(i).ok_or_else(|| malformed("unterminated literal"))?;
                            current.push(e);
                            i += 1;
                        } else if d == c {
                            break;
                        }
                    }
                }
                '/' if chars.get(i + 1) == Some(&'*') => {
                    let end = (i + 2..chars.len().saturating_sub(1))
                        .find(|&j| chars[j] == '*' && chars[j + 1] == '/')
                        .ok_or_else(|| malformed("unterminated comment"))?;
                    current.extend(&chars[i..end + 2]);
                    i = end + 2;
                }
                '/' if chars.get(i + 1) == Some(&'/') => {
                    while let Some(&d) = chars.get(i).filter(|&&d| d != '\n') {
                        current.push(d);
                        i += 1;
                    }
                }
                '$' => {
                    let (member, at) = if chars.get(i + 1) == Some(&'<') {
                        let close = chars[i + 2..]
                            .iter()
                            .position(|&d| d == '>')
                            .map(|p| i + 2 + p)
                            .ok_or_else(|| malformed("unterminated type tag"))?;
                        let member: String = chars[i + 2..close].iter().collect();
                        if !is_identifier(&member) {
                            return Err(malformed("malformed type tag"));
                        }
                        (Some(member), close + 1)
                    } else {
                        (None, i + 1)
                    };
                    match chars.get(at).copied() {
                        Some('$') => {
                            flush(&mut current, &mut segments);
                            segments.push(match member {
                                Some(member) => Segment::TypedResult { member },
                                None => Segment::Result,
                            });
                            i = at + 1;
                        }
                        Some(d) if d.is_ascii_digit() => {
                            let digits: String = chars[at..]
                                .iter()
                                .take_while(|c| c.is_ascii_digit())
                                .collect();
                            let index = digits
                                .parse::<usize>()
                                .map_err(|_| malformed("placeholder index too large"))?;
                            if index < 1 || index > arity {
                                return Err(GrammarError::PlaceholderOutOfRange {
                                    rule,
                                    index,
                                    arity,
                                });
                            }
                            flush(&mut current, &mut segments);
                            segments.push(match member {
                                Some(member) => Segment::TypedArg { member, index },
                                None => Segment::Arg(index),
                            });
                            i = at + digits.len();
                        }
                        _ if member.is_some() => {
                            return Err(malformed("type tag must precede $$ or $n"));
                        }
                        _ => {
                            current.push(c);
                            i += 1;
                        }
                    }
                }
                _ => {
                    current.push(c);
                    i += 1;
                }
            }
        }
        flush(&mut current, &mut segments);

        Ok(Self {
            text: text.to_string(),
            segments,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

fn flush(current: &mut String, segments: &mut Vec<Segment>) {
    if !current.is_empty() {
        segments.push(Segment::Text(std::mem::take(current)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_placeholders() {
        let a = SemanticAction::parse("{ $$ = $1 + $3; }", 4, 3).unwrap();
        assert_eq!(
            a.segments(),
            &[
                Segment::Text("{ ".to_string()),
                Segment::Result,
                Segment::Text(" = ".to_string()),
                Segment::Arg(1),
                Segment::Text(" + ".to_string()),
                Segment::Arg(3),
                Segment::Text("; }".to_string()),
            ]
        );
        assert_eq!(a.text(), "{ $$ = $1 + $3; }");
    }

    #[test]
    fn literals_and_comments_are_opaque() {
        let a = SemanticAction::parse(r#"{ printf("$9 \" $1"); c = '$'; /* $7 */ }"#, 1, 0).unwrap();
        assert_eq!(a.segments().len(), 1);
    }

    #[test]
    fn out_of_range_placeholders() {
        assert_eq!(
            SemanticAction::parse("{ $$ = $3; }", 2, 2),
            Err(GrammarError::PlaceholderOutOfRange {
                rule: 2,
                index: 3,
                arity: 2
            })
        );
        assert_eq!(
            SemanticAction::parse("{ $$ = $0; }", 5, 1),
            Err(GrammarError::PlaceholderOutOfRange {
                rule: 5,
                index: 0,
                arity: 1
            })
        );
        assert!(matches!(
            SemanticAction::parse("{ $$ = $1; }", 3, 0),
            Err(GrammarError::PlaceholderOutOfRange { index: 1, .. })
        ));
    }

    #[test]
    fn unterminated_pieces() {
        assert!(matches!(
            SemanticAction::parse("{ x = \"abc; }", 1, 0),
            Err(GrammarError::MalformedAction { rule: 1, .. })
        ));
        assert!(matches!(
            SemanticAction::parse("{ /* x }", 1, 0),
            Err(GrammarError::MalformedAction { rule: 1, .. })
        ));
    }

    #[test]
    fn typed_placeholders() {
        let a = SemanticAction::parse("{ $<v>$ = $<s>2; }", 1, 2).unwrap();
        assert_eq!(
            a.segments(),
            &[
                Segment::Text("{ ".to_string()),
                Segment::TypedResult {
                    member: "v".to_string()
                },
                Segment::Text(" = ".to_string()),
                Segment::TypedArg {
                    member: "s".to_string(),
                    index: 2
                },
                Segment::Text("; }".to_string()),
            ]
        );
        assert_eq!(
            SemanticAction::parse("{ $<v>3; }", 4, 2),
            Err(GrammarError::PlaceholderOutOfRange {
                rule: 4,
                index: 3,
                arity: 2
            })
        );
        assert!(matches!(
            SemanticAction::parse("{ $<v x; }", 1, 1),
            Err(GrammarError::MalformedAction { .. })
        ));
        assert!(matches!(
            SemanticAction::parse("{ $<v>x; }", 1, 1),
            Err(GrammarError::MalformedAction { .. })
        ));
    }

    #[test]
    fn line_comments_are_opaque() {
        let a = SemanticAction::parse("{ x = $1; // it's $2\n}", 1, 1).unwrap();
        assert_eq!(
            a.segments(),
            &[
                Segment::Text("{ x = ".to_string()),
                Segment::Arg(1),
                Segment::Text("; // it's $2\n}".to_string()),
            ]
        );
    }

    #[test]
    fn lone_dollar_is_text() {
        let a = SemanticAction::parse("{ $x; }", 1, 1).unwrap();
        assert_eq!(a.segments(), &[Segment::Text("{ $x; }".to_string())]);
    }
}
