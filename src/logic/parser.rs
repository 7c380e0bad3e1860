//! Recursive-descent parser for `logic_form` strings.

use crate::error::ParseError;

use super::Expr;

/// Deepest nesting of calls and parentheses a formula may use.
pub const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    LParen,
    RParen,
    Comma,
    Eq,
    Ne,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Self::Ident(name) => format!("'{name}'"),
            Self::LParen => "'('".to_string(),
            Self::RParen => "')'".to_string(),
            Self::Comma => "','".to_string(),
            Self::Eq => "'=='".to_string(),
            Self::Ne => "'!='".to_string(),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<(usize, Token)>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, ch)) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push((pos, Token::LParen));
            }
            ')' => {
                chars.next();
                tokens.push((pos, Token::RParen));
            }
            ',' => {
                chars.next();
                tokens.push((pos, Token::Comma));
            }
            '=' | '!' => {
                chars.next();
                match chars.next() {
                    Some((_, '=')) => tokens.push((pos, if ch == '=' { Token::Eq } else { Token::Ne })),
                    _ => return Err(ParseError::UnexpectedChar { ch, pos }),
                }
            }
            c if is_symbol_char(c) => {
                let mut name = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if !is_symbol_char(c) {
                        break;
                    }
                    name.push(c);
                    chars.next();
                }
                tokens.push((pos, Token::Ident(name)));
            }
            _ => return Err(ParseError::UnexpectedChar { ch, pos }),
        }
    }

    Ok(tokens)
}

fn is_symbol_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn bool_literal(name: &str) -> Option<bool> {
    match name {
        "True" | "true" => Some(true),
        "False" | "false" => Some(false),
        _ => None,
    }
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    cursor: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&(usize, Token)> {
        self.tokens.get(self.cursor)
    }

    fn next(&mut self, expected: &str) -> Result<(usize, Token), ParseError> {
        let tok = self.tokens.get(self.cursor).cloned().ok_or_else(|| ParseError::UnexpectedEnd {
            expected: expected.to_string(),
        })?;
        self.cursor += 1;
        Ok(tok)
    }

    fn expect(&mut self, want: &Token) -> Result<(), ParseError> {
        let expected = want.describe();
        let (pos, tok) = self.next(&expected)?;
        if &tok == want {
            Ok(())
        } else {
            Err(ParseError::UnexpectedToken {
                found: tok.describe(),
                expected,
                pos,
            })
        }
    }

    fn comparison(&mut self) -> Result<Expr, ParseError> {
        if self.depth == MAX_DEPTH {
            let pos = self.peek().map_or(0, |(pos, _)| *pos);
            return Err(ParseError::TooDeep { max: MAX_DEPTH, pos });
        }
        self.depth += 1;
        let result = self.comparison_at_depth();
        self.depth -= 1;
        result
    }

    fn comparison_at_depth(&mut self) -> Result<Expr, ParseError> {
        let expr = self.term()?;

        let negated = match self.peek() {
            Some((_, Token::Eq)) => false,
            Some((_, Token::Ne)) => true,
            _ => return Ok(expr),
        };
        self.cursor += 1;

        let (pos, tok) = self.next("True or False")?;
        let value = match &tok {
            Token::Ident(name) => bool_literal(name),
            _ => None,
        }
        .ok_or_else(|| ParseError::UnexpectedToken {
            found: tok.describe(),
            expected: "True or False".to_string(),
            pos,
        })?;

        // `x == True` is x, `x != True` is Not(x), and so on.
        Ok(if value != negated { expr } else { expr.negate() })
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        let (pos, tok) = self.next("a formula")?;
        match tok {
            Token::LParen => {
                let inner = self.comparison()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Token::Ident(name) if matches!(self.peek(), Some((_, Token::LParen))) => {
                self.cursor += 1;
                self.call(name, pos)
            }
            Token::Ident(name) => Ok(match bool_literal(&name) {
                Some(b) => Expr::Const(b),
                None => Expr::Var(name),
            }),
            other => Err(ParseError::UnexpectedToken {
                found: other.describe(),
                expected: "a formula".to_string(),
                pos,
            }),
        }
    }

    fn call(&mut self, name: String, pos: usize) -> Result<Expr, ParseError> {
        if !matches!(name.as_str(), "Not" | "And" | "Or" | "Implies") {
            return Err(ParseError::UnknownFunction { name, pos });
        }

        let mut args = vec![self.comparison()?];
        loop {
            let (pos, tok) = self.next("',' or ')'")?;
            match tok {
                Token::Comma => args.push(self.comparison()?),
                Token::RParen => break,
                other => {
                    return Err(ParseError::UnexpectedToken {
                        found: other.describe(),
                        expected: "',' or ')'".to_string(),
                        pos,
                    })
                }
            }
        }

        let actual = args.len();
        let arity = |expected: &str| ParseError::Arity {
            function: name.clone(),
            expected: expected.to_string(),
            actual,
        };

        match name.as_str() {
            "Not" if args.len() == 1 => Ok(args.remove(0).negate()),
            "Not" => Err(arity("1")),
            "Implies" if args.len() == 2 => {
                let consequent = args.remove(1);
                let antecedent = args.remove(0);
                Ok(Expr::Implies(Box::new(antecedent), Box::new(consequent)))
            }
            "Implies" => Err(arity("2")),
            "And" | "Or" if args.len() < 2 => Err(arity("at least 2")),
            "And" => Ok(Expr::And(args)),
            _ => Ok(Expr::Or(args)),
        }
    }
}

/// Parses a `logic_form` string.
///
/// # Errors
///
/// Returns [`ParseError`] for empty input, stray characters, unknown
/// connectives, wrong argument counts, nesting deeper than [`MAX_DEPTH`]
/// or trailing input.
pub fn parse(input: &str) -> Result<Expr, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let mut parser = Parser {
        tokens: tokenize(input)?,
        cursor: 0,
        depth: 0,
    };
    let expr = parser.comparison()?;

    if let Some((pos, tok)) = parser.peek() {
        return Err(ParseError::UnexpectedToken {
            found: tok.describe(),
            expected: "end of input".to_string(),
            pos: *pos,
        });
    }
    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Expr {
        Expr::var(name)
    }

    #[test]
    fn test_equality_literals() {
        assert_eq!(parse("met_jones == True").unwrap(), var("met_jones"));
        assert_eq!(parse("met_jones == False").unwrap(), var("met_jones").negate());
        assert_eq!(parse("met_jones != True").unwrap(), var("met_jones").negate());
        assert_eq!(parse("met_jones!=False").unwrap(), var("met_jones"));
    }

    #[test]
    fn test_connectives_of_bare_symbols() {
        assert_eq!(parse("Not(a)").unwrap(), var("a").negate());
        assert_eq!(parse("And(a, b)").unwrap(), Expr::And(vec![var("a"), var("b")]));
        assert_eq!(parse("Or(a,b)").unwrap(), Expr::Or(vec![var("a"), var("b")]));
        assert_eq!(
            parse("Implies(a, b)").unwrap(),
            Expr::Implies(Box::new(var("a")), Box::new(var("b")))
        );
    }

    #[test]
    fn test_nested_formulas() {
        let e = parse("And(x, Not(x))").unwrap();
        assert_eq!(e, Expr::And(vec![var("x"), var("x").negate()]));

        let e = parse("Implies(a == True, Or(b, c == False))").unwrap();
        assert_eq!(
            e,
            Expr::Implies(
                Box::new(var("a")),
                Box::new(Expr::Or(vec![var("b"), var("c").negate()]))
            )
        );

        assert_eq!(parse("(a) == False").unwrap(), var("a").negate());
    }

    #[test]
    fn test_bool_constants() {
        assert_eq!(parse("True").unwrap(), Expr::Const(true));
        assert_eq!(parse("Not(false)").unwrap(), Expr::Const(true));
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(parse("   "), Err(ParseError::Empty));
    }

    #[test]
    fn test_rejects_code() {
        assert!(matches!(
            parse("__import__('os').system('ls')"),
            Err(ParseError::UnexpectedChar { ch: '\'', .. })
        ));
        assert!(matches!(
            parse("eval(x)"),
            Err(ParseError::UnknownFunction { ref name, pos: 0 }) if name == "eval"
        ));
    }

    #[test]
    fn test_rejects_trailing_input() {
        assert!(matches!(
            parse("x == True and y"),
            Err(ParseError::UnexpectedToken { ref expected, .. }) if expected == "end of input"
        ));
    }

    #[test]
    fn test_rejects_bad_arity() {
        assert!(matches!(parse("Not(a, b)"), Err(ParseError::Arity { actual: 2, .. })));
        assert!(matches!(parse("Implies(a)"), Err(ParseError::Arity { actual: 1, .. })));
        assert!(matches!(parse("And(a)"), Err(ParseError::Arity { actual: 1, .. })));
    }

    #[test]
    fn test_rejects_non_bool_comparison() {
        assert!(matches!(parse("x == 3"), Err(ParseError::UnexpectedToken { .. })));
        assert!(matches!(parse("x = True"), Err(ParseError::UnexpectedChar { ch: '=', pos: 2 })));
    }

    #[test]
    fn test_unterminated_call() {
        assert!(matches!(parse("And(a, b"), Err(ParseError::UnexpectedEnd { .. })));
    }

    #[test]
    fn test_depth_limit() {
        let nested = |n: usize| format!("{}x{}", "Not(".repeat(n), ")".repeat(n));
        // the outermost call is depth 1 and the bare symbol one deeper
        assert!(parse(&nested(MAX_DEPTH - 1)).is_ok());
        assert!(matches!(
            parse(&nested(MAX_DEPTH)),
            Err(ParseError::TooDeep { max: MAX_DEPTH, .. })
        ));
        assert!(matches!(
            parse(&nested(50_000)),
            Err(ParseError::TooDeep { max: MAX_DEPTH, pos }) if pos == 4 * MAX_DEPTH
        ));

        let parens = format!("{}x{}", "(".repeat(MAX_DEPTH + 1), ")".repeat(MAX_DEPTH + 1));
        assert!(matches!(parse(&parens), Err(ParseError::TooDeep { .. })));
    }
}
