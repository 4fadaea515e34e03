//! Tokenizer for structural queries.

use super::error::{QueryError, QueryErrorKind};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Slash,
    DoubleSlash,
    LBracket,
    RBracket,
    LParen,
    RParen,
    At,
    Comma,
    Pipe,
    Dot,
    DotDot,
    Star,
    ColonColon,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Name(String),
    Literal(String),
    Number(f64),
}

impl Token {
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Slash => "`/`".into(),
            Self::DoubleSlash => "`//`".into(),
            Self::LBracket => "`[`".into(),
            Self::RBracket => "`]`".into(),
            Self::LParen => "`(`".into(),
            Self::RParen => "`)`".into(),
            Self::At => "`@`".into(),
            Self::Comma => "`,`".into(),
            Self::Pipe => "`|`".into(),
            Self::Dot => "`.`".into(),
            Self::DotDot => "`..`".into(),
            Self::Star => "`*`".into(),
            Self::ColonColon => "`::`".into(),
            Self::Eq => "`=`".into(),
            Self::NotEq => "`!=`".into(),
            Self::Lt => "`<`".into(),
            Self::Le => "`<=`".into(),
            Self::Gt => "`>`".into(),
            Self::Ge => "`>=`".into(),
            Self::Name(name) => format!("name `{name}`"),
            Self::Literal(text) => format!("literal '{text}'"),
            Self::Number(n) => format!("number {n}"),
        }
    }
}

/// A token and its byte offset in the query text.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub offset: usize,
}

pub(crate) fn tokenize(query: &str) -> Result<Vec<Spanned>, QueryError> {
    let bytes = query.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let start = i;
        let c = bytes[i];
        let next = bytes.get(i + 1).copied();

        let token = match c {
            b' ' | b'\t' | b'\r' | b'\n' => {
                i += 1;
                continue;
            }
            b'/' if next == Some(b'/') => {
                i += 2;
                Token::DoubleSlash
            }
            b'/' => {
                i += 1;
                Token::Slash
            }
            b'.' if next == Some(b'.') => {
                i += 2;
                Token::DotDot
            }
            b'.' if next.is_some_and(|n| n.is_ascii_digit()) => {
                let (number, end) = scan_number(query, i);
                i = end;
                Token::Number(number)
            }
            b'.' => {
                i += 1;
                Token::Dot
            }
            b':' if next == Some(b':') => {
                i += 2;
                Token::ColonColon
            }
            b'!' if next == Some(b'=') => {
                i += 2;
                Token::NotEq
            }
            b'<' if next == Some(b'=') => {
                i += 2;
                Token::Le
            }
            b'>' if next == Some(b'=') => {
                i += 2;
                Token::Ge
            }
            b'[' | b']' | b'(' | b')' | b'@' | b',' | b'|' | b'*' | b'=' | b'<' | b'>' => {
                i += 1;
                match c {
                    b'[' => Token::LBracket,
                    b']' => Token::RBracket,
                    b'(' => Token::LParen,
                    b')' => Token::RParen,
                    b'@' => Token::At,
                    b',' => Token::Comma,
                    b'|' => Token::Pipe,
                    b'*' => Token::Star,
                    b'=' => Token::Eq,
                    b'<' => Token::Lt,
                    _ => Token::Gt,
                }
            }
            b'\'' | b'"' => {
                let (text, end) = scan_literal(query, i)?;
                i = end;
                Token::Literal(text)
            }
            c if c.is_ascii_digit() => {
                let (number, end) = scan_number(query, i);
                i = end;
                Token::Number(number)
            }
            c if c.is_ascii_alphabetic() || c == b'_' => {
                while i < bytes.len()
                    && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'-')
                {
                    i += 1;
                }
                Token::Name(query[start..i].to_string())
            }
            _ => {
                let found = query[start..].chars().next().unwrap_or('?');
                return Err(QueryError::new(
                    query,
                    Some(start),
                    QueryErrorKind::UnexpectedChar(found),
                ));
            }
        };

        tokens.push(Spanned {
            token,
            offset: start,
        });
    }

    Ok(tokens)
}

/// Scans a quoted literal. A doubled delimiter stands for the delimiter itself.
fn scan_literal(query: &str, start: usize) -> Result<(String, usize), QueryError> {
    let bytes = query.as_bytes();
    let quote = bytes[start];
    let mut text = String::new();
    let mut i = start + 1;
    let mut chunk_start = i;

    loop {
        match bytes.get(i) {
            None => {
                return Err(QueryError::new(
                    query,
                    Some(start),
                    QueryErrorKind::UnterminatedLiteral,
                ))
            }
            Some(&b) if b == quote => {
                text.push_str(&query[chunk_start..i]);
                if bytes.get(i + 1) == Some(&quote) {
                    text.push(char::from(quote));
                    i += 2;
                    chunk_start = i;
                } else {
                    return Ok((text, i + 1));
                }
            }
            Some(_) => i += 1,
        }
    }
}

fn scan_number(query: &str, start: usize) -> (f64, usize) {
    let bytes = query.as_bytes();
    let mut i = start;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' && bytes.get(i + 1) != Some(&b'.') {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }
    (query[start..i].parse().unwrap_or(f64::NAN), i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(query: &str) -> Vec<Token> {
        tokenize(query).unwrap().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn path_with_predicate() {
        assert_eq!(
            kinds("//CLASS_DEF/IDENT[@text='Foo']"),
            vec![
                Token::DoubleSlash,
                Token::Name("CLASS_DEF".into()),
                Token::Slash,
                Token::Name("IDENT".into()),
                Token::LBracket,
                Token::At,
                Token::Name("text".into()),
                Token::Eq,
                Token::Literal("Foo".into()),
                Token::RBracket,
            ]
        );
    }

    #[test]
    fn axes_and_hyphenated_names() {
        assert_eq!(
            kinds("following-sibling::* | ..[1.5 >= .5]"),
            vec![
                Token::Name("following-sibling".into()),
                Token::ColonColon,
                Token::Star,
                Token::Pipe,
                Token::DotDot,
                Token::LBracket,
                Token::Number(1.5),
                Token::Ge,
                Token::Number(0.5),
                Token::RBracket,
            ]
        );
    }

    #[test]
    fn doubled_quotes_escape() {
        assert_eq!(kinds("'it''s'"), vec![Token::Literal("it's".into())]);
        assert_eq!(kinds("\"say \"\"hi\"\"\""), vec![Token::Literal("say \"hi\"".into())]);
    }

    #[test]
    fn offsets_are_byte_positions() {
        let tokens = tokenize("/A  //B").unwrap();
        let offsets: Vec<_> = tokens.iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0, 1, 4, 6]);
    }

    #[test]
    fn unterminated_literal() {
        let err = tokenize("//IDENT[@text='Foo]").unwrap_err();
        assert_eq!(err.position(), Some(14));
        assert!(err.to_string().contains("unterminated"));
    }

    #[test]
    fn unexpected_character() {
        let err = tokenize("//A#").unwrap_err();
        assert_eq!(err.position(), Some(3));
    }
}
