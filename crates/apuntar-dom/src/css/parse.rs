//! Recursive-descent parser for the supported selector grammar.

use super::{AttrOp, Combinator, ComplexSelector, Compound, Nth, Pseudo, SelectorList, Simple};
use crate::error::QueryError;

struct Cursor {
    chars: Vec<char>,
    pos: usize,
}

impl Cursor {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn error(&self, message: impl Into<String>) -> QueryError {
        QueryError::Parse {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    /// CSS identifier with backslash escapes (`\.`, `\31 `).
    fn ident(&mut self) -> Result<String, QueryError> {
        let mut out = String::new();
        loop {
            match self.peek() {
                Some('\\') => {
                    self.pos += 1;
                    out.push(self.escape()?);
                }
                Some(ch) if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || !ch.is_ascii() => {
                    out.push(ch);
                    self.pos += 1;
                }
                _ => break,
            }
        }
        if out.is_empty() {
            return Err(self.error("expected identifier"));
        }
        Ok(out)
    }

    fn escape(&mut self) -> Result<char, QueryError> {
        let Some(first) = self.bump() else {
            return Err(self.error("dangling escape"));
        };
        if !first.is_ascii_hexdigit() {
            return Ok(first);
        }
        let mut hex = String::from(first);
        while hex.len() < 6 && self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
            hex.push(self.bump().unwrap_or_default());
        }
        // One whitespace terminates a hex escape.
        if self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        let code = u32::from_str_radix(&hex, 16).map_err(|_| self.error("bad hex escape"))?;
        char::from_u32(code).ok_or_else(|| self.error("escape out of range"))
    }

    fn string(&mut self, quote: char) -> Result<String, QueryError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some('\\') => match self.bump() {
                    None => return Err(self.error("dangling escape in string")),
                    Some(ch) => out.push(ch),
                },
                Some(ch) if ch == quote => return Ok(out),
                Some(ch) => out.push(ch),
            }
        }
    }

    fn integer(&mut self) -> Result<usize, QueryError> {
        let mut digits = String::new();
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            digits.push(self.bump().unwrap_or_default());
        }
        if digits.is_empty() {
            return Err(self.error("expected integer"));
        }
        digits.parse().map_err(|_| self.error("integer overflow"))
    }
}

pub(crate) fn parse_selector_list(input: &str) -> Result<SelectorList, QueryError> {
    if input.trim().is_empty() {
        return Err(QueryError::Empty);
    }
    let mut cursor = Cursor::new(input);
    let mut selectors = Vec::new();
    loop {
        cursor.skip_ws();
        selectors.push(parse_complex(&mut cursor)?);
        cursor.skip_ws();
        if cursor.at_end() {
            break;
        }
        if !cursor.eat(',') {
            return Err(cursor.error("expected ',' or end of selector"));
        }
    }
    Ok(SelectorList { selectors })
}

fn parse_complex(cursor: &mut Cursor) -> Result<ComplexSelector, QueryError> {
    let mut parts = vec![(Combinator::Descendant, parse_compound(cursor)?)];
    loop {
        let had_ws = cursor.skip_ws();
        let combinator = match cursor.peek() {
            Some('>') => {
                cursor.pos += 1;
                Combinator::Child
            }
            Some('+') => {
                cursor.pos += 1;
                Combinator::NextSibling
            }
            Some('~') => {
                cursor.pos += 1;
                Combinator::SubsequentSibling
            }
            Some(',') | None => break,
            Some(_) if had_ws => Combinator::Descendant,
            Some(_) => return Err(cursor.error("unexpected character in selector")),
        };
        cursor.skip_ws();
        parts.push((combinator, parse_compound(cursor)?));
    }
    Ok(ComplexSelector { parts })
}

fn parse_compound(cursor: &mut Cursor) -> Result<Compound, QueryError> {
    let mut compound = Compound {
        tag: None,
        universal: false,
        simples: Vec::new(),
    };
    if cursor.eat('*') {
        compound.universal = true;
    } else if cursor
        .peek()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '\\')
    {
        compound.tag = Some(cursor.ident()?.to_ascii_lowercase());
    }
    loop {
        match cursor.peek() {
            Some('#') => {
                cursor.pos += 1;
                compound.simples.push(Simple::Id(cursor.ident()?));
            }
            Some('.') => {
                cursor.pos += 1;
                compound.simples.push(Simple::Class(cursor.ident()?));
            }
            Some('[') => {
                cursor.pos += 1;
                compound.simples.push(parse_attr(cursor)?);
            }
            Some(':') => {
                cursor.pos += 1;
                compound.simples.push(Simple::Pseudo(parse_pseudo(cursor)?));
            }
            _ => break,
        }
    }
    if compound.tag.is_none() && !compound.universal && compound.simples.is_empty() {
        return Err(cursor.error("expected a compound selector"));
    }
    Ok(compound)
}

fn parse_attr(cursor: &mut Cursor) -> Result<Simple, QueryError> {
    cursor.skip_ws();
    let name = cursor.ident()?.to_ascii_lowercase();
    cursor.skip_ws();
    let op = match cursor.peek() {
        Some(']') => {
            cursor.pos += 1;
            return Ok(Simple::Attr {
                name,
                op: AttrOp::Exists,
                value: None,
            });
        }
        Some('=') => {
            cursor.pos += 1;
            AttrOp::Equals
        }
        Some('^') => {
            cursor.pos += 1;
            if !cursor.eat('=') {
                return Err(cursor.error("expected '=' after '^'"));
            }
            AttrOp::Prefix
        }
        Some('$') => {
            cursor.pos += 1;
            if !cursor.eat('=') {
                return Err(cursor.error("expected '=' after '$'"));
            }
            AttrOp::Suffix
        }
        Some('*') => {
            cursor.pos += 1;
            if !cursor.eat('=') {
                return Err(cursor.error("expected '=' after '*'"));
            }
            AttrOp::Substring
        }
        _ => return Err(cursor.error("expected attribute operator or ']'")),
    };
    cursor.skip_ws();
    let value = match cursor.peek() {
        Some(q @ ('"' | '\'')) => {
            cursor.pos += 1;
            cursor.string(q)?
        }
        _ => cursor.ident()?,
    };
    cursor.skip_ws();
    if !cursor.eat(']') {
        return Err(cursor.error("expected ']'"));
    }
    Ok(Simple::Attr {
        name,
        op,
        value: Some(value),
    })
}

fn parse_pseudo(cursor: &mut Cursor) -> Result<Pseudo, QueryError> {
    let name = cursor.ident()?.to_ascii_lowercase();
    match name.as_str() {
        "first-child" => Ok(Pseudo::FirstChild),
        "last-child" => Ok(Pseudo::LastChild),
        "only-child" => Ok(Pseudo::OnlyChild),
        "first-of-type" => Ok(Pseudo::FirstOfType),
        "last-of-type" => Ok(Pseudo::LastOfType),
        "only-of-type" => Ok(Pseudo::OnlyOfType),
        "nth-child" => {
            expect_open(cursor)?;
            cursor.skip_ws();
            let nth = if cursor.peek().is_some_and(|c| c.is_ascii_digit()) {
                Nth::Index(cursor.integer()?)
            } else {
                match cursor.ident()?.to_ascii_lowercase().as_str() {
                    "even" => Nth::Even,
                    "odd" => Nth::Odd,
                    other => {
                        return Err(cursor.error(format!("unsupported nth argument '{other}'")))
                    }
                }
            };
            expect_close(cursor)?;
            Ok(Pseudo::NthChild(nth))
        }
        "nth-of-type" => {
            expect_open(cursor)?;
            cursor.skip_ws();
            let n = cursor.integer()?;
            expect_close(cursor)?;
            Ok(Pseudo::NthOfType(n))
        }
        other => Err(QueryError::Unsupported(format!(
            "pseudo-class ':{other}'"
        ))),
    }
}

fn expect_open(cursor: &mut Cursor) -> Result<(), QueryError> {
    if cursor.eat('(') {
        Ok(())
    } else {
        Err(cursor.error("expected '('"))
    }
}

fn expect_close(cursor: &mut Cursor) -> Result<(), QueryError> {
    cursor.skip_ws();
    if cursor.eat(')') {
        Ok(())
    } else {
        Err(cursor.error("expected ')'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compound_with_everything() {
        let list = parse_selector_list("li.item#main[data-x=\"1\"]:nth-child(2)").unwrap();
        assert_eq!(list.selectors.len(), 1);
        assert_eq!(list.selectors[0].parts.len(), 1);
        let compound = &list.selectors[0].parts[0].1;
        assert_eq!(compound.tag.as_deref(), Some("li"));
        assert_eq!(compound.simples.len(), 4);
    }

    #[test]
    fn combinator_precedence_over_whitespace() {
        let list = parse_selector_list("#a  >  .b ~ c + d e").unwrap();
        let combos: Vec<Combinator> = list.selectors[0]
            .parts
            .iter()
            .skip(1)
            .map(|(c, _)| *c)
            .collect();
        assert_eq!(
            combos,
            vec![
                Combinator::Child,
                Combinator::SubsequentSibling,
                Combinator::NextSibling,
                Combinator::Descendant
            ]
        );
    }

    #[test]
    fn rejects_trailing_combinator() {
        assert!(parse_selector_list("div >").is_err());
    }

    #[test]
    fn rejects_unknown_pseudo() {
        assert!(matches!(
            parse_selector_list("div:hover"),
            Err(QueryError::Unsupported(_))
        ));
    }

    #[test]
    fn single_quoted_attribute_value() {
        let list = parse_selector_list("[name='it\\'s']").unwrap();
        let Simple::Attr { value, .. } = &list.selectors[0].parts[0].1.simples[0] else {
            panic!("expected attr simple");
        };
        assert_eq!(value.as_deref(), Some("it's"));
    }
}
