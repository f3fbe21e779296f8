//! Parser for the member comment directive language.
//!
//! ```text
//! directive := '@' ident '(' args ')'
//! args      := arg (',' arg)*
//! arg       := directive | path
//! ```
//!
//! Free text around directives is ignored, and a directive that fails to parse
//! is dropped without affecting the others in the same comment.

use tracing::debug;

use crate::directives::Directive;
use crate::types::{TypeId, TypeKey};

enum Arg {
    Path(String),
    Directive(Directive),
}

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    /// Advance to the next `@`, returning false at end of input.
    fn seek_marker(&mut self) -> bool {
        match self.src[self.pos..].find('@') {
            Some(offset) => {
                self.pos += offset;
                true
            }
            None => {
                self.pos = self.src.len();
                false
            }
        }
    }

    fn ident(&mut self) -> &'a str {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    /// Raw text up to the next delimiter.
    fn path(&mut self) -> &'a str {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| !matches!(c, ',' | ')' | '(' | '@'))
        {
            self.bump();
        }
        self.src[start..self.pos].trim()
    }
}

/// Turns comment text into directives, creating type references through a
/// key-to-type factory (normally [`crate::types::TypeStore::get`]).
pub struct DirectiveParser<F> {
    factory: F,
}

impl<F> DirectiveParser<F>
where
    F: FnMut(&TypeKey) -> TypeId,
{
    pub fn new(factory: F) -> Self {
        Self { factory }
    }

    /// Parse every directive in `comment`. `member` is only used for diagnostics.
    pub fn try_parse(&mut self, comment: &str, member: &str) -> Vec<Directive> {
        let mut directives = Vec::new();
        let mut scanner = Scanner::new(comment);

        while scanner.seek_marker() {
            let start = scanner.pos;
            match self.directive(&mut scanner) {
                Ok(directive) => directives.push(directive),
                Err(reason) => {
                    debug!(member, reason, text = &comment[start..], "Skipping directive");
                    if scanner.pos == start {
                        scanner.bump();
                    }
                }
            }
        }

        directives
    }

    fn directive(&mut self, scanner: &mut Scanner<'_>) -> Result<Directive, &'static str> {
        if !scanner.eat('@') {
            return Err("expected '@'");
        }
        let name = scanner.ident();
        if name.is_empty() {
            return Err("missing directive name");
        }
        scanner.skip_whitespace();
        if !scanner.eat('(') {
            return Err("expected '('");
        }

        let mut args = Vec::new();
        loop {
            scanner.skip_whitespace();
            if scanner.peek() == Some('@') {
                args.push(Arg::Directive(self.directive(scanner)?));
            } else {
                args.push(Arg::Path(scanner.path().to_string()));
            }
            scanner.skip_whitespace();
            if scanner.eat(',') {
                continue;
            }
            if scanner.eat(')') {
                break;
            }
            return Err("unterminated argument list");
        }

        self.build(name, args)
    }

    fn build(&mut self, name: &str, args: Vec<Arg>) -> Result<Directive, &'static str> {
        let mut args = args.into_iter();
        let first = args.next();
        let second = args.next();
        if args.next().is_some() {
            return Err("too many arguments");
        }

        match (name, first, second) {
            ("ptr", Some(Arg::Path(path)), None) => {
                let target = self.type_ref(&path)?;
                Ok(Directive::PointsTo { path, target })
            }
            ("as", Some(Arg::Path(path)), None) => {
                let target = self.type_ref(&path)?;
                Ok(Directive::Reinterpret { path, target })
            }
            ("len", Some(Arg::Path(member)), None) if !member.is_empty() => {
                Ok(Directive::LengthFrom { member })
            }
            ("child", Some(Arg::Path(path)), Some(Arg::Directive(inner))) if !path.is_empty() => {
                Ok(Directive::TargetChild {
                    path,
                    directive: Box::new(inner),
                })
            }
            ("ptr" | "as" | "len" | "child", _, _) => Err("wrong arguments"),
            _ => Err("unknown directive"),
        }
    }

    fn type_ref(&mut self, path: &str) -> Result<TypeId, &'static str> {
        let key = TypeKey::parse(path).map_err(|_| "empty type path")?;
        Ok((self.factory)(&key.trimmed()))
    }
}
