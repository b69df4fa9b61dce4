//! Lexer for the `%{...}` template language.
//!
//! Outside a script, text is copied through and `%%` stands for a literal
//! `%`. Inside `%{ }` the lexer recognizes either a variable reference
//! (`%{user.id}`) or a function call (`%{select(user, `id`)}`).
//!
//! Function arguments come in three shapes:
//!
//! - `` `literal` ``: backtick quoted, taken verbatim
//! - `name.path`: identifier shaped, a variable reference
//! - anything else (`[a-z]{5}`): a bare literal running to the next
//!   top-level `,` or `)`, with bracket nesting respected

use super::TemplateError;

/// A lexical token of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Literal text, with `%%` already unescaped.
    Text(String),
    /// A variable reference: `%{name}`.
    VariableName(String),
    /// The name of a called function: `%{name(`.
    FuncName(String),
    /// A literal function argument.
    Arg(String),
    /// A function argument referring to a variable.
    ArgVariable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Text,
    Script,
    Args,
}

/// A hand-rolled state machine over the characters of a template.
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    state: State,
}

impl Lexer {
    pub fn new(src: &str) -> Self {
        Self {
            chars: src.chars().collect(),
            pos: 0,
            state: State::Text,
        }
    }

    /// Returns the next token, or `None` once the input is exhausted.
    pub fn next_token(&mut self) -> Result<Option<Token>, TemplateError> {
        match self.state {
            State::Text => self.lex_text(),
            State::Script => self.lex_script().map(Some),
            State::Args => self.lex_arg(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn lex_text(&mut self) -> Result<Option<Token>, TemplateError> {
        if self.pos >= self.chars.len() {
            return Ok(None);
        }

        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c != '%' {
                text.push(c);
                self.pos += 1;
                continue;
            }
            match self.peek_at(1) {
                Some('%') => {
                    text.push('%');
                    self.pos += 2;
                }
                Some('{') => {
                    self.pos += 2;
                    self.state = State::Script;
                    if text.is_empty() {
                        return self.lex_script().map(Some);
                    }
                    return Ok(Some(Token::Text(text)));
                }
                _ => return Err(TemplateError::UnrecognizedToken(self.pos)),
            }
        }
        Ok(Some(Token::Text(text)))
    }

    fn lex_script(&mut self) -> Result<Token, TemplateError> {
        self.skip_whitespace();
        if self.peek().is_none() {
            return Err(TemplateError::UnclosedScript(self.pos));
        }

        let start = self.pos;
        let name = self.read_name();
        if name.is_empty() {
            return Err(TemplateError::EmptyName(start));
        }

        self.skip_whitespace();
        match self.peek() {
            Some('}') => {
                self.pos += 1;
                self.state = State::Text;
                Ok(Token::VariableName(name))
            }
            Some('(') => {
                self.pos += 1;
                self.state = State::Args;
                Ok(Token::FuncName(name))
            }
            Some(ch) => Err(TemplateError::UnexpectedChar {
                ch,
                offset: self.pos,
            }),
            None => Err(TemplateError::UnclosedScript(self.pos)),
        }
    }

    fn lex_arg(&mut self) -> Result<Option<Token>, TemplateError> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(TemplateError::UnclosedArguments(self.pos)),
            Some(')') => {
                self.pos += 1;
                self.skip_whitespace();
                match self.peek() {
                    Some('}') => {
                        self.pos += 1;
                        self.state = State::Text;
                        self.lex_text()
                    }
                    _ => Err(TemplateError::UnclosedScript(self.pos)),
                }
            }
            Some('`') => {
                let literal = self.read_quoted()?;
                self.finish_arg()?;
                Ok(Some(Token::Arg(literal)))
            }
            Some(_) => {
                let start = self.pos;
                let name = self.read_name();
                self.skip_whitespace();
                if !name.is_empty() && matches!(self.peek(), Some(',') | Some(')')) {
                    self.finish_arg()?;
                    return Ok(Some(Token::ArgVariable(name)));
                }

                self.pos = start;
                let literal = self.read_bare()?;
                if literal.is_empty() {
                    return Err(TemplateError::EmptyName(start));
                }
                self.finish_arg()?;
                Ok(Some(Token::Arg(literal)))
            }
        }
    }

    /// Consumes the separator after an argument. A closing `)` is left in
    /// place for the next call to [`Lexer::lex_arg`].
    fn finish_arg(&mut self) -> Result<(), TemplateError> {
        self.skip_whitespace();
        match self.peek() {
            Some(',') => {
                self.pos += 1;
                Ok(())
            }
            Some(')') => Ok(()),
            Some(ch) => Err(TemplateError::UnexpectedChar {
                ch,
                offset: self.pos,
            }),
            None => Err(TemplateError::UnclosedArguments(self.pos)),
        }
    }

    fn read_name(&mut self) -> String {
        let mut name = String::new();
        if let Some(c) = self.peek() {
            if !(c.is_alphabetic() || c == '_') {
                return name;
            }
        }
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || matches!(c, '_' | '.' | '[' | ']' | '#') {
                name.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        name
    }

    fn read_quoted(&mut self) -> Result<String, TemplateError> {
        let open = self.pos;
        self.pos += 1;
        let mut literal = String::new();
        while let Some(c) = self.peek() {
            self.pos += 1;
            if c == '`' {
                return Ok(literal);
            }
            literal.push(c);
        }
        Err(TemplateError::UnclosedQuote(open))
    }

    fn read_bare(&mut self) -> Result<String, TemplateError> {
        let mut literal = String::new();
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            match c {
                ',' | ')' if depth == 0 => return Ok(literal.trim_end().to_string()),
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth = depth.saturating_sub(1),
                _ => {}
            }
            literal.push(c);
            self.pos += 1;
        }
        Err(TemplateError::UnclosedArguments(self.pos))
    }
}

/// Splits a template into tokens.
pub fn tokenize(src: &str) -> Result<Vec<Token>, TemplateError> {
    let mut lexer = Lexer::new(src);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Token {
        Token::Text(s.to_string())
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(tokenize("hello world").unwrap(), vec![text("hello world")]);
        assert!(tokenize("").unwrap().is_empty());
    }

    #[test]
    fn test_escaped_percent() {
        assert_eq!(tokenize("100%% sure").unwrap(), vec![text("100% sure")]);
        assert_eq!(tokenize("%%%%").unwrap(), vec![text("%%")]);
    }

    #[test]
    fn test_variable_reference() {
        assert_eq!(
            tokenize("id=%{ user.id }!").unwrap(),
            vec![
                text("id="),
                Token::VariableName("user.id".to_string()),
                text("!")
            ]
        );
    }

    #[test]
    fn test_function_call_arguments() {
        assert_eq!(
            tokenize("%{select(user, `a,b`)}").unwrap(),
            vec![
                Token::FuncName("select".to_string()),
                Token::ArgVariable("user".to_string()),
                Token::Arg("a,b".to_string()),
            ]
        );
    }

    #[test]
    fn test_bare_literal_argument_with_brackets() {
        assert_eq!(
            tokenize("%{random([a-z]{5})}x").unwrap(),
            vec![
                Token::FuncName("random".to_string()),
                Token::Arg("[a-z]{5}".to_string()),
                text("x"),
            ]
        );
    }

    #[test]
    fn test_identifier_followed_by_symbols_is_literal() {
        assert_eq!(
            tokenize("%{random(a+, 3)}").unwrap(),
            vec![
                Token::FuncName("random".to_string()),
                Token::Arg("a+".to_string()),
                Token::Arg("3".to_string()),
            ]
        );
    }

    #[test]
    fn test_call_without_arguments() {
        assert_eq!(
            tokenize("%{uuid()}").unwrap(),
            vec![Token::FuncName("uuid".to_string())]
        );
    }

    #[test]
    fn test_adjacent_scripts() {
        assert_eq!(
            tokenize("%{a}%{b}").unwrap(),
            vec![
                Token::VariableName("a".to_string()),
                Token::VariableName("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_errors() {
        assert_eq!(tokenize("%{name"), Err(TemplateError::UnclosedScript(6)));
        assert_eq!(tokenize("50% off"), Err(TemplateError::UnrecognizedToken(2)));
        assert_eq!(tokenize("trailing %"), Err(TemplateError::UnrecognizedToken(9)));
        assert_eq!(tokenize("%{}"), Err(TemplateError::EmptyName(2)));
        assert_eq!(
            tokenize("%{len(items"),
            Err(TemplateError::UnclosedArguments(11))
        );
        assert_eq!(tokenize("%{f(`abc)}"), Err(TemplateError::UnclosedQuote(4)));
        assert_eq!(tokenize("%{f(a) x"), Err(TemplateError::UnclosedScript(7)));
        assert!(matches!(
            tokenize("%{a b}"),
            Err(TemplateError::UnexpectedChar { ch: 'b', .. })
        ));
    }
}
