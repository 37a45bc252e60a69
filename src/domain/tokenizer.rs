//! Free-text tokenizer.
//!
//! Single forward scan producing word and number tokens. Words start with a
//! letter and continue through letters, digits and underscores ("SMA_20",
//! "rsi14"). Numbers are integers or decimals with an optional leading minus,
//! thousands separators and a trailing `%`, which are dropped. Everything
//! else separates tokens.

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Word,
    Number(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Original spelling.
    pub text: String,
    /// Lower-cased spelling, used for every comparison.
    pub lower: String,
    pub kind: TokenKind,
    /// Byte offset in the input.
    pub position: usize,
}

impl Token {
    pub fn is_word(&self) -> bool {
        matches!(self.kind, TokenKind::Word)
    }

    pub fn number(&self) -> Option<f64> {
        match self.kind {
            TokenKind::Number(n) => Some(n),
            TokenKind::Word => None,
        }
    }
}

struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.remaining().chars().nth(1)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn previous(&self) -> Option<char> {
        self.input[..self.pos].chars().next_back()
    }

    fn starts_number(&self) -> bool {
        match self.peek() {
            Some(ch) if ch.is_ascii_digit() => true,
            Some('-') => {
                self.peek_second().is_some_and(|c| c.is_ascii_digit())
                    && self.previous().is_none_or(char::is_whitespace)
            }
            _ => false,
        }
    }

    fn scan_word(&mut self) -> Token {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }
        let text = &self.input[start..self.pos];
        Token {
            text: text.to_string(),
            lower: text.to_lowercase(),
            kind: TokenKind::Word,
            position: start,
        }
    }

    fn scan_number(&mut self) -> Option<Token> {
        let start = self.pos;
        let mut digits = String::new();
        let mut has_dot = false;

        if self.peek() == Some('-') {
            self.advance();
            digits.push('-');
        }

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                digits.push(ch);
                self.advance();
            } else if ch == '.'
                && !has_dot
                && self.peek_second().is_some_and(|c| c.is_ascii_digit())
            {
                has_dot = true;
                digits.push(ch);
                self.advance();
            } else if ch == ',' && !has_dot && self.thousands_group_follows() {
                self.advance();
            } else {
                break;
            }
        }

        let text = self.input[start..self.pos].to_string();
        if self.peek() == Some('%') {
            self.advance();
        }

        let value = digits.parse::<f64>().ok()?;
        Some(Token {
            lower: text.clone(),
            text,
            kind: TokenKind::Number(value),
            position: start,
        })
    }

    /// True when the cursor sits on `,` followed by exactly three digits.
    fn thousands_group_follows(&self) -> bool {
        let rest = &self.remaining()[1..];
        let group: Vec<char> = rest.chars().take(4).collect();
        group.len() >= 3
            && group[..3].iter().all(|c| c.is_ascii_digit())
            && group.get(3).is_none_or(|c| !c.is_ascii_digit())
    }

    fn scan(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(ch) = self.peek() {
            if self.starts_number() {
                if let Some(token) = self.scan_number() {
                    tokens.push(token);
                }
            } else if ch.is_alphabetic() {
                tokens.push(self.scan_word());
            } else {
                self.advance();
            }
        }
        tokens
    }
}

pub fn tokenize(input: &str) -> Vec<Token> {
    Scanner::new(input).scan()
}

/// Tokenized query text with the lookups the classification rules need.
#[derive(Debug, Clone)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    pub fn new(input: &str) -> Self {
        Self {
            tokens: tokenize(input),
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// Lower-cased word at `index`, `None` for numbers or out of range.
    pub fn word(&self, index: usize) -> Option<&str> {
        self.tokens
            .get(index)
            .filter(|t| t.is_word())
            .map(|t| t.lower.as_str())
    }

    pub fn number(&self, index: usize) -> Option<f64> {
        self.tokens.get(index).and_then(Token::number)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.position_of(word).is_some()
    }

    pub fn position_of(&self, word: &str) -> Option<usize> {
        self.tokens
            .iter()
            .position(|t| t.is_word() && t.lower == word)
    }

    /// Earliest token matching any of `words`, with the word it matched.
    pub fn find_any<'w>(&self, words: &[&'w str]) -> Option<(usize, &'w str)> {
        self.tokens.iter().enumerate().find_map(|(i, t)| {
            if !t.is_word() {
                return None;
            }
            words.iter().find(|w| **w == t.lower).map(|w| (i, *w))
        })
    }

    /// Start index of a whitespace-separated phrase, matched token by token.
    pub fn find_phrase(&self, phrase: &str) -> Option<usize> {
        (0..self.tokens.len()).find(|&start| self.phrase_at(start, phrase))
    }

    /// True when `phrase` matches token by token starting at `start`.
    pub fn phrase_at(&self, start: usize, phrase: &str) -> bool {
        let mut parts = phrase.split_whitespace().peekable();
        if parts.peek().is_none() {
            return false;
        }
        parts.enumerate().all(|(offset, part)| {
            self.tokens
                .get(start + offset)
                .is_some_and(|t| t.lower == part)
        })
    }

    /// First number within `max_gap` tokens after `index`.
    pub fn number_after(&self, index: usize, max_gap: usize) -> Option<f64> {
        self.tokens
            .iter()
            .skip(index + 1)
            .take(max_gap)
            .find_map(Token::number)
    }

    /// Positive integer immediately before `index`.
    pub fn integer_before(&self, index: usize) -> Option<u32> {
        let n = self.number(index.checked_sub(1)?)?;
        as_positive_integer(n)
    }

    /// Positive integer immediately after `index`.
    pub fn integer_after(&self, index: usize) -> Option<u32> {
        let n = self.number(index + 1)?;
        as_positive_integer(n)
    }
}

fn as_positive_integer(n: f64) -> Option<u32> {
    if n >= 1.0 && n.fract() == 0.0 && n <= u32::MAX as f64 {
        Some(n as u32)
    } else {
        None
    }
}
