use std::str::CharIndices;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // single character
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Dot,
    Minus,
    Plus,
    Semicolon,
    Slash,
    Star,

    // operators
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,

    // literals
    Identifier,
    String,
    Number,

    // keywords
    And,
    Class,
    Else,
    False,
    Fun,
    For,
    If,
    Nil,
    Or,
    Print,
    Return,
    Super,
    This,
    True,
    Var,
    While,

    // lexeme holds the message
    Error,
    Eof,
}

/// A lexeme borrowed from the source text. Error tokens carry their message
/// in `lexeme` instead.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub lexeme: &'a str,
    pub line: u32,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, lexeme: &'a str, line: u32) -> Self {
        Token { kind, lexeme, line }
    }
}

const KEYWORDS: [(&str, TokenKind); 16] = [
    ("and", TokenKind::And),
    ("class", TokenKind::Class),
    ("else", TokenKind::Else),
    ("false", TokenKind::False),
    ("for", TokenKind::For),
    ("fun", TokenKind::Fun),
    ("if", TokenKind::If),
    ("nil", TokenKind::Nil),
    ("or", TokenKind::Or),
    ("print", TokenKind::Print),
    ("return", TokenKind::Return),
    ("super", TokenKind::Super),
    ("this", TokenKind::This),
    ("true", TokenKind::True),
    ("var", TokenKind::Var),
    ("while", TokenKind::While),
];

pub struct Scanner<'a> {
    text: &'a str,
    iter: CharIndices<'a>,
    line: u32,
    keywords: trie::Trie<TokenKind>,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut keywords = trie::Trie::new();
        for (k, v) in KEYWORDS {
            keywords.insert(k, v);
        }
        Scanner {
            text,
            iter: text.char_indices(),
            line: 1,
            keywords,
        }
    }

    // consumes next char and returns it
    fn advance(&mut self) -> Option<char> {
        self.iter.next().map(|(_, c)| c)
    }

    // peeks nth char without consuming it.
    // count starts from 0 -- 0 peeks current char
    fn peek_nth(&self, n: usize) -> Option<char> {
        self.iter.clone().nth(n).map(|(_, c)| c)
    }

    fn peek(&self) -> Option<char> {
        self.peek_nth(0)
    }

    // advance if next char matches with a given char c
    fn advance_if(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn get_lexeme(&self) -> &'a str {
        match self.iter.clone().next() {
            Some((index, _)) => &self.text[..index],
            None => self.text,
        }
    }

    fn make_token(&self, kind: TokenKind) -> Token<'a> {
        Token::new(kind, self.get_lexeme(), self.line)
    }

    fn error_token(&self, message: &'static str) -> Token<'a> {
        Token::new(TokenKind::Error, message, self.line)
    }

    // eat chars till newline '\n' or eof is hit
    fn eat_comment(&mut self) {
        while let Some(nc) = self.peek() {
            if nc == '\n' {
                return;
            }
            self.advance();
        }
    }

    fn eat_whitespace(&mut self) {
        while let Some(nc) = self.peek() {
            match nc {
                ' ' | '\r' | '\t' => {
                    self.advance();
                }
                '\n' => {
                    self.line += 1;
                    self.advance();
                }
                '/' if self.peek_nth(1) == Some('/') => self.eat_comment(),
                _ => return,
            }
        }
    }

    fn string_literal(&mut self) -> Token<'a> {
        while let Some(c) = self.advance() {
            match c {
                '"' => return self.make_token(TokenKind::String),
                '\n' => self.line += 1,
                _ => {}
            }
        }
        self.error_token("Unterminated string.")
    }

    fn number_literal(&mut self) -> Token<'a> {
        while let Some('0'..='9') = self.peek() {
            self.advance();
        }

        if self.peek() == Some('.') {
            if let Some('0'..='9') = self.peek_nth(1) {
                self.advance();
                while let Some('0'..='9') = self.peek() {
                    self.advance();
                }
            }
        }

        self.make_token(TokenKind::Number)
    }

    fn identifier(&mut self) -> Token<'a> {
        while let Some('a'..='z' | 'A'..='Z' | '0'..='9' | '_') = self.peek() {
            self.advance();
        }

        let lexeme = self.get_lexeme();
        let kind = self
            .keywords
            .get(lexeme)
            .copied()
            .unwrap_or(TokenKind::Identifier);
        Token::new(kind, lexeme, self.line)
    }

    /// Produces the next token. Once the input is exhausted every call
    /// returns an `Eof` token.
    pub fn scan_token(&mut self) -> Token<'a> {
        self.eat_whitespace();

        self.text = self.iter.as_str();
        self.iter = self.text.char_indices();
        let curr_char = match self.advance() {
            Some(c) => c,
            None => return Token::new(TokenKind::Eof, "", self.line),
        };

        match curr_char {
            '(' => self.make_token(TokenKind::LeftParen),
            ')' => self.make_token(TokenKind::RightParen),
            '{' => self.make_token(TokenKind::LeftBrace),
            '}' => self.make_token(TokenKind::RightBrace),
            ',' => self.make_token(TokenKind::Comma),
            '.' => self.make_token(TokenKind::Dot),
            '-' => self.make_token(TokenKind::Minus),
            '+' => self.make_token(TokenKind::Plus),
            ';' => self.make_token(TokenKind::Semicolon),
            '*' => self.make_token(TokenKind::Star),
            '/' => self.make_token(TokenKind::Slash),

            '!' => {
                let kind = if self.advance_if('=') {
                    TokenKind::BangEqual
                } else {
                    TokenKind::Bang
                };
                self.make_token(kind)
            }
            '=' => {
                let kind = if self.advance_if('=') {
                    TokenKind::EqualEqual
                } else {
                    TokenKind::Equal
                };
                self.make_token(kind)
            }
            '>' => {
                let kind = if self.advance_if('=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                };
                self.make_token(kind)
            }
            '<' => {
                let kind = if self.advance_if('=') {
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                };
                self.make_token(kind)
            }

            '"' => self.string_literal(),
            '0'..='9' => self.number_literal(),
            'a'..='z' | 'A'..='Z' | '_' => self.identifier(),

            _ => self.error_token("Unexpected character."),
        }
    }
}

// Yields every token before `Eof`.
impl<'a> Iterator for Scanner<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let tok = self.scan_token();
        if tok.kind == TokenKind::Eof {
            None
        } else {
            Some(tok)
        }
    }
}

mod trie {
    use fnv::FnvHashMap;

    struct TrieNode<V> {
        value: Option<V>,
        edges: FnvHashMap<char, TrieNode<V>>,
    }

    impl<V> TrieNode<V> {
        fn new(value: Option<V>) -> Self {
            TrieNode {
                edges: FnvHashMap::default(),
                value,
            }
        }
    }

    pub struct Trie<V> {
        root: TrieNode<V>,
    }

    impl<V> Trie<V> {
        pub fn new() -> Self {
            Trie {
                root: TrieNode::new(None),
            }
        }

        pub fn get(&self, key: &str) -> Option<&V> {
            let mut node = &self.root;
            for c in key.chars() {
                node = node.edges.get(&c)?;
            }
            node.value.as_ref()
        }

        pub fn insert(&mut self, key: &str, val: V) {
            let mut node = &mut self.root;
            for c in key.chars() {
                node = node.edges.entry(c).or_insert_with(|| TrieNode::new(None));
            }
            node.value = Some(val);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Scanner::new(source).map(|tok| tok.kind).collect()
    }

    #[test]
    fn operators_and_punctuation() {
        assert_eq!(
            kinds("(){};,.-+/* ! != = == > >= < <="),
            vec![
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::Semicolon,
                TokenKind::Comma,
                TokenKind::Dot,
                TokenKind::Minus,
                TokenKind::Plus,
                TokenKind::Slash,
                TokenKind::Star,
                TokenKind::Bang,
                TokenKind::BangEqual,
                TokenKind::Equal,
                TokenKind::EqualEqual,
                TokenKind::Greater,
                TokenKind::GreaterEqual,
                TokenKind::Less,
                TokenKind::LessEqual,
            ]
        );
    }

    #[test]
    fn keywords_versus_identifiers() {
        assert_eq!(
            kinds("var variable print printer nil _nil"),
            vec![
                TokenKind::Var,
                TokenKind::Identifier,
                TokenKind::Print,
                TokenKind::Identifier,
                TokenKind::Nil,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn literals_keep_their_lexemes() {
        let toks: Vec<_> = Scanner::new("12.5 \"hi there\" 3.").collect();
        assert_eq!(toks[0], Token::new(TokenKind::Number, "12.5", 1));
        assert_eq!(toks[1], Token::new(TokenKind::String, "\"hi there\"", 1));
        assert_eq!(toks[2], Token::new(TokenKind::Number, "3", 1));
        assert_eq!(toks[3].kind, TokenKind::Dot);
    }

    #[test]
    fn tracks_lines_and_skips_comments() {
        let mut scanner = Scanner::new("a // comment\n\"multi\nline\" b\n");
        assert_eq!(scanner.scan_token().line, 1);
        let s = scanner.scan_token();
        assert_eq!((s.kind, s.line), (TokenKind::String, 3));
        assert_eq!(scanner.scan_token().line, 3);
        let eof = scanner.scan_token();
        assert_eq!((eof.kind, eof.line), (TokenKind::Eof, 4));
        assert_eq!(scanner.scan_token().kind, TokenKind::Eof);
    }

    #[test]
    fn errors_are_tokens() {
        let toks: Vec<_> = Scanner::new("@ \"open").collect();
        assert_eq!(toks[0], Token::new(TokenKind::Error, "Unexpected character.", 1));
        assert_eq!(toks[1], Token::new(TokenKind::Error, "Unterminated string.", 1));
    }
}
