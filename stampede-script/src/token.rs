//! Lexical tokens.

/// One lexical token. Newlines are tokens of their own because they
/// terminate statements.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals.
    Number(f64),
    Str(String),
    Identifier(String),

    // Punctuation and operators.
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Dot,
    Colon,
    Pipe,
    Arrow,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    PlusEqual,
    MinusEqual,
    StarEqual,
    SlashEqual,
    Equal,
    EqualEqual,
    BangEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Newline,

    // Keywords.
    Out,
    When,
    Other,
    Repeat,
    To,
    While,
    Get,
    In,
    Task,
    Give,
    Escape,
    Skip,
    Use,
    Model,
    Init,
    SelfKw,
    Hidden,
    Shown,
    Extends,
    Struct,
    Try,
    Catch,
    Throw,
    And,
    Or,
    Not,
    True,
    False,
    Nil,

    Eof,
}

impl TokenKind {
    /// Keyword lookup for an identifier-shaped lexeme.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "out" => TokenKind::Out,
            "when" => TokenKind::When,
            "other" => TokenKind::Other,
            "repeat" => TokenKind::Repeat,
            "to" => TokenKind::To,
            "while" => TokenKind::While,
            "get" => TokenKind::Get,
            "in" => TokenKind::In,
            "task" => TokenKind::Task,
            "give" => TokenKind::Give,
            "escape" => TokenKind::Escape,
            "skip" => TokenKind::Skip,
            "use" => TokenKind::Use,
            "model" => TokenKind::Model,
            "init" => TokenKind::Init,
            "self" => TokenKind::SelfKw,
            "hidden" => TokenKind::Hidden,
            "shown" => TokenKind::Shown,
            "extends" => TokenKind::Extends,
            "struct" => TokenKind::Struct,
            "try" => TokenKind::Try,
            "catch" => TokenKind::Catch,
            "throw" => TokenKind::Throw,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "nil" => TokenKind::Nil,
            _ => return None,
        };
        Some(kind)
    }

    /// The lexeme for property access after `.`, where keywords are legal
    /// member names (`dict.get`, `point.init`).
    pub fn word(&self) -> Option<&str> {
        let word = match self {
            TokenKind::Identifier(name) => name.as_str(),
            TokenKind::Out => "out",
            TokenKind::When => "when",
            TokenKind::Other => "other",
            TokenKind::Repeat => "repeat",
            TokenKind::To => "to",
            TokenKind::While => "while",
            TokenKind::Get => "get",
            TokenKind::In => "in",
            TokenKind::Task => "task",
            TokenKind::Give => "give",
            TokenKind::Escape => "escape",
            TokenKind::Skip => "skip",
            TokenKind::Use => "use",
            TokenKind::Model => "model",
            TokenKind::Init => "init",
            TokenKind::SelfKw => "self",
            TokenKind::Hidden => "hidden",
            TokenKind::Shown => "shown",
            TokenKind::Extends => "extends",
            TokenKind::Struct => "struct",
            TokenKind::Try => "try",
            TokenKind::Catch => "catch",
            TokenKind::Throw => "throw",
            TokenKind::And => "and",
            TokenKind::Or => "or",
            TokenKind::Not => "not",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Nil => "nil",
            _ => return None,
        };
        Some(word)
    }
}
