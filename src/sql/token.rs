//! SQL Tokens - the atomic units of SQL output.
//!
//! Tokens are dialect-agnostic representations that serialize
//! to dialect-specific strings.

use super::dialect::{Dialect, SqlDialect};
use super::expr::Literal;

/// SQL Token - every element a compiled formatter query can contain.
///
/// Adding a new variant here will cause compile errors everywhere
/// it needs to be handled (exhaustive matching).
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // === Keywords ===
    Select,
    From,
    Where,
    And,
    Or,
    As,
    On,
    LeftJoin,
    OrderBy,
    Asc,
    Limit,
    Offset,
    Fetch,
    Next,
    Rows,
    Only,
    Case,
    When,
    Then,
    Else,
    End,
    In,
    Null,
    Cast,
    Separator,
    WithinGroup,

    // === Punctuation ===
    Comma,
    Dot,
    LParen,
    RParen,

    // === Operators ===
    Eq,
    Ne,
    Plus,
    Concat,

    // === Whitespace / Formatting ===
    Space,
    Newline,
    Indent(usize),

    // === Dynamic Content ===
    /// Identifier (table, column, alias)
    Ident(String),
    /// Integer literal
    LitInt(i64),
    /// String literal
    LitString(String),

    /// Bound parameter. The value travels next to the SQL text and only a
    /// placeholder is written into it; see [`TokenStream::render`].
    Param(Literal),

    /// Function name, emitted upper-case.
    FunctionName(String),

    /// Dialect type name in a `CAST`, produced by
    /// [`SqlDialect::emit_data_type`]. Never built from user input.
    TypeName(String),
}

impl Token {
    /// Serialize this token to a string for the given dialect.
    ///
    /// A lone `Param` serializes as the first placeholder of the dialect;
    /// streams number their placeholders through [`TokenStream::render`].
    pub fn serialize(&self, dialect: Dialect) -> String {
        match self {
            Token::Select => "SELECT".into(),
            Token::From => "FROM".into(),
            Token::Where => "WHERE".into(),
            Token::And => "AND".into(),
            Token::Or => "OR".into(),
            Token::As => "AS".into(),
            Token::On => "ON".into(),
            Token::LeftJoin => "LEFT JOIN".into(),
            Token::OrderBy => "ORDER BY".into(),
            Token::Asc => "ASC".into(),
            Token::Limit => "LIMIT".into(),
            Token::Offset => "OFFSET".into(),
            Token::Fetch => "FETCH".into(),
            Token::Next => "NEXT".into(),
            Token::Rows => "ROWS".into(),
            Token::Only => "ONLY".into(),
            Token::Case => "CASE".into(),
            Token::When => "WHEN".into(),
            Token::Then => "THEN".into(),
            Token::Else => "ELSE".into(),
            Token::End => "END".into(),
            Token::In => "IN".into(),
            Token::Null => "NULL".into(),
            Token::Cast => "CAST".into(),
            Token::Separator => "SEPARATOR".into(),
            Token::WithinGroup => "WITHIN GROUP".into(),

            Token::Comma => ",".into(),
            Token::Dot => ".".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),

            Token::Eq => "=".into(),
            Token::Ne => "<>".into(),
            Token::Plus => "+".into(),
            Token::Concat => dialect.concat_operator().into(),

            Token::Space => " ".into(),
            Token::Newline => "\n".into(),
            Token::Indent(n) => "  ".repeat(*n),

            Token::Ident(name) => dialect.quote_identifier(name),
            Token::LitInt(n) => n.to_string(),
            Token::LitString(s) => dialect.quote_string(s),

            Token::Param(_) => dialect.placeholder(1),

            Token::FunctionName(name) => name.to_uppercase(),
            Token::TypeName(name) => name.clone(),
        }
    }
}

/// SQL text together with the values bound to its placeholders, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedSql {
    pub sql: String,
    pub params: Vec<Literal>,
}

/// A stream of tokens that can be serialized to SQL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    pub fn new() -> Self {
        Self { tokens: vec![] }
    }

    pub fn push(&mut self, token: Token) -> &mut Self {
        self.tokens.push(token);
        self
    }

    /// Append another token stream.
    pub fn append(&mut self, other: &TokenStream) -> &mut Self {
        self.tokens.extend(other.tokens.iter().cloned());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Serialize all tokens to SQL text, discarding parameter values.
    pub fn serialize(&self, dialect: Dialect) -> String {
        self.render(dialect).sql
    }

    /// Serialize to SQL text and collect bound parameters.
    ///
    /// Placeholders are numbered left to right, which is also the order of
    /// the returned parameter values. A stream holding the same parameter
    /// twice binds it twice.
    pub fn render(&self, dialect: Dialect) -> RenderedSql {
        let mut out = RenderedSql::default();
        for token in &self.tokens {
            match token {
                Token::Param(value) => {
                    out.params.push(value.clone());
                    out.sql.push_str(&dialect.placeholder(out.params.len()));
                }
                other => out.sql.push_str(&other.serialize(dialect)),
            }
        }
        out
    }

    pub fn space(&mut self) -> &mut Self {
        self.push(Token::Space)
    }
    pub fn newline(&mut self) -> &mut Self {
        self.push(Token::Newline)
    }
    pub fn indent(&mut self, n: usize) -> &mut Self {
        self.push(Token::Indent(n))
    }
    pub fn comma(&mut self) -> &mut Self {
        self.push(Token::Comma)
    }
    pub fn lparen(&mut self) -> &mut Self {
        self.push(Token::LParen)
    }
    pub fn rparen(&mut self) -> &mut Self {
        self.push(Token::RParen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ident_quoting() {
        let tok = Token::Ident("agent".into());
        assert_eq!(tok.serialize(Dialect::Sqlite), "\"agent\"");
        assert_eq!(tok.serialize(Dialect::TSql), "[agent]");
        assert_eq!(tok.serialize(Dialect::MySql), "`agent`");
    }

    #[test]
    fn test_function_name_upper_case() {
        assert_eq!(
            Token::FunctionName("group_concat".into()).serialize(Dialect::Sqlite),
            "GROUP_CONCAT"
        );
    }

    #[test]
    fn test_params_are_numbered_per_dialect() {
        let mut ts = TokenStream::new();
        ts.push(Token::Param(Literal::String("; ".into())))
            .comma()
            .push(Token::Param(Literal::Int(3)));

        let pg = ts.render(Dialect::Postgres);
        assert_eq!(pg.sql, "$1,$2");
        assert_eq!(
            pg.params,
            vec![Literal::String("; ".into()), Literal::Int(3)]
        );

        assert_eq!(ts.render(Dialect::MySql).sql, "?,?");
        assert_eq!(ts.render(Dialect::TSql).sql, "@P1,@P2");
    }

    #[test]
    fn test_concat_operator_per_dialect() {
        assert_eq!(Token::Concat.serialize(Dialect::Sqlite), "||");
        assert_eq!(Token::Concat.serialize(Dialect::TSql), "+");
    }
}
