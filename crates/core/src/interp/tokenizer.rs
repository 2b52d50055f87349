//! Content-stream tokenizer.
//!
//! Splits a decoded content stream into operator and operand tokens on
//! whitespace, keeping `( ... )` strings and `[ ... ]` arrays intact as
//! single operands so the interpreter can re-parse them. Token payloads
//! stay raw bytes: show strings address the font's byte-to-glyph table
//! directly and must not go through a UTF-8 conversion.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Operator,
    Operand,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub value: Vec<u8>,
    pub kind: TokenKind,
}

impl Token {
    fn classify(value: Vec<u8>) -> Self {
        let kind = if is_operator(&value) {
            TokenKind::Operator
        } else {
            TokenKind::Operand
        };
        Self { value, kind }
    }
}

/// The operators the interpreter understands. Anything else that lands in
/// operator position is reported as unknown and skipped.
pub(crate) fn is_operator(s: &[u8]) -> bool {
    matches!(
        s,
        b"q" | b"Q"
            | b"cm"
            | b"BT"
            | b"ET"
            | b"Tf"
            | b"Tr"
            | b"Ts"
            | b"Tw"
            | b"Tc"
            | b"Tz"
            | b"TL"
            | b"Tm"
            | b"Td"
            | b"TD"
            | b"T*"
            | b"'"
            | b"\""
            | b"Tj"
            | b"TJ"
            | b"Do"
            | b"w"
            | b"re"
            | b"m"
            | b"l"
            | b"h"
            | b"f"
            | b"f*"
            | b"S"
            | b"c"
            | b"sc"
            | b"scn"
            | b"SC"
            | b"SCN"
            | b"cs"
            | b"CS"
            | b"gs"
            | b"W"
            | b"n"
            | b"M"
            | b"ri"
    )
}

/// Tokenize a content stream byte-wise.
///
/// Inside a literal string a backslash escapes the next byte, so an escaped
/// `)` does not terminate the string. Arrays run to the closing `]`
/// unconditionally. A trailing token without terminating whitespace is
/// still flushed.
pub fn tokenize(content: &[u8]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current: Vec<u8> = Vec::new();
    let mut in_string = false;
    let mut in_array = false;
    let mut escape_next = false;

    for &c in content {
        if in_string {
            current.push(c);
            if escape_next {
                escape_next = false;
            } else if c == b'\\' {
                escape_next = true;
            } else if c == b')' {
                in_string = false;
                tokens.push(Token {
                    value: std::mem::take(&mut current),
                    kind: TokenKind::Operand,
                });
            }
            continue;
        }

        if in_array {
            current.push(c);
            if c == b']' {
                in_array = false;
                tokens.push(Token {
                    value: std::mem::take(&mut current),
                    kind: TokenKind::Operand,
                });
            }
            continue;
        }

        match c {
            b' ' | b'\t' | b'\r' | b'\n' => {
                if !current.is_empty() {
                    tokens.push(Token::classify(std::mem::take(&mut current)));
                }
            }
            b'(' => {
                in_string = true;
                current.push(c);
            }
            b'[' => {
                in_array = true;
                current.push(c);
            }
            _ => current.push(c),
        }
    }

    if !current.is_empty() {
        tokens.push(Token::classify(current));
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(tokens: &[Token]) -> Vec<String> {
        tokens
            .iter()
            .map(|t| String::from_utf8_lossy(&t.value).into_owned())
            .collect()
    }

    #[test]
    fn test_strings_stay_single_tokens() {
        let tokens = tokenize(b"BT (Hello World) Tj ET");
        assert_eq!(values(&tokens), ["BT", "(Hello World)", "Tj", "ET"]);
        assert_eq!(tokens[1].kind, TokenKind::Operand);
        assert_eq!(tokens[2].kind, TokenKind::Operator);
    }

    #[test]
    fn test_escaped_paren_does_not_close_string() {
        let tokens = tokenize(br"(a\)b) Tj");
        assert_eq!(tokens[0].value, br"(a\)b)");
    }

    #[test]
    fn test_array_kept_whole() {
        let tokens = tokenize(b"[(A) -120 (B)] TJ");
        assert_eq!(values(&tokens), ["[(A) -120 (B)]", "TJ"]);
    }

    #[test]
    fn test_trailing_token_flushed() {
        let tokens = tokenize(b"1 0 0 1 10 20 cm");
        assert_eq!(tokens.len(), 7);
        assert_eq!(tokens[6].value, b"cm");
        assert_eq!(tokens[6].kind, TokenKind::Operator);
    }

    #[test]
    fn test_high_bit_string_bytes_kept_raw() {
        let tokens = tokenize(b"(\xe9\x80) Tj");
        assert_eq!(tokens[0].value, b"(\xe9\x80)");
        assert_eq!(tokens[0].kind, TokenKind::Operand);
        assert_eq!(tokens[1].value, b"Tj");
    }
}
