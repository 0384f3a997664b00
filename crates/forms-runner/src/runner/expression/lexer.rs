use super::EvalError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    Dot,
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Question,
    Colon,
    Bang,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Lt,
    Le,
    Gt,
    Ge,
    LooseEq,
    StrictEq,
    LooseNe,
    StrictNe,
    And,
    Or,
}

pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, EvalError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let ch = chars[pos];
        if ch.is_whitespace() {
            pos += 1;
            continue;
        }

        let starts_fraction =
            ch == '.' && chars.get(pos + 1).is_some_and(|c| c.is_ascii_digit());
        if ch.is_ascii_digit() || starts_fraction {
            let start = pos;
            while pos < chars.len() && (chars[pos].is_ascii_digit() || chars[pos] == '.') {
                pos += 1;
            }
            let literal: String = chars[start..pos].iter().collect();
            let number = literal
                .parse::<f64>()
                .map_err(|_| syntax(source, format!("malformed number `{literal}`")))?;
            tokens.push(Token::Number(number));
            continue;
        }

        if ch.is_alphabetic() || ch == '_' || ch == '$' {
            let start = pos;
            while pos < chars.len()
                && (chars[pos].is_alphanumeric() || chars[pos] == '_' || chars[pos] == '$')
            {
                pos += 1;
            }
            tokens.push(Token::Ident(chars[start..pos].iter().collect()));
            continue;
        }

        if ch == '"' || ch == '\'' {
            let (literal, next) = read_string(source, &chars, pos)?;
            tokens.push(Token::Str(literal));
            pos = next;
            continue;
        }

        let next = chars.get(pos + 1).copied();
        let after = chars.get(pos + 2).copied();
        let (token, width) = match (ch, next, after) {
            ('=', Some('='), Some('=')) => (Token::StrictEq, 3),
            ('=', Some('='), _) => (Token::LooseEq, 2),
            ('!', Some('='), Some('=')) => (Token::StrictNe, 3),
            ('!', Some('='), _) => (Token::LooseNe, 2),
            ('<', Some('='), _) => (Token::Le, 2),
            ('>', Some('='), _) => (Token::Ge, 2),
            ('&', Some('&'), _) => (Token::And, 2),
            ('|', Some('|'), _) => (Token::Or, 2),
            ('<', _, _) => (Token::Lt, 1),
            ('>', _, _) => (Token::Gt, 1),
            ('!', _, _) => (Token::Bang, 1),
            ('+', _, _) => (Token::Plus, 1),
            ('-', _, _) => (Token::Minus, 1),
            ('*', _, _) => (Token::Star, 1),
            ('/', _, _) => (Token::Slash, 1),
            ('%', _, _) => (Token::Percent, 1),
            ('.', _, _) => (Token::Dot, 1),
            (',', _, _) => (Token::Comma, 1),
            ('(', _, _) => (Token::LParen, 1),
            (')', _, _) => (Token::RParen, 1),
            ('[', _, _) => (Token::LBracket, 1),
            (']', _, _) => (Token::RBracket, 1),
            ('?', _, _) => (Token::Question, 1),
            (':', _, _) => (Token::Colon, 1),
            (other, _, _) => {
                return Err(syntax(source, format!("unexpected character `{other}`")));
            }
        };
        tokens.push(token);
        pos += width;
    }

    Ok(tokens)
}

fn read_string(source: &str, chars: &[char], start: usize) -> Result<(String, usize), EvalError> {
    let quote = chars[start];
    let mut literal = String::new();
    let mut pos = start + 1;
    while pos < chars.len() {
        match chars[pos] {
            ch if ch == quote => return Ok((literal, pos + 1)),
            '\\' => {
                let escaped = chars
                    .get(pos + 1)
                    .ok_or_else(|| syntax(source, "unterminated string literal"))?;
                literal.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    other => *other,
                });
                pos += 2;
            }
            ch => {
                literal.push(ch);
                pos += 1;
            }
        }
    }
    Err(syntax(source, "unterminated string literal"))
}

pub(crate) fn syntax(source: &str, message: impl Into<String>) -> EvalError {
    EvalError::Syntax {
        expression: source.to_string(),
        message: message.into(),
    }
}
