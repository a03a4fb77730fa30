//! ASDF / AFFN ordinate decoding.
//!
//! Each data line starts with an abscissa followed by ordinates written
//! either as plain numbers (AFFN) or in compressed form:
//!
//! | form | characters | meaning |
//! |------|------------|---------|
//! | SQZ  | `@ A-I a-i` | new value, leading digit 0, 1..9, -1..-9 |
//! | DIF  | `% J-R j-r` | difference from the previous ordinate |
//! | DUP  | `S-Z s`     | repeat count of the previous token (1..9) |
//!
//! A line that ends in DIF form repeats its last ordinate as the first
//! ordinate of the next line (the Y check); the duplicate is dropped.

use crate::document::JcampError;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Abs(f64),
    Dif(f64),
    Dup(usize),
}

fn is_number_char(c: char) -> bool {
    c.is_ascii_digit() || c == '.'
}

fn parse_error(line: usize, message: impl Into<String>) -> JcampError {
    JcampError::Parse {
        line,
        message: message.into(),
    }
}

/// Lead digit and sign of a compressed character, or `None`.
fn sqz_digit(c: char) -> Option<i32> {
    match c {
        '@' => Some(0),
        'A'..='I' => Some(c as i32 - 'A' as i32 + 1),
        'a'..='i' => Some(-(c as i32 - 'a' as i32 + 1)),
        _ => None,
    }
}

fn dif_digit(c: char) -> Option<i32> {
    match c {
        '%' => Some(0),
        'J'..='R' => Some(c as i32 - 'J' as i32 + 1),
        'j'..='r' => Some(-(c as i32 - 'j' as i32 + 1)),
        _ => None,
    }
}

fn dup_digit(c: char) -> Option<usize> {
    match c {
        'S'..='Z' => Some(c as usize - 'S' as usize + 1),
        's' => Some(9),
        _ => None,
    }
}

fn compressed_value(lead: i32, rest: &str, line: usize) -> Result<f64, JcampError> {
    let text = if lead < 0 {
        format!("-{}{}", -lead, rest)
    } else {
        format!("{}{}", lead, rest)
    };
    text.parse::<f64>()
        .map_err(|_| parse_error(line, format!("bad compressed value '{}'", text)))
}

fn tokenize(text: &str, line: usize) -> Result<Vec<Token>, JcampError> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() || c == ',' || c == ';' || c == '?' {
            i += 1;
            continue;
        }
        let start = i;
        i += 1;
        if c.is_ascii_digit() || c == '.' || c == '+' || c == '-' {
            while i < chars.len() {
                let d = chars[i];
                let exponent = (d == 'E' || d == 'e')
                    && matches!(chars.get(i + 1), Some('+') | Some('-'));
                if is_number_char(d) {
                    i += 1;
                } else if exponent {
                    i += 2;
                } else {
                    break;
                }
            }
            let word: String = chars[start..i].iter().collect();
            let v = word
                .parse::<f64>()
                .map_err(|_| parse_error(line, format!("bad number '{}'", word)))?;
            tokens.push(Token::Abs(v));
            continue;
        }

        while i < chars.len() && is_number_char(chars[i]) {
            i += 1;
        }
        let rest: String = chars[start + 1..i].iter().collect();
        if let Some(lead) = sqz_digit(c) {
            tokens.push(Token::Abs(compressed_value(lead, &rest, line)?));
        } else if let Some(lead) = dif_digit(c) {
            tokens.push(Token::Dif(compressed_value(lead, &rest, line)?));
        } else if let Some(lead) = dup_digit(c) {
            let count = format!("{}{}", lead, rest)
                .parse::<usize>()
                .map_err(|_| parse_error(line, format!("bad DUP count '{}{}'", c, rest)))?;
            tokens.push(Token::Dup(count));
        } else {
            return Err(parse_error(line, format!("unexpected character '{}'", c)));
        }
    }
    Ok(tokens)
}

/// Decode the ordinates of a block of data lines.
///
/// `first_line` is only used to number errors.
pub fn decode_ordinates<'a>(
    lines: impl IntoIterator<Item = &'a str>,
    first_line: usize,
) -> Result<Vec<f64>, JcampError> {
    let mut out: Vec<f64> = Vec::new();
    let mut prev_ends_dif = false;

    for (n, text) in lines.into_iter().enumerate() {
        let line = first_line + n;
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        let tokens = tokenize(text, line)?;
        let mut ys: Vec<f64> = Vec::new();
        let mut last: Option<Token> = None;
        let mut ends_dif = false;

        // The leading token is the abscissa.
        for tok in tokens.into_iter().skip(1) {
            match tok {
                Token::Abs(v) => {
                    ys.push(v);
                    last = Some(tok);
                    ends_dif = false;
                }
                Token::Dif(d) => {
                    let base = ys
                        .last()
                        .or(out.last())
                        .copied()
                        .ok_or_else(|| parse_error(line, "DIF without a preceding value"))?;
                    ys.push(base + d);
                    last = Some(tok);
                    ends_dif = true;
                }
                Token::Dup(count) => {
                    let repeat = count.saturating_sub(1);
                    match last {
                        Some(Token::Abs(v)) => ys.extend(std::iter::repeat(v).take(repeat)),
                        Some(Token::Dif(d)) => {
                            for _ in 0..repeat {
                                let base = ys.last().copied().unwrap_or_default();
                                ys.push(base + d);
                            }
                        }
                        _ => return Err(parse_error(line, "DUP without a preceding value")),
                    }
                }
            }
        }

        if prev_ends_dif && !ys.is_empty() {
            if let Some(&prev) = out.last() {
                let check = ys.remove(0);
                if (check - prev).abs() > 1e-6 * prev.abs().max(1.0) {
                    log::warn!(
                        "Y check failed at line {}: expected {}, found {}",
                        line,
                        prev,
                        check
                    );
                }
            }
        }
        prev_ends_dif = ends_dif;
        out.extend(ys);
    }
    Ok(out)
}
