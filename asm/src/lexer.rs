use crate::error::{ErrorKind, Errors};
use crate::token::{Token, TokenKind};
use arch::inst::{self, Directive};
use arch::reg::Reg;

pub const SPECIAL_CHARS: [char; 6] = [',', '.', ':', '&', '#', '"'];

fn is_special_char(ch: char) -> bool {
    SPECIAL_CHARS.contains(&ch)
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// ----------------------------------------------------------------------------
// Phase 1: split and classify by lexeme

fn classify(lexeme: &str) -> TokenKind {
    if lexeme.len() == 1 {
        match lexeme.chars().next().unwrap() {
            ',' => return TokenKind::Comma,
            '.' => return TokenKind::Dot,
            ':' => return TokenKind::Colon,
            '&' => return TokenKind::Amper,
            '#' => return TokenKind::Hash,
            '"' => return TokenKind::Quote,
            _ => {}
        }
    }
    if inst::is_instruction(lexeme) {
        TokenKind::Instruction
    } else if Reg::parse(lexeme).is_ok() {
        TokenKind::Register
    } else if let Some(dir) = Directive::parse(lexeme) {
        match dir {
            Directive::Data => TokenKind::DirData,
            Directive::String => TokenKind::DirString,
            Directive::Entry => TokenKind::DirEntry,
            Directive::Extern => TokenKind::DirExtern,
        }
    } else if is_identifier(lexeme) {
        TokenKind::Identifier
    } else {
        TokenKind::Unknown
    }
}

/// Split one line at whitespace and the six punctuators; every punctuator
/// is its own token.
pub fn tokenize_line(line: &str, line_no: usize) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let bytes = line.char_indices().collect::<Vec<_>>();
    let mut i = 0;

    while i < bytes.len() {
        let (pos, ch) = bytes[i];

        if ch == ' ' || ch == '\t' {
            i += 1;
            continue;
        }

        if is_special_char(ch) {
            let lexeme = &line[pos..pos + ch.len_utf8()];
            tokens.push(Token::new(classify(lexeme), lexeme, line_no, pos));
            i += 1;
            continue;
        }

        let start = pos;
        while i < bytes.len() {
            let (_, c) = bytes[i];
            if c == ' ' || c == '\t' || is_special_char(c) {
                break;
            }
            i += 1;
        }
        let end = if i < bytes.len() { bytes[i].0 } else { line.len() };
        let lexeme = &line[start..end];
        tokens.push(Token::new(classify(lexeme), lexeme, line_no, start));
    }

    tokens
}

// ----------------------------------------------------------------------------
// Phase 2: reclassify by line context

/// Rewrite token kinds using 1-token lookaround: labels from a trailing
/// colon, immediates from `#` and `.data` lists, string-literal runs
/// between quotes.
pub fn identify_context(tokens: &mut [Token<'_>], file: &str, errors: &mut Errors) {
    let n = tokens.len();
    let mut i = 0;

    while i < n {
        let kind = tokens[i].kind;

        // A colon turns the preceding token into a label.
        if kind == TokenKind::Colon && i > 0 {
            tokens[i - 1].kind = TokenKind::Label;
        }

        // A label's colon must be whitespace-separated from a directive dot.
        if kind == TokenKind::Dot && i > 0 && tokens[i - 1].kind == TokenKind::Colon {
            if tokens[i - 1].end() == tokens[i].col {
                errors.report(
                    ErrorKind::LabelMissingSpace,
                    format!(
                        "{file}:{}: Invalid label name - Missing whitespace between colon and directive",
                        tokens[i].line
                    ),
                );
            }
        }
        // `# X` makes X an immediate.
        else if kind == TokenKind::Hash && i + 1 < n {
            tokens[i + 1].kind = TokenKind::Imm;
        }
        // `, Y` after an immediate or string literal continues the run.
        // Only unclaimed tokens are rewritten; a `#` or `"` keeps its own
        // classification and marks its operand itself.
        else if kind == TokenKind::Comma && i > 0 && i + 1 < n {
            let chainable = matches!(
                tokens[i + 1].kind,
                TokenKind::Unknown | TokenKind::Identifier
            );
            match tokens[i - 1].kind {
                TokenKind::Imm if chainable => tokens[i + 1].kind = TokenKind::Imm,
                TokenKind::StrLit if chainable => tokens[i + 1].kind = TokenKind::StrLit,
                _ => {}
            }
        }
        // Everything between a quote pair is string literal.
        else if kind == TokenKind::Quote {
            let mut j = i + 1;
            while j < n && tokens[j].kind != TokenKind::Quote {
                tokens[j].kind = TokenKind::StrLit;
                j += 1;
            }
            i = j;
        }
        // Every non-comma token after `.data` is an immediate.
        else if kind == TokenKind::DirData {
            for tok in tokens[i + 1..].iter_mut() {
                if tok.kind != TokenKind::Comma {
                    tok.kind = TokenKind::Imm;
                }
            }
            break;
        }

        i += 1;
    }
}

// ----------------------------------------------------------------------------
// Driver

/// Tokenize every preprocessed line. Tokens that survive both phases
/// unclassified are reported and marked invalid.
pub fn lex<'a>(lines: &'a [String], file: &str, errors: &mut Errors) -> Vec<Token<'a>> {
    let mut tokens = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        let mut line_tokens = tokenize_line(line, idx + 1);
        identify_context(&mut line_tokens, file, errors);

        for tok in &mut line_tokens {
            if tok.kind == TokenKind::Unknown {
                errors.report(
                    ErrorKind::InvalidToken,
                    format!("{file}:{}: Invalid token '{}'", tok.line, tok.lexeme),
                );
                tok.kind = TokenKind::Invalid;
            }
        }

        tokens.extend(line_tokens);
    }

    tokens
}
