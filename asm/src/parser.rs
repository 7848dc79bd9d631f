use crate::error::{ErrorKind, Errors};
use crate::token::{Token, TokenKind};
use arch::inst::{find_instruction, Directive};
use arch::mode::Mode;
use arch::{IMM21_MAX, IMM21_MIN};

// ----------------------------------------------------------------------------
// Statement classification

pub fn is_label_statement(tokens: &[Token]) -> bool {
    tokens.first().is_some_and(|t| t.kind == TokenKind::Label)
}

fn body<'a, 'b>(tokens: &'a [Token<'b>]) -> &'a [Token<'b>] {
    if is_label_statement(tokens) && tokens.len() >= 2 {
        &tokens[2..]
    } else {
        tokens
    }
}

pub fn is_instruction_statement(tokens: &[Token]) -> bool {
    body(tokens).iter().any(|t| t.kind == TokenKind::Instruction)
}

pub fn is_directive_statement(tokens: &[Token]) -> bool {
    body(tokens).iter().any(|t| {
        matches!(
            t.kind,
            TokenKind::DirData | TokenKind::DirString | TokenKind::DirEntry | TokenKind::DirExtern
        )
    })
}

pub fn is_entry_statement(tokens: &[Token]) -> bool {
    tokens.iter().any(|t| t.kind == TokenKind::DirEntry)
}

pub fn is_extern_statement(tokens: &[Token]) -> bool {
    tokens.iter().any(|t| t.kind == TokenKind::DirExtern)
}

// ----------------------------------------------------------------------------
// Instructions

/// An operand token with its resolved addressing mode.
#[derive(Debug, Clone, Copy)]
pub struct Operand<'a> {
    pub token: Token<'a>,
    pub mode: Mode,
}

impl<'a> Operand<'a> {
    /// Whether this operand is carried in an extra word after the header.
    pub fn needs_extra_word(&self) -> bool {
        matches!(self.token.kind, TokenKind::Imm | TokenKind::Identifier)
    }
}

#[derive(Debug, Clone)]
pub struct ParsedInstruction<'a> {
    pub label: Option<Token<'a>>,
    pub mnemonic: Token<'a>,
    /// Source operand. Single-operand instructions keep theirs in `rt`.
    pub rs: Option<Operand<'a>>,
    /// Destination operand.
    pub rt: Option<Operand<'a>>,
    pub operand_count: usize,
    /// Machine words this statement emits (1 to 3).
    pub word_count: u32,
}

/// Parse one instruction line. In validating mode every defect is
/// reported; otherwise the statement is taken at face value (second pass).
pub fn parse_instruction<'a>(
    tokens: &[Token<'a>],
    file: &str,
    errors: &mut Errors,
    validate: bool,
) -> Option<ParsedInstruction<'a>> {
    if tokens.is_empty() {
        return None;
    }

    let mut i = 0;
    let mut label = None;

    if tokens[0].kind == TokenKind::Label {
        label = Some(tokens[0]);
        i += 2;
    } else if tokens[0].kind == TokenKind::Identifier {
        // An identifier head is a label missing its colon.
        if validate {
            errors.report(
                ErrorKind::LabelMissingColon,
                format!("{file}:{}: Missing colon after label", tokens[0].line),
            );
        }
        return None;
    }

    let mnemonic = *tokens.get(i)?;
    if mnemonic.kind != TokenKind::Instruction {
        if validate {
            errors.report(
                ErrorKind::InvalidStatement,
                format!(
                    "{file}:{}: Expected instruction, got '{}'",
                    mnemonic.line, mnemonic.lexeme
                ),
            );
        }
        return None;
    }

    let operand_count = tokens.iter().filter(|t| t.is_operand()).count();

    let mut rs: Option<Operand<'a>> = None;
    let mut rt: Option<Operand<'a>> = None;
    let mut relative = false;
    let mut comma_count = 0;

    for tok in &tokens[i + 1..] {
        match tok.kind {
            TokenKind::Amper => relative = true,
            TokenKind::Comma => {
                if validate && rs.is_none() {
                    errors.report(
                        ErrorKind::InstIllegalComma,
                        format!(
                            "{file}:{}: Illegal comma before first operand of '{}'",
                            tok.line, mnemonic.lexeme
                        ),
                    );
                }
                comma_count += 1;
            }
            _ if tok.is_operand() => {
                let mode = if relative {
                    Mode::Relative
                } else {
                    match tok.kind {
                        TokenKind::Imm => Mode::Immediate,
                        TokenKind::Register => Mode::Register,
                        _ => Mode::Direct,
                    }
                };
                relative = false;

                if validate && tok.kind == TokenKind::Imm && !validate_immediate(tok, file, errors)
                {
                    return None;
                }

                let operand = Operand { token: *tok, mode };
                if rs.is_none() {
                    rs = Some(operand);
                } else if rt.is_none() {
                    rt = Some(operand);
                }
            }
            _ => {}
        }
    }

    // Single-operand instructions use the destination slot.
    if operand_count == 1 {
        rt = rs.take();
    }

    let word_count = 1
        + rs.as_ref().is_some_and(Operand::needs_extra_word) as u32
        + rt.as_ref().is_some_and(Operand::needs_extra_word) as u32;

    let inst = ParsedInstruction {
        label,
        mnemonic,
        rs,
        rt,
        operand_count,
        word_count,
    };

    if validate {
        validate_instruction(&inst, comma_count, file, errors);
    }

    Some(inst)
}

fn validate_immediate(tok: &Token, file: &str, errors: &mut Errors) -> bool {
    let value = match tok.lexeme.parse::<i64>() {
        Ok(value) => value,
        Err(_) => {
            errors.report(
                ErrorKind::InvalidImm,
                format!(
                    "{file}:{}: Invalid immediate value '{}'",
                    tok.line, tok.lexeme
                ),
            );
            return false;
        }
    };
    if !(IMM21_MIN..=IMM21_MAX).contains(&value) {
        errors.report(
            ErrorKind::ImmOutOfBounds,
            format!(
                "{file}:{}: Immediate value {value} is out of range ({IMM21_MIN} to {IMM21_MAX})",
                tok.line
            ),
        );
        return false;
    }
    true
}

fn validate_instruction(
    inst: &ParsedInstruction,
    comma_count: usize,
    file: &str,
    errors: &mut Errors,
) {
    let Some(info) = find_instruction(inst.mnemonic.lexeme) else {
        return;
    };
    let line = inst.mnemonic.line;
    let name = inst.mnemonic.lexeme;

    if inst.operand_count != info.operands {
        errors.report(
            ErrorKind::WrongOperandCount,
            format!(
                "{file}:{line}: Invalid number of operands for instruction '{name}'. Expected {}, got {}",
                info.operands, inst.operand_count
            ),
        );
    }

    if let Some(rs) = &inst.rs {
        if rs.mode.mask() & info.src_modes == 0 {
            errors.report(
                ErrorKind::BadAddressingMode,
                format!(
                    "{file}:{line}: Invalid addressing mode '{}' for source operand in '{name}'",
                    rs.mode.name()
                ),
            );
        }
    }

    if let Some(rt) = &inst.rt {
        if rt.mode.mask() & info.dst_modes == 0 {
            errors.report(
                ErrorKind::BadAddressingMode,
                format!(
                    "{file}:{line}: Invalid addressing mode '{}' for destination operand in '{name}'",
                    rt.mode.name()
                ),
            );
        }
    }

    if info.operands == 2 && comma_count != 1 {
        errors.report(
            ErrorKind::InstIllegalNumComma,
            format!("{file}:{line}: Invalid number of commas in instruction '{name}'"),
        );
    }
}

// ----------------------------------------------------------------------------
// Directives

#[derive(Debug, Clone)]
pub struct ParsedDirective<'a> {
    pub label: Option<Token<'a>>,
    pub kind: Directive,
    /// Data words (or string bytes + terminator) this statement emits.
    pub word_count: u32,
    /// `.data` payloads, in source order.
    pub values: Vec<i64>,
    /// `.string` payload, byte-exact between the quotes.
    pub literal: Option<&'a str>,
    /// `.entry`/`.extern` symbol name.
    pub name: Option<Token<'a>>,
}

/// Parse one directive line. `line` is the full source line the tokens
/// were cut from; it backs the byte-exact string literal.
pub fn parse_directive<'a>(
    tokens: &[Token<'a>],
    line: &'a str,
    file: &str,
    errors: &mut Errors,
    validate: bool,
) -> Option<ParsedDirective<'a>> {
    if tokens.is_empty() {
        return None;
    }

    let mut i = 0;
    let mut label = None;

    if tokens[0].kind == TokenKind::Label {
        label = Some(tokens[0]);
        i += 2;
    }

    let dot = tokens.get(i)?;
    if dot.kind != TokenKind::Dot {
        if validate {
            errors.report(
                ErrorKind::DirDotMissing,
                format!(
                    "{file}:{}: Invalid directive statement - a dot is missing before the directive",
                    dot.line
                ),
            );
        }
        return None;
    }
    i += 1;

    let dir_tok = tokens.get(i)?;
    let kind = match dir_tok.kind {
        TokenKind::DirData => Directive::Data,
        TokenKind::DirString => Directive::String,
        TokenKind::DirEntry => Directive::Entry,
        TokenKind::DirExtern => Directive::Extern,
        _ => return None,
    };
    i += 1;

    let mut directive = ParsedDirective {
        label,
        kind,
        word_count: 0,
        values: Vec::new(),
        literal: None,
        name: None,
    };

    match kind {
        Directive::String => parse_string(&mut directive, &tokens[i..], line, file, errors, validate)?,
        Directive::Data => parse_data(&mut directive, &tokens[i..], file, errors, validate)?,
        Directive::Entry | Directive::Extern => {
            match tokens.get(i) {
                Some(tok) if tok.kind == TokenKind::Identifier => directive.name = Some(*tok),
                _ => {
                    if validate {
                        errors.report(
                            ErrorKind::InvalidStatement,
                            format!(
                                "{file}:{}: Expected a symbol name after the directive",
                                dir_tok.line
                            ),
                        );
                    }
                    return None;
                }
            }
        }
    }

    Some(directive)
}

fn parse_string<'a>(
    directive: &mut ParsedDirective<'a>,
    tokens: &[Token<'a>],
    line: &'a str,
    file: &str,
    errors: &mut Errors,
    validate: bool,
) -> Option<()> {
    let report = |errors: &mut Errors, kind, msg: String| {
        if validate {
            errors.report(kind, msg);
        }
    };

    let Some(first) = tokens.first() else {
        report(
            errors,
            ErrorKind::StrMissingQuote,
            format!("{file}: Invalid string directive - expected a quoted string"),
        );
        return None;
    };
    if first.kind == TokenKind::Comma {
        report(
            errors,
            ErrorKind::StrIllegalComma,
            format!(
                "{file}:{}: Illegal comma in string directive - string directive cannot start with a comma",
                first.line
            ),
        );
        return None;
    }
    if first.kind != TokenKind::Quote {
        report(
            errors,
            ErrorKind::StrMissingQuote,
            format!(
                "{file}:{}: Invalid string directive - expected a quote at the beginning of the string",
                first.line
            ),
        );
        return None;
    }

    let last = tokens.last().unwrap();
    if last.kind == TokenKind::Comma {
        report(
            errors,
            ErrorKind::StrIllegalComma,
            format!(
                "{file}:{}: Illegal comma in string directive - string directive cannot end with a comma",
                last.line
            ),
        );
        return None;
    }
    if last.kind != TokenKind::Quote || tokens.len() < 2 {
        report(
            errors,
            ErrorKind::StrMissingQuote,
            format!(
                "{file}:{}: Illegal token in string directive - expected a quote at the end of the string",
                last.line
            ),
        );
        return None;
    }

    let literal = &line[first.end()..last.col];
    directive.literal = Some(literal);
    directive.word_count = literal.len() as u32 + 1;
    Some(())
}

fn parse_data<'a>(
    directive: &mut ParsedDirective<'a>,
    tokens: &[Token<'a>],
    file: &str,
    errors: &mut Errors,
    validate: bool,
) -> Option<()> {
    // Leading comma
    if let Some(first) = tokens.first() {
        if first.kind == TokenKind::Comma {
            if validate {
                errors.report(
                    ErrorKind::DataIllegalComma,
                    format!(
                        "{file}:{}: Illegal comma in data directive - integer list cannot start with a comma",
                        first.line
                    ),
                );
            }
            return None;
        }
    }

    for (j, tok) in tokens.iter().enumerate() {
        let next = tokens.get(j + 1);
        match tok.kind {
            TokenKind::Imm => {
                if validate && !validate_data_value(tok, file, errors) {
                    return None;
                }
                if let Ok(value) = tok.lexeme.parse::<i64>() {
                    directive.values.push(value);
                }
                directive.word_count += 1;

                if let Some(next) = next {
                    if next.kind != TokenKind::Comma {
                        if validate {
                            errors.report(
                                ErrorKind::DataIllegalComma,
                                format!(
                                    "{file}:{}: Missing comma between elements in data directive - expected comma after '{}', instead got '{}'",
                                    tok.line, tok.lexeme, next.lexeme
                                ),
                            );
                        }
                        return None;
                    }
                }
            }
            TokenKind::Comma => {
                if next.is_some_and(|n| n.kind == TokenKind::Comma) {
                    if validate {
                        errors.report(
                            ErrorKind::MultiComma,
                            format!(
                                "{file}:{}: Multiple consecutive commas in data directive",
                                tok.line
                            ),
                        );
                    }
                    return None;
                }
            }
            _ => {}
        }
    }

    // The whole list is scanned before the trailing check runs once.
    if tokens.last().is_some_and(|t| t.kind == TokenKind::Comma) {
        if validate {
            errors.report(
                ErrorKind::DataIllegalComma,
                format!(
                    "{file}:{}: Illegal comma in data directive - integer list cannot end with a comma",
                    tokens.last().unwrap().line
                ),
            );
        }
        return None;
    }

    Some(())
}

fn validate_data_value(tok: &Token, file: &str, errors: &mut Errors) -> bool {
    let value = match tok.lexeme.parse::<i64>() {
        Ok(value) => value,
        Err(_) => {
            errors.report(
                ErrorKind::InvalidData,
                format!("{file}:{}: Invalid data value '{}'", tok.line, tok.lexeme),
            );
            return false;
        }
    };
    if !(IMM21_MIN..=IMM21_MAX).contains(&value) {
        errors.report(
            ErrorKind::ImmOutOfBounds,
            format!(
                "{file}:{}: Data value {value} is out of range ({IMM21_MIN} to {IMM21_MAX})",
                tok.line
            ),
        );
        return false;
    }
    true
}
