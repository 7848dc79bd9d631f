use crate::context::{Context, Symbol};
use crate::error::{ErrorKind, Errors};
use crate::parser::{
    is_directive_statement, is_entry_statement, is_extern_statement, is_instruction_statement,
    is_label_statement, parse_directive, parse_instruction,
};
use crate::token::{Token, TokenKind};
use arch::inst;
use arch::reg::Reg;
use arch::ADDR_MAX;

pub const MAX_LABEL_LEN: usize = 31;

/// Walk every tokenized line: define symbols, validate statements, and
/// advance IC/DC by each statement's emitted word count.
pub fn first_pass<'a>(
    ctx: &mut Context<'a>,
    tokens: &[Token<'a>],
    lines: &'a [String],
    file: &str,
    errors: &mut Errors,
) {
    for line_tokens in tokens.chunk_by(|a, b| a.line == b.line) {
        let line_no = line_tokens[0].line;

        if is_label_statement(line_tokens)
            || is_entry_statement(line_tokens)
            || is_extern_statement(line_tokens)
        {
            define_symbol(ctx, line_tokens, file, errors);
        }

        let is_instruction = is_instruction_statement(line_tokens);
        let is_directive = is_directive_statement(line_tokens);

        if is_instruction {
            if let Some(inst) = parse_instruction(line_tokens, file, errors, true) {
                ctx.ic += inst.word_count;
            }
        }

        if is_directive {
            let line = lines[line_no - 1].as_str();
            if let Some(dir) = parse_directive(line_tokens, line, file, errors, true) {
                ctx.dc += dir.word_count;
                ctx.ic += dir.word_count;
            }
        }

        if !is_instruction && !is_directive {
            errors.report(
                ErrorKind::InvalidStatement,
                format!(
                    "{file}:{line_no}: Invalid statement: '{}'",
                    &lines[line_no - 1]
                ),
            );
        }
    }
}

// ----------------------------------------------------------------------------
// Symbol definition

fn define_symbol<'a>(
    ctx: &mut Context<'a>,
    tokens: &[Token<'a>],
    file: &str,
    errors: &mut Errors,
) {
    let mut i = 0;
    let mut label = None;

    if tokens[0].kind == TokenKind::Label {
        label = Some(tokens[0]);
        i += 2;
    }

    // Step over the directive dot if present.
    if tokens.get(i).is_some_and(|t| t.kind == TokenKind::Dot) {
        i += 1;
    }

    let Some(head) = tokens.get(i) else {
        return;
    };

    // A label introducing code or data gets validated; `.entry`/`.extern`
    // lines name symbols defined elsewhere, so a label there is ignored.
    if let Some(label) = label {
        if !is_entry_statement(tokens) && !is_extern_statement(tokens) {
            if !validate_label(&label, ctx, file, errors) {
                return;
            }
        }
    }

    match head.kind {
        TokenKind::Instruction | TokenKind::DirData | TokenKind::DirString => {
            let Some(label) = label else {
                return;
            };
            let address = ctx.ic;
            if address > ADDR_MAX {
                errors.report(
                    ErrorKind::AddrOutOfBounds,
                    format!(
                        "{file}:{}: Address {address} exceeds maximum allowed value of {ADDR_MAX}",
                        label.line
                    ),
                );
            }
            ctx.symbols.insert(Symbol {
                name: label.lexeme,
                address,
                external: false,
                entry: false,
            });
        }
        TokenKind::DirExtern => {
            let Some(name) = tokens.get(i + 1) else {
                return;
            };
            ctx.symbols.insert(Symbol {
                name: name.lexeme,
                address: 0,
                external: true,
                entry: false,
            });
            ctx.extern_names.push(name.lexeme);
        }
        TokenKind::DirEntry => {
            let Some(name) = tokens.get(i + 1) else {
                return;
            };
            // Resolved against the symbol table in the second pass.
            ctx.entry_names.push(name.lexeme);
        }
        _ => {}
    }
}

fn validate_label(token: &Token, ctx: &Context, file: &str, errors: &mut Errors) -> bool {
    let name = token.lexeme;
    let line = token.line;

    if name.is_empty() {
        errors.report(
            ErrorKind::EmptyLabel,
            format!("{file}:{line}: Empty label name"),
        );
        return false;
    }
    if name.len() > MAX_LABEL_LEN {
        errors.report(
            ErrorKind::LabelMaxLen,
            format!(
                "{file}:{line}: Label name '{name}' exceeds maximum length of {MAX_LABEL_LEN} characters"
            ),
        );
        return false;
    }
    if !name.chars().next().unwrap().is_ascii_alphabetic() {
        errors.report(
            ErrorKind::LabelStartsWithDigit,
            format!("{file}:{line}: Label name '{name}' must start with a letter"),
        );
        return false;
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && *c != '_')
    {
        errors.report(
            ErrorKind::LabelInvalidChar,
            format!("{file}:{line}: Label name '{name}' contains invalid character '{bad}'"),
        );
        return false;
    }
    if inst::is_instruction(name) {
        errors.report(
            ErrorKind::LabelCollidesInstruction,
            format!("{file}:{line}: Label name '{name}' cannot be an instruction name"),
        );
        return false;
    }
    if Reg::parse(name).is_ok() {
        errors.report(
            ErrorKind::LabelCollidesRegister,
            format!("{file}:{line}: Label name '{name}' cannot be a register name"),
        );
        return false;
    }
    if inst::is_directive(name) {
        errors.report(
            ErrorKind::LabelCollidesDirective,
            format!("{file}:{line}: Label name '{name}' cannot be a directive name"),
        );
        return false;
    }
    if ctx.symbols.contains(name) {
        errors.report(
            ErrorKind::LabelDuplicate,
            format!("{file}:{line}: Label '{name}' already defined"),
        );
        return false;
    }

    true
}
