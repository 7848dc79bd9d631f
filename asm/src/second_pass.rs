use crate::context::{Context, Symbol, INITIAL_IC};
use crate::error::{ErrorKind, Errors};
use crate::parser::{
    is_directive_statement, is_instruction_statement, parse_directive, parse_instruction, Operand,
    ParsedDirective, ParsedInstruction,
};
use crate::token::{Token, TokenKind};
use arch::inst::{find_instruction, Directive};
use arch::mode::{Are, Mode};
use arch::reg::Reg;
use arch::word::Word;
use arch::{ADDR_MAX, IMM21_MAX, IMM21_MIN};

/// Re-walk every statement with the symbol table complete: resolve entry
/// declarations and external use sites, then encode instructions and data
/// into the code and data images.
pub fn second_pass<'a>(
    ctx: &mut Context<'a>,
    tokens: &[Token<'a>],
    lines: &'a [String],
    file: &str,
    errors: &mut Errors,
) {
    // Pass 1 left IC/DC sized for the object header; emission re-counts
    // addresses from the start.
    let mut ic = INITIAL_IC;

    for line_tokens in tokens.chunk_by(|a, b| a.line == b.line) {
        let line_no = line_tokens[0].line;

        if is_instruction_statement(line_tokens) {
            if let Some(inst) = parse_instruction(line_tokens, file, errors, false) {
                resolve_references(ctx, &inst, ic);
                encode_instruction(ctx, &inst, &mut ic, file, errors);
            }
        }

        if is_directive_statement(line_tokens) {
            let line = lines[line_no - 1].as_str();
            if let Some(dir) = parse_directive(line_tokens, line, file, errors, false) {
                if let Some(label) = dir.label {
                    resolve_entry(ctx, &label);
                }
                encode_directive(ctx, &dir, &mut ic);
            }
        }
    }

    // Every declared entry must have met its defining label by now.
    for name in &ctx.entry_names {
        if !ctx.entries.iter().any(|s| s.name == *name) {
            errors.report(
                ErrorKind::SymbolNotFound,
                format!("{file}: Entry symbol '{name}' is never defined"),
            );
        }
    }
}

// ----------------------------------------------------------------------------
// Reference resolution

/// Record the entry resolved by this line's label (if any) and an external
/// use site for every operand naming a `.extern` symbol. The recorded
/// address is the extra word that carries the reference.
fn resolve_references<'a>(ctx: &mut Context<'a>, inst: &ParsedInstruction<'a>, ic: u32) {
    if let Some(label) = inst.label {
        resolve_entry(ctx, &label);
    }

    let src_extra = inst.rs.as_ref().is_some_and(Operand::needs_extra_word);

    if let Some(rs) = &inst.rs {
        if rs.token.kind == TokenKind::Identifier {
            log_external(ctx, rs.token.lexeme, ic + 1);
        }
    }
    if let Some(rt) = &inst.rt {
        if rt.token.kind == TokenKind::Identifier {
            let address = if src_extra { ic + 2 } else { ic + 1 };
            log_external(ctx, rt.token.lexeme, address);
        }
    }
}

fn resolve_entry<'a>(ctx: &mut Context<'a>, label: &Token<'a>) {
    if !ctx.is_entry_name(label.lexeme) {
        return;
    }
    if ctx.entries.iter().any(|s| s.name == label.lexeme) {
        return;
    }
    if let Some(symbol) = ctx.symbols.get(label.lexeme) {
        ctx.entries.push(Symbol {
            name: label.lexeme,
            address: symbol.address,
            external: false,
            entry: true,
        });
    }
}

fn log_external<'a>(ctx: &mut Context<'a>, name: &'a str, address: u32) {
    if ctx.is_extern_name(name) {
        ctx.externals.push(Symbol {
            name,
            address,
            external: true,
            entry: false,
        });
    }
}

// ----------------------------------------------------------------------------
// Instruction encoding

fn encode_instruction<'a>(
    ctx: &mut Context<'a>,
    inst: &ParsedInstruction<'a>,
    ic: &mut u32,
    file: &str,
    errors: &mut Errors,
) {
    let Some(info) = find_instruction(inst.mnemonic.lexeme) else {
        return;
    };

    let mut word = Word::new(*ic);
    word.set_are(Are::Absolute);
    word.set_opcode(info.opcode);
    word.set_funct(info.funct);

    if let Some(rs) = &inst.rs {
        word.set_src_mode(rs.mode);
        if let Ok(reg) = Reg::parse(rs.token.lexeme) {
            word.set_src_reg(reg);
        }
    }
    if let Some(rt) = &inst.rt {
        word.set_dst_mode(rt.mode);
        if let Ok(reg) = Reg::parse(rt.token.lexeme) {
            word.set_dst_reg(reg);
        }
    }

    ctx.code_img.push(word);
    *ic += 1;

    for operand in [&inst.rs, &inst.rt].into_iter().flatten() {
        if operand.needs_extra_word() {
            encode_extra_word(ctx, operand, *ic, file, errors);
            *ic += 1;
        }
    }
}

/// Emit the extra word of an immediate or symbol-referencing operand.
fn encode_extra_word(
    ctx: &mut Context,
    operand: &Operand,
    address: u32,
    file: &str,
    errors: &mut Errors,
) {
    let tok = &operand.token;
    let mut word = Word::new(address);

    match operand.mode {
        Mode::Immediate => {
            let value = tok.lexeme.parse::<i64>().unwrap_or_default();
            if !(IMM21_MIN..=IMM21_MAX).contains(&value) {
                errors.report(
                    ErrorKind::ImmOutOfBounds,
                    format!(
                        "{file}:{}: Immediate value {value} exceeds allowed range ({IMM21_MIN} to {IMM21_MAX})",
                        tok.line
                    ),
                );
            }
            word.set_payload(value);
            word.set_are(Are::Absolute);
        }
        Mode::Direct => {
            let Some(symbol) = ctx.symbols.get(tok.lexeme) else {
                errors.report(
                    ErrorKind::SymbolNotFound,
                    format!(
                        "{file}:{}: Symbol '{}' not found in symbol table",
                        tok.line, tok.lexeme
                    ),
                );
                return;
            };
            if symbol.address > ADDR_MAX {
                errors.report(
                    ErrorKind::AddrOutOfBounds,
                    format!(
                        "{file}:{}: Symbol address {} exceeds maximum allowed value of {ADDR_MAX}",
                        tok.line, symbol.address
                    ),
                );
            }
            let are = if symbol.external {
                Are::External
            } else {
                Are::Relocatable
            };
            word.set_payload(symbol.address as i64);
            word.set_are(are);
        }
        Mode::Relative => {
            let Some(symbol) = ctx.symbols.get(tok.lexeme) else {
                errors.report(
                    ErrorKind::SymbolNotFound,
                    format!(
                        "{file}:{}: Symbol '{}' not found in symbol table",
                        tok.line, tok.lexeme
                    ),
                );
                return;
            };
            let offset = symbol.address as i64 - address as i64 + 1;
            if !(IMM21_MIN..=IMM21_MAX).contains(&offset) {
                errors.report(
                    ErrorKind::AddrOutOfBounds,
                    format!(
                        "{file}:{}: Relative address offset {offset} exceeds allowed range ({IMM21_MIN} to {IMM21_MAX})",
                        tok.line
                    ),
                );
            }
            word.set_payload(offset);
            word.set_are(Are::Absolute);
        }
        // Register operands live entirely in the header word.
        Mode::Register => return,
    }

    ctx.code_img.push(word);
}

// ----------------------------------------------------------------------------
// Data encoding

fn encode_directive(ctx: &mut Context, dir: &ParsedDirective, ic: &mut u32) {
    match dir.kind {
        Directive::Data => {
            for value in &dir.values {
                let mut word = Word::new(*ic);
                word.set_data(*value);
                ctx.data_img.push(word);
                *ic += 1;
            }
        }
        Directive::String => {
            let Some(literal) = dir.literal else {
                return;
            };
            for byte in literal.bytes() {
                let mut word = Word::new(*ic);
                word.set_data(byte as i64);
                ctx.data_img.push(word);
                *ic += 1;
            }
            // NUL terminator word
            ctx.data_img.push(Word::new(*ic));
            *ic += 1;
        }
        Directive::Entry | Directive::Extern => {}
    }
}
