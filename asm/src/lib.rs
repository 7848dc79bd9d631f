pub mod context;
pub mod error;
pub mod first_pass;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod preprocess;
pub mod second_pass;
pub mod token;

use crate::context::Context;
use crate::error::{ErrorKind, Errors};
use color_print::cprintln;

pub const SRC_EXT: &str = ".as";
pub const IR_EXT: &str = ".am";
pub const OBJ_EXT: &str = ".ob";
pub const ENT_EXT: &str = ".ent";
pub const EXT_EXT: &str = ".ext";

/// Assemble one file base name. Each stage runs only if the previous one
/// finished without reporting anything; the first dirty stage prints the
/// report and stops the file. Returns whether the object file was written.
pub fn assemble(base: &str, dump: bool) -> bool {
    let src_name = format!("{base}{SRC_EXT}");
    let ir_name = format!("{base}{IR_EXT}");
    let mut errors = Errors::new();

    // Preprocess: raw source -> expanded `.am` lines
    let raw = match output::read_source(&src_name) {
        Ok(raw) => raw,
        Err(err) => {
            errors.report(ErrorKind::FileOpen, err.to_string());
            errors.flush();
            return false;
        }
    };
    let lines = preprocess::preprocess(&raw, &src_name, &mut errors);
    if errors.flush() {
        return false;
    }
    if let Err(err) = output::write_lines(&ir_name, &lines) {
        errors.report(ErrorKind::FileOpen, err.to_string());
        errors.flush();
        return false;
    }

    // Lex the whole intermediate file
    let tokens = lexer::lex(&lines, &ir_name, &mut errors);
    if errors.flush() {
        return false;
    }

    // First pass: symbols and counters
    let mut ctx = Context::new();
    first_pass::first_pass(&mut ctx, &tokens, &lines, &ir_name, &mut errors);
    if errors.flush() {
        return false;
    }

    // Second pass: resolution and encoding
    second_pass::second_pass(&mut ctx, &tokens, &lines, &ir_name, &mut errors);
    if errors.flush() {
        return false;
    }

    // Outputs
    let result = output::write_object(&format!("{base}{OBJ_EXT}"), &ctx)
        .and_then(|_| {
            if ctx.entries.is_empty() {
                Ok(())
            } else {
                output::write_symbols(&format!("{base}{ENT_EXT}"), &ctx.entries)
            }
        })
        .and_then(|_| {
            if ctx.externals.is_empty() {
                Ok(())
            } else {
                output::write_symbols(&format!("{base}{EXT_EXT}"), &ctx.externals)
            }
        });
    if let Err(err) = result {
        cprintln!("<red,bold>error</>: {}", err);
        return false;
    }

    if dump {
        output::dump(&ctx);
    }

    true
}
