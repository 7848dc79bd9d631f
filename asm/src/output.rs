use crate::context::{Context, Symbol};
use crate::error::FileError;
use color_print::cprintln;
use itertools::chain;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};

/// Read the raw source lines of `path`.
pub fn read_source(path: &str) -> Result<Vec<String>, FileError> {
    let file = File::open(path).map_err(|e| FileError::Open(path.to_string(), e))?;
    BufReader::new(file)
        .lines()
        .collect::<io::Result<Vec<_>>>()
        .map_err(|e| FileError::Read(path.to_string(), e))
}

fn create(path: &str) -> Result<BufWriter<File>, FileError> {
    let file = File::create(path).map_err(|e| FileError::Create(path.to_string(), e))?;
    Ok(BufWriter::new(file))
}

/// Write the preprocessed intermediate file (`.am`).
pub fn write_lines(path: &str, lines: &[String]) -> Result<(), FileError> {
    let mut out = create(path)?;
    write_lines_to(&mut out, lines).map_err(|e| FileError::Write(path.to_string(), e))
}

pub fn write_lines_to(out: &mut impl Write, lines: &[String]) -> io::Result<()> {
    for line in lines {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

/// Write the object file (`.ob`): size header, then code words, then data
/// words, one `ADDRESS HEXVALUE` pair per line.
pub fn write_object(path: &str, ctx: &Context) -> Result<(), FileError> {
    let mut out = create(path)?;
    write_object_to(&mut out, ctx).map_err(|e| FileError::Write(path.to_string(), e))
}

pub fn write_object_to(out: &mut impl Write, ctx: &Context) -> io::Result<()> {
    writeln!(out, "     {} {}", ctx.code_size(), ctx.data_size())?;
    for word in chain(&ctx.code_img, &ctx.data_img) {
        writeln!(out, "{:07} {:06x}", word.address, word.value)?;
    }
    Ok(())
}

/// Write an `.ent`/`.ext` symbol listing.
pub fn write_symbols(path: &str, symbols: &[Symbol]) -> Result<(), FileError> {
    let mut out = create(path)?;
    write_symbols_to(&mut out, symbols).map_err(|e| FileError::Write(path.to_string(), e))
}

pub fn write_symbols_to(out: &mut impl Write, symbols: &[Symbol]) -> io::Result<()> {
    for symbol in symbols {
        writeln!(out, "{} {:07}", symbol.name, symbol.address)?;
    }
    Ok(())
}

// ----------------------------------------------------------------------------
// Dump listing

/// Pretty-print the assembled images and symbol table to stdout.
pub fn dump(ctx: &Context) {
    if !ctx.symbols.is_empty() {
        cprintln!("<bold>-- symbols ------------------------</>");
        for symbol in ctx.symbols.iter() {
            let tag = if symbol.external { "extern" } else { "" };
            cprintln!("  <green>{:<31}</> {:07} <blue>{}</>", symbol.name, symbol.address, tag);
        }
    }
    cprintln!("<bold>-- code ---------------------------</>");
    for word in &ctx.code_img {
        cprintln!("  {:07} <yellow>{:06x}</>", word.address, word.value);
    }
    if !ctx.data_img.is_empty() {
        cprintln!("<bold>-- data ---------------------------</>");
        for word in &ctx.data_img {
            cprintln!("  {:07} <yellow>{:06x}</>", word.address, word.value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arch::word::Word;

    #[test]
    fn object_format() {
        let mut ctx = Context::new();
        ctx.ic = 103;
        ctx.dc = 1;
        ctx.code_img.push(Word {
            address: 100,
            value: 0x04_C1_04,
        });
        ctx.code_img.push(Word {
            address: 101,
            value: 0xFF_FF_FC,
        });
        ctx.data_img.push(Word {
            address: 102,
            value: 65,
        });

        let mut buf = Vec::new();
        write_object_to(&mut buf, &ctx).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "     2 1\n0000100 04c104\n0000101 fffffc\n0000102 000041\n");
    }

    #[test]
    fn symbol_format() {
        let symbols = vec![Symbol {
            name: "LIST",
            address: 108,
            external: false,
            entry: true,
        }];
        let mut buf = Vec::new();
        write_symbols_to(&mut buf, &symbols).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "LIST 0000108\n");
    }
}
