use crate::error::{ErrorKind, Errors};
use arch::inst;
use arch::reg::Reg;
use indexmap::IndexMap;

pub const MAX_LINE_LEN: usize = 80;
pub const MAX_MACRO_NAME_LEN: usize = 31;
pub const MACRO_DEF: &str = "mcro";
pub const MACRO_END: &str = "mcroend";

// ----------------------------------------------------------------------------
// Preprocessor

#[derive(Debug, PartialEq, Eq)]
enum State {
    Default,
    Macro,
}

struct Preprocessor {
    state: State,
    /// Committed macros, name → body lines.
    macros: IndexMap<String, Vec<String>>,
    /// Body of the macro currently being read (header and end line excluded).
    buffer: Vec<String>,
    /// Source line the open `mcro` header sits on.
    def_line: usize,
}

/// Expand `raw` source lines: strip comments and blank lines, collect
/// `mcro`/`mcroend` definitions, splice macro bodies over call lines, and
/// normalize whitespace. Defects are reported and the offending macro is
/// skipped; the scan always runs to the end of the file.
pub fn preprocess(raw: &[String], file: &str, errors: &mut Errors) -> Vec<String> {
    let mut pp = Preprocessor {
        state: State::Default,
        macros: IndexMap::new(),
        buffer: Vec::new(),
        def_line: 0,
    };
    let mut out = Vec::new();
    let mut header = String::new();

    for (idx, line) in raw.iter().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();

        if line.len() > MAX_LINE_LEN {
            errors.report(
                ErrorKind::LineLen,
                format!("{file}:{line_no}: Line exceeds maximum length of {MAX_LINE_LEN} characters"),
            );
        }

        if trimmed.is_empty() || trimmed.starts_with(';') {
            continue;
        }

        match pp.state {
            State::Default => {
                if is_macro_def(trimmed) {
                    pp.state = State::Macro;
                    pp.def_line = line_no;
                    header = normalize(trimmed);
                    continue;
                }
                if pp.macros.contains_key(trimmed) {
                    out.extend(pp.macros[trimmed].iter().cloned());
                    continue;
                }
                out.push(normalize(trimmed));
            }
            State::Macro => {
                if is_macro_end(trimmed) {
                    pp.state = State::Default;
                    define_macro(&mut pp, &header, &normalize(trimmed), file, errors);
                    pp.buffer.clear();
                    continue;
                }
                pp.buffer.push(normalize(trimmed));
            }
        }
    }

    out
}

fn is_macro_def(line: &str) -> bool {
    line.starts_with(MACRO_DEF) && !line.starts_with(MACRO_END)
}

fn is_macro_end(line: &str) -> bool {
    line.starts_with(MACRO_END)
}

/// Collapse runs of spaces and tabs into a single space.
pub fn normalize(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    for ch in line.chars() {
        if ch == ' ' || ch == '\t' {
            if !out.is_empty() && !out.ends_with(' ') {
                out.push(' ');
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Validate the buffered definition and commit it. An invalid macro
/// reports its defects and is not stored.
fn define_macro(pp: &mut Preprocessor, header: &str, end: &str, file: &str, errors: &mut Errors) {
    let before = errors.len();
    let def_line = pp.def_line;

    // Header: exactly `mcro` + one space + NAME
    let after_def = &header[MACRO_DEF.len()..];
    if !after_def.starts_with(' ') {
        errors.report(
            ErrorKind::McroSpaceMissing,
            format!("{file}:{def_line}: Missing space between '{MACRO_DEF}' and macro name: {header}"),
        );
    }
    let name_part = after_def.trim_start();
    let name = name_part.split(' ').next().unwrap_or("");
    if name_part.len() > name.len() {
        errors.report(
            ErrorKind::McroDefExtra,
            format!("{file}:{def_line}: Macro definition contains extra characters: '{header}'"),
        );
    }

    // End line: nothing after `mcroend`
    if !end[MACRO_END.len()..].trim().is_empty() {
        errors.report(
            ErrorKind::McroDefExtra,
            format!("{file}:{def_line}: Macro end contains extra characters: '{end}'"),
        );
    }

    validate_macro_name(name, &pp.macros, file, def_line, errors);

    if errors.len() == before {
        pp.macros.insert(name.to_string(), pp.buffer.clone());
    }
}

fn validate_macro_name(
    name: &str,
    macros: &IndexMap<String, Vec<String>>,
    file: &str,
    line: usize,
    errors: &mut Errors,
) {
    if name.is_empty() {
        errors.report(
            ErrorKind::McroName,
            format!("{file}:{line}: Macro name is empty"),
        );
        return;
    }
    if name.len() > MAX_MACRO_NAME_LEN {
        errors.report(
            ErrorKind::McroName,
            format!(
                "{file}:{line}: Macro name exceeds maximum length of {MAX_MACRO_NAME_LEN} characters"
            ),
        );
    }
    if macros.contains_key(name) {
        errors.report(
            ErrorKind::McroName,
            format!("{file}:{line}: Macro name already defined: '{name}'"),
        );
    }

    let first = name.chars().next().unwrap();
    if first.is_ascii_digit() {
        errors.report(
            ErrorKind::McroName,
            format!("{file}:{line}: Macro name cannot start with a digit: '{name}'"),
        );
    }
    if first.is_ascii_uppercase() {
        errors.report(
            ErrorKind::McroName,
            format!("{file}:{line}: Macro name cannot start with an uppercase letter: '{name}'"),
        );
    }
    if name
        .chars()
        .any(|c| !c.is_ascii_alphanumeric() && c != '_')
    {
        errors.report(
            ErrorKind::McroDefExtra,
            format!("{file}:{line}: Invalid character in macro name: '{name}'"),
        );
    }

    if inst::is_instruction(name) {
        errors.report(
            ErrorKind::McroName,
            format!("{file}:{line}: Macro name conflicts with instruction name: '{name}'"),
        );
    } else if Reg::parse(name).is_ok() {
        errors.report(
            ErrorKind::McroName,
            format!("{file}:{line}: Macro name conflicts with register name: '{name}'"),
        );
    } else if inst::is_directive(name) {
        errors.report(
            ErrorKind::McroName,
            format!("{file}:{line}: Macro name conflicts with directive name: '{name}'"),
        );
    } else if name.ends_with(':') {
        errors.report(
            ErrorKind::McroName,
            format!("{file}:{line}: Macro name may conflict with label name: '{name}'"),
        );
    }
}
