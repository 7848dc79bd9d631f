use color_print::cprintln;
use std::io;
use strum::Display;
use thiserror::Error;

/// Host I/O failures. Everything that happens inside the source text is a
/// [`Diag`] instead.
#[derive(Error, Debug)]
pub enum FileError {
    #[error("Failed to open file: {0}")]
    Open(String, #[source] io::Error),

    #[error("Failed to read file: {0}")]
    Read(String, #[source] io::Error),

    #[error("Failed to create file: {0}")]
    Create(String, #[source] io::Error),

    #[error("Failed to write file: {0}")]
    Write(String, #[source] io::Error),
}

// ----------------------------------------------------------------------------
// Diagnostics

/// Tag printed in front of every reported defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    // File
    FileOpen,
    FileRead,

    // Preprocessor / macros
    LineLen,
    McroDefExtra,
    McroName,
    McroSpaceMissing,

    // Lexer
    InvalidToken,
    InvalidStatement,

    // Labels
    EmptyLabel,
    LabelMaxLen,
    LabelStartsWithDigit,
    LabelInvalidChar,
    LabelCollidesInstruction,
    LabelCollidesRegister,
    LabelCollidesDirective,
    LabelDuplicate,
    LabelMissingColon,
    LabelMissingSpace,

    // Instructions
    InstIllegalComma,
    InstIllegalNumComma,
    AddrOutOfBounds,
    ImmOutOfBounds,
    InvalidImm,
    InvalidData,

    // Directives
    DirDotMissing,
    DataIllegalComma,
    StrIllegalComma,
    StrMissingQuote,
    MultiComma,

    // General
    WrongOperandCount,
    BadAddressingMode,
    SymbolNotFound,
}

#[derive(Debug, Clone)]
pub struct Diag {
    pub kind: ErrorKind,
    pub msg: String,
}

/// Append-only per-file error list. Stages report into it and the driver
/// flushes it after each stage; a non-empty flush stops the file.
#[derive(Debug, Default)]
pub struct Errors(Vec<Diag>);

const SEPARATOR: &str =
    "----------------------------------------------------------------------------";

impl Errors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, kind: ErrorKind, msg: String) {
        self.0.push(Diag { kind, msg });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn kinds(&self) -> Vec<ErrorKind> {
        self.0.iter().map(|d| d.kind).collect()
    }

    /// Print the report to stderr and clear the list. Returns true if
    /// anything was reported.
    pub fn flush(&mut self) -> bool {
        if self.0.is_empty() {
            return false;
        }
        eprintln!("{SEPARATOR}");
        for diag in &self.0 {
            cprintln!("<red,bold>[{}]</> {}", diag.kind, diag.msg);
        }
        eprintln!("{SEPARATOR}");
        self.0.clear();
        true
    }
}
