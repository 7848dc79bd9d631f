use arch::inst::Directive;
use arch::mode::Mode;
use mxasm::error::{ErrorKind, Errors};
use mxasm::lexer::lex;
use mxasm::parser::{parse_directive, parse_instruction};
use mxasm::token::TokenKind;

fn inst_kinds(line: &str) -> Vec<ErrorKind> {
    let lines = vec![line.to_string()];
    let mut errors = Errors::new();
    let tokens = lex(&lines, "t.am", &mut errors);
    parse_instruction(&tokens, "t.am", &mut errors, true);
    errors.kinds()
}

fn dir_kinds(line: &str) -> Vec<ErrorKind> {
    let lines = vec![line.to_string()];
    let mut errors = Errors::new();
    let tokens = lex(&lines, "t.am", &mut errors);
    parse_directive(&tokens, &lines[0], "t.am", &mut errors, true);
    errors.kinds()
}

// ----------------------------------------------------------------------------
// Instructions

#[test]
fn two_operand_instruction() {
    let lines = vec!["MAIN: add r3, LIST".to_string()];
    let mut errors = Errors::new();
    let tokens = lex(&lines, "t.am", &mut errors);
    let inst = parse_instruction(&tokens, "t.am", &mut errors, true).unwrap();

    assert!(errors.is_empty());
    assert_eq!(inst.label.unwrap().lexeme, "MAIN");
    assert_eq!(inst.mnemonic.lexeme, "add");
    assert_eq!(inst.operand_count, 2);

    let rs = inst.rs.unwrap();
    assert_eq!(rs.token.lexeme, "r3");
    assert_eq!(rs.mode, Mode::Register);

    let rt = inst.rt.unwrap();
    assert_eq!(rt.token.lexeme, "LIST");
    assert_eq!(rt.mode, Mode::Direct);

    // Header word plus one extra for the symbol reference.
    assert_eq!(inst.word_count, 2);
}

#[test]
fn single_operand_uses_destination_slot() {
    let lines = vec!["bne &END".to_string()];
    let mut errors = Errors::new();
    let tokens = lex(&lines, "t.am", &mut errors);
    let inst = parse_instruction(&tokens, "t.am", &mut errors, true).unwrap();

    assert!(errors.is_empty());
    assert!(inst.rs.is_none());
    let rt = inst.rt.unwrap();
    assert_eq!(rt.token.lexeme, "END");
    assert_eq!(rt.mode, Mode::Relative);
    assert_eq!(inst.word_count, 2);
}

#[test]
fn ampersand_applies_to_one_operand_only() {
    let lines = vec!["mov &A, B".to_string()];
    let mut errors = Errors::new();
    let tokens = lex(&lines, "t.am", &mut errors);
    let inst = parse_instruction(&tokens, "t.am", &mut errors, true).unwrap();

    assert_eq!(inst.rs.unwrap().mode, Mode::Relative);
    assert_eq!(inst.rt.unwrap().mode, Mode::Direct);
}

#[test]
fn no_operand_instruction() {
    let lines = vec!["stop".to_string()];
    let mut errors = Errors::new();
    let tokens = lex(&lines, "t.am", &mut errors);
    let inst = parse_instruction(&tokens, "t.am", &mut errors, true).unwrap();

    assert!(errors.is_empty());
    assert!(inst.rs.is_none() && inst.rt.is_none());
    assert_eq!(inst.word_count, 1);
}

#[test]
fn register_operands_share_the_header_word() {
    let lines = vec!["mov r1, r2".to_string()];
    let mut errors = Errors::new();
    let tokens = lex(&lines, "t.am", &mut errors);
    let inst = parse_instruction(&tokens, "t.am", &mut errors, true).unwrap();
    assert!(errors.is_empty());
    assert_eq!(inst.word_count, 1);
}

#[test]
fn missing_colon_after_label() {
    assert!(inst_kinds("MAIN add r3, LIST").contains(&ErrorKind::LabelMissingColon));
}

#[test]
fn wrong_operand_count() {
    assert!(inst_kinds("mov r1").contains(&ErrorKind::WrongOperandCount));
    assert!(inst_kinds("stop r1").contains(&ErrorKind::WrongOperandCount));
}

#[test]
fn bad_addressing_modes() {
    // mov cannot take an immediate destination
    assert!(inst_kinds("mov r1, #5").contains(&ErrorKind::BadAddressingMode));
    // lea requires a direct source
    assert!(inst_kinds("lea r1, r2").contains(&ErrorKind::BadAddressingMode));
    // jmp cannot jump to a register
    assert!(inst_kinds("jmp r3").contains(&ErrorKind::BadAddressingMode));
    // cmp accepts immediates on both sides
    assert!(inst_kinds("cmp #1, #2").is_empty());
}

#[test]
fn comma_count_is_checked() {
    assert!(inst_kinds("mov r1 r2").contains(&ErrorKind::InstIllegalNumComma));
    assert!(inst_kinds("mov r1,, r2").contains(&ErrorKind::InstIllegalNumComma));
    assert!(inst_kinds("mov , r1, r2").contains(&ErrorKind::InstIllegalComma));
}

#[test]
fn immediate_bounds() {
    assert!(inst_kinds("cmp #1048575, r1").is_empty());
    assert!(inst_kinds("cmp #1048576, r1").contains(&ErrorKind::ImmOutOfBounds));
    assert!(inst_kinds("cmp #-1048576, r1").is_empty());
    assert!(inst_kinds("cmp #-1048577, r1").contains(&ErrorKind::ImmOutOfBounds));
    assert!(inst_kinds("cmp #five, r1").contains(&ErrorKind::InvalidImm));
}

// ----------------------------------------------------------------------------
// Directives

#[test]
fn data_directive() {
    let lines = vec!["LIST: .data 6, -9, +17".to_string()];
    let mut errors = Errors::new();
    let tokens = lex(&lines, "t.am", &mut errors);
    let dir = parse_directive(&tokens, &lines[0], "t.am", &mut errors, true).unwrap();

    assert!(errors.is_empty());
    assert_eq!(dir.kind, Directive::Data);
    assert_eq!(dir.label.unwrap().lexeme, "LIST");
    assert_eq!(dir.values, [6, -9, 17]);
    assert_eq!(dir.word_count, 3);
}

#[test]
fn string_directive() {
    let lines = vec![r#"K: .string "abcd""#.to_string()];
    let mut errors = Errors::new();
    let tokens = lex(&lines, "t.am", &mut errors);
    let dir = parse_directive(&tokens, &lines[0], "t.am", &mut errors, true).unwrap();

    assert!(errors.is_empty());
    assert_eq!(dir.kind, Directive::String);
    assert_eq!(dir.literal, Some("abcd"));
    // One word per character plus the terminator.
    assert_eq!(dir.word_count, 5);
}

#[test]
fn string_keeps_interior_spaces() {
    let lines = vec![r#".string "ab cd""#.to_string()];
    let mut errors = Errors::new();
    let tokens = lex(&lines, "t.am", &mut errors);
    let dir = parse_directive(&tokens, &lines[0], "t.am", &mut errors, true).unwrap();
    assert_eq!(dir.literal, Some("ab cd"));
    assert_eq!(dir.word_count, 6);
}

#[test]
fn entry_and_extern_names() {
    let lines = vec![".entry LIST".to_string()];
    let mut errors = Errors::new();
    let tokens = lex(&lines, "t.am", &mut errors);
    let dir = parse_directive(&tokens, &lines[0], "t.am", &mut errors, true).unwrap();
    assert_eq!(dir.kind, Directive::Entry);
    assert_eq!(dir.name.unwrap().lexeme, "LIST");
    assert_eq!(dir.word_count, 0);
}

#[test]
fn data_comma_defects() {
    assert!(dir_kinds(".data 6, -9, +17, , 12").contains(&ErrorKind::MultiComma));
    assert!(dir_kinds(".data , 5").contains(&ErrorKind::DataIllegalComma));
    assert!(dir_kinds(".data 5, 6,").contains(&ErrorKind::DataIllegalComma));
    assert!(dir_kinds(".data 5 6").contains(&ErrorKind::DataIllegalComma));
    assert!(dir_kinds(".data 5, 6").is_empty());
}

#[test]
fn data_value_bounds() {
    assert!(dir_kinds(".data 16777216").contains(&ErrorKind::ImmOutOfBounds));
    assert!(dir_kinds(".data -16777217").contains(&ErrorKind::ImmOutOfBounds));
    assert!(dir_kinds(".data 1048575, -1048576").is_empty());
}

#[test]
fn string_defects() {
    assert!(dir_kinds(".string abcd").contains(&ErrorKind::StrMissingQuote));
    assert!(dir_kinds(".string , \"x\"").contains(&ErrorKind::StrIllegalComma));
    assert!(dir_kinds("L: string \"x\"").contains(&ErrorKind::DirDotMissing));
}

#[test]
fn dot_classification_survives_label() {
    let lines = vec!["L: .data 4".to_string()];
    let mut errors = Errors::new();
    let tokens = lex(&lines, "t.am", &mut errors);
    assert_eq!(tokens[2].kind, TokenKind::Dot);
    assert!(parse_directive(&tokens, &lines[0], "t.am", &mut errors, true).is_some());
}
