use crate::mode::Mode;

use once_cell::sync::Lazy;
use std::collections::HashMap;
use strum::EnumString;

// ----------------------------------------------------------------------------
// Instruction table

/// One row of the instruction table. Mnemonics sharing an opcode are
/// disambiguated by `funct`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstInfo {
    pub name: &'static str,
    pub opcode: u8,
    pub funct: u8,
    pub operands: usize,
    /// Permitted addressing modes for the source slot, as `Mode::mask` bits.
    pub src_modes: u8,
    /// Permitted addressing modes for the destination slot.
    pub dst_modes: u8,
}

const IMM: u8 = 1 << Mode::Immediate as u8;
const DIR: u8 = 1 << Mode::Direct as u8;
const REL: u8 = 1 << Mode::Relative as u8;
const REG: u8 = 1 << Mode::Register as u8;

#[rustfmt::skip]
pub const INSTRUCTION_SET: &[InstInfo] = &[
    InstInfo { name: "mov",  opcode: 0,  funct: 0, operands: 2, src_modes: IMM | DIR | REG, dst_modes: DIR | REG },
    InstInfo { name: "cmp",  opcode: 1,  funct: 0, operands: 2, src_modes: IMM | DIR | REG, dst_modes: IMM | DIR | REG },
    InstInfo { name: "add",  opcode: 2,  funct: 1, operands: 2, src_modes: IMM | DIR | REG, dst_modes: DIR | REG },
    InstInfo { name: "sub",  opcode: 2,  funct: 2, operands: 2, src_modes: IMM | DIR | REG, dst_modes: DIR | REG },
    InstInfo { name: "lea",  opcode: 4,  funct: 0, operands: 2, src_modes: DIR,             dst_modes: DIR | REG },
    InstInfo { name: "clr",  opcode: 5,  funct: 1, operands: 1, src_modes: 0,               dst_modes: DIR | REG },
    InstInfo { name: "not",  opcode: 5,  funct: 2, operands: 1, src_modes: 0,               dst_modes: DIR | REG },
    InstInfo { name: "inc",  opcode: 5,  funct: 3, operands: 1, src_modes: 0,               dst_modes: DIR | REG },
    InstInfo { name: "dec",  opcode: 5,  funct: 4, operands: 1, src_modes: 0,               dst_modes: DIR | REG },
    InstInfo { name: "jmp",  opcode: 9,  funct: 1, operands: 1, src_modes: 0,               dst_modes: DIR | REL },
    InstInfo { name: "bne",  opcode: 9,  funct: 2, operands: 1, src_modes: 0,               dst_modes: DIR | REL },
    InstInfo { name: "jsr",  opcode: 9,  funct: 3, operands: 1, src_modes: 0,               dst_modes: DIR | REL },
    InstInfo { name: "red",  opcode: 12, funct: 0, operands: 1, src_modes: 0,               dst_modes: DIR | REG },
    InstInfo { name: "prn",  opcode: 13, funct: 0, operands: 1, src_modes: 0,               dst_modes: IMM | DIR | REG },
    InstInfo { name: "rts",  opcode: 14, funct: 0, operands: 0, src_modes: 0,               dst_modes: 0 },
    InstInfo { name: "stop", opcode: 15, funct: 0, operands: 0, src_modes: 0,               dst_modes: 0 },
];

static INST_MAP: Lazy<HashMap<&'static str, &'static InstInfo>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for info in INSTRUCTION_SET {
        map.insert(info.name, info);
    }
    map
});

pub fn find_instruction(name: &str) -> Option<&'static InstInfo> {
    INST_MAP.get(name).copied()
}

pub fn is_instruction(name: &str) -> bool {
    INST_MAP.contains_key(name)
}

// ----------------------------------------------------------------------------
// Directives

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Directive {
    Data,
    String,
    Entry,
    Extern,
}

impl Directive {
    pub fn parse(s: &str) -> Option<Self> {
        s.parse::<Self>().ok()
    }
}

pub fn is_directive(name: &str) -> bool {
    Directive::parse(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_complete() {
        assert_eq!(INSTRUCTION_SET.len(), 16);
        for info in INSTRUCTION_SET {
            assert_eq!(find_instruction(info.name), Some(info));
        }
        assert!(find_instruction("nop").is_none());
    }

    #[test]
    fn shared_opcodes_split_by_funct() {
        let add = find_instruction("add").unwrap();
        let sub = find_instruction("sub").unwrap();
        assert_eq!(add.opcode, sub.opcode);
        assert_ne!(add.funct, sub.funct);

        let jmp = find_instruction("jmp").unwrap();
        let jsr = find_instruction("jsr").unwrap();
        assert_eq!(jmp.opcode, 9);
        assert_eq!(jsr.funct, 3);
    }

    #[test]
    fn mode_masks_match_isa() {
        let mov = find_instruction("mov").unwrap();
        assert_ne!(mov.src_modes & Mode::Immediate.mask(), 0);
        assert_eq!(mov.dst_modes & Mode::Immediate.mask(), 0);

        let lea = find_instruction("lea").unwrap();
        assert_eq!(lea.src_modes, Mode::Direct.mask());

        let bne = find_instruction("bne").unwrap();
        assert_ne!(bne.dst_modes & Mode::Relative.mask(), 0);
        assert_eq!(bne.dst_modes & Mode::Register.mask(), 0);

        let stop = find_instruction("stop").unwrap();
        assert_eq!(stop.operands, 0);
    }

    #[test]
    fn directive_names() {
        assert_eq!(Directive::parse("data"), Some(Directive::Data));
        assert_eq!(Directive::parse("string"), Some(Directive::String));
        assert_eq!(Directive::parse("entry"), Some(Directive::Entry));
        assert_eq!(Directive::parse("extern"), Some(Directive::Extern));
        assert_eq!(Directive::parse("word"), None);
    }
}
