use arch::word::Word;
use indexmap::IndexMap;

/// Address instructions start at.
pub const INITIAL_IC: u32 = 100;

// ----------------------------------------------------------------------------
// Symbol

/// A named address. The name borrows from the preprocessed line storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol<'a> {
    pub name: &'a str,
    pub address: u32,
    pub external: bool,
    pub entry: bool,
}

/// Symbol table with insertion-ordered iteration, so resolved entry and
/// external lists come out in source order.
#[derive(Debug, Default)]
pub struct SymbolTable<'a>(IndexMap<&'a str, Symbol<'a>>);

impl<'a> SymbolTable<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: Symbol<'a>) -> Option<Symbol<'a>> {
        self.0.insert(symbol.name, symbol)
    }

    pub fn get(&self, name: &str) -> Option<&Symbol<'a>> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol<'a>> {
        self.0.values()
    }
}

// ----------------------------------------------------------------------------
// Context

/// Per-file assembly state. Built empty before the first pass and dropped
/// when the file is done; nothing crosses file boundaries.
#[derive(Debug, Default)]
pub struct Context<'a> {
    pub symbols: SymbolTable<'a>,
    /// Instruction words, in emission order.
    pub code_img: Vec<Word>,
    /// `.data`/`.string` words, in emission order.
    pub data_img: Vec<Word>,
    /// Entries resolved against the symbol table during the second pass.
    pub entries: Vec<Symbol<'a>>,
    /// One record per use site of an external symbol; `address` is where
    /// the reference word was emitted.
    pub externals: Vec<Symbol<'a>>,
    /// Names declared by `.entry`, pending resolution.
    pub entry_names: Vec<&'a str>,
    /// Names declared by `.extern`.
    pub extern_names: Vec<&'a str>,
    /// Instruction counter. Advances over data words too; DC only feeds
    /// the object header.
    pub ic: u32,
    pub dc: u32,
}

impl<'a> Context<'a> {
    pub fn new() -> Self {
        Self {
            ic: INITIAL_IC,
            ..Self::default()
        }
    }

    pub fn is_entry_name(&self, name: &str) -> bool {
        self.entry_names.contains(&name)
    }

    pub fn is_extern_name(&self, name: &str) -> bool {
        self.extern_names.contains(&name)
    }

    /// Sizes reported in the object header.
    pub fn code_size(&self) -> u32 {
        self.ic - INITIAL_IC - self.dc
    }

    pub fn data_size(&self) -> u32 {
        self.dc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_keeps_insertion_order() {
        let mut table = SymbolTable::new();
        for name in ["zeta", "alpha", "mid"] {
            table.insert(Symbol {
                name,
                address: 0,
                external: false,
                entry: false,
            });
        }
        let names: Vec<_> = table.iter().map(|s| s.name).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn header_sizes() {
        let mut ctx = Context::new();
        ctx.ic = 100 + 7 + 5;
        ctx.dc = 5;
        assert_eq!(ctx.code_size(), 7);
        assert_eq!(ctx.data_size(), 5);
    }
}
