use std::sync::RwLock;

use hashbrown::HashMap;
use once_cell::sync::Lazy;

static SYMBOL_TABLE: Lazy<SymbolTable> = Lazy::new(Default::default);

#[derive(Debug, Default)]
struct SymbolTable {
    inner: RwLock<SymbolTableInner>,
}

#[derive(Debug, Default)]
struct SymbolTableInner {
    strings: Vec<&'static str>,
    indices: HashMap<&'static str, u32>,
}

impl SymbolTable {
    fn resolve(&self, index: u32) -> Option<&'static str> {
        let inner = self.inner.read().unwrap();

        inner.strings.get(index as usize).copied()
    }

    fn intern(&self, string: &str) -> u32 {
        {
            let inner = self.inner.read().unwrap();

            if let Some(&index) = inner.indices.get(string) {
                return index;
            }
        }

        let mut inner = self.inner.write().unwrap();

        // Re-check under the write lock since another thread may have raced
        // us to the insert
        if let Some(&index) = inner.indices.get(string) {
            return index;
        }

        let leaked: &'static str = Box::leak(string.to_owned().into_boxed_str());
        let index = inner.strings.len() as u32;

        inner.strings.push(leaked);
        inner.indices.insert(leaked, index);

        index
    }
}

/// An index into the global symbol interning table
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u32);

impl Symbol {
    pub fn new(value: &str) -> Self {
        Self(SYMBOL_TABLE.intern(value))
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub fn value(self) -> &'static str {
        SYMBOL_TABLE
            .resolve(self.0)
            .expect("Once a symbol is created, the string it references should never be removed from the table")
    }
}

impl core::fmt::Debug for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Symbol")
            .field(&self.0)
            .field(&self.value())
            .finish()
    }
}

impl core::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.value())
    }
}
