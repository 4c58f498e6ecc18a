//! Interning of element and attribute names.
//!
//! Every document keeps a [`NameTable`] that maps name strings like `"svg:g"` or
//! `"inkscape:label"` to small integer [`NameCode`]s.  Two names in the same document are
//! equal exactly when their codes are equal, so comparisons in hot paths are integer
//! comparisons.  Codes are not portable between documents; each document interns on its
//! own.

use std::collections::HashMap;
use std::fmt;
use string_cache::DefaultAtom;

/// Interned code for a name, valid only within the document that produced it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameCode(u32);

impl NameCode {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// An interned name: its code plus the string it stands for.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Name {
    code: NameCode,
    atom: DefaultAtom,
}

impl Name {
    pub fn code(&self) -> NameCode {
        self.code
    }

    pub fn as_str(&self) -> &str {
        &self.atom
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}#{}", self.as_str(), self.code.0)
    }
}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Name {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// Per-document table of interned names.
#[derive(Default)]
pub struct NameTable {
    codes: HashMap<DefaultAtom, NameCode>,
    names: Vec<DefaultAtom>,
}

impl NameTable {
    pub fn new() -> NameTable {
        NameTable::default()
    }

    /// Returns the interned name for `s`, allocating a new code if needed.
    pub fn intern(&mut self, s: &str) -> Name {
        let atom = DefaultAtom::from(s);

        if let Some(&code) = self.codes.get(&atom) {
            return Name { code, atom };
        }

        let code = NameCode(self.names.len() as u32);
        self.names.push(atom.clone());
        self.codes.insert(atom.clone(), code);

        Name { code, atom }
    }

    /// Looks up a name without interning it.
    pub fn find(&self, s: &str) -> Option<Name> {
        let atom = DefaultAtom::from(s);
        self.codes.get(&atom).map(|&code| Name { code, atom })
    }

    pub fn lookup(&self, code: NameCode) -> Option<Name> {
        self.names.get(code.0 as usize).map(|atom| Name {
            code,
            atom: atom.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
