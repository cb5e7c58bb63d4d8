//! Identifier interning for tuple names and labels.
//!
//! Statement names (`A`, `S0`), label tuples (`sync0`) and mapping
//! identifiers are compared constantly by the set algebra, so they are
//! interned once and passed around as a copyable [`Id`].

use string_interner::{StringInterner, DefaultSymbol, backend::StringBackend, Symbol as SymbolTrait};
use serde::{Serialize, Deserialize, Serializer, Deserializer};
use std::fmt;
use std::sync::RwLock;
use once_cell::sync::Lazy;

/// Type alias for our interner backend
type Backend = StringBackend<DefaultSymbol>;

/// Global identifier interner (thread-safe).
static GLOBAL_INTERNER: Lazy<RwLock<StringInterner<Backend>>> =
    Lazy::new(|| RwLock::new(StringInterner::new()));

/// An interned identifier.
///
/// Ordering follows interning order, which is stable for the lifetime of
/// the process.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(u32);

impl Id {
    /// Intern `name` and return its identifier.
    pub fn new(name: &str) -> Self {
        // A poisoned lock only means another thread panicked mid-insert;
        // the interner itself is still consistent.
        let mut interner = GLOBAL_INTERNER
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let sym = interner.get_or_intern(name);
        Id(sym.to_usize() as u32)
    }

    /// Look up an already interned name.
    pub fn get(name: &str) -> Option<Self> {
        let interner = GLOBAL_INTERNER
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        interner.get(name).map(|sym| Id(sym.to_usize() as u32))
    }

    /// The interned name.
    pub fn name(&self) -> String {
        let interner = GLOBAL_INTERNER
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        DefaultSymbol::try_from_usize(self.0 as usize)
            .and_then(|sym| interner.resolve(sym))
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{}", self.0))
    }
}

impl From<&str> for Id {
    fn from(name: &str) -> Self {
        Id::new(name)
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.name())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

// Raw indices are meaningless outside this process, so ids travel by name.
impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name())
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Id::new(&name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interning_is_idempotent() {
        let a = Id::new("stmt_interned");
        let b = Id::new("stmt_interned");
        let c = Id::new("other_interned");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.name(), "stmt_interned");
    }

    #[test]
    fn test_get_without_interning() {
        assert_eq!(Id::get("never_interned_anywhere"), None);
        let id = Id::new("interned_once");
        assert_eq!(Id::get("interned_once"), Some(id));
    }
}
