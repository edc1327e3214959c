//! MIPS registers, directives and instruction mnemonics that macro names must
//! not shadow.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::Deserialize;
use thiserror::Error;

const RESERVED_WORDS: &str = include_str!("../resources/reserved_words.json");

static BUILTIN: Lazy<Arc<ReservedWords>> = Lazy::new(|| {
    // The bundled list is checked by `tests::builtin_loads`.
    Arc::new(ReservedWords::from_json(RESERVED_WORDS).expect("bundled reserved word list is valid"))
});

#[derive(Debug, Error)]
pub enum ReservedError {
    #[error("malformed reserved word list: {0}")]
    Json(#[from] serde_json::Error),
    #[error("`{word}` is listed as both a {first} and a {second}")]
    Overlap {
        word: String,
        first: Kind,
        second: Kind,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Register,
    Directive,
    Instruction,
}

impl Kind {
    /// Guesses the kind of reserved word `name` would collide with from its prefix.
    pub fn of_name(name: &str) -> Kind {
        match name.chars().next() {
            Some('$') => Kind::Register,
            Some('.') => Kind::Directive,
            _ => Kind::Instruction,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Register => write!(f, "register"),
            Kind::Directive => write!(f, "directive"),
            Kind::Instruction => write!(f, "instruction"),
        }
    }
}

#[derive(Deserialize)]
struct Lists {
    registers: Vec<String>,
    directives: Vec<String>,
    instructions: Vec<String>,
}

/// Removes any leading `$ . @ !` and lowercases, e.g. `$SP` -> `sp`.
pub fn strip(name: &str) -> String {
    name.trim_start_matches(['$', '.', '@', '!']).to_lowercase()
}

/// The immutable reserved word table.
///
/// Build one per process and share it between preprocessors with an [`Arc`].
#[derive(Debug, Clone)]
pub struct ReservedWords {
    registers: HashSet<String>,
    directives: HashSet<String>,
    instructions: HashSet<String>,
    stripped: HashMap<String, (String, Kind)>,
}

impl ReservedWords {
    /// The MIPS word list bundled with the crate.
    pub fn builtin() -> Arc<ReservedWords> {
        Arc::clone(&BUILTIN)
    }

    /// Parses `{ "registers": [..], "directives": [..], "instructions": [..] }`.
    pub fn from_json(json: &str) -> Result<ReservedWords, ReservedError> {
        let lists: Lists = serde_json::from_str(json)?;

        let mut words = ReservedWords {
            registers: HashSet::new(),
            directives: HashSet::new(),
            instructions: HashSet::new(),
            stripped: HashMap::new(),
        };

        for (kind, list) in [
            (Kind::Register, lists.registers),
            (Kind::Directive, lists.directives),
            (Kind::Instruction, lists.instructions),
        ] {
            for word in list {
                words.insert(word.to_lowercase(), kind)?;
            }
        }

        Ok(words)
    }

    fn insert(&mut self, word: String, kind: Kind) -> Result<(), ReservedError> {
        if let Some(first) = self.kind_of(&word) {
            if first != kind {
                return Err(ReservedError::Overlap {
                    word,
                    first,
                    second: kind,
                });
            }
        }

        self.stripped
            .entry(strip(&word))
            .or_insert_with(|| (word.clone(), kind));

        match kind {
            Kind::Register => self.registers.insert(word),
            Kind::Directive => self.directives.insert(word),
            Kind::Instruction => self.instructions.insert(word),
        };

        Ok(())
    }

    pub fn kind_of(&self, word: &str) -> Option<Kind> {
        if self.registers.contains(word) {
            Some(Kind::Register)
        } else if self.directives.contains(word) {
            Some(Kind::Directive)
        } else if self.instructions.contains(word) {
            Some(Kind::Instruction)
        } else {
            None
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.kind_of(word).is_some()
    }

    pub fn is_register(&self, word: &str) -> bool {
        self.registers.contains(word)
    }

    pub fn is_directive(&self, word: &str) -> bool {
        self.directives.contains(word)
    }

    /// Looks up a reserved word by its stripped form (see [`strip`]).
    pub fn similar(&self, stripped: &str) -> Option<(&str, Kind)> {
        self.stripped
            .get(stripped)
            .map(|(word, kind)| (word.as_str(), *kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_loads() {
        let words = ReservedWords::builtin();

        assert!(words.is_register("$sp"));
        assert!(words.is_register("$t9"));
        assert!(!words.is_register("$t10"));
        assert!(words.is_directive(".asciiz"));
        assert_eq!(words.kind_of("addiu"), Some(Kind::Instruction));
        assert_eq!(words.kind_of("syscall"), Some(Kind::Instruction));
        assert_eq!(words.kind_of(".globl"), Some(Kind::Directive));
        assert_eq!(words.kind_of("label"), None);
    }

    #[test]
    fn stripping() {
        assert_eq!(strip("$SP"), "sp");
        assert_eq!(strip("@!Mixed_Case"), "mixed_case");
        assert_eq!(strip("PLAIN"), "plain");

        let words = ReservedWords::builtin();
        assert_eq!(words.similar("sp"), Some(("$sp", Kind::Register)));
        assert_eq!(words.similar("word"), Some((".word", Kind::Directive)));
        assert_eq!(words.similar("add"), Some(("add", Kind::Instruction)));
        assert_eq!(words.similar("nothing"), None);
    }

    #[test]
    fn custom_table() {
        let words = ReservedWords::from_json(
            r#"{ "registers": ["$R0"], "directives": [".org"], "instructions": ["nop"] }"#,
        )
        .unwrap();

        assert!(words.is_register("$r0"));
        assert!(words.contains(".org"));
        assert!(!words.contains("add"));
    }

    #[test]
    fn overlapping_lists() {
        let err = ReservedWords::from_json(
            r#"{ "registers": ["nop"], "directives": [], "instructions": ["nop"] }"#,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ReservedError::Overlap {
                first: Kind::Register,
                second: Kind::Instruction,
                ..
            }
        ));
    }

    #[test]
    fn malformed_json() {
        let err = ReservedWords::from_json(r#"{ "registers": [] }"#).unwrap_err();
        assert!(matches!(err, ReservedError::Json(_)));
    }

    #[test]
    fn kind_from_prefix() {
        assert_eq!(Kind::of_name("$sp"), Kind::Register);
        assert_eq!(Kind::of_name(".data"), Kind::Directive);
        assert_eq!(Kind::of_name("@addr"), Kind::Instruction);
        assert_eq!(Kind::of_name("add"), Kind::Instruction);
    }
}
