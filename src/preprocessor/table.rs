use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::reserved::strip;

/// What a macro stands for, decided by the first character of its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// `$NAME`
    Register,
    /// `.NAME`
    Directive,
    /// `@NAME`
    Address,
    /// `!NAME`, substituted without any checks.
    Raw,
    /// `NAME`
    Immediate,
}

impl Category {
    pub fn of(name: &str) -> Category {
        match name.chars().next() {
            Some('$') => Category::Register,
            Some('.') => Category::Directive,
            Some('@') => Category::Address,
            Some('!') => Category::Raw,
            _ => Category::Immediate,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Register => write!(f, "register"),
            Category::Directive => write!(f, "directive"),
            Category::Address => write!(f, "address"),
            Category::Raw => write!(f, "raw"),
            Category::Immediate => write!(f, "immediate"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Macro {
    name: String,
    value: String,
}

impl Macro {
    pub fn new<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        Macro {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn category(&self) -> Category {
        Category::of(&self.name)
    }
}

/// The live macros, plus an index of their stripped names for similarity hints.
#[derive(Debug, Default)]
pub(crate) struct MacroTable {
    live: HashMap<String, Macro>,
    stripped: HashMap<String, Vec<String>>,
}

impl MacroTable {
    pub fn get(&self, name: &str) -> Option<&Macro> {
        self.live.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.live.contains_key(name)
    }

    /// Returns `false`, leaving the table untouched, if the name is already live.
    pub fn insert(&mut self, mac: Macro) -> bool {
        if self.live.contains_key(&mac.name) {
            return false;
        }

        self.stripped
            .entry(strip(&mac.name))
            .or_default()
            .push(mac.name.clone());
        self.live.insert(mac.name.clone(), mac);

        true
    }

    pub fn remove(&mut self, name: &str) -> Option<Macro> {
        let mac = self.live.remove(name)?;

        let stripped = strip(name);
        if let Some(names) = self.stripped.get_mut(&stripped) {
            names.retain(|other| other != name);
            if names.is_empty() {
                self.stripped.remove(&stripped);
            }
        }

        Some(mac)
    }

    /// Live macro names sharing the stripped form `stripped`.
    pub fn similar(&self, stripped: &str) -> &[String] {
        match self.stripped.get(stripped) {
            Some(names) => names,
            None => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }
}

/// Labels seen so far, in the order they were declared.
#[derive(Debug, Default)]
pub(crate) struct LabelSet {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl LabelSet {
    pub fn insert(&mut self, label: &str) {
        if self.seen.insert(label.to_owned()) {
            self.order.push(label.to_owned());
        }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.seen.contains(label)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.order
    }
}

/// Scoped macros waiting for their closing label.
#[derive(Debug, Default)]
pub(crate) struct Watchlist {
    pending: Vec<(String, Vec<String>)>,
}

impl Watchlist {
    pub fn watch(&mut self, label: &str, name: &str) {
        match self.pending.iter_mut().find(|(pending, _)| pending == label) {
            Some((_, names)) => names.push(name.to_owned()),
            None => self.pending.push((label.to_owned(), vec![name.to_owned()])),
        }
    }

    /// Removes the entry for `label`, returning the macros it was holding.
    pub fn resolve(&mut self, label: &str) -> Vec<String> {
        match self.pending.iter().position(|(pending, _)| pending == label) {
            Some(index) => self.pending.remove(index).1,
            None => Vec::new(),
        }
    }

    /// `(label, macro)` pairs still unresolved, in declaration order.
    pub fn pending(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.pending.iter().flat_map(|(label, names)| {
            names
                .iter()
                .map(move |name| (label.as_str(), name.as_str()))
        })
    }
}
