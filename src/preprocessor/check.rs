//! Sanity checks run on every macro before it is registered.
//!
//! None of this is real parsing. The checks are deliberately crude pattern
//! matches, which keeps the messages specific to the mistake that was most
//! likely made. They run in a fixed order, and an error stops the remaining
//! checks unless the run keeps going past errors.

use lazy_regex::regex_is_match;

use super::scan::Session;
use super::table::Category;
use super::PreprocessError;
use crate::reserved::{strip, Kind};
use crate::{error, warning};

pub(super) fn is_macro_name(name: &str) -> bool {
    regex_is_match!(r"^[$.@!]?[A-Za-z_]\w*$", name)
}

/// Hex, octal and binary prefixes are accepted with any hex digits after them.
pub(super) fn is_number(value: &str) -> bool {
    regex_is_match!(r"^-?(0[xob])?[0-9a-fA-F]+$", value)
}

/// A number, a label or a single character literal.
pub(super) fn is_immediate(value: &str) -> bool {
    is_number(value)
        || regex_is_match!(r"^[A-Za-z_][\w.]*$", value)
        || regex_is_match!(r"^'\\?.'$", value)
}

/// `$0` through `$31`.
pub(super) fn is_numbered_register(value: &str) -> bool {
    match value.strip_prefix('$') {
        Some(digits) if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) => {
            digits.parse::<u32>().map_or(false, |n| n < 32)
        }
        _ => false,
    }
}

/// Looks for a `"` or `#` that isn't directly after a `'`, so `'#'` is allowed.
pub(super) fn embeds_string_or_comment(value: &str) -> bool {
    let mut previous = None;

    for c in value.chars() {
        if matches!(c, '"' | '#') && previous != Some('\'') {
            return true;
        }
        previous = Some(c);
    }

    false
}

impl Session<'_> {
    /// Runs every check on `name` and `value`.
    ///
    /// Returns `Ok(false)` if an error was reported but the run keeps going,
    /// in which case the macro should not be registered.
    pub(super) fn check_macro(&mut self, name: &str, value: &str) -> Result<bool, PreprocessError> {
        let reserved = self.reserved;

        let mut valid = self.ensure(is_macro_name(name), || {
            error!("macro name '{name}' is not valid").with_help(
                "macro names must have this format:\n\
                 <$ or @ or ! or . or nothing><letter or _><0 or more letters, numbers, and/or _>\n\
                 e.g. $NAME e.g. NAME_1 e.g. _123ABC e.g. @BIG_ARRAY",
            )
        })?;

        self.ensure(!name.chars().any(char::is_lowercase), || {
            warning!("macro name '{name}' is not uppercase, all caps macro names are encouraged")
        })?;

        valid &= self.ensure(!reserved.contains(&name.to_lowercase()), || {
            error!(
                "macro name '{name}' conflicts with a MIPS {} name",
                Kind::of_name(name)
            )
        })?;

        let defined = self.macros.contains(name);
        valid &= self.ensure(!defined, || {
            error!("a macro with name '{name}' is already defined, redefinition of macros is not allowed")
        })?;

        let stripped = strip(name);
        if let Some((word, kind)) = reserved.similar(&stripped) {
            self.report(warning!(
                "macro name '{name}' is similar to the MIPS {kind} '{word}'"
            ))?;
        }

        let similar = self
            .macros
            .similar(&stripped)
            .iter()
            .filter(|other| *other != name)
            .map(|other| format!("'{other}'"))
            .collect::<Vec<String>>();
        if !similar.is_empty() {
            let names = similar.join(", ");
            self.report(warning!(
                "macro name '{name}' is similar to the existing macro(s): {names}"
            ))?;
        }

        let labelled = self.labels.contains(name);
        valid &= self.ensure(!labelled, || {
            error!("macro name '{name}' conflicts with an existing label")
        })?;

        let category = Category::of(name);
        if category == Category::Raw {
            return Ok(valid);
        }

        valid &= self.ensure(!embeds_string_or_comment(value), || {
            error!("non-raw macro value '{value}' contains a string or comment").with_help(
                "comments in macros can break things by commenting out everything after them where they're used\n\
                 if you are trying to define a string you should use the ! prefix for a raw macro e.g. #define !STR_1 \"hello\"",
            )
        })?;

        valid &= match category {
            Category::Register => {
                let register = reserved.is_register(value) || is_numbered_register(value);
                self.ensure(register, || {
                    error!("value '{value}' of register macro is not a valid register")
                })?
            }
            Category::Directive => self.ensure(reserved.is_directive(value), || {
                error!("value '{value}' of directive macro is not a valid directive")
            })?,
            Category::Address => {
                // There are a lot of address formats, so only rule out the obvious mistakes.
                let address = self.ensure(!value.starts_with('$'), || {
                    error!("value '{value}' of address macro looks like a register, did you mean ({value})?")
                })?;
                self.ensure(!is_number(value), || {
                    warning!("value '{value}' of address macro looks like a number, this probably isn't right")
                })?;
                address
            }
            Category::Immediate => self.ensure(is_immediate(value), || {
                error!("immediate macro value '{value}' isn't a valid single immediate").with_help(
                    "if you are trying to define a compound mathematical expression you should use mipsy's built-in syntax e.g. X = 1 + 2\n\
                     because #defines use text substitution, compound immediate macros won't work everywhere you'd expect them to\n\
                     if you *really* know what you're doing you can use the ! prefix to perform a raw substitution with no sanity checking e.g. #define !X 1 + 2",
                )
            })?,
            Category::Raw => true,
        };

        Ok(valid)
    }
}
