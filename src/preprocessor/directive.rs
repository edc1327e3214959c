//! `#define` and `#defineuntil` comments.

use lazy_regex::regex_is_match;

use super::scan::Session;
use super::table::Macro;
use super::PreprocessError;
use crate::diagnostic::Diagnostic;
use crate::{critical, error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Directive<'a> {
    /// `#define <name> <value>`
    Define { name: &'a str, value: &'a str },
    /// `#defineuntil <label> <name> <value>`
    DefineUntil {
        label: &'a str,
        name: &'a str,
        value: &'a str,
    },
}

impl<'a> Directive<'a> {
    /// Parses a comment, from its `#` up to the end of the line.
    ///
    /// Returns `Ok(None)` for ordinary comments.
    pub fn parse(comment: &'a str) -> Result<Option<Directive<'a>>, Diagnostic> {
        if comment.starts_with("#define ") {
            let [_, name, value] = split_fields::<3>(comment).ok_or_else(|| {
                critical!("macro '{comment}' failed to parse, check that it has a name and value")
                    .with_help("the correct format is #define <name> <value>")
            })?;

            Ok(Some(Directive::Define {
                name,
                value: value.trim(),
            }))
        } else if comment.starts_with("#defineuntil ") {
            let [_, label, name, value] = split_fields::<4>(comment).ok_or_else(|| {
                critical!(
                    "macro '{comment}' failed to parse, check that it has a label, name and value"
                )
                .with_help("the correct format is #defineuntil <label> <name> <value>")
            })?;

            Ok(Some(Directive::DefineUntil {
                label,
                name,
                value: value.trim(),
            }))
        } else {
            Ok(None)
        }
    }
}

/// Splits off `N - 1` whitespace separated fields, leaving the rest of the
/// line as the last one. `None` if there are fewer than `N` fields.
fn split_fields<const N: usize>(line: &str) -> Option<[&str; N]> {
    let mut fields = [""; N];
    let mut rest = line.trim_start();

    for field in fields.iter_mut().take(N - 1) {
        let end = rest.find(char::is_whitespace)?;
        *field = &rest[..end];
        rest = rest[end..].trim_start();
    }

    if rest.is_empty() {
        return None;
    }
    fields[N - 1] = rest;

    Some(fields)
}

pub(super) fn is_label_name(label: &str) -> bool {
    regex_is_match!(r"^[A-Za-z_][\w.]*$", label)
}

impl Session<'_> {
    /// Handles a comment found by the scanner, registering any macro it defines.
    pub(super) fn directive(&mut self, comment: &str) -> Result<(), PreprocessError> {
        let directive = match Directive::parse(comment) {
            Ok(Some(directive)) => directive,
            Ok(None) => return Ok(()),
            Err(diagnostic) => return self.report(diagnostic),
        };

        match directive {
            Directive::Define { name, value } => {
                if self.check_macro(name, value)? {
                    self.define(Macro::new(name, value));
                }
            }
            Directive::DefineUntil { label, name, value } => {
                let mut valid = self.ensure(is_label_name(label), || {
                    error!("scoped macro label '{label}' is not a valid label name")
                        .with_help("make sure you're not including the ':' used only in the label definition")
                })?;

                let passed = self.labels.contains(label);
                valid &= self.ensure(!passed, || {
                    error!("scoped macro '{comment}' is defined after its finishing label '{label}'")
                })?;

                valid &= self.check_macro(name, value)?;

                if valid && self.define(Macro::new(name, value)) {
                    self.watchlist.watch(label, name);
                    log::debug!(
                        "line {}: `{name}` will be undefined at label `{label}`",
                        self.line
                    );
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Severity;

    #[test]
    fn define() {
        assert_eq!(
            Directive::parse("#define $PTR $t0"),
            Ok(Some(Directive::Define {
                name: "$PTR",
                value: "$t0"
            }))
        );

        assert_eq!(
            Directive::parse("#define   !MOVE   move $t0, $t1  \r"),
            Ok(Some(Directive::Define {
                name: "!MOVE",
                value: "move $t0, $t1"
            }))
        );
    }

    #[test]
    fn define_until() {
        assert_eq!(
            Directive::parse("#defineuntil end_loop I $s0"),
            Ok(Some(Directive::DefineUntil {
                label: "end_loop",
                name: "I",
                value: "$s0"
            }))
        );
    }

    #[test]
    fn ordinary_comments() {
        assert_eq!(Directive::parse("# just a comment"), Ok(None));
        assert_eq!(Directive::parse("#defined elsewhere"), Ok(None));
        assert_eq!(Directive::parse("#define"), Ok(None));
        assert_eq!(Directive::parse("#"), Ok(None));
    }

    #[test]
    fn missing_fields_are_critical() {
        let err = Directive::parse("#define ONLY_NAME").unwrap_err();
        assert_eq!(err.severity(), Severity::Critical);
        assert_eq!(
            err.help(),
            Some("the correct format is #define <name> <value>")
        );

        let err = Directive::parse("#define NAME   ").unwrap_err();
        assert_eq!(err.severity(), Severity::Critical);

        let err = Directive::parse("#defineuntil label NAME").unwrap_err();
        assert_eq!(err.severity(), Severity::Critical);
    }

    #[test]
    fn field_splitting() {
        assert_eq!(split_fields::<3>("a b c d"), Some(["a", "b", "c d"]));
        assert_eq!(split_fields::<3>("  a\tb   c "), Some(["a", "b", "c "]));
        assert_eq!(split_fields::<3>("a b"), None);
        assert_eq!(split_fields::<4>("a b c"), None);
    }

    #[test]
    fn label_names() {
        assert!(is_label_name("main"));
        assert!(is_label_name("_loop.end2"));
        assert!(!is_label_name("end:"));
        assert!(!is_label_name("2fast"));
        assert!(!is_label_name(""));
    }
}
