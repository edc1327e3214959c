//! The single pass over the source.
//!
//! A small state machine keeps track of whether the current character is code,
//! part of a string or character literal, or inside a comment. Only code is
//! split into tokens, and every token that names a live macro is swapped for
//! the macro's value as the scan goes.

use std::ops::Range;

use lazy_regex::regex_is_match;

use super::table::{LabelSet, Macro, MacroTable, Watchlist};
use super::{Expansion, PreprocessError};
use crate::diagnostic::{Diagnostic, Sink};
use crate::reserved::ReservedWords;
use crate::{error, warning};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Anything that isn't a string, char or comment.
    Code,
    String,
    /// The character after a `\` in a string.
    StringEscape,
    /// First character inside a char literal.
    Char,
    /// The character after a `\` in a char literal.
    CharSecond,
    /// Where the closing `'` of a char literal should be.
    CharClose,
    Comment,
}

/// A substitutable unit found in the code, and what it was replaced with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    /// Byte range of `text` in the source that was scanned.
    pub span: Range<usize>,
    pub line: usize,
    pub replacement: String,
}

impl Token {
    pub fn is_label(&self) -> bool {
        self.text.ends_with(':')
    }

    pub fn is_expanded(&self) -> bool {
        self.text != self.replacement
    }
}

/// Loose token shape checked while a token grows.
///
/// Digits may start a token here so numbers don't split identifiers apart.
fn is_pseudo_token(candidate: &str) -> bool {
    regex_is_match!(r"^(?:[$.@!]?\w*|\w[\w.]*:)$", candidate)
}

/// Strict token shape: a possibly prefixed identifier, or a label.
fn is_token(text: &str) -> bool {
    regex_is_match!(r"^(?:[$.@!]?[A-Za-z_]\w*|[A-Za-z_][\w.]*:)$", text)
}

/// Everything one run of the preprocessor needs, dropped when the run ends.
pub(super) struct Session<'p> {
    pub(super) reserved: &'p ReservedWords,
    keep_going: bool,
    sink: &'p mut dyn Sink,
    diagnostics: Vec<Diagnostic>,

    source: &'p str,
    output: String,
    /// Everything before this has been copied or substituted into `output`.
    rewritten: usize,
    token_start: usize,
    pub(super) line: usize,

    pub(super) macros: MacroTable,
    pub(super) labels: LabelSet,
    pub(super) watchlist: Watchlist,
    tokens: Vec<Token>,
}

impl<'p> Session<'p> {
    pub(super) fn new(
        reserved: &'p ReservedWords,
        keep_going: bool,
        sink: &'p mut dyn Sink,
        source: &'p str,
    ) -> Self {
        Session {
            reserved,
            keep_going,
            sink,
            diagnostics: Vec::new(),
            source,
            output: String::with_capacity(source.len()),
            rewritten: 0,
            token_start: 0,
            line: 1,
            macros: MacroTable::default(),
            labels: LabelSet::default(),
            watchlist: Watchlist::default(),
            tokens: Vec::new(),
        }
    }

    /// Attaches the current line to `diagnostic` and reports it, failing if it aborts the run.
    pub(super) fn report(&mut self, diagnostic: Diagnostic) -> Result<(), PreprocessError> {
        let diagnostic = diagnostic.at_line(self.line);
        self.sink.report(&diagnostic);

        let aborts = diagnostic.severity().aborts(self.keep_going);
        self.diagnostics.push(diagnostic);

        if aborts {
            Err(PreprocessError::new(std::mem::take(&mut self.diagnostics)))
        } else {
            Ok(())
        }
    }

    /// Reports the diagnostic built by `otherwise` unless `holds`.
    ///
    /// Returns whether the condition held.
    pub(super) fn ensure<F>(&mut self, holds: bool, otherwise: F) -> Result<bool, PreprocessError>
    where
        F: FnOnce() -> Diagnostic,
    {
        if !holds {
            self.report(otherwise())?;
        }

        Ok(holds)
    }

    /// Returns `false` if a macro with the same name is already live.
    pub(super) fn define(&mut self, mac: Macro) -> bool {
        log::debug!(
            "line {}: defined {} macro `{}` as `{}`",
            self.line,
            mac.category(),
            mac.name(),
            mac.value()
        );
        self.macros.insert(mac)
    }

    pub(super) fn run(mut self) -> Result<Expansion, PreprocessError> {
        let source = self.source;
        let mut state = State::Code;

        for (i, c) in source.char_indices() {
            state = match state {
                State::Code => {
                    if !is_pseudo_token(&source[self.token_start..i + c.len_utf8()]) {
                        self.finish_token(i)?;
                    }

                    match c {
                        '"' => State::String,
                        '#' => {
                            let end = source[i..].find('\n').map_or(source.len(), |n| i + n);
                            self.directive(&source[i..end])?;
                            State::Comment
                        }
                        '\'' => State::Char,
                        _ => State::Code,
                    }
                }
                State::String => match c {
                    '"' => State::Code,
                    '\\' => State::StringEscape,
                    _ => State::String,
                },
                State::StringEscape => State::String,
                State::Char => match c {
                    '\\' => State::CharSecond,
                    _ => State::CharClose,
                },
                State::CharSecond => State::CharClose,
                State::CharClose => match c {
                    '\'' => State::Code,
                    _ => {
                        self.report(warning!(
                            "expected closing single quote, got {c:?}, ignoring the rest of the line"
                        ))?;

                        if c == '\n' {
                            State::Code
                        } else {
                            State::Comment
                        }
                    }
                },
                State::Comment => match c {
                    '\n' => State::Code,
                    _ => State::Comment,
                },
            };

            if c == '\n' {
                self.line += 1;
            }
        }

        if self.token_start < source.len() {
            self.finish_token(source.len())?;
        }
        self.output.push_str(&source[self.rewritten..]);

        let unclosed = self
            .watchlist
            .pending()
            .map(|(label, name)| {
                warning!(
                    "the scoped macro '{name}' wasn't closed because its finishing label '{label}' was never seen"
                )
                .with_help("check that the label exists and is spelled correctly")
            })
            .collect::<Vec<Diagnostic>>();
        for diagnostic in unclosed {
            self.report(diagnostic)?;
        }

        log::debug!(
            "finished after {} line(s): {} token(s), {} macro(s) still live",
            self.line,
            self.tokens.len(),
            self.macros.len()
        );

        Ok(Expansion {
            output: self.output,
            tokens: self.tokens,
            labels: self.labels.into_vec(),
            diagnostics: self.diagnostics,
        })
    }

    /// Ends the token that started at `token_start` just before `end`.
    fn finish_token(&mut self, end: usize) -> Result<(), PreprocessError> {
        let source = self.source;
        let text = &source[self.token_start..end];

        if is_token(text) {
            if let Some(label) = text.strip_suffix(':') {
                self.declare_label(label)?;
            }

            let replacement = match self.macros.get(text) {
                Some(mac) => {
                    log::trace!("line {}: `{text}` -> `{}`", self.line, mac.value());
                    mac.value().to_owned()
                }
                None => text.to_owned(),
            };

            self.output.push_str(&source[self.rewritten..self.token_start]);
            self.output.push_str(&replacement);
            self.tokens.push(Token {
                text: text.to_owned(),
                span: self.token_start..end,
                line: self.line,
                replacement,
            });
            self.rewritten = end;
        }

        self.token_start = end;
        Ok(())
    }

    fn declare_label(&mut self, label: &str) -> Result<(), PreprocessError> {
        let taken = self.macros.contains(label);
        self.ensure(!taken, || {
            error!("label name '{label}' conflicts with an existing macro")
        })?;
        // Recorded even when refused, later scopes must still see it as passed.
        self.labels.insert(label);

        for name in self.watchlist.resolve(label) {
            self.macros.remove(&name);
            log::debug!(
                "line {}: scoped macro `{name}` undefined at label `{label}`",
                self.line
            );
        }

        Ok(())
    }
}
