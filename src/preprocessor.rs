//! Expands `#define` macros in MIPS assembly.
//!
//! Macros are defined in comments, so the source stays valid for assemblers
//! that know nothing about them:
//!
//! ```text
//! #define $PTR $t0
//! #define .STR .asciiz
//! #defineuntil end_loop I $s0
//! ```
//!
//! The prefix of a macro name decides what its value has to look like:
//! `$` registers, `.` directives, `@` addresses, `!` anything at all, and no
//! prefix for immediates. A `#defineuntil` macro is undefined as soon as its
//! label is declared.

mod check;
mod directive;
mod scan;
mod table;

pub use scan::Token;
pub use table::{Category, Macro};

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::diagnostic::{Diagnostic, Severity, Sink, Stderr};
use crate::reserved::ReservedWords;
use scan::Session;

/// A run was aborted by an error (or critical) diagnostic.
///
/// Carries every diagnostic reported before the abort, the last one being the
/// reason for it.
#[derive(Debug, Error)]
#[error("preprocessing failed due to previous errors")]
pub struct PreprocessError {
    diagnostics: Vec<Diagnostic>,
}

impl PreprocessError {
    fn new(diagnostics: Vec<Diagnostic>) -> Self {
        PreprocessError { diagnostics }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// The diagnostic that aborted the run.
    pub fn cause(&self) -> Option<&Diagnostic> {
        self.diagnostics.last()
    }
}

/// The result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub output: String,
    pub tokens: Vec<Token>,
    /// Labels in the order they were declared.
    pub labels: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct Preprocessor {
    reserved: Arc<ReservedWords>,
    keep_going: bool,
    sink: Box<dyn Sink + Send>,
    diagnostics: Vec<Diagnostic>,
}

impl Preprocessor {
    pub fn new(reserved: Arc<ReservedWords>) -> Self {
        Preprocessor {
            reserved,
            keep_going: false,
            sink: Box::new(Stderr),
            diagnostics: Vec::new(),
        }
    }

    /// Whether errors are reported without aborting the run.
    ///
    /// Critical diagnostics always abort. Output produced past an error is
    /// not guaranteed to make sense.
    pub fn keep_going(mut self, keep_going: bool) -> Self {
        self.keep_going = keep_going;
        self
    }

    /// Replaces the default [`Stderr`] sink.
    pub fn with_sink<S: Sink + Send + 'static>(mut self, sink: S) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Expands every macro in `source`.
    pub fn process(&mut self, source: &str) -> Result<String, PreprocessError> {
        self.expand(source).map(|expansion| expansion.output)
    }

    /// Like [`Preprocessor::process`], but also returns the tokens and labels found.
    pub fn expand(&mut self, source: &str) -> Result<Expansion, PreprocessError> {
        let session = Session::new(&self.reserved, self.keep_going, &mut *self.sink, source);

        match session.run() {
            Ok(expansion) => {
                self.diagnostics = expansion.diagnostics.clone();
                Ok(expansion)
            }
            Err(err) => {
                self.diagnostics = err.diagnostics().to_vec();
                Err(err)
            }
        }
    }

    /// Diagnostics reported by the most recent run.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.severity() == severity)
            .count()
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Preprocessor::new(ReservedWords::builtin())
    }
}

impl fmt::Debug for Preprocessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preprocessor")
            .field("keep_going", &self.keep_going)
            .field("diagnostics", &self.diagnostics)
            .finish_non_exhaustive()
    }
}
