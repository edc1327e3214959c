//! Line-numbered diagnostics and the sinks they are reported to.
//!
//! Every check the preprocessor runs produces a [`Diagnostic`] when it fails.
//! Whether that diagnostic aborts the run depends on its [`Severity`] and on
//! the preprocessor's keep-going setting, see [`Severity::aborts`].

use std::fmt;

use colored::Colorize;
use once_cell::sync::OnceCell;

/// How much the default [`Stderr`] sink prints.
///
/// Set once by the binary from its `-v`/`-q` flags.
/// Library users that never set it get [`Verbosity::Warning`].
pub static VERBOSITY: OnceCell<Verbosity> = OnceCell::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Verbosity {
    Quiet,
    Error,
    Warning,
}

impl Verbosity {
    pub fn from_level(level: Option<log::Level>) -> Verbosity {
        match level {
            None => Verbosity::Quiet,
            Some(log::Level::Error) => Verbosity::Error,
            Some(_) => Verbosity::Warning,
        }
    }

    fn current() -> Verbosity {
        *VERBOSITY.get_or_init(|| Verbosity::Warning)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Style or likely-mistake hints. Never aborts.
    Warning,
    /// Invalid input. Aborts unless the run keeps going past errors.
    Error,
    /// Input the preprocessor can't make sense of at all. Always aborts.
    Critical,
}

impl Severity {
    pub fn aborts(self, keep_going: bool) -> bool {
        match self {
            Severity::Warning => false,
            Severity::Error => !keep_going,
            Severity::Critical => true,
        }
    }

    fn visible(self, verbosity: Verbosity) -> bool {
        match self {
            Severity::Warning => verbosity >= Verbosity::Warning,
            Severity::Error | Severity::Critical => verbosity >= Verbosity::Error,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "{}", "warning".yellow().bold()),
            Severity::Error => write!(f, "{}", "error".red().bold()),
            Severity::Critical => write!(f, "{}", "critical".bright_red().bold()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    severity: Severity,
    line: Option<usize>,
    message: String,
    help: Option<String>,
}

impl Diagnostic {
    pub fn new<S: Into<String>>(severity: Severity, message: S) -> Self {
        Diagnostic {
            severity,
            line: None,
            message: message.into(),
            help: None,
        }
    }

    pub fn warning<S: Into<String>>(message: S) -> Self {
        Diagnostic::new(Severity::Warning, message)
    }

    pub fn error<S: Into<String>>(message: S) -> Self {
        Diagnostic::new(Severity::Error, message)
    }

    pub fn critical<S: Into<String>>(message: S) -> Self {
        Diagnostic::new(Severity::Critical, message)
    }

    /// Attaches the 1-based source line the diagnostic refers to.
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_help<S: Into<String>>(mut self, help: S) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn line(&self) -> Option<usize> {
        self.line
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Prints to stderr if the global [`VERBOSITY`] allows it.
    pub fn emit(&self) {
        if self.severity.visible(Verbosity::current()) {
            self.force_emit();
        }
    }

    pub fn force_emit(&self) {
        eprintln!("{self}");
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.severity)?;
        if let Some(line) = self.line {
            write!(f, "{} ", format!("line {line}:").blue().bold())?;
        }
        write!(f, "{}", self.message.bold())?;

        if let Some(help) = &self.help {
            for line in help.lines() {
                write!(f, "\n  {} {line}", "= help:".cyan().bold())?;
            }
        }

        Ok(())
    }
}

/// Receives each diagnostic as soon as the preprocessor reports it.
pub trait Sink {
    fn report(&mut self, diagnostic: &Diagnostic);
}

impl<F: FnMut(&Diagnostic)> Sink for F {
    fn report(&mut self, diagnostic: &Diagnostic) {
        self(diagnostic)
    }
}

/// The default sink: prints to stderr, filtered by [`VERBOSITY`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Stderr;

impl Sink for Stderr {
    fn report(&mut self, diagnostic: &Diagnostic) {
        diagnostic.emit();
    }
}

#[macro_export]
macro_rules! warning {
    ($($arg:tt)*) => {
        $crate::diagnostic::Diagnostic::warning(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::diagnostic::Diagnostic::error(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! critical {
    ($($arg:tt)*) => {
        $crate::diagnostic::Diagnostic::critical(format!($($arg)*))
    };
}
