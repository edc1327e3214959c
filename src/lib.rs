//! An opinionated `#define` preprocessor for MIPS assembly.
//!
//! ```
//! use mipsy_macro::Preprocessor;
//!
//! let mut preprocessor = Preprocessor::default();
//! let output = preprocessor
//!     .process("#define $PTR $t0\nlw $v0, ($PTR)\n")
//!     .unwrap();
//!
//! assert_eq!(output, "#define $PTR $t0\nlw $v0, ($t0)\n");
//! ```

pub mod diagnostic;
pub mod preprocessor;
pub mod reserved;

pub use diagnostic::{Diagnostic, Severity, Sink};
pub use preprocessor::{Expansion, PreprocessError, Preprocessor, Token};
pub use reserved::ReservedWords;
