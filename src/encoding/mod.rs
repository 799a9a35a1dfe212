//! String-encoding bridge - narrow/wide conversion for interpreter text
//!
//! Design: Callers hand over whichever form they have:
//! - `WideString` for owned native wide text (no interpreter needed)
//! - `EncodedString` / `DecodedString` for locale conversion via the interpreter
//! - `NarrowStr` / `WideStr` facades that convert lazily, at most once

mod facade;
mod locale;
mod wide;

#[cfg(test)]
mod tests;

pub use facade::{NarrowStr, WideStr};
pub use locale::{DecodedString, EncodedString};
pub use wide::{wide_to_string_lossy, WideString};
