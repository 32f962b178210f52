//! Pipeline stages for turning a model reply into a validated value.
//!
//! Each submodule implements exactly one transformation step and is a pure
//! function of its input, so every stage is independently testable and the
//! whole pipeline is safe to call from any number of tasks at once.
//!
//! ## Data Flow
//!
//! ```text
//! fence ──▶ parse ──▶ validate ──▶ normalize
//! (strip)   (strict / sanitize / braces)  (descriptor)  (defaults)
//! ```
//!
//! 1. [`fence`]: pull the body out of a ```` ```json ```` block, if any
//! 2. [`parse`]: strict parse, then [`sanitize`]d parse, then the
//!    brace-boundary slice of the raw reply
//! 3. [`validate`]: check required fields against a static descriptor,
//!    collecting every violation
//! 4. [`normalize`]: fill defaults and fallback links on the typed result

pub mod fence;
pub mod normalize;
pub mod parse;
pub mod sanitize;
pub mod validate;
