//! Low-level binary access for class-file bytes.
//!
//! Class files arrive as in-memory byte arrays handed over by the compiler pipeline, so there is
//! no backend abstraction here: just the big-endian primitives in [`crate::file::io`] and the
//! bounds-checked cursor in [`crate::file::parser`].

pub mod io;
pub mod parser;
