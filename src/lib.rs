// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # classremap
//!
//! Symbol remapping for JVM class files produced by an embedded compiler.
//!
//! Production builds of a host application ship with obfuscated member names (`m_1234_`,
//! `f_5678_`), while the scripts compiled against it at runtime are written with readable ones.
//! `classremap` sits at the two places where those worlds meet:
//!
//! - When the compiler **reads** names from the runtime's class metadata, obfuscated names are
//!   translated so source code resolves against readable names
//! - When the compiler **writes** a module, every emitted class file has its name references
//!   rewritten through the same table before it reaches the class loader
//!
//! ## Features
//!
//! - **Strict class-file reader** - Full constant-pool decoding and validation, no partial results
//! - **Minimal rewrites** - Only `CONSTANT_Utf8` payloads change; every other byte is copied
//! - **Consistent descriptors** - Class renames propagate into descriptors and generic signatures
//! - **Scoped caching** - Each module compilation owns its artifact cache, cleared on drop
//! - **Parallel** - A module's artifacts are remapped on the rayon thread pool
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use classremap::prelude::*;
//!
//! let symbols = SymbolMap::builder()
//!     .method("m_1234_", "renderTick")
//!     .field("f_5678_", "velocity")
//!     .build()?;
//! let interceptor = CompilationInterceptor::new(Arc::new(symbols), RemapConfig::production());
//!
//! // Name reads from runtime class metadata
//! assert_eq!(interceptor.on_field_name_read("f_5678_"), "velocity");
//!
//! // The module's finalize pass
//! let artifacts = vec![ClassFileArtifact::new("META-INF/main.kotlin_module", vec![0; 4])];
//! let written = interceptor.finalize_module(&artifacts)?;
//! assert_eq!(written, artifacts);
//! # Ok::<(), classremap::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`mapping`] - The immutable [`mapping::SymbolMap`] and its builder
//! - [`classfile`] - Zero-copy class-file reader, modified UTF-8 and descriptor grammar
//! - [`remap`] - The [`remap::BytecodeRemapper`]
//! - [`module`] - Artifact cache and compiler hooks
//! - [`config`] - [`config::RemapConfig`]
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`]; see [`Error`] for the failure modes. A symbol
//! without a mapping is never an error.

#[macro_use]
pub(crate) mod error;
pub(crate) mod file;

/// Shared functionality which is used in unit-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types.
///
/// # Example
///
/// ```rust
/// use classremap::prelude::*;
///
/// let symbols = SymbolMap::empty();
/// let config = RemapConfig::development();
/// let remapper = BytecodeRemapper::new(&symbols, &config);
/// assert_eq!(remapper.remap(&[1, 2, 3])?, vec![1, 2, 3]);
/// # Ok::<(), classremap::Error>(())
/// ```
pub mod prelude;

pub mod classfile;
pub mod config;
pub mod mapping;
pub mod module;
pub mod remap;

/// `classremap` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `classremap` Error type
///
/// # Examples
///
/// ```rust
/// use classremap::{classfile::ClassFile, Error};
///
/// match ClassFile::parse(&[]) {
///     Err(Error::Empty) => println!("Nothing to parse"),
///     Err(Error::Malformed { message, .. }) => println!("Malformed: {}", message),
///     Err(e) => println!("Error: {}", e),
///     Ok(_) => unreachable!(),
/// }
/// ```
pub use error::Error;

/// Bounds-checked big-endian cursor over class-file bytes.
///
/// # Example
///
/// ```rust
/// use classremap::Parser;
///
/// let mut parser = Parser::new(&[0xCA, 0xFE, 0xBA, 0xBE]);
/// assert_eq!(parser.read_be::<u32>()?, 0xCAFE_BABE);
/// # Ok::<(), classremap::Error>(())
/// ```
pub use file::parser::Parser;
