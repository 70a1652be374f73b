//! # classremap Prelude
//!
//! This module provides a convenient prelude for the most commonly used types of the library.
//! Import it to get quick access to everything a host compiler integration needs.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all classremap operations
pub use crate::Error;

/// The result type used throughout classremap
pub use crate::Result;

// ================================================================================================
// Configuration
// ================================================================================================

/// Configuration types
pub use crate::config::{Environment, RemapConfig, RemapDirection, RemapScope};

// ================================================================================================
// Symbol Mapping
// ================================================================================================

/// The mapping table and its building blocks
pub use crate::mapping::{NamePrefixPolicy, SymbolKind, SymbolMap, SymbolMapBuilder};

// ================================================================================================
// Remapping and Compiler Integration
// ================================================================================================

/// Class-file remapping
pub use crate::remap::{BytecodeRemapper, ClassHierarchy, RemapReport};

/// Compiler hooks and the per-module artifact cache
pub use crate::module::{
    ClassArtifactCache, ClassFileArtifact, CompilationInterceptor, ModuleSession,
};

// ================================================================================================
// Class-File Access
// ================================================================================================

/// Parsed class files
pub use crate::classfile::{constant::ConstantPool, ClassFile, MemberInfo};

/// Low-level parsing cursor
pub use crate::Parser;
