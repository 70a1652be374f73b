//! Configuration for remapping and for the compilation interceptor.
//!
//! A [`RemapConfig`] is built once by the host at startup and handed to the
//! [`crate::module::CompilationInterceptor`] (or directly to a [`crate::remap::BytecodeRemapper`]).
//! It carries the production flag, the name prefix policy and the knobs that decide which
//! symbol kinds are rewritten and in which direction.

use bitflags::bitflags;
use strum::{Display, EnumCount, EnumIter, EnumString};

use crate::mapping::NamePrefixPolicy;

/// Whether the host is running a production (obfuscated) deployment.
///
/// In [`Environment::Development`] the runtime already uses deobfuscated names, so every
/// interception point and the remapper pass their input through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, EnumIter, EnumCount)]
#[strum(serialize_all = "lowercase")]
pub enum Environment {
    /// Obfuscated runtime, names must be translated.
    #[default]
    Production,
    /// Deobfuscated runtime, everything is passed through.
    Development,
}

impl Environment {
    /// Returns `true` for [`Environment::Production`].
    #[must_use]
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

/// Which side of the [`crate::mapping::SymbolMap`] the outbound remapper translates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, EnumIter, EnumCount)]
#[strum(serialize_all = "lowercase")]
pub enum RemapDirection {
    /// Obfuscated names are replaced by their deobfuscated counterparts.
    ///
    /// Member names are only looked up when they match the [`NamePrefixPolicy`].
    #[default]
    Deobfuscate,
    /// Deobfuscated names are replaced by their obfuscated counterparts.
    ///
    /// Deobfuscated names carry no recognisable prefix, so every member name is looked up.
    Obfuscate,
}

bitflags! {
    /// The kinds of name references the remapper is allowed to rewrite.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RemapScope: u8 {
        /// Method names in method references, `EnclosingMethod` and method declarations
        const METHODS = 0x01;
        /// Field names in field references, field declarations and record components
        const FIELDS = 0x02;
        /// Internal class names, including those embedded in descriptors
        const CLASSES = 0x04;
        /// Generic `Signature` attributes (only relevant together with `CLASSES`)
        const SIGNATURES = 0x08;
    }
}

impl Default for RemapScope {
    fn default() -> Self {
        RemapScope::all()
    }
}

/// Configuration for the remapper and the compilation interceptor.
#[derive(Debug, Clone)]
pub struct RemapConfig {
    /// Production or development deployment (default: production).
    pub environment: Environment,

    /// Prefixes identifying obfuscated method and field names (default: `m_` / `f_`).
    pub prefixes: NamePrefixPolicy,

    /// Translation direction applied to emitted bytecode (default: deobfuscate).
    pub direction: RemapDirection,

    /// Name reference kinds to rewrite (default: all).
    pub scope: RemapScope,

    /// Suffix identifying class-file artifacts among the compiler output (default: `.class`).
    pub class_extension: String,

    /// Leave members of classes whose whole supertype chain lives inside the compiled module
    /// untouched (default: `true`).
    ///
    /// Such members can neither override nor reference a member of the obfuscated runtime, so a
    /// name that merely happens to match the mapping table must keep its spelling.
    pub resolve_module_locals: bool,

    /// Remap the artifacts of one module on the rayon thread pool (default: `true`).
    pub parallel: bool,
}

impl RemapConfig {
    /// Default configuration for a production deployment.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }

    /// Default configuration for a development deployment, which disables all remapping.
    #[must_use]
    pub fn development() -> Self {
        RemapConfig {
            environment: Environment::Development,
            ..Self::default()
        }
    }

    /// Replace the translation direction.
    #[must_use]
    pub fn with_direction(mut self, direction: RemapDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Replace the rewrite scope.
    #[must_use]
    pub fn with_scope(mut self, scope: RemapScope) -> Self {
        self.scope = scope;
        self
    }

    /// Replace the name prefix policy.
    #[must_use]
    pub fn with_prefixes(mut self, prefixes: NamePrefixPolicy) -> Self {
        self.prefixes = prefixes;
        self
    }

    /// Returns `true` if `path` names a class-file artifact.
    #[must_use]
    pub fn is_class_path(&self, path: &str) -> bool {
        path.ends_with(self.class_extension.as_str())
    }
}

impl Default for RemapConfig {
    fn default() -> Self {
        RemapConfig {
            environment: Environment::default(),
            prefixes: NamePrefixPolicy::default(),
            direction: RemapDirection::default(),
            scope: RemapScope::default(),
            class_extension: ".class".to_string(),
            resolve_module_locals: true,
            parallel: true,
        }
    }
}
