//! Hooks called by the host compiler around a module's finalize pass.

use std::sync::Arc;

use log::{debug, info};
use rayon::prelude::*;

use crate::{
    config::RemapConfig,
    mapping::SymbolMap,
    module::{ClassArtifactCache, ClassFileArtifact},
    remap::{BytecodeRemapper, ClassHierarchy},
    Result,
};

/// Entry point for the host compiler.
///
/// One interceptor is created at startup from the mapping table and the configuration and shared
/// by all compilations. It holds no per-compilation state; that lives in [`ModuleSession`].
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use classremap::prelude::*;
///
/// let symbols = SymbolMap::builder()
///     .method("m_1234_", "renderTick")
///     .build()?;
/// let interceptor = CompilationInterceptor::new(Arc::new(symbols), RemapConfig::production());
///
/// assert_eq!(interceptor.on_method_name_read("m_1234_"), "renderTick");
/// assert_eq!(interceptor.on_method_name_read("doStuff"), "doStuff");
///
/// let output = interceptor.finalize_module(&[ClassFileArtifact::new(
///     "META-INF/main.kotlin_module",
///     vec![0, 0, 0, 1],
/// )])?;
/// assert_eq!(output[0].bytes, vec![0, 0, 0, 1]);
/// # Ok::<(), classremap::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct CompilationInterceptor {
    symbols: Arc<SymbolMap>,
    config: RemapConfig,
}

impl CompilationInterceptor {
    /// Create an interceptor over a shared mapping table.
    #[must_use]
    pub fn new(symbols: Arc<SymbolMap>, config: RemapConfig) -> Self {
        CompilationInterceptor { symbols, config }
    }

    /// The mapping table.
    #[must_use]
    pub fn symbols(&self) -> &SymbolMap {
        &self.symbols
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &RemapConfig {
        &self.config
    }

    /// Called whenever the compiler reads a method name from class metadata.
    ///
    /// In production, names carrying the obfuscated method prefix are translated to their
    /// deobfuscated form so source code written against readable names resolves. Every other
    /// name is returned unchanged.
    #[must_use]
    pub fn on_method_name_read<'n>(&'n self, name: &'n str) -> &'n str {
        if self.config.environment.is_production() && self.config.prefixes.matches_method(name) {
            self.symbols.method_deobf(name)
        } else {
            name
        }
    }

    /// Called whenever the compiler reads a field name from class metadata.
    ///
    /// The field counterpart of [`CompilationInterceptor::on_method_name_read`].
    #[must_use]
    pub fn on_field_name_read<'n>(&'n self, name: &'n str) -> &'n str {
        if self.config.environment.is_production() && self.config.prefixes.matches_field(name) {
            self.symbols.field_deobf(name)
        } else {
            name
        }
    }

    /// Start the finalize pass of one module.
    ///
    /// In production every artifact is copied verbatim into the session's cache before any of
    /// them is remapped.
    #[must_use]
    pub fn begin_module(&self, artifacts: &[ClassFileArtifact]) -> ModuleSession<'_> {
        let mut session = ModuleSession {
            interceptor: self,
            cache: ClassArtifactCache::new(),
            hierarchy: ClassHierarchy::new(self.config.class_extension.as_str()),
        };
        if self.config.environment.is_production() {
            session.cache.populate(artifacts);
        }
        debug!(
            "Module session started with {} cached artifacts",
            session.cache.len()
        );
        session
    }

    /// Run a complete finalize pass and return the artifacts as they should be written.
    ///
    /// Output order matches input order. The session cache is cleared whether or not the pass
    /// succeeds.
    ///
    /// # Errors
    /// Returns the first error produced by [`ModuleSession::extract`].
    pub fn finalize_module(&self, artifacts: &[ClassFileArtifact]) -> Result<Vec<ClassFileArtifact>> {
        let mut session = self.begin_module(artifacts);

        let extract = |artifact: &ClassFileArtifact| {
            session.extract(artifact).map(|bytes| ClassFileArtifact {
                relative_path: artifact.relative_path.clone(),
                bytes,
            })
        };
        let output = if self.config.parallel {
            artifacts.par_iter().map(extract).collect::<Result<Vec<_>>>()?
        } else {
            artifacts.iter().map(extract).collect::<Result<Vec<_>>>()?
        };

        session.finish();

        info!(
            "Finalized module: {} artifacts, {} class files",
            output.len(),
            output
                .iter()
                .filter(|artifact| self.config.is_class_path(&artifact.relative_path))
                .count()
        );
        Ok(output)
    }
}

/// State of one module's finalize pass.
///
/// Owns the module's [`ClassArtifactCache`]. The cache is cleared by
/// [`ModuleSession::finish`] or, at the latest, when the session is dropped.
#[derive(Debug)]
pub struct ModuleSession<'i> {
    interceptor: &'i CompilationInterceptor,
    cache: ClassArtifactCache,
    hierarchy: ClassHierarchy,
}

impl ModuleSession<'_> {
    /// The artifacts captured by [`CompilationInterceptor::begin_module`].
    #[must_use]
    pub fn cache(&self) -> &ClassArtifactCache {
        &self.cache
    }

    /// A remapper resolving member owners against this module.
    #[must_use]
    pub fn remapper(&self) -> BytecodeRemapper<'_> {
        BytecodeRemapper::new(&self.interceptor.symbols, &self.interceptor.config)
            .with_module(&self.cache, &self.hierarchy)
    }

    /// The bytes to write for `artifact`.
    ///
    /// Class files are remapped in production; every other artifact, and every artifact in
    /// development, is returned unchanged.
    ///
    /// # Errors
    /// Returns the remapper's error if a class file is malformed or cannot be rewritten.
    pub fn extract(&self, artifact: &ClassFileArtifact) -> Result<Vec<u8>> {
        self.remapper().remap_artifact(artifact)
    }

    /// End the finalize pass and release the cached artifacts. Calling it again is a no-op.
    pub fn finish(&mut self) {
        if !self.cache.is_empty() {
            debug!("Clearing {} cached artifacts", self.cache.len());
        }
        self.cache.clear();
        self.hierarchy.clear();
    }
}

impl Drop for ModuleSession<'_> {
    fn drop(&mut self) {
        self.finish();
    }
}
