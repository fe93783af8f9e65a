//! The cache context: strategy-driven compilation, registry and layouts.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cfgen_common::Fingerprint;
use cfgen_compiler::{canonical_name, compile, target_namespace, ArtifactSpec};
use cfgen_runtime::{ConfigInstance, Layout};
use cfgen_schema::{SchemaSource, SubjectName};

use crate::emitter::{CodeEmitter, SpecEmitter};
use crate::error::CacheError;
use crate::registry::{Registry, RegistryEntry};
use crate::store::ArtifactStore;
use crate::strategy::CacheStrategy;

/// Namespace generated artifacts are placed under unless configured.
pub const DEFAULT_NAMESPACE: &str = "cfgen::cache";

/// Version stamped into registries and artifact headers.
const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Settings for opening a [`ConfigCache`].
#[derive(Clone)]
pub struct CacheOptions {
    /// Storage root for the registry and artifact files.
    pub root: PathBuf,
    /// Reuse policy.
    pub strategy: CacheStrategy,
    /// Base namespace for generated artifacts.
    pub namespace: String,
    /// Where subject schemas and fingerprints come from.
    pub schemas: Arc<dyn SchemaSource>,
    /// How artifacts are encoded for storage.
    pub emitter: Arc<dyn CodeEmitter>,
}

impl CacheOptions {
    /// Options with the `Validate` strategy, the default namespace and the
    /// [`SpecEmitter`].
    pub fn new(root: impl Into<PathBuf>, schemas: Arc<dyn SchemaSource>) -> Self {
        Self {
            root: root.into(),
            strategy: CacheStrategy::default(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            schemas,
            emitter: Arc::new(SpecEmitter),
        }
    }

    /// Sets the strategy.
    pub fn strategy(mut self, strategy: CacheStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the base namespace.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Sets the emitter.
    pub fn emitter(mut self, emitter: Arc<dyn CodeEmitter>) -> Self {
        self.emitter = emitter;
        self
    }
}

impl std::fmt::Debug for CacheOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheOptions")
            .field("root", &self.root)
            .field("strategy", &self.strategy)
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

/// Compiles subjects on demand and serves instances of their artifacts.
///
/// The registry is loaded once when the cache is opened (or started empty
/// under [`CacheStrategy::Never`]), updated in memory on every
/// regeneration and written back by [`flush`](Self::flush). Dropping a
/// cache with unflushed changes flushes it.
pub struct ConfigCache {
    root: PathBuf,
    strategy: CacheStrategy,
    namespace: String,
    schemas: Arc<dyn SchemaSource>,
    emitter: Arc<dyn CodeEmitter>,
    store: ArtifactStore,
    registry: Registry,
    dirty: bool,
    /// Subjects regenerated since open; their on-disk entries are stale.
    regenerated: HashSet<String>,
    /// Linked layouts by canonical name.
    layouts: HashMap<String, Arc<Layout>>,
}

impl ConfigCache {
    /// Opens a cache, creating the storage root if needed.
    pub fn open(options: CacheOptions) -> Result<Self, CacheError> {
        let CacheOptions {
            root,
            strategy,
            namespace,
            schemas,
            emitter,
        } = options;

        std::fs::create_dir_all(&root).map_err(|e| CacheError::io(&root, e))?;

        let registry = match strategy {
            CacheStrategy::Never => Registry::new(TOOL_VERSION),
            _ => Registry::load_or_new(&root, TOOL_VERSION),
        };
        tracing::debug!(
            root = %root.display(),
            %strategy,
            artifacts = registry.len(),
            "opened config cache"
        );

        Ok(Self {
            store: ArtifactStore::new(&root, TOOL_VERSION),
            root,
            strategy,
            namespace: namespace.trim_matches(':').to_string(),
            schemas,
            emitter,
            registry,
            dirty: false,
            regenerated: HashSet::new(),
            layouts: HashMap::new(),
        })
    }

    /// The storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The active strategy.
    pub fn strategy(&self) -> CacheStrategy {
        self.strategy
    }

    /// The base namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The in-memory registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Whether the registry has changes not yet flushed.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Canonical name the root artifact of `subject` compiles to.
    pub fn root_artifact_name(&self, subject: &SubjectName) -> String {
        canonical_name(&target_namespace(&self.namespace, subject), subject.name())
    }

    /// Makes sure the subject's artifacts are compiled according to the
    /// strategy and returns the root artifact's canonical name.
    pub fn compile_artifact(&mut self, subject: &str) -> Result<String, CacheError> {
        let subject = SubjectName::parse(subject)?;
        let root_name = self.root_artifact_name(&subject);
        let key = subject.to_string();
        self.check_owner(&key, &root_name)?;

        let fingerprint = match self.strategy {
            CacheStrategy::Never => Fingerprint::now(),
            CacheStrategy::Always => {
                if self.is_present(&key, &root_name) {
                    tracing::debug!(artifact = %root_name, "reusing artifact");
                    return Ok(root_name);
                }
                Fingerprint::now()
            }
            CacheStrategy::Validate => {
                let current = self.schemas.fingerprint(&subject)?;
                if self.is_current(&key, &root_name, current) {
                    tracing::debug!(artifact = %root_name, fingerprint = %current, "reusing artifact");
                    return Ok(root_name);
                }
                current
            }
        };

        self.generate(&subject, &root_name, fingerprint)?;
        Ok(root_name)
    }

    /// Compiles if necessary and returns a fresh instance without an owner.
    pub fn create_instance(&mut self, subject: &str) -> Result<ConfigInstance, CacheError> {
        let name = self.compile_artifact(subject)?;
        Ok(ConfigInstance::new(self.layout(&name)?))
    }

    /// Compiles if necessary and returns a fresh instance owned by `owner`.
    pub fn create_instance_owned_by<T: Any + Send + Sync>(
        &mut self,
        subject: &str,
        owner: &Arc<T>,
    ) -> Result<ConfigInstance, CacheError> {
        let name = self.compile_artifact(subject)?;
        Ok(ConfigInstance::owned_by(self.layout(&name)?, owner))
    }

    /// Returns the linked layout of a registered artifact, loading it and
    /// its nested artifacts from the store on first use.
    pub fn layout(&mut self, canonical_name: &str) -> Result<Arc<Layout>, CacheError> {
        if let Some(layout) = self.layouts.get(canonical_name) {
            return Ok(Arc::clone(layout));
        }

        let missing = || CacheError::MissingArtifact {
            name: canonical_name.to_string(),
        };
        let entry = self.registry.get(canonical_name).ok_or_else(missing)?;
        let (_, payload) = self.store.read_artifact(&entry.path).ok_or_else(missing)?;
        let spec = self.emitter.load(&payload)?;

        let children: Vec<String> = spec.children().map(str::to_string).collect();
        let mut linked = HashMap::with_capacity(children.len());
        for child in children {
            let layout = self.layout(&child)?;
            linked.insert(child, layout);
        }

        let layout = Arc::new(Layout::new(spec, &linked)?);
        self.layouts
            .insert(canonical_name.to_string(), Arc::clone(&layout));
        Ok(layout)
    }

    /// Writes the registry if it changed since it was loaded or last
    /// flushed.
    ///
    /// Entries another process flushed in the meantime are kept, except
    /// for subjects this cache regenerated; on conflicts this cache's
    /// entries win.
    pub fn flush(&mut self) -> Result<(), CacheError> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(on_disk) = Registry::load(&self.root) {
            if on_disk.is_compatible(TOOL_VERSION) {
                let regenerated = &self.regenerated;
                self.registry
                    .merge_missing(on_disk, |subject| regenerated.contains(subject));
            }
        }
        self.registry.save(&self.root)?;
        self.dirty = false;
        tracing::debug!(artifacts = self.registry.len(), "flushed registry");
        Ok(())
    }

    /// Removes artifact files no registry entry refers to.
    pub fn gc(&self) -> Result<usize, CacheError> {
        let live: HashSet<PathBuf> = self
            .registry
            .entries
            .values()
            .map(|e| e.path.clone())
            .collect();
        let removed = self.store.gc(&live)?;
        tracing::info!(removed, "garbage collected artifacts");
        Ok(removed)
    }

    /// Fails if `canonical_name` is registered to a subject other than
    /// `subject`.
    fn check_owner(&self, subject: &str, canonical_name: &str) -> Result<(), CacheError> {
        match self.registry.get(canonical_name) {
            Some(entry) if entry.subject != subject => Err(CacheError::NameCollision {
                name: canonical_name.to_string(),
                subject: subject.to_string(),
                owner: entry.subject.clone(),
            }),
            _ => Ok(()),
        }
    }

    /// `Always`: the root artifact is registered and every artifact file of
    /// the subject exists.
    fn is_present(&self, subject: &str, root_name: &str) -> bool {
        self.registry.get(root_name).is_some()
            && self
                .registry
                .artifacts_of(subject)
                .all(|(_, entry)| self.store.absolute(&entry.path).is_file())
    }

    /// `Validate`: every registered artifact of the subject was stamped
    /// with `current`, both in the registry and in its stored header.
    fn is_current(&self, subject: &str, root_name: &str, current: Fingerprint) -> bool {
        self.registry.get(root_name).is_some()
            && self.registry.artifacts_of(subject).all(|(name, entry)| {
                entry.fingerprint == current
                    && self
                        .store
                        .read_header(&entry.path)
                        .is_some_and(|h| h.fingerprint == current && h.canonical_name == name)
            })
    }

    fn generate(
        &mut self,
        subject: &SubjectName,
        root_name: &str,
        fingerprint: Fingerprint,
    ) -> Result<(), CacheError> {
        let schema = self.schemas.schema(subject)?;
        let namespace = target_namespace(&self.namespace, subject);
        let specs = compile(&schema, subject, &namespace)?;
        let subject_name = subject.to_string();
        for spec in &specs {
            self.check_owner(&subject_name, &spec.canonical_name)?;
        }

        let mut entries = Vec::with_capacity(specs.len());
        for spec in &specs {
            let payload = self.emitter.emit(spec)?;
            let path = self
                .store
                .write_artifact(&spec.canonical_name, fingerprint, &payload)?;
            entries.push((
                spec.canonical_name.clone(),
                RegistryEntry {
                    path,
                    fingerprint,
                    subject: subject_name.clone(),
                },
            ));
        }

        self.registry.remove_subject(&subject_name);
        for (name, entry) in entries {
            self.registry.insert(name, entry);
        }
        self.regenerated.insert(subject_name.clone());
        self.dirty = true;

        self.layouts
            .retain(|_, layout| layout.spec().subject != subject_name);
        self.remember(root_name, specs)?;

        tracing::info!(
            subject = %subject_name,
            artifact = %root_name,
            %fingerprint,
            "generated artifacts"
        );
        Ok(())
    }

    /// Links freshly compiled specs and memoizes every layout by name.
    fn remember(&mut self, root_name: &str, specs: Vec<ArtifactSpec>) -> Result<(), CacheError> {
        let mut linked: HashMap<String, Arc<Layout>> = HashMap::with_capacity(specs.len());
        for spec in specs.into_iter().rev() {
            let name = spec.canonical_name.clone();
            let layout = Arc::new(Layout::new(spec, &linked)?);
            linked.insert(name, layout);
        }
        if !linked.contains_key(root_name) {
            return Err(CacheError::MissingArtifact {
                name: root_name.to_string(),
            });
        }
        self.layouts.extend(linked);
        Ok(())
    }
}

impl Drop for ConfigCache {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!(root = %self.root.display(), error = %e, "failed to flush registry");
        }
    }
}

impl std::fmt::Debug for ConfigCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigCache")
            .field("root", &self.root)
            .field("strategy", &self.strategy)
            .field("namespace", &self.namespace)
            .field("artifacts", &self.registry.len())
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}
