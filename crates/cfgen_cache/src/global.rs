//! Process-wide cache context.
//!
//! [`register`] installs one [`ConfigCache`] for the whole process; every
//! other function here fails with [`CacheError::NotRegistered`] until it
//! has been called. [`shutdown`] flushes and removes the context, after
//! which the process may register again.

use std::any::Any;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cfgen_runtime::ConfigInstance;

use crate::cache::{CacheOptions, ConfigCache};
use crate::error::CacheError;

static CONTEXT: Mutex<Option<ConfigCache>> = Mutex::new(None);

fn context() -> MutexGuard<'static, Option<ConfigCache>> {
    CONTEXT.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Opens the process-wide cache.
///
/// Fails with [`CacheError::AlreadyRegistered`] if a cache is installed.
pub fn register(options: CacheOptions) -> Result<(), CacheError> {
    let mut context = context();
    if context.is_some() {
        return Err(CacheError::AlreadyRegistered);
    }
    let cache = ConfigCache::open(options)?;
    tracing::debug!(root = %cache.root().display(), "registered cfgen environment");
    *context = Some(cache);
    Ok(())
}

/// Whether a process-wide cache is installed.
pub fn is_registered() -> bool {
    context().is_some()
}

/// Runs `f` against the process-wide cache.
pub fn with_cache<R>(
    f: impl FnOnce(&mut ConfigCache) -> Result<R, CacheError>,
) -> Result<R, CacheError> {
    match context().as_mut() {
        Some(cache) => f(cache),
        None => Err(CacheError::NotRegistered),
    }
}

/// See [`ConfigCache::compile_artifact`].
pub fn compile_artifact(subject: &str) -> Result<String, CacheError> {
    with_cache(|cache| cache.compile_artifact(subject))
}

/// See [`ConfigCache::create_instance`].
pub fn create_instance(subject: &str) -> Result<ConfigInstance, CacheError> {
    with_cache(|cache| cache.create_instance(subject))
}

/// See [`ConfigCache::create_instance_owned_by`].
pub fn create_instance_owned_by<T: Any + Send + Sync>(
    subject: &str,
    owner: &Arc<T>,
) -> Result<ConfigInstance, CacheError> {
    with_cache(|cache| cache.create_instance_owned_by(subject, owner))
}

/// Flushes and uninstalls the process-wide cache.
///
/// Returns `Ok(false)` if nothing was registered.
pub fn shutdown() -> Result<bool, CacheError> {
    let Some(mut cache) = context().take() else {
        return Ok(false);
    };
    cache.flush()?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfgen_common::Fingerprint;
    use cfgen_schema::{Entry, ScalarType, Schema, StaticSchemas, Value};

    use crate::registry::Registry;

    // The context is process-wide, so the whole lifecycle lives in one test.
    #[test]
    fn register_use_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let schemas = StaticSchemas::new();
        schemas
            .insert(
                "app::Settings",
                Schema::new().with("port", Entry::scalar_with_default(ScalarType::Int, 8080)),
                Fingerprint::Timestamp(1),
            )
            .unwrap();
        let options = CacheOptions::new(dir.path(), Arc::new(schemas));

        assert!(!is_registered());
        assert!(matches!(
            compile_artifact("app::Settings"),
            Err(CacheError::NotRegistered)
        ));
        assert!(matches!(
            create_instance("app::Settings"),
            Err(CacheError::NotRegistered)
        ));
        assert!(!shutdown().unwrap());

        register(options.clone()).unwrap();
        assert!(is_registered());
        assert!(matches!(
            register(options.clone()),
            Err(CacheError::AlreadyRegistered)
        ));

        assert_eq!(
            compile_artifact("app::Settings").unwrap(),
            "cfgen::cache::app::Settings"
        );
        let inst = create_instance("app::Settings").unwrap();
        assert_eq!(inst.value("port"), Some(&Value::Int(8080)));

        let owner = Arc::new(7_u8);
        let inst = create_instance_owned_by("app::Settings", &owner).unwrap();
        assert_eq!(inst.owner::<u8>().as_deref(), Some(&7));

        assert!(with_cache(|cache| Ok(cache.is_dirty())).unwrap());
        assert!(shutdown().unwrap());
        assert!(!is_registered());
        assert_eq!(Registry::load(dir.path()).unwrap().len(), 1);

        register(options).unwrap();
        assert!(shutdown().unwrap());
    }
}
