use std::sync::{Arc, LazyLock};

use arc_swap::ArcSwapOption;

use super::{InjectionError, ServiceRegistry};

static CURRENT: LazyLock<ArcSwapOption<ServiceRegistry>> = LazyLock::new(ArcSwapOption::empty);

/// Process-wide registry slot.
///
/// Composition roots should prefer passing the registry explicitly; this exists for
/// code that has no other way to reach it. Installing a registry replaces the
/// previous one wholesale.
pub struct Injection;

impl Injection {
    pub fn install(registry: Arc<ServiceRegistry>) {
        CURRENT.store(Some(registry));
    }

    pub fn current() -> Option<Arc<ServiceRegistry>> {
        CURRENT.load_full()
    }

    /// Resolves `identifier` from the installed registry; `Ok(None)` when nothing is
    /// installed or the identifier is unknown.
    pub fn get<T>(identifier: &str) -> Result<Option<Arc<T>>, InjectionError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        match Self::current() {
            Some(registry) => registry.get(identifier),
            None => Ok(None),
        }
    }

    pub fn reset() {
        CURRENT.store(None);
    }
}
