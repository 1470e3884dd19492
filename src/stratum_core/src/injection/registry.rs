use std::any::{Any, type_name};
use std::cell::RefCell;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;
use thiserror::Error;

type Instance = Arc<dyn Any + Send + Sync>;
type Constructor = Arc<dyn Fn(&Resolver<'_>) -> Result<Instance, InjectionError> + Send + Sync>;

/// How many instances a registration produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifetime {
    /// Constructed on first resolution, then shared.
    #[default]
    Singleton,
    /// Constructed on every resolution.
    Factory,
}

#[derive(Debug, Error)]
pub enum InjectionError {
    #[error("No registration for `{0}`")]
    NotRegistered(String),
    #[error("`{identifier}` depends on `{dependency}`, which is not registered")]
    MissingDependency {
        identifier: String,
        dependency: String,
    },
    #[error("`{identifier}` is not registered as `{expected}`")]
    TypeMismatch {
        identifier: String,
        expected: &'static str,
    },
    #[error("Circular dependency: {0}")]
    CircularDependency(String),
    #[error("Failed to construct `{identifier}`: {reason}")]
    Construction { identifier: String, reason: String },
}

/// A type that knows how to build itself from the registry.
///
/// `inject` is the constructor parameter list: it resolves each dependency by its
/// identifier and hands them to the plain constructor.
pub trait Injectable: Sized + Send + Sync + 'static {
    const IDENTIFIER: &'static str;

    fn inject(resolver: &Resolver<'_>) -> Result<Self, InjectionError>;
}

struct Registration {
    lifetime: Lifetime,
    constructor: Constructor,
    instance: Mutex<Option<Instance>>,
}

/// Mapping from string identifiers to singleton or factory constructors.
///
/// Registration happens once at startup; resolution may happen from any thread.
#[derive(Default)]
pub struct ServiceRegistry {
    registrations: DashMap<String, Arc<Registration>>,
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut identifiers: Vec<String> =
            self.registrations.iter().map(|e| e.key().clone()).collect();
        identifiers.sort();
        f.debug_struct("ServiceRegistry")
            .field("identifiers", &identifiers)
            .finish()
    }
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `identifier` to `constructor`.
    ///
    /// A second registration under the same identifier replaces the first.
    pub fn register<T, F>(&self, identifier: impl Into<String>, lifetime: Lifetime, constructor: F)
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> Result<Arc<T>, InjectionError> + Send + Sync + 'static,
    {
        let identifier = identifier.into();
        let constructor: Constructor = Arc::new(move |resolver: &Resolver<'_>| {
            constructor(resolver).map(|instance| Arc::new(instance) as Instance)
        });
        let registration = Arc::new(Registration {
            lifetime,
            constructor,
            instance: Mutex::new(None),
        });

        if self
            .registrations
            .insert(identifier.clone(), registration)
            .is_some()
        {
            tracing::warn!(%identifier, "Replacing existing registration");
        }
    }

    /// Binds `T::IDENTIFIER` to `T` itself.
    pub fn register_self<T: Injectable>(&self, lifetime: Lifetime) {
        self.register::<T, _>(T::IDENTIFIER, lifetime, |resolver| {
            T::inject(resolver).map(Arc::new)
        });
    }

    /// Binds `identifier` to an already constructed instance.
    pub fn register_instance<T>(&self, identifier: impl Into<String>, instance: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.register::<T, _>(identifier, Lifetime::Singleton, move |_| {
            Ok(Arc::clone(&instance))
        });
    }

    /// Resolves `identifier`.
    ///
    /// Returns `Ok(None)` when the identifier was never registered. An error means
    /// the registry is misconfigured: a dependency is missing, has the wrong type,
    /// or depends on itself.
    pub fn get<T>(&self, identifier: &str) -> Result<Option<Arc<T>>, InjectionError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        Resolver::new(self).try_resolve(identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.registrations.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    fn instantiate(
        &self,
        identifier: &str,
        resolver: &Resolver<'_>,
    ) -> Result<Option<Instance>, InjectionError> {
        // Clone the registration out so no map guard is held while constructing.
        let Some(registration) = self
            .registrations
            .get(identifier)
            .map(|entry| Arc::clone(entry.value()))
        else {
            return Ok(None);
        };

        resolver.check_cycle(identifier)?;

        let instance = match registration.lifetime {
            Lifetime::Factory => construct(identifier, &registration, resolver)?,
            Lifetime::Singleton => {
                let mut slot = registration
                    .instance
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                match slot.as_ref() {
                    Some(instance) => Arc::clone(instance),
                    None => {
                        let instance = construct(identifier, &registration, resolver)?;
                        *slot = Some(Arc::clone(&instance));
                        instance
                    }
                }
            }
        };

        Ok(Some(instance))
    }
}

fn construct(
    identifier: &str,
    registration: &Registration,
    resolver: &Resolver<'_>,
) -> Result<Instance, InjectionError> {
    resolver.path.borrow_mut().push(identifier.to_owned());
    let result = (registration.constructor)(resolver);
    resolver.path.borrow_mut().pop();

    result.map_err(|error| match error {
        InjectionError::NotRegistered(dependency) => InjectionError::MissingDependency {
            identifier: identifier.to_owned(),
            dependency,
        },
        other => other,
    })
}

/// Resolution context handed to constructors.
///
/// Tracks the identifiers currently being constructed so that cycles are reported
/// instead of deadlocking on a singleton slot.
pub struct Resolver<'a> {
    registry: &'a ServiceRegistry,
    path: RefCell<Vec<String>>,
}

impl<'a> Resolver<'a> {
    fn new(registry: &'a ServiceRegistry) -> Self {
        Self {
            registry,
            path: RefCell::new(Vec::new()),
        }
    }

    /// Resolves a required dependency.
    pub fn resolve<T>(&self, identifier: &str) -> Result<Arc<T>, InjectionError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.try_resolve(identifier)?
            .ok_or_else(|| InjectionError::NotRegistered(identifier.to_owned()))
    }

    /// Resolves an optional dependency.
    pub fn try_resolve<T>(&self, identifier: &str) -> Result<Option<Arc<T>>, InjectionError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let Some(instance) = self.registry.instantiate(identifier, self)? else {
            return Ok(None);
        };

        instance
            .downcast_ref::<Arc<T>>()
            .cloned()
            .map(Some)
            .ok_or_else(|| InjectionError::TypeMismatch {
                identifier: identifier.to_owned(),
                expected: type_name::<T>(),
            })
    }

    fn check_cycle(&self, identifier: &str) -> Result<(), InjectionError> {
        let path = self.path.borrow();
        if path.iter().any(|entry| entry == identifier) {
            let mut chain = path.clone();
            chain.push(identifier.to_owned());
            return Err(InjectionError::CircularDependency(chain.join(" -> ")));
        }
        Ok(())
    }
}
