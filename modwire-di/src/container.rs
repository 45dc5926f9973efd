//! The [Container] binds modules to providers, validates the resulting dependency graph, and
//! lazily constructs resources.
//!
//! A container goes through two phases. While unsealed, modules and providers can be registered.
//! [Container::seal] then computes the whole graph:
//!
//! 1. Modules which providers depend on, but which were never registered, are discovered and
//!    become private modules of the container.
//! 2. Modules without an explicitly registered provider fall back to their default provider.
//! 3. The graph is checked for circular dependencies.
//!
//! After sealing, registration is no longer possible and resources can be provided. Every
//! resource is constructed at most once per container, on first request:
//!
//! ```
//! use modwire_di::container::Container;
//! use modwire_di::instance::InstancePtr;
//! use modwire_di::module::Module;
//! use modwire_di::provider::Provider;
//! use modwire_di::resource::ResourceType;
//!
//! let module = Module::builder("Numbers")
//!     .declare("answer", ResourceType::of::<i32>())
//!     .build()
//!     .unwrap();
//!
//! let provider = Provider::builder("NumbersProvider", &module)
//!     .provides::<i32, _>("answer", [], |_| Ok(InstancePtr::new(42)))
//!     .build()
//!     .unwrap();
//!
//! let mut container = Container::new();
//! container.register(&module, Some(&provider)).unwrap();
//! container.seal().unwrap();
//!
//! let answer = module.resource("answer").unwrap();
//! assert_eq!(*container.provide::<i32>(&answer).unwrap(), 42);
//! ```

mod graph;

use crate::cache::{CachedInstance, InstanceCache, InstanceCachePtr, SingletonCache};
use crate::error::ContainerError;
use crate::instance::{downcast, Arguments, InstanceAnyPtr, InstancePtr};
use crate::module::Module;
use crate::provider::Provider;
use crate::resource::{Resource, UnboundResource};
use fxhash::FxHashMap;
pub use graph::ResolutionStep;
use graph::GraphSolver;
use std::any::type_name;
use std::fmt::{Display, Formatter};
use std::sync::Mutex;
use tracing::{debug, info, trace};

/// What can be passed to [Container::provide]. Only bound resources can actually be provided.
#[derive(Clone, Copy, Debug)]
pub enum ResourceHandle<'a> {
    Bound(&'a Resource),
    Unbound(&'a UnboundResource),
}

impl<'a> From<&'a Resource> for ResourceHandle<'a> {
    #[inline]
    fn from(resource: &'a Resource) -> Self {
        Self::Bound(resource)
    }
}

impl<'a> From<&'a UnboundResource> for ResourceHandle<'a> {
    #[inline]
    fn from(resource: &'a UnboundResource) -> Self {
        Self::Unbound(resource)
    }
}

/// Something which was being registered in a container.
#[derive(Clone, Debug)]
pub enum Registrant {
    Module(Module),
    Provider(Provider),
}

impl Display for Registrant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Registrant::Module(module) => write!(f, "module {module}"),
            Registrant::Provider(provider) => write!(f, "provider {provider}"),
        }
    }
}

/// Builder for [Container] with non-default options.
pub struct ContainerBuilder {
    allow_provider_resources: bool,
    cache: InstanceCachePtr,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self {
            allow_provider_resources: true,
            cache: Box::<SingletonCache>::default(),
        }
    }

    /// Sets whether private and overriding resources can be provided directly. Enabled by
    /// default.
    pub fn allow_provider_resources(mut self, allow_provider_resources: bool) -> Self {
        self.allow_provider_resources = allow_provider_resources;
        self
    }

    #[cfg(test)]
    fn with_cache(mut self, cache: InstanceCachePtr) -> Self {
        self.cache = cache;
        self
    }

    pub fn build(self) -> Container {
        Container {
            allow_provider_resources: self.allow_provider_resources,
            public_modules: Vec::new(),
            private_modules: Vec::new(),
            providers: Default::default(),
            sealed: false,
            cache: Mutex::new(self.cache),
        }
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry of module-provider bindings and of constructed instances. See module documentation
/// for the lifecycle.
///
/// A sealed container can be shared between threads. Construction is serialized, so concurrent
/// requests for the same resource still yield a single instance.
pub struct Container {
    allow_provider_resources: bool,
    public_modules: Vec<Module>,
    private_modules: Vec<Module>,
    providers: FxHashMap<Module, Provider>,
    sealed: bool,
    cache: Mutex<InstanceCachePtr>,
}

impl Container {
    /// Creates an empty container with default options.
    pub fn new() -> Self {
        ContainerBuilder::new().build()
    }

    /// Registers a public module, optionally together with its provider.
    pub fn register(
        &mut self,
        module: &Module,
        provider: Option<&Provider>,
    ) -> Result<(), ContainerError> {
        if self.sealed {
            return Err(ContainerError::CannotRegisterAfterContainerIsSealed(
                Registrant::Module(module.clone()),
            ));
        }

        if self.public_modules.contains(module) {
            return Err(ContainerError::ModuleAlreadyRegistered {
                module: module.clone(),
                registered: self.public_modules.clone(),
            });
        }

        if let Some(provider) = provider {
            if provider.module() != module {
                return Err(ContainerError::ProviderModuleMismatch {
                    provider: provider.clone(),
                    module: module.clone(),
                });
            }
        }

        debug!(module = module.name(), "Registering module.");
        self.public_modules.push(module.clone());

        match provider {
            Some(provider) => self.register_provider(provider),
            None => Ok(()),
        }
    }

    /// Registers the provider for an already registered public module.
    pub fn register_provider(&mut self, provider: &Provider) -> Result<(), ContainerError> {
        if self.sealed {
            return Err(ContainerError::CannotRegisterAfterContainerIsSealed(
                Registrant::Provider(provider.clone()),
            ));
        }

        let module = provider.module();
        if !self.public_modules.contains(module) {
            return Err(ContainerError::CannotRegisterProviderToUnknownModule {
                provider: provider.clone(),
                registered: self.public_modules.clone(),
            });
        }

        if let Some(registered) = self.providers.get(module) {
            return Err(ContainerError::ModuleProviderAlreadyRegistered {
                module: module.clone(),
                registered: registered.clone(),
                registering: provider.clone(),
            });
        }

        debug!(
            module = module.name(),
            provider = provider.name(),
            "Registering provider."
        );

        self.providers.insert(module.clone(), provider.clone());
        Ok(())
    }

    /// Computes and validates the dependency graph, and ends the registration phase. A failed
    /// seal leaves the container unchanged.
    pub fn seal(&mut self) -> Result<(), ContainerError> {
        if self.sealed {
            return Err(ContainerError::ContainerAlreadySealed);
        }

        let graph = GraphSolver::new(&self.public_modules, &self.providers).solve()?;

        for module in &graph.defaulted_modules {
            module.freeze_default_provider();
        }

        self.private_modules = graph.private_modules;
        self.providers = graph.providers;
        self.sealed = true;

        info!(
            public_modules = self.public_modules.len(),
            private_modules = self.private_modules.len(),
            default_providers = graph.defaulted_modules.len(),
            "Container sealed."
        );

        Ok(())
    }

    #[inline]
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Explicitly registered modules, in registration order.
    #[inline]
    pub fn public_modules(&self) -> &[Module] {
        &self.public_modules
    }

    /// Modules discovered while sealing, in discovery order.
    #[inline]
    pub fn private_modules(&self) -> &[Module] {
        &self.private_modules
    }

    /// The provider bound to given module. Before sealing, only explicitly registered providers
    /// are known.
    pub fn provider_for(&self, module: &Module) -> Option<&Provider> {
        self.providers.get(module)
    }

    /// Number of instances constructed so far.
    pub fn instance_count(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(|error| error.into_inner())
            .instance_count()
    }

    /// Provides an instance of given resource as `T`, which must be the type of the resource.
    pub fn provide<'a, T: ?Sized + Send + Sync + 'static>(
        &self,
        handle: impl Into<ResourceHandle<'a>>,
    ) -> Result<InstancePtr<T>, ContainerError> {
        let resource = self.check_request(handle.into())?;
        let incompatible = || ContainerError::IncompatibleInstance {
            resource: resource.clone(),
            requested: type_name::<T>(),
        };

        if !resource.resource_type().is::<T>() {
            return Err(incompatible());
        }

        let instance = self.provide_checked(resource)?;
        downcast::<T>(&instance).ok_or_else(incompatible)
    }

    /// Provides a type-erased instance of given resource. The erased value is an
    /// [InstancePtr] of the resource's type.
    pub fn provide_any<'a>(
        &self,
        handle: impl Into<ResourceHandle<'a>>,
    ) -> Result<InstanceAnyPtr, ContainerError> {
        let resource = self.check_request(handle.into())?;
        self.provide_checked(resource)
    }

    fn check_request<'a>(
        &self,
        handle: ResourceHandle<'a>,
    ) -> Result<&'a Resource, ContainerError> {
        if !self.sealed {
            return Err(ContainerError::CannotProvideUntilContainerIsSealed);
        }

        let resource = match handle {
            ResourceHandle::Bound(resource) => resource,
            ResourceHandle::Unbound(resource) => {
                return Err(ContainerError::CannotProvideRawType(resource.clone()))
            }
        };

        // modules discovered while sealing are resolved internally, but never provided
        let provider = self
            .public_modules
            .contains(resource.module())
            .then(|| self.providers.get(resource.module()))
            .flatten()
            .ok_or_else(|| self.unknown_resource(resource))?;

        if !resource.is_public() {
            if !self.allow_provider_resources {
                return Err(ContainerError::ProviderResourcesNotAllowed(
                    resource.clone(),
                ));
            }

            if resource.provider() != Some(provider.reference()) {
                return Err(ContainerError::UnrelatedResource {
                    provider: provider.clone(),
                    resource: resource.clone(),
                });
            }
        }

        Ok(resource)
    }

    fn provide_checked(&self, resource: &Resource) -> Result<InstanceAnyPtr, ContainerError> {
        // a panicking constructor cannot leave a partially stored instance behind
        let mut cache = self
            .cache
            .lock()
            .unwrap_or_else(|error| error.into_inner());

        let cached = self.resolve(&mut **cache, resource.canonical())?;
        cached
            .ty
            .cast(&cached.instance, resource.resource_type())
            .ok_or_else(|| ContainerError::IncompatibleInstance {
                resource: resource.clone(),
                requested: resource.resource_type().name(),
            })
    }

    fn resolve(
        &self,
        cache: &mut (dyn InstanceCache + Send + Sync),
        resource: &Resource,
    ) -> Result<CachedInstance, ContainerError> {
        if let Some(instance) = cache.instance(resource) {
            trace!(%resource, "Serving cached instance.");
            return Ok(instance);
        }

        let method = self
            .providers
            .get(resource.module())
            .and_then(|provider| provider.provider_method(resource))
            .ok_or_else(|| self.unknown_resource(resource))?;

        let mut arguments = Arguments::with_capacity(method.dependencies().len());
        for dependency in method.dependencies() {
            let value = self.resolve(cache, dependency.resource().canonical())?;
            let argument = value
                .ty
                .cast(&value.instance, dependency.parameter_type())
                .ok_or_else(|| ContainerError::IncompatibleInstance {
                    resource: dependency.resource().clone(),
                    requested: dependency.parameter_type().name(),
                })?;

            arguments.push(dependency.name(), argument);
        }

        trace!(%resource, provider = %method.provider(), "Constructing instance.");

        let instance = method
            .construct(&arguments)
            .map_err(|source| ContainerError::ConstructionFailed {
                resource: resource.clone(),
                source,
            })?;

        let instance = CachedInstance {
            instance,
            ty: method.produces().clone(),
        };

        cache.store_instance(resource, instance.clone());
        Ok(instance)
    }

    fn unknown_resource(&self, resource: &Resource) -> ContainerError {
        ContainerError::UnknownResource {
            resource: resource.clone(),
            registered: self.public_modules.clone(),
        }
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}
