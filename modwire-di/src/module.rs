//! Modules are named, immutable sets of public [Resource]s - the contract which a
//! [Provider] must fulfill.
//!
//! ```
//! use modwire_di::module::Module;
//! use modwire_di::resource::ResourceType;
//!
//! let database = Module::builder("Database")
//!     .declare("url", ResourceType::of::<String>())
//!     .declare("pool_size", ResourceType::of::<u32>())
//!     .build()
//!     .unwrap();
//!
//! assert!(database.contains("url"));
//! assert_eq!(database.resource("pool_size").unwrap().name(), "pool_size");
//! ```
//!
//! A module can name a default provider, which a [Container](crate::container::Container) falls
//! back to when no provider was registered explicitly. The default provider can be changed until a
//! container seals using it; from then on it is frozen.

use crate::error::ModuleDefinitionError;
use crate::provider::Provider;
use crate::resource::{Resource, ResourceType, UnboundKind, UnboundResource};
use fxhash::FxHashMap;
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

static NEXT_MODULE_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Default)]
struct DefaultProvider {
    provider: Option<Provider>,
    frozen: bool,
}

struct ResourceDeclaration {
    name: Arc<str>,
    ty: ResourceType,
}

struct ModuleInner {
    id: u64,
    name: String,
    resources: Vec<ResourceDeclaration>,
    resources_by_name: FxHashMap<Arc<str>, usize>,
    default_provider: RwLock<DefaultProvider>,
}

/// Shared handle to a module definition. Handles are cheap to clone and compare by identity.
///
/// Module definitions are meant to live as long as the program, typically in statics. Setting a
/// default provider creates a reference cycle between the module and the provider, which is never
/// reclaimed.
#[derive(Clone)]
pub struct Module {
    inner: Arc<ModuleInner>,
}

impl Module {
    pub fn builder<N: ToString>(name: N) -> ModuleBuilder {
        ModuleBuilder {
            name: name.to_string(),
            declarations: Vec::new(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Checks if the module declares a resource with given name.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.inner.resources_by_name.contains_key(name)
    }

    /// Returns the public resource with given name.
    pub fn resource(&self, name: &str) -> Option<Resource> {
        self.inner
            .resources_by_name
            .get(name)
            .map(|index| self.bind(&self.inner.resources[*index]))
    }

    /// Returns all public resources, in declaration order.
    pub fn resources(&self) -> impl Iterator<Item = Resource> + '_ {
        self.inner
            .resources
            .iter()
            .map(|declaration| self.bind(declaration))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.resources.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.resources.is_empty()
    }

    /// Returns the currently assigned default provider.
    pub fn default_provider(&self) -> Option<Provider> {
        self.read_default_provider().provider.clone()
    }

    /// Assigns the default provider. The provider must provide for this module, and the default
    /// provider must not be frozen by a container which sealed using it.
    pub fn set_default_provider(&self, provider: &Provider) -> Result<(), ModuleDefinitionError> {
        if provider.module() != self {
            return Err(ModuleDefinitionError::DefaultProviderProvidesToAnotherModule {
                module: self.clone(),
                provider: provider.clone(),
            });
        }

        let mut default_provider = self
            .inner
            .default_provider
            .write()
            .unwrap_or_else(|error| error.into_inner());

        if default_provider.frozen {
            return Err(ModuleDefinitionError::DefaultProviderFrozen {
                module: self.clone(),
                provider: provider.clone(),
            });
        }

        default_provider.provider = Some(provider.clone());
        Ok(())
    }

    /// Checks if a container sealed using the default provider, which prevents further changes.
    pub fn is_default_provider_frozen(&self) -> bool {
        self.read_default_provider().frozen
    }

    pub(crate) fn freeze_default_provider(&self) {
        self.inner
            .default_provider
            .write()
            .unwrap_or_else(|error| error.into_inner())
            .frozen = true;
    }

    fn read_default_provider(&self) -> std::sync::RwLockReadGuard<'_, DefaultProvider> {
        // the guarded data stays consistent even if a writer panicked
        self.inner
            .default_provider
            .read()
            .unwrap_or_else(|error| error.into_inner())
    }

    fn bind(&self, declaration: &ResourceDeclaration) -> Resource {
        Resource::public(declaration.ty.clone(), declaration.name.clone(), self.clone())
    }
}

impl PartialEq for Module {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Module {}

impl Hash for Module {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl Debug for Module {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.inner.name)
            .field(
                "resources",
                &self
                    .inner
                    .resources
                    .iter()
                    .map(|declaration| &*declaration.name)
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Display for Module {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.inner.name)
    }
}

/// Builder for [Module]s. Declarations are validated when building.
pub struct ModuleBuilder {
    name: String,
    declarations: Vec<(String, UnboundResource)>,
}

impl ModuleBuilder {
    /// Declares a public resource.
    pub fn declare<N: ToString>(self, name: N, ty: ResourceType) -> Self {
        self.declare_unbound(name, UnboundResource::public(ty))
    }

    /// Declares a resource from an unbound declaration. Only public declarations are valid in a
    /// module.
    pub fn declare_unbound<N: ToString>(mut self, name: N, resource: UnboundResource) -> Self {
        self.declarations.push((name.to_string(), resource));
        self
    }

    pub fn build(self) -> Result<Module, ModuleDefinitionError> {
        let mut resources = Vec::with_capacity(self.declarations.len());
        let mut resources_by_name = FxHashMap::default();

        for (name, declaration) in self.declarations {
            if declaration.kind() != UnboundKind::Public {
                return Err(ModuleDefinitionError::CannotDeclareProviderResourceInModule {
                    module: self.name,
                    name,
                    resource: declaration,
                });
            }

            let name: Arc<str> = name.into();
            if resources_by_name.contains_key(&name) {
                return Err(ModuleDefinitionError::DuplicateResourceName {
                    module: self.name,
                    name: name.to_string(),
                });
            }

            resources_by_name.insert(name.clone(), resources.len());
            resources.push(ResourceDeclaration {
                name,
                ty: declaration.resource_type().clone(),
            });
        }

        Ok(Module {
            inner: Arc::new(ModuleInner {
                id: NEXT_MODULE_ID.fetch_add(1, Ordering::Relaxed),
                name: self.name,
                resources,
                resources_by_name,
                default_provider: Default::default(),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ModuleDefinitionError;
    use crate::instance::InstancePtr;
    use crate::module::Module;
    use crate::provider::Provider;
    use crate::resource::{ResourceType, UnboundResource};

    fn create_module() -> Module {
        Module::builder("Settings")
            .declare("port", ResourceType::of::<u16>())
            .declare("host", ResourceType::of::<String>())
            .build()
            .unwrap()
    }

    fn create_provider(module: &Module) -> Provider {
        Provider::builder("SettingsProvider", module)
            .provides::<u16, _>("port", [], |_| Ok(InstancePtr::new(80)))
            .provides::<String, _>("host", [], |_| Ok(InstancePtr::new("localhost".to_string())))
            .build()
            .unwrap()
    }

    #[test]
    fn should_list_resources_in_declaration_order() {
        let module = create_module();

        let names: Vec<_> = module
            .resources()
            .map(|resource| resource.name().to_string())
            .collect();
        assert_eq!(names, vec!["port", "host"]);
        assert_eq!(module.len(), 2);
        assert!(module.contains("host"));
        assert!(!module.contains("user"));
        assert!(module.resource("user").is_none());
    }

    #[test]
    fn should_bind_equal_resources() {
        let module = create_module();

        let resource = module.resource("port").unwrap();
        assert_eq!(resource, module.resource("port").unwrap());
        assert_eq!(resource.module(), &module);
        assert!(resource.is_public());
        assert!(resource.resource_type().is::<u16>());
    }

    #[test]
    fn should_distinguish_modules_with_same_shape() {
        assert_ne!(create_module(), create_module());
        assert_ne!(
            create_module().resource("port").unwrap(),
            create_module().resource("port").unwrap()
        );
    }

    #[test]
    fn should_reject_duplicate_names() {
        assert!(matches!(
            Module::builder("Settings")
                .declare("port", ResourceType::of::<u16>())
                .declare("port", ResourceType::of::<u32>())
                .build()
                .unwrap_err(),
            ModuleDefinitionError::DuplicateResourceName { name, .. } if name == "port"
        ));
    }

    #[test]
    fn should_reject_provider_resources() {
        assert!(matches!(
            Module::builder("Settings")
                .declare_unbound("secret", UnboundResource::private(ResourceType::of::<String>()))
                .build()
                .unwrap_err(),
            ModuleDefinitionError::CannotDeclareProviderResourceInModule { name, .. } if name == "secret"
        ));
    }

    #[test]
    fn should_set_default_provider() {
        let module = create_module();
        let provider = create_provider(&module);

        assert!(module.default_provider().is_none());
        module.set_default_provider(&provider).unwrap();
        assert_eq!(module.default_provider(), Some(provider));
    }

    #[test]
    fn should_reject_default_provider_of_another_module() {
        let module = create_module();
        let provider = create_provider(&create_module());

        assert!(matches!(
            module.set_default_provider(&provider).unwrap_err(),
            ModuleDefinitionError::DefaultProviderProvidesToAnotherModule { .. }
        ));
    }

    #[test]
    fn should_reject_default_provider_after_freezing() {
        let module = create_module();
        let provider = create_provider(&module);
        module.set_default_provider(&provider).unwrap();

        module.freeze_default_provider();

        assert!(module.is_default_provider_frozen());
        assert!(matches!(
            module.set_default_provider(&create_provider(&module)).unwrap_err(),
            ModuleDefinitionError::DefaultProviderFrozen { .. }
        ));
        assert_eq!(module.default_provider(), Some(provider));
    }
}
