//! Providers supply the resources of exactly one [Module], using construction methods.
//!
//! Besides the public resources of its module, a provider can declare its own resources:
//!
//! * private resources, which only the provider's own methods can depend on,
//! * overriding resources, which replace a public resource of the module with a subtype.
//!
//! Every resource the provider is responsible for needs exactly one construction method. Method
//! parameters are bound to resources when the provider is built, either by name or by an explicit
//! reference to a public resource of any module:
//!
//! ```
//! use modwire_di::instance::InstancePtr;
//! use modwire_di::module::Module;
//! use modwire_di::provider::{Parameter, Provider};
//! use modwire_di::resource::ResourceType;
//!
//! let settings = Module::builder("Settings")
//!     .declare("port", ResourceType::of::<u16>())
//!     .build()
//!     .unwrap();
//!
//! let server = Module::builder("Server")
//!     .declare("address", ResourceType::of::<String>())
//!     .build()
//!     .unwrap();
//!
//! let port = settings.resource("port").unwrap();
//! let provider = Provider::builder("ServerProvider", &server)
//!     .declare("host", ResourceType::of::<String>())
//!     .provides::<String, _>("host", [], |_| Ok(InstancePtr::new("localhost".to_string())))
//!     .provides::<String, _>(
//!         "address",
//!         [Parameter::named::<String>("host"), Parameter::resource("port", &port)],
//!         |arguments| {
//!             let host = arguments.get::<String>("host")?;
//!             let port = arguments.get::<u16>("port")?;
//!             Ok(InstancePtr::new(format!("{host}:{port}")))
//!         },
//!     )
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(provider.module(), &server);
//! assert!(provider.resource("host").is_some());
//! ```
//!
//! ## Inheritance
//!
//! [Provider::extending] starts a provider from a single base provider. The base's resources and
//! methods are copied, resources are re-bound to the new provider, and the new provider can
//! redeclare resources with narrower types and replace methods. Inherited methods are bound again
//! against the resulting resource table, so they see the redeclared resources.

mod method;

use crate::error::ProviderDefinitionError;
use crate::instance::{erase, Arguments, ErrorPtr, InstancePtr};
use crate::module::Module;
use crate::resource::{ProviderRef, Resource, ResourceKind, ResourceType, UnboundKind, UnboundResource};
use fxhash::{FxHashMap, FxHashSet};
pub use method::{Dependency, Parameter, ProviderMethod};
use method::{MethodDeclaration, ParameterBinding};
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// How method parameters without an explicit resource reference are treated.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum BindingMode {
    /// Parameters can be bound by name.
    #[default]
    Lenient,
    /// Every parameter must reference a public resource explicitly.
    Strict,
}

struct ProviderInner {
    reference: ProviderRef,
    module: Module,
    base: Option<Provider>,
    binding_mode: BindingMode,
    resources: Vec<Resource>,
    resources_by_name: FxHashMap<Arc<str>, usize>,
    method_declarations: Vec<MethodDeclaration>,
    methods: Vec<ProviderMethod>,
    methods_by_resource: FxHashMap<Resource, usize>,
}

/// Shared handle to a provider definition. Handles are cheap to clone and compare by identity.
#[derive(Clone)]
pub struct Provider {
    inner: Arc<ProviderInner>,
}

impl Provider {
    /// Starts defining a provider for given module.
    pub fn builder<N: ToString>(name: N, module: &Module) -> ProviderBuilder {
        let name = name.to_string();
        ProviderBuilder {
            reference: ProviderRef::allocate(&name),
            name,
            module: module.clone(),
            base: None,
            binding_mode: BindingMode::default(),
            declarations: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Starts defining a provider which inherits resources and methods from `base`. The new
    /// provider provides for the same module and inherits its binding mode.
    pub fn extending<N: ToString>(name: N, base: &Provider) -> ProviderBuilder {
        let mut builder = Self::builder(name, base.module());
        builder.binding_mode = base.binding_mode();
        builder.base = Some(base.clone());
        builder
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.inner.reference.name()
    }

    #[inline]
    pub fn reference(&self) -> &ProviderRef {
        &self.inner.reference
    }

    /// The module this provider provides for.
    #[inline]
    pub fn module(&self) -> &Module {
        &self.inner.module
    }

    #[inline]
    pub fn base(&self) -> Option<&Provider> {
        self.inner.base.as_ref()
    }

    #[inline]
    pub fn binding_mode(&self) -> BindingMode {
        self.inner.binding_mode
    }

    /// Private and overriding resources, including inherited ones.
    #[inline]
    pub fn resources(&self) -> &[Resource] {
        &self.inner.resources
    }

    /// Returns the private or overriding resource with given name.
    pub fn resource(&self, name: &str) -> Option<Resource> {
        self.inner
            .resources_by_name
            .get(name)
            .map(|index| self.inner.resources[*index].clone())
    }

    /// All construction methods: first for provider resources, then for the remaining module
    /// resources.
    pub fn provider_methods(&self) -> impl Iterator<Item = &ProviderMethod> {
        self.inner.methods.iter()
    }

    /// Resources this provider must supply, i.e. the resources its methods construct.
    pub fn supplied_resources(&self) -> impl Iterator<Item = &Resource> {
        self.inner.methods.iter().map(|method| method.resource())
    }

    /// Returns the method constructing given resource. Overriding resources map to the method
    /// for the overridden resource. Returns `None` for resources unrelated to this provider.
    pub fn provider_method(&self, resource: &Resource) -> Option<&ProviderMethod> {
        let related = match resource.kind() {
            ResourceKind::Public => resource.module() == self.module(),
            ResourceKind::Private { provider } | ResourceKind::Override { provider, .. } => {
                provider == self.reference() && self.inner.resources_by_name.contains_key(resource.name())
            }
        };

        if !related {
            return None;
        }

        self.inner
            .methods_by_resource
            .get(resource.canonical())
            .map(|index| &self.inner.methods[*index])
    }
}

impl PartialEq for Provider {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.inner.reference == other.inner.reference
    }
}

impl Eq for Provider {}

impl Hash for Provider {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.reference.hash(state);
    }
}

impl Debug for Provider {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("name", &self.name())
            .field("module", &self.module().name())
            .field("base", &self.base().map(|base| base.name()))
            .field("resources", &self.inner.resources)
            .finish()
    }
}

impl Display for Provider {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Builder for [Provider]s. All declarations are validated when building.
pub struct ProviderBuilder {
    reference: ProviderRef,
    name: String,
    module: Module,
    base: Option<Provider>,
    binding_mode: BindingMode,
    declarations: Vec<(String, UnboundResource)>,
    methods: Vec<MethodDeclaration>,
}

impl ProviderBuilder {
    /// Declares a provider resource. It overrides the module resource with the same name, if
    /// there is one, and is private otherwise.
    pub fn declare<N: ToString>(self, name: N, ty: ResourceType) -> Self {
        let name = name.to_string();
        let resource = if self.module.contains(&name) {
            UnboundResource::overriding(ty)
        } else {
            UnboundResource::private(ty)
        };

        self.declare_unbound(name, resource)
    }

    /// Declares a provider resource of an explicit kind.
    pub fn declare_unbound<N: ToString>(mut self, name: N, resource: UnboundResource) -> Self {
        self.declarations.push((name.to_string(), resource));
        self
    }

    pub fn binding_mode(mut self, binding_mode: BindingMode) -> Self {
        self.binding_mode = binding_mode;
        self
    }

    /// Adds the construction method for the resource with given name.
    pub fn provides<T, F>(
        self,
        resource_name: &str,
        parameters: impl IntoIterator<Item = Parameter>,
        constructor: F,
    ) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Arguments) -> Result<InstancePtr<T>, ErrorPtr> + Send + Sync + 'static,
    {
        self.provides_as(resource_name, ResourceType::of::<T>(), parameters, constructor)
    }

    /// Like [ProviderBuilder::provides], with an explicit description of `T`, which can declare
    /// supertypes. The description must describe `T`.
    pub fn provides_as<T, F>(
        mut self,
        resource_name: &str,
        return_type: ResourceType,
        parameters: impl IntoIterator<Item = Parameter>,
        constructor: F,
    ) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Arguments) -> Result<InstancePtr<T>, ErrorPtr> + Send + Sync + 'static,
    {
        self.methods.push(MethodDeclaration {
            resource_name: resource_name.to_string(),
            return_type,
            constructed_type: ResourceType::of::<T>(),
            parameters: parameters.into_iter().collect(),
            constructor: Arc::new(move |arguments: &Arguments| constructor(arguments).map(erase)),
        });
        self
    }

    pub fn build(self) -> Result<Provider, ProviderDefinitionError> {
        let (resources, resources_by_name) = self.collect_resources()?;
        let method_declarations = self.collect_method_declarations(&resources_by_name)?;

        let binder = MethodBinder {
            builder: &self,
            resources: &resources,
            resources_by_name: &resources_by_name,
        };

        let mut methods = Vec::with_capacity(resources.len() + self.module.len());
        for target in resources.iter().cloned().chain(
            self.module
                .resources()
                .filter(|resource| !resources_by_name.contains_key(resource.name())),
        ) {
            let declaration = method_declarations
                .iter()
                .find(|declaration| declaration.resource_name == target.name())
                .ok_or_else(|| ProviderDefinitionError::MissingProviderMethod {
                    provider: self.name.clone(),
                    resource: target.clone(),
                })?;

            methods.push(binder.bind(&target, declaration)?);
        }

        let methods_by_resource = methods
            .iter()
            .enumerate()
            .map(|(index, method)| (method.resource().clone(), index))
            .collect();

        let ProviderBuilder {
            reference,
            module,
            base,
            binding_mode,
            ..
        } = self;

        Ok(Provider {
            inner: Arc::new(ProviderInner {
                reference,
                module,
                base,
                binding_mode,
                resources,
                resources_by_name,
                method_declarations,
                methods,
                methods_by_resource,
            }),
        })
    }

    fn collect_resources(
        &self,
    ) -> Result<(Vec<Resource>, FxHashMap<Arc<str>, usize>), ProviderDefinitionError> {
        let mut resources: Vec<Resource> = Vec::new();
        let mut resources_by_name: FxHashMap<Arc<str>, usize> = FxHashMap::default();

        for (name, declaration) in &self.declarations {
            let ty = declaration.resource_type().clone();
            let resource = match declaration.kind() {
                UnboundKind::Public => {
                    return Err(ProviderDefinitionError::CannotDeclarePublicResourceInProvider {
                        provider: self.name.clone(),
                        name: name.clone(),
                        resource: declaration.clone(),
                    })
                }
                UnboundKind::Private => {
                    if let Some(occluded) = self.module.resource(name) {
                        return Err(
                            ProviderDefinitionError::PrivateResourceCannotOccludeModuleResource {
                                provider: self.name.clone(),
                                resource: occluded,
                            },
                        );
                    }

                    Resource::private(
                        ty,
                        name.as_str().into(),
                        self.reference.clone(),
                        self.module.clone(),
                    )
                }
                UnboundKind::Override => {
                    let overrides = self.module.resource(name).ok_or_else(|| {
                        ProviderDefinitionError::OverridingResourceNameDoesntMatchModuleResource {
                            provider: self.name.clone(),
                            module: self.module.clone(),
                            name: name.clone(),
                        }
                    })?;

                    if !ty.is_subtype_of(overrides.resource_type()) {
                        return Err(ProviderDefinitionError::OverridingResourceIncompatibleType {
                            provider: self.name.clone(),
                            overrides,
                            ty,
                        });
                    }

                    Resource::overriding(ty, self.reference.clone(), overrides)
                }
            };

            if resources_by_name.contains_key(name.as_str()) {
                return Err(ProviderDefinitionError::DuplicateResourceName {
                    provider: self.name.clone(),
                    name: name.clone(),
                });
            }

            resources_by_name.insert(name.as_str().into(), resources.len());
            resources.push(resource);
        }

        if let Some(base) = &self.base {
            for inherited in base.resources() {
                if let Some(index) = resources_by_name.get(inherited.name()) {
                    let existing = &resources[*index];
                    if !existing
                        .resource_type()
                        .is_subtype_of(inherited.resource_type())
                    {
                        return Err(
                            ProviderDefinitionError::IncompatibleResourceTypeForInheritedResource {
                                provider: self.name.clone(),
                                base: base.clone(),
                                inherited: inherited.clone(),
                                ty: existing.resource_type().clone(),
                            },
                        );
                    }
                } else {
                    resources_by_name.insert(inherited.name().into(), resources.len());
                    resources.push(inherited.rebound_to(&self.reference));
                }
            }
        }

        Ok((resources, resources_by_name))
    }

    fn collect_method_declarations(
        &self,
        resources_by_name: &FxHashMap<Arc<str>, usize>,
    ) -> Result<Vec<MethodDeclaration>, ProviderDefinitionError> {
        let mut declarations = self
            .base
            .as_ref()
            .map(|base| base.inner.method_declarations.clone())
            .unwrap_or_default();

        let mut own_names = FxHashSet::default();
        for declaration in &self.methods {
            if !own_names.insert(declaration.resource_name.as_str()) {
                return Err(ProviderDefinitionError::DuplicateProviderMethod {
                    provider: self.name.clone(),
                    name: declaration.resource_name.clone(),
                });
            }

            if !resources_by_name.contains_key(declaration.resource_name.as_str())
                && !self.module.contains(&declaration.resource_name)
            {
                return Err(ProviderDefinitionError::ProviderMethodForUnknownResource {
                    provider: self.name.clone(),
                    name: declaration.resource_name.clone(),
                });
            }

            match declarations
                .iter_mut()
                .find(|inherited| inherited.resource_name == declaration.resource_name)
            {
                Some(inherited) => *inherited = declaration.clone(),
                None => declarations.push(declaration.clone()),
            }
        }

        Ok(declarations)
    }
}

struct MethodBinder<'a> {
    builder: &'a ProviderBuilder,
    resources: &'a [Resource],
    resources_by_name: &'a FxHashMap<Arc<str>, usize>,
}

impl MethodBinder<'_> {
    fn bind(
        &self,
        target: &Resource,
        declaration: &MethodDeclaration,
    ) -> Result<ProviderMethod, ProviderDefinitionError> {
        if declaration.return_type != declaration.constructed_type
            || !declaration
                .return_type
                .is_subtype_of(target.resource_type())
        {
            return Err(ProviderDefinitionError::ProviderMethodReturnTypeMismatch {
                provider: self.builder.name.clone(),
                resource: target.clone(),
                return_type: declaration.constructed_type.clone(),
            });
        }

        // keep the declared supertypes of the resource, if the method returns exactly its type
        let produces = if declaration.return_type == *target.resource_type() {
            target.resource_type().clone()
        } else {
            declaration.return_type.clone()
        };

        let mut parameter_names = FxHashSet::default();
        let mut dependencies = Vec::with_capacity(declaration.parameters.len());
        for parameter in &declaration.parameters {
            if !parameter_names.insert(parameter.name()) {
                return Err(ProviderDefinitionError::DuplicateParameterName {
                    provider: self.builder.name.clone(),
                    resource: target.clone(),
                    parameter: parameter.name.clone(),
                });
            }

            dependencies.push(self.bind_parameter(target, parameter)?);
        }

        Ok(ProviderMethod {
            provider: self.builder.reference.clone(),
            resource: target.canonical().clone(),
            produces,
            dependencies: dependencies.into(),
            constructor: declaration.constructor.clone(),
        })
    }

    fn bind_parameter(
        &self,
        target: &Resource,
        parameter: &Parameter,
    ) -> Result<Dependency, ProviderDefinitionError> {
        match &parameter.binding {
            ParameterBinding::Resource(resource) => match resource.kind() {
                ResourceKind::Public => Ok(Dependency {
                    name: parameter.name.clone(),
                    resource: resource.clone(),
                    ty: resource.resource_type().clone(),
                }),
                ResourceKind::Private { .. } | ResourceKind::Override { .. } => {
                    Err(ProviderDefinitionError::CannotDependOnProviderResource {
                        provider: self.builder.name.clone(),
                        resource: target.clone(),
                        parameter: parameter.name.clone(),
                        dependency: resource.clone(),
                    })
                }
            },
            ParameterBinding::Named(ty) => {
                if self.builder.binding_mode == BindingMode::Strict {
                    return Err(ProviderDefinitionError::NameBindingDisabled {
                        provider: self.builder.name.clone(),
                        resource: target.clone(),
                        parameter: parameter.name.clone(),
                    });
                }

                let refers_to = self
                    .resources_by_name
                    .get(parameter.name())
                    .map(|index| self.resources[*index].clone())
                    .or_else(|| self.builder.module.resource(parameter.name()))
                    .ok_or_else(|| ProviderDefinitionError::ProviderMethodParameterUnrelatedName {
                        provider: self.builder.name.clone(),
                        resource: target.clone(),
                        parameter: parameter.name.clone(),
                    })?;

                if !refers_to.resource_type().is_subtype_of(ty) {
                    return Err(
                        ProviderDefinitionError::ProviderMethodParameterResourceTypeMismatch {
                            provider: self.builder.name.clone(),
                            resource: target.clone(),
                            parameter: parameter.name.clone(),
                            refers_to,
                            ty: ty.clone(),
                        },
                    );
                }

                Ok(Dependency {
                    name: parameter.name.clone(),
                    resource: refers_to,
                    ty: ty.clone(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::instance::InstancePtr;
    use crate::module::Module;
    use crate::provider::{Parameter, Provider};
    use crate::resource::ResourceType;

    fn create_module() -> Module {
        Module::builder("Numbers")
            .declare("total", ResourceType::of::<u32>())
            .build()
            .unwrap()
    }

    fn create_base(module: &Module) -> Provider {
        Provider::builder("BaseProvider", module)
            .declare("step", ResourceType::of::<u32>())
            .provides::<u32, _>("step", [], |_| Ok(InstancePtr::new(1)))
            .provides::<u32, _>("total", [Parameter::named::<u32>("step")], |arguments| {
                Ok(InstancePtr::new(*arguments.get::<u32>("step")? * 10))
            })
            .build()
            .unwrap()
    }

    #[test]
    fn should_overlay_inherited_method_declarations() {
        let module = create_module();
        let base = create_base(&module);
        let derived = Provider::extending("DerivedProvider", &base)
            .provides::<u32, _>("step", [], |_| Ok(InstancePtr::new(2)))
            .build()
            .unwrap();

        let names: Vec<_> = derived
            .inner
            .method_declarations
            .iter()
            .map(|declaration| declaration.resource_name.as_str())
            .collect();
        assert_eq!(names, vec!["step", "total"]);
        assert_eq!(derived.provider_methods().count(), 2);
    }

    #[test]
    fn should_order_provider_resources_first() {
        let module = create_module();
        let provider = create_base(&module);

        let supplied: Vec<_> = provider
            .supplied_resources()
            .map(|resource| resource.name().to_string())
            .collect();
        assert_eq!(supplied, vec!["step", "total"]);
    }

    #[test]
    fn should_map_overriding_resources_to_public_methods() {
        let module = create_module();
        let provider = Provider::builder("OverridingProvider", &module)
            .declare("total", ResourceType::of::<u32>())
            .provides::<u32, _>("total", [], |_| Ok(InstancePtr::new(5)))
            .build()
            .unwrap();

        let public = module.resource("total").unwrap();
        let overriding = provider.resource("total").unwrap();

        let method = provider.provider_method(&overriding).unwrap();
        assert_eq!(method.resource(), &public);
        assert_eq!(method.produces(), overriding.resource_type());
        assert!(provider.provider_method(&public).is_some());
    }
}
