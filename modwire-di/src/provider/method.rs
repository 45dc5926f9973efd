//! Construction methods and their parameters.

use crate::instance::{Arguments, ErrorPtr, InstanceAnyPtr};
use crate::resource::{ProviderRef, Resource, ResourceType};
use derivative::Derivative;
use std::sync::Arc;

pub(crate) type ConstructorFunction =
    dyn Fn(&Arguments) -> Result<InstanceAnyPtr, ErrorPtr> + Send + Sync;

#[derive(Clone, Debug)]
pub(crate) enum ParameterBinding {
    Named(ResourceType),
    Resource(Resource),
}

/// A parameter of a construction method, which is bound to a resource when the provider is
/// built.
#[derive(Clone, Debug)]
pub struct Parameter {
    pub(crate) name: String,
    pub(crate) binding: ParameterBinding,
}

impl Parameter {
    /// Binds the parameter by name: to a private or overriding resource of the provider with that
    /// name or, failing that, to the module resource with that name. The resolved resource must be
    /// a subtype of `T`.
    pub fn named<T: ?Sized + Send + Sync + 'static>(name: &str) -> Self {
        Self::named_as(name, ResourceType::of::<T>())
    }

    /// Like [Parameter::named], with an explicit type description.
    pub fn named_as(name: &str, ty: ResourceType) -> Self {
        Self {
            name: name.to_string(),
            binding: ParameterBinding::Named(ty),
        }
    }

    /// Binds the parameter to the given public resource, which may belong to any module.
    pub fn resource(name: &str, resource: &Resource) -> Self {
        Self {
            name: name.to_string(),
            binding: ParameterBinding::Resource(resource.clone()),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A construction method as declared on a provider builder, before its parameters are bound.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub(crate) struct MethodDeclaration {
    pub(crate) resource_name: String,
    pub(crate) return_type: ResourceType,
    pub(crate) constructed_type: ResourceType,
    pub(crate) parameters: Vec<Parameter>,
    #[derivative(Debug = "ignore")]
    pub(crate) constructor: Arc<ConstructorFunction>,
}

/// A parameter bound to the resource it depends on.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Dependency {
    pub(crate) name: String,
    pub(crate) resource: Resource,
    pub(crate) ty: ResourceType,
}

impl Dependency {
    /// Name of the parameter.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The resource the parameter resolves to.
    #[inline]
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// The type the argument is handed to the constructor as - the declared parameter type.
    #[inline]
    pub fn parameter_type(&self) -> &ResourceType {
        &self.ty
    }
}

/// A construction method with all dependencies bound. Cheap to clone.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct ProviderMethod {
    pub(crate) provider: ProviderRef,
    pub(crate) resource: Resource,
    pub(crate) produces: ResourceType,
    pub(crate) dependencies: Arc<[Dependency]>,
    #[derivative(Debug = "ignore")]
    pub(crate) constructor: Arc<ConstructorFunction>,
}

impl ProviderMethod {
    /// The provider declaring this method.
    #[inline]
    pub fn provider(&self) -> &ProviderRef {
        &self.provider
    }

    /// The resource this method constructs. For overriding resources, this is the overridden
    /// public resource.
    #[inline]
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// The type of the constructed instances.
    #[inline]
    pub fn produces(&self) -> &ResourceType {
        &self.produces
    }

    /// Dependencies in parameter order.
    #[inline]
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub(crate) fn construct(&self, arguments: &Arguments) -> Result<InstanceAnyPtr, ErrorPtr> {
        (self.constructor)(arguments)
    }
}
