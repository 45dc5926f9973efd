use crate::container::{Registrant, ResolutionStep};
use crate::instance::ErrorPtr;
use crate::module::Module;
use crate::provider::Provider;
use crate::resource::{Resource, ResourceType, UnboundResource};
use itertools::Itertools;
use std::sync::Arc;
use thiserror::Error;

/// Errors related to defining modules.
#[derive(Error, Clone, Debug)]
pub enum ModuleDefinitionError {
    #[error("Module {module} declares resource '{name}' more than once")]
    DuplicateResourceName { module: String, name: String },
    #[error("Module {module} cannot declare '{name}' as {resource} - modules only contain public resources")]
    CannotDeclareProviderResourceInModule {
        module: String,
        name: String,
        resource: UnboundResource,
    },
    #[error("Cannot use {provider} as the default provider of {module}, since it provides for {}", .provider.module())]
    DefaultProviderProvidesToAnotherModule { module: Module, provider: Provider },
    #[error("Cannot change the default provider of {module} to {provider} - a container was already sealed using it")]
    DefaultProviderFrozen { module: Module, provider: Provider },
}

/// Errors related to defining providers. All of them are detected when building the provider.
#[derive(Error, Clone, Debug)]
pub enum ProviderDefinitionError {
    #[error("Provider {provider} cannot declare '{name}' as {resource} - public resources belong to modules")]
    CannotDeclarePublicResourceInProvider {
        provider: String,
        name: String,
        resource: UnboundResource,
    },
    #[error("Private resource '{}' of provider {provider} would occlude module resource {resource}", .resource.name())]
    PrivateResourceCannotOccludeModuleResource { provider: String, resource: Resource },
    #[error("Provider {provider} declares overriding resource '{name}', but module {module} has no such resource")]
    OverridingResourceNameDoesntMatchModuleResource {
        provider: String,
        module: Module,
        name: String,
    },
    #[error("Provider {provider} overrides {overrides} with incompatible type {ty}")]
    OverridingResourceIncompatibleType {
        provider: String,
        overrides: Resource,
        ty: ResourceType,
    },
    #[error("Provider {provider} redeclares {inherited} from {base} with incompatible type {ty}")]
    IncompatibleResourceTypeForInheritedResource {
        provider: String,
        base: Provider,
        inherited: Resource,
        ty: ResourceType,
    },
    #[error("Provider {provider} declares resource '{name}' more than once")]
    DuplicateResourceName { provider: String, name: String },
    #[error("Provider {provider} declares more than one method providing '{name}'")]
    DuplicateProviderMethod { provider: String, name: String },
    #[error("Provider {provider} declares a method for '{name}', which is not a resource of the provider or its module")]
    ProviderMethodForUnknownResource { provider: String, name: String },
    #[error("Provider {provider} is missing a method providing {resource}")]
    MissingProviderMethod { provider: String, resource: Resource },
    #[error("Method of provider {provider} for {resource} returns incompatible type {return_type}")]
    ProviderMethodReturnTypeMismatch {
        provider: String,
        resource: Resource,
        return_type: ResourceType,
    },
    #[error("Method of provider {provider} for {resource} declares parameter '{parameter}' more than once")]
    DuplicateParameterName {
        provider: String,
        resource: Resource,
        parameter: String,
    },
    #[error("Parameter '{parameter}' of the method of provider {provider} for {resource} does not name any resource of the provider or its module")]
    ProviderMethodParameterUnrelatedName {
        provider: String,
        resource: Resource,
        parameter: String,
    },
    #[error("Parameter '{parameter}: {ty}' of the method of provider {provider} for {resource} refers to {refers_to}, which has an incompatible type")]
    ProviderMethodParameterResourceTypeMismatch {
        provider: String,
        resource: Resource,
        parameter: String,
        refers_to: Resource,
        ty: ResourceType,
    },
    #[error("Parameter '{parameter}' of the method of provider {provider} for {resource} depends on provider resource {dependency}")]
    CannotDependOnProviderResource {
        provider: String,
        resource: Resource,
        parameter: String,
        dependency: Resource,
    },
    #[error("Parameter '{parameter}' of the method of provider {provider} for {resource} is bound by name, which strict binding does not allow")]
    NameBindingDisabled {
        provider: String,
        resource: Resource,
        parameter: String,
    },
}

/// Errors related to registering modules and providers in a container, sealing it, and providing
/// resources.
#[derive(Error, Clone, Debug)]
pub enum ContainerError {
    #[error("Module {module} is already registered")]
    ModuleAlreadyRegistered {
        module: Module,
        registered: Vec<Module>,
    },
    #[error("Provider {provider} provides for module {} instead of {module}", .provider.module())]
    ProviderModuleMismatch { provider: Provider, module: Module },
    #[error("Cannot register provider {provider}, since its module {} is not registered", .provider.module())]
    CannotRegisterProviderToUnknownModule {
        provider: Provider,
        registered: Vec<Module>,
    },
    #[error("Cannot register provider {registering} for module {module}, since {registered} is already registered")]
    ModuleProviderAlreadyRegistered {
        module: Module,
        registered: Provider,
        registering: Provider,
    },
    #[error("Cannot register {0} after the container is sealed")]
    CannotRegisterAfterContainerIsSealed(Registrant),
    #[error("Container is already sealed")]
    ContainerAlreadySealed,
    #[error("Module {0} has no registered or default provider")]
    ModuleWithoutProvider(Module),
    #[error("Circular dependency detected: {}", .0.iter().join(" => "))]
    CircularDependency(Vec<ResolutionStep>),
    #[error("Method constructing {resource} produces {produces}, which cannot be provided as {}", .resource.resource_type())]
    IncompatibleProducedType {
        resource: Resource,
        produces: ResourceType,
    },
    #[error("Dependency {step} cannot be satisfied: {produces} cannot be passed as {expected}")]
    IncompatibleDependency {
        step: ResolutionStep,
        produces: ResourceType,
        expected: ResourceType,
    },
    #[error("Cannot provide resources until the container is sealed")]
    CannotProvideUntilContainerIsSealed,
    #[error("Cannot provide {0}")]
    CannotProvideRawType(UnboundResource),
    #[error("Resource {resource} does not belong to any registered module")]
    UnknownResource {
        resource: Resource,
        registered: Vec<Module>,
    },
    #[error("Provider {provider} does not provide {resource}")]
    UnrelatedResource {
        provider: Provider,
        resource: Resource,
    },
    #[error("Provider resources cannot be provided directly: {0}")]
    ProviderResourcesNotAllowed(Resource),
    #[error("Resource {resource} cannot be provided as {requested}")]
    IncompatibleInstance {
        resource: Resource,
        requested: &'static str,
    },
    #[error("Error constructing {resource}: {source}")]
    ConstructionFailed { resource: Resource, source: ErrorPtr },
}

/// Errors related to reading arguments inside construction methods.
#[derive(Error, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum ArgumentError {
    #[error("Missing argument: {0}")]
    MissingArgument(String),
    #[error("Argument '{name}' cannot be read as {requested}")]
    IncompatibleArgument {
        name: String,
        requested: &'static str,
    },
}

impl From<ArgumentError> for ErrorPtr {
    fn from(error: ArgumentError) -> Self {
        Arc::new(error) as ErrorPtr
    }
}
