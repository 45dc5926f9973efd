//! Resources are the nodes of the dependency graph: named, typed value slots owned by exactly one
//! [Module](crate::module::Module) or [Provider](crate::provider::Provider).
//!
//! A resource comes in one of three kinds:
//!
//! * [ResourceKind::Public] - part of a module's contract, owned by the module.
//! * [ResourceKind::Private] - visible only within the provider which declares it.
//! * [ResourceKind::Override] - a provider-declared replacement of a public resource with a
//!   covariant type.
//!
//! Before a name and an owner are known, a declaration is represented by an [UnboundResource].
//! Builders bind those declarations, producing [Resource]s.
//!
//! ## Types
//!
//! The type of a resource is described by a [ResourceType]. Rust has no subtyping between
//! arbitrary types, so covariance is declared explicitly, together with the conversion which
//! turns an instance of the subtype into an instance of the supertype:
//!
//! ```
//! use modwire_di::instance::InstancePtr;
//! use modwire_di::resource::ResourceType;
//!
//! trait Storage: Send + Sync {}
//!
//! struct MemoryStorage;
//!
//! impl Storage for MemoryStorage {}
//!
//! let storage = ResourceType::of::<dyn Storage + Send + Sync>();
//! let memory = ResourceType::builder::<MemoryStorage>()
//!     .implements::<dyn Storage + Send + Sync>(|memory| memory as InstancePtr<dyn Storage + Send + Sync>)
//!     .build();
//!
//! assert!(memory.is_subtype_of(&storage));
//! assert!(!storage.is_subtype_of(&memory));
//! ```

use crate::instance::{downcast, erase, InstanceAnyPtr, InstancePtr};
use crate::module::Module;
use derivative::Derivative;
use std::any::{type_name, TypeId};
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

type UpcastFunction = Arc<dyn Fn(&InstanceAnyPtr) -> Option<InstanceAnyPtr> + Send + Sync>;

#[derive(Derivative, Clone)]
#[derivative(Debug)]
struct Supertype {
    id: TypeId,
    name: &'static str,
    #[derivative(Debug = "ignore")]
    upcast: UpcastFunction,
}

/// Runtime description of the type of a resource. Equality only considers the described type,
/// not the declared supertypes.
#[derive(Clone)]
pub struct ResourceType {
    id: TypeId,
    name: &'static str,
    supertypes: Arc<[Supertype]>,
}

impl ResourceType {
    /// Describes `T` without any supertypes.
    pub fn of<T: ?Sized + Send + Sync + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            supertypes: Arc::new([]),
        }
    }

    /// Starts describing `T` together with its supertypes.
    pub fn builder<T: ?Sized + Send + Sync + 'static>() -> ResourceTypeBuilder<T> {
        ResourceTypeBuilder {
            supertypes: Vec::new(),
            _phantom: PhantomData,
        }
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Checks if an instance of this type can be used where `other` is expected.
    pub fn is_subtype_of(&self, other: &ResourceType) -> bool {
        self.id == other.id
            || self
                .supertypes
                .iter()
                .any(|supertype| supertype.id == other.id)
    }

    /// Checks if this type describes `T`.
    #[inline]
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    /// Converts an instance of this type to an instance of `target`. Returns `None` when `target`
    /// is neither this type nor one of its declared supertypes, or when the instance was not
    /// created for this type.
    pub(crate) fn cast(&self, instance: &InstanceAnyPtr, target: &ResourceType) -> Option<InstanceAnyPtr> {
        if self.id == target.id {
            return Some(instance.clone());
        }

        self.supertypes
            .iter()
            .find(|supertype| supertype.id == target.id)
            .and_then(|supertype| (supertype.upcast)(instance))
    }
}

impl PartialEq for ResourceType {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ResourceType {}

impl Hash for ResourceType {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Debug for ResourceType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceType")
            .field("name", &self.name)
            .field(
                "supertypes",
                &self
                    .supertypes
                    .iter()
                    .map(|supertype| supertype.name)
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Display for ResourceType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

/// Builder for [ResourceType]s with declared supertypes.
pub struct ResourceTypeBuilder<T: ?Sized> {
    supertypes: Vec<Supertype>,
    _phantom: PhantomData<fn(InstancePtr<T>)>,
}

impl<T: ?Sized + Send + Sync + 'static> ResourceTypeBuilder<T> {
    /// Declares `S` as a supertype of `T`. The given function converts instances, which for trait
    /// objects is usually a plain unsizing cast.
    pub fn implements<S: ?Sized + Send + Sync + 'static>(
        mut self,
        upcast: fn(InstancePtr<T>) -> InstancePtr<S>,
    ) -> Self {
        let id = TypeId::of::<S>();
        if id == TypeId::of::<T>() || self.supertypes.iter().any(|supertype| supertype.id == id) {
            return self;
        }

        self.supertypes.push(Supertype {
            id,
            name: type_name::<S>(),
            upcast: Arc::new(move |instance: &InstanceAnyPtr| {
                downcast::<T>(instance).map(|instance| erase(upcast(instance)))
            }),
        });
        self
    }

    pub fn build(self) -> ResourceType {
        ResourceType {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            supertypes: self.supertypes.into(),
        }
    }
}

/// Kind of a resource declaration, before it is bound to an owner.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum UnboundKind {
    Public,
    Private,
    Override,
}

impl Display for UnboundKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            UnboundKind::Public => "public",
            UnboundKind::Private => "private",
            UnboundKind::Override => "overriding",
        })
    }
}

/// A resource declaration without a name or an owner. Builders turn these into [Resource]s.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct UnboundResource {
    ty: ResourceType,
    kind: UnboundKind,
}

impl UnboundResource {
    pub fn new(ty: ResourceType, kind: UnboundKind) -> Self {
        Self { ty, kind }
    }

    pub fn public(ty: ResourceType) -> Self {
        Self::new(ty, UnboundKind::Public)
    }

    pub fn private(ty: ResourceType) -> Self {
        Self::new(ty, UnboundKind::Private)
    }

    pub fn overriding(ty: ResourceType) -> Self {
        Self::new(ty, UnboundKind::Override)
    }

    #[inline]
    pub fn resource_type(&self) -> &ResourceType {
        &self.ty
    }

    #[inline]
    pub fn kind(&self) -> UnboundKind {
        self.kind
    }
}

impl Display for UnboundResource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unbound {} resource of type {}", self.kind, self.ty)
    }
}

static NEXT_PROVIDER_ID: AtomicU64 = AtomicU64::new(0);

/// Identity of a provider, as referenced by the resources it owns. Two references are equal when
/// they point to the same provider, regardless of names.
#[derive(Clone)]
pub struct ProviderRef {
    id: u64,
    name: Arc<str>,
}

impl ProviderRef {
    pub(crate) fn allocate(name: &str) -> Self {
        Self {
            id: NEXT_PROVIDER_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for ProviderRef {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ProviderRef {}

impl Hash for ProviderRef {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Debug for ProviderRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ProviderRef")
            .field(&self.id)
            .field(&self.name)
            .finish()
    }
}

impl Display for ProviderRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Kind and owner of a bound resource.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum ResourceKind {
    /// Owned by the module of the resource.
    Public,
    /// Owned by the given provider.
    Private { provider: ProviderRef },
    /// Owned by the given provider and replacing the given public resource of the same module.
    Override {
        provider: ProviderRef,
        overrides: Box<Resource>,
    },
}

/// A bound resource: a node of the dependency graph. Identity is the combination of kind, type,
/// name and owner.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Resource {
    kind: ResourceKind,
    ty: ResourceType,
    name: Arc<str>,
    module: Module,
}

impl Resource {
    pub(crate) fn public(ty: ResourceType, name: Arc<str>, module: Module) -> Self {
        Self {
            kind: ResourceKind::Public,
            ty,
            name,
            module,
        }
    }

    pub(crate) fn private(ty: ResourceType, name: Arc<str>, provider: ProviderRef, module: Module) -> Self {
        Self {
            kind: ResourceKind::Private { provider },
            ty,
            name,
            module,
        }
    }

    pub(crate) fn overriding(ty: ResourceType, provider: ProviderRef, overrides: Resource) -> Self {
        debug_assert!(overrides.is_public());

        Self {
            ty,
            name: overrides.name.clone(),
            module: overrides.module.clone(),
            kind: ResourceKind::Override {
                provider,
                overrides: Box::new(overrides),
            },
        }
    }

    /// Returns the same declaration owned by another provider. Public resources are returned
    /// unchanged.
    pub(crate) fn rebound_to(&self, provider: &ProviderRef) -> Self {
        match &self.kind {
            ResourceKind::Public => self.clone(),
            ResourceKind::Private { .. } => Self::private(
                self.ty.clone(),
                self.name.clone(),
                provider.clone(),
                self.module.clone(),
            ),
            ResourceKind::Override { overrides, .. } => {
                Self::overriding(self.ty.clone(), provider.clone(), overrides.as_ref().clone())
            }
        }
    }

    #[inline]
    pub fn kind(&self) -> &ResourceKind {
        &self.kind
    }

    #[inline]
    pub fn resource_type(&self) -> &ResourceType {
        &self.ty
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The module this resource belongs to. For provider resources, this is the module of the
    /// owning provider.
    #[inline]
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// The owning provider of private and overriding resources.
    pub fn provider(&self) -> Option<&ProviderRef> {
        match &self.kind {
            ResourceKind::Public => None,
            ResourceKind::Private { provider } | ResourceKind::Override { provider, .. } => {
                Some(provider)
            }
        }
    }

    #[inline]
    pub fn is_public(&self) -> bool {
        matches!(self.kind, ResourceKind::Public)
    }

    /// The resource under which instances are built and cached: the overridden public resource
    /// for overriding resources, the resource itself otherwise.
    pub(crate) fn canonical(&self) -> &Resource {
        match &self.kind {
            ResourceKind::Override { overrides, .. } => overrides,
            ResourceKind::Public | ResourceKind::Private { .. } => self,
        }
    }
}

impl Debug for Resource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("Resource");
        debug
            .field("name", &self.name)
            .field("type", &self.ty.name())
            .field("module", &self.module.name());

        match &self.kind {
            ResourceKind::Public => {}
            ResourceKind::Private { provider } => {
                debug.field("private_to", &provider.name());
            }
            ResourceKind::Override { provider, .. } => {
                debug.field("overridden_by", &provider.name());
            }
        }

        debug.finish()
    }
}

impl Display for Resource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ResourceKind::Public => write!(f, "{}.{}: {}", self.module, self.name, self.ty),
            ResourceKind::Private { provider } | ResourceKind::Override { provider, .. } => {
                write!(f, "{}.{}: {}", provider, self.name, self.ty)
            }
        }
    }
}
