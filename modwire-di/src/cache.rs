//! Constructed instances are kept in an [InstanceCache]. The
//! [Container](crate::container::Container) uses a [SingletonCache], so every resource is
//! constructed at most once per container.
//!
//! Instances are cached under the resource which constructed them: overriding resources share the
//! entry of the public resource they override.

use crate::instance::InstanceAnyPtr;
use crate::resource::{Resource, ResourceType};
use fxhash::FxHashMap;
#[cfg(test)]
use mockall::automock;

pub type InstanceCachePtr = Box<dyn InstanceCache + Send + Sync>;

/// An instance together with the type it was constructed as.
#[derive(Clone, Debug)]
pub struct CachedInstance {
    pub instance: InstanceAnyPtr,
    pub ty: ResourceType,
}

/// Storage for constructed instances.
#[cfg_attr(test, automock)]
pub trait InstanceCache {
    /// Gets the instance stored for given resource, if available.
    fn instance(&self, resource: &Resource) -> Option<CachedInstance>;

    /// Stores given instance, replacing any previous one.
    fn store_instance(&mut self, resource: &Resource, instance: CachedInstance);

    /// Number of stored instances.
    fn instance_count(&self) -> usize;
}

/// Keeps every stored instance for the lifetime of the cache.
#[derive(Default, Debug)]
pub struct SingletonCache {
    instances: FxHashMap<Resource, CachedInstance>,
}

impl InstanceCache for SingletonCache {
    #[inline]
    fn instance(&self, resource: &Resource) -> Option<CachedInstance> {
        self.instances.get(resource).cloned()
    }

    #[inline]
    fn store_instance(&mut self, resource: &Resource, instance: CachedInstance) {
        self.instances.insert(resource.clone(), instance);
    }

    #[inline]
    fn instance_count(&self) -> usize {
        self.instances.len()
    }
}

#[cfg(test)]
mod tests {
    use crate::cache::{CachedInstance, InstanceCache, SingletonCache};
    use crate::instance::{downcast, erase, InstancePtr};
    use crate::module::Module;
    use crate::resource::{Resource, ResourceType};

    fn create_resource() -> Resource {
        Module::builder("Numbers")
            .declare("answer", ResourceType::of::<u8>())
            .build()
            .unwrap()
            .resource("answer")
            .unwrap()
    }

    fn create_instance() -> CachedInstance {
        CachedInstance {
            instance: erase(InstancePtr::new(42u8)),
            ty: ResourceType::of::<u8>(),
        }
    }

    #[test]
    fn should_support_singletons() {
        let resource = create_resource();
        let mut cache = SingletonCache::default();

        assert!(cache.instance(&resource).is_none());
        cache.store_instance(&resource, create_instance());

        let first = downcast::<u8>(&cache.instance(&resource).unwrap().instance).unwrap();
        let second = downcast::<u8>(&cache.instance(&resource).unwrap().instance).unwrap();
        assert!(InstancePtr::ptr_eq(&first, &second));
        assert_eq!(*first, 42);
        assert_eq!(cache.instance_count(), 1);
    }

    #[test]
    fn should_not_share_instances_between_resources() {
        let mut cache = SingletonCache::default();
        cache.store_instance(&create_resource(), create_instance());

        assert!(cache.instance(&create_resource()).is_none());
    }
}
