// note: this example assumes you've analyzed the previous ones

use modwire_di::container::Container;
use modwire_di::instance::InstancePtr;
use modwire_di::module::Module;
use modwire_di::provider::{Parameter, Provider};
use modwire_di::resource::ResourceType;

trait Storage {
    fn describe(&self) -> String;
}

struct MemoryStorage {
    capacity: usize,
}

impl Storage for MemoryStorage {
    fn describe(&self) -> String {
        format!("memory storage for {} entries", self.capacity)
    }
}

impl MemoryStorage {
    fn capacity(&self) -> usize {
        self.capacity
    }
}

type StoragePtr = InstancePtr<dyn Storage + Send + Sync>;

// note: for the sake of simplicity, errors are unwrapped, rather than gracefully handled
fn main() {
    let module = Module::builder("Storage")
        .declare("storage", ResourceType::of::<dyn Storage + Send + Sync>())
        .build()
        .unwrap();

    // a narrower type needs to declare what it can be used as
    let memory_storage_type = ResourceType::builder::<MemoryStorage>()
        .implements::<dyn Storage + Send + Sync>(|storage| storage as StoragePtr)
        .build();

    // "storage" exists in the module, so it's overridden with the narrower type, while "capacity"
    // is private to the provider
    let provider = Provider::builder("MemoryStorageProvider", &module)
        .declare("storage", memory_storage_type)
        .declare("capacity", ResourceType::of::<usize>())
        .provides::<usize, _>("capacity", [], |_| Ok(InstancePtr::new(64)))
        .provides::<MemoryStorage, _>(
            "storage",
            [Parameter::named::<usize>("capacity")],
            |arguments| {
                Ok(InstancePtr::new(MemoryStorage {
                    capacity: *arguments.get::<usize>("capacity")?,
                }))
            },
        )
        .build()
        .unwrap();

    let mut container = Container::new();
    container.register(&module, Some(&provider)).unwrap();
    container.seal().unwrap();

    // consumers of the module see the public type
    let storage = container
        .provide::<dyn Storage + Send + Sync>(&module.resource("storage").unwrap())
        .unwrap();

    // prints "memory storage for 64 entries"
    println!("{}", storage.describe());

    // the overriding resource is the same instance, with the narrower type
    let memory = container
        .provide::<MemoryStorage>(&provider.resource("storage").unwrap())
        .unwrap();

    // prints "64"
    println!("{}", memory.capacity());
}
