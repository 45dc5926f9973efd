//! Module-based dependency injection with seal-time graph validation.
//!
//! Resources are named, typed value slots. [Modules](module::Module) group public resources into a
//! contract, [providers](provider::Provider) fulfill that contract with construction methods, and
//! a [container](container::Container) binds modules to providers, discovers modules required
//! transitively, detects circular dependencies and finally constructs every resource lazily, at
//! most once.
//!
//! All definitions are built explicitly with builders and validated when built, so a sealed
//! container can only fail to provide a resource when a construction method itself fails.

pub mod cache;
pub mod container;
mod error;
pub mod instance;
pub mod module;
pub mod provider;
pub mod resource;

pub use error::{ArgumentError, ContainerError, ModuleDefinitionError, ProviderDefinitionError};
