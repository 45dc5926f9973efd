//! Application framework based on [modwire_di] dependency injection.
//!
//! Traditional applications start in the `main()` function and explicitly initialize and pass
//! around their services. With modules and providers, services form a dependency graph managed by
//! a [Container](modwire_di::container::Container) instead. This crate provides the entrypoint for
//! such applications in the form of [Application](application::Application), which installs
//! modules, validates the graph, configures supporting infrastructure like logging, and runs
//! [ApplicationRunners](runner::ApplicationRunner).

pub mod application;
pub mod config;
pub mod runner;
