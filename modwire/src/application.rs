//! Core application framework functionality.
//!
//! ```no_run
//! use modwire::application::Application;
//! use modwire::runner::{runner_type, ApplicationRunner, ApplicationRunnerPtr, ErrorPtr};
//! use modwire_di::instance::InstancePtr;
//! use modwire_di::module::Module;
//! use modwire_di::provider::Provider;
//!
//! struct HelloRunner;
//!
//! impl ApplicationRunner for HelloRunner {
//!     fn run(&self) -> Result<(), ErrorPtr> {
//!         println!("Hello world!");
//!         Ok(())
//!     }
//! }
//!
//! let module = Module::builder("Hello")
//!     .declare("runner", runner_type())
//!     .build()
//!     .unwrap();
//!
//! let provider = Provider::builder("HelloProvider", &module)
//!     .provides::<ApplicationRunnerPtr, _>("runner", [], |_| {
//!         Ok(InstancePtr::new(HelloRunner) as InstancePtr<ApplicationRunnerPtr>)
//!     })
//!     .build()
//!     .unwrap();
//!
//! let mut application = Application::from_environment().unwrap();
//! application.install_module(&module, Some(&provider)).unwrap();
//! application.add_runner(&module.resource("runner").unwrap()).unwrap();
//! application.run().unwrap();
//! ```

use crate::config::ApplicationConfig;
use crate::runner::ApplicationRunnerPtr;
use config::ConfigError;
use itertools::Itertools;
use modwire_di::container::{Container, ContainerBuilder};
use modwire_di::instance::{ErrorPtr, InstancePtr};
use modwire_di::module::Module;
use modwire_di::provider::Provider;
use modwire_di::resource::Resource;
use modwire_di::ContainerError;
use std::cmp::Reverse;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Error loading configuration: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Container error: {0}")]
    ContainerError(#[from] ContainerError),
    #[error("Resource {0} is not an application runner")]
    InvalidRunner(Resource),
    #[error("Error retrieving runners: {0}")]
    RunnerInjectionError(ContainerError),
    #[error("Runner error: {0}")]
    RunnerError(ErrorPtr),
}

/// Main entrypoint for the application. Installs modules into a [Container], seals it and runs
/// [ApplicationRunners](crate::runner::ApplicationRunner).
pub struct Application {
    config: ApplicationConfig,
    container: Container,
    runners: Vec<Resource>,
}

impl Application {
    pub fn new(config: ApplicationConfig) -> Self {
        let container = ContainerBuilder::new()
            .allow_provider_resources(config.allow_provider_resources)
            .build();

        Self {
            config,
            container,
            runners: Vec::new(),
        }
    }

    /// Creates an application with configuration loaded from the environment.
    pub fn from_environment() -> Result<Self, ApplicationError> {
        Ok(Self::new(ApplicationConfig::from_environment()?))
    }

    #[inline]
    pub fn config(&self) -> &ApplicationConfig {
        &self.config
    }

    #[inline]
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Installs a module, optionally together with its provider.
    pub fn install_module(
        &mut self,
        module: &Module,
        provider: Option<&Provider>,
    ) -> Result<(), ApplicationError> {
        self.container.register(module, provider)?;
        Ok(())
    }

    /// Installs the provider of an already installed module.
    pub fn install_provider(&mut self, provider: &Provider) -> Result<(), ApplicationError> {
        self.container.register_provider(provider)?;
        Ok(())
    }

    /// Adds a resource to run when the application runs. Its type must be
    /// [ApplicationRunnerPtr]. Adding the same resource twice has no effect.
    pub fn add_runner(&mut self, runner: &Resource) -> Result<(), ApplicationError> {
        if !runner.resource_type().is::<ApplicationRunnerPtr>() {
            return Err(ApplicationError::InvalidRunner(runner.clone()));
        }

        if !self.runners.contains(runner) {
            self.runners.push(runner.clone());
        }

        Ok(())
    }

    /// Installs supporting infrastructure and seals the container. Called by
    /// [Application::run] if needed.
    pub fn ready(&mut self) -> Result<(), ApplicationError> {
        if self.config.install_tracing_logger {
            install_tracing_logger();
        }

        info!("Sealing application container...");
        self.container.seal()?;
        Ok(())
    }

    /// Provides an instance of given resource.
    pub fn provide<T: ?Sized + Send + Sync + 'static>(
        &self,
        resource: &Resource,
    ) -> Result<InstancePtr<T>, ApplicationError> {
        Ok(self.container.provide::<T>(resource)?)
    }

    /// Runs all runners, from the highest priority to the lowest. Runners with equal priority run
    /// in the order they were added. Stops at the first failing runner.
    pub fn run(&mut self) -> Result<(), ApplicationError> {
        if !self.container.is_sealed() {
            self.ready()?;
        }

        info!("Searching for application runners...");

        let runners: Vec<_> = self
            .runners
            .iter()
            .map(|runner| self.container.provide::<ApplicationRunnerPtr>(runner))
            .try_collect()
            .map_err(ApplicationError::RunnerInjectionError)?;

        info!(runners = runners.len(), "Running application runners...");

        for runner in runners
            .iter()
            .sorted_by_key(|runner| Reverse(runner.priority()))
        {
            runner.run().map_err(ApplicationError::RunnerError)?;
        }

        Ok(())
    }
}

fn install_tracing_logger() {
    // a subscriber installed by the host stays in place
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
