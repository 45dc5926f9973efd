//! Seal-time graph computation: closure discovery, default provider fallback and cycle detection.

use crate::error::ContainerError;
use crate::module::Module;
use crate::provider::{Provider, ProviderMethod};
use crate::resource::Resource;
use fxhash::{FxHashMap, FxHashSet};
use std::fmt::{Display, Formatter};
use tracing::debug;

/// A single edge of the dependency graph: `target` depends on `depends_on` through a parameter of
/// its construction method.
#[derive(Clone, Debug)]
pub struct ResolutionStep {
    pub target: Resource,
    pub provider_method: ProviderMethod,
    pub parameter_name: String,
    pub depends_on: Resource,
}

impl Display for ResolutionStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}) -> {}",
            self.target, self.parameter_name, self.depends_on
        )
    }
}

/// Result of a successful graph computation, ready to be committed to a container.
#[derive(Debug)]
pub(crate) struct ModuleGraph {
    pub(crate) private_modules: Vec<Module>,
    pub(crate) providers: FxHashMap<Module, Provider>,
    pub(crate) defaulted_modules: Vec<Module>,
}

/// Works on a copy of the registrations, so a failed seal leaves the container untouched.
pub(crate) struct GraphSolver<'a> {
    public_modules: &'a [Module],
    providers: FxHashMap<Module, Provider>,
}

impl<'a> GraphSolver<'a> {
    pub(crate) fn new(public_modules: &'a [Module], providers: &FxHashMap<Module, Provider>) -> Self {
        Self {
            public_modules,
            providers: providers.clone(),
        }
    }

    pub(crate) fn solve(mut self) -> Result<ModuleGraph, ContainerError> {
        let mut known: FxHashSet<Module> = self.public_modules.iter().cloned().collect();
        let mut private_modules = Vec::new();
        let mut defaulted_modules = Vec::new();

        let mut without_provider: Vec<Module> = self
            .public_modules
            .iter()
            .filter(|module| !self.providers.contains_key(*module))
            .cloned()
            .collect();

        let mut unscanned: Vec<Provider> = self
            .public_modules
            .iter()
            .filter_map(|module| self.providers.get(module))
            .cloned()
            .collect();

        loop {
            for provider in unscanned.drain(..) {
                for dependency in provider
                    .provider_methods()
                    .flat_map(|method| method.dependencies())
                {
                    let module = dependency.resource().module();
                    if known.insert(module.clone()) {
                        debug!(
                            module = module.name(),
                            provider = provider.name(),
                            "Discovered implicitly required module."
                        );

                        private_modules.push(module.clone());
                        without_provider.push(module.clone());
                    }
                }
            }

            if without_provider.is_empty() {
                break;
            }

            for module in without_provider.drain(..) {
                let provider = module
                    .default_provider()
                    .ok_or_else(|| ContainerError::ModuleWithoutProvider(module.clone()))?;

                debug!(
                    module = module.name(),
                    provider = provider.name(),
                    "Falling back to default provider."
                );

                self.providers.insert(module.clone(), provider.clone());
                defaulted_modules.push(module);
                unscanned.push(provider);
            }
        }

        let modules: Vec<&Module> = self
            .public_modules
            .iter()
            .chain(private_modules.iter())
            .collect();

        CycleDetector::new(&self.providers, self.public_modules).detect(modules)?;

        Ok(ModuleGraph {
            private_modules,
            providers: self.providers,
            defaulted_modules,
        })
    }
}

/// Depth-first search over construction method dependencies. Every node is walked at most once.
/// Besides cycles, every edge is checked for the produced instance being passable to the
/// parameter it binds to.
struct CycleDetector<'a> {
    providers: &'a FxHashMap<Module, Provider>,
    public_modules: &'a [Module],
    in_stack: FxHashSet<Resource>,
    solved: FxHashSet<Resource>,
    path: Vec<ResolutionStep>,
}

impl<'a> CycleDetector<'a> {
    fn new(providers: &'a FxHashMap<Module, Provider>, public_modules: &'a [Module]) -> Self {
        Self {
            providers,
            public_modules,
            in_stack: Default::default(),
            solved: Default::default(),
            path: Vec::new(),
        }
    }

    fn detect<'m>(mut self, modules: impl IntoIterator<Item = &'m Module>) -> Result<(), ContainerError> {
        let providers = self.providers;
        for module in modules {
            if let Some(provider) = providers.get(module) {
                for resource in provider.supplied_resources() {
                    self.visit(resource)?;
                }
            }
        }

        Ok(())
    }

    fn method_for(&self, resource: &Resource) -> Result<&'a ProviderMethod, ContainerError> {
        let providers = self.providers;
        providers
            .get(resource.module())
            .and_then(|provider| provider.provider_method(resource))
            .ok_or_else(|| ContainerError::UnknownResource {
                resource: resource.clone(),
                registered: self.public_modules.to_vec(),
            })
    }

    fn visit(&mut self, resource: &Resource) -> Result<(), ContainerError> {
        if self.solved.contains(resource) {
            return Ok(());
        }

        let method = self.method_for(resource)?;

        // overriding methods may produce a type which is only related to the overriding resource
        if !method.produces().is_subtype_of(resource.resource_type()) {
            return Err(ContainerError::IncompatibleProducedType {
                resource: resource.clone(),
                produces: method.produces().clone(),
            });
        }

        self.in_stack.insert(resource.clone());

        for dependency in method.dependencies() {
            let next = dependency.resource().canonical();
            let step = ResolutionStep {
                target: resource.clone(),
                provider_method: method.clone(),
                parameter_name: dependency.name().to_string(),
                depends_on: dependency.resource().clone(),
            };

            if self.in_stack.contains(next) {
                // the cycle starts with the step leaving the node it closes on
                let start = self
                    .path
                    .iter()
                    .position(|step| step.target == *next)
                    .unwrap_or(self.path.len());

                let mut cycle = self.path.split_off(start);
                cycle.push(step);
                return Err(ContainerError::CircularDependency(cycle));
            }

            let produces = self.method_for(next)?.produces();
            if !produces.is_subtype_of(dependency.parameter_type()) {
                return Err(ContainerError::IncompatibleDependency {
                    step,
                    produces: produces.clone(),
                    expected: dependency.parameter_type().clone(),
                });
            }

            self.path.push(step);
            self.visit(next)?;
            self.path.pop();
        }

        self.in_stack.remove(resource);
        self.solved.insert(resource.clone());

        Ok(())
    }
}
