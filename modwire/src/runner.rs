//! Runners executing actual application logic.

#[cfg(test)]
use mockall::automock;
pub use modwire_di::instance::ErrorPtr;
use modwire_di::resource::ResourceType;

pub type ApplicationRunnerPtr = dyn ApplicationRunner + Send + Sync;

/// Runs application logic. Runners are resources added to the
/// [Application](crate::application::Application), which provides and runs them in order of
/// priority.
#[cfg_attr(test, automock)]
pub trait ApplicationRunner {
    /// Runs any application code.
    fn run(&self) -> Result<(), ErrorPtr>;

    /// Returns the priority for this runner. Higher priorities get run first. Default 0.
    fn priority(&self) -> i8 {
        0
    }
}

/// Type of runner resources.
pub fn runner_type() -> ResourceType {
    ResourceType::of::<ApplicationRunnerPtr>()
}
