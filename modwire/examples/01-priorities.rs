// note: this example assumes you've analyzed the previous one

use modwire::application::Application;
use modwire::config::ApplicationConfig;
use modwire::runner::{runner_type, ApplicationRunner, ApplicationRunnerPtr, ErrorPtr};
use modwire_di::instance::InstancePtr;
use modwire_di::module::Module;
use modwire_di::provider::Provider;

struct PrintRunner {
    text: &'static str,
    priority: i8,
}

impl ApplicationRunner for PrintRunner {
    fn run(&self) -> Result<(), ErrorPtr> {
        print!("{}", self.text);
        Ok(())
    }

    // for ordered execution of application runners, priorities can be used
    fn priority(&self) -> i8 {
        self.priority
    }
}

fn print_runner(text: &'static str, priority: i8) -> InstancePtr<ApplicationRunnerPtr> {
    InstancePtr::new(PrintRunner { text, priority }) as InstancePtr<ApplicationRunnerPtr>
}

// note: for the sake of simplicity, errors are unwrapped, rather than gracefully handled
fn main() {
    let module = Module::builder("Printing")
        .declare("exclamation", runner_type())
        .declare("world", runner_type())
        .declare("hello", runner_type())
        .build()
        .unwrap();

    let provider = Provider::builder("PrintingProvider", &module)
        .provides::<ApplicationRunnerPtr, _>("exclamation", [], |_| Ok(print_runner("!\n", 1)))
        .provides::<ApplicationRunnerPtr, _>("world", [], |_| Ok(print_runner("world", 2)))
        .provides::<ApplicationRunnerPtr, _>("hello", [], |_| Ok(print_runner("Hello ", 3)))
        .build()
        .unwrap();

    // configuration can also be created in code
    let mut application =
        Application::new(ApplicationConfig::default().with_install_tracing_logger(false));

    application.install_module(&module, Some(&provider)).unwrap();
    for resource in module.resources() {
        application.add_runner(&resource).unwrap();
    }

    // prints "Hello world!"
    application.run().unwrap();
}
