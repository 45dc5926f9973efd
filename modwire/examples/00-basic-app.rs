use modwire::application::Application;
use modwire::runner::{runner_type, ApplicationRunner, ApplicationRunnerPtr, ErrorPtr};
use modwire_di::instance::InstancePtr;
use modwire_di::module::Module;
use modwire_di::provider::{Parameter, Provider};
use modwire_di::resource::ResourceType;
use tracing::info;

struct GreetingRunner {
    name: InstancePtr<String>,
}

impl ApplicationRunner for GreetingRunner {
    fn run(&self) -> Result<(), ErrorPtr> {
        info!("Greeting...");
        println!("Hello {}!", self.name);
        Ok(())
    }
}

// note: for the sake of simplicity, errors are unwrapped, rather than gracefully handled
fn main() {
    let module = Module::builder("Greeting")
        .declare("name", ResourceType::of::<String>())
        .declare("runner", runner_type())
        .build()
        .unwrap();

    let provider = Provider::builder("GreetingProvider", &module)
        .provides::<String, _>("name", [], |_| Ok(InstancePtr::new("world".to_string())))
        .provides::<ApplicationRunnerPtr, _>(
            "runner",
            [Parameter::named::<String>("name")],
            |arguments| {
                Ok(InstancePtr::new(GreetingRunner {
                    name: arguments.get::<String>("name")?,
                }) as InstancePtr<ApplicationRunnerPtr>)
            },
        )
        .build()
        .unwrap();

    // configuration is read from "modwire.json" and MODWIRE_ environment variables, e.g. try
    // running with RUST_LOG=info to see framework logs
    let mut application =
        Application::from_environment().expect("unable to create application");

    application.install_module(&module, Some(&provider)).unwrap();
    application
        .add_runner(&module.resource("runner").unwrap())
        .unwrap();

    // prints "Hello world!"
    application.run().expect("error running application");
}
