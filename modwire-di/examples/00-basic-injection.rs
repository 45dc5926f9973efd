use modwire_di::container::Container;
use modwire_di::instance::InstancePtr;
use modwire_di::module::Module;
use modwire_di::provider::{Parameter, Provider};
use modwire_di::resource::ResourceType;

// this is a trait we would like to depend on
trait Greeter {
    fn greet(&self) -> String;
}

struct EnglishGreeter;

impl Greeter for EnglishGreeter {
    fn greet(&self) -> String {
        "Hello world!".to_string()
    }
}

type GreeterPtr = InstancePtr<dyn Greeter + Send + Sync>;

// note: for the sake of simplicity, errors are unwrapped, rather than gracefully handled
fn main() {
    // a module is a contract - a set of named, typed resources
    let module = Module::builder("Greetings")
        .declare("greeter", ResourceType::of::<dyn Greeter + Send + Sync>())
        .declare("message", ResourceType::of::<String>())
        .build()
        .expect("error building module");

    // a provider knows how to construct every resource of its module
    let provider = Provider::builder("GreetingsProvider", &module)
        .provides::<dyn Greeter + Send + Sync, _>("greeter", [], |_| {
            Ok(InstancePtr::new(EnglishGreeter) as GreeterPtr)
        })
        // parameters are bound by name to other resources of the module
        .provides::<String, _>(
            "message",
            [Parameter::named::<dyn Greeter + Send + Sync>("greeter")],
            |arguments| {
                let greeter = arguments.get::<dyn Greeter + Send + Sync>("greeter")?;
                Ok(InstancePtr::new(greeter.greet()))
            },
        )
        .build()
        .expect("error building provider");

    let mut container = Container::new();
    container
        .register(&module, Some(&provider))
        .expect("error registering module");

    // the whole graph is validated here, before anything gets constructed
    container.seal().expect("error sealing container");

    let message = container
        .provide::<String>(&module.resource("message").unwrap())
        .expect("error providing message");

    // prints "Hello world!"
    println!("{message}");
}
