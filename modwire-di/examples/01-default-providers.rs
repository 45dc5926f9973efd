// note: this example assumes you've analyzed the previous one

use modwire_di::container::Container;
use modwire_di::instance::InstancePtr;
use modwire_di::module::Module;
use modwire_di::provider::{Parameter, Provider};
use modwire_di::resource::ResourceType;

// note: for the sake of simplicity, errors are unwrapped, rather than gracefully handled
fn main() {
    let settings = Module::builder("Settings")
        .declare("port", ResourceType::of::<u16>())
        .build()
        .unwrap();

    // modules can name a provider to use when none is registered explicitly
    let default_settings = Provider::builder("DefaultSettings", &settings)
        .provides::<u16, _>("port", [], |_| Ok(InstancePtr::new(8080)))
        .build()
        .unwrap();
    settings.set_default_provider(&default_settings).unwrap();

    let server = Module::builder("Server")
        .declare("address", ResourceType::of::<String>())
        .build()
        .unwrap();

    // resources of other modules are referenced explicitly
    let port = settings.resource("port").unwrap();
    let server_provider = Provider::builder("ServerProvider", &server)
        .provides::<String, _>("address", [Parameter::resource("port", &port)], |arguments| {
            Ok(InstancePtr::new(format!(
                "127.0.0.1:{}",
                arguments.get::<u16>("port")?
            )))
        })
        .build()
        .unwrap();

    // only the server is registered - settings get discovered while sealing and use their
    // default provider
    let mut container = Container::new();
    container.register(&server, Some(&server_provider)).unwrap();
    container.seal().unwrap();

    assert_eq!(container.private_modules(), &[settings]);

    // prints "127.0.0.1:8080"
    println!(
        "{}",
        container
            .provide::<String>(&server.resource("address").unwrap())
            .unwrap()
    );
}
