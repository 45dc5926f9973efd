mod provider_test {
    use modwire_di::container::Container;
    use modwire_di::instance::InstancePtr;
    use modwire_di::module::Module;
    use modwire_di::provider::{BindingMode, Parameter, Provider};
    use modwire_di::resource::{ResourceKind, ResourceType, UnboundResource};
    use modwire_di::ProviderDefinitionError;

    trait Greeter: Send + Sync {
        fn greet(&self, name: &str) -> String;
    }

    struct Casual;

    impl Greeter for Casual {
        fn greet(&self, name: &str) -> String {
            format!("Hi {name}")
        }
    }

    struct Polite;

    impl Greeter for Polite {
        fn greet(&self, name: &str) -> String {
            format!("Good day, {name}")
        }
    }

    type GreeterPtr = InstancePtr<dyn Greeter + Send + Sync>;

    fn greeter_type() -> ResourceType {
        ResourceType::of::<dyn Greeter + Send + Sync>()
    }

    fn polite_type() -> ResourceType {
        ResourceType::builder::<Polite>()
            .implements::<dyn Greeter + Send + Sync>(|polite| polite as GreeterPtr)
            .build()
    }

    fn create_module() -> Module {
        Module::builder("Greetings")
            .declare("message", ResourceType::of::<String>())
            .build()
            .unwrap()
    }

    fn create_casual_provider(module: &Module) -> Provider {
        Provider::builder("CasualProvider", module)
            .declare("greeter", greeter_type())
            .provides::<dyn Greeter + Send + Sync, _>("greeter", [], |_| {
                Ok(InstancePtr::new(Casual) as GreeterPtr)
            })
            .provides::<String, _>(
                "message",
                [Parameter::named::<dyn Greeter + Send + Sync>("greeter")],
                |arguments| {
                    let greeter = arguments.get::<dyn Greeter + Send + Sync>("greeter")?;
                    Ok(InstancePtr::new(greeter.greet("Ann")))
                },
            )
            .build()
            .unwrap()
    }

    #[test]
    fn should_infer_resource_kinds() {
        let module = create_module();
        let provider = Provider::builder("MessageProvider", &module)
            .declare("message", ResourceType::of::<String>())
            .declare("prefix", ResourceType::of::<String>())
            .provides::<String, _>("message", [Parameter::named::<String>("prefix")], |arguments| {
                Ok(InstancePtr::new(format!("{}!", arguments.get::<String>("prefix")?)))
            })
            .provides::<String, _>("prefix", [], |_| Ok(InstancePtr::new("Hello".to_string())))
            .build()
            .unwrap();

        assert!(matches!(
            provider.resource("message").unwrap().kind(),
            ResourceKind::Override { overrides, .. } if overrides.as_ref() == &module.resource("message").unwrap()
        ));
        assert!(matches!(
            provider.resource("prefix").unwrap().kind(),
            ResourceKind::Private { provider: owner } if owner == provider.reference()
        ));
        assert_eq!(provider.supplied_resources().count(), 2);
    }

    #[test]
    fn should_resolve_dependencies_of_methods() {
        let module = create_module();
        let provider = create_casual_provider(&module);

        let message = module.resource("message").unwrap();
        let method = provider.provider_method(&message).unwrap();

        assert_eq!(method.resource(), &message);
        assert_eq!(method.dependencies().len(), 1);
        assert_eq!(method.dependencies()[0].name(), "greeter");
        assert_eq!(
            method.dependencies()[0].resource(),
            &provider.resource("greeter").unwrap()
        );
        assert!(provider
            .provider_method(&create_module().resource("message").unwrap())
            .is_none());
    }

    #[test]
    fn should_use_narrower_inherited_resource() {
        let module = create_module();
        let base = create_casual_provider(&module);
        let derived = Provider::extending("PoliteProvider", &base)
            .declare("greeter", polite_type())
            .provides::<Polite, _>("greeter", [], |_| Ok(InstancePtr::new(Polite)))
            .build()
            .unwrap();

        assert_eq!(derived.base(), Some(&base));
        assert_eq!(derived.module(), &module);

        let mut container = Container::new();
        container.register(&module, Some(&derived)).unwrap();
        container.seal().unwrap();

        assert_eq!(
            *container
                .provide::<String>(&module.resource("message").unwrap())
                .unwrap(),
            "Good day, Ann"
        );
        assert!(container
            .provide::<Polite>(&derived.resource("greeter").unwrap())
            .is_ok());
    }

    #[test]
    fn should_rebind_inherited_resources() {
        let module = create_module();
        let base = create_casual_provider(&module);
        let derived = Provider::extending("CopyProvider", &base).build().unwrap();

        let inherited = derived.resource("greeter").unwrap();
        assert_ne!(inherited, base.resource("greeter").unwrap());
        assert_eq!(inherited.provider(), Some(derived.reference()));
        assert!(derived.provider_method(&inherited).is_some());
        assert!(derived
            .provider_method(&base.resource("greeter").unwrap())
            .is_none());
    }

    #[test]
    fn should_reject_incompatible_inherited_resource() {
        let module = create_module();
        let base = create_casual_provider(&module);

        assert!(matches!(
            Provider::extending("BrokenProvider", &base)
                .declare("greeter", ResourceType::of::<String>())
                .provides::<String, _>("greeter", [], |_| Ok(InstancePtr::new(String::new())))
                .build()
                .unwrap_err(),
            ProviderDefinitionError::IncompatibleResourceTypeForInheritedResource { .. }
        ));
    }

    #[test]
    fn should_reject_inherited_method_with_wider_return_type() {
        let module = create_module();
        let base = create_casual_provider(&module);

        // the inherited greeter method returns the trait object, not Polite
        assert!(matches!(
            Provider::extending("IncompleteProvider", &base)
                .declare("greeter", polite_type())
                .build()
                .unwrap_err(),
            ProviderDefinitionError::ProviderMethodReturnTypeMismatch { .. }
        ));
    }

    #[test]
    fn should_reject_public_resources() {
        let module = create_module();

        assert!(matches!(
            Provider::builder("BrokenProvider", &module)
                .declare_unbound("extra", UnboundResource::public(ResourceType::of::<u8>()))
                .build()
                .unwrap_err(),
            ProviderDefinitionError::CannotDeclarePublicResourceInProvider { name, .. } if name == "extra"
        ));
    }

    #[test]
    fn should_reject_private_resource_occluding_module_resource() {
        let module = create_module();

        assert!(matches!(
            Provider::builder("BrokenProvider", &module)
                .declare_unbound("message", UnboundResource::private(ResourceType::of::<String>()))
                .build()
                .unwrap_err(),
            ProviderDefinitionError::PrivateResourceCannotOccludeModuleResource { .. }
        ));
    }

    #[test]
    fn should_reject_overriding_unknown_resource() {
        let module = create_module();

        assert!(matches!(
            Provider::builder("BrokenProvider", &module)
                .declare_unbound("title", UnboundResource::overriding(ResourceType::of::<String>()))
                .build()
                .unwrap_err(),
            ProviderDefinitionError::OverridingResourceNameDoesntMatchModuleResource { name, .. } if name == "title"
        ));
    }

    #[test]
    fn should_reject_overriding_with_unrelated_type() {
        let module = create_module();

        assert!(matches!(
            Provider::builder("BrokenProvider", &module)
                .declare("message", ResourceType::of::<u32>())
                .build()
                .unwrap_err(),
            ProviderDefinitionError::OverridingResourceIncompatibleType { .. }
        ));
    }

    #[test]
    fn should_reject_duplicate_resources_and_methods() {
        let module = create_module();

        assert!(matches!(
            Provider::builder("BrokenProvider", &module)
                .declare("prefix", ResourceType::of::<String>())
                .declare("prefix", ResourceType::of::<String>())
                .build()
                .unwrap_err(),
            ProviderDefinitionError::DuplicateResourceName { .. }
        ));
        assert!(matches!(
            Provider::builder("BrokenProvider", &module)
                .provides::<String, _>("message", [], |_| Ok(InstancePtr::new(String::new())))
                .provides::<String, _>("message", [], |_| Ok(InstancePtr::new(String::new())))
                .build()
                .unwrap_err(),
            ProviderDefinitionError::DuplicateProviderMethod { .. }
        ));
    }

    #[test]
    fn should_reject_missing_and_unknown_methods() {
        let module = create_module();

        assert!(matches!(
            Provider::builder("BrokenProvider", &module).build().unwrap_err(),
            ProviderDefinitionError::MissingProviderMethod { resource, .. } if resource.name() == "message"
        ));
        assert!(matches!(
            Provider::builder("BrokenProvider", &module)
                .provides::<String, _>("message", [], |_| Ok(InstancePtr::new(String::new())))
                .provides::<String, _>("title", [], |_| Ok(InstancePtr::new(String::new())))
                .build()
                .unwrap_err(),
            ProviderDefinitionError::ProviderMethodForUnknownResource { name, .. } if name == "title"
        ));
    }

    #[test]
    fn should_reject_mismatched_return_type() {
        let module = create_module();

        assert!(matches!(
            Provider::builder("BrokenProvider", &module)
                .provides::<u32, _>("message", [], |_| Ok(InstancePtr::new(1)))
                .build()
                .unwrap_err(),
            ProviderDefinitionError::ProviderMethodReturnTypeMismatch { .. }
        ));
        assert!(matches!(
            Provider::builder("BrokenProvider", &module)
                .provides_as::<String, _>("message", ResourceType::of::<u32>(), [], |_| {
                    Ok(InstancePtr::new(String::new()))
                })
                .build()
                .unwrap_err(),
            ProviderDefinitionError::ProviderMethodReturnTypeMismatch { .. }
        ));
    }

    #[test]
    fn should_reject_invalid_parameters() {
        let module = create_module();
        let build_with = |parameters: Vec<Parameter>| {
            Provider::builder("BrokenProvider", &module)
                .provides::<String, _>("message", parameters, |_| {
                    Ok(InstancePtr::new(String::new()))
                })
                .build()
                .unwrap_err()
        };

        assert!(matches!(
            build_with(vec![Parameter::named::<String>("unknown")]),
            ProviderDefinitionError::ProviderMethodParameterUnrelatedName { parameter, .. } if parameter == "unknown"
        ));
        assert!(matches!(
            build_with(vec![Parameter::named::<u64>("message")]),
            ProviderDefinitionError::ProviderMethodParameterResourceTypeMismatch { .. }
        ));

        let other = Module::builder("Other")
            .declare("count", ResourceType::of::<u64>())
            .build()
            .unwrap();
        let count = other.resource("count").unwrap();
        assert!(matches!(
            build_with(vec![
                Parameter::resource("count", &count),
                Parameter::resource("count", &count),
            ]),
            ProviderDefinitionError::DuplicateParameterName { parameter, .. } if parameter == "count"
        ));

        let foreign = create_casual_provider(&create_module());
        assert!(matches!(
            build_with(vec![Parameter::resource(
                "greeter",
                &foreign.resource("greeter").unwrap()
            )]),
            ProviderDefinitionError::CannotDependOnProviderResource { .. }
        ));
    }

    #[test]
    fn should_require_explicit_resources_in_strict_mode() {
        let module = create_module();
        let other = Module::builder("Other")
            .declare("name", ResourceType::of::<String>())
            .build()
            .unwrap();
        let name = other.resource("name").unwrap();

        assert!(matches!(
            Provider::builder("StrictProvider", &module)
                .binding_mode(BindingMode::Strict)
                .provides::<String, _>("message", [Parameter::named::<String>("name")], |_| {
                    Ok(InstancePtr::new(String::new()))
                })
                .build()
                .unwrap_err(),
            ProviderDefinitionError::NameBindingDisabled { .. }
        ));

        let provider = Provider::builder("StrictProvider", &module)
            .binding_mode(BindingMode::Strict)
            .provides::<String, _>("message", [Parameter::resource("name", &name)], |arguments| {
                Ok(InstancePtr::new(format!("Hi {}", arguments.get::<String>("name")?)))
            })
            .build()
            .unwrap();

        assert_eq!(provider.binding_mode(), BindingMode::Strict);
        assert_eq!(
            Provider::extending("DerivedProvider", &provider)
                .build()
                .unwrap()
                .binding_mode(),
            BindingMode::Strict
        );
    }
}
