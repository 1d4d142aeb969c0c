//! End-to-end tests for installing the events extension

use std::sync::Arc;

use eventide_di::{Container, Definition, ServiceProviderRegistry};
use eventide_events::{
    parse_bindings, ClassInfo, EventArgs, EventBinding, EventDispatcher, EventMap, Listener,
};
use eventide_lazy::{
    EventsConfig, EventsExtension, LazyEventManager, LazyEventsError, EVENT_MANAGER,
};
use proptest::prelude::*;
use serde_json::{json, Value};

fn binding(event: &str, method: &str, priority: Option<i32>) -> EventBinding {
    EventBinding {
        event: event.to_string(),
        method: method.to_string(),
        priority,
    }
}

fn add_listener(
    container: &Container,
    name: &str,
    tag: &str,
    declaration: Value,
    methods: &[&str],
) {
    let class = ClassInfo::new(
        name,
        EventMap::from_value(&declaration).unwrap(),
        methods.iter().copied(),
    );
    container
        .add(
            Definition::new(name, |_| Ok(Arc::new(Listener::callback(|_: &EventArgs| Ok(())))))
                .tag(tag)
                .class(class),
        )
        .unwrap();
}

#[test]
fn test_declared_shapes_parse_to_bindings() {
    let cases = [
        (
            json!(["Shop::onCheckout"]),
            vec![binding("Shop::onCheckout", "onCheckout", None)],
        ),
        (
            json!({"UserCreated": "onUserCreated"}),
            vec![binding("UserCreated", "onUserCreated", None)],
        ),
        (
            json!({"UserCreated": ["audit", 10]}),
            vec![binding("UserCreated", "audit", Some(10))],
        ),
        (
            json!({"UserCreated": [["first", 5], ["second", -1]]}),
            vec![
                binding("UserCreated", "first", Some(5)),
                binding("UserCreated", "second", Some(-1)),
            ],
        ),
    ];

    for (declaration, expected) in cases {
        let map = EventMap::from_value(&declaration).unwrap();
        assert_eq!(parse_bindings(&map), expected, "declaration {}", declaration);
    }
}

#[test]
fn test_default_options() {
    let container = Arc::new(Container::new());
    let extension = EventsExtension::register(&container, &json!({})).unwrap();

    assert_eq!(extension.config(), &EventsConfig::default());
    assert!(container.has(EVENT_MANAGER));
    assert!(!container.is_resolved(EVENT_MANAGER));

    let manager = extension.manager(&container).unwrap();
    let again = container.get_as::<LazyEventManager>(EVENT_MANAGER).unwrap();
    assert!(Arc::ptr_eq(&manager, &again));
}

#[test]
fn test_custom_tags_from_options() {
    let container = Arc::new(Container::new());
    add_listener(
        &container,
        "audit",
        "app.listener",
        json!({"UserCreated": "record"}),
        &["record"],
    );
    add_listener(
        &container,
        "ignored",
        eventide_lazy::TAG_LISTENER,
        json!({"UserCreated": "record"}),
        &["record"],
    );

    let extension = EventsExtension::register(
        &container,
        &json!({"listener_tag": "app.listener", "manager_service": "app.events"}),
    )
    .unwrap();
    let manager = extension.manager(&container).unwrap();

    assert!(container.has("app.events"));
    assert!(!container.has(EVENT_MANAGER));
    assert_eq!(manager.dispatch_event(&EventArgs::new("UserCreated")).unwrap(), 1);
    assert!(container.is_resolved("audit"));
    assert!(!container.is_resolved("ignored"));
}

#[test]
fn test_options_from_config_service() {
    let container = Arc::new(Container::new());
    container
        .set_instance("app.events.config", Arc::new(json!({"listener_tag": "app.listener"})))
        .unwrap();
    add_listener(&container, "audit", "app.listener", json!(["Audit::onLogin"]), &["onLogin"]);

    let extension = EventsExtension::register(&container, &json!("app.events.config")).unwrap();
    assert_eq!(extension.config().listener_tag, "app.listener");

    let manager = extension.manager(&container).unwrap();
    assert!(manager.has_listeners("Audit::onLogin").unwrap());
}

#[test]
fn test_typed_config_service() {
    let container = Arc::new(Container::new());
    let config = EventsConfig {
        manager_service: "typed.events".to_string(),
        ..EventsConfig::default()
    };
    container.set_instance("typed.config", Arc::new(config.clone())).unwrap();

    let extension = EventsExtension::register(&container, &json!("typed.config")).unwrap();
    assert_eq!(extension.config(), &config);
    assert!(container.has("typed.events"));
}

#[test]
fn test_invalid_config_sources() {
    let container = Arc::new(Container::new());
    container.set_instance("not.config", Arc::new(42_u32)).unwrap();

    for source in [
        json!(42),
        json!(null),
        json!(["listener_tag"]),
        json!("missing.service"),
        json!("not.config"),
    ] {
        assert!(
            matches!(
                EventsExtension::register(&container, &source),
                Err(LazyEventsError::InvalidArgument(_))
            ),
            "source {} should be rejected",
            source
        );
    }

    assert!(matches!(
        EventsExtension::register(&container, &json!({"unknown_option": true})),
        Err(LazyEventsError::InvalidArgument(_))
    ));
    assert!(matches!(
        EventsExtension::register(
            &container,
            &json!({"listener_tag": "same", "subscriber_tag": "same"})
        ),
        Err(LazyEventsError::InvalidArgument(_))
    ));
    assert!(!container.has(EVENT_MANAGER));
}

#[test]
fn test_unrecognized_declaration_shape_is_invalid_state() {
    let error = EventMap::from_value(&json!({"UserCreated": 42})).unwrap_err();
    assert!(matches!(error, eventide_events::EventsError::InvalidState(_)));

    let error = EventMap::from_value(&json!("UserCreated")).unwrap_err();
    assert!(matches!(error, eventide_events::EventsError::InvalidState(_)));
}

#[test]
fn test_installed_through_provider_registry() {
    let container = Arc::new(Container::new());
    add_listener(
        &container,
        "audit",
        eventide_lazy::TAG_LISTENER,
        json!({"Ping": "pong"}),
        &["pong"],
    );

    let mut registry = ServiceProviderRegistry::new();
    registry.add(EventsExtension::new(EventsConfig::default()));
    registry.register_all(&container).unwrap();

    let manager = container.get_as::<LazyEventManager>(EVENT_MANAGER).unwrap();
    assert_eq!(manager.dispatch_event(&EventArgs::new("Ping")).unwrap(), 1);
}

#[test]
fn test_registering_twice_fails() {
    let container = Arc::new(Container::new());
    EventsExtension::register(&container, &json!({})).unwrap();

    assert!(matches!(
        EventsExtension::register(&container, &json!({})),
        Err(LazyEventsError::Container(eventide_di::DIError::ServiceAlreadyRegistered { .. }))
    ));
}

proptest! {
    /// Any explicit tag pair that differs produces a matching config
    #[test]
    fn prop_tag_options_round_trip(listener in "[a-z]{1,8}(\\.[a-z]{1,8}){0,2}", suffix in "[a-z]{1,4}") {
        let subscriber = format!("{}.{}", listener, suffix);
        let container = Arc::new(Container::new());
        let extension = EventsExtension::register(
            &container,
            &json!({"listener_tag": listener, "subscriber_tag": subscriber}),
        ).unwrap();

        prop_assert_eq!(&extension.config().listener_tag, &listener);
        prop_assert_eq!(&extension.config().subscriber_tag, &subscriber);
        prop_assert_eq!(extension.config().manager_service.as_str(), EVENT_MANAGER);
    }
}
