//! Unit tests for the container core functionality
use std::sync::Arc;

use eventide_di::*;

#[derive(Debug, PartialEq)]
struct TestService {
    value: i32,
}

#[test]
fn test_shared_service_is_cached() {
    let container = Container::new();
    container
        .set_shared("svc", |_| Ok(Arc::new(TestService { value: 42 })))
        .unwrap();

    let service1 = container.get_as::<TestService>("svc").unwrap();
    let service2 = container.get_as::<TestService>("svc").unwrap();

    assert_eq!(service1.value, 42);
    assert!(Arc::ptr_eq(&service1, &service2));
}

#[test]
fn test_transient_service_is_rebuilt() {
    let container = Container::new();
    container
        .set("svc", |_| Ok(Arc::new(TestService { value: 42 })))
        .unwrap();

    let service1 = container.get_as::<TestService>("svc").unwrap();
    let service2 = container.get_as::<TestService>("svc").unwrap();

    assert_eq!(service1, service2);
    assert!(!Arc::ptr_eq(&service1, &service2));
    assert!(!container.is_resolved("svc"));
}

#[test]
fn test_service_not_registered() {
    let container = Container::new();

    let result = container.get("missing");
    assert!(matches!(result, Err(DIError::ServiceNotRegistered { .. })));
}

#[test]
fn test_service_already_registered() {
    let container = Container::new();
    container
        .set_instance("svc", Arc::new(TestService { value: 1 }))
        .unwrap();

    let result = container.set_instance("svc", Arc::new(TestService { value: 2 }));
    assert!(matches!(result, Err(DIError::ServiceAlreadyRegistered { .. })));
}

#[test]
fn test_wrong_type_downcast() {
    let container = Container::new();
    container
        .set_instance("svc", Arc::new(TestService { value: 1 }))
        .unwrap();

    let result = container.get_as::<String>("svc");
    assert!(matches!(result, Err(DIError::InvalidServiceType { .. })));
}

#[test]
fn test_services_by_tag_keeps_registration_order() {
    let container = Container::new();
    for name in ["c", "a", "b"] {
        container
            .add(Definition::new(name, |_| Ok(Arc::new(0u8))).tag("listeners"))
            .unwrap();
    }
    container
        .add(Definition::new("other", |_| Ok(Arc::new(0u8))).tag("elsewhere"))
        .unwrap();

    let names: Vec<String> = container
        .services_by_tag("listeners")
        .unwrap()
        .iter()
        .map(|d| d.name().to_string())
        .collect();
    assert_eq!(names, vec!["c", "a", "b"]);
    assert!(container.services_by_tag("nothing").unwrap().is_empty());
}

#[test]
fn test_class_metadata_is_readable_without_building() {
    #[derive(Debug, PartialEq)]
    struct Shape(&'static str);

    let container = Container::new();
    container
        .add(
            Definition::new::<_, TestService>("svc", |_| panic!("must not be built"))
                .tag("t")
                .class(Shape("TestService")),
        )
        .unwrap();

    let descriptors = container.services_by_tag("t").unwrap();
    assert!(descriptors[0].has_class());
    assert_eq!(descriptors[0].class::<Shape>(), Some(&Shape("TestService")));
    assert_eq!(descriptors[0].class::<String>(), None);
    assert!(!container.is_resolved("svc"));
}

#[test]
fn test_clear() {
    let container = Container::new();
    container.set_instance("svc", Arc::new(1u8)).unwrap();
    assert_eq!(container.service_count(), 1);

    container.clear().unwrap();
    assert_eq!(container.service_count(), 0);
    assert!(!container.has("svc"));
}

#[test]
fn test_descriptor_reports_definition() {
    let container = Container::new();
    container
        .add(
            Definition::new("svc", |_| Ok(Arc::new(0u8)))
                .transient()
                .tag("a")
                .tag("b")
                .tag("a"),
        )
        .unwrap();
    container
        .add(Definition::new("plain", |_| Ok(Arc::new(0u8))).tag("a"))
        .unwrap();

    let descriptors = container.services_by_tag("a").unwrap();
    assert_eq!(descriptors[0].name(), "svc");
    assert_eq!(descriptors[0].tags(), ["a", "b"]);
    assert_eq!(descriptors[0].lifetime(), ServiceLifetime::Transient);
    assert_eq!(descriptors[1].lifetime(), ServiceLifetime::Shared);
    assert!(!descriptors[1].has_class());
}
