//! Integration tests for configuration and schema construction.
//!
//! These tests verify that configuration and schema values are validated on
//! construction and can be shared across threads.

use std::sync::Arc;
use std::thread;

use resource_query::schema::{
    Cardinality, OperationBuilder, SchemaError, SchemaProvider, ServiceSchema,
    StructuredTypeBuilder,
};
use resource_query::{ConfigError, Identifier, ServiceConfig, ServiceRoot};

#[test]
fn test_full_workflow_build_config_and_read_fields() {
    let root = ServiceRoot::new("https://data.example.com/catalog/").unwrap();

    let config = ServiceConfig::builder()
        .service_root(root.clone())
        .max_segments(8)
        .max_select_items(4)
        .count_operation_results(false)
        .build()
        .unwrap();

    assert_eq!(config.max_segments(), 8);
    assert_eq!(config.max_select_items(), 4);
    assert!(!config.count_operation_results());
    assert_eq!(
        config.service_root().unwrap().as_ref(),
        "https://data.example.com/catalog"
    );
    assert_eq!(root.host_name(), "data.example.com");
    assert_eq!(root.scheme(), "https");
}

#[test]
fn test_zero_limits_are_rejected() {
    let err = ServiceConfig::builder().max_segments(0).build().unwrap_err();
    assert_eq!(
        err,
        ConfigError::InvalidLimit {
            field: "max_segments",
            value: 0
        }
    );

    let err = ServiceConfig::builder()
        .max_select_items(0)
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("max_select_items"));
}

#[test]
fn test_invalid_values_fail_fast() {
    assert!(matches!(
        ServiceRoot::new("ftp://example.com"),
        Err(ConfigError::InvalidServiceRoot { .. })
    ));
    assert!(matches!(
        ServiceRoot::new("https://example.com/svc?x=1"),
        Err(ConfigError::InvalidServiceRoot { .. })
    ));
    assert!(matches!(
        Identifier::new("1Product"),
        Err(ConfigError::InvalidIdentifier { .. })
    ));
    assert_eq!(
        Identifier::new("Catalog.Product").unwrap().as_ref(),
        "Catalog.Product"
    );
}

#[test]
fn test_schema_rejects_inconsistent_declarations() {
    let err = ServiceSchema::builder()
        .entity_set("Products", "Catalog.Product")
        .build()
        .unwrap_err();
    assert!(matches!(err, SchemaError::UnknownEntityType { .. }));

    let err = ServiceSchema::builder()
        .structured_type(
            StructuredTypeBuilder::entity("Catalog.Product")
                .key("Id")
                .property("Id", "Edm.Int32"),
        )
        .operation(OperationBuilder::new("Latest"))
        .build()
        .unwrap_err();
    assert!(matches!(err, SchemaError::MissingResultType { .. }));

    let err = ServiceSchema::builder()
        .structured_type(StructuredTypeBuilder::entity("Bad Name"))
        .build()
        .unwrap_err();
    assert!(matches!(err, SchemaError::InvalidName(_)));
}

#[test]
fn test_schema_and_config_are_shared_across_threads() {
    let schema = Arc::new(
        ServiceSchema::builder()
            .structured_type(
                StructuredTypeBuilder::entity("Catalog.Product")
                    .key("Id")
                    .property("Id", "Edm.Int32")
                    .navigation("Related", "Catalog.Product", Cardinality::Collection),
            )
            .entity_set("Products", "Catalog.Product")
            .build()
            .unwrap(),
    );
    let config = ServiceConfig::default();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let schema = Arc::clone(&schema);
            let config = config.clone();
            thread::spawn(move || {
                schema.entity_set_element_type("Products").map(str::to_string)
                    == Some("Catalog.Product".to_string())
                    && config.max_segments() == 32
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
