//! Integration tests for target resolution, count policy, and projection
//! validation working together.

use resource_query::query::{CountPolicy, CountPolicyError, QueryOptions, SelectList};
use resource_query::request::{
    parse_path, KeyPredicate, KeyValue, RequestTargetResolver, ResolutionFailure, Segment,
    TargetSource,
};
use resource_query::schema::{
    Cardinality, OperationBuilder, PropertyKind, SchemaProvider, ServiceSchema,
    StructuredTypeBuilder,
};
use resource_query::ServiceConfig;

fn schema() -> ServiceSchema {
    ServiceSchema::builder()
        .structured_type(
            StructuredTypeBuilder::entity("Catalog.Product")
                .key("Id")
                .property("Id", "Edm.Int32")
                .property("Name", "Edm.String")
                .property("Dimensions", "Catalog.Dimensions")
                .navigation("Category", "Catalog.Category", Cardinality::Single)
                .navigation("Suppliers", "Catalog.Supplier", Cardinality::Collection),
        )
        .structured_type(
            StructuredTypeBuilder::complex("Catalog.Dimensions")
                .property("Width", "Edm.Decimal")
                .property("Height", "Edm.Decimal"),
        )
        .structured_type(
            StructuredTypeBuilder::entity("Catalog.Category")
                .key("Id")
                .property("Id", "Edm.Int32")
                .property("Title", "Edm.String")
                .navigation("Products", "Catalog.Product", Cardinality::Collection),
        )
        .structured_type(
            StructuredTypeBuilder::entity("Catalog.Supplier")
                .key("Region")
                .key("Code")
                .property("Region", "Edm.String")
                .property("Code", "Edm.Int32")
                .property("Name", "Edm.String"),
        )
        .entity_set("Products", "Catalog.Product")
        .entity_set("Categories", "Catalog.Category")
        .entity_set("Suppliers", "Catalog.Supplier")
        .operation(OperationBuilder::new("TopProducts").returns_collection_of("Catalog.Product"))
        .operation(
            OperationBuilder::new("Cheapest")
                .bound_to("Catalog.Product", Cardinality::Collection)
                .returns_single("Catalog.Product"),
        )
        .build()
        .unwrap()
}

/// Everything the validation stage derives from one request.
#[derive(Debug, PartialEq)]
struct Shaped {
    chain: resource_query::TargetChain,
    count: CountPolicy,
    projection: Option<resource_query::ProjectionSpec>,
}

fn shape(path: &str, query: &str) -> Shaped {
    let schema = schema();
    let config = ServiceConfig::default();
    let options = QueryOptions::parse(query).unwrap();

    let resolved = RequestTargetResolver::new(&schema, &config)
        .resolve(&parse_path(path).unwrap())
        .unwrap();
    let count =
        CountPolicy::enforce(&resolved.chain, resolved.count_segment, options.count(), &config)
            .unwrap();
    let projection = options.select().and_then(|text| {
        SelectList::parse(text, config.max_select_items())
            .unwrap()
            .map(|list| {
                list.validate(&schema, resolved.chain.terminal().element_type())
                    .unwrap()
            })
    });

    Shaped {
        chain: resolved.chain,
        count,
        projection,
    }
}

#[test]
fn test_products_resolves_to_entity_set_collection() {
    let shaped = shape("Products", "");
    let terminal = shaped.chain.terminal();

    assert_eq!(
        terminal.source(),
        &TargetSource::EntitySet {
            name: "Products".to_string()
        }
    );
    assert!(terminal.is_collection());
    assert_eq!(terminal.element_type(), "Catalog.Product");
    assert_eq!(shaped.count, CountPolicy::None);
    assert!(shaped.projection.is_none());
}

#[test]
fn test_count_segment_targets_the_collection() {
    let shaped = shape("Products/$count", "");
    assert_eq!(shaped.chain.len(), 2);
    assert!(shaped.chain.terminal().is_collection());
    assert_eq!(shaped.count, CountPolicy::CountSegment);
}

#[test]
fn test_keyed_navigation_with_select() {
    let shaped = shape("Products(1)/Category", "$select=Title");
    let terminal = shaped.chain.terminal();

    assert_eq!(
        terminal.source(),
        &TargetSource::Property {
            name: "Category".to_string(),
            kind: PropertyKind::Navigation,
        }
    );
    assert!(!terminal.is_collection());

    let keyed = shaped.chain.previous_of(terminal).unwrap();
    assert!(!keyed.is_collection());
    assert_eq!(keyed.key(), Some(&KeyPredicate::Single(KeyValue::Integer(1))));

    let projection = shaped.projection.unwrap();
    assert_eq!(projection.type_name(), "Catalog.Category");
    assert_eq!(projection.names(), ["Title"]);
}

#[test]
fn test_select_unknown_on_navigation_type_fails() {
    let schema = schema();
    let config = ServiceConfig::default();
    let resolved = RequestTargetResolver::new(&schema, &config)
        .resolve(&parse_path("Products(1)/Category").unwrap())
        .unwrap();

    let err = SelectList::parse("Name", 64)
        .unwrap()
        .unwrap()
        .validate(&schema, resolved.chain.terminal().element_type())
        .unwrap_err();
    assert_eq!(err.property, "Name");
    assert_eq!(err.type_name, "Catalog.Category");
}

#[test]
fn test_count_query_on_collection() {
    let shaped = shape("Products", "$count=true");
    assert_eq!(shaped.count, CountPolicy::CountQuery);
}

#[test]
fn test_no_property_follows_an_unkeyed_collection() {
    let schema = schema();
    let config = ServiceConfig::default();
    let resolver = RequestTargetResolver::new(&schema, &config);

    for path in [
        "Products/Name",
        "Products/Category",
        "Categories(1)/Products/Name",
        "Products(1)/Suppliers/Name",
        "TopProducts/Name",
    ] {
        let err = resolver.resolve(&parse_path(path).unwrap()).unwrap_err();
        assert_eq!(
            err.reason,
            ResolutionFailure::PropertyOnCollection,
            "unexpected reason for {path}"
        );
    }

    // Every chain that does resolve has only single-valued predecessors of properties.
    for path in [
        "Products(1)/Name",
        "Categories(1)/Products(2)/Category/Title",
        "Products(1)/Dimensions/Width",
        "Suppliers(Region='EU',Code=4)/Name",
        "Products/Cheapest/Name",
    ] {
        let resolved = resolver.resolve(&parse_path(path).unwrap()).unwrap();
        for node in &resolved.chain {
            if matches!(node.source(), TargetSource::Property { .. }) {
                let previous = resolved.chain.previous_of(node).unwrap();
                assert!(!previous.is_collection(), "{path}: {node} follows a collection");
            }
        }
    }
}

#[test]
fn test_count_directives_are_exclusive() {
    let schema = schema();
    let config = ServiceConfig::default();
    let resolver = RequestTargetResolver::new(&schema, &config);

    let resolved = resolver
        .resolve(&parse_path("Products/$count").unwrap())
        .unwrap();
    assert_eq!(
        CountPolicy::enforce(&resolved.chain, resolved.count_segment, Some("true"), &config),
        Err(CountPolicyError::Conflicting)
    );

    let single = resolver
        .resolve(&parse_path("Products(1)/$count").unwrap())
        .unwrap();
    assert!(matches!(
        CountPolicy::enforce(&single.chain, single.count_segment, None, &config),
        Err(CountPolicyError::SegmentOnSingle { .. })
    ));
}

#[test]
fn test_resolution_is_idempotent() {
    let query = "$select=Name,Id&$count=true";
    assert_eq!(
        shape("Categories(1)/Products", query),
        shape("Categories(1)/Products", query)
    );
}

#[test]
fn test_hosts_can_flag_navigation_segments() {
    let schema = schema();
    let config = ServiceConfig::default();
    let resolver = RequestTargetResolver::new(&schema, &config);

    let segments = vec![
        Segment::new("Products").with_key(KeyPredicate::Single(KeyValue::Integer(1))),
        Segment::new("Suppliers").as_navigation(),
    ];
    let resolved = resolver.resolve(&segments).unwrap();
    assert!(resolved.chain.terminal().is_collection());
    assert_eq!(resolved.chain.to_string(), "/Products(1)/Suppliers");
}

#[test]
fn test_schema_collaborator_lookups() {
    let schema = schema();
    assert!(schema.declares_property("Catalog.Product", "Category"));
    assert!(!schema.declares_property("Catalog.Product", "Title"));
    assert_eq!(
        schema.entity_set_element_type("Suppliers"),
        Some("Catalog.Supplier")
    );
    assert_eq!(
        schema.entity_set_names(),
        vec!["Products", "Categories", "Suppliers"]
    );
}
