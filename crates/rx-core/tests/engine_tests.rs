//! Pruebas del pipeline completo contra los colaboradores en memoria.

use std::sync::Arc;

use rx_adapters::{Fixture, InMemorySearch, InMemoryStack, PersistenceCall};
use rx_core::naming::input_name;
use rx_core::{EngineConfig, FormMode, PrivilegeScope, UpsertError, UpsertMethod, UpsertRequest, Upserter};
use rx_domain::Payload;
use serde_json::{json, Value};

fn fixture() -> Fixture {
    Fixture::from_json_str(include_str!("../../../fixtures/order_line.json")).unwrap()
}

fn payload(v: Value) -> Payload {
    v.as_object().cloned().unwrap()
}

fn product_rows(n: usize) -> Vec<Value> {
    (0..n).map(|i| json!({"id": format!("P-{i:03}"), "uOM": format!("U-{i:03}"), "standardPrice": i}))
          .collect()
}

fn upserter_with_search(stack: &InMemoryStack, search: Arc<InMemorySearch>) -> Upserter {
    Upserter::builder().metadata(stack.metadata.clone())
                       .form_initializer(stack.form_initializer.clone())
                       .search(search)
                       .query_engine(stack.query_engine.clone())
                       .persistence(stack.persistence.clone())
                       .filter_evaluator(stack.evaluator.clone())
                       .build()
                       .unwrap()
}

fn line_request(product: &str) -> UpsertRequest {
    UpsertRequest::new(UpsertMethod::Create,
                       "ORDER_LINE",
                       payload(json!({"salesOrder": "SO-1", "product": product})))
}

#[test]
fn match_on_row_120_takes_two_pages() {
    let fx = fixture();
    let stack = InMemoryStack::from_fixture(&fx);
    let search = Arc::new(InMemorySearch::new().with_rows("Product", product_rows(150)));
    let upserter = upserter_with_search(&stack, search.clone());

    let resolution = upserter.resolve(&fx.scope(), &line_request("P-120")).unwrap();

    let requests = search.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!((requests[0].start_row, requests[0].end_row), (0, 100));
    assert_eq!((requests[1].start_row, requests[1].end_row), (100, 200));
    assert_eq!(resolution.payload.get("product_UOM"), Some(&json!("U-120")));
}

#[test]
fn missing_candidate_takes_two_pages_then_fails() {
    let fx = fixture();
    let stack = InMemoryStack::from_fixture(&fx);
    let search = Arc::new(InMemorySearch::new().with_rows("Product", product_rows(150)));
    let upserter = upserter_with_search(&stack, search.clone());

    let err = upserter.upsert(&fx.scope(), &line_request("P-999")).unwrap_err();

    assert_eq!(search.requests().len(), 2);
    assert_eq!(err,
               UpsertError::RecordNotFound { selector_id: "SEL-PRODUCT".into(),
                                             record_id: "P-999".into() });
    assert!(stack.persistence.calls().is_empty());
}

#[test]
fn without_total_rows_a_short_page_ends_the_search() {
    let fx = fixture();
    let stack = InMemoryStack::from_fixture(&fx);
    let search = Arc::new(InMemorySearch::new().with_rows("Product", product_rows(130)).without_total());
    let upserter = upserter_with_search(&stack, search.clone());

    let err = upserter.resolve(&fx.scope(), &line_request("P-999")).unwrap_err();

    let requests = search.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!((requests[1].start_row, requests[1].end_row), (100, 200));
    assert_eq!(err.message_key(), "record_not_found");
}

#[test]
fn without_total_rows_a_full_page_keeps_searching() {
    let fx = fixture();
    let stack = InMemoryStack::from_fixture(&fx);
    let search = Arc::new(InMemorySearch::new().with_rows("Product", product_rows(130)).without_total());
    let upserter = upserter_with_search(&stack, search.clone());

    let resolution = upserter.resolve(&fx.scope(), &line_request("P-125")).unwrap();

    assert_eq!(search.requests().len(), 2);
    assert_eq!(resolution.payload.get("product_UOM"), Some(&json!("U-125")));
}

#[test]
fn search_request_carries_scope_and_projection() {
    let fx = fixture();
    let stack = InMemoryStack::from_fixture(&fx);
    let upserter = stack.upserter(EngineConfig::default()).unwrap();

    upserter.resolve(&fx.scope(), &line_request("P-001")).unwrap();

    let requests = stack.search.requests();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.where_clause, "e.active = true AND e.id = 'P-001' AND e.client.id = 'C-1'");
    assert_eq!(req.extra_properties, "id,standardPrice,uOM");
    assert_eq!(req.parameters.get("inpmProductId").map(String::as_str), Some("P-001"));
}

#[test]
fn replay_runs_defaults_then_single_change() {
    let fx = fixture();
    let stack = InMemoryStack::from_fixture(&fx);
    let upserter = stack.upserter(EngineConfig::default()).unwrap();

    let resolution = upserter.resolve(&fx.scope(), &line_request("P-001")).unwrap();

    let calls = stack.form_initializer.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].params.mode, FormMode::New);
    assert_eq!(calls[0].params.changed_field, None);
    assert_eq!(calls[0].params.parent_id.as_deref(), Some("SO-1"));
    assert_eq!(calls[0].content, json!({}));
    assert_eq!(calls[1].params.changed_field.as_deref(), Some("inpmProductId"));
    assert_eq!(calls[1].content["inpmProductId"], json!("P-001"));
    assert_eq!(calls[1].content["inpadOrgId"], json!("O-1"));

    let out = &resolution.payload;
    // defaults sólo donde faltaba, sin columnas sin propiedad ni ajenas
    assert_eq!(out.get("organization"), Some(&json!("O-1")));
    assert_eq!(out.get("lineNo"), Some(&json!(10)));
    assert_eq!(out.get("orderDate"), Some(&json!("2024-05-01")));
    assert!(!out.contains_key("description"));
    assert!(!out.contains_key("inpemLegacyFlag"));
    assert!(!out.contains_key("C_Currency_ID"));
    // callout y después el selector, que pisa el precio
    assert_eq!(out.get("uOM"), Some(&json!("U-100")));
    assert_eq!(out.get("unitPrice"), Some(&json!(12.25)));
    assert_eq!(resolution.changed_field.as_deref(), Some("product"));
}

#[test]
fn inbound_values_win_over_defaults() {
    let fx = fixture();
    let stack = InMemoryStack::from_fixture(&fx);
    let upserter = stack.upserter(EngineConfig::default()).unwrap();
    let request = UpsertRequest::new(UpsertMethod::Create,
                                     "ORDER_LINE",
                                     payload(json!({"salesOrder": "SO-1", "product": "P-002", "lineNo": "30"})));

    let resolution = upserter.resolve(&fx.scope(), &request).unwrap();

    assert_eq!(resolution.payload.get("lineNo"), Some(&json!(30)));
}

#[test]
fn changed_field_hint_overrides_payload_order() {
    let fx = fixture();
    let stack = InMemoryStack::from_fixture(&fx);
    let upserter = stack.upserter(EngineConfig::default()).unwrap();
    let request = UpsertRequest::new(UpsertMethod::Create,
                                     "ORDER_LINE",
                                     payload(json!({"description": "d", "product": "P-002"})))
        .with_changed_field("product");

    let resolution = upserter.resolve(&fx.scope(), &request).unwrap();

    assert_eq!(resolution.changed_field.as_deref(), Some("product"));
    assert_eq!(resolution.payload.get("product_UOM"), Some(&json!("U-002")));
}

#[test]
fn first_non_parent_key_is_the_changed_field() {
    let fx = fixture();
    let stack = InMemoryStack::from_fixture(&fx);
    let upserter = stack.upserter(EngineConfig::default()).unwrap();
    let request = UpsertRequest::new(UpsertMethod::Create,
                                     "ORDER_LINE",
                                     payload(json!({"salesOrder": "SO-1", "description": "d", "product": "P-002"})));

    let resolution = upserter.resolve(&fx.scope(), &request).unwrap();

    assert_eq!(resolution.changed_field.as_deref(), Some("description"));
    assert!(stack.search.requests().is_empty());
    assert!(!resolution.payload.contains_key("product_UOM"));
}

#[test]
fn phase_two_error_aborts_without_persisting() {
    let fx = fixture();
    let stack = InMemoryStack::from_fixture(&fx);
    let form = Arc::new(rx_adapters::ScriptedFormInitializer::new().with_failure("ORDER_LINE",
                                                                                 "inpmProductId",
                                                                                 "Product is discontinued"));
    let upserter = Upserter::builder().metadata(stack.metadata.clone())
                                      .form_initializer(form.clone())
                                      .search(stack.search.clone())
                                      .query_engine(stack.query_engine.clone())
                                      .persistence(stack.persistence.clone())
                                      .filter_evaluator(stack.evaluator.clone())
                                      .build()
                                      .unwrap();

    let err = upserter.upsert(&fx.scope(), &line_request("P-001")).unwrap_err();

    assert_eq!(err, UpsertError::FormInitialization("Product is discontinued".into()));
    assert_eq!(form.calls().len(), 2);
    assert!(stack.search.requests().is_empty());
    assert!(stack.persistence.calls().is_empty());
}

#[test]
fn search_failure_is_propagated() {
    let fx = fixture();
    let stack = InMemoryStack::from_fixture(&fx);
    let search = Arc::new(InMemorySearch::new().failing("datasource timeout"));
    let upserter = upserter_with_search(&stack, search);

    let err = upserter.upsert(&fx.scope(), &line_request("P-001")).unwrap_err();

    assert_eq!(err.message_key(), "search_error");
    assert!(err.to_string().contains("datasource timeout"));
    assert!(stack.persistence.calls().is_empty());
}

#[test]
fn filter_expression_without_evaluator_fails() {
    let fx = fixture();
    let stack = InMemoryStack::from_fixture(&fx);
    let upserter = Upserter::builder().metadata(stack.metadata.clone())
                                      .form_initializer(stack.form_initializer.clone())
                                      .search(stack.search.clone())
                                      .query_engine(stack.query_engine.clone())
                                      .persistence(stack.persistence.clone())
                                      .build()
                                      .unwrap();

    let err = upserter.resolve(&fx.scope(), &line_request("P-001")).unwrap_err();

    assert_eq!(err.message_key(), "script_error");
}

#[test]
fn custom_query_failure_is_wrapped() {
    let fx = fixture();
    let stack = InMemoryStack::from_fixture(&fx);
    let engine = Arc::new(rx_adapters::InMemoryQueryEngine::new().failing("unexpected token"));
    let upserter = Upserter::builder().metadata(stack.metadata.clone())
                                      .form_initializer(stack.form_initializer.clone())
                                      .search(stack.search.clone())
                                      .query_engine(engine)
                                      .persistence(stack.persistence.clone())
                                      .filter_evaluator(stack.evaluator.clone())
                                      .build()
                                      .unwrap();
    let request = UpsertRequest::new(UpsertMethod::Create,
                                     "ORDER_LINE",
                                     payload(json!({"salesOrder": "SO-1", "warehouse": "W-1"})));

    let err = upserter.resolve(&fx.scope(), &request).unwrap_err();

    assert_eq!(err.to_string(), "Error executing selector query: rejected: unexpected token");
}

#[test]
fn custom_query_record_not_found_is_wrapped() {
    let fx = fixture();
    let stack = InMemoryStack::from_fixture(&fx);
    let upserter = stack.upserter(EngineConfig::default()).unwrap();
    let request = UpsertRequest::new(UpsertMethod::Create,
                                     "ORDER_LINE",
                                     payload(json!({"salesOrder": "SO-1", "warehouse": "W-9"})));

    let err = upserter.resolve(&fx.scope(), &request).unwrap_err();

    assert_eq!(err.message_key(), "query_execution_error");
    assert_eq!(err.to_string(),
               "Error executing selector query: record W-9 not found in selector SEL-WAREHOUSE");
}

#[test]
fn custom_query_script_failure_is_wrapped() {
    let mut fx = fixture();
    for definition in fx.definitions.iter_mut() {
        for field in definition.fields.iter_mut() {
            if let Some(selector) = field.column.selector.as_mut().filter(|s| s.id == "SEL-WAREHOUSE") {
                selector.filter_expression = Some("e.organization.id = @#Unknown_Org@".into());
            }
        }
    }
    let stack = InMemoryStack::from_fixture(&fx);
    let upserter = stack.upserter(EngineConfig::default()).unwrap();
    let request = UpsertRequest::new(UpsertMethod::Create,
                                     "ORDER_LINE",
                                     payload(json!({"salesOrder": "SO-1", "warehouse": "W-1"})));

    let err = upserter.resolve(&fx.scope(), &request).unwrap_err();

    assert_eq!(err.message_key(), "query_execution_error");
    assert!(err.to_string().contains("filter expression failed"));
    assert!(stack.query_engine.queries().is_empty());
}

#[test]
fn custom_selector_without_outfields_resolves_nothing() {
    let mut fx = fixture();
    for definition in fx.definitions.iter_mut() {
        for field in definition.fields.iter_mut() {
            if let Some(selector) = field.column.selector.as_mut().filter(|s| s.id == "SEL-WAREHOUSE") {
                selector.fields.iter_mut().for_each(|f| f.outfield = false);
            }
        }
    }
    let stack = InMemoryStack::from_fixture(&fx);
    let upserter = stack.upserter(EngineConfig::default()).unwrap();
    let request = UpsertRequest::new(UpsertMethod::Create,
                                     "ORDER_LINE",
                                     payload(json!({"salesOrder": "SO-1", "warehouse": "W-1"})));

    let resolution = upserter.resolve(&fx.scope(), &request).unwrap();

    assert!(stack.search.requests().is_empty());
    assert!(stack.query_engine.queries().is_empty());
    assert_eq!(resolution.payload.get("warehouse"), Some(&json!("W-1")));
    assert!(!resolution.payload.contains_key("warehouse_NAME"));
}

#[test]
fn update_without_record_id_is_rejected() {
    let fx = fixture();
    let stack = InMemoryStack::from_fixture(&fx);
    let upserter = stack.upserter(EngineConfig::default()).unwrap();
    let request = UpsertRequest::new(UpsertMethod::Update { record_id: None },
                                     "ORDER",
                                     payload(json!({"description": "x"})));

    assert_eq!(upserter.upsert(&fx.scope(), &request), Err(UpsertError::MissingRecordId));
    assert!(stack.form_initializer.calls().is_empty());
}

#[test]
fn unknown_definition_and_unknown_column() {
    let fx = fixture();
    let stack = InMemoryStack::from_fixture(&fx);
    let upserter = stack.upserter(EngineConfig::default()).unwrap();

    let missing = UpsertRequest::new(UpsertMethod::Create, "NOPE", Payload::new());
    assert_eq!(upserter.resolve(&fx.scope(), &missing).unwrap_err(),
               UpsertError::DefinitionNotFound("NOPE".into()));

    let unknown = UpsertRequest::new(UpsertMethod::Create, "ORDER", payload(json!({"colour": "red"})));
    assert_eq!(upserter.resolve(&fx.scope(), &unknown).unwrap_err(),
               UpsertError::ColumnNotFound("colour".into()));
}

#[test]
fn metadata_and_selectors_run_elevated() {
    let fx = fixture();
    let stack = InMemoryStack::from_fixture(&fx);
    let upserter = stack.upserter(EngineConfig::default()).unwrap();
    let scope = fx.scope();

    upserter.resolve(&scope, &line_request("P-001")).unwrap();

    assert!(!scope.is_elevated());
    assert_eq!(stack.metadata.calls(), vec![(PrivilegeScope::Administrator, "ORDER_LINE".to_string())]);
}

#[test]
fn translators_are_cached_per_definition() {
    let fx = fixture();
    let stack = InMemoryStack::from_fixture(&fx);
    let upserter = stack.upserter(EngineConfig::default()).unwrap();

    upserter.resolve(&fx.scope(), &line_request("P-001")).unwrap();
    upserter.resolve(&fx.scope(), &line_request("P-002")).unwrap();
    let order = UpsertRequest::new(UpsertMethod::update("SO-1"), "ORDER", payload(json!({"description": "y"})));
    upserter.resolve(&fx.scope(), &order).unwrap();

    assert_eq!(upserter.translators().len(), 2);
}

#[test]
fn create_persists_normalized_payload() {
    let fx = fixture();
    let stack = InMemoryStack::from_fixture(&fx);
    let upserter = stack.upserter(EngineConfig::default()).unwrap();

    let saved = upserter.upsert(&fx.scope(), &line_request("P-001")).unwrap();

    assert!(saved.get("id").and_then(Value::as_str).is_some());
    match stack.persistence.calls().as_slice() {
        [PersistenceCall::Create { definition_id, payload }] => {
            assert_eq!(definition_id, "ORDER_LINE");
            assert!(payload.keys().all(|k| !k.starts_with("inp")));
        }
        other => panic!("unexpected persistence calls: {other:?}"),
    }
}

#[test]
fn input_names_round_trip_through_db_names() {
    let fx = fixture();
    for definition in &fx.definitions {
        let translator = rx_core::NameTranslator::build(definition);
        for field in translator.fields() {
            let Some(normalized) = field.normalized.as_mapped() else {
                continue;
            };
            let input = translator.input_for_normalized(normalized).unwrap();
            let db = translator.db_for_input(input).unwrap();
            assert_eq!(input_name(db), field.input_name);
        }
    }
}
