// tests/property/response_test.rs

//! Property-based tests for request parsing and response construction.

use agentd::core::CommandError;
use agentd::core::handler::{CommandRegistry, Dispatcher, handler_fn};
use agentd::core::protocol::{Request, Response};
use agentd::core::state::StatsState;
use proptest::prelude::*;
use serde_json::{Value, json};
use std::sync::Arc;

fn json_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        "[a-zA-Z0-9 _:-]{0,24}".prop_map(Value::String),
    ]
}

fn json_value() -> impl Strategy<Value = Value> {
    json_leaf().prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,8}", inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 100,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_request_wire_round_trip(
        id in any::<u32>(),
        method in "[A-Za-z][A-Za-z0-9_]{0,16}",
        params in json_value(),
    ) {
        let request = Request::new(id, method, params);
        let parsed = Request::from_slice(&request.to_bytes().unwrap()).unwrap();
        prop_assert_eq!(parsed, request);
    }

    #[test]
    fn test_response_echoes_id_and_is_exclusive(
        id in any::<u32>(),
        params in json_value(),
        fail in any::<bool>(),
    ) {
        let mut registry = CommandRegistry::new();
        registry.register("Echo", handler_fn(|params| async move { Ok(params) }));
        registry.register("Fail", handler_fn(|params: Value| async move {
            Err(CommandError::Custom(params.to_string()))
        }));
        let dispatcher = Dispatcher::new(Arc::new(registry), Arc::new(StatsState::new()));
        let method = if fail { "Fail" } else { "Echo" };

        let rt = tokio::runtime::Runtime::new().unwrap();
        let response = rt
            .block_on(dispatcher.execute(&Request::new(id, method, params.clone())))
            .unwrap();

        prop_assert_eq!(response.id, id);
        prop_assert!(response.result.is_none() || response.error.is_none());
        if fail {
            prop_assert!(response.is_error());
        } else {
            prop_assert_eq!(response.result.clone(), Some(params));
        }

        let wire: Value = serde_json::from_slice(&response.to_bytes().unwrap()).unwrap();
        prop_assert_eq!(&wire["id"], &json!(id));
        let read_back = Response::from_slice(&response.to_bytes().unwrap()).unwrap();
        prop_assert_eq!(read_back.id, id);
    }
}
