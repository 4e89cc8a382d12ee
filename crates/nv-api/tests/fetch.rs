//! Fetch behaviour against a scripted transport, with tokio time paused so
//! backoff sleeps complete instantly.

use std::sync::Arc;
use std::time::Duration;

use nv_api::{
    ApiError, FetchError, FetchOptions, Fetcher, RateLimiter, RawResponse, RetryPolicy,
    ScriptedTransport,
};
use nv_core::{Catalog, ScopeInstance};
use pretty_assertions::assert_eq;
use serde_json::json;

fn fetcher(transport: &ScriptedTransport) -> Fetcher<ScriptedTransport> {
    Fetcher::new(
        transport.clone(),
        Arc::new(RateLimiter::new(100, 10)),
        FetchOptions {
            page_size: 2,
            retry: RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_millis(100),
                max_delay: Duration::from_secs(1),
            },
        },
    )
}

fn catalog() -> Catalog {
    Catalog::from_toml_str(
        r#"
[[endpoint]]
scope = "network"
feature = "Vlans"
path = "/networks/{networkId}/appliance/vlans"

[[endpoint]]
scope = "organization"
feature = "Inventory"
path = "/organizations/{organizationId}/inventory"
paginated = true
"#,
    )
    .unwrap()
}

fn network_scope() -> ScopeInstance {
    ScopeInstance::Network {
        org_id: "o1".into(),
        network_id: "N_1".into(),
    }
}

#[tokio::test(start_paused = true)]
async fn fetch_returns_resource() {
    let transport = ScriptedTransport::new();
    transport.route_json("/networks/N_1/appliance/vlans", &json!([{"id": 1}]));
    let catalog = catalog();

    let resource = fetcher(&transport)
        .fetch(&catalog.endpoints[0], &network_scope())
        .await
        .unwrap();
    assert_eq!(resource.body, json!([{"id": 1}]));
    assert_eq!(
        resource.id.path().to_string_lossy().replace('\\', "/"),
        "networks/N_1/Vlans.json"
    );
}

#[tokio::test(start_paused = true)]
async fn retries_transient_failures_then_succeeds() {
    let transport = ScriptedTransport::new();
    let path = "/networks/N_1/appliance/vlans";
    transport
        .route_json(path, &json!({"ok": true}))
        .queue(
            path,
            vec![
                Ok(RawResponse::with_status(503, "busy")),
                Err(ApiError::Transport("connection reset".into())),
            ],
        );
    let catalog = catalog();

    let resource = fetcher(&transport)
        .fetch(&catalog.endpoints[0], &network_scope())
        .await
        .unwrap();
    assert_eq!(resource.body, json!({"ok": true}));
    assert_eq!(transport.calls(path), 3);
}

#[tokio::test(start_paused = true)]
async fn honours_retry_after() {
    let transport = ScriptedTransport::new();
    let path = "/networks/N_1/appliance/vlans";
    transport
        .route_json(path, &json!([]))
        .queue(path, vec![Ok(RawResponse::with_status(429, "").retry_after(5))]);
    let catalog = catalog();

    let begin = tokio::time::Instant::now();
    fetcher(&transport)
        .fetch(&catalog.endpoints[0], &network_scope())
        .await
        .unwrap();
    assert!(begin.elapsed() >= Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_report_attempts() {
    let transport = ScriptedTransport::new();
    let path = "/networks/N_1/appliance/vlans";
    transport.route(path, RawResponse::with_status(500, "boom"));
    let catalog = catalog();

    let err = fetcher(&transport)
        .fetch(&catalog.endpoints[0], &network_scope())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Exhausted { attempts: 3, .. }));
    assert_eq!(transport.calls(path), 3);
}

#[tokio::test(start_paused = true)]
async fn client_errors_are_not_applicable_and_not_retried() {
    let transport = ScriptedTransport::new();
    let path = "/networks/N_1/appliance/vlans";
    transport.route(
        path,
        RawResponse::with_status(400, r#"{"errors":["VLANs are not enabled"]}"#),
    );
    let catalog = catalog();

    let err = fetcher(&transport)
        .fetch(&catalog.endpoints[0], &network_scope())
        .await
        .unwrap_err();
    match err {
        FetchError::NotApplicable { status, message } => {
            assert_eq!(status, 400);
            assert!(message.contains("VLANs are not enabled"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(transport.calls(path), 1);
}

#[tokio::test(start_paused = true)]
async fn paginated_pages_are_concatenated() {
    let transport = ScriptedTransport::new();
    transport
        .route(
            "/organizations/o1/inventory?perPage=2",
            RawResponse::json(&json!([{"serial": "A"}, {"serial": "B"}]))
                .next("https://api.test/v1/organizations/o1/inventory?perPage=2&startingAfter=B"),
        )
        .route_json(
            "https://api.test/v1/organizations/o1/inventory?perPage=2&startingAfter=B",
            &json!([{"serial": "C"}]),
        );
    let catalog = catalog();

    let resource = fetcher(&transport)
        .fetch(
            &catalog.endpoints[1],
            &ScopeInstance::Organization { org_id: "o1".into() },
        )
        .await
        .unwrap();
    assert_eq!(
        resource.body,
        json!([{"serial": "A"}, {"serial": "B"}, {"serial": "C"}])
    );
}

#[tokio::test(start_paused = true)]
async fn each_page_is_retried_on_its_own() {
    let transport = ScriptedTransport::new();
    let second = "https://api.test/v1/organizations/o1/inventory?startingAfter=B";
    transport
        .route(
            "/organizations/o1/inventory?perPage=2",
            RawResponse::json(&json!([1, 2])).next(second),
        )
        .route_json(second, &json!([3]))
        .queue(second, vec![Ok(RawResponse::with_status(502, ""))]);
    let catalog = catalog();

    let resource = fetcher(&transport)
        .fetch(
            &catalog.endpoints[1],
            &ScopeInstance::Organization { org_id: "o1".into() },
        )
        .await
        .unwrap();
    assert_eq!(resource.body, json!([1, 2, 3]));
    assert_eq!(transport.calls("/organizations/o1/inventory?perPage=2"), 1);
    assert_eq!(transport.calls(second), 2);
}

#[tokio::test(start_paused = true)]
async fn repeating_next_link_is_rejected() {
    let transport = ScriptedTransport::new();
    let second = "https://api.test/v1/organizations/o1/inventory?startingAfter=B";
    transport
        .route(
            "/organizations/o1/inventory?perPage=2",
            RawResponse::json(&json!([1, 2])).next(second),
        )
        .route(second, RawResponse::json(&json!([3])).next(second));
    let catalog = catalog();

    let err = fetcher(&transport)
        .fetch(
            &catalog.endpoints[1],
            &ScopeInstance::Organization { org_id: "o1".into() },
        )
        .await
        .unwrap_err();
    match err {
        FetchError::Parse { target, .. } => assert_eq!(target, second),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(transport.calls(second), 1);
}
