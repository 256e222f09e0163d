//! REST/JSON calls against an in-process server.

mod common;

use axum::http::{Method, StatusCode};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde_json::json;
use softlayer_session::{Code, Options, Protocol, Session, SessionError, Value};

use common::{Reply, TestServer, session};

#[derive(Debug, Default, Deserialize, PartialEq)]
struct Bar {
    a: i64,
    b: i64,
}

#[tokio::test]
async fn get_bar_populates_destination() {
    let server = TestServer::start(|_, _| Reply::json(json!({"a": 1, "b": 2}))).await;
    let session = session(server.rest_endpoint()).build().unwrap();
    assert_eq!(session.protocol(), Protocol::Rest);

    let mut dest = Bar::default();
    session
        .do_request(
            "Foo",
            "getBar",
            &[],
            &Options::new().id(42).mask("a,b"),
            &mut dest,
        )
        .await
        .unwrap();
    assert_eq!(dest, Bar { a: 1, b: 2 });

    let request = server.last();
    assert_eq!(request.method, Method::GET);
    assert_eq!(request.path, "/rest/v3.1/Foo/42/getBar.json");
    assert_eq!(request.query["objectMask"], "mask[a,b]");
    assert!(!request.query.contains_key("resultLimit"));
    assert_eq!(
        request.header("authorization").unwrap(),
        format!("Basic {}", STANDARD.encode("user:secret-key"))
    );
    assert!(
        request
            .header("user-agent")
            .unwrap()
            .starts_with("softlayer-session/")
    );
}

#[tokio::test]
async fn not_found_leaves_destination_untouched() {
    let server = TestServer::start(|_, _| {
        Reply::new(
            StatusCode::NOT_FOUND,
            r#"{"error":"Unable to find object with id of '42'.","code":"SoftLayer_Exception_ObjectNotFound"}"#,
        )
    })
    .await;
    let session = session(server.rest_endpoint()).build().unwrap();

    let mut dest = Bar { a: 7, b: 8 };
    let err = session
        .do_request("Foo", "getBar", &[], &Options::new().id(42), &mut dest)
        .await
        .unwrap_err();

    assert_eq!(dest, Bar { a: 7, b: 8 });
    assert_eq!(err.code(), Code::NotFound);
    assert!(!err.is_retryable());
    let fault = err.fault().unwrap();
    assert_eq!(fault.code(), "SoftLayer_Exception_ObjectNotFound");
    assert_eq!(fault.message(), "Unable to find object with id of '42'.");
    assert_eq!(fault.http_status(), Some(404));
    assert_eq!(server.request_count(), 1);
}

#[tokio::test]
async fn arguments_travel_in_parameters_body() {
    let server = TestServer::start(|_, _| Reply::json(json!(true))).await;
    let session = session(server.rest_endpoint()).build().unwrap();

    let ok: bool = session
        .call(
            "SoftLayer_Virtual_Guest",
            "setTags",
            &[Value::from("web,prod")],
            &Options::new().id(1234),
        )
        .await
        .unwrap();
    assert!(ok);

    let request = server.last();
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.path, "/rest/v3.1/SoftLayer_Virtual_Guest/1234/setTags.json");
    assert_eq!(request.rest_parameters(), vec![json!("web,prod")]);
    assert_eq!(request.header("content-type"), Some("application/json"));
}

struct VerbCase {
    name: &'static str,
    method: &'static str,
    args: Vec<Value>,
    id: Option<i64>,
    verb: Method,
    path: &'static str,
}

fn verb_cases() -> Vec<VerbCase> {
    vec![
        VerbCase {
            name: "getObject uses GET without method segment",
            method: "getObject",
            args: Vec::new(),
            id: Some(5),
            verb: Method::GET,
            path: "/rest/v3.1/Foo/5.json",
        },
        VerbCase {
            name: "createObject uses POST without method segment",
            method: "createObject",
            args: vec![Value::structure([("hostname", "web1")])],
            id: None,
            verb: Method::POST,
            path: "/rest/v3.1/Foo.json",
        },
        VerbCase {
            name: "editObject uses PUT",
            method: "editObject",
            args: vec![Value::structure([("notes", "updated")])],
            id: Some(5),
            verb: Method::PUT,
            path: "/rest/v3.1/Foo/5.json",
        },
        VerbCase {
            name: "deleteObject uses DELETE",
            method: "deleteObject",
            args: Vec::new(),
            id: Some(5),
            verb: Method::DELETE,
            path: "/rest/v3.1/Foo/5.json",
        },
        VerbCase {
            name: "other methods without arguments use GET",
            method: "getAllObjects",
            args: Vec::new(),
            id: None,
            verb: Method::GET,
            path: "/rest/v3.1/Foo/getAllObjects.json",
        },
    ]
}

#[tokio::test]
async fn verbs_and_paths() {
    let server = TestServer::start(|_, _| Reply::json(json!(null))).await;
    let session = session(server.rest_endpoint()).build().unwrap();

    for case in verb_cases() {
        let mut options = Options::new();
        if let Some(id) = case.id {
            options = options.id(id);
        }
        session
            .call_void("Foo", case.method, &case.args, &options)
            .await
            .unwrap_or_else(|e| panic!("{}: {e}", case.name));

        let request = server.last();
        assert_eq!(request.method, case.verb, "{}", case.name);
        assert_eq!(request.path, case.path, "{}", case.name);
    }
}

#[tokio::test]
async fn filter_and_window_in_query() {
    let server = TestServer::start(|_, _| Reply::json(json!([]))).await;
    let session = session(server.rest_endpoint()).build().unwrap();

    let filter = r#"{"virtualGuests":{"hostname":{"operation":"web1"}}}"#;
    let _: Vec<serde_json::Value> = session
        .call(
            "SoftLayer_Account",
            "getVirtualGuests",
            &[],
            &Options::new().filter(filter).limit(25).offset(50),
        )
        .await
        .unwrap();

    let request = server.last();
    assert_eq!(request.query["objectFilter"], filter);
    assert_eq!(request.query["resultLimit"], "50,25");
    assert!(!request.query.contains_key("objectMask"));
}

#[tokio::test]
async fn bearer_token_authorization() {
    let server = TestServer::start(|_, _| Reply::json(json!({"id": 1}))).await;
    let session = Session::builder()
        .endpoint(server.rest_endpoint())
        .bearer_token("tok-123")
        .build()
        .unwrap();

    let _: serde_json::Value = session
        .call("SoftLayer_Account", "getObject", &[], &Options::new())
        .await
        .unwrap();
    assert_eq!(server.last().header("authorization"), Some("Bearer tok-123"));
}

#[tokio::test]
async fn total_items_reported_with_partial_page() {
    let server = TestServer::start(|_, _| {
        let items: Vec<_> = (0..10).map(|id| json!({"id": id})).collect();
        Reply::json(json!(items)).header("softlayer-total-items", "37")
    })
    .await;
    let session = session(server.rest_endpoint()).build().unwrap();

    let response = session
        .call_with_metadata::<Vec<serde_json::Value>>(
            "SoftLayer_Account",
            "getVirtualGuests",
            &[],
            &Options::new().limit(10).offset(0),
        )
        .await
        .unwrap();

    assert_eq!(response.total_items(), Some(37));
    assert_eq!(response.get_ref().len(), 10);
    assert_eq!(server.last().query["resultLimit"], "0,10");
}

#[tokio::test]
async fn pages_collects_every_item() {
    const TOTAL: usize = 37;
    let server = TestServer::start(|request, _| {
        let (offset, limit) = request.query["resultLimit"].split_once(',').unwrap();
        let offset: usize = offset.parse().unwrap();
        let limit: usize = limit.parse().unwrap();
        let items: Vec<_> = (offset..TOTAL.min(offset + limit)).collect();
        Reply::json(json!(items)).header("softlayer-total-items", TOTAL.to_string())
    })
    .await;
    let session = session(server.rest_endpoint()).build().unwrap();

    let page = session
        .pages::<usize>("SoftLayer_Account", "getVirtualGuests", &[], &Options::new(), 10)
        .await
        .unwrap();

    assert_eq!(page.items, (0..TOTAL).collect::<Vec<_>>());
    assert_eq!(page.total_items, Some(TOTAL as u64));
    let windows: Vec<_> = server
        .requests()
        .iter()
        .map(|r| r.query["resultLimit"].clone())
        .collect();
    assert_eq!(windows, ["0,10", "10,10", "20,10", "30,10"]);
}

#[tokio::test]
async fn pages_returns_unwindowed_result_in_one_request() {
    let server = TestServer::start(|_, _| Reply::json(json!([1, 2, 3, 4, 5]))).await;
    let session = session(server.rest_endpoint()).build().unwrap();

    let page = session
        .pages::<u32>("SoftLayer_Account", "getVirtualGuests", &[], &Options::new(), 2)
        .await
        .unwrap();

    assert_eq!(page.items, vec![1, 2, 3, 4, 5]);
    assert_eq!(page.total_items, None);
    assert_eq!(server.request_count(), 1);
}

#[tokio::test]
async fn echo_round_trip() {
    let server = TestServer::start(|request, _| {
        let parameters = request.rest_parameters();
        Reply::json(parameters.into_iter().next().unwrap_or(serde_json::Value::Null))
    })
    .await;
    let session = session(server.rest_endpoint()).build().unwrap();

    let cases = [
        ("null", Value::Null, json!(null)),
        ("primitive", Value::Int(42), json!(42)),
        (
            "nested struct",
            Value::structure([
                ("hostname", Value::from("web1")),
                ("cpus", Value::Int(4)),
                ("datacenter", Value::structure([("name", "dal13")])),
                ("notes", Value::Null),
            ]),
            json!({
                "hostname": "web1",
                "cpus": 4,
                "datacenter": {"name": "dal13"},
                "notes": null,
            }),
        ),
        (
            "sequence",
            Value::from(vec![Value::Int(1), Value::from("two"), Value::Bool(false)]),
            json!([1, "two", false]),
        ),
    ];

    for (name, arg, expected) in cases {
        let echoed: serde_json::Value = session
            .call("Test", "echo", &[arg], &Options::new())
            .await
            .unwrap();
        assert_eq!(echoed, expected, "{name}");
    }
}

#[tokio::test]
async fn empty_body_decodes_as_none() {
    let server = TestServer::start(|_, _| Reply::new(StatusCode::OK, "")).await;
    let session = session(server.rest_endpoint()).build().unwrap();

    let result: Option<Bar> = session
        .call("Foo", "getBar", &[], &Options::new())
        .await
        .unwrap();
    assert_eq!(result, None);
}

#[tokio::test]
async fn unparseable_success_body_is_decode_error() {
    let server = TestServer::start(|_, _| Reply::new(StatusCode::OK, "<html>maintenance</html>")).await;
    let session = session(server.rest_endpoint()).build().unwrap();

    let mut dest = Bar { a: 1, b: 1 };
    let err = session
        .do_request("Foo", "getBar", &[], &Options::new(), &mut dest)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Decode(_)), "{err:?}");
    assert_eq!(dest, Bar { a: 1, b: 1 });
    assert_eq!(server.request_count(), 1);
}
