//! End-to-end dispatch tests: registry → URL mapping → resolution →
//! invocation.

use heron::prelude::*;
use heron::core::RequestSource;
use http::{Method, StatusCode};
use serde::Deserialize;
use std::convert::Infallible;
use std::io::Write;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("user {0} not found")]
struct UserNotFound(u32);

struct UserController {
    greeting: String,
}

impl UserController {
    async fn show(self: Arc<Self>, id: u32, verbose: Option<bool>) -> Result<String, UserNotFound> {
        if id == 0 {
            return Err(UserNotFound(id));
        }
        let suffix = if verbose.unwrap_or(false) { " (verbose)" } else { "" };
        Ok(format!("{} user {id}{suffix}", self.greeting))
    }

    async fn welcome(self: Arc<Self>, model: ModelMap) -> Result<(), Infallible> {
        model.add_attribute("greeting", HandlerValue::new(self.greeting.clone()));
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
struct CreateUser {
    name: String,
    admin: bool,
}

fn controller() -> Arc<UserController> {
    Arc::new(UserController {
        greeting: "hello".to_string(),
    })
}

fn registry() -> BeanRegistry {
    let controller = controller();
    let mut registry = BeanRegistry::new();

    let show = HandlerMethod::new(Arc::clone(&controller), "show", UserController::show)
        .with_parameter_names(["id", "verbose"]);
    registry.register("/users/show", Arc::new(show)).unwrap();

    let welcome = HandlerMethod::new(Arc::clone(&controller), "welcome", UserController::welcome);
    registry.register("/welcome", Arc::new(welcome)).unwrap();
    registry.alias("/welcome", "/").unwrap();

    let create = HandlerMethod::new(controller, "create", |_: Arc<UserController>, body: CreateUser| async move {
        Ok::<_, Infallible>(format!("created {} admin={}", body.name, body.admin))
    });
    registry.register("/users/create", Arc::new(create)).unwrap();

    registry
}

fn dispatcher() -> Dispatcher {
    let mut chain = heron::default_resolvers();
    chain.add(RequestBodyResolver::<CreateUser>::new());
    Dispatcher::builder(registry())
        .resolvers(chain)
        .binder_factory(Arc::new(DefaultBinderFactory::default()))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_dispatch_converts_query_parameters() {
    let dispatcher = dispatcher();
    let request = NativeRequest::builder()
        .uri("/users/show?id=7&verbose=true")
        .build();

    let outcome = dispatcher.dispatch(&request).await.unwrap();
    assert_eq!(outcome.handler, "/users/show");
    assert_eq!(
        outcome.value.downcast_ref::<String>().map(String::as_str),
        Some("hello user 7 (verbose)")
    );
}

#[tokio::test]
async fn test_optional_parameter_may_be_absent() {
    let dispatcher = dispatcher();
    let request = NativeRequest::builder().uri("/users/show?id=3").build();

    let outcome = dispatcher.dispatch(&request).await.unwrap();
    assert_eq!(
        outcome.value.downcast_ref::<String>().map(String::as_str),
        Some("hello user 3")
    );
}

#[tokio::test]
async fn test_missing_required_parameter_is_bad_request() {
    let dispatcher = dispatcher();
    let request = NativeRequest::builder().uri("/users/show").build();

    let err = dispatcher.dispatch(&request).await.unwrap_err();
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

    let resolution = err
        .invocation_error()
        .and_then(InvocationError::resolution_error)
        .unwrap();
    assert_eq!(resolution.request_source(), RequestSource::Query);
    assert_eq!(resolution.field(), Some("id"));
}

#[tokio::test]
async fn test_unconvertible_parameter_is_bad_request() {
    let dispatcher = dispatcher();
    let request = NativeRequest::builder().uri("/users/show?id=seven").build();

    let err = dispatcher.dispatch(&request).await.unwrap_err();
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    assert!(err.to_string().contains("seven"));
}

#[tokio::test]
async fn test_handler_error_keeps_its_identity() {
    let dispatcher = dispatcher();
    let request = NativeRequest::builder().uri("/users/show?id=0").build();

    let err = dispatcher.dispatch(&request).await.unwrap_err();
    let failure = err.invocation_error().and_then(InvocationError::failure).unwrap();
    assert!(failure.is::<UserNotFound>());
    assert_eq!(failure.downcast_ref::<UserNotFound>().map(|e| e.0), Some(0));
    assert_eq!(err.to_string(), "user 0 not found");
}

#[tokio::test]
async fn test_model_written_by_handler_is_returned() {
    let dispatcher = dispatcher();
    let request = NativeRequest::builder().uri("/welcome").build();

    let outcome = dispatcher.dispatch(&request).await.unwrap();
    let greeting = outcome.container.model().get("greeting").unwrap();
    assert_eq!(greeting.downcast_ref::<String>().map(String::as_str), Some("hello"));
}

#[tokio::test]
async fn test_alias_maps_root_path() {
    let dispatcher = dispatcher();
    assert_eq!(dispatcher.mapping().root_handler(), Some("/welcome"));

    let request = NativeRequest::builder().uri("/").build();
    let outcome = dispatcher.dispatch(&request).await.unwrap();
    assert_eq!(outcome.handler, "/welcome");
}

#[tokio::test]
async fn test_json_body_is_deserialized() {
    let dispatcher = dispatcher();
    let request = NativeRequest::builder()
        .method(Method::POST)
        .uri("/users/create")
        .header("content-type", "application/json")
        .body(r#"{"name":"ada","admin":true}"#)
        .build();

    let outcome = dispatcher.dispatch(&request).await.unwrap();
    assert_eq!(
        outcome.value.downcast_ref::<String>().map(String::as_str),
        Some("created ada admin=true")
    );
}

#[tokio::test]
async fn test_wrong_content_type_is_rejected() {
    let dispatcher = dispatcher();
    let request = NativeRequest::builder()
        .method(Method::POST)
        .uri("/users/create")
        .header("content-type", "text/plain")
        .body("ada")
        .build();

    let err = dispatcher.dispatch(&request).await.unwrap_err();
    assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_provided_argument_skips_resolution() {
    let dispatcher = dispatcher();
    let request = NativeRequest::builder().uri("/users/create").build();
    let provided = [ProvidedArg::value(CreateUser {
        name: "grace".to_string(),
        admin: false,
    })];

    let outcome = dispatcher.dispatch_with(&request, &provided).await.unwrap();
    assert_eq!(
        outcome.value.downcast_ref::<String>().map(String::as_str),
        Some("created grace admin=false")
    );
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let dispatcher = dispatcher();
    let request = NativeRequest::builder().uri("/missing").build();

    let err = dispatcher.dispatch(&request).await.unwrap_err();
    assert!(matches!(&err, DispatchError::NoHandlerFound { path } if path == "/missing"));
    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_default_handler_and_patterns() {
    struct Files;

    let mut registry = BeanRegistry::new();
    let fallback = HandlerMethod::new(Arc::new(Files), "fallback", |_: Arc<Files>| async move {
        Ok::<_, Infallible>("fallback")
    });
    let file = HandlerMethod::new(Arc::new(Files), "file", |_: Arc<Files>, req: NativeRequest| async move {
        Ok::<_, Infallible>(req.path().to_string())
    });
    registry.register("/*", Arc::new(fallback)).unwrap();
    registry.register("/files/**", Arc::new(file)).unwrap();

    let dispatcher = Dispatcher::builder(registry).build().unwrap();

    let request = NativeRequest::builder().uri("/files/docs/readme.md").build();
    let outcome = dispatcher.dispatch(&request).await.unwrap();
    assert_eq!(
        outcome.value.downcast_ref::<String>().map(String::as_str),
        Some("/files/docs/readme.md")
    );

    let request = NativeRequest::builder().uri("/elsewhere/deep").build();
    let outcome = dispatcher.dispatch(&request).await.unwrap();
    assert_eq!(outcome.handler, "/*");
    assert_eq!(outcome.value.downcast_ref::<&str>(), Some(&"fallback"));
}

#[tokio::test]
async fn test_rebound_receiver_is_reported() {
    struct Impostor;

    let show = HandlerMethod::new(controller(), "show", UserController::show)
        .with_parameter_names(["id", "verbose"])
        .with_receiver(Arc::new(Impostor));
    let mut registry = BeanRegistry::new();
    registry.register("/users/show", Arc::new(show)).unwrap();

    let dispatcher = Dispatcher::builder(registry)
        .binder_factory(Arc::new(DefaultBinderFactory::default()))
        .build()
        .unwrap();
    let request = NativeRequest::builder().uri("/users/show?id=1").build();

    let err = dispatcher.dispatch(&request).await.unwrap_err();
    assert!(matches!(
        err.invocation_error(),
        Some(InvocationError::ReceiverMismatch { .. })
    ));
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_panicking_handler_becomes_invocation_error() {
    struct Broken;

    let boom = HandlerMethod::new(Arc::new(Broken), "boom", |_: Arc<Broken>| async move {
        if true {
            panic!("boom");
        }
        Ok::<_, Infallible>(())
    });
    let mut registry = BeanRegistry::new();
    registry.register("/boom", Arc::new(boom)).unwrap();

    let dispatcher = Dispatcher::builder(registry).build().unwrap();
    let request = NativeRequest::builder().uri("/boom").build();

    let err = dispatcher.dispatch(&request).await.unwrap_err();
    match err.invocation_error() {
        Some(InvocationError::Invocation { message, details }) => {
            assert!(message.contains("boom"));
            assert!(details.contains("HandlerMethod details:"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_dispatcher_from_config_file() {
    struct Health;

    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
        [mapping]
        strategy = "declared"

        [invocation]
        trace_arguments = false
        "#
    )
    .unwrap();

    let health = HandlerMethod::new(Arc::new(Health), "health", |_: Arc<Health>| async move {
        Ok::<_, Infallible>("ok")
    });
    let mut registry = BeanRegistry::new();
    registry
        .register_with_urls("health", Arc::new(health), ["/health", "/healthz"])
        .unwrap();

    let dispatcher = Dispatcher::from_config_file(file.path(), registry).unwrap();
    assert!(!dispatcher.config().invocation.trace_arguments);

    let request = NativeRequest::builder().uri("/healthz").build();
    let outcome = dispatcher.dispatch(&request).await.unwrap();
    assert_eq!(outcome.handler, "health");
}

#[test]
fn test_missing_config_file_has_context() {
    let err = Dispatcher::from_config_file("/nonexistent/heron.toml", BeanRegistry::new())
        .unwrap_err();
    assert!(err.to_string().contains("loading configuration"));
    assert!(format!("{err:#}").contains("not found"));
}
