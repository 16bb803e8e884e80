#![allow(non_snake_case)]

use super::*;
use crate::{ErrorCode, RpcError};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
struct MulArgs {
    #[serde(rename = "A")]
    a: i64,
    #[serde(rename = "B")]
    b: i64,
}

#[derive(Debug, Default, Serialize)]
struct MulReply {
    #[serde(rename = "Result")]
    result: i64,
}

#[derive(Default)]
struct Arith;

impl Arith {
    fn multiply(&self, _ctx: &RequestContext, args: &MulArgs, reply: &mut MulReply) -> Result<(), ServiceError> {
        reply.result = args.a * args.b;
        Ok(())
    }

    fn refuse(&self, _ctx: &RequestContext, _args: &MulArgs, _reply: &mut MulReply) -> Result<(), RpcError> {
        Err(RpcError::new(-32001, "refused").with_data(json!("nope")))
    }

    fn explode(&self, _ctx: &RequestContext, _args: &MulArgs, _reply: &mut MulReply) -> anyhow::Result<()> {
        anyhow::bail!("exploded")
    }
}

impl Service for Arith {
    fn methods(self: Arc<Self>) -> Vec<MethodSpec> {
        ServiceBuilder::new(self)
            .method("Multiply", Arith::multiply)
            .method("Refuse", Arith::refuse)
            .method("Explode", Arith::explode)
            .method("", Arith::multiply)
            .method("Multiply.Twice", Arith::multiply)
            .build()
    }
}

struct Empty;

impl Service for Empty {
    fn methods(self: Arc<Self>) -> Vec<MethodSpec> {
        Vec::new()
    }
}

mod nested {
    pub struct Wrapper<T>(pub T);
}

fn registry_with_arith() -> ServiceRegistry {
    let registry = ServiceRegistry::new();
    registry.register(Arith, "").unwrap();
    registry
}

fn call(registry: &ServiceRegistry, method: &str, params: Value) -> Result<Value, ServiceError> {
    let spec = registry.resolve(method)?;
    let mut args = spec.new_args();
    args.bind(&params)?;
    let reply = spec.invoke(&RequestContext::default(), args)?;
    Ok(reply.to_value()?)
}

// infer_service_name tests

#[test]
fn infer_service_name___plain_type___returns_last_segment() {
    assert_eq!(infer_service_name::<Arith>(), "Arith");
}

#[test]
fn infer_service_name___generic_type___strips_arguments() {
    assert_eq!(infer_service_name::<nested::Wrapper<Arith>>(), "Wrapper");
}

// ServiceRegistry::register tests

#[test]
fn ServiceRegistry___register_empty_name___infers_from_type() {
    let registry = registry_with_arith();

    assert_eq!(registry.service_names(), vec!["Arith".to_string()]);
    assert!(registry.receiver_type("Arith").unwrap().ends_with("Arith"));
}

#[test]
fn ServiceRegistry___register_explicit_name___uses_given_name() {
    let registry = ServiceRegistry::new();

    registry.register(Arith, "Svc").unwrap();

    assert!(registry.has_method("Svc.Multiply"));
    assert!(!registry.has_method("Arith.Multiply"));
}

#[test]
fn ServiceRegistry___register_duplicate___fails_and_keeps_first() {
    let registry = ServiceRegistry::new();
    registry.register(Arith, "Svc").unwrap();

    let result = registry.register(Arith, "Svc");

    assert_eq!(result, Err(RegistryError::DuplicateService("Svc".into())));
    assert_eq!(registry.len(), 1);
    assert!(registry.has_method("Svc.Multiply"));
}

#[test]
fn ServiceRegistry___register_without_methods___fails() {
    let registry = ServiceRegistry::new();

    let result = registry.register(Empty, "");

    assert!(matches!(result, Err(RegistryError::NoEligibleMethods(_))));
    assert!(registry.is_empty());
}

#[test]
fn ServiceRegistry___register_dotted_name___fails() {
    let registry = ServiceRegistry::new();

    let result = registry.register(Arith, "a.b");

    assert_eq!(result, Err(RegistryError::InvalidServiceName("a.b".into())));
}

#[test]
fn ServiceRegistry___register___skips_methods_with_invalid_names() {
    let registry = registry_with_arith();

    let methods = registry.method_names("Arith").unwrap();

    assert_eq!(methods, vec!["Explode", "Multiply", "Refuse"]);
}

// ServiceRegistry::resolve tests

#[test]
fn ServiceRegistry___resolve___returns_spec_with_type_names() {
    let registry = registry_with_arith();

    let spec = registry.resolve("Arith.Multiply").unwrap();

    assert_eq!(spec.name(), "Multiply");
    assert!(spec.args_type().ends_with("MulArgs"));
    assert!(spec.reply_type().ends_with("MulReply"));
}

#[test]
fn ServiceRegistry___resolve_no_dot___is_malformed() {
    let registry = registry_with_arith();

    let err = registry.resolve("NoDot").unwrap_err();

    assert_eq!(err, RegistryError::MalformedMethodName("NoDot".into()));
}

#[test]
fn ServiceRegistry___resolve_empty_component___is_malformed() {
    let registry = registry_with_arith();

    assert!(matches!(
        registry.resolve(".Multiply"),
        Err(RegistryError::MalformedMethodName(_))
    ));
    assert!(matches!(
        registry.resolve("Arith."),
        Err(RegistryError::MalformedMethodName(_))
    ));
}

#[test]
fn ServiceRegistry___resolve_unknown_method___is_not_found() {
    let registry = registry_with_arith();

    let err = registry.resolve("Arith.DoesNotExist").unwrap_err();

    assert_eq!(err, RegistryError::MethodNotFound("Arith.DoesNotExist".into()));
}

#[test]
fn ServiceRegistry___resolve_unknown_service___is_not_found() {
    let registry = registry_with_arith();

    let err = registry.resolve("Nope.Multiply").unwrap_err();

    assert!(matches!(err, RegistryError::MethodNotFound(_)));
}

#[test]
fn ServiceRegistry___resolve_extra_dot___splits_on_first() {
    let registry = registry_with_arith();

    let err = registry.resolve("Arith.Multiply.Again").unwrap_err();

    assert!(matches!(err, RegistryError::MethodNotFound(_)));
}

// MethodSpec tests

#[test]
fn MethodSpec___invoke___multiplies() {
    let registry = registry_with_arith();

    let reply = call(&registry, "Arith.Multiply", json!({"A": 6, "B": 7})).unwrap();

    assert_eq!(reply, json!({"Result": 42}));
}

#[test]
fn MethodSpec___invoke_without_binding___uses_zero_args() {
    let registry = registry_with_arith();
    let spec = registry.resolve("Arith.Multiply").unwrap();

    let reply = spec
        .invoke(&RequestContext::default(), spec.new_args())
        .unwrap();

    assert_eq!(reply.to_value().unwrap(), json!({"Result": 0}));
}

#[test]
fn MethodSpec___invoke_rpc_error___passes_through_unmodified() {
    let registry = registry_with_arith();

    let err = call(&registry, "Arith.Refuse", json!({})).unwrap_err();

    let rpc = err.into_rpc_error();
    assert_eq!(rpc.code, ErrorCode::Custom(-32001));
    assert_eq!(rpc.message, "refused");
    assert_eq!(rpc.data, Some(json!("nope")));
}

#[test]
fn MethodSpec___invoke_anyhow_error___is_generic_failure() {
    let registry = registry_with_arith();

    let err = call(&registry, "Arith.Explode", json!({})).unwrap_err();

    assert!(matches!(err, ServiceError::Failure(_)));
    assert_eq!(err.to_string(), "exploded");
}

#[test]
fn MethodSpec___invoke_foreign_args___fails_instead_of_panicking() {
    let registry = registry_with_arith();
    let spec = registry.resolve("Arith.Multiply").unwrap();
    let foreign: Box<dyn ArgsValue> = new_args::<String>();

    let result = spec.invoke(&RequestContext::default(), foreign);

    assert!(matches!(result, Err(ServiceError::Failure(_))));
}

// ArgsValue tests

#[test]
fn ArgsValue___bind_positional___unwraps_single_element_array() {
    let mut args = TypedArgs(MulArgs::default());

    args.bind_positional(&json!([{"A": 2, "B": 4}])).unwrap();

    assert_eq!(args.0, MulArgs { a: 2, b: 4 });
}

#[test]
fn ArgsValue___bind_array___fails_and_keeps_previous_value() {
    let mut args = TypedArgs(MulArgs { a: 1, b: 1 });

    let result = args.bind(&json!([{"A": 2, "B": 4}]));

    assert!(result.is_err());
    assert_eq!(args.0, MulArgs { a: 1, b: 1 });
}

#[test]
fn ArgsValue___bind_scalar_array___fails_for_struct() {
    let mut args = TypedArgs(MulArgs::default());

    let result = args.bind(&json!([2, 4]));

    assert!(result.unwrap_err().to_string().contains("params object"));
    assert_eq!(args.0, MulArgs::default());
}

#[test]
fn ArgsValue___bind_array___fills_sequence_type() {
    let mut args = TypedArgs(Vec::<i64>::new());

    args.bind(&json!([2, 4])).unwrap();

    assert_eq!(args.0, vec![2, 4]);
}

#[test]
fn ArgsValue___bind_positional_nested_scalar_array___fails_for_struct() {
    let mut args = TypedArgs(MulArgs::default());

    let result = args.bind_positional(&json!([[2, 4]]));

    assert!(result.is_err());
    assert_eq!(args.0, MulArgs::default());
}

#[test]
fn ArgsValue___bind_positional_object___fails() {
    let mut args = TypedArgs(MulArgs::default());

    let result = args.bind_positional(&json!({"A": 2}));

    assert!(result.is_err());
}

#[test]
fn ArgsValue___bind_positional_two_elements___fails() {
    let mut args = TypedArgs(MulArgs::default());

    let result = args.bind_positional(&json!([{"A": 1}, {"B": 2}]));

    assert!(result.is_err());
    assert_eq!(args.0, MulArgs::default());
}

#[test]
fn ArgsValue___type_name___names_concrete_type() {
    let args = new_args::<MulArgs>();

    assert!(args.type_name().ends_with("MulArgs"));
}

// Concurrency

#[test]
fn ServiceRegistry___concurrent_resolve_and_register___stays_consistent() {
    let registry = Arc::new(registry_with_arith());

    std::thread::scope(|scope| {
        for i in 0..8 {
            let registry = Arc::clone(&registry);
            scope.spawn(move || {
                for _ in 0..100 {
                    let reply = call(&registry, "Arith.Multiply", json!({"A": i, "B": 2})).unwrap();
                    assert_eq!(reply, json!({"Result": i * 2}));
                }
            });
        }
        let registry = Arc::clone(&registry);
        scope.spawn(move || {
            for i in 0..20 {
                registry.register(Arith, &format!("Arith{i}")).unwrap();
            }
        });
    });

    assert_eq!(registry.len(), 21);
}

// ReplyValue tests

#[derive(Serialize)]
struct Ordered {
    zulu: u8,
    alpha: u8,
}

#[test]
fn ReplyValue___to_raw_value___keeps_declaration_order() {
    let reply = Ordered { zulu: 1, alpha: 2 };

    let raw = reply.to_raw_value().unwrap();

    assert_eq!(raw.get(), r#"{"zulu":1,"alpha":2}"#);
}
