//! Service registry and method dispatch contract
//!
//! A service is any `Send + Sync` value whose methods follow the contract
//!
//! ```text
//! fn name(&self, ctx: &RequestContext, args: &Args, reply: &mut Reply) -> Result<(), E>
//! ```
//!
//! where `Args: DeserializeOwned + Default`, `Reply: Serialize + Default`
//! and `E: Into<ServiceError>`. Each conforming method is turned into a
//! type-erased [`MethodSpec`] at registration time, either through
//! [`ServiceBuilder`] or the `#[rpc_service]` attribute which emits the
//! builder calls. Nothing is inspected at dispatch time.

use crate::{RegistryError, RequestContext, ServiceError};
use parking_lot::RwLock;
use serde::Serialize;
use serde::de::{self, DeserializeOwned, Deserializer, Unexpected, Visitor};
use serde_json::Value;
use serde_json::value::RawValue;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Type-erased, freshly allocated arguments of one call
pub trait ArgsValue: Send {
    /// Bind by name: `params` is the arguments value itself
    ///
    /// On failure the previous value is left untouched.
    fn bind(&mut self, params: &Value) -> Result<(), serde_json::Error>;

    /// Bind by position: `params` is a single-element array holding the arguments
    ///
    /// On failure the previous value is left untouched.
    fn bind_positional(&mut self, params: &Value) -> Result<(), serde_json::Error>;

    /// Name of the concrete arguments type
    fn type_name(&self) -> &'static str;

    #[doc(hidden)]
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

/// Concrete arguments slot used by [`MethodSpec::new_args`]
///
/// Public so codecs can be exercised without a registry.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TypedArgs<A>(pub A);

impl<A> TypedArgs<A> {
    pub fn into_inner(self) -> A {
        self.0
    }
}

impl<A> ArgsValue for TypedArgs<A>
where
    A: DeserializeOwned + Send + 'static,
{
    fn bind(&mut self, params: &Value) -> Result<(), serde_json::Error> {
        self.0 = A::deserialize(ByName(params))?;
        Ok(())
    }

    fn bind_positional(&mut self, params: &Value) -> Result<(), serde_json::Error> {
        match params.as_array().map(Vec::as_slice) {
            Some([args]) => {
                self.0 = A::deserialize(ByName(args))?;
                Ok(())
            }
            Some(items) => Err(de::Error::invalid_length(
                items.len(),
                &"an array of one element",
            )),
            None => Err(de::Error::custom(
                "invalid type: expected an array of one element",
            )),
        }
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<A>()
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        Box::new(self.0)
    }
}

/// Deserializer for by-name params
///
/// Derived structs accept a sequence as well as a map. By-name binding must
/// not, so a struct is only read from a JSON object. Sequence targets such
/// as `Vec<T>` or tuples still read arrays.
struct ByName<'a>(&'a Value);

macro_rules! forward_to_value {
    ($($method:ident)*) => {
        $(
            fn $method<V: Visitor<'a>>(self, visitor: V) -> Result<V::Value, Self::Error> {
                self.0.$method(visitor)
            }
        )*
    };
}

impl<'a> Deserializer<'a> for ByName<'a> {
    type Error = serde_json::Error;

    forward_to_value! {
        deserialize_any deserialize_bool
        deserialize_i8 deserialize_i16 deserialize_i32 deserialize_i64 deserialize_i128
        deserialize_u8 deserialize_u16 deserialize_u32 deserialize_u64 deserialize_u128
        deserialize_f32 deserialize_f64 deserialize_char deserialize_str deserialize_string
        deserialize_bytes deserialize_byte_buf deserialize_option deserialize_unit
        deserialize_seq deserialize_map deserialize_identifier deserialize_ignored_any
    }

    fn deserialize_unit_struct<V: Visitor<'a>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.0.deserialize_unit_struct(name, visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'a>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.0.deserialize_newtype_struct(name, visitor)
    }

    fn deserialize_tuple<V: Visitor<'a>>(
        self,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.0.deserialize_tuple(len, visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'a>>(
        self,
        name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.0.deserialize_tuple_struct(name, len, visitor)
    }

    fn deserialize_struct<V: Visitor<'a>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Array(_) => Err(de::Error::invalid_type(Unexpected::Seq, &"a params object")),
            value => value.deserialize_struct(name, fields, visitor),
        }
    }

    fn deserialize_enum<V: Visitor<'a>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.0.deserialize_enum(name, variants, visitor)
    }
}

fn new_args<A>() -> Box<dyn ArgsValue>
where
    A: DeserializeOwned + Default + Send + 'static,
{
    Box::new(TypedArgs(A::default()))
}

/// Type-erased reply produced by a method
pub trait ReplyValue: Send {
    fn to_value(&self) -> Result<Value, serde_json::Error>;

    /// Encoded JSON text, keeping the field order of the reply type
    fn to_raw_value(&self) -> Result<Box<RawValue>, serde_json::Error>;
}

impl<T> ReplyValue for T
where
    T: Serialize + Send,
{
    fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn to_raw_value(&self) -> Result<Box<RawValue>, serde_json::Error> {
        serde_json::value::to_raw_value(self)
    }
}

type Invoker = dyn Fn(&RequestContext, Box<dyn Any>) -> Result<Box<dyn ReplyValue>, ServiceError>
    + Send
    + Sync;

/// An invocable method bound to its receiver
#[derive(Clone)]
pub struct MethodSpec {
    name: String,
    args_type: &'static str,
    reply_type: &'static str,
    new_args: fn() -> Box<dyn ArgsValue>,
    invoker: Arc<Invoker>,
}

impl MethodSpec {
    /// Bind `handler` to `receiver` under `name`
    pub fn new<S, A, R, E, F>(receiver: Arc<S>, name: impl Into<String>, handler: F) -> Self
    where
        S: Send + Sync + 'static,
        A: DeserializeOwned + Default + Send + 'static,
        R: Serialize + Default + Send + 'static,
        E: Into<ServiceError>,
        F: Fn(&S, &RequestContext, &A, &mut R) -> Result<(), E> + Send + Sync + 'static,
    {
        let name = name.into();
        let method_name = name.clone();
        let invoker = move |ctx: &RequestContext,
                            args: Box<dyn Any>|
              -> Result<Box<dyn ReplyValue>, ServiceError> {
            let args = args.downcast::<A>().map_err(|_| {
                ServiceError::msg(format!(
                    "rpc: arguments for {} are not {}",
                    method_name,
                    std::any::type_name::<A>()
                ))
            })?;
            let mut reply = R::default();
            if let Err(err) = handler(&*receiver, ctx, &*args, &mut reply) {
                return Err(err.into());
            }
            Ok(Box::new(reply))
        };

        Self {
            name,
            args_type: std::any::type_name::<A>(),
            reply_type: std::any::type_name::<R>(),
            new_args: new_args::<A>,
            invoker: Arc::new(invoker),
        }
    }

    /// Wire name of the method
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args_type(&self) -> &'static str {
        self.args_type
    }

    pub fn reply_type(&self) -> &'static str {
        self.reply_type
    }

    /// Allocate zero-valued arguments for one call
    pub fn new_args(&self) -> Box<dyn ArgsValue> {
        (self.new_args)()
    }

    /// Call the method with a fresh reply value
    ///
    /// Handler errors are returned unmodified.
    pub fn invoke(
        &self,
        ctx: &RequestContext,
        args: Box<dyn ArgsValue>,
    ) -> Result<Box<dyn ReplyValue>, ServiceError> {
        (self.invoker)(ctx, args.into_any())
    }
}

impl fmt::Debug for MethodSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodSpec")
            .field("name", &self.name)
            .field("args_type", &self.args_type)
            .field("reply_type", &self.reply_type)
            .finish()
    }
}

/// Collects the methods of one receiver
///
/// # Example
///
/// ```ignore
/// impl Service for Arith {
///     fn methods(self: Arc<Self>) -> Vec<MethodSpec> {
///         ServiceBuilder::new(self)
///             .method("Multiply", Arith::multiply)
///             .build()
///     }
/// }
/// ```
pub struct ServiceBuilder<S> {
    receiver: Arc<S>,
    methods: Vec<MethodSpec>,
}

impl<S> ServiceBuilder<S>
where
    S: Send + Sync + 'static,
{
    pub fn new(receiver: Arc<S>) -> Self {
        Self {
            receiver,
            methods: Vec::new(),
        }
    }

    /// Add a method; empty or dotted names are skipped
    pub fn method<A, R, E, F>(mut self, name: &str, handler: F) -> Self
    where
        A: DeserializeOwned + Default + Send + 'static,
        R: Serialize + Default + Send + 'static,
        E: Into<ServiceError>,
        F: Fn(&S, &RequestContext, &A, &mut R) -> Result<(), E> + Send + Sync + 'static,
    {
        if name.is_empty() || name.contains('.') {
            tracing::warn!(
                receiver = std::any::type_name::<S>(),
                method = name,
                "skipping method with invalid name"
            );
            return self;
        }
        self.methods
            .push(MethodSpec::new(Arc::clone(&self.receiver), name, handler));
        self
    }

    pub fn build(self) -> Vec<MethodSpec> {
        self.methods
    }
}

/// A receiver whose methods can be registered
pub trait Service: Send + Sync + Sized + 'static {
    /// Name used when none is given at registration
    fn service_name() -> &'static str {
        infer_service_name::<Self>()
    }

    /// The methods satisfying the dispatch contract
    fn methods(self: Arc<Self>) -> Vec<MethodSpec>;
}

/// Service name derived from a type: its last path segment without generics
pub fn infer_service_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = match full.find('<') {
        Some(idx) => &full[..idx],
        None => full,
    };
    match base.rfind("::") {
        Some(idx) => &base[idx + 2..],
        None => base,
    }
}

struct ServiceEntry {
    type_name: &'static str,
    methods: HashMap<String, MethodSpec>,
}

/// Registry of services addressable as `Service.Method`
///
/// Registration takes a write lock and lookups a read lock, so services may
/// be added while calls are being served. A resolved [`MethodSpec`] is an
/// owned handle; no lock is held while a method runs.
#[derive(Default)]
pub struct ServiceRegistry {
    services: RwLock<HashMap<String, ServiceEntry>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service under `name`, or under its inferred name if `name` is empty
    pub fn register<S: Service>(&self, receiver: S, name: &str) -> Result<(), RegistryError> {
        self.register_arc(Arc::new(receiver), name)
    }

    /// Register a receiver that is shared with other code
    pub fn register_arc<S: Service>(
        &self,
        receiver: Arc<S>,
        name: &str,
    ) -> Result<(), RegistryError> {
        let name = if name.is_empty() {
            S::service_name()
        } else {
            name
        };
        if name.is_empty() || name.contains('.') {
            return Err(RegistryError::InvalidServiceName(name.to_string()));
        }

        let type_name = std::any::type_name::<S>();
        let mut methods = HashMap::new();
        for spec in receiver.methods() {
            if let Some(previous) = methods.insert(spec.name().to_string(), spec) {
                tracing::warn!(
                    service = name,
                    method = previous.name(),
                    "method registered twice, keeping the last one"
                );
            }
        }
        if methods.is_empty() {
            return Err(RegistryError::NoEligibleMethods(type_name.to_string()));
        }

        let mut services = self.services.write();
        if services.contains_key(name) {
            return Err(RegistryError::DuplicateService(name.to_string()));
        }
        tracing::info!(
            service = name,
            receiver = type_name,
            methods = methods.len(),
            "registered service"
        );
        services.insert(name.to_string(), ServiceEntry { type_name, methods });
        Ok(())
    }

    /// Look up a `Service.Method` string
    pub fn resolve(&self, service_method: &str) -> Result<MethodSpec, RegistryError> {
        let (service, method) = split_service_method(service_method)?;
        let services = self.services.read();
        services
            .get(service)
            .and_then(|entry| entry.methods.get(method))
            .cloned()
            .ok_or_else(|| RegistryError::MethodNotFound(service_method.to_string()))
    }

    /// Whether `service_method` resolves
    pub fn has_method(&self, service_method: &str) -> bool {
        self.resolve(service_method).is_ok()
    }

    /// Registered service names, sorted
    pub fn service_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.services.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Method names of a service, sorted
    pub fn method_names(&self, service: &str) -> Option<Vec<String>> {
        let services = self.services.read();
        let entry = services.get(service)?;
        let mut names: Vec<String> = entry.methods.keys().cloned().collect();
        names.sort();
        Some(names)
    }

    /// Rust type registered under `service`
    pub fn receiver_type(&self, service: &str) -> Option<&'static str> {
        self.services.read().get(service).map(|entry| entry.type_name)
    }

    pub fn len(&self) -> usize {
        self.services.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.read().is_empty()
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("services", &self.service_names())
            .finish()
    }
}

/// Split on the first '.' into two non-empty parts
fn split_service_method(service_method: &str) -> Result<(&str, &str), RegistryError> {
    match service_method.split_once('.') {
        Some((service, method)) if !service.is_empty() && !method.is_empty() => {
            Ok((service, method))
        }
        _ => Err(RegistryError::MalformedMethodName(
            service_method.to_string(),
        )),
    }
}

#[cfg(test)]
#[path = "registry/registry_tests.rs"]
mod registry_tests;
