//! Handler method descriptors.
//!
//! A [`HandlerMethod`] binds a typed async callable to a receiver object and
//! describes its parameters so the invocable handler can resolve them. The
//! [`HandlerFn`] trait adapts closures and `async fn`s of up to eight
//! arguments.

use crate::error::{BoxError, HandlerFailure};
use heron_core::{HandlerValue, MethodId, MethodParameter, TypeKey};
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Future returned by a type-erased handler call.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<HandlerValue, HandlerFailure>> + Send>>;

/// Why resolved arguments do not fit a callable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentMismatch {
    /// Wrong number of arguments.
    Count {
        /// Parameters the callable declares.
        expected: usize,
        /// Arguments supplied.
        actual: usize,
    },
    /// An argument has the wrong type.
    Type {
        /// Parameter position.
        index: usize,
        /// Declared parameter type.
        expected: &'static str,
        /// Type of the supplied argument.
        actual: &'static str,
    },
}

impl fmt::Display for ArgumentMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count { expected, actual } => {
                write!(f, "wrong number of arguments: expected {expected}, got {actual}")
            }
            Self::Type {
                index,
                expected,
                actual,
            } => write!(
                f,
                "argument type mismatch at index {index}: expected {expected}, got {actual}"
            ),
        }
    }
}

/// A typed async callable usable as a handler method on receivers of type `R`.
///
/// Implemented for every `Fn(Arc<R>, A1, .., An) -> Fut` with `n <= 8`
/// where `Fut` resolves to `Result<Out, E>`. `Args` is the tuple of argument
/// types and only serves to tell the implementations apart.
///
/// Arguments are taken out of their [`HandlerValue`]s by value, which moves
/// them when the value is not shared elsewhere and clones them otherwise.
pub trait HandlerFn<R, Args>: Send + Sync + 'static {
    /// Returns the declared parameter types, in order.
    fn parameter_types(&self) -> Vec<TypeKey>;

    /// Returns the success type.
    fn return_type(&self) -> TypeKey;

    /// Calls the handler.
    ///
    /// Argument count and types are checked before anything is moved, so a
    /// mismatch hands the arguments back untouched.
    fn call(
        &self,
        receiver: Arc<R>,
        args: Vec<HandlerValue>,
    ) -> Result<HandlerFuture, (ArgumentMismatch, Vec<HandlerValue>)>;
}

fn check_arguments(expected: &[TypeKey], args: &[HandlerValue]) -> Result<(), ArgumentMismatch> {
    if expected.len() != args.len() {
        return Err(ArgumentMismatch::Count {
            expected: expected.len(),
            actual: args.len(),
        });
    }
    match expected
        .iter()
        .zip(args)
        .position(|(key, arg)| *key != arg.type_key())
    {
        Some(index) => Err(ArgumentMismatch::Type {
            index,
            expected: expected[index].name(),
            actual: args[index].type_name(),
        }),
        None => Ok(()),
    }
}

fn next_argument<T>(
    args: &mut std::vec::IntoIter<HandlerValue>,
    index: &mut usize,
) -> Result<T, ArgumentMismatch>
where
    T: Any + Send + Sync + Clone,
{
    let position = *index;
    *index += 1;
    let value = args.next().ok_or(ArgumentMismatch::Count {
        expected: position + 1,
        actual: position,
    })?;
    value.take::<T>().map_err(|value| ArgumentMismatch::Type {
        index: position,
        expected: std::any::type_name::<T>(),
        actual: value.type_name(),
    })
}

fn complete<Fut, Out, E>(future: Fut) -> HandlerFuture
where
    Fut: Future<Output = Result<Out, E>> + Send + 'static,
    Out: fmt::Debug + Send + Sync + 'static,
    E: Into<BoxError>,
{
    Box::pin(async move {
        future
            .await
            .map(HandlerValue::new)
            .map_err(|err| HandlerFailure::from_boxed(err.into()))
    })
}

macro_rules! impl_handler_fn {
    ($($ty:ident),*) => {
        #[allow(non_snake_case, unused_mut, unused_variables)]
        impl<F, Fut, R, Out, E, $($ty,)*> HandlerFn<R, ($($ty,)*)> for F
        where
            F: Fn(Arc<R>, $($ty,)*) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = Result<Out, E>> + Send + 'static,
            R: Send + Sync + 'static,
            Out: fmt::Debug + Send + Sync + 'static,
            E: Into<BoxError>,
            $($ty: Clone + Send + Sync + 'static,)*
        {
            fn parameter_types(&self) -> Vec<TypeKey> {
                vec![$(TypeKey::of::<$ty>()),*]
            }

            fn return_type(&self) -> TypeKey {
                TypeKey::of::<Out>()
            }

            fn call(
                &self,
                receiver: Arc<R>,
                args: Vec<HandlerValue>,
            ) -> Result<HandlerFuture, (ArgumentMismatch, Vec<HandlerValue>)> {
                let expected: &[TypeKey] = &[$(TypeKey::of::<$ty>()),*];
                if let Err(mismatch) = check_arguments(expected, &args) {
                    return Err((mismatch, args));
                }
                let mut args = args.into_iter();
                let mut index = 0;
                $(
                    let $ty = next_argument::<$ty>(&mut args, &mut index)
                        .map_err(|mismatch| (mismatch, Vec::new()))?;
                )*
                Ok(complete((self)(receiver, $($ty,)*)))
            }
        }
    };
}

impl_handler_fn!();
impl_handler_fn!(A1);
impl_handler_fn!(A1, A2);
impl_handler_fn!(A1, A2, A3);
impl_handler_fn!(A1, A2, A3, A4);
impl_handler_fn!(A1, A2, A3, A4, A5);
impl_handler_fn!(A1, A2, A3, A4, A5, A6);
impl_handler_fn!(A1, A2, A3, A4, A5, A6, A7);
impl_handler_fn!(A1, A2, A3, A4, A5, A6, A7, A8);

/// Outcome of an erased call that never reached the handler.
pub(crate) enum CallError {
    ReceiverMismatch(Vec<HandlerValue>),
    Arguments(ArgumentMismatch, Vec<HandlerValue>),
}

type ErasedCall = Arc<
    dyn Fn(Arc<dyn Any + Send + Sync>, Vec<HandlerValue>) -> Result<HandlerFuture, CallError>
        + Send
        + Sync,
>;

struct MethodDescriptor {
    id: MethodId,
    name: String,
    declaring_type: TypeKey,
    parameters: Vec<MethodParameter>,
    return_type: TypeKey,
    signature: Arc<str>,
    call: ErasedCall,
}

fn short_type_name(name: &str) -> &str {
    let base = name.split('<').next().unwrap_or(name);
    let start = base.rfind("::").map_or(0, |i| i + 2);
    &name[start..]
}

/// A handler callable bound to a receiver.
///
/// Cheap to clone and immutable; one instance serves concurrent
/// invocations.
///
/// # Example
///
/// ```rust
/// use heron_invoke::HandlerMethod;
/// use std::convert::Infallible;
/// use std::sync::Arc;
///
/// struct Greeter {
///     greeting: String,
/// }
///
/// impl Greeter {
///     async fn greet(self: Arc<Self>, name: String) -> Result<String, Infallible> {
///         Ok(format!("{}, {name}!", self.greeting))
///     }
/// }
///
/// let greeter = Arc::new(Greeter { greeting: "Hello".into() });
/// let method = HandlerMethod::new(greeter, "greet", Greeter::greet)
///     .with_parameter_names(["name"]);
///
/// assert_eq!(method.parameters().len(), 1);
/// assert!(method.parameters()[0].is::<String>());
/// assert_eq!(method.parameters()[0].name(), Some("name"));
/// assert!(method.signature().starts_with("Greeter::greet("));
/// ```
#[derive(Clone)]
pub struct HandlerMethod {
    receiver: Arc<dyn Any + Send + Sync>,
    receiver_type: &'static str,
    descriptor: Arc<MethodDescriptor>,
}

impl HandlerMethod {
    /// Binds `handler` to `receiver` under the method name `name`.
    pub fn new<R, Args, F>(receiver: Arc<R>, name: impl Into<String>, handler: F) -> Self
    where
        R: Send + Sync + 'static,
        Args: 'static,
        F: HandlerFn<R, Args>,
    {
        let name = name.into();
        let declaring_type = TypeKey::of::<R>();
        let parameter_types = handler.parameter_types();
        let return_type = handler.return_type();

        let params: Vec<_> = parameter_types.iter().map(TypeKey::name).collect();
        let signature: Arc<str> = format!(
            "{}::{}({}) -> {}",
            short_type_name(declaring_type.name()),
            name,
            params.join(", "),
            return_type.name()
        )
        .into();

        let id = MethodId::next();
        let parameters = parameter_types
            .into_iter()
            .enumerate()
            .map(|(index, key)| MethodParameter::new(id, Arc::clone(&signature), index, key))
            .collect();

        let call: ErasedCall = Arc::new(
            move |receiver: Arc<dyn Any + Send + Sync>, args: Vec<HandlerValue>| {
                let Ok(receiver) = receiver.downcast::<R>() else {
                    return Err(CallError::ReceiverMismatch(args));
                };
                handler
                    .call(receiver, args)
                    .map_err(|(mismatch, args)| CallError::Arguments(mismatch, args))
            },
        );

        Self {
            receiver_type: std::any::type_name::<R>(),
            receiver,
            descriptor: Arc::new(MethodDescriptor {
                id,
                name,
                declaring_type,
                parameters,
                return_type,
                signature,
                call,
            }),
        }
    }

    /// Returns the same method bound to another receiver.
    ///
    /// Nothing is checked here: a receiver that is not an instance of the
    /// declaring type fails when the method is invoked.
    #[must_use]
    pub fn with_receiver<T: Any + Send + Sync>(&self, receiver: Arc<T>) -> Self {
        Self {
            receiver,
            receiver_type: std::any::type_name::<T>(),
            descriptor: Arc::clone(&self.descriptor),
        }
    }

    /// Returns the method with parameter names assigned by position.
    ///
    /// Extra names are ignored; parameters without a name stay unnamed. The
    /// result is a new method with its own id.
    #[must_use]
    pub fn with_parameter_names<I, S>(&self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        let descriptor = &self.descriptor;
        let id = MethodId::next();
        let mut names = names.into_iter();
        let parameters = descriptor
            .parameters
            .iter()
            .map(|parameter| {
                let mut renamed = MethodParameter::new(
                    id,
                    Arc::clone(&descriptor.signature),
                    parameter.index(),
                    parameter.type_key(),
                );
                renamed.set_name(
                    names
                        .next()
                        .map(Into::into)
                        .or_else(|| parameter.name().map(Arc::from)),
                );
                renamed
            })
            .collect();

        Self {
            receiver: Arc::clone(&self.receiver),
            receiver_type: self.receiver_type,
            descriptor: Arc::new(MethodDescriptor {
                id,
                name: descriptor.name.clone(),
                declaring_type: descriptor.declaring_type,
                parameters,
                return_type: descriptor.return_type,
                signature: Arc::clone(&descriptor.signature),
                call: Arc::clone(&descriptor.call),
            }),
        }
    }

    /// Returns the unique method id.
    #[must_use]
    pub fn id(&self) -> MethodId {
        self.descriptor.id
    }

    /// Returns the method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Returns the receiver type the method was declared for.
    #[must_use]
    pub fn declaring_type(&self) -> TypeKey {
        self.descriptor.declaring_type
    }

    /// Returns the type name of the bound receiver.
    #[must_use]
    pub fn receiver_type(&self) -> &'static str {
        self.receiver_type
    }

    /// Returns the bound receiver.
    #[must_use]
    pub fn receiver(&self) -> &Arc<dyn Any + Send + Sync> {
        &self.receiver
    }

    /// Returns `true` if the bound receiver is an instance of the declaring type.
    #[must_use]
    pub fn is_receiver_compatible(&self) -> bool {
        Any::type_id(&*self.receiver) == self.descriptor.declaring_type.id()
    }

    /// Returns the parameter descriptors, in declaration order.
    #[must_use]
    pub fn parameters(&self) -> &[MethodParameter] {
        &self.descriptor.parameters
    }

    /// Returns the success type of the handler.
    #[must_use]
    pub fn return_type(&self) -> TypeKey {
        self.descriptor.return_type
    }

    /// Returns a readable signature, e.g. `Users::show(u64) -> User`.
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.descriptor.signature
    }

    pub(crate) fn call(&self, args: Vec<HandlerValue>) -> Result<HandlerFuture, CallError> {
        (self.descriptor.call)(Arc::clone(&self.receiver), args)
    }
}

impl fmt::Debug for HandlerMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerMethod")
            .field("id", &self.descriptor.id)
            .field("receiver", &self.receiver_type)
            .field("signature", &self.descriptor.signature)
            .finish()
    }
}

impl fmt::Display for HandlerMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descriptor.signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[derive(Debug)]
    struct Calculator {
        offset: i64,
    }

    impl Calculator {
        async fn add(self: Arc<Self>, a: i64, b: i64) -> Result<i64, Infallible> {
            Ok(a + b + self.offset)
        }
    }

    fn calculator() -> HandlerMethod {
        HandlerMethod::new(Arc::new(Calculator { offset: 1 }), "add", Calculator::add)
    }

    #[test]
    fn test_parameters_from_signature() {
        let method = calculator();
        assert_eq!(method.name(), "add");
        assert_eq!(method.parameters().len(), 2);
        assert!(method.parameters().iter().all(|p| p.is::<i64>()));
        assert!(method.parameters().iter().all(|p| p.method_id() == method.id()));
        assert_eq!(method.parameters()[1].index(), 1);
        assert!(method.return_type().is::<i64>());
        assert_eq!(method.signature(), "Calculator::add(i64, i64) -> i64");
        assert!(method.declaring_type().is::<Calculator>());
        assert!(method.is_receiver_compatible());
    }

    #[test]
    fn test_zero_arity_handler() {
        let method = HandlerMethod::new(Arc::new(()), "ping", |_: Arc<()>| async {
            Ok::<_, Infallible>("pong")
        });
        assert!(method.parameters().is_empty());
        assert_eq!(method.signature(), "()::ping() -> &str");
    }

    #[test]
    fn test_eight_arguments() {
        let method = HandlerMethod::new(
            Arc::new(()),
            "sum",
            |_: Arc<()>, a: u8, b: u8, c: u8, d: u8, e: u8, f: u8, g: u8, h: u8| async move {
                Ok::<_, Infallible>(u32::from(a) + u32::from(b) + u32::from(c) + u32::from(d)
                    + u32::from(e) + u32::from(f) + u32::from(g) + u32::from(h))
            },
        );
        assert_eq!(method.parameters().len(), 8);
    }

    #[tokio::test]
    async fn test_call_with_matching_arguments() {
        let method = calculator();
        let future = method
            .call(vec![HandlerValue::new(2_i64), HandlerValue::new(3_i64)])
            .ok()
            .unwrap();
        let value = future.await.unwrap();
        assert_eq!(value.downcast_ref::<i64>(), Some(&6));
    }

    #[test]
    fn test_call_with_wrong_arguments_returns_them() {
        let method = calculator();

        match method.call(vec![HandlerValue::new(2_i64)]) {
            Err(CallError::Arguments(ArgumentMismatch::Count { expected, actual }, args)) => {
                assert_eq!((expected, actual), (2, 1));
                assert_eq!(args.len(), 1);
            }
            _ => panic!("expected an argument count mismatch"),
        }

        match method.call(vec![HandlerValue::new(2_i64), HandlerValue::new("3".to_string())]) {
            Err(CallError::Arguments(ArgumentMismatch::Type { index, .. }, args)) => {
                assert_eq!(index, 1);
                assert_eq!(args.len(), 2);
            }
            _ => panic!("expected an argument type mismatch"),
        }
    }

    #[test]
    fn test_with_receiver_of_other_type() {
        #[derive(Debug)]
        struct Proxy;

        let method = calculator().with_receiver(Arc::new(Proxy));
        assert!(!method.is_receiver_compatible());
        assert!(method.receiver_type().ends_with("Proxy"));
        assert!(matches!(
            method.call(vec![HandlerValue::new(1_i64), HandlerValue::new(1_i64)]),
            Err(CallError::ReceiverMismatch(args)) if args.len() == 2
        ));
    }

    #[test]
    fn test_parameter_names() {
        let method = calculator();
        let named = method.with_parameter_names(["a"]);

        assert_ne!(named.id(), method.id());
        assert_eq!(named.parameters()[0].name(), Some("a"));
        assert_eq!(named.parameters()[1].name(), None);
        assert!(named.parameters().iter().all(|p| p.method_id() == named.id()));

        let renamed = named.with_parameter_names(Vec::<String>::new());
        assert_eq!(renamed.parameters()[0].name(), Some("a"));
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("app::users::Users"), "Users");
        assert_eq!(short_type_name("Wrapper<app::Inner>"), "Wrapper<app::Inner>");
        assert_eq!(short_type_name("()"), "()");
    }
}
