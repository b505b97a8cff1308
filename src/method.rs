//! Method Declarations
//!
//! Integrators describe the methods of a type once, up front. Each declared
//! method carries its signature, a bound invoker and the optional
//! `ManagedAttribute` / `ManagedOperation` markers. Unmarked methods are never
//! exposed, but they still take part in getter/setter counterpart lookup.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{BoxError, InvokerError};
use crate::types::{Impact, ManagedReturn, ManagedValue, ValueType};

/// Type-erased call into the wrapped object
pub type Invoker<T> = Arc<dyn Fn(&T, Vec<Value>) -> Result<Value, BoxError> + Send + Sync>;

/// Marks a getter or setter as a managed attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedAttribute {
    pub description: String,
    pub readable: bool,
    pub writable: bool,
}

impl ManagedAttribute {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn readable(mut self, readable: bool) -> Self {
        self.readable = readable;
        self
    }

    pub fn writable(mut self, writable: bool) -> Self {
        self.writable = writable;
        self
    }
}

impl Default for ManagedAttribute {
    fn default() -> Self {
        Self {
            description: String::new(),
            readable: true,
            writable: true,
        }
    }
}

/// Marks a method as a managed operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagedOperation {
    pub description: String,
    pub impact: Impact,
}

impl ManagedOperation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn impact(mut self, impact: Impact) -> Self {
        self.impact = impact;
        self
    }
}

/// A callable whose signature can be turned into a declared method.
///
/// Implemented for `Fn(&T, A1, .., An) -> R` up to four arguments, where every
/// argument is a [`ManagedValue`] and the return is a [`ManagedReturn`].
pub trait Handler<T, Args>: Send + Sync + Sized + 'static {
    fn parameter_types() -> Vec<ValueType>;
    fn return_type() -> ValueType;
    fn into_invoker(self) -> Invoker<T>;
}

macro_rules! impl_handler {
    ($($arg:ident),*) => {
        impl<T, F, R, $($arg,)*> Handler<T, ($($arg,)*)> for F
        where
            T: 'static,
            F: Fn(&T, $($arg),*) -> R + Send + Sync + 'static,
            R: ManagedReturn,
            $($arg: ManagedValue,)*
        {
            fn parameter_types() -> Vec<ValueType> {
                vec![$(<$arg as ManagedValue>::value_type()),*]
            }

            fn return_type() -> ValueType {
                R::return_type()
            }

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn into_invoker(self) -> Invoker<T> {
                Arc::new(move |object: &T, args: Vec<Value>| {
                    let names: &[&str] = &[$(stringify!($arg)),*];
                    if args.len() != names.len() {
                        return Err(Box::new(InvokerError::ArgumentCount {
                            expected: names.len(),
                            actual: args.len(),
                        }) as BoxError);
                    }
                    let mut args = args.into_iter().enumerate();
                    $(
                        let $arg = match args.next() {
                            Some((index, value)) => <$arg as ManagedValue>::from_value(value)
                                .map_err(|source| InvokerError::ArgumentType { index, source })?,
                            None => unreachable!("argument count checked above"),
                        };
                    )*
                    (self)(object, $($arg),*).into_result()
                })
            }
        }
    };
}

impl_handler!();
impl_handler!(A1);
impl_handler!(A1, A2);
impl_handler!(A1, A2, A3);
impl_handler!(A1, A2, A3, A4);

/// One declared method of the managed type
pub struct Method<T> {
    pub(crate) name: String,
    pub(crate) parameter_types: Vec<ValueType>,
    pub(crate) return_type: ValueType,
    pub(crate) invoker: Invoker<T>,
    pub(crate) attribute: Option<ManagedAttribute>,
    pub(crate) operation: Option<ManagedOperation>,
}

impl<T: 'static> Method<T> {
    /// Declare a method, inferring its signature from the handler
    pub fn new<Args, H>(name: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T, Args>,
    {
        Self {
            name: name.into(),
            parameter_types: H::parameter_types(),
            return_type: H::return_type(),
            invoker: handler.into_invoker(),
            attribute: None,
            operation: None,
        }
    }

    /// Declare a method from an explicit signature and a raw invoker.
    /// The invoker is responsible for checking its own arguments.
    pub fn from_parts<F>(
        name: impl Into<String>,
        parameter_types: Vec<ValueType>,
        return_type: ValueType,
        invoker: F,
    ) -> Self
    where
        F: Fn(&T, Vec<Value>) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            parameter_types,
            return_type,
            invoker: Arc::new(invoker),
            attribute: None,
            operation: None,
        }
    }

    pub fn with_attribute(mut self, attribute: ManagedAttribute) -> Self {
        self.attribute = Some(attribute);
        self
    }

    pub fn with_operation(mut self, operation: ManagedOperation) -> Self {
        self.operation = Some(operation);
        self
    }
}

impl<T> Method<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameter_types(&self) -> &[ValueType] {
        &self.parameter_types
    }

    pub fn return_type(&self) -> &ValueType {
        &self.return_type
    }

    pub fn attribute(&self) -> Option<&ManagedAttribute> {
        self.attribute.as_ref()
    }

    pub fn operation(&self) -> Option<&ManagedOperation> {
        self.operation.as_ref()
    }

    /// `get*` / `is*`, no parameters, returns something
    pub fn is_getter(&self) -> bool {
        (self.name.starts_with("get") || self.name.starts_with("is"))
            && self.parameter_types.is_empty()
            && !self.return_type.is_void()
    }

    /// `set*`, exactly one parameter, returns nothing
    pub fn is_setter(&self) -> bool {
        self.name.starts_with("set") && self.parameter_types.len() == 1 && self.return_type.is_void()
    }

    pub(crate) fn invoker(&self) -> Invoker<T> {
        Arc::clone(&self.invoker)
    }
}

impl<T> Clone for Method<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            parameter_types: self.parameter_types.clone(),
            return_type: self.return_type.clone(),
            invoker: Arc::clone(&self.invoker),
            attribute: self.attribute.clone(),
            operation: self.operation.clone(),
        }
    }
}

impl<T> fmt::Debug for Method<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("parameter_types", &self.parameter_types)
            .field("return_type", &self.return_type)
            .field("attribute", &self.attribute)
            .field("operation", &self.operation)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicI64, Ordering};

    #[derive(Default)]
    struct Counter {
        value: AtomicI64,
    }

    impl Counter {
        fn get_value(&self) -> i64 {
            self.value.load(Ordering::SeqCst)
        }

        fn set_value(&self, value: i64) {
            self.value.store(value, Ordering::SeqCst);
        }

        fn add(&self, a: i64, b: i64) -> i64 {
            self.value.fetch_add(a + b, Ordering::SeqCst) + a + b
        }
    }

    #[test]
    fn test_signature_inference() {
        let getter = Method::new("getValue", Counter::get_value);
        assert_eq!(getter.parameter_types(), &[] as &[ValueType]);
        assert_eq!(getter.return_type(), &ValueType::I64);
        assert!(getter.is_getter());
        assert!(!getter.is_setter());

        let setter = Method::new("setValue", Counter::set_value);
        assert_eq!(setter.parameter_types(), &[ValueType::I64]);
        assert!(setter.return_type().is_void());
        assert!(setter.is_setter());

        let add = Method::new("add", Counter::add);
        assert_eq!(add.parameter_types(), &[ValueType::I64, ValueType::I64]);
        assert!(!add.is_getter() && !add.is_setter());
    }

    #[test]
    fn test_invoker_dispatches_onto_object() {
        let counter = Counter::default();
        let setter = Method::new("setValue", Counter::set_value);
        let add = Method::new("add", Counter::add);

        (setter.invoker())(&counter, vec![json!(10)]).unwrap();
        let result = (add.invoker())(&counter, vec![json!(1), json!(2)]).unwrap();
        assert_eq!(result, json!(13));
        assert_eq!(counter.get_value(), 13);
    }

    #[test]
    fn test_invoker_rejects_bad_arguments() {
        let counter = Counter::default();
        let add = Method::new("add", Counter::add);

        let err = (add.invoker())(&counter, vec![json!(1)]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InvokerError>(),
            Some(InvokerError::ArgumentCount { expected: 2, actual: 1 })
        ));

        let err = (add.invoker())(&counter, vec![json!(1), json!("2")]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InvokerError>(),
            Some(InvokerError::ArgumentType { index: 1, .. })
        ));
    }

    #[test]
    fn test_getter_shape_requires_prefix_and_return() {
        let void_getter = Method::<Counter>::new("getNothing", |_: &Counter| {});
        assert!(!void_getter.is_getter());

        let is_style = Method::<Counter>::new("isEmpty", |c: &Counter| c.get_value() == 0);
        assert!(is_style.is_getter());

        let setter_with_return = Method::<Counter>::new("setAndGet", |c: &Counter, v: i64| {
            c.set_value(v);
            v
        });
        assert!(!setter_with_return.is_setter());
    }

    #[test]
    fn test_markers_default() {
        let attribute = ManagedAttribute::new();
        assert!(attribute.readable && attribute.writable);
        assert_eq!(ManagedOperation::new().impact, Impact::Unknown);
    }
}
