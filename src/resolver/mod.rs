//! Member Resolution
//!
//! Turns marked method declarations into descriptors plus their bound
//! invokers. Each resolver validates one member at a time and returns a typed
//! result; the builder decides what to do with it.

mod attribute;
mod operation;

pub(crate) use attribute::AttributeResolver;
pub(crate) use operation::OperationResolver;

use crate::descriptor::{AttributeDescriptor, OperationDescriptor};
use crate::method::Invoker;

/// An attribute descriptor together with the accessors it was resolved to
pub(crate) struct ResolvedAttribute<T> {
    pub descriptor: AttributeDescriptor,
    pub getter: Option<Invoker<T>>,
    pub setter: Option<Invoker<T>>,
}

pub(crate) struct ResolvedOperation<T> {
    pub descriptor: OperationDescriptor,
    pub invoker: Invoker<T>,
}

/// `fooBar` -> `FooBar`
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `FooBar` -> `fooBar`
pub fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
