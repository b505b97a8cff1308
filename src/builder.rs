//! Descriptor Builder
//!
//! Runs the attribute and operation resolvers over a type's declared methods
//! and assembles an immutable [`ManagementDescriptor`] together with the
//! name-keyed dispatch table the bridge uses at runtime. Construction is
//! all-or-nothing: the first validation failure aborts the build.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::descriptor::ManagementDescriptor;
use crate::error::{ManagementError, ManagementResult};
use crate::method::{Handler, Invoker, ManagedAttribute, ManagedOperation, Method};
use crate::resolver::{AttributeResolver, OperationResolver, ResolvedAttribute};
use crate::types::ValueType;

/// A type that declares its own management surface
pub trait Manageable: Send + Sync + Sized + 'static {
    /// Declare methods and markers on the given builder
    fn management(builder: MBeanBuilder<Self>) -> MBeanBuilder<Self>;
}

pub struct MBeanBuilder<T> {
    class_name: String,
    description: String,
    methods: Vec<Method<T>>,
    warn_on_omitted: bool,
}

impl<T: 'static> MBeanBuilder<T> {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            description: String::new(),
            methods: Vec::new(),
            warn_on_omitted: true,
        }
    }

    /// Builder named after the Rust type
    pub fn for_type() -> Self {
        Self::new(std::any::type_name::<T>())
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn method(mut self, method: Method<T>) -> Self {
        self.methods.push(method);
        self
    }

    /// Declare an accessor marked as a managed attribute
    pub fn attribute<Args, H>(self, name: impl Into<String>, handler: H, marker: ManagedAttribute) -> Self
    where
        H: Handler<T, Args>,
    {
        self.method(Method::new(name, handler).with_attribute(marker))
    }

    /// Declare a method marked as a managed operation
    pub fn operation<Args, H>(self, name: impl Into<String>, handler: H, marker: ManagedOperation) -> Self
    where
        H: Handler<T, Args>,
    {
        self.method(Method::new(name, handler).with_operation(marker))
    }

    /// Declare an unmarked method. It is never exposed, but it can serve as
    /// the counterpart of a marked getter or setter.
    pub fn plain<Args, H>(self, name: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T, Args>,
    {
        self.method(Method::new(name, handler))
    }

    /// Log omitted attributes at warn level (default) instead of debug
    pub fn warn_on_omitted(mut self, warn: bool) -> Self {
        self.warn_on_omitted = warn;
        self
    }

    pub fn build(self) -> ManagementResult<ManagedBean<T>> {
        if self.class_name.trim().is_empty() {
            return Err(ManagementError::InvalidArgument("No class name specified.".to_string()));
        }
        self.check_declarations()?;

        let attribute_resolver = AttributeResolver::new(&self.methods);
        let mut attributes: Vec<ResolvedAttribute<T>> = Vec::new();
        let mut operations = Vec::new();

        for method in &self.methods {
            match (&method.attribute, &method.operation) {
                (Some(_), Some(_)) => {
                    return Err(ManagementError::AnnotationConflict(format!(
                        "Method {} cannot have both ManagedAttribute and ManagedOperation annotations.",
                        method.name
                    )));
                }
                (Some(marker), None) => match attribute_resolver.resolve(method, marker, &attributes)? {
                    Some(resolved) => attributes.push(resolved),
                    None if self.warn_on_omitted => warn!(
                        class = %self.class_name,
                        method = %method.name,
                        "Attribute is neither readable nor writable and will not be exposed"
                    ),
                    None => debug!(
                        class = %self.class_name,
                        method = %method.name,
                        "Omitting attribute that is neither readable nor writable"
                    ),
                },
                (None, Some(marker)) => operations.push(OperationResolver::resolve(method, marker)),
                (None, None) => {}
            }
        }

        let mut dispatch = DispatchTable {
            attributes: Vec::with_capacity(attributes.len()),
            operations: Vec::with_capacity(operations.len()),
            attributes_by_name: HashMap::new(),
            operations_by_name: HashMap::new(),
        };
        let mut descriptor = ManagementDescriptor {
            class_name: self.class_name,
            description: self.description,
            attributes: Vec::with_capacity(attributes.len()),
            operations: Vec::with_capacity(operations.len()),
        };

        for (index, resolved) in attributes.into_iter().enumerate() {
            dispatch
                .attributes_by_name
                .entry(resolved.descriptor.name.clone())
                .or_default()
                .push(index);
            dispatch.attributes.push(BoundAttribute {
                getter: resolved.getter,
                setter: resolved.setter,
            });
            descriptor.attributes.push(resolved.descriptor);
        }

        for (index, resolved) in operations.into_iter().enumerate() {
            dispatch
                .operations_by_name
                .entry(resolved.descriptor.name.clone())
                .or_default()
                .push(index);
            dispatch.operations.push(resolved.invoker);
            descriptor.operations.push(resolved.descriptor);
        }

        debug!(
            class = %descriptor.class_name,
            attributes = descriptor.attributes.len(),
            operations = descriptor.operations.len(),
            "Built management descriptor"
        );

        Ok(ManagedBean {
            descriptor: Arc::new(descriptor),
            dispatch: Arc::new(dispatch),
        })
    }

    /// Names must be present and (name, parameter types) unique
    fn check_declarations(&self) -> ManagementResult<()> {
        let mut seen: HashSet<(&str, &[ValueType])> = HashSet::new();
        for method in &self.methods {
            if method.name.trim().is_empty() {
                return Err(ManagementError::InvalidArgument(format!(
                    "Method declared on {} without a name",
                    self.class_name
                )));
            }
            if !seen.insert((method.name.as_str(), method.parameter_types.as_slice())) {
                let params: Vec<String> = method.parameter_types.iter().map(ToString::to_string).collect();
                return Err(ManagementError::InvalidArgument(format!(
                    "Method {}({}) is declared more than once",
                    method.name,
                    params.join(", ")
                )));
            }
        }
        Ok(())
    }
}

impl<T: Manageable> MBeanBuilder<T> {
    /// Builder pre-filled with the type's own declarations
    pub fn managed() -> Self {
        T::management(Self::for_type())
    }
}

pub(crate) struct BoundAttribute<T> {
    pub getter: Option<Invoker<T>>,
    pub setter: Option<Invoker<T>>,
}

/// Name-keyed lookup into bound invokers, parallel to the descriptor lists
pub(crate) struct DispatchTable<T> {
    pub attributes: Vec<BoundAttribute<T>>,
    pub operations: Vec<Invoker<T>>,
    pub attributes_by_name: HashMap<String, Vec<usize>>,
    pub operations_by_name: HashMap<String, Vec<usize>>,
}

/// A built management surface: the descriptor plus its bound dispatch table.
/// Not tied to any object instance; wrap it in an `InvocationBridge` to serve calls.
pub struct ManagedBean<T> {
    pub(crate) descriptor: Arc<ManagementDescriptor>,
    pub(crate) dispatch: Arc<DispatchTable<T>>,
}

impl<T> ManagedBean<T> {
    pub fn descriptor(&self) -> &ManagementDescriptor {
        &self.descriptor
    }
}

impl<T> Clone for ManagedBean<T> {
    fn clone(&self) -> Self {
        Self {
            descriptor: Arc::clone(&self.descriptor),
            dispatch: Arc::clone(&self.dispatch),
        }
    }
}

impl<T> fmt::Debug for ManagedBean<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedBean")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}
