//! Invocation Bridge
//!
//! Serves get/set/invoke requests for one live object by looking the member
//! up in the bean's dispatch table and calling the bound invoker directly.
//! The bridge holds no mutable state of its own; a failure in one call never
//! affects the next.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::builder::{MBeanBuilder, Manageable, ManagedBean};
use crate::config::OverloadPolicy;
use crate::descriptor::ManagementDescriptor;
use crate::error::{InvokerError, ManagementError, ManagementResult, MemberKind};
use crate::method::Invoker;
use crate::types::ValueType;

/// Object-safe view of a management endpoint, as seen by the registry and
/// by management clients
pub trait DynamicMBean: Send + Sync {
    fn describe(&self) -> &ManagementDescriptor;

    fn get_attribute(&self, name: &str) -> ManagementResult<Value>;

    fn set_attribute(&self, name: &str, value: Value) -> ManagementResult<()>;

    /// Invoke by name; overloads are resolved from the arguments
    fn invoke(&self, operation: &str, args: Vec<Value>) -> ManagementResult<Value>;

    /// Invoke the operation whose parameter types equal `signature`
    fn invoke_with_signature(
        &self,
        operation: &str,
        args: Vec<Value>,
        signature: &[ValueType],
    ) -> ManagementResult<Value>;

    /// Read several attributes; entries that fail are logged and left out
    fn get_attributes(&self, names: &[&str]) -> Vec<(String, Value)> {
        names
            .iter()
            .filter_map(|name| match self.get_attribute(name) {
                Ok(value) => Some((name.to_string(), value)),
                Err(e) => {
                    warn!(attribute = %name, error = %e, "Skipping attribute in bulk read");
                    None
                }
            })
            .collect()
    }

    /// Write several attributes; returns the entries that were applied
    fn set_attributes(&self, values: Vec<(String, Value)>) -> Vec<(String, Value)> {
        values
            .into_iter()
            .filter_map(|(name, value)| match self.set_attribute(&name, value.clone()) {
                Ok(()) => Some((name, value)),
                Err(e) => {
                    warn!(attribute = %name, error = %e, "Skipping attribute in bulk write");
                    None
                }
            })
            .collect()
    }
}

/// Pairs one shared object with one built bean
pub struct InvocationBridge<T> {
    object: Arc<T>,
    bean: ManagedBean<T>,
    overload_policy: OverloadPolicy,
}

impl<T: Send + Sync + 'static> InvocationBridge<T> {
    pub fn new(object: Arc<T>, bean: ManagedBean<T>) -> Self {
        Self {
            object,
            bean,
            overload_policy: OverloadPolicy::default(),
        }
    }

    pub fn with_overload_policy(mut self, policy: OverloadPolicy) -> Self {
        self.overload_policy = policy;
        self
    }

    pub fn object(&self) -> &Arc<T> {
        &self.object
    }

    pub fn bean(&self) -> &ManagedBean<T> {
        &self.bean
    }

    fn call(&self, member: &str, invoker: &Invoker<T>, args: Vec<Value>) -> ManagementResult<Value> {
        let object: &T = &self.object;
        match panic::catch_unwind(AssertUnwindSafe(|| invoker(object, args))) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(source)) => Err(ManagementError::invocation(member, source)),
            Err(payload) => Err(ManagementError::invocation(
                member,
                Box::new(InvokerError::Panicked(panic_message(&*payload))),
            )),
        }
    }

    fn select_overload(&self, operation: &str, candidates: &[usize], args: &[Value]) -> ManagementResult<usize> {
        if let [only] = candidates {
            return Ok(*only);
        }

        let operations = &self.bean.descriptor.operations;
        let matching: Vec<usize> = candidates
            .iter()
            .copied()
            .filter(|&index| {
                let params = &operations[index].parameters;
                params.len() == args.len()
                    && params.iter().zip(args).all(|(param, arg)| param.value_type.accepts(arg))
            })
            .collect();

        match matching.as_slice() {
            // Nothing fits; let the first declaration report the mismatch
            [] => Ok(candidates[0]),
            [only] => Ok(*only),
            [first, ..] => match self.overload_policy {
                OverloadPolicy::FirstDeclared => {
                    warn!(
                        operation,
                        candidates = matching.len(),
                        "Ambiguous overload, using first declared"
                    );
                    Ok(*first)
                }
                OverloadPolicy::Reject => Err(ManagementError::AmbiguousOperation {
                    name: operation.to_string(),
                    candidates: matching.len(),
                }),
            },
        }
    }
}

impl<T: Manageable> InvocationBridge<T> {
    /// Build the type's declared bean and wrap the object in one step
    pub fn create(object: Arc<T>) -> ManagementResult<Self> {
        let bean = MBeanBuilder::<T>::managed().build()?;
        Ok(Self::new(object, bean))
    }
}

impl<T: Send + Sync + 'static> DynamicMBean for InvocationBridge<T> {
    fn describe(&self) -> &ManagementDescriptor {
        &self.bean.descriptor
    }

    fn get_attribute(&self, name: &str) -> ManagementResult<Value> {
        let dispatch = &self.bean.dispatch;
        let indices = dispatch
            .attributes_by_name
            .get(name)
            .ok_or_else(|| ManagementError::not_found(MemberKind::Attribute, name))?;
        let getter = indices
            .iter()
            .find_map(|&index| dispatch.attributes[index].getter.as_ref())
            .ok_or_else(|| ManagementError::NotReadable(name.to_string()))?;

        debug!(attribute = %name, "Reading attribute");
        self.call(name, getter, Vec::new())
    }

    fn set_attribute(&self, name: &str, value: Value) -> ManagementResult<()> {
        let dispatch = &self.bean.dispatch;
        let attributes = &self.bean.descriptor.attributes;
        let indices = dispatch
            .attributes_by_name
            .get(name)
            .ok_or_else(|| ManagementError::not_found(MemberKind::Attribute, name))?;

        let writable: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&index| dispatch.attributes[index].setter.is_some())
            .collect();
        // Same name can exist with several types; prefer the one the value fits
        let index = writable
            .iter()
            .copied()
            .find(|&index| attributes[index].value_type.accepts(&value))
            .or_else(|| writable.first().copied())
            .ok_or_else(|| ManagementError::NotWritable(name.to_string()))?;

        match dispatch.attributes[index].setter.as_ref() {
            Some(setter) => {
                debug!(attribute = %name, "Writing attribute");
                self.call(name, setter, vec![value]).map(|_| ())
            }
            None => Err(ManagementError::NotWritable(name.to_string())),
        }
    }

    fn invoke(&self, operation: &str, args: Vec<Value>) -> ManagementResult<Value> {
        let candidates = self
            .bean
            .dispatch
            .operations_by_name
            .get(operation)
            .ok_or_else(|| ManagementError::not_found(MemberKind::Operation, operation))?;
        let index = self.select_overload(operation, candidates, &args)?;

        debug!(operation, arity = args.len(), "Invoking operation");
        self.call(operation, &self.bean.dispatch.operations[index], args)
    }

    fn invoke_with_signature(
        &self,
        operation: &str,
        args: Vec<Value>,
        signature: &[ValueType],
    ) -> ManagementResult<Value> {
        let operations = &self.bean.descriptor.operations;
        let index = self
            .bean
            .dispatch
            .operations_by_name
            .get(operation)
            .and_then(|candidates| {
                candidates.iter().copied().find(|&index| {
                    operations[index]
                        .parameters
                        .iter()
                        .map(|p| &p.value_type)
                        .eq(signature.iter())
                })
            })
            .ok_or_else(|| ManagementError::not_found(MemberKind::Operation, operation))?;

        debug!(operation, arity = args.len(), "Invoking operation by signature");
        self.call(operation, &self.bean.dispatch.operations[index], args)
    }
}

impl<T> fmt::Debug for InvocationBridge<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationBridge")
            .field("class_name", &self.bean.descriptor.class_name)
            .field("overload_policy", &self.overload_policy)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::method::{ManagedAttribute, ManagedOperation, Method};
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Journal {
        entries: Mutex<Vec<String>>,
    }

    impl Journal {
        fn get_size(&self) -> u64 {
            self.entries.lock().map(|e| e.len() as u64).unwrap_or(0)
        }
        fn append(&self, entry: String) -> u64 {
            let mut entries = self.entries.lock().unwrap();
            entries.push(entry);
            entries.len() as u64
        }
        fn append_many(&self, entry: String, times: u32) -> u64 {
            let mut entries = self.entries.lock().unwrap();
            for _ in 0..times {
                entries.push(entry.clone());
            }
            entries.len() as u64
        }
    }

    fn bridge(policy: OverloadPolicy) -> InvocationBridge<Journal> {
        let bean = MBeanBuilder::<Journal>::new("Journal")
            .attribute("getSize", Journal::get_size, ManagedAttribute::new())
            .operation("append", Journal::append, ManagedOperation::new())
            .operation("append", Journal::append_many, ManagedOperation::new())
            .operation("append", |j: &Journal, n: i64| j.append(n.to_string()), ManagedOperation::new())
            .operation("append", |j: &Journal, n: u64| j.append(format!("u{}", n)), ManagedOperation::new())
            .operation("explode", |_: &Journal| -> u64 { panic!("kaboom") }, ManagedOperation::new())
            .build()
            .unwrap();
        InvocationBridge::new(Arc::new(Journal::default()), bean).with_overload_policy(policy)
    }

    #[test]
    fn test_overload_selected_by_arguments() {
        let bridge = bridge(OverloadPolicy::FirstDeclared);
        assert_eq!(bridge.invoke("append", vec![json!("a")]).unwrap(), json!(1));
        assert_eq!(bridge.invoke("append", vec![json!("b"), json!(2)]).unwrap(), json!(3));
        assert_eq!(bridge.get_attribute("size").unwrap(), json!(3));
    }

    #[test]
    fn test_ambiguous_overload_policy() {
        // 5 fits both i64 and u64
        let first = bridge(OverloadPolicy::FirstDeclared);
        first.invoke("append", vec![json!(5)]).unwrap();
        assert_eq!(first.object().entries.lock().unwrap()[0], "5");

        let strict = bridge(OverloadPolicy::Reject);
        let err = strict.invoke("append", vec![json!(5)]).unwrap_err();
        assert!(matches!(err, ManagementError::AmbiguousOperation { candidates: 2, .. }));
        // -5 only fits i64
        assert!(strict.invoke("append", vec![json!(-5)]).is_ok());
    }

    #[test]
    fn test_invoke_with_signature() {
        let bridge = bridge(OverloadPolicy::Reject);
        bridge
            .invoke_with_signature("append", vec![json!(5)], &[ValueType::U64])
            .unwrap();
        assert_eq!(bridge.object().entries.lock().unwrap()[0], "u5");

        let err = bridge
            .invoke_with_signature("append", vec![json!(5)], &[ValueType::Bool])
            .unwrap_err();
        assert!(matches!(err, ManagementError::NotFound { kind: MemberKind::Operation, .. }));
    }

    #[test]
    fn test_panic_becomes_invocation_failure() {
        let bridge = bridge(OverloadPolicy::FirstDeclared);
        let err = bridge.invoke("explode", vec![]).unwrap_err();
        match err {
            ManagementError::InvocationFailure { member, source } => {
                assert_eq!(member, "explode");
                assert!(source.to_string().contains("kaboom"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(bridge.get_attribute("size").unwrap(), json!(0));
    }

    #[test]
    fn test_no_match_reports_through_first_declaration() {
        let bridge = bridge(OverloadPolicy::Reject);
        let err = bridge.invoke("append", vec![json!(true)]).unwrap_err();
        assert!(matches!(err, ManagementError::InvocationFailure { .. }));
    }

    #[test]
    fn test_bulk_access_skips_failures() {
        let bridge = bridge(OverloadPolicy::FirstDeclared);
        let values = bridge.get_attributes(&["size", "missing"]);
        assert_eq!(values, vec![("size".to_string(), json!(0))]);

        let applied = bridge.set_attributes(vec![("size".to_string(), json!(3))]);
        assert!(applied.is_empty());
    }

    impl Manageable for Journal {
        fn management(builder: MBeanBuilder<Self>) -> MBeanBuilder<Self> {
            builder
                .attribute("getSize", Journal::get_size, ManagedAttribute::new())
                .method(
                    Method::from_parts(
                        "weigh",
                        vec![ValueType::String],
                        ValueType::U64,
                        |journal: &Journal, args: Vec<Value>| -> Result<Value, BoxError> {
                            match args.as_slice() {
                                [Value::String(entry)] => Ok(json!(entry.len() as u64 + journal.get_size())),
                                _ => Err(format!("weigh takes one string, got {} argument(s)", args.len()).into()),
                            }
                        },
                    )
                    .with_operation(ManagedOperation::new().description("Size of an entry plus the journal")),
                )
        }
    }

    #[test]
    fn test_create_from_manageable() {
        let bridge = InvocationBridge::create(Arc::new(Journal::default())).unwrap();
        assert!(bridge.describe().class_name.ends_with("Journal"));
        assert_eq!(bridge.bean().descriptor().operations.len(), 1);
        assert_eq!(bridge.get_attribute("size").unwrap(), json!(0));
    }

    #[test]
    fn test_hand_written_invoker() {
        let bridge = InvocationBridge::create(Arc::new(Journal::default())).unwrap();
        bridge.object().append("x".to_string());

        let weigh = &bridge.bean().descriptor().operations[0];
        assert_eq!(weigh.name, "weigh");
        assert_eq!(weigh.signature(), vec![ValueType::String]);
        assert_eq!(weigh.return_type, ValueType::U64);

        assert_eq!(bridge.invoke("weigh", vec![json!("abc")]).unwrap(), json!(4));

        // The raw invoker does its own argument checking
        for args in [vec![], vec![json!(1)], vec![json!("a"), json!("b")]] {
            match bridge.invoke("weigh", args).unwrap_err() {
                ManagementError::InvocationFailure { member, source } => {
                    assert_eq!(member, "weigh");
                    assert!(source.to_string().contains("takes one string"));
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }
}
