//! Attribute resolution: getter/setter classification, naming-convention
//! counterpart lookup and duplicate detection.

use tracing::debug;

use super::{capitalize, decapitalize, ResolvedAttribute};
use crate::descriptor::AttributeDescriptor;
use crate::error::{ManagementError, ManagementResult};
use crate::method::{ManagedAttribute, Method};
use crate::types::ValueType;

pub(crate) struct AttributeResolver<'a, T> {
    /// Every declared method of the type, marked or not
    methods: &'a [Method<T>],
}

impl<'a, T> AttributeResolver<'a, T> {
    pub fn new(methods: &'a [Method<T>]) -> Self {
        Self { methods }
    }

    /// Resolve one marked accessor.
    ///
    /// Returns `Ok(None)` when the attribute ends up neither readable nor
    /// writable; that is not an error.
    pub fn resolve(
        &self,
        method: &Method<T>,
        marker: &ManagedAttribute,
        resolved: &[ResolvedAttribute<T>],
    ) -> ManagementResult<Option<ResolvedAttribute<T>>> {
        let is_getter = method.is_getter();
        let is_setter = method.is_setter();
        if !is_getter && !is_setter {
            return Err(ManagementError::AnnotationMismatch { method: method.name.clone() });
        }

        let name = attribute_name(&method.name);
        if name.is_empty() {
            return Err(ManagementError::AnnotationMismatch { method: method.name.clone() });
        }

        let value_type = if is_setter {
            method.parameter_types[0].clone()
        } else {
            method.return_type.clone()
        };

        let getter = if is_getter { Some(method) } else { self.find_getter(&name) };
        let setter = if is_setter { Some(method) } else { self.find_setter(&name, &value_type) };

        if resolved.iter().any(|a| a.descriptor.key() == (name.as_str(), &value_type)) {
            return Err(ManagementError::AnnotationConflict(format!(
                "Both getter and setter are annotated for attribute {}. Please remove one of the annotations.",
                name
            )));
        }

        let readable = marker.readable && getter.is_some();
        let writable = marker.writable && setter.is_some();
        let boolean_style = getter.is_some_and(|g| g.name.starts_with("is"));

        debug!(
            attribute = %name,
            value_type = %value_type,
            getter = getter.map(|g| g.name.as_str()).unwrap_or("-"),
            setter = setter.map(|s| s.name.as_str()).unwrap_or("-"),
            readable,
            writable,
            "Resolved attribute"
        );

        if !readable && !writable {
            return Ok(None);
        }

        Ok(Some(ResolvedAttribute {
            descriptor: AttributeDescriptor {
                name,
                value_type,
                description: marker.description.clone(),
                readable,
                writable,
                boolean_style,
            },
            getter: getter.filter(|_| readable).map(Method::invoker),
            setter: setter.filter(|_| writable).map(Method::invoker),
        }))
    }

    /// `get<Name>` first, then `is<Name>`
    fn find_getter(&self, name: &str) -> Option<&'a Method<T>> {
        let capitalized = capitalize(name);
        [format!("get{}", capitalized), format!("is{}", capitalized)]
            .into_iter()
            .find_map(|candidate| {
                self.methods
                    .iter()
                    .find(|m| m.name == candidate && m.parameter_types.is_empty() && !m.return_type.is_void())
            })
    }

    /// `set<Name>` taking exactly the attribute type
    fn find_setter(&self, name: &str, value_type: &ValueType) -> Option<&'a Method<T>> {
        let candidate = format!("set{}", capitalize(name));
        self.methods
            .iter()
            .find(|m| m.name == candidate && m.parameter_types.len() == 1 && &m.parameter_types[0] == value_type)
    }
}

/// Strip the accessor prefix and decapitalize what is left
pub(crate) fn attribute_name(method_name: &str) -> String {
    let stripped = match method_name.strip_prefix("is") {
        Some(rest) => rest,
        None => method_name.get(3..).unwrap_or_default(),
    };
    decapitalize(stripped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

    #[derive(Default)]
    struct Probe {
        active: AtomicBool,
        level: AtomicI32,
    }

    impl Probe {
        fn is_active(&self) -> bool {
            self.active.load(Ordering::SeqCst)
        }
        fn set_active(&self, active: bool) {
            self.active.store(active, Ordering::SeqCst)
        }
        fn get_level(&self) -> i32 {
            self.level.load(Ordering::SeqCst)
        }
        fn set_level(&self, level: i32) {
            self.level.store(level, Ordering::SeqCst)
        }
    }

    fn methods() -> Vec<Method<Probe>> {
        vec![
            Method::new("isActive", Probe::is_active),
            Method::new("setActive", Probe::set_active),
            Method::new("getLevel", Probe::get_level),
            Method::new("setLevel", Probe::set_level),
            Method::new("setLevelText", |_: &Probe, _: String| {}),
        ]
    }

    #[test]
    fn test_attribute_name_derivation() {
        assert_eq!(attribute_name("getLevel"), "level");
        assert_eq!(attribute_name("isActive"), "active");
        assert_eq!(attribute_name("setThreshold"), "threshold");
        assert_eq!(attribute_name("get"), "");
    }

    #[test]
    fn test_getter_finds_setter_by_convention() {
        let methods = methods();
        let resolver = AttributeResolver::new(&methods);
        let resolved = resolver
            .resolve(&methods[2], &ManagedAttribute::new().description("Level"), &[])
            .unwrap()
            .expect("attribute should be exposed");

        assert_eq!(resolved.descriptor.name, "level");
        assert_eq!(resolved.descriptor.value_type, ValueType::I32);
        assert!(resolved.descriptor.readable && resolved.descriptor.writable);
        assert!(!resolved.descriptor.boolean_style);
        assert!(resolved.getter.is_some() && resolved.setter.is_some());
    }

    #[test]
    fn test_setter_finds_is_getter() {
        let methods = methods();
        let resolver = AttributeResolver::new(&methods);
        let resolved = resolver
            .resolve(&methods[1], &ManagedAttribute::new(), &[])
            .unwrap()
            .unwrap();

        assert_eq!(resolved.descriptor.name, "active");
        assert!(resolved.descriptor.readable);
        assert!(resolved.descriptor.boolean_style);
    }

    #[test]
    fn test_setter_counterpart_must_match_type() {
        let methods = vec![
            Method::new("getMode", |_: &Probe| 1_i32),
            Method::new("setMode", |_: &Probe, _: String| {}),
        ];
        let resolver = AttributeResolver::new(&methods);
        let resolved = resolver
            .resolve(&methods[0], &ManagedAttribute::new(), &[])
            .unwrap()
            .unwrap();
        assert!(resolved.descriptor.readable);
        assert!(!resolved.descriptor.writable);
    }

    #[test]
    fn test_flags_can_disable_directions() {
        let methods = methods();
        let resolver = AttributeResolver::new(&methods);
        let resolved = resolver
            .resolve(&methods[2], &ManagedAttribute::new().writable(false), &[])
            .unwrap()
            .unwrap();
        assert!(resolved.descriptor.readable);
        assert!(!resolved.descriptor.writable);
        assert!(resolved.setter.is_none());

        let omitted = resolver
            .resolve(&methods[2], &ManagedAttribute::new().readable(false).writable(false), &[])
            .unwrap();
        assert!(omitted.is_none());
    }

    #[test]
    fn test_duplicate_key_conflicts() {
        let methods = methods();
        let resolver = AttributeResolver::new(&methods);
        let first = resolver
            .resolve(&methods[2], &ManagedAttribute::new(), &[])
            .unwrap()
            .unwrap();
        let err = resolver
            .resolve(&methods[3], &ManagedAttribute::new(), &[first])
            .err()
            .unwrap();
        assert!(matches!(err, ManagementError::AnnotationConflict(_)));
    }

    #[test]
    fn test_badly_shaped_accessor_is_a_mismatch() {
        let methods = vec![Method::new("getLevelFor", |_: &Probe, n: i32| n)];
        let resolver = AttributeResolver::new(&methods);
        let err = resolver
            .resolve(&methods[0], &ManagedAttribute::new(), &[])
            .err()
            .unwrap();
        assert!(matches!(err, ManagementError::AnnotationMismatch { ref method } if method == "getLevelFor"));
    }
}
