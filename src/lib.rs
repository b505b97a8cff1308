//! Managed Objects
//!
//! Turns a plain Rust object into an introspectable management endpoint:
//! - Explicit method declarations with attribute/operation markers
//! - Getter/setter reconciliation by naming convention
//! - Conflict and shape validation at build time
//! - Name-keyed runtime dispatch of get/set/invoke
//! - A registry of endpoints addressed by object name

pub mod bridge;
pub mod builder;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod method;
pub mod registry;
mod resolver;
pub mod types;

// Re-exports for convenience
pub use bridge::{DynamicMBean, InvocationBridge};
pub use builder::{MBeanBuilder, Manageable, ManagedBean};
pub use config::{ConfigManager, ManagementConfig, OverloadPolicy};
pub use descriptor::{
    descriptor_schema, AttributeDescriptor, ManagementDescriptor, OperationDescriptor, ParameterDescriptor,
};
pub use error::{BoxError, ManagementError, ManagementResult, MemberKind};
pub use method::{ManagedAttribute, ManagedOperation, Method};
pub use registry::{create_mbean, platform_server, MBeanServer, Management, ObjectName};
pub use types::{Impact, ManagedReturn, ManagedValue, ValueType};
