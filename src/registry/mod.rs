//! Registry Module
//!
//! Name-keyed registration of management endpoints and the facade that
//! integrators call to publish their objects.

mod facade;
mod object_name;
mod server;

pub use facade::{create_mbean, Management};
pub use object_name::ObjectName;
pub use server::{platform_server, MBeanServer};
