//! Registration facade: register, unregister and query objects by name
//! against a registry backend.

use std::sync::{Arc, Weak};

use tracing::debug;

use super::{platform_server, MBeanServer, ObjectName};
use crate::bridge::{DynamicMBean, InvocationBridge};
use crate::builder::{MBeanBuilder, Manageable, ManagedBean};
use crate::config::ManagementConfig;
use crate::error::{ManagementError, ManagementResult};

/// Build an endpoint for a self-describing object without registering it
pub fn create_mbean<T: Manageable>(object: Arc<T>) -> ManagementResult<InvocationBridge<T>> {
    create_mbean_with(object, &ManagementConfig::default())
}

fn create_mbean_with<T: Manageable>(object: Arc<T>, config: &ManagementConfig) -> ManagementResult<InvocationBridge<T>> {
    let bean = MBeanBuilder::<T>::managed()
        .warn_on_omitted(config.warn_on_omitted_attributes)
        .build()?;
    Ok(InvocationBridge::new(object, bean).with_overload_policy(config.overload_policy))
}

/// Registers objects as MBeans. Holds the backend weakly; once the backend is
/// gone every call fails with `RegistryUnavailable`.
#[derive(Clone)]
pub struct Management {
    server: Weak<MBeanServer>,
    config: ManagementConfig,
}

impl Management {
    pub fn new(server: &Arc<MBeanServer>) -> Self {
        Self {
            server: Arc::downgrade(server),
            config: ManagementConfig::default(),
        }
    }

    /// Facade over the process-wide platform server
    pub fn platform() -> Self {
        Self::new(&platform_server()).with_config(ManagementConfig::from_env())
    }

    pub fn with_config(mut self, config: ManagementConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ManagementConfig {
        &self.config
    }

    fn check_name(name: &str) -> ManagementResult<()> {
        if name.trim().is_empty() {
            return Err(ManagementError::InvalidArgument("No name specified.".to_string()));
        }
        Ok(())
    }

    fn server(&self) -> ManagementResult<Arc<MBeanServer>> {
        self.server.upgrade().ok_or(ManagementError::RegistryUnavailable)
    }

    /// Build the object's declared surface and register it under `name`
    pub fn register<T: Manageable>(&self, object: Arc<T>, name: &str) -> ManagementResult<ObjectName> {
        Self::check_name(name)?;
        let server = self.server()?;
        let bridge = create_mbean_with(object, &self.config)?;
        Self::register_with(&server, Arc::new(bridge), name)
    }

    /// Register an object with a bean built elsewhere
    pub fn register_bean<T>(&self, object: Arc<T>, bean: ManagedBean<T>, name: &str) -> ManagementResult<ObjectName>
    where
        T: Send + Sync + 'static,
    {
        Self::check_name(name)?;
        let server = self.server()?;
        let bridge = InvocationBridge::new(object, bean).with_overload_policy(self.config.overload_policy);
        Self::register_with(&server, Arc::new(bridge), name)
    }

    fn register_with(server: &MBeanServer, bean: Arc<dyn DynamicMBean>, name: &str) -> ManagementResult<ObjectName> {
        let object_name = ObjectName::parse(name)?;
        server.register_mbean(bean, &object_name)
    }

    /// Remove `name`. Absence is success.
    pub fn unregister(&self, name: &str) -> ManagementResult<()> {
        Self::check_name(name)?;
        let server = self.server()?;
        let object_name = ObjectName::parse(name)?;
        match server.unregister_mbean(&object_name) {
            Ok(()) => Ok(()),
            Err(ManagementError::NotFound { .. }) => {
                debug!(object_name = %object_name, "Nothing registered, unregister is a no-op");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    pub fn is_registered(&self, name: &str) -> ManagementResult<bool> {
        Self::check_name(name)?;
        let server = self.server()?;
        let object_name = ObjectName::parse(name)?;
        Ok(server.is_registered(&object_name))
    }
}
