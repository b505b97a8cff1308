//! MBean Server
//!
//! The name -> endpoint registry that management clients query. It is the
//! only authority on name uniqueness; every mutation is a single write-locked
//! step, and the lock is never held while a bean method runs.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use lazy_static::lazy_static;
use serde_json::Value;
use tracing::{debug, info};

use super::ObjectName;
use crate::bridge::DynamicMBean;
use crate::config::ManagementConfig;
use crate::descriptor::ManagementDescriptor;
use crate::error::{ManagementError, ManagementResult, MemberKind};

lazy_static! {
    /// Process-wide server, created on first use and never torn down
    static ref PLATFORM_SERVER: Arc<MBeanServer> = Arc::new(MBeanServer::with_config(&ManagementConfig::from_env()));
}

/// The shared platform server
pub fn platform_server() -> Arc<MBeanServer> {
    Arc::clone(&PLATFORM_SERVER)
}

pub struct MBeanServer {
    default_domain: String,
    beans: RwLock<HashMap<ObjectName, Arc<dyn DynamicMBean>>>,
}

impl MBeanServer {
    pub fn new(default_domain: impl Into<String>) -> Self {
        Self {
            default_domain: default_domain.into(),
            beans: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_config(config: &ManagementConfig) -> Self {
        Self::new(config.default_domain.clone())
    }

    pub fn default_domain(&self) -> &str {
        &self.default_domain
    }

    /// Names with an empty domain live in the default domain
    fn qualify(&self, name: &ObjectName) -> ObjectName {
        if name.domain().is_empty() {
            name.with_domain(self.default_domain.clone())
        } else {
            name.clone()
        }
    }

    pub fn register_mbean(&self, bean: Arc<dyn DynamicMBean>, name: &ObjectName) -> ManagementResult<ObjectName> {
        if name.is_pattern() {
            return Err(ManagementError::InvalidArgument(format!(
                "Cannot register under a pattern name: {}",
                name
            )));
        }
        let name = self.qualify(name);

        let mut beans = self.beans.write().unwrap_or_else(|e| e.into_inner());
        if beans.contains_key(&name) {
            return Err(ManagementError::AlreadyExists(name.to_string()));
        }
        info!(object_name = %name, class = %bean.describe().class_name, "Registered MBean");
        beans.insert(name.clone(), bean);
        Ok(name)
    }

    pub fn unregister_mbean(&self, name: &ObjectName) -> ManagementResult<()> {
        let name = self.qualify(name);
        let mut beans = self.beans.write().unwrap_or_else(|e| e.into_inner());
        match beans.remove(&name) {
            Some(_) => {
                info!(object_name = %name, "Unregistered MBean");
                Ok(())
            }
            None => Err(ManagementError::not_found(MemberKind::MBean, name.to_string())),
        }
    }

    pub fn is_registered(&self, name: &ObjectName) -> bool {
        let name = self.qualify(name);
        self.beans
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&name)
    }

    pub fn mbean_count(&self) -> usize {
        self.beans.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Registered names matching `pattern` (all names when `None`), sorted
    pub fn query_names(&self, pattern: Option<&ObjectName>) -> Vec<ObjectName> {
        let pattern = pattern.map(|p| self.qualify(p));
        let beans = self.beans.read().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<ObjectName> = beans
            .keys()
            .filter(|name| pattern.as_ref().map_or(true, |p| p.matches(name)))
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// The registered endpoint; the registry lock is released on return
    pub fn lookup(&self, name: &ObjectName) -> ManagementResult<Arc<dyn DynamicMBean>> {
        let name = self.qualify(name);
        self.beans
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&name)
            .cloned()
            .ok_or_else(|| ManagementError::not_found(MemberKind::MBean, name.to_string()))
    }

    pub fn describe(&self, name: &ObjectName) -> ManagementResult<ManagementDescriptor> {
        Ok(self.lookup(name)?.describe().clone())
    }

    pub fn get_attribute(&self, name: &ObjectName, attribute: &str) -> ManagementResult<Value> {
        let bean = self.lookup(name)?;
        debug!(object_name = %name, attribute, "Client attribute read");
        bean.get_attribute(attribute)
    }

    pub fn set_attribute(&self, name: &ObjectName, attribute: &str, value: Value) -> ManagementResult<()> {
        let bean = self.lookup(name)?;
        debug!(object_name = %name, attribute, "Client attribute write");
        bean.set_attribute(attribute, value)
    }

    pub fn invoke(&self, name: &ObjectName, operation: &str, args: Vec<Value>) -> ManagementResult<Value> {
        let bean = self.lookup(name)?;
        debug!(object_name = %name, operation, "Client invocation");
        bean.invoke(operation, args)
    }
}

impl Default for MBeanServer {
    fn default() -> Self {
        Self::with_config(&ManagementConfig::default())
    }
}
