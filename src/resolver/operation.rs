use tracing::debug;

use super::ResolvedOperation;
use crate::descriptor::{OperationDescriptor, ParameterDescriptor};
use crate::method::{ManagedOperation, Method};

/// Builds one operation per marked method. Operations never look at each
/// other here; overload handling happens at dispatch time.
pub(crate) struct OperationResolver;

impl OperationResolver {
    pub fn resolve<T>(method: &Method<T>, marker: &ManagedOperation) -> ResolvedOperation<T> {
        let parameters = method
            .parameter_types
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, value_type)| ParameterDescriptor::positional(index, value_type))
            .collect();

        debug!(
            operation = %method.name,
            arity = method.parameter_types.len(),
            impact = ?marker.impact,
            "Resolved operation"
        );

        ResolvedOperation {
            descriptor: OperationDescriptor {
                name: method.name.clone(),
                description: marker.description.clone(),
                parameters,
                return_type: method.return_type.clone(),
                impact: marker.impact,
                impact_code: marker.impact.code(),
            },
            invoker: method.invoker(),
        }
    }
}
