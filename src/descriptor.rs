//! Management Descriptors
//!
//! The immutable metadata a management client sees: class name, description,
//! attributes and operations. Built once by the builder, never mutated.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::types::{Impact, ValueType};

/// A named, typed property exposed for read and/or write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AttributeDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    pub description: String,
    pub readable: bool,
    pub writable: bool,
    /// The getter uses the `is` form
    pub boolean_style: bool,
}

impl AttributeDescriptor {
    /// Attributes are unique by (name, type)
    pub fn key(&self) -> (&str, &ValueType) {
        (&self.name, &self.value_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ParameterDescriptor {
    pub index: usize,
    /// Synthetic positional name: `param0`, `param1`, ...
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
}

impl ParameterDescriptor {
    pub fn positional(index: usize, value_type: ValueType) -> Self {
        Self {
            index,
            name: format!("param{}", index),
            value_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct OperationDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParameterDescriptor>,
    pub return_type: ValueType,
    pub impact: Impact,
    /// Numeric form of `impact`, for clients that expect the code
    pub impact_code: i32,
}

impl OperationDescriptor {
    pub fn signature(&self) -> Vec<ValueType> {
        self.parameters.iter().map(|p| p.value_type.clone()).collect()
    }

    /// Parameter list as a JSON Schema object, one property per positional name
    pub fn parameters_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.parameters {
            properties.insert(param.name.clone(), type_schema(&param.value_type));
        }
        let required: Vec<&str> = self.parameters.iter().map(|p| p.name.as_str()).collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

fn type_schema(value_type: &ValueType) -> Value {
    match value_type {
        ValueType::Void => json!({ "type": "null" }),
        ValueType::Bool => json!({ "type": "boolean" }),
        ValueType::I8 | ValueType::I16 | ValueType::I32 | ValueType::I64 => json!({ "type": "integer" }),
        ValueType::U8 | ValueType::U16 | ValueType::U32 | ValueType::U64 => {
            json!({ "type": "integer", "minimum": 0 })
        }
        ValueType::F32 | ValueType::F64 => json!({ "type": "number" }),
        ValueType::String => json!({ "type": "string" }),
        ValueType::Json => json!({}),
        ValueType::List(inner) => json!({ "type": "array", "items": type_schema(inner) }),
    }
}

/// Shape of one management endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ManagementDescriptor {
    pub class_name: String,
    pub description: String,
    pub attributes: Vec<AttributeDescriptor>,
    pub operations: Vec<OperationDescriptor>,
}

impl ManagementDescriptor {
    pub fn attribute(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn operations_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a OperationDescriptor> + 'a {
        self.operations.iter().filter(move |op| op.name == name)
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// JSON Schema of [`ManagementDescriptor`], for clients that validate what they receive
pub fn descriptor_schema() -> Value {
    let schema = schemars::schema_for!(ManagementDescriptor);
    serde_json::to_value(schema).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ManagementDescriptor {
        ManagementDescriptor {
            class_name: "demo::Pool".to_string(),
            description: "A pool".to_string(),
            attributes: vec![AttributeDescriptor {
                name: "active".to_string(),
                value_type: ValueType::Bool,
                description: String::new(),
                readable: true,
                writable: false,
                boolean_style: true,
            }],
            operations: vec![OperationDescriptor {
                name: "resize".to_string(),
                description: "Resize the pool".to_string(),
                parameters: vec![
                    ParameterDescriptor::positional(0, ValueType::U32),
                    ParameterDescriptor::positional(1, ValueType::List(Box::new(ValueType::String))),
                ],
                return_type: ValueType::Void,
                impact: Impact::Action,
                impact_code: Impact::Action.code(),
            }],
        }
    }

    #[test]
    fn test_descriptor_json_shape() {
        let json = sample().to_json();
        assert_eq!(json["class_name"], "demo::Pool");
        assert_eq!(json["attributes"][0]["type"], "bool");
        assert_eq!(json["attributes"][0]["boolean_style"], true);
        assert_eq!(json["operations"][0]["parameters"][1]["name"], "param1");
        assert_eq!(json["operations"][0]["impact"], "ACTION");
        assert_eq!(json["operations"][0]["impact_code"], 1);
    }

    #[test]
    fn test_parameters_schema() {
        let descriptor = sample();
        let schema = descriptor.operations[0].parameters_schema();
        assert_eq!(schema["properties"]["param0"]["type"], "integer");
        assert_eq!(schema["properties"]["param1"]["items"]["type"], "string");
        assert_eq!(schema["required"], json!(["param0", "param1"]));
    }

    #[test]
    fn test_lookup_helpers() {
        let descriptor = sample();
        assert!(descriptor.attribute("active").is_some());
        assert!(descriptor.attribute("missing").is_none());
        assert_eq!(descriptor.operations_named("resize").count(), 1);
        assert_eq!(descriptor.operations[0].signature().len(), 2);
    }

    #[test]
    fn test_schema_export() {
        let schema = descriptor_schema();
        assert!(schema["properties"].get("attributes").is_some());
    }
}
