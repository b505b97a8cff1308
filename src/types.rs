//! Value Model
//!
//! The semantic type vocabulary shared by attribute and operation descriptors,
//! and the strict conversions between Rust values and dynamic JSON values.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BoxError, TypeMismatch};

/// Semantic type of an attribute, parameter or return value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Void,
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    String,
    /// Any JSON document
    Json,
    List(Box<ValueType>),
}

impl ValueType {
    /// Strict compatibility check. Never converts: `"5"` is not an `i32` and
    /// `1` is not a `bool`.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ValueType::Void => value.is_null(),
            ValueType::Bool => value.is_boolean(),
            ValueType::I8 => value.as_i64().is_some_and(|n| i8::try_from(n).is_ok()),
            ValueType::I16 => value.as_i64().is_some_and(|n| i16::try_from(n).is_ok()),
            ValueType::I32 => value.as_i64().is_some_and(|n| i32::try_from(n).is_ok()),
            ValueType::I64 => value.as_i64().is_some(),
            ValueType::U8 => value.as_u64().is_some_and(|n| u8::try_from(n).is_ok()),
            ValueType::U16 => value.as_u64().is_some_and(|n| u16::try_from(n).is_ok()),
            ValueType::U32 => value.as_u64().is_some_and(|n| u32::try_from(n).is_ok()),
            ValueType::U64 => value.as_u64().is_some(),
            ValueType::F32 => value.as_f64().is_some_and(fits_f32),
            ValueType::F64 => value.is_number(),
            ValueType::String => value.is_string(),
            ValueType::Json => true,
            ValueType::List(inner) => value
                .as_array()
                .is_some_and(|items| items.iter().all(|item| inner.accepts(item))),
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, ValueType::Void)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Void => write!(f, "void"),
            ValueType::Bool => write!(f, "bool"),
            ValueType::I8 => write!(f, "i8"),
            ValueType::I16 => write!(f, "i16"),
            ValueType::I32 => write!(f, "i32"),
            ValueType::I64 => write!(f, "i64"),
            ValueType::U8 => write!(f, "u8"),
            ValueType::U16 => write!(f, "u16"),
            ValueType::U32 => write!(f, "u32"),
            ValueType::U64 => write!(f, "u64"),
            ValueType::F32 => write!(f, "f32"),
            ValueType::F64 => write!(f, "f64"),
            ValueType::String => write!(f, "String"),
            ValueType::Json => write!(f, "json"),
            ValueType::List(inner) => write!(f, "Vec<{}>", inner),
        }
    }
}

/// Advisory side-effect classification of an operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Impact {
    /// Read-only, returns information
    Info,
    /// Changes state, returns nothing useful
    Action,
    /// Changes state and returns information
    ActionInfo,
    #[default]
    Unknown,
}

impl Impact {
    /// Numeric impact code as published to management clients
    pub fn code(&self) -> i32 {
        match self {
            Impact::Info => 0,
            Impact::Action => 1,
            Impact::ActionInfo => 2,
            Impact::Unknown => 3,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Impact::Info),
            1 => Some(Impact::Action),
            2 => Some(Impact::ActionInfo),
            3 => Some(Impact::Unknown),
            _ => None,
        }
    }
}

/// A Rust type that can flow through attributes and operation parameters
pub trait ManagedValue: Sized + 'static {
    fn value_type() -> ValueType;
    fn into_value(self) -> Value;
    fn from_value(value: Value) -> Result<Self, TypeMismatch>;
}

/// The return side of a bound method. Plain values are returned as-is;
/// a `Result` models a method that can fail.
pub trait ManagedReturn {
    fn return_type() -> ValueType;
    fn into_result(self) -> Result<Value, BoxError>;
}

macro_rules! signed_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl ManagedValue for $ty {
                fn value_type() -> ValueType {
                    ValueType::$variant
                }

                fn into_value(self) -> Value {
                    Value::from(self)
                }

                fn from_value(value: Value) -> Result<Self, TypeMismatch> {
                    value
                        .as_i64()
                        .and_then(|n| <$ty>::try_from(n).ok())
                        .ok_or_else(|| TypeMismatch::new(ValueType::$variant, &value))
                }
            }
        )*
    };
}

macro_rules! unsigned_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl ManagedValue for $ty {
                fn value_type() -> ValueType {
                    ValueType::$variant
                }

                fn into_value(self) -> Value {
                    Value::from(self)
                }

                fn from_value(value: Value) -> Result<Self, TypeMismatch> {
                    value
                        .as_u64()
                        .and_then(|n| <$ty>::try_from(n).ok())
                        .ok_or_else(|| TypeMismatch::new(ValueType::$variant, &value))
                }
            }
        )*
    };
}

signed_value!(i8 => I8, i16 => I16, i32 => I32, i64 => I64, isize => I64);
unsigned_value!(u8 => U8, u16 => U16, u32 => U32, u64 => U64, usize => U64);

impl ManagedValue for f64 {
    fn value_type() -> ValueType {
        ValueType::F64
    }

    fn into_value(self) -> Value {
        Value::from(self)
    }

    fn from_value(value: Value) -> Result<Self, TypeMismatch> {
        value.as_f64().ok_or_else(|| TypeMismatch::new(ValueType::F64, &value))
    }
}

impl ManagedValue for f32 {
    fn value_type() -> ValueType {
        ValueType::F32
    }

    fn into_value(self) -> Value {
        Value::from(self)
    }

    fn from_value(value: Value) -> Result<Self, TypeMismatch> {
        value
            .as_f64()
            .filter(|&n| fits_f32(n))
            .map(|n| n as f32)
            .ok_or_else(|| TypeMismatch::new(ValueType::F32, &value))
    }
}

/// Narrowing must not turn a finite value into an infinity
fn fits_f32(n: f64) -> bool {
    (n as f32).is_finite() || !n.is_finite()
}

impl ManagedValue for bool {
    fn value_type() -> ValueType {
        ValueType::Bool
    }

    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: Value) -> Result<Self, TypeMismatch> {
        value.as_bool().ok_or_else(|| TypeMismatch::new(ValueType::Bool, &value))
    }
}

impl ManagedValue for String {
    fn value_type() -> ValueType {
        ValueType::String
    }

    fn into_value(self) -> Value {
        Value::String(self)
    }

    fn from_value(value: Value) -> Result<Self, TypeMismatch> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(TypeMismatch::new(ValueType::String, &other)),
        }
    }
}

impl ManagedValue for () {
    fn value_type() -> ValueType {
        ValueType::Void
    }

    fn into_value(self) -> Value {
        Value::Null
    }

    fn from_value(value: Value) -> Result<Self, TypeMismatch> {
        match value {
            Value::Null => Ok(()),
            other => Err(TypeMismatch::new(ValueType::Void, &other)),
        }
    }
}

impl ManagedValue for Value {
    fn value_type() -> ValueType {
        ValueType::Json
    }

    fn into_value(self) -> Value {
        self
    }

    fn from_value(value: Value) -> Result<Self, TypeMismatch> {
        Ok(value)
    }
}

impl<T: ManagedValue> ManagedValue for Vec<T> {
    fn value_type() -> ValueType {
        ValueType::List(Box::new(T::value_type()))
    }

    fn into_value(self) -> Value {
        Value::Array(self.into_iter().map(ManagedValue::into_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, TypeMismatch> {
        match value {
            Value::Array(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(TypeMismatch::new(Self::value_type(), &other)),
        }
    }
}

macro_rules! plain_return {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ManagedReturn for $ty {
                fn return_type() -> ValueType {
                    <$ty as ManagedValue>::value_type()
                }

                fn into_result(self) -> Result<Value, BoxError> {
                    Ok(self.into_value())
                }
            }
        )*
    };
}

plain_return!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, bool, String, (), Value);

impl<T: ManagedValue> ManagedReturn for Vec<T> {
    fn return_type() -> ValueType {
        <Vec<T> as ManagedValue>::value_type()
    }

    fn into_result(self) -> Result<Value, BoxError> {
        Ok(self.into_value())
    }
}

impl<V, E> ManagedReturn for Result<V, E>
where
    V: ManagedValue,
    E: Into<BoxError>,
{
    fn return_type() -> ValueType {
        V::value_type()
    }

    fn into_result(self) -> Result<Value, BoxError> {
        self.map(ManagedValue::into_value).map_err(Into::into)
    }
}
