//! Typed value binding.
//!
//! Coerces the string form of a field into a primitive destination. The set
//! of destination kinds is closed ([`ValueKind`]); each Rust type that can be
//! bound maps itself onto one kind through [`Bindable`].
//!
//! Binding is best effort: a missing field or a value that does not coerce
//! leaves the destination untouched. The returned [`BindOutcome`] tells
//! strict callers what happened.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut page: u32 = 1;
//! params.bind(&mut page, "page");
//! ```

use std::fmt;

use crate::params::ParameterSet;

/// Semantic type of a bind destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    Uint,
    Float,
    Bool,
    Str,
    Bytes,
}

impl ValueKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Int => "integer",
            ValueKind::Uint => "unsigned integer",
            ValueKind::Float => "float",
            ValueKind::Bool => "boolean",
            ValueKind::Str => "string",
            ValueKind::Bytes => "bytes",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A coerced value, tagged by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    Str(String),
    Bytes(Vec<u8>),
}

/// Coerce `raw` into a value of `kind`.
///
/// Numbers are trimmed before parsing. Booleans accept true/false, 1/0,
/// on/off and yes/no in any case. Strings and bytes always succeed.
pub fn coerce(kind: ValueKind, raw: &str) -> Result<BoundValue, String> {
    match kind {
        ValueKind::Int => raw
            .trim()
            .parse::<i64>()
            .map(BoundValue::Int)
            .map_err(|e| e.to_string()),
        ValueKind::Uint => raw
            .trim()
            .parse::<u64>()
            .map(BoundValue::Uint)
            .map_err(|e| e.to_string()),
        ValueKind::Float => raw
            .trim()
            .parse::<f64>()
            .map(BoundValue::Float)
            .map_err(|e| e.to_string()),
        ValueKind::Bool => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "on" | "yes" => Ok(BoundValue::Bool(true)),
            "false" | "0" | "off" | "no" => Ok(BoundValue::Bool(false)),
            _ => Err("expected true/false, 1/0, on/off or yes/no".to_string()),
        },
        ValueKind::Str => Ok(BoundValue::Str(raw.to_string())),
        ValueKind::Bytes => Ok(BoundValue::Bytes(raw.as_bytes().to_vec())),
    }
}

/// Types that can be bound from a request value.
pub trait Bindable: Sized {
    const KIND: ValueKind;

    /// Narrow a coerced value into `Self`.
    fn from_bound(value: BoundValue) -> Result<Self, String>;
}

macro_rules! bindable_int {
    ($variant:ident, $($t:ty),*) => {
        $(
            impl Bindable for $t {
                const KIND: ValueKind = ValueKind::$variant;

                fn from_bound(value: BoundValue) -> Result<Self, String> {
                    match value {
                        BoundValue::$variant(v) => <$t>::try_from(v)
                            .map_err(|_| format!("{} out of range for {}", v, stringify!($t))),
                        other => Err(format!("unexpected {:?}", other)),
                    }
                }
            }
        )*
    };
}

bindable_int!(Int, i8, i16, i32, i64, isize);
bindable_int!(Uint, u8, u16, u32, u64, usize);

impl Bindable for f64 {
    const KIND: ValueKind = ValueKind::Float;

    fn from_bound(value: BoundValue) -> Result<Self, String> {
        match value {
            BoundValue::Float(v) => Ok(v),
            other => Err(format!("unexpected {:?}", other)),
        }
    }
}

impl Bindable for f32 {
    const KIND: ValueKind = ValueKind::Float;

    fn from_bound(value: BoundValue) -> Result<Self, String> {
        match value {
            BoundValue::Float(v) if v.is_finite() && v.abs() > f32::MAX as f64 => {
                Err(format!("{} out of range for f32", v))
            }
            BoundValue::Float(v) => Ok(v as f32),
            other => Err(format!("unexpected {:?}", other)),
        }
    }
}

impl Bindable for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn from_bound(value: BoundValue) -> Result<Self, String> {
        match value {
            BoundValue::Bool(v) => Ok(v),
            other => Err(format!("unexpected {:?}", other)),
        }
    }
}

impl Bindable for String {
    const KIND: ValueKind = ValueKind::Str;

    fn from_bound(value: BoundValue) -> Result<Self, String> {
        match value {
            BoundValue::Str(v) => Ok(v),
            other => Err(format!("unexpected {:?}", other)),
        }
    }
}

impl Bindable for Vec<u8> {
    const KIND: ValueKind = ValueKind::Bytes;

    fn from_bound(value: BoundValue) -> Result<Self, String> {
        match value {
            BoundValue::Bytes(v) => Ok(v),
            other => Err(format!("unexpected {:?}", other)),
        }
    }
}

/// A value that exists but could not be converted.
#[derive(Debug, Clone, PartialEq)]
pub struct CoercionError {
    pub field: String,
    pub kind: ValueKind,
    pub value: String,
    pub reason: String,
}

impl fmt::Display for CoercionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot bind {}='{}' as {}: {}",
            self.field, self.value, self.kind, self.reason
        )
    }
}

impl std::error::Error for CoercionError {}

/// Result of a single bind.
#[derive(Debug, Clone, PartialEq)]
pub enum BindOutcome {
    /// Destination was updated.
    Bound,
    /// Field not present; destination untouched.
    Absent,
    /// Field present but not coercible; destination untouched.
    Failed(CoercionError),
}

impl BindOutcome {
    #[inline]
    pub fn is_bound(&self) -> bool {
        matches!(self, BindOutcome::Bound)
    }

    /// The coercion error, if any.
    pub fn error(&self) -> Option<&CoercionError> {
        match self {
            BindOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}

fn convert<T: Bindable>(field: &str, raw: &str) -> Result<T, CoercionError> {
    coerce(T::KIND, raw)
        .and_then(T::from_bound)
        .map_err(|reason| CoercionError {
            field: field.to_string(),
            kind: T::KIND,
            value: raw.to_string(),
            reason,
        })
}

impl ParameterSet {
    /// Bind the first value of `field` into `dest`.
    ///
    /// Repeated values past the first are ignored here; see
    /// [`bind_all`](Self::bind_all).
    pub fn bind<T: Bindable>(&self, dest: &mut T, field: &str) -> BindOutcome {
        let Some(raw) = self.values().get(field) else {
            return BindOutcome::Absent;
        };

        match convert::<T>(field, raw) {
            Ok(value) => {
                *dest = value;
                BindOutcome::Bound
            }
            Err(e) => {
                tracing::debug!(error = %e, "bind: coercion failed");
                BindOutcome::Failed(e)
            }
        }
    }

    /// Bind every value of a repeated field, appending to `dest`.
    ///
    /// Values that fail to coerce are skipped and returned.
    pub fn bind_all<T: Bindable>(&self, dest: &mut Vec<T>, field: &str) -> Vec<CoercionError> {
        let mut errors = Vec::new();
        for raw in self.values().get_all(field).unwrap_or_default() {
            match convert::<T>(field, raw) {
                Ok(value) => dest.push(value),
                Err(e) => errors.push(e),
            }
        }
        errors
    }
}
