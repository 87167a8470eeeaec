//! Typed values to and from the single string a preference entry holds.
//!
//! | Type | Stored form |
//! |---|---|
//! | bool | `true` / `false` |
//! | int, long | decimal |
//! | float, double | shortest decimal that parses back to the same value |
//! | string | unchanged |
//! | array | element encodings joined with [`SEPARATOR`], empty array is `""` |
//! | map, set, object | output of the [`StructuredCodec`] |
//!
//! An element that itself contains [`SEPARATOR`] does not survive a round
//! trip, and neither does an array holding only empty strings.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;
use strum::{Display, EnumString, IntoStaticStr};

use crate::error::{PrefsError, PrefsResult};

pub mod codec;
pub mod types;

pub use codec::{CodecError, JsonCodec, StructuredCodec};
pub use types::{Json, Marshal, ValueError};

/// Joins array elements in the stored form.
pub const SEPARATOR: &str = "dfg,hsdfk__jg34n95t";

/// Primitive kinds with a direct string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum ScalarKind {
    /// `bool`
    Bool,
    /// `i32`
    Int,
    /// `i64`
    Long,
    /// `f32`
    Float,
    /// `f64`
    Double,
    /// UTF-8 text.
    #[strum(serialize = "string")]
    Text,
}

/// Runtime description of a preference value's type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDescriptor {
    /// A primitive.
    Scalar(ScalarKind),
    /// Array of the inner type, stored with [`SEPARATOR`].
    Array(Box<TypeDescriptor>),
    /// Map, set or object stored through the structured codec.
    Structured {
        /// Name of the Rust type, for error messages.
        type_name: String,
    },
    /// A type with no stored form.
    Unsupported {
        /// Name of the rejected type.
        type_name: String,
    },
}

impl TypeDescriptor {
    /// Parses a type name: `bool`, `int`, `long`, `float`, `double`, `string`,
    /// `json`, or any of these followed by `[]`. Anything else is
    /// [`TypeDescriptor::Unsupported`].
    #[must_use]
    pub fn parse(name: &str) -> Self {
        let name = name.trim();
        if let Some(inner) = name.strip_suffix("[]") {
            return Self::Array(Box::new(Self::parse(inner)));
        }
        if name == "json" {
            return Self::Structured {
                type_name: name.to_string(),
            };
        }
        ScalarKind::from_str(name).map_or_else(
            |_| Self::Unsupported {
                type_name: name.to_string(),
            },
            Self::Scalar,
        )
    }

    /// Descriptor of an array of `inner`.
    #[must_use]
    pub fn array_of(inner: Self) -> Self {
        Self::Array(Box::new(inner))
    }

    /// Fails with [`PrefsError::UnsupportedType`] if this descriptor, or any
    /// nested element descriptor, is unsupported. Arrays of arrays are
    /// unsupported: both levels would share [`SEPARATOR`].
    ///
    /// # Errors
    ///
    /// See above.
    pub fn ensure_supported(&self, key: &str) -> PrefsResult<()> {
        match self {
            Self::Scalar(_) | Self::Structured { .. } => Ok(()),
            Self::Array(inner) if matches!(**inner, Self::Array(_)) => {
                Err(PrefsError::UnsupportedType {
                    type_name: self.to_string(),
                    key: key.to_string(),
                })
            }
            Self::Array(inner) => inner.ensure_supported(key),
            Self::Unsupported { type_name } => Err(PrefsError::UnsupportedType {
                type_name: type_name.clone(),
                key: key.to_string(),
            }),
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(kind) => write!(f, "{kind}"),
            Self::Array(inner) => write!(f, "{inner}[]"),
            Self::Structured { type_name } | Self::Unsupported { type_name } => {
                f.write_str(type_name)
            }
        }
    }
}

impl From<&str> for TypeDescriptor {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

/// A decoded preference value.
#[derive(Debug, Clone, PartialEq)]
pub enum PrefValue {
    /// `bool`
    Bool(bool),
    /// `i32`
    Int(i32),
    /// `i64`
    Long(i64),
    /// `f32`
    Float(f32),
    /// `f64`
    Double(f64),
    /// UTF-8 text.
    Text(String),
    /// Array elements.
    Array(Vec<PrefValue>),
    /// Map, set or object as a JSON tree.
    Structured(Value),
}

impl PrefValue {
    /// Short name of the variant, for error messages.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::Text(_) => "string",
            Self::Array(_) => "array",
            Self::Structured(_) => "json",
        }
    }
}

impl fmt::Display for PrefValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}"),
            Self::Float(v) => f.write_str(&format_float(*v)),
            Self::Double(v) => f.write_str(&format_float(*v)),
            Self::Text(v) => f.write_str(v),
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Structured(v) => write!(f, "{v}"),
        }
    }
}

/// Infinities use the spelling other runtimes parse; everything else is
/// Rust's shortest round-trip form.
fn format_float<F>(v: F) -> String
where
    F: fmt::Display + Into<f64> + Copy,
{
    let wide: f64 = v.into();
    if !wide.is_infinite() {
        v.to_string()
    } else if wide.is_sign_positive() {
        "Infinity".to_string()
    } else {
        "-Infinity".to_string()
    }
}

/// Converts [`PrefValue`]s to and from stored strings.
#[derive(Clone)]
pub struct Marshaller {
    codec: Arc<dyn StructuredCodec>,
}

impl Marshaller {
    /// Creates a marshaller using `codec` for structured values.
    #[must_use]
    pub fn new(codec: Arc<dyn StructuredCodec>) -> Self {
        Self { codec }
    }

    /// Encodes `value` for storage under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`PrefsError::UnsupportedType`] for an array holding arrays,
    /// and [`PrefsError::Codec`] if the structured codec fails.
    pub fn encode(&self, value: &PrefValue, key: &str) -> PrefsResult<String> {
        Ok(match value {
            PrefValue::Bool(v) => v.to_string(),
            PrefValue::Int(v) => v.to_string(),
            PrefValue::Long(v) => v.to_string(),
            PrefValue::Float(v) => format_float(*v),
            PrefValue::Double(v) => format_float(*v),
            PrefValue::Text(v) => v.clone(),
            PrefValue::Array(items) if items.iter().any(|item| matches!(item, PrefValue::Array(_))) => {
                return Err(PrefsError::UnsupportedType {
                    type_name: "array of arrays".to_string(),
                    key: key.to_string(),
                });
            }
            PrefValue::Array(items) => items
                .iter()
                .map(|item| self.encode(item, key))
                .collect::<PrefsResult<Vec<_>>>()?
                .join(SEPARATOR),
            PrefValue::Structured(v) => self
                .codec
                .to_json(v)
                .map_err(|e| PrefsError::codec(key, e.to_string()))?,
        })
    }

    /// Decodes the stored string `raw` as `descriptor`.
    ///
    /// An empty `raw` is `None` for scalars other than text and for structured
    /// types, an empty array for arrays, and the empty string for text.
    ///
    /// # Errors
    ///
    /// - [`PrefsError::UnsupportedType`] if `descriptor` is or contains an
    ///   unsupported type.
    /// - [`PrefsError::Format`] if a primitive does not parse.
    /// - [`PrefsError::Codec`] if the structured codec fails.
    pub fn decode(
        &self,
        raw: &str,
        descriptor: &TypeDescriptor,
        key: &str,
    ) -> PrefsResult<Option<PrefValue>> {
        descriptor.ensure_supported(key)?;
        self.decode_checked(raw, descriptor, key)
    }

    fn decode_checked(
        &self,
        raw: &str,
        descriptor: &TypeDescriptor,
        key: &str,
    ) -> PrefsResult<Option<PrefValue>> {
        match descriptor {
            TypeDescriptor::Scalar(ScalarKind::Text) => Ok(Some(PrefValue::Text(raw.to_string()))),
            TypeDescriptor::Scalar(_) | TypeDescriptor::Structured { .. } if raw.is_empty() => {
                Ok(None)
            }
            TypeDescriptor::Scalar(kind) => parse_scalar(raw, *kind, key).map(Some),
            TypeDescriptor::Array(inner) => {
                let mut parts: Vec<&str> = if raw.is_empty() {
                    Vec::new()
                } else {
                    raw.split(SEPARATOR).collect()
                };
                while parts.last().is_some_and(|part| part.is_empty()) {
                    parts.pop();
                }
                parts
                    .into_iter()
                    .map(|part| {
                        self.decode_checked(part, inner, key)?.ok_or_else(|| {
                            PrefsError::format(key, inner.to_string(), "empty array element")
                        })
                    })
                    .collect::<PrefsResult<Vec<_>>>()
                    .map(|items| Some(PrefValue::Array(items)))
            }
            TypeDescriptor::Structured { .. } => self
                .codec
                .from_json(raw)
                .map(|v| Some(PrefValue::Structured(v)))
                .map_err(|e| PrefsError::codec(key, e.to_string())),
            TypeDescriptor::Unsupported { type_name } => Err(PrefsError::UnsupportedType {
                type_name: type_name.clone(),
                key: key.to_string(),
            }),
        }
    }
}

impl Default for Marshaller {
    fn default() -> Self {
        Self::new(Arc::new(JsonCodec))
    }
}

impl fmt::Debug for Marshaller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Marshaller").finish_non_exhaustive()
    }
}

fn parse_scalar(raw: &str, kind: ScalarKind, key: &str) -> PrefsResult<PrefValue> {
    let type_name: &'static str = kind.into();
    let bad = |reason: String| PrefsError::format(key, type_name, reason);
    Ok(match kind {
        ScalarKind::Bool => match raw {
            "true" => PrefValue::Bool(true),
            "false" => PrefValue::Bool(false),
            other => return Err(bad(format!("expected 'true' or 'false', found '{other}'"))),
        },
        ScalarKind::Int => PrefValue::Int(raw.parse::<i32>().map_err(|e| bad(e.to_string()))?),
        ScalarKind::Long => PrefValue::Long(raw.parse::<i64>().map_err(|e| bad(e.to_string()))?),
        ScalarKind::Float => PrefValue::Float(raw.parse::<f32>().map_err(|e| bad(e.to_string()))?),
        ScalarKind::Double => PrefValue::Double(raw.parse::<f64>().map_err(|e| bad(e.to_string()))?),
        ScalarKind::Text => PrefValue::Text(raw.to_string()),
    })
}
