//! Mapping between Rust types and [`PrefValue`]s.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use super::{PrefValue, ScalarKind, TypeDescriptor};

/// Errors converting between a Rust value and a [`PrefValue`].
#[derive(Debug, Error)]
pub enum ValueError {
    /// The decoded value has a different shape than the target type.
    #[error("expected {expected}, found {found}")]
    Mismatch {
        /// Expected kind.
        expected: String,
        /// Kind of the value found.
        found: &'static str,
    },

    /// serde could not map the JSON tree onto the target type.
    #[error("structured value does not match the target type: {0}")]
    Json(#[from] serde_json::Error),
}

impl ValueError {
    fn mismatch<S: Into<String>>(expected: S, found: &PrefValue) -> Self {
        Self::Mismatch {
            expected: expected.into(),
            found: found.kind_name(),
        }
    }
}

/// A Rust type that can be stored as a preference.
pub trait Marshal: Sized {
    /// Runtime descriptor used to decode the stored string.
    fn descriptor() -> TypeDescriptor;

    /// Converts `self` to a [`PrefValue`].
    ///
    /// # Errors
    ///
    /// Returns an error if a structured value cannot be serialized.
    fn to_value(&self) -> Result<PrefValue, ValueError>;

    /// Converts a decoded [`PrefValue`] back to `Self`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value has the wrong shape.
    fn from_value(value: PrefValue) -> Result<Self, ValueError>;
}

macro_rules! copy_scalar {
    ($ty:ty, $kind:ident) => {
        impl Marshal for $ty {
            fn descriptor() -> TypeDescriptor {
                TypeDescriptor::Scalar(ScalarKind::$kind)
            }

            fn to_value(&self) -> Result<PrefValue, ValueError> {
                Ok(PrefValue::$kind(*self))
            }

            fn from_value(value: PrefValue) -> Result<Self, ValueError> {
                match value {
                    PrefValue::$kind(v) => Ok(v),
                    other => Err(ValueError::mismatch(stringify!($ty), &other)),
                }
            }
        }
    };
}

copy_scalar!(bool, Bool);
copy_scalar!(i32, Int);
copy_scalar!(i64, Long);
copy_scalar!(f32, Float);
copy_scalar!(f64, Double);

impl Marshal for String {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Scalar(ScalarKind::Text)
    }

    fn to_value(&self) -> Result<PrefValue, ValueError> {
        Ok(PrefValue::Text(self.clone()))
    }

    fn from_value(value: PrefValue) -> Result<Self, ValueError> {
        match value {
            PrefValue::Text(v) => Ok(v),
            other => Err(ValueError::mismatch("string", &other)),
        }
    }
}

impl<T: Marshal> Marshal for Vec<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::array_of(T::descriptor())
    }

    fn to_value(&self) -> Result<PrefValue, ValueError> {
        self.iter()
            .map(Marshal::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map(PrefValue::Array)
    }

    fn from_value(value: PrefValue) -> Result<Self, ValueError> {
        match value {
            PrefValue::Array(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(ValueError::mismatch(Self::descriptor().to_string(), &other)),
        }
    }
}

fn structured_descriptor<T>() -> TypeDescriptor {
    TypeDescriptor::Structured {
        type_name: std::any::type_name::<T>().to_string(),
    }
}

fn to_structured<T: Serialize>(value: &T) -> Result<PrefValue, ValueError> {
    Ok(PrefValue::Structured(serde_json::to_value(value)?))
}

fn from_structured<T: DeserializeOwned>(value: PrefValue) -> Result<T, ValueError> {
    match value {
        PrefValue::Structured(tree) => Ok(serde_json::from_value(tree)?),
        other => Err(ValueError::mismatch(std::any::type_name::<T>(), &other)),
    }
}

macro_rules! structured {
    (impl<$($param:ident),+> for $ty:ty where $($bounds:tt)+) => {
        impl<$($param),+> Marshal for $ty
        where
            $($bounds)+
        {
            fn descriptor() -> TypeDescriptor {
                structured_descriptor::<Self>()
            }

            fn to_value(&self) -> Result<PrefValue, ValueError> {
                to_structured(self)
            }

            fn from_value(value: PrefValue) -> Result<Self, ValueError> {
                from_structured(value)
            }
        }
    };
}

structured!(impl<K, V> for HashMap<K, V> where
    K: Serialize + DeserializeOwned + Eq + Hash,
    V: Serialize + DeserializeOwned,
);
structured!(impl<K, V> for BTreeMap<K, V> where
    K: Serialize + DeserializeOwned + Ord,
    V: Serialize + DeserializeOwned,
);
structured!(impl<T> for HashSet<T> where
    T: Serialize + DeserializeOwned + Eq + Hash,
);
structured!(impl<T> for BTreeSet<T> where
    T: Serialize + DeserializeOwned + Ord,
);

/// Stores any serde type through the structured codec.
///
/// ```
/// use securepref_core::marshal::{Json, Marshal, PrefValue};
///
/// #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
/// struct Profile {
///     name: String,
/// }
///
/// let value = Json(Profile { name: "ada".into() }).to_value().unwrap();
/// assert!(matches!(value, PrefValue::Structured(_)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    /// Unwraps the inner value.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.0
    }
}

structured!(impl<T> for Json<T> where
    T: Serialize + DeserializeOwned,
);
