use crate::{Error, Result, Value};
use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};
use std::any;
use time::{Date, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Conversion between native Rust types and the dynamically typed [`Value`]
/// used for query parameters and row decoding.
///
/// `try_from_value` accepts the canonical variant of the type and, for
/// numbers, the other numeric variants when the conversion is lossless.
/// Providers with a small set of storage classes (SQLite returns every integer
/// as 64 bits and every string as text) rely on that.
///
/// ```rust
/// use cistern_core::{AsValue, Value};
/// let v = 42i32.as_value();
/// assert!(matches!(v, Value::Int32(Some(42))));
/// let n: i64 = AsValue::try_from_value(v).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    /// The typed null of this type.
    fn as_empty_value() -> Value;
    fn as_value(self) -> Value;
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
}

fn mismatch<T>(value: &Value) -> Error {
    Error::msg(format!(
        "Cannot convert {:?} into {}",
        value,
        any::type_name::<T>()
    ))
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Varchar(Some(value.into()))
    }
}

impl AsValue for bool {
    fn as_empty_value() -> Value {
        Value::Boolean(None)
    }
    fn as_value(self) -> Value {
        Value::Boolean(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(Some(v)) => Ok(v),
            Value::Int32(Some(v)) if v == 0 || v == 1 => Ok(v == 1),
            Value::Int64(Some(v)) if v == 0 || v == 1 => Ok(v == 1),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for i32 {
    fn as_empty_value() -> Value {
        Value::Int32(None)
    }
    fn as_value(self) -> Value {
        Value::Int32(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Int32(Some(v)) => Ok(v),
            Value::Int64(Some(v)) => i32::try_from(v).map_err(|_| {
                Error::msg(format!("Value {} is out of bounds for i32", v))
            }),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for i64 {
    fn as_empty_value() -> Value {
        Value::Int64(None)
    }
    fn as_value(self) -> Value {
        Value::Int64(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Int64(Some(v)) => Ok(v),
            Value::Int32(Some(v)) => Ok(v as i64),
            Value::Boolean(Some(v)) => Ok(v as i64),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for u64 {
    fn as_empty_value() -> Value {
        Value::Int64(None)
    }
    fn as_value(self) -> Value {
        match i64::try_from(self) {
            Ok(v) => Value::Int64(Some(v)),
            Err(..) => Value::Decimal(Decimal::from_u64(self)),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Int64(Some(v)) if v >= 0 => Ok(v as u64),
            Value::Int32(Some(v)) if v >= 0 => Ok(v as u64),
            Value::Decimal(Some(v)) if v.fract().is_zero() => v
                .to_u64()
                .ok_or_else(|| Error::msg(format!("Value {} is out of bounds for u64", v))),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for f64 {
    fn as_empty_value() -> Value {
        Value::Float64(None)
    }
    fn as_value(self) -> Value {
        Value::Float64(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float64(Some(v)) => Ok(v),
            Value::Int32(Some(v)) => Ok(v as f64),
            Value::Int64(Some(v)) if v.unsigned_abs() < (1 << f64::MANTISSA_DIGITS) => {
                Ok(v as f64)
            }
            Value::Decimal(Some(v)) => v
                .to_f64()
                .ok_or_else(|| Error::msg(format!("Cannot convert the Decimal {} to f64", v))),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for Decimal {
    fn as_empty_value() -> Value {
        Value::Decimal(None)
    }
    fn as_value(self) -> Value {
        Value::Decimal(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Decimal(Some(v)) => Ok(v),
            Value::Int32(Some(v)) => Ok(v.into()),
            Value::Int64(Some(v)) => Ok(v.into()),
            Value::Float64(Some(v)) => Decimal::from_f64(v)
                .ok_or_else(|| Error::msg(format!("Cannot convert the f64 {} to Decimal", v))),
            Value::Varchar(Some(ref v)) => v
                .parse::<Decimal>()
                .map_err(|e| Error::new(e).context(format!("Cannot parse `{}` as Decimal", v))),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for String {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Varchar(Some(v)) => Ok(v),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for Vec<u8> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self.into_boxed_slice()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(Some(v)) => Ok(v.into_vec()),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

macro_rules! impl_as_value_textual {
    ($ty:ty, $variant:path, $parse:expr) => {
        impl AsValue for $ty {
            fn as_empty_value() -> Value {
                $variant(None)
            }
            fn as_value(self) -> Value {
                $variant(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $variant(Some(v)) => Ok(v),
                    // Providers without a native type store it as text
                    Value::Varchar(Some(ref v)) => ($parse)(v.as_str()).map_err(|e| {
                        Error::msg(format!("{}", e)).context(format!(
                            "Cannot parse `{}` as {}",
                            v,
                            any::type_name::<Self>()
                        ))
                    }),
                    _ => Err(mismatch::<Self>(&value)),
                }
            }
        }
    };
}

impl_as_value_textual!(Date, Value::Date, |v: &str| Date::parse(
    v,
    time::macros::format_description!("[year]-[month]-[day]")
));
impl_as_value_textual!(Time, Value::Time, |v: &str| Time::parse(
    v,
    time::macros::format_description!("[hour]:[minute]:[second][optional [.[subsecond]]]")
));
impl_as_value_textual!(PrimitiveDateTime, Value::Timestamp, |v: &str| {
    PrimitiveDateTime::parse(
        v,
        time::macros::format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]"
        ),
    )
});
impl_as_value_textual!(Uuid, Value::Uuid, |v: &str| Uuid::parse_str(v));

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::try_from_value(value).map(Some)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime, time};

    #[test]
    fn numbers() {
        assert_eq!(i64::try_from_value(Value::Int32(Some(7))).unwrap(), 7);
        assert_eq!(i32::try_from_value(Value::Int64(Some(7))).unwrap(), 7);
        assert!(i32::try_from_value(Value::Int64(Some(i64::MAX))).is_err());
        assert!(u64::try_from_value(Value::Int64(Some(-1))).is_err());
        assert_eq!(u64::MAX.as_value(), Value::Decimal(Decimal::from_u64(u64::MAX)));
        assert_eq!(f64::try_from_value(Value::Int64(Some(3))).unwrap(), 3.0);
        assert!(bool::try_from_value(Value::Int64(Some(1))).unwrap());
        assert!(bool::try_from_value(Value::Int64(Some(2))).is_err());
    }

    #[test]
    fn options() {
        assert_eq!(None::<i64>.as_value(), Value::Int64(None));
        assert_eq!(Option::<String>::try_from_value(Value::Null).unwrap(), None);
        assert_eq!(
            Option::<String>::try_from_value(Value::Varchar(Some("a".into()))).unwrap(),
            Some("a".to_string())
        );
    }

    #[test]
    fn textual_fallback() {
        assert_eq!(
            Date::try_from_value(Value::Varchar(Some("2024-02-29".into()))).unwrap(),
            date!(2024 - 02 - 29)
        );
        assert_eq!(
            Time::try_from_value(Value::Varchar(Some("12:30:05".into()))).unwrap(),
            time!(12:30:05)
        );
        assert_eq!(
            PrimitiveDateTime::try_from_value(Value::Varchar(Some(
                "2024-02-29 12:30:05.5".into()
            )))
            .unwrap(),
            datetime!(2024-02-29 12:30:05.5)
        );
        let id = Uuid::from_u128(0x1234);
        assert_eq!(
            Uuid::try_from_value(Value::Varchar(Some(id.to_string()))).unwrap(),
            id
        );
        assert!(Date::try_from_value(Value::Varchar(Some("nope".into()))).is_err());
        assert!(String::try_from_value(Value::Int64(Some(1))).is_err());
    }
}
