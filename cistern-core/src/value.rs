use rust_decimal::Decimal;
use std::fmt::{self, Display};
use time::{Date, PrimitiveDateTime, Time, macros::format_description};
use uuid::Uuid;

/// A dynamically typed SQL value.
///
/// Every variant but `Null` carries an `Option`: `None` is a *typed* null, it
/// is still null but remembers the column or parameter type it belongs to.
#[derive(Default, Debug, Clone)]
pub enum Value {
    #[default]
    Null,
    Boolean(Option<bool>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    Float64(Option<f64>),
    Decimal(Option<Decimal>),
    Varchar(Option<String>),
    Blob(Option<Box<[u8]>>),
    Date(Option<Date>),
    Time(Option<Time>),
    Timestamp(Option<PrimitiveDateTime>),
    Uuid(Option<Uuid>),
}

/// Type of a value, parameter or column, independent of its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Unknown,
    Boolean,
    Int32,
    Int64,
    Float64,
    Decimal,
    Varchar,
    Blob,
    Date,
    Time,
    Timestamp,
    Uuid,
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null => DataType::Unknown,
            Value::Boolean(..) => DataType::Boolean,
            Value::Int32(..) => DataType::Int32,
            Value::Int64(..) => DataType::Int64,
            Value::Float64(..) => DataType::Float64,
            Value::Decimal(..) => DataType::Decimal,
            Value::Varchar(..) => DataType::Varchar,
            Value::Blob(..) => DataType::Blob,
            Value::Date(..) => DataType::Date,
            Value::Time(..) => DataType::Time,
            Value::Timestamp(..) => DataType::Timestamp,
            Value::Uuid(..) => DataType::Uuid,
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            Value::Null
            | Value::Boolean(None)
            | Value::Int32(None)
            | Value::Int64(None)
            | Value::Float64(None)
            | Value::Decimal(None)
            | Value::Varchar(None)
            | Value::Blob(None)
            | Value::Date(None)
            | Value::Time(None)
            | Value::Timestamp(None)
            | Value::Uuid(None) => true,
            _ => false,
        }
    }

    /// Text form of temporal and uuid values, the one [`AsValue`](crate::AsValue)
    /// parses back from a `Varchar`. `None` for the other variants and for nulls.
    pub fn to_canonical_text(&self) -> Option<String> {
        let text = match self {
            Value::Date(Some(v)) => v.format(format_description!("[year]-[month]-[day]")),
            Value::Time(Some(v)) => {
                v.format(format_description!("[hour]:[minute]:[second].[subsecond]"))
            }
            Value::Timestamp(Some(v)) => v.format(format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"
            )),
            Value::Uuid(Some(v)) => return Some(v.to_string()),
            _ => return None,
        };
        text.ok()
    }

    pub fn same_type(&self, other: &Self) -> bool {
        self.data_type() == other.data_type()
    }

    /// The typed null for `data_type`.
    pub fn null_of(data_type: DataType) -> Value {
        match data_type {
            DataType::Unknown => Value::Null,
            DataType::Boolean => Value::Boolean(None),
            DataType::Int32 => Value::Int32(None),
            DataType::Int64 => Value::Int64(None),
            DataType::Float64 => Value::Float64(None),
            DataType::Decimal => Value::Decimal(None),
            DataType::Varchar => Value::Varchar(None),
            DataType::Blob => Value::Blob(None),
            DataType::Date => Value::Date(None),
            DataType::Time => Value::Time(None),
            DataType::Timestamp => Value::Timestamp(None),
            DataType::Uuid => Value::Uuid(None),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Boolean(l), Self::Boolean(r)) => l == r,
            (Self::Int32(l), Self::Int32(r)) => l == r,
            (Self::Int64(l), Self::Int64(r)) => l == r,
            (Self::Float64(l), Self::Float64(r)) => l == r,
            (Self::Decimal(l), Self::Decimal(r)) => l == r,
            (Self::Varchar(l), Self::Varchar(r)) => l == r,
            (Self::Blob(l), Self::Blob(r)) => l == r,
            (Self::Date(l), Self::Date(r)) => l == r,
            (Self::Time(l), Self::Time(r)) => l == r,
            (Self::Timestamp(l), Self::Timestamp(r)) => l == r,
            (Self::Uuid(l), Self::Uuid(r)) => l == r,
            (Self::Null, Self::Null) => true,
            _ => false,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return f.write_str("NULL");
        }
        match self {
            Value::Boolean(Some(v)) => write!(f, "{}", v),
            Value::Int32(Some(v)) => write!(f, "{}", v),
            Value::Int64(Some(v)) => write!(f, "{}", v),
            Value::Float64(Some(v)) => write!(f, "{}", v),
            Value::Decimal(Some(v)) => write!(f, "{}", v),
            Value::Varchar(Some(v)) => write!(f, "'{}'", v),
            Value::Blob(Some(v)) => write!(f, "<{} bytes>", v.len()),
            Value::Date(Some(v)) => write!(f, "'{}'", v),
            Value::Time(Some(v)) => write!(f, "'{}'", v),
            Value::Timestamp(Some(v)) => write!(f, "'{}'", v),
            Value::Uuid(Some(v)) => write!(f, "'{}'", v),
            _ => f.write_str("NULL"),
        }
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DataType::Unknown => "UNKNOWN",
            DataType::Boolean => "BOOLEAN",
            DataType::Int32 => "INTEGER",
            DataType::Int64 => "BIGINT",
            DataType::Float64 => "DOUBLE",
            DataType::Decimal => "DECIMAL",
            DataType::Varchar => "VARCHAR",
            DataType::Blob => "BLOB",
            DataType::Date => "DATE",
            DataType::Time => "TIME",
            DataType::Timestamp => "TIMESTAMP",
            DataType::Uuid => "UUID",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_nulls() {
        assert!(Value::Null.is_null());
        assert!(Value::Int64(None).is_null());
        assert!(!Value::Int64(Some(0)).is_null());
        assert_eq!(Value::Varchar(None).data_type(), DataType::Varchar);
        assert_eq!(Value::null_of(DataType::Uuid), Value::Uuid(None));
        assert_ne!(Value::Int64(None), Value::Int32(None));
        assert!(Value::Int64(None).same_type(&Value::Int64(Some(3))));
    }

    #[test]
    fn display() {
        assert_eq!(Value::Int64(Some(42)).to_string(), "42");
        assert_eq!(Value::Varchar(Some("x".into())).to_string(), "'x'");
        assert_eq!(Value::Boolean(None).to_string(), "NULL");
        assert_eq!(Value::Blob(Some([1, 2, 3].into())).to_string(), "<3 bytes>");
    }
}
