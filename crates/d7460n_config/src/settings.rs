use crate::errors::Error;
use core::fmt::Display;
use log::warn;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

/// An engine setting. Stored as a typed string: `b:true`, `u:50` or `m:id,sku`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Setting {
    /// Feature switches (`deriver.*`)
    Bool(bool),
    /// Limits (`inject.max_items`)
    UInt(usize),
    /// Comma separated lists of keys (`inject.hidden_keys`)
    Map(Vec<String>),
}

impl Setting {
    /// The type prefix used in `settings.json` and the storage files
    pub fn type_prefix(&self) -> &'static str {
        match self {
            Self::Bool(_) => "b",
            Self::UInt(_) => "u",
            Self::Map(_) => "m",
        }
    }

    /// True when both settings hold the same kind of value
    pub fn same_type(&self, other: &Setting) -> bool {
        self.type_prefix() == other.type_prefix()
    }

    #[must_use]
    pub fn to_bool(&self) -> bool {
        match self {
            Self::Bool(value) => *value,
            other => {
                warn!("setting {other} is not a boolean");
                false
            }
        }
    }

    #[must_use]
    pub fn to_uint(&self) -> usize {
        match self {
            Self::UInt(value) => *value,
            other => {
                warn!("setting {other} is not an unsigned integer");
                0
            }
        }
    }

    #[must_use]
    pub fn to_map(&self) -> Vec<String> {
        match self {
            Self::Map(values) => values.clone(),
            other => {
                warn!("setting {other} is not a map");
                Vec::new()
            }
        }
    }
}

impl Serialize for Setting {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Setting {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::from_str(&value).map_err(|err| serde::de::Error::custom(format!("cannot deserialize: {err}")))
    }
}

impl Display for Setting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "b:{value}"),
            Self::UInt(value) => write!(f, "u:{value}"),
            Self::Map(values) => write!(f, "m:{}", values.join(",")),
        }
    }
}

impl FromStr for Setting {
    type Err = Error;

    fn from_str(typed: &str) -> Result<Self, Error> {
        let Some((prefix, value)) = typed.split_once(':') else {
            return Err(Error::Config(format!("setting without type prefix: {typed}")));
        };

        let setting = match prefix {
            "b" => Self::Bool(
                value
                    .parse::<bool>()
                    .map_err(|err| Error::Config(format!("error parsing {value}: {err}")))?,
            ),
            "u" => Self::UInt(
                value
                    .parse::<usize>()
                    .map_err(|err| Error::Config(format!("error parsing {value}: {err}")))?,
            ),
            "m" => Self::Map(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|key| !key.is_empty())
                    .map(ToString::to_string)
                    .collect(),
            ),
            _ => return Err(Error::Config(format!("unknown setting type '{prefix}' in {typed}"))),
        };

        Ok(setting)
    }
}
