//! Gaming platforms sold in the catalog.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a platform name is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown platform: {0}")]
pub struct PlatformParseError(pub String);

/// A platform a game is sold for.
///
/// Stored in the `games.platform` column as the short code returned by
/// [`Platform::code`]. Parsing is case-insensitive and accepts the longer
/// marketing names shown in the platform picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Platform {
    #[default]
    #[serde(rename = "PC")]
    Pc,
    #[serde(rename = "PS5")]
    Ps5,
    #[serde(rename = "Xbox")]
    Xbox,
    #[serde(rename = "Switch")]
    Switch,
}

impl Platform {
    /// All platforms in picker order.
    pub const ALL: [Self; 4] = [Self::Pc, Self::Ps5, Self::Xbox, Self::Switch];

    /// Short code stored in the database.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Pc => "PC",
            Self::Ps5 => "PS5",
            Self::Xbox => "Xbox",
            Self::Switch => "Switch",
        }
    }

    /// Human-readable name for templates.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Pc => "PC",
            Self::Ps5 => "PlayStation 5",
            Self::Xbox => "Xbox Series X",
            Self::Switch => "Nintendo Switch",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Platform {
    type Err = PlatformParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pc" => Ok(Self::Pc),
            "ps5" | "playstation 5" | "playstation" => Ok(Self::Ps5),
            "xbox" | "xbox x" | "xbox series x" => Ok(Self::Xbox),
            "switch" | "nintendo switch" => Ok(Self::Switch),
            _ => Err(PlatformParseError(s.to_owned())),
        }
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Platform {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Platform {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(s.parse()?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Platform {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.code(), buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_codes_case_insensitive() {
        assert_eq!("pc".parse::<Platform>().unwrap(), Platform::Pc);
        assert_eq!("PS5".parse::<Platform>().unwrap(), Platform::Ps5);
        assert_eq!("xbox".parse::<Platform>().unwrap(), Platform::Xbox);
        assert_eq!("SWITCH".parse::<Platform>().unwrap(), Platform::Switch);
    }

    #[test]
    fn test_parse_marketing_names() {
        assert_eq!("Xbox X".parse::<Platform>().unwrap(), Platform::Xbox);
        assert_eq!(
            "Nintendo Switch".parse::<Platform>().unwrap(),
            Platform::Switch
        );
        assert_eq!(
            " PlayStation 5 ".parse::<Platform>().unwrap(),
            Platform::Ps5
        );
    }

    #[test]
    fn test_parse_unknown() {
        let err = "Dreamcast".parse::<Platform>().unwrap_err();
        assert_eq!(err.to_string(), "unknown platform: Dreamcast");
    }

    #[test]
    fn test_code_roundtrips_through_parse() {
        for platform in Platform::ALL {
            assert_eq!(platform.code().parse::<Platform>().unwrap(), platform);
            assert_eq!(
                platform.display_name().parse::<Platform>().unwrap(),
                platform
            );
        }
    }

    #[test]
    fn test_serde_uses_codes() {
        assert_eq!(serde_json::to_string(&Platform::Ps5).unwrap(), "\"PS5\"");
        let parsed: Platform = serde_json::from_str("\"Switch\"").unwrap();
        assert_eq!(parsed, Platform::Switch);
    }
}
