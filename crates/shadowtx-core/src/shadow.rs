use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context, Result};
use serde::Serialize;

use crate::fields::{
    encode_optional, parse_optional_days, split_fields, validate_name, validate_text,
};
use crate::{TableKind, TableRecord};

const SHADOW_FIELDS: usize = 9;

pub const DISABLED_PASSWORD: &str = "!";

/// `None` day fields are written as `-1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShadowRecord {
    pub name: String,
    pub password: String,
    pub last_changed: Option<i64>,
    pub min_days: Option<i64>,
    pub max_days: Option<i64>,
    pub warn_days: Option<i64>,
    pub inactive_days: Option<i64>,
    pub expire_day: Option<i64>,
    pub flag: Option<u64>,
}

impl ShadowRecord {
    pub fn disabled(name: impl Into<String>, last_changed: i64) -> Self {
        Self {
            name: name.into(),
            password: DISABLED_PASSWORD.to_string(),
            last_changed: Some(last_changed),
            min_days: Some(0),
            max_days: Some(99_999),
            warn_days: Some(7),
            inactive_days: None,
            expire_day: None,
            flag: None,
        }
    }

    pub fn with_password(mut self, hash: impl Into<String>) -> Self {
        self.password = hash.into();
        self
    }

    pub fn is_disabled(&self) -> bool {
        self.password.starts_with('!') || self.password.starts_with('*')
    }
}

impl TableRecord for ShadowRecord {
    const KIND: TableKind = TableKind::Shadow;

    fn decode_line(line: &str) -> Result<Self> {
        let fields = split_fields(Self::KIND, line, SHADOW_FIELDS)?;
        let kind = Self::KIND;
        let flag = match fields[8] {
            "" | "-1" => None,
            raw => Some(raw.parse::<u64>().with_context(|| {
                format!("shadow field 'flag' must be an unsigned integer, found '{raw}'")
            })?),
        };
        let record = Self {
            name: fields[0].to_string(),
            password: fields[1].to_string(),
            last_changed: parse_optional_days(kind, "last_changed", fields[2])?,
            min_days: parse_optional_days(kind, "min", fields[3])?,
            max_days: parse_optional_days(kind, "max", fields[4])?,
            warn_days: parse_optional_days(kind, "warn", fields[5])?,
            inactive_days: parse_optional_days(kind, "inactive", fields[6])?,
            expire_day: parse_optional_days(kind, "expire", fields[7])?,
            flag,
        };
        validate_name(kind, &record.name)
            .with_context(|| format!("invalid shadow entry for '{}'", fields[0]))?;
        Ok(record)
    }

    fn encode_line(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}:{}:{}:{}:{}",
            self.name,
            self.password,
            encode_optional(self.last_changed),
            encode_optional(self.min_days),
            encode_optional(self.max_days),
            encode_optional(self.warn_days),
            encode_optional(self.inactive_days),
            encode_optional(self.expire_day),
            encode_optional(self.flag),
        )
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<()> {
        validate_name(Self::KIND, &self.name)?;
        validate_text(Self::KIND, "password", &self.password)?;
        for (field, value) in [
            ("last_changed", self.last_changed),
            ("min", self.min_days),
            ("max", self.max_days),
            ("warn", self.warn_days),
            ("inactive", self.inactive_days),
            ("expire", self.expire_day),
        ] {
            if matches!(value, Some(days) if days < 0) {
                return Err(anyhow!("shadow field '{field}' must not be negative"));
            }
        }
        Ok(())
    }
}

pub fn days_since_epoch() -> i64 {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    (secs / 86_400) as i64
}
