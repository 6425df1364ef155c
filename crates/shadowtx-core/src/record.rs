use std::fmt;

use anyhow::Result;
use serde::Serialize;

use crate::{AccountRecord, GroupRecord, ShadowRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    Account,
    Shadow,
    Group,
}

impl TableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Account => "passwd",
            Self::Shadow => "shadow",
            Self::Group => "group",
        }
    }

    pub fn id_label(&self) -> Option<&'static str> {
        match self {
            Self::Account => Some("uid"),
            Self::Shadow => None,
            Self::Group => Some("gid"),
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait TableRecord: Clone + fmt::Debug + Sized {
    const KIND: TableKind;

    fn decode_line(line: &str) -> Result<Self>;

    fn encode_line(&self) -> String;

    fn name(&self) -> &str;

    fn numeric_id(&self) -> Option<u32> {
        None
    }

    fn validate(&self) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Record {
    Account(AccountRecord),
    Shadow(ShadowRecord),
    Group(GroupRecord),
}

impl Record {
    pub fn decode(kind: TableKind, line: &str) -> Result<Self> {
        Ok(match kind {
            TableKind::Account => Self::Account(AccountRecord::decode_line(line)?),
            TableKind::Shadow => Self::Shadow(ShadowRecord::decode_line(line)?),
            TableKind::Group => Self::Group(GroupRecord::decode_line(line)?),
        })
    }

    pub fn kind(&self) -> TableKind {
        match self {
            Self::Account(_) => TableKind::Account,
            Self::Shadow(_) => TableKind::Shadow,
            Self::Group(_) => TableKind::Group,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Account(record) => record.name(),
            Self::Shadow(record) => record.name(),
            Self::Group(record) => record.name(),
        }
    }

    pub fn encode_line(&self) -> String {
        match self {
            Self::Account(record) => record.encode_line(),
            Self::Shadow(record) => record.encode_line(),
            Self::Group(record) => record.encode_line(),
        }
    }
}

impl From<AccountRecord> for Record {
    fn from(value: AccountRecord) -> Self {
        Self::Account(value)
    }
}

impl From<ShadowRecord> for Record {
    fn from(value: ShadowRecord) -> Self {
        Self::Shadow(value)
    }
}

impl From<GroupRecord> for Record {
    fn from(value: GroupRecord) -> Self {
        Self::Group(value)
    }
}
