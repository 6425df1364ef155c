use std::collections::HashSet;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;

use crate::fields::{parse_id, split_fields, validate_name, validate_text};
use crate::{TableKind, TableRecord};

const GROUP_FIELDS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRecord {
    pub name: String,
    pub password: String,
    pub gid: u32,
    pub members: Vec<String>,
}

impl GroupRecord {
    pub fn new(name: impl Into<String>, gid: u32) -> Self {
        Self {
            name: name.into(),
            password: "x".to_string(),
            gid,
            members: Vec::new(),
        }
    }

    pub fn with_members<I, S>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.members = members.into_iter().map(Into::into).collect();
        self
    }

    fn validate_members(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for member in &self.members {
            validate_name(Self::KIND, member)
                .with_context(|| format!("invalid member of group '{}'", self.name))?;
            if !seen.insert(member.as_str()) {
                return Err(anyhow!(
                    "group '{}' lists member '{}' more than once",
                    self.name,
                    member
                ));
            }
        }
        Ok(())
    }
}

impl TableRecord for GroupRecord {
    const KIND: TableKind = TableKind::Group;

    fn decode_line(line: &str) -> Result<Self> {
        let fields = split_fields(Self::KIND, line, GROUP_FIELDS)?;
        let members = if fields[3].is_empty() {
            Vec::new()
        } else {
            fields[3].split(',').map(str::to_string).collect()
        };
        let record = Self {
            name: fields[0].to_string(),
            password: fields[1].to_string(),
            gid: parse_id(Self::KIND, "gid", fields[2])?,
            members,
        };
        validate_name(Self::KIND, &record.name)
            .with_context(|| format!("invalid group line: {line}"))?;
        record.validate_members()?;
        Ok(record)
    }

    fn encode_line(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.name,
            self.password,
            self.gid,
            self.members.join(",")
        )
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn numeric_id(&self) -> Option<u32> {
        Some(self.gid)
    }

    fn validate(&self) -> Result<()> {
        validate_name(Self::KIND, &self.name)?;
        validate_text(Self::KIND, "password", &self.password)?;
        self.validate_members()
    }
}
