use anyhow::{Context, Result};
use serde::Serialize;

use crate::fields::{parse_id, split_fields, validate_name, validate_text};
use crate::{TableKind, TableRecord};

const ACCOUNT_FIELDS: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountRecord {
    pub name: String,
    pub password: String,
    pub uid: u32,
    pub gid: u32,
    pub comment: String,
    pub home: String,
    pub shell: String,
}

impl AccountRecord {
    pub fn new(name: impl Into<String>, uid: u32, gid: u32) -> Self {
        let name = name.into();
        Self {
            home: format!("/home/{name}"),
            name,
            password: "x".to_string(),
            uid,
            gid,
            comment: String::new(),
            shell: "/bin/sh".to_string(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn with_home(mut self, home: impl Into<String>) -> Self {
        self.home = home.into();
        self
    }

    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }
}

impl TableRecord for AccountRecord {
    const KIND: TableKind = TableKind::Account;

    fn decode_line(line: &str) -> Result<Self> {
        let fields = split_fields(Self::KIND, line, ACCOUNT_FIELDS)?;
        let record = Self {
            name: fields[0].to_string(),
            password: fields[1].to_string(),
            uid: parse_id(Self::KIND, "uid", fields[2])?,
            gid: parse_id(Self::KIND, "gid", fields[3])?,
            comment: fields[4].to_string(),
            home: fields[5].to_string(),
            shell: fields[6].to_string(),
        };
        validate_name(Self::KIND, &record.name)
            .with_context(|| format!("invalid passwd line: {line}"))?;
        Ok(record)
    }

    fn encode_line(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}:{}:{}",
            self.name, self.password, self.uid, self.gid, self.comment, self.home, self.shell
        )
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn numeric_id(&self) -> Option<u32> {
        Some(self.uid)
    }

    fn validate(&self) -> Result<()> {
        validate_name(Self::KIND, &self.name)?;
        for (field, value) in [
            ("password", &self.password),
            ("comment", &self.comment),
            ("home", &self.home),
            ("shell", &self.shell),
        ] {
            validate_text(Self::KIND, field, value)?;
        }
        Ok(())
    }
}
