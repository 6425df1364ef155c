use anyhow::{anyhow, Context, Result};

use crate::TableKind;

pub(crate) fn split_fields(kind: TableKind, line: &str, expected: usize) -> Result<Vec<&str>> {
    let fields = line.split(':').collect::<Vec<_>>();
    if fields.len() != expected {
        return Err(anyhow!(
            "{} entry must have {} fields, found {}",
            kind.as_str(),
            expected,
            fields.len()
        ));
    }
    Ok(fields)
}

pub(crate) fn validate_name(kind: TableKind, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(anyhow!("{} entry name must not be empty", kind.as_str()));
    }
    if name.starts_with('-') || name.starts_with('+') {
        return Err(anyhow!(
            "{} entry name must not start with '-' or '+': '{}'",
            kind.as_str(),
            name
        ));
    }
    if name
        .chars()
        .any(|ch| matches!(ch, ':' | ',' | '\n' | '\r') || ch.is_whitespace())
    {
        return Err(anyhow!(
            "{} entry name contains a reserved character: '{}'",
            kind.as_str(),
            name
        ));
    }
    Ok(())
}

pub(crate) fn validate_text(kind: TableKind, field: &str, value: &str) -> Result<()> {
    if value.contains([':', '\n', '\r']) {
        return Err(anyhow!(
            "{} field '{}' must not contain ':' or line breaks",
            kind.as_str(),
            field
        ));
    }
    Ok(())
}

pub(crate) fn parse_id(kind: TableKind, field: &str, value: &str) -> Result<u32> {
    value.parse::<u32>().with_context(|| {
        format!(
            "{} field '{}' must be an unsigned 32-bit id, found '{}'",
            kind.as_str(),
            field,
            value
        )
    })
}

pub(crate) fn parse_optional_days(kind: TableKind, field: &str, value: &str) -> Result<Option<i64>> {
    if value.is_empty() || value == "-1" {
        return Ok(None);
    }
    let days = value.parse::<i64>().with_context(|| {
        format!(
            "{} field '{}' must be a day count, found '{}'",
            kind.as_str(),
            field,
            value
        )
    })?;
    if days < 0 {
        return Err(anyhow!(
            "{} field '{}' must not be negative, found '{}'",
            kind.as_str(),
            field,
            value
        ));
    }
    Ok(Some(days))
}

pub(crate) fn encode_optional<T: std::fmt::Display>(value: Option<T>) -> String {
    value
        .map(|value| value.to_string())
        .unwrap_or_else(|| "-1".to_string())
}
