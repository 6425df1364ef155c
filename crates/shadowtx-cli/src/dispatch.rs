use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;
use shadowtx_core::{days_since_epoch, AccountRecord, GroupRecord, ShadowRecord, TableRecord};
use shadowtx_store::{CancellationToken, IdentityStore};

use crate::completion::write_completions_script;
use crate::render::{render_status_line, OutputStyle};
use crate::{build_store, Cli, Commands, ListTable};

pub(crate) fn run_cli(cli: Cli, style: OutputStyle) -> Result<()> {
    let store = build_store(&cli)?;
    let cancel = CancellationToken::new();

    match cli.command {
        Commands::Useradd {
            name,
            uid,
            gid,
            comment,
            home,
            shell,
            password_hash,
        } => {
            let mut account = AccountRecord::new(name.as_str(), uid, gid)
                .with_comment(comment)
                .with_shell(shell);
            if let Some(home) = home {
                account = account.with_home(home);
            }
            let credential = password_hash.map(|hash| {
                ShadowRecord::disabled(name.as_str(), days_since_epoch()).with_password(hash)
            });
            store
                .create_user(&account, credential.as_ref(), &cancel)
                .with_context(|| format!("failed to create user '{name}'"))?;
            println!(
                "{}",
                render_status_line(style, "ok", &format!("created user {name} (uid={uid})"))
            );
        }
        Commands::Userdel { name } => {
            store
                .remove_user(&name, &cancel)
                .with_context(|| format!("failed to remove user '{name}'"))?;
            println!(
                "{}",
                render_status_line(style, "ok", &format!("removed user {name}"))
            );
        }
        Commands::Credadd {
            name,
            password_hash,
        } => {
            let mut credential = ShadowRecord::disabled(name.as_str(), days_since_epoch());
            if let Some(hash) = password_hash {
                credential = credential.with_password(hash);
            }
            store
                .create_credential(&credential, &cancel)
                .with_context(|| format!("failed to create credential entry '{name}'"))?;
            println!(
                "{}",
                render_status_line(style, "ok", &format!("created credential entry {name}"))
            );
        }
        Commands::Creddel { name } => {
            store
                .remove_credential(&name, &cancel)
                .with_context(|| format!("failed to remove credential entry '{name}'"))?;
            println!(
                "{}",
                render_status_line(style, "ok", &format!("removed credential entry {name}"))
            );
        }
        Commands::Groupadd { name, gid, members } => {
            let group = GroupRecord::new(name.as_str(), gid).with_members(members);
            store
                .create_group(&group, &cancel)
                .with_context(|| format!("failed to create group '{name}'"))?;
            println!(
                "{}",
                render_status_line(style, "ok", &format!("created group {name} (gid={gid})"))
            );
        }
        Commands::Groupdel { name } => {
            store
                .remove_group(&name, &cancel)
                .with_context(|| format!("failed to remove group '{name}'"))?;
            println!(
                "{}",
                render_status_line(style, "ok", &format!("removed group {name}"))
            );
        }
        Commands::List { table, json } => {
            let mut stdout = io::stdout().lock();
            write_listing(&store, table, json, &mut stdout)?;
        }
        Commands::Completions { shell } => {
            let mut stdout = io::stdout().lock();
            write_completions_script(shell, &mut stdout)?;
        }
    }

    Ok(())
}

pub(crate) fn write_listing<W: Write>(
    store: &IdentityStore,
    table: ListTable,
    json: bool,
    writer: &mut W,
) -> Result<()> {
    match table {
        ListTable::Users => write_records(&store.accounts()?, json, writer),
        ListTable::Credentials => {
            let redacted = store
                .credentials()?
                .into_iter()
                .map(redact_credential)
                .collect::<Vec<_>>();
            write_records(&redacted, json, writer)
        }
        ListTable::Groups => write_records(&store.groups()?, json, writer),
    }
}

fn write_records<R, W>(records: &[R], json: bool, writer: &mut W) -> Result<()>
where
    R: TableRecord + Serialize,
    W: Write,
{
    if json {
        serde_json::to_writer_pretty(&mut *writer, records)
            .context("failed to serialize table listing")?;
        writeln!(writer).context("failed writing table listing")?;
        return Ok(());
    }

    for record in records {
        writeln!(writer, "{}", record.encode_line()).context("failed writing table listing")?;
    }
    Ok(())
}

const LOCK_MARKERS: [&str; 5] = ["", "!", "*", "!!", "!*"];

fn redact_credential(mut credential: ShadowRecord) -> ShadowRecord {
    if LOCK_MARKERS.contains(&credential.password.as_str()) {
        return credential;
    }
    credential.password = if credential.password.starts_with('!') {
        "!*redacted*".to_string()
    } else {
        "*redacted*".to_string()
    };
    credential
}
