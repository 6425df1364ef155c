use super::*;

use std::fs;

use clap::CommandFactory;
use shadowtx_core::ShadowRecord;
use shadowtx_store::{LockSettings, StoreError};
use tempfile::TempDir;

use crate::completion::write_completions_script;
use crate::dispatch::write_listing;

fn seeded_root() -> TempDir {
    let root = tempfile::tempdir().expect("must create temp root");
    let etc = root.path().join("etc");
    fs::create_dir_all(&etc).expect("must create etc");
    fs::write(
        etc.join("passwd"),
        "root:x:0:0:root:/root:/bin/bash\nalice:x:1000:1000:Alice:/home/alice:/bin/sh\n",
    )
    .expect("must write passwd");
    fs::write(
        etc.join("shadow"),
        "root:*:19000:0:99999:7:::\nalice:$6$salt$hash:19000:0:99999:7:::\n",
    )
    .expect("must write shadow");
    fs::write(etc.join("group"), "root:x:0:\nalice:x:1000:\n").expect("must write group");
    root
}

fn store_for(root: &TempDir) -> IdentityStore {
    IdentityStore::new(
        shadowtx_store::DatabasePaths::under_root(root.path()),
        LockSettings::default(),
    )
}

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn useradd_parses_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "shadowtx",
        "useradd",
        "bob",
        "--uid",
        "1001",
        "--gid",
        "1001",
        "--root",
        "/srv/image",
        "-vv",
    ])
    .expect("useradd must parse");
    assert_eq!(cli.root.as_deref(), Some(std::path::Path::new("/srv/image")));
    assert_eq!(cli.verbose, 2);
    match cli.command {
        Commands::Useradd {
            name,
            uid,
            gid,
            shell,
            home,
            ..
        } => {
            assert_eq!(name, "bob");
            assert_eq!((uid, gid), (1001, 1001));
            assert_eq!(shell, "/bin/sh");
            assert!(home.is_none());
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn groupadd_splits_member_list() {
    let cli = Cli::try_parse_from([
        "shadowtx",
        "groupadd",
        "wheel",
        "--gid",
        "10",
        "--members",
        "alice,bob",
    ])
    .expect("groupadd must parse");
    match cli.command {
        Commands::Groupadd { members, .. } => assert_eq!(members, vec!["alice", "bob"]),
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn useradd_requires_ids() {
    Cli::try_parse_from(["shadowtx", "useradd", "bob"]).expect_err("missing ids must fail");
}

#[test]
fn build_store_uses_root_and_lock_timeout_flag() {
    let cli = Cli::try_parse_from([
        "shadowtx",
        "--root",
        "/srv/image",
        "--lock-timeout-ms",
        "50",
        "groupdel",
        "staff",
    ])
    .expect("groupdel must parse");
    let store = build_store(&cli).expect("store must build");
    assert_eq!(
        store.paths().group(),
        std::path::Path::new("/srv/image/etc/group")
    );
}

#[test]
fn run_cli_applies_mutations_under_root() {
    let root = seeded_root();
    let root_arg = root.path().display().to_string();

    let add = Cli::try_parse_from([
        "shadowtx",
        "--root",
        root_arg.as_str(),
        "useradd",
        "bob",
        "--uid",
        "1001",
        "--gid",
        "1001",
        "--comment",
        "Bob",
    ])
    .expect("useradd must parse");
    run_cli(add, OutputStyle::Plain).expect("useradd must succeed");

    let passwd = fs::read_to_string(root.path().join("etc/passwd")).expect("must read passwd");
    assert!(passwd.ends_with("bob:x:1001:1001:Bob:/home/bob:/bin/sh\n"));
    let shadow = fs::read_to_string(root.path().join("etc/shadow")).expect("must read shadow");
    assert!(shadow.lines().last().is_some_and(|line| line.starts_with("bob:!:")));

    let del = Cli::try_parse_from(["shadowtx", "--root", root_arg.as_str(), "userdel", "bob"])
        .expect("userdel must parse");
    run_cli(del, OutputStyle::Plain).expect("userdel must succeed");
    let passwd = fs::read_to_string(root.path().join("etc/passwd")).expect("must read passwd");
    assert!(!passwd.contains("bob"));
}

#[test]
fn duplicate_user_maps_to_value_exists_exit_code() {
    let root = seeded_root();
    let root_arg = root.path().display().to_string();
    let cli = Cli::try_parse_from([
        "shadowtx",
        "--root",
        root_arg.as_str(),
        "useradd",
        "alice",
        "--uid",
        "2000",
        "--gid",
        "2000",
    ])
    .expect("useradd must parse");

    let err = run_cli(cli, OutputStyle::Plain).expect_err("duplicate user must fail");
    assert!(err.downcast_ref::<StoreError>().is_some());
    assert_eq!(exit_code_for(&err), 9);
    assert!(format!("{err:#}").contains("failed to create user 'alice'"));
}

#[test]
fn missing_group_maps_to_not_found_exit_code() {
    let root = seeded_root();
    let root_arg = root.path().display().to_string();
    let cli = Cli::try_parse_from(["shadowtx", "--root", root_arg.as_str(), "groupdel", "staff"])
        .expect("groupdel must parse");

    let err = run_cli(cli, OutputStyle::Plain).expect_err("absent group must fail");
    assert_eq!(exit_code_for(&err), 6);
}

#[test]
fn non_store_errors_use_generic_exit_code() {
    assert_eq!(exit_code_for(&anyhow::anyhow!("bad input")), 2);
}

#[test]
fn listing_prints_table_lines() {
    let root = seeded_root();
    let mut out = Vec::new();
    write_listing(&store_for(&root), ListTable::Groups, false, &mut out)
        .expect("listing must succeed");
    assert_eq!(
        String::from_utf8(out).expect("utf-8"),
        "root:x:0:\nalice:x:1000:\n"
    );
}

#[test]
fn credential_listing_redacts_hashes() {
    let root = seeded_root();
    let mut out = Vec::new();
    write_listing(&store_for(&root), ListTable::Credentials, true, &mut out)
        .expect("listing must succeed");
    let rendered = String::from_utf8(out).expect("utf-8");
    let value: serde_json::Value = serde_json::from_str(&rendered).expect("must be json");
    let entries = value.as_array().expect("must be an array");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["password"], "*");
    assert_eq!(entries[1]["name"], "alice");
    assert_eq!(entries[1]["password"], "*redacted*");
    assert!(!rendered.contains("$6$salt$hash"));
}

#[test]
fn bare_lock_markers_are_listed_verbatim() {
    let credential = ShadowRecord::disabled("svc", 20_000);
    assert!(credential.is_disabled());
    let root = seeded_root();
    store_for(&root)
        .create_credential(&credential, &shadowtx_store::CancellationToken::new())
        .expect("credential create must succeed");

    let mut out = Vec::new();
    write_listing(&store_for(&root), ListTable::Credentials, false, &mut out)
        .expect("listing must succeed");
    let rendered = String::from_utf8(out).expect("utf-8");
    assert!(rendered.ends_with("svc:!:20000:0:99999:7:-1:-1:-1\n"));
}

#[test]
fn locked_credentials_keep_marker_but_hide_hash() {
    let root = seeded_root();
    fs::write(
        root.path().join("etc/shadow"),
        "root:*:19000:0:99999:7:::\nalice:!$6$salt$secrethash:19000:0:99999:7:::\n",
    )
    .expect("must write shadow");

    let mut out = Vec::new();
    write_listing(&store_for(&root), ListTable::Credentials, false, &mut out)
        .expect("listing must succeed");
    let rendered = String::from_utf8(out).expect("utf-8");
    assert!(!rendered.contains("secrethash"));
    assert!(rendered.contains("root:*:19000:"));
    assert!(rendered.contains("alice:!*redacted*:19000:"));
}

#[test]
fn completions_name_the_binary() {
    let mut out = Vec::new();
    write_completions_script(CliCompletionShell::Bash, &mut out).expect("must generate");
    let script = String::from_utf8(out).expect("utf-8");
    assert!(script.contains("shadowtx"));
    assert!(script.contains("useradd"));
}

#[test]
fn render_status_line_plain_is_unadorned() {
    assert_eq!(
        render_status_line(OutputStyle::Plain, "ok", "created user bob (uid=1001)"),
        "created user bob (uid=1001)"
    );
}

#[test]
fn render_status_line_rich_includes_badge() {
    let line = render_status_line(OutputStyle::Rich, "err", "failed to remove group 'staff'");
    assert!(line.contains("[ERR]"));
    assert!(line.ends_with(" failed to remove group 'staff'"));
}

#[test]
fn resolve_output_style_follows_stdout_tty() {
    assert_eq!(resolve_output_style(true), OutputStyle::Rich);
    assert_eq!(resolve_output_style(false), OutputStyle::Plain);
}
