#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use deltabot_runtime::config::{self, LogLevel};

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
worker:
  programm: "deltachat-rpc-server" # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.kind().as_str(), "CONFIG");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.log_level, LogLevel::Info);
    assert_eq!(cfg.worker.program, "deltachat-rpc-server");
    assert!(cfg.worker.accounts_dir.is_none());
    assert_eq!(cfg.serve.retry_delay_ms, 5000);
    assert!(cfg.serve.account.is_none());
    assert!(!cfg.log_level.shows_worker_stderr());
}

#[test]
fn full_config() {
    let ok = r#"
version: 1
log_level: debug
worker:
  program: /usr/local/bin/deltachat-rpc-server
  accounts_dir: /var/lib/bot/accounts
  env:
    RUST_LOG: info
  inherit_stderr: true
serve:
  account: 2
  retry_delay_ms: 1000
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.log_level.as_directive(), "debug");
    assert!(cfg.log_level.shows_worker_stderr());
    assert_eq!(cfg.worker.env.get("RUST_LOG").map(String::as_str), Some("info"));
    assert_eq!(cfg.serve.account, Some(2));
}

#[test]
fn rejects_invalid_values() {
    let cases = [
        "version: 2\n",
        "version: 1\nlog_level: loud\n",
        "version: 1\nworker:\n  program: \"  \"\n",
        "version: 1\nserve:\n  retry_delay_ms: 10\n",
        "version: 1\nserve:\n  account: 0\n",
        "version: 1\nworker:\n  accounts_dir: /a\n  env:\n    DC_ACCOUNTS_PATH: /b\n",
    ];
    for case in cases {
        let err = config::load_from_str(case).expect_err(case);
        assert_eq!(err.kind().as_str(), "CONFIG", "{case}");
    }
}

#[test]
fn missing_file_is_a_config_error() {
    let err = config::load_from_file("/nonexistent/deltabot.yaml").unwrap_err();
    assert_eq!(err.kind().as_str(), "CONFIG");
}

#[test]
fn file_errors_name_the_file() {
    let path = std::env::temp_dir().join(format!("deltabot-config-{}.yaml", std::process::id()));
    std::fs::write(&path, "version: 1\nserve:\n  retry_delay_ms: 1\n").unwrap();

    let err = config::load_from_file(&path).unwrap_err();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(err.kind().as_str(), "CONFIG");
    assert!(err.to_string().contains(&path.display().to_string()), "{err}");
}
