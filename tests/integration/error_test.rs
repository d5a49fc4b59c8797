use std::fs;

use predicates::prelude::*;

use super::{bare_cmd, Fixture};

#[test]
fn test_exit_code_missing_template() {
    let fx = Fixture::new();
    fx.put("us-east-1", "db", "pg");

    fx.cmd()
        .arg(fx.home.path().join("absent.conf"))
        .assert()
        .failure()
        .code(3)
        .stdout("")
        .stderr(predicate::str::contains("Cannot read template"));
}

#[test]
fn test_exit_code_syntax_error() {
    let fx = Fixture::new();
    fx.put("us-east-1", "db", "pg");
    let tpl = fx.template("bad.conf", "{{ db ");

    fx.cmd()
        .arg(&tpl)
        .assert()
        .failure()
        .code(4)
        .stderr(predicate::str::contains("syntax error"));
}

#[test]
fn test_exit_code_store_unavailable() {
    let fx = Fixture::new();
    let tpl = fx.template("app.conf", "{{ db }}");

    fx.cmd()
        .args(["-r", "ap-south-1"])
        .arg(&tpl)
        .assert()
        .failure()
        .code(6)
        .stderr(predicate::str::contains("ap-south-1"));
}

#[test]
fn test_exit_code_invalid_region() {
    let fx = Fixture::new();
    let tpl = fx.template("app.conf", "{{ db }}");

    fx.cmd()
        .args(["-r", "../escape"])
        .arg(&tpl)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Invalid region"));
}

#[test]
fn test_exit_code_no_credentials() {
    let fx = Fixture::new();
    fx.put("us-east-1", "db", "pg");
    let tpl = fx.template("app.conf", "{{ db }}");

    bare_cmd(fx.home.path())
        .arg(&tpl)
        .assert()
        .failure()
        .code(7)
        .stderr(predicate::str::contains("No credentials provided"));
}

#[test]
fn test_exit_code_wrong_keyfile() {
    let fx = Fixture::new();
    fx.put("us-east-1", "db", "pg");
    let tpl = fx.template("app.conf", "{{ db }}");

    let other = Fixture::new();
    fx.cmd()
        .env("CREDREPLACER_KEYFILE", &other.keyfile)
        .arg(&tpl)
        .assert()
        .failure()
        .code(8)
        .stdout("");
}

#[test]
fn test_exit_code_invalid_keyfile() {
    let fx = Fixture::new();
    fx.put("us-east-1", "db", "pg");
    let tpl = fx.template("app.conf", "{{ db }}");
    let bad = fx.home.path().join("bad-key.txt");
    fs::write(&bad, "nonsense\n").unwrap();

    fx.cmd()
        .env("CREDREPLACER_KEYFILE", &bad)
        .arg(&tpl)
        .assert()
        .failure()
        .code(7)
        .stderr(predicate::str::contains("Invalid keyfile"));
}

#[test]
fn test_invalid_config_reported() {
    let fx = Fixture::new();
    fx.put("us-east-1", "db", "pg");
    fs::write(fx.home.path().join(".credreplacer/config.toml"), "[store\n").unwrap();
    let tpl = fx.template("app.conf", "{{ db }}");

    fx.cmd()
        .arg(&tpl)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid config"));
}

#[test]
fn test_exit_code_strict_undefined_in_include() {
    let fx = Fixture::new();
    fx.put("us-east-1", "db", "pg");
    fx.template("db.part", "db={{ db_host }}");
    let tpl = fx.template("main.conf", "[{% include 'db.part' %}]");

    fx.cmd()
        .arg("--strict")
        .arg(&tpl)
        .assert()
        .failure()
        .code(5)
        .stdout("")
        .stderr(predicate::str::contains("Undefined template variable: db_host"));
}
