use std::fs;

use predicates::prelude::*;

use super::Fixture;

#[test]
fn test_render_substitutes_secret() {
    let fx = Fixture::new();
    fx.put("us-east-1", "db_password", "s3cr3t");
    let tpl = fx.template("app.conf", "Password: {{ db_password }}");

    fx.cmd()
        .arg(&tpl)
        .assert()
        .success()
        .stdout("Password: s3cr3t");
}

#[test]
fn test_render_lenient_missing_is_blank() {
    let fx = Fixture::new();
    fx.put("us-east-1", "db_password", "s3cr3t");
    let tpl = fx.template("app.conf", "User: {{ missing_key }}");

    fx.cmd().arg(&tpl).assert().success().stdout("User: ");
}

#[test]
fn test_render_strict_missing_fails_without_output() {
    let fx = Fixture::new();
    fx.put("us-east-1", "db_password", "s3cr3t");
    let tpl = fx.template("app.conf", "User: {{ missing_key }}");

    fx.cmd()
        .arg("--strict")
        .arg(&tpl)
        .assert()
        .failure()
        .code(5)
        .stdout("")
        .stderr(predicate::str::contains("missing_key"));
}

#[test]
fn test_render_strict_all_defined() {
    let fx = Fixture::new();
    fx.put("us-east-1", "user", "admin");
    fx.put("us-east-1", "pass", "pw");
    let tpl = fx.template("app.conf", "{{ user }}:{{ pass }}\n");

    fx.cmd()
        .arg("--strict")
        .arg(&tpl)
        .assert()
        .success()
        .stdout("admin:pw");
}

#[test]
fn test_render_uses_region_flag() {
    let fx = Fixture::new();
    fx.put("us-east-1", "db", "east");
    fx.put("eu-west-1", "db", "west");
    let tpl = fx.template("app.conf", "db={{ db }}");

    fx.cmd()
        .args(["-r", "eu-west-1"])
        .arg(&tpl)
        .assert()
        .success()
        .stdout("db=west");

    fx.cmd()
        .args(["--region", "us-east-1"])
        .arg(&tpl)
        .assert()
        .success()
        .stdout("db=east");
}

#[test]
fn test_render_default_region_from_config() {
    let fx = Fixture::new();
    fx.put("eu-west-1", "db", "west");
    let config_dir = fx.home.path().join(".credreplacer");
    fs::write(
        config_dir.join("config.toml"),
        "[store]\ndefault_region = \"eu-west-1\"\n",
    )
    .unwrap();
    let tpl = fx.template("app.conf", "db={{ db }}");

    fx.cmd().arg(&tpl).assert().success().stdout("db=west");
}

#[test]
fn test_render_with_matching_context() {
    let fx = Fixture::new();
    fx.put_with_context("us-east-1", "token", "abc", &["app=web", "env=prod"]);
    let tpl = fx.template("app.conf", "token={{ token }}");

    fx.cmd()
        .arg(&tpl)
        .args(["env=prod", "app=web"])
        .assert()
        .success()
        .stdout("token=abc");
}

#[test]
fn test_render_keyfile_from_config() {
    let fx = Fixture::new();
    fx.put("us-east-1", "db", "pg");
    let config_dir = fx.home.path().join(".credreplacer");
    fs::write(
        config_dir.join("config.toml"),
        "[auth]\nkeyfile = \"~/key.txt\"\n",
    )
    .unwrap();
    let tpl = fx.template("app.conf", "db={{ db }}");

    super::bare_cmd(fx.home.path())
        .arg(&tpl)
        .assert()
        .success()
        .stdout("db=pg");
}

#[test]
fn test_render_store_dir_override() {
    let fx = Fixture::new();
    let tpl = fx.template("app.conf", "db={{ db }}");
    fx.put("us-east-1", "db", "pg");
    let moved = fx.home.path().join("elsewhere");
    fs::rename(fx.store_dir(), &moved).unwrap();

    fx.cmd()
        .env("CREDREPLACER_STORE_DIR", &moved)
        .arg(&tpl)
        .assert()
        .success()
        .stdout("db=pg");
}

#[test]
fn test_render_include_next_to_template() {
    let fx = Fixture::new();
    fx.put("us-east-1", "db", "pg");
    fx.template("db.part", "db={{ db }}");
    let tpl = fx.template("main.conf", "[{% include 'db.part' %}]");

    fx.cmd().arg(&tpl).assert().success().stdout("[db=pg]");
}

#[test]
fn test_render_logs_go_to_stderr() {
    let fx = Fixture::new();
    fx.put("us-east-1", "db", "Zq9-v4lue-Xk2");
    let tpl = fx.template("app.conf", "db={{ db }}");

    fx.cmd()
        .env("CREDREPLACER_LOG", "debug")
        .arg(&tpl)
        .assert()
        .success()
        .stdout("db=Zq9-v4lue-Xk2")
        .stderr(predicate::str::contains("fetched secret"))
        .stderr(predicate::str::contains("Zq9-v4lue-Xk2").not());
}
