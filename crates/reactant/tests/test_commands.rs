//! init / status / models against an isolated home directory

mod common;

use common::TestEnv;
use predicates::prelude::*;
use serde_json::json;

#[test]
fn test_init_writes_default_config() {
    let env = TestEnv::default();

    env.command()
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initializing reactant"))
        .stdout(predicate::str::contains("config.json"));

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(env.config_file()).unwrap()).unwrap();
    assert_eq!(written["agent"]["model"], "claude-3-5-sonnet");
    assert_eq!(written["agent"]["max_steps"], 25);
}

#[test]
fn test_init_keeps_existing_config() {
    let env = TestEnv::default();
    env.write_config(&json!({"agent": {"model": "qwen3:8b"}}))
        .unwrap();

    env.command().arg("init").assert().success();

    let kept = std::fs::read_to_string(env.config_file()).unwrap();
    assert!(kept.contains("qwen3:8b"));
}

#[test]
fn test_status_without_config() {
    let env = TestEnv::default();

    env.command()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("reactant Status"))
        .stdout(predicate::str::contains("[Missing]"))
        .stdout(predicate::str::contains("Gateway:    ollama"));
}

#[test]
fn test_status_reports_holistic_gateway() {
    let env = TestEnv::default();
    env.write_config(&json!({
        "agent": {"model": "claude-3-5-haiku", "max_steps": 9}
    }))
    .unwrap();

    env.command()
        .arg("status")
        .env("HOLISTIC_AI_TEAM_ID", "team")
        .env("HOLISTIC_AI_API_TOKEN", "token")
        .assert()
        .success()
        .stdout(predicate::str::contains("[OK]"))
        .stdout(predicate::str::contains("Gateway:    holistic"))
        .stdout(predicate::str::contains(
            "us.anthropic.claude-3-5-haiku-20241022-v1:0",
        ))
        .stdout(predicate::str::contains("Max steps:  9"));
}

#[test]
fn test_status_env_model_wins_over_file() {
    let env = TestEnv::default();
    env.write_config(&json!({"agent": {"model": "qwen3:8b"}}))
        .unwrap();

    env.command()
        .arg("status")
        .env("MODEL", "gpt-5-mini")
        .env("OPENAI_API_KEY", "sk-test")
        .assert()
        .success()
        .stdout(predicate::str::contains("Gateway:    openai"))
        .stdout(predicate::str::contains("Model:      gpt-5-mini"));
}

#[test]
fn test_status_with_invalid_config_fails() {
    let env = TestEnv::default();
    std::fs::create_dir_all(&env.config_dir).unwrap();
    std::fs::write(env.config_file(), "{ not json").unwrap();

    env.command()
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid config JSON"));
}

#[test]
fn test_status_with_zero_steps_fails() {
    let env = TestEnv::default();
    env.write_config(&json!({"agent": {"max_steps": 0}}))
        .unwrap();

    env.command()
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("agent.max_steps must be at least 1"));
}

#[test]
fn test_models_lists_aliases() {
    let env = TestEnv::default();

    env.command()
        .arg("models")
        .assert()
        .success()
        .stdout(predicate::str::contains("claude-3-5-sonnet"))
        .stdout(predicate::str::contains("gpt-5-nano"))
        .stdout(predicate::str::contains("Schemas: agent, search, analysis, research"));
}
