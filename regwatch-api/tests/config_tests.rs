//! Flag and environment resolution through clap

use clap::Parser;
use regwatch_api::config::{Args, ServiceConfig};
use regwatch_common::config::{parse_toml_config, TomlConfig};
use serial_test::serial;

const VARS: [&str; 5] = [
    "REGWATCH_PORT",
    "REGWATCH_DATABASE_URL",
    "ANTHROPIC_API_KEY",
    "ANTHROPIC_MODEL",
    "ANTHROPIC_BASE_URL",
];

fn clear_env() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn environment_fills_unset_flags() {
    clear_env();
    std::env::set_var("REGWATCH_PORT", "7100");
    std::env::set_var("ANTHROPIC_API_KEY", "env-key");
    std::env::set_var("ANTHROPIC_MODEL", "env-model");

    let args = Args::try_parse_from(["regwatch-api"]).unwrap();
    let config = ServiceConfig::resolve(args, TomlConfig::default());
    clear_env();

    assert_eq!(config.port, 7100);
    let llm = config.llm.unwrap();
    assert_eq!(llm.api_key, "env-key");
    assert_eq!(llm.model, "env-model");
}

#[test]
#[serial]
fn flags_override_environment() {
    clear_env();
    std::env::set_var("REGWATCH_PORT", "7100");

    let args = Args::try_parse_from(["regwatch-api", "--port", "7200"]).unwrap();
    let config = ServiceConfig::resolve(args, TomlConfig::default());
    clear_env();

    assert_eq!(config.port, 7200);
}

#[test]
#[serial]
fn environment_overrides_toml() {
    clear_env();
    std::env::set_var("REGWATCH_DATABASE_URL", "sqlite://env.db");
    let toml = parse_toml_config("[database]\nurl = \"sqlite://toml.db\"").unwrap();

    let args = Args::try_parse_from(["regwatch-api"]).unwrap();
    let config = ServiceConfig::resolve(args, toml);
    clear_env();

    assert_eq!(config.database_url, "sqlite://env.db");
    assert!(config.llm.is_none());
}
