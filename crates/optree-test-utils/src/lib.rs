//! Testing utilities for optree workspace
//!
//! Shared fixtures: a small NixOS-like option schema and configuration.

#![allow(missing_docs)]

use optree::{ConfigOptions, OptionMetadata, OptionTree, SystemOptionData};
use optree_core::{Attribute, OptionDefinition};
use serde_json::json;

pub fn attr(s: &str) -> Attribute {
    s.parse().unwrap()
}

pub fn value(v: serde_json::Value) -> OptionDefinition {
    OptionDefinition::value(v)
}

pub fn sample_system_options() -> SystemOptionData {
    [
        (
            "services.openssh.enable",
            OptionMetadata::new("boolean")
                .with_description("Whether to enable the OpenSSH secure shell daemon.")
                .with_default(value(json!(false))),
        ),
        (
            "services.openssh.ports",
            OptionMetadata::new("list of 16 bit unsigned integer; between 0 and 65535 (both inclusive)")
                .with_default(value(json!([22]))),
        ),
        (
            "networking.hostName",
            OptionMetadata::new("string").with_default(value(json!("nixos"))),
        ),
        (
            "system.build.toplevel",
            OptionMetadata::new("package").with_read_only(true),
        ),
        (
            "users.users",
            OptionMetadata::new("attribute set of submodules")
                .with_description("Additional user accounts to be created automatically by the system.")
                .with_default(value(json!({}))),
        ),
        (
            "users.users.<name>.isNormalUser",
            OptionMetadata::new("boolean").with_default(value(json!(false))),
        ),
        (
            "users.users.<name>.uid",
            OptionMetadata::new("null or signed integer"),
        ),
        (
            "users.users.<name>.openssh.authorizedKeys.keys",
            OptionMetadata::new("list of strings").with_default(value(json!([]))),
        ),
        (
            "environment.variables",
            OptionMetadata::new("attribute set of strings")
                .with_description("A set of environment variables used in the global environment.")
                .with_default(value(json!({}))),
        ),
    ]
    .into_iter()
    .map(|(path, metadata)| (attr(path), metadata))
    .collect()
}

pub fn sample_config_options() -> ConfigOptions {
    [
        ("services.openssh.enable", value(json!(true))),
        // same as the default, never a configured change
        ("networking.hostName", value(json!("nixos"))),
        ("users.users.alice.isNormalUser", value(json!(true))),
        ("environment.variables.EDITOR", value(json!("vim"))),
        // no such option
        ("services.nginx.enable", value(json!(true))),
    ]
    .into_iter()
    .map(|(path, definition)| (attr(path), definition))
    .collect()
}

pub fn sample_tree() -> OptionTree {
    OptionTree::new(sample_system_options(), sample_config_options())
}

pub fn empty_config() -> ConfigOptions {
    ConfigOptions::default()
}

pub fn sample_system_options_json() -> String {
    serde_json::to_string_pretty(&sample_system_options()).unwrap()
}

pub fn sample_config_options_json() -> String {
    serde_json::to_string_pretty(&sample_config_options()).unwrap()
}
