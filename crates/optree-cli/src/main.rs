//! `optree` command line
//!
//! Builds an option tree from evaluator output, optionally applies in-memory
//! edits, and answers one query about the result.

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use optree::{ChildrenMode, ConfigOptions, OptionTree, SystemOptionData};
use optree_core::{Attribute, ChangeLayer, OptionDefinition};
use serde_json::{json, Map, Value};
use std::fmt::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn attribute_arg() -> Arg {
    Arg::new("attribute")
        .required(true)
        .help("Attribute path, e.g. services.openssh.enable")
}

fn layer_arg() -> Arg {
    Arg::new("layer")
        .long("layer")
        .default_value("in-memory")
        .value_parser(["configured", "in-memory"])
        .help("Change layer to inspect")
}

fn cli() -> Command {
    Command::new("optree")
        .version(optree::VERSION)
        .about("Inspect option trees built from module evaluator output")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("system")
                .long("system")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Option metadata dumped by the evaluator (JSON)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_parser(value_parser!(PathBuf))
                .help("Configured definitions dumped by the evaluator (JSON)"),
        )
        .arg(
            Arg::new("set")
                .long("set")
                .value_name("ATTR=EXPR")
                .action(ArgAction::Append)
                .help("Apply an in-memory definition before the query; JSON values, otherwise a Nix expression"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Output as JSON"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Log at debug level unless RUST_LOG is set"),
        )
        .subcommand(
            Command::new("show")
                .about("Show metadata and definition layers of an option")
                .arg(attribute_arg()),
        )
        .subcommand(
            Command::new("children")
                .about("List children of an attribute")
                .arg(attribute_arg())
                .arg(
                    Arg::new("mode")
                        .long("mode")
                        .default_value("direct")
                        .value_parser(["direct", "leaves"])
                        .help("Immediate children or leaf descendants"),
                ),
        )
        .subcommand(
            Command::new("branch")
                .about("Follow single-child chains down to the next branching option")
                .arg(attribute_arg()),
        )
        .subcommand(
            Command::new("changes")
                .about("List changed options with their previous definitions")
                .arg(layer_arg()),
        )
        .subcommand(
            Command::new("dirty")
                .about("List attributes with changed descendants")
                .arg(layer_arg()),
        )
        .subcommand(Command::new("list").about("List all attributes"))
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("verbose"));

    let mut tree = load_tree(&matches)?;
    if let Some(assignments) = matches.get_many::<String>("set") {
        for assignment in assignments {
            let (attribute, definition) = parse_assignment(assignment)?;
            tree.set_definition(&attribute, definition);
        }
    }

    println!("{}", run(&tree, &matches)?);
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_tree(matches: &ArgMatches) -> Result<OptionTree> {
    let system_path = matches
        .get_one::<PathBuf>("system")
        .context("--system is required")?;
    let system = SystemOptionData::from_path(system_path)
        .with_context(|| format!("loading option metadata from {}", system_path.display()))?;
    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => ConfigOptions::from_path(path)
            .with_context(|| format!("loading configured definitions from {}", path.display()))?,
        None => ConfigOptions::default(),
    };
    tracing::debug!(options = system.len(), configured = config.len(), "loaded evaluator output");
    Ok(OptionTree::new(system, config))
}

/// Split `attr=expr`; the right side is JSON if it parses as such
fn parse_assignment(assignment: &str) -> Result<(Attribute, OptionDefinition)> {
    let Some((path, text)) = assignment.split_once('=') else {
        bail!("expected ATTR=EXPR, got '{assignment}'");
    };
    let attribute: Attribute = path
        .trim()
        .parse()
        .with_context(|| format!("invalid attribute path '{path}'"))?;
    let text = text.trim();
    let definition = match serde_json::from_str::<Value>(text) {
        Ok(value) => OptionDefinition::from_json(value),
        Err(_) => OptionDefinition::expression(text),
    };
    Ok((attribute, definition))
}

fn string_arg<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a str> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("missing argument '{name}'"))
}

fn attribute(args: &ArgMatches) -> Result<Attribute> {
    let raw = string_arg(args, "attribute")?;
    raw.parse()
        .with_context(|| format!("invalid attribute path '{raw}'"))
}

fn layer(args: &ArgMatches) -> Result<ChangeLayer> {
    Ok(string_arg(args, "layer")?.parse()?)
}

fn run(tree: &OptionTree, matches: &ArgMatches) -> Result<String> {
    let json = matches.get_flag("json");
    match matches.subcommand() {
        Some(("show", args)) => show(tree, &attribute(args)?, json),
        Some(("children", args)) => {
            let mode: ChildrenMode = string_arg(args, "mode")?.parse()?;
            children(tree, &attribute(args)?, mode, json)
        }
        Some(("branch", args)) => {
            let branch = tree.get_next_branching_option(&attribute(args)?)?;
            if json {
                to_json(&json!({ "attribute": branch.to_string() }))
            } else {
                Ok(display_attribute(&branch))
            }
        }
        Some(("changes", args)) => changes(tree, layer(args)?, json),
        Some(("dirty", args)) => dirty(tree, layer(args)?, json),
        Some(("list", _)) => list(tree, json),
        Some((other, _)) => bail!("unknown command '{other}'"),
        None => bail!("no command given"),
    }
}

fn to_json(value: &Value) -> Result<String> {
    serde_json::to_string_pretty(value).context("serializing output")
}

/// Entries for the defined definitions only; `null` stays a value
fn defined_entries(definitions: &[(&str, &OptionDefinition)]) -> Map<String, Value> {
    definitions
        .iter()
        .filter_map(|(key, definition)| Some(((*key).to_string(), definition.to_json()?)))
        .collect()
}

fn display_attribute(attribute: &Attribute) -> String {
    if attribute.is_empty() {
        "<root>".to_string()
    } else {
        attribute.to_string()
    }
}

fn show(tree: &OptionTree, attribute: &Attribute, json: bool) -> Result<String> {
    let record = tree.record(attribute)?;
    let effective = tree.get_definition(attribute)?;
    if json {
        let mut object = Map::new();
        object.insert("attribute".into(), Value::String(attribute.to_string()));
        object.insert("type".into(), json!(record.option_type));
        object.insert("description".into(), json!(record.description));
        object.insert("readOnly".into(), json!(record.read_only));
        object.extend(defined_entries(&[
            ("default", &record.system_default_definition),
            ("configured", &record.configured_definition),
            ("inMemory", &record.in_memory_definition),
            ("effective", effective),
        ]));
        return to_json(&Value::Object(object));
    }

    let mut out = display_attribute(attribute);
    let rows = [
        ("type", record.option_type.clone().unwrap_or_else(|| "-".into())),
        ("description", record.description.clone().unwrap_or_else(|| "-".into())),
        ("read-only", record.read_only.map_or_else(|| "-".into(), |flag| flag.to_string())),
        ("default", record.system_default_definition.to_string()),
        ("configured", record.configured_definition.to_string()),
        ("in-memory", record.in_memory_definition.to_string()),
        ("effective", effective.to_string()),
    ];
    for (label, value) in rows {
        write!(out, "\n  {label:<12} {value}")?;
    }
    Ok(out)
}

fn children(tree: &OptionTree, attribute: &Attribute, mode: ChildrenMode, json: bool) -> Result<String> {
    let children = tree.children(attribute, mode)?;
    if json {
        let entries = children
            .iter()
            .map(|(child, record)| json!({ "attribute": child.to_string(), "type": record.option_type }))
            .collect();
        return to_json(&Value::Array(entries));
    }
    Ok(children
        .iter()
        .map(|(child, record)| format!("{child}\t{}", record.option_type.as_deref().unwrap_or("-")))
        .collect::<Vec<_>>()
        .join("\n"))
}

fn changes(tree: &OptionTree, layer: ChangeLayer, json: bool) -> Result<String> {
    if json {
        let entries = tree
            .iter_changes(layer)
            .map(|change| {
                let mut object = defined_entries(&[("old", change.old), ("new", change.new)]);
                object.insert("attribute".into(), Value::String(change.attribute.to_string()));
                Value::Object(object)
            })
            .collect();
        return to_json(&Value::Array(entries));
    }
    Ok(tree
        .iter_changes(layer)
        .map(|change| change.to_string())
        .collect::<Vec<_>>()
        .join("\n"))
}

fn dirty(tree: &OptionTree, layer: ChangeLayer, json: bool) -> Result<String> {
    let ancestors = tree.get_change_set_with_ancestors(layer);
    if json {
        let entries = ancestors.iter().map(|attribute| Value::String(attribute.to_string())).collect();
        return to_json(&Value::Array(entries));
    }
    Ok(ancestors.iter().map(display_attribute).collect::<Vec<_>>().join("\n"))
}

fn list(tree: &OptionTree, json: bool) -> Result<String> {
    if json {
        let entries = tree
            .iter_attributes()
            .map(|attribute| Value::String(attribute.to_string()))
            .collect();
        return to_json(&Value::Array(entries));
    }
    Ok(tree.iter_attributes().map(display_attribute).collect::<Vec<_>>().join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use optree_test_utils::{attr, sample_tree, value};
    use pretty_assertions::assert_eq;

    fn matches(args: &[&str]) -> ArgMatches {
        let mut argv = vec!["optree", "--system", "options.json"];
        argv.extend_from_slice(args);
        cli().try_get_matches_from(argv).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn assignment_json_or_expression() {
        assert_eq!(
            parse_assignment("services.openssh.enable=false").unwrap(),
            (attr("services.openssh.enable"), value(json!(false)))
        );
        assert_eq!(
            parse_assignment("environment.systemPackages = [ pkgs.vim ]").unwrap(),
            (
                attr("environment.systemPackages"),
                OptionDefinition::expression("[ pkgs.vim ]")
            )
        );
        assert!(parse_assignment("services.openssh.enable").is_err());
        assert!(parse_assignment("a..b=1").is_err());
    }

    #[test]
    fn configured_changes_text() {
        let tree = sample_tree();
        let output = run(&tree, &matches(&["changes", "--layer", "configured"])).unwrap();
        assert_eq!(
            output,
            [
                "environment.variables.EDITOR: <undefined> -> \"vim\"",
                "services.openssh.enable: false -> true",
                "users.users.alice.isNormalUser: false -> true",
            ]
            .join("\n")
        );
    }

    #[test]
    fn in_memory_changes_json() {
        let mut tree = sample_tree();
        tree.set_definition(&attr("networking.hostName"), value(json!("box")));
        let output = run(&tree, &matches(&["--json", "changes"])).unwrap();
        let parsed: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(
            parsed,
            json!([{ "attribute": "networking.hostName", "old": "nixos", "new": "box" }])
        );
    }

    #[test]
    fn null_assignment_is_a_value() {
        let (hostname, definition) = parse_assignment("networking.hostName=null").unwrap();
        assert_eq!(definition, value(Value::Null));

        let mut tree = sample_tree();
        tree.set_definition(&hostname, definition);
        let output = run(&tree, &matches(&["--json", "changes"])).unwrap();
        let parsed: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(
            parsed,
            json!([{ "attribute": "networking.hostName", "old": "nixos", "new": null }])
        );
    }

    #[test]
    fn undefined_old_is_omitted_from_json() {
        let tree = sample_tree();
        let output = run(&tree, &matches(&["--json", "changes", "--layer", "configured"])).unwrap();
        let parsed: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed[0], json!({ "attribute": "environment.variables.EDITOR", "new": "vim" }));
    }

    #[test]
    fn branch_and_children() {
        let tree = sample_tree();
        assert_eq!(run(&tree, &matches(&["branch", "users"])).unwrap(), "users.users.alice");
        assert_eq!(
            run(&tree, &matches(&["children", "services.openssh"])).unwrap(),
            "services.openssh.enable\tboolean\nservices.openssh.ports\tlist of 16 bit unsigned integer; between 0 and 65535 (both inclusive)"
        );
    }

    #[test]
    fn dirty_lists_root_first() {
        let mut tree = sample_tree();
        tree.set_definition(&attr("networking.hostName"), value(json!("box")));
        assert_eq!(run(&tree, &matches(&["dirty"])).unwrap(), "<root>\nnetworking");
    }

    #[test]
    fn show_reports_every_layer() {
        let tree = sample_tree();
        let output = run(&tree, &matches(&["show", "services.openssh.enable"])).unwrap();
        assert!(output.starts_with("services.openssh.enable\n"));
        assert!(output.contains("configured   true"));
        assert!(output.contains("in-memory    <undefined>"));
        assert!(output.contains("effective    true"));
    }

    #[test]
    fn missing_attribute_is_an_error() {
        let tree = sample_tree();
        let err = run(&tree, &matches(&["show", "services.nginx.enable"])).unwrap_err();
        assert!(err.to_string().contains("services.nginx.enable"));
    }
}
