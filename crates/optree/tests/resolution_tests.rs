use optree::{OptionMetadata, OptionTree, TreeError};
use optree_core::{Attribute, LayerSelection, OptionDefinition};
use optree_test_utils::{attr, empty_config, sample_tree, value};
use pretty_assertions::assert_eq;
use serde_json::json;

fn single_option_tree(default: OptionDefinition, configured: Option<OptionDefinition>) -> OptionTree {
    let hostname = attr("networking.hostName");
    let system = [(hostname.clone(), OptionMetadata::new("string").with_default(default))];
    match configured {
        Some(definition) => OptionTree::new(system, [(hostname, definition)]),
        None => OptionTree::new(system, empty_config()),
    }
}

#[test]
fn test_in_memory_wins_over_configured_and_default() {
    let mut tree = single_option_tree(value(json!("nixos")), Some(value(json!("server"))));
    let hostname = attr("networking.hostName");
    tree.set_definition(&hostname, value(json!("laptop")));
    assert_eq!(tree.get_definition(&hostname).unwrap(), &value(json!("laptop")));
}

#[test]
fn test_configured_wins_over_default() {
    let tree = single_option_tree(value(json!("nixos")), Some(value(json!("server"))));
    assert_eq!(
        tree.get_definition(&attr("networking.hostName")).unwrap(),
        &value(json!("server"))
    );
}

#[test]
fn test_default_when_nothing_configured() {
    let tree = single_option_tree(value(json!("nixos")), None);
    assert_eq!(
        tree.get_definition(&attr("networking.hostName")).unwrap(),
        &value(json!("nixos"))
    );
}

#[test]
fn test_undefined_when_no_layer_defines() {
    let tree = single_option_tree(OptionDefinition::undefined(), None);
    let definition = tree.get_definition(&attr("networking.hostName")).unwrap();
    assert!(definition.is_undefined());
}

#[test]
fn test_resolve_with_layer_selection() {
    let mut tree = sample_tree();
    let enable = attr("services.openssh.enable");
    tree.set_definition(&enable, value(json!(false)));

    let configured_only = LayerSelection {
        include_in_memory: false,
        include_configured: true,
    };
    let default_only = LayerSelection {
        include_in_memory: false,
        include_configured: false,
    };
    assert_eq!(tree.resolve_definition(&enable, configured_only).unwrap(), &value(json!(true)));
    assert_eq!(tree.resolve_definition(&enable, default_only).unwrap(), &value(json!(false)));
    assert_eq!(tree.resolve_definition(&enable, LayerSelection::ALL).unwrap(), &value(json!(false)));
}

#[test]
fn test_layer_accessors() {
    let mut tree = sample_tree();
    let enable = attr("services.openssh.enable");
    tree.set_definition(&enable, OptionDefinition::expression("lib.mkForce false"));

    assert_eq!(
        tree.get_in_memory_definition(&enable).unwrap(),
        &OptionDefinition::expression("lib.mkForce false")
    );
    assert_eq!(tree.get_configured_definition(&enable).unwrap(), &value(json!(true)));
    assert_eq!(tree.get_system_default_definition(&enable).unwrap(), &value(json!(false)));
}

#[test]
fn test_metadata_accessors() {
    let tree = sample_tree();
    let enable = attr("services.openssh.enable");
    assert_eq!(tree.get_type(&enable).unwrap(), Some("boolean"));
    assert_eq!(
        tree.get_description(&enable).unwrap(),
        Some("Whether to enable the OpenSSH secure shell daemon.")
    );
    assert_eq!(tree.is_readonly(&enable).unwrap(), None);
    assert_eq!(tree.is_readonly(&attr("system.build.toplevel")).unwrap(), Some(true));

    // intermediate namespaces are plain attribute sets
    assert_eq!(tree.get_type(&attr("services.openssh")).unwrap(), Some("attribute set"));
    assert_eq!(tree.get_description(&attr("services")).unwrap(), None);
}

#[test]
fn test_unknown_attribute_is_not_found() {
    let tree = sample_tree();
    let missing = attr("services.nginx.enable");

    assert_eq!(tree.get_definition(&missing), Err(TreeError::NotFound(missing.clone())));
    assert!(matches!(tree.get_type(&missing), Err(TreeError::NotFound(_))));
    assert!(matches!(tree.get_description(&missing), Err(TreeError::NotFound(_))));
    assert!(matches!(tree.is_readonly(&missing), Err(TreeError::NotFound(_))));
    assert!(matches!(tree.get_in_memory_definition(&missing), Err(TreeError::NotFound(_))));
    assert!(matches!(tree.record(&missing), Err(TreeError::NotFound(_))));
}

#[test]
fn test_set_definition_creates_missing_attribute() {
    let mut tree = sample_tree();
    let extra = attr("boot.loader.grub.device");
    tree.set_definition(&extra, value(json!("/dev/sda")));

    assert!(tree.contains(&attr("boot")));
    assert!(tree.contains(&attr("boot.loader.grub")));
    assert_eq!(tree.get_definition(&extra).unwrap(), &value(json!("/dev/sda")));
    assert_eq!(tree.get_type(&attr("boot.loader")).unwrap(), Some("attribute set"));
}

#[test]
fn test_root_resolves_to_undefined() {
    let tree = sample_tree();
    assert!(tree.get_definition(&Attribute::root()).unwrap().is_undefined());
}
