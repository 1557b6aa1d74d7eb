use dokku_core::naming::{Namespacing, ResourceNamer};
use dokku_core::parsers::{
    parse_env_vars, parse_list, parse_network_info, parse_plugins, parse_port_mappings,
    parse_ps_report, parse_report, parse_service_info,
};
use dokku_core::ResourceKind;
use proptest::prelude::*;

fn kind_strategy() -> impl Strategy<Value = ResourceKind> {
    prop::sample::select(ResourceKind::ALL.to_vec())
}

fn expected_display(raw: &str, separator: char) -> String {
    raw.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { separator })
        .collect()
}

/// Dokku-style output: headers, `key: value` rows and stray punctuation.
fn cli_output() -> impl Strategy<Value = String> {
    prop::collection::vec("(=====> |-----> )?[ A-Za-z0-9:_./>=-]{0,30}", 0..12)
        .prop_map(|lines| lines.join("\n"))
}

proptest! {
    #[test]
    fn display_names_survive_the_system_round_trip(
        display in "[A-Za-z0-9 !-/:-@_.]{1,40}",
        identity in any::<u32>(),
        kind in kind_strategy(),
        per_tenant in any::<bool>(),
    ) {
        let namer = ResourceNamer::new(identity.to_string(), Namespacing::from_flag(per_tenant));
        let system = namer.system(&display, kind);

        prop_assert!(system
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == kind.separator()));
        prop_assert_eq!(
            namer.display(&system, kind),
            expected_display(&display, kind.separator())
        );
    }

    #[test]
    fn parsers_accept_any_text(text in any::<String>(), identity in any::<u32>()) {
        let namer = ResourceNamer::new(identity.to_string(), Namespacing::PerTenant);
        let _ = parse_env_vars(&text);
        let _ = parse_ps_report(&text);
        let _ = parse_report(&text);
        let _ = parse_network_info(&text, &namer);
        let _ = parse_port_mappings(&text);
        let _ = parse_plugins(&text);
        let _ = parse_service_info(&text);
        let _ = parse_list(&text);
    }

    #[test]
    fn parsers_accept_cli_shaped_text(text in cli_output()) {
        let namer = ResourceNamer::new("7", Namespacing::PerTenant);
        let _ = parse_env_vars(&text);
        let _ = parse_ps_report(&text);
        let _ = parse_report(&text);
        let _ = parse_network_info(&text, &namer);
        let _ = parse_port_mappings(&text);
        let _ = parse_plugins(&text);
        let _ = parse_service_info(&text);
        for item in parse_list(&text) {
            prop_assert!(!item.trim().is_empty());
        }
    }
}
