//! Conversion between declarative specs and the registry's canonical form.
//!
//! [`expand_command`] runs before every write and [`flatten_command`] after
//! every read. Expansion also applies the required-first ordering the
//! registry insists on: required options must come before optional ones.

use crate::declarative::{ChoiceSpec, CommandRecord, CommandSpec, OptionSpec, TopLevelOptionSpec};
use crate::types::{ChoiceValue, Command, CommandOption, OptionChoice};

/// Expand a declarative spec into the canonical command sent to the registry.
///
/// `id` is attached when updating an existing command.
pub fn expand_command(spec: &CommandSpec, id: Option<&str>) -> Command {
    Command {
        id: id.map(str::to_string),
        application_id: None,
        guild_id: spec.guild_id.clone(),
        name: spec.name.clone(),
        description: spec.description.clone(),
        default_permission: spec.default_permission,
        options: expand_options(&spec.options),
    }
}

/// Expand top-level options, ordered required-first.
pub fn expand_options(items: &[TopLevelOptionSpec]) -> Vec<CommandOption> {
    let options = items
        .iter()
        .map(|item| CommandOption {
            kind: item.kind,
            name: item.name.clone(),
            description: item.description.clone(),
            required: item.required,
            choices: expand_choices(&item.choices),
            options: expand_nested_options(&item.options),
        })
        .collect();
    required_first(options)
}

fn expand_nested_options(items: &[OptionSpec]) -> Vec<CommandOption> {
    let options = items
        .iter()
        .map(|item| CommandOption {
            kind: item.kind,
            name: item.name.clone(),
            description: item.description.clone(),
            required: item.required,
            choices: expand_choices(&item.choices),
            options: Vec::new(),
        })
        .collect();
    required_first(options)
}

pub fn expand_choices(items: &[ChoiceSpec]) -> Vec<OptionChoice> {
    items
        .iter()
        .map(|item| OptionChoice {
            name: item.name.clone(),
            value: choice_value(item),
        })
        .collect()
}

/// Pick the populated typed slot, checking string, then integer, then float.
///
/// Validation rejects choices with more than one slot set, so the order only
/// matters for specs that skipped validation.
fn choice_value(item: &ChoiceSpec) -> Option<ChoiceValue> {
    if let Some(s) = item.string_value.as_deref().filter(|s| !s.is_empty()) {
        return Some(ChoiceValue::String(s.to_string()));
    }
    if let Some(i) = item.int_value {
        return Some(ChoiceValue::Integer(i));
    }
    item.float_value.map(ChoiceValue::Float)
}

/// Stable partition: required options first, each group keeping its order.
pub fn required_first<T: HasRequired>(items: Vec<T>) -> Vec<T> {
    let (mut required, optional): (Vec<T>, Vec<T>) =
        items.into_iter().partition(|item| item.is_required());
    required.extend(optional);
    required
}

/// Anything that can be flagged as a required option.
pub trait HasRequired {
    fn is_required(&self) -> bool;
}

impl HasRequired for CommandOption {
    fn is_required(&self) -> bool {
        self.required
    }
}

impl HasRequired for TopLevelOptionSpec {
    fn is_required(&self) -> bool {
        self.required
    }
}

impl HasRequired for OptionSpec {
    fn is_required(&self) -> bool {
        self.required
    }
}

/// Apply the registry's option ordering to a declarative spec.
///
/// `flatten_command(&expand_command(&spec, None)).command` equals
/// `normalize_order(spec)`.
pub fn normalize_order(mut spec: CommandSpec) -> CommandSpec {
    spec.options = required_first(spec.options)
        .into_iter()
        .map(|mut option| {
            option.options = required_first(option.options);
            option
        })
        .collect();
    spec
}

/// Flatten a canonical command read from the registry into declarative form.
///
/// A command without `guild_id` flattens to a spec with no guild at all.
pub fn flatten_command(command: &Command) -> CommandRecord {
    CommandRecord {
        id: command.id.clone().unwrap_or_default(),
        application_id: command.application_id.clone().unwrap_or_default(),
        command: CommandSpec {
            name: command.name.clone(),
            description: command.description.clone(),
            default_permission: command.default_permission,
            guild_id: command.guild_id.clone().filter(|g| !g.is_empty()),
            options: flatten_options(&command.options),
        },
    }
}

pub fn flatten_options(options: &[CommandOption]) -> Vec<TopLevelOptionSpec> {
    options
        .iter()
        .map(|option| TopLevelOptionSpec {
            kind: option.kind,
            name: option.name.clone(),
            description: option.description.clone(),
            required: option.required,
            choices: flatten_choices(&option.choices),
            options: option
                .options
                .iter()
                .map(|nested| OptionSpec {
                    kind: nested.kind,
                    name: nested.name.clone(),
                    description: nested.description.clone(),
                    required: nested.required,
                    choices: flatten_choices(&nested.choices),
                })
                .collect(),
        })
        .collect()
}

pub fn flatten_choices(choices: &[OptionChoice]) -> Vec<ChoiceSpec> {
    choices
        .iter()
        .map(|choice| {
            let mut item = ChoiceSpec {
                name: choice.name.clone(),
                ..ChoiceSpec::default()
            };
            match &choice.value {
                Some(ChoiceValue::String(s)) => item.string_value = Some(s.clone()),
                Some(ChoiceValue::Integer(i)) => item.int_value = Some(*i),
                Some(ChoiceValue::Float(f)) => item.float_value = Some(*f),
                None => {}
            }
            item
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::option_kind;

    fn names(options: &[CommandOption]) -> Vec<&str> {
        options.iter().map(|o| o.name.as_str()).collect()
    }

    fn sample_spec() -> CommandSpec {
        CommandSpec::new("roll", "roll dice")
            .in_guild("386659935687147521")
            .with_option(TopLevelOptionSpec::new("label", "optional label"))
            .with_option(
                TopLevelOptionSpec::new("sides", "die size")
                    .kind(option_kind::INTEGER)
                    .required(true)
                    .with_choice(ChoiceSpec::int("d6", 6))
                    .with_choice(ChoiceSpec::int("d20", 20)),
            )
            .with_option(
                TopLevelOptionSpec::new("mode", "roll mode")
                    .with_choice(ChoiceSpec::string("fast", "fast"))
                    .with_choice(ChoiceSpec::float("half", 0.5)),
            )
            .with_option(
                TopLevelOptionSpec::new("count", "how many")
                    .kind(option_kind::INTEGER)
                    .required(true),
            )
    }

    #[test]
    fn required_options_move_first_stably() {
        let command = expand_command(&sample_spec(), None);
        assert_eq!(names(&command.options), ["sides", "count", "label", "mode"]);
    }

    #[test]
    fn required_first_is_idempotent() {
        let once = expand_options(&sample_spec().options);
        let twice = required_first(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn nested_options_are_expanded_and_ordered() {
        let spec = CommandSpec::new("admin", "admin tools").with_option(
            TopLevelOptionSpec::new("ban", "ban a member")
                .kind(option_kind::SUB_COMMAND)
                .with_option(OptionSpec::new("reason", "why"))
                .with_option(
                    OptionSpec::new("user", "who")
                        .kind(option_kind::USER)
                        .required(true),
                ),
        );
        let command = expand_command(&spec, None);

        assert_eq!(command.options[0].kind, option_kind::SUB_COMMAND);
        assert_eq!(names(&command.options[0].options), ["user", "reason"]);
    }

    #[test]
    fn choice_values_follow_populated_slot() {
        let command = expand_command(&sample_spec(), None);
        let mode = &command.options[3];

        assert_eq!(mode.choices[0].value, Some(ChoiceValue::String("fast".into())));
        assert_eq!(mode.choices[1].value, Some(ChoiceValue::Float(0.5)));
    }

    #[test]
    fn choice_slot_precedence_is_string_int_float() {
        let choice = ChoiceSpec {
            name: "all".into(),
            string_value: Some("s".into()),
            int_value: Some(1),
            float_value: Some(1.5),
        };
        assert_eq!(choice_value(&choice), Some(ChoiceValue::String("s".into())));

        let choice = ChoiceSpec {
            name: "two".into(),
            string_value: Some(String::new()),
            int_value: Some(1),
            float_value: Some(1.5),
        };
        assert_eq!(choice_value(&choice), Some(ChoiceValue::Integer(1)));

        assert_eq!(choice_value(&ChoiceSpec::default()), None);
    }

    #[test]
    fn expand_attaches_id() {
        let command = expand_command(&CommandSpec::new("ping", "pong"), Some("42"));
        assert_eq!(command.id.as_deref(), Some("42"));
        assert!(command.application_id.is_none());
    }

    #[test]
    fn flatten_expand_round_trip() {
        let spec = sample_spec();
        let record = flatten_command(&expand_command(&spec, None));

        assert_eq!(record.command, normalize_order(spec));
    }

    #[test]
    fn round_trip_through_json() {
        let spec = sample_spec();
        let wire = serde_json::to_string(&expand_command(&spec, Some("9"))).unwrap();
        let command: Command = serde_json::from_str(&wire).unwrap();
        let record = flatten_command(&command);

        assert_eq!(record.id, "9");
        assert_eq!(record.command, normalize_order(spec));
    }

    #[test]
    fn reordering_is_stable_under_reexpansion() {
        let first = expand_command(&sample_spec(), None);
        let second = expand_command(&flatten_command(&first).command, None);
        assert_eq!(first, second);
    }

    #[test]
    fn flatten_omits_missing_guild() {
        let command: Command =
            serde_json::from_str(r#"{"id":"1","name":"ping","description":"replies pong"}"#)
                .unwrap();
        let record = flatten_command(&command);

        assert_eq!(record.id, "1");
        assert!(record.command.guild_id.is_none());
        assert!(record.command.default_permission);
        assert!(record.command.options.is_empty());
    }

    #[test]
    fn flatten_fills_exactly_one_slot() {
        let choices = flatten_choices(&[
            OptionChoice {
                name: "i".into(),
                value: Some(ChoiceValue::Integer(3)),
            },
            OptionChoice {
                name: "f".into(),
                value: Some(ChoiceValue::Float(3.5)),
            },
        ]);

        assert_eq!(choices[0], ChoiceSpec::int("i", 3));
        assert_eq!(choices[1], ChoiceSpec::float("f", 3.5));
    }
}
