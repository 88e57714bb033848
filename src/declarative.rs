//! Declarative (human-authored) command descriptions.
//!
//! This is the tree a caller writes down as desired state. Top-level options
//! may hold one level of [`OptionSpec`] children; an [`OptionSpec`] has no
//! `options` field at all, so deeper nesting cannot be expressed.

use serde::{Deserialize, Serialize};

use crate::types::{default_true, option_kind};

fn default_kind() -> u8 {
    option_kind::STRING
}

/// Desired state of one command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub name: String,

    pub description: String,

    #[serde(default = "default_true")]
    pub default_permission: bool,

    /// Set only for guild-scoped commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<String>,

    #[serde(default, rename = "option", alias = "options")]
    pub options: Vec<TopLevelOptionSpec>,
}

impl CommandSpec {
    /// Create a global command with no options.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            default_permission: true,
            guild_id: None,
            options: Vec::new(),
        }
    }

    /// Scope the command to a guild.
    pub fn in_guild(mut self, guild_id: impl Into<String>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }

    pub fn with_option(mut self, option: TopLevelOptionSpec) -> Self {
        self.options.push(option);
        self
    }
}

/// An option directly under a command. May contain one level of sub-options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TopLevelOptionSpec {
    #[serde(rename = "type", default = "default_kind")]
    pub kind: u8,

    pub name: String,

    pub description: String,

    #[serde(default)]
    pub required: bool,

    #[serde(default, rename = "choice", alias = "choices")]
    pub choices: Vec<ChoiceSpec>,

    #[serde(default, rename = "option", alias = "options")]
    pub options: Vec<OptionSpec>,
}

impl TopLevelOptionSpec {
    /// Create a string-typed option.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: option_kind::STRING,
            name: name.into(),
            description: description.into(),
            required: false,
            choices: Vec::new(),
            options: Vec::new(),
        }
    }

    pub fn kind(mut self, kind: u8) -> Self {
        self.kind = kind;
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_choice(mut self, choice: ChoiceSpec) -> Self {
        self.choices.push(choice);
        self
    }

    pub fn with_option(mut self, option: OptionSpec) -> Self {
        self.options.push(option);
        self
    }
}

/// A nested option. Cannot contain further options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionSpec {
    #[serde(rename = "type", default = "default_kind")]
    pub kind: u8,

    pub name: String,

    pub description: String,

    #[serde(default)]
    pub required: bool,

    #[serde(default, rename = "choice", alias = "choices")]
    pub choices: Vec<ChoiceSpec>,
}

impl OptionSpec {
    /// Create a string-typed option.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: option_kind::STRING,
            name: name.into(),
            description: description.into(),
            required: false,
            choices: Vec::new(),
        }
    }

    pub fn kind(mut self, kind: u8) -> Self {
        self.kind = kind;
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_choice(mut self, choice: ChoiceSpec) -> Self {
        self.choices.push(choice);
        self
    }
}

/// A choice as written by hand: three typed slots, exactly one of which
/// should be filled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChoiceSpec {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub int_value: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub float_value: Option<f64>,
}

impl ChoiceSpec {
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            string_value: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn int(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            int_value: Some(value),
            ..Self::default()
        }
    }

    pub fn float(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            float_value: Some(value),
            ..Self::default()
        }
    }

    /// Number of typed slots holding a value. An empty string counts as unset.
    pub fn populated_slots(&self) -> usize {
        usize::from(self.string_value.as_deref().is_some_and(|s| !s.is_empty()))
            + usize::from(self.int_value.is_some())
            + usize::from(self.float_value.is_some())
    }
}

/// A command as read back from the registry, in declarative form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRecord {
    pub id: String,

    pub application_id: String,

    #[serde(flatten)]
    pub command: CommandSpec,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn spec_parses_singular_block_names() {
        let spec: CommandSpec = serde_json::from_value(json!({
            "name": "roll",
            "description": "roll dice",
            "option": [{
                "name": "sides",
                "description": "die size",
                "choice": [{ "name": "d6", "int_value": 6 }]
            }]
        }))
        .unwrap();

        assert!(spec.default_permission);
        assert_eq!(spec.options[0].kind, option_kind::STRING);
        assert_eq!(spec.options[0].choices[0].int_value, Some(6));
    }

    #[test]
    fn spec_accepts_plural_aliases() {
        let spec: CommandSpec = serde_json::from_value(json!({
            "name": "roll",
            "description": "roll dice",
            "options": [{ "name": "sides", "description": "die size", "choices": [] }]
        }))
        .unwrap();

        assert_eq!(spec.options.len(), 1);
    }

    #[test]
    fn nested_option_cannot_hold_third_level() {
        let result: Result<TopLevelOptionSpec, _> = serde_json::from_value(json!({
            "type": 2,
            "name": "group",
            "description": "a group",
            "option": [{
                "type": 1,
                "name": "sub",
                "description": "a sub",
                "option": [{ "name": "deep", "description": "too deep" }]
            }]
        }));

        let err = result.unwrap_err();
        assert!(err.to_string().contains("unknown field `option`"));
    }

    #[test]
    fn populated_slots_ignores_empty_string() {
        let choice = ChoiceSpec {
            name: "x".into(),
            string_value: Some(String::new()),
            int_value: Some(1),
            float_value: None,
        };
        assert_eq!(choice.populated_slots(), 1);
        assert_eq!(ChoiceSpec::default().populated_slots(), 0);
    }

    #[test]
    fn record_flattens_command_fields() {
        let record = CommandRecord {
            id: "1".into(),
            application_id: "2".into(),
            command: CommandSpec::new("ping", "replies pong"),
        };
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["id"], "1");
        assert_eq!(value["name"], "ping");
        assert!(value.get("guild_id").is_none());
    }
}
