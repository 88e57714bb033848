//! Canonical registry representation of application commands.
//!
//! These types serialize to exactly the JSON the registry accepts and
//! returns. They are produced by [`crate::expand_command`] and consumed by
//! [`crate::flatten_command`].

use serde::{Deserialize, Serialize};

/// Registry option type codes.
pub mod option_kind {
    pub const SUB_COMMAND: u8 = 1;
    pub const SUB_COMMAND_GROUP: u8 = 2;
    pub const STRING: u8 = 3;
    pub const INTEGER: u8 = 4;
    pub const BOOLEAN: u8 = 5;
    pub const USER: u8 = 6;
    pub const CHANNEL: u8 = 7;
    pub const ROLE: u8 = 8;
    pub const MENTIONABLE: u8 = 9;
    pub const NUMBER: u8 = 10;

    /// Returns true if `kind` is a type code the registry understands.
    pub fn is_known(kind: u8) -> bool {
        (SUB_COMMAND..=NUMBER).contains(&kind)
    }
}

pub(crate) fn default_true() -> bool {
    true
}

/// A command as stored by the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,

    /// Absent for globally visible commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<String>,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_true")]
    pub default_permission: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<CommandOption>,
}

/// A parameter slot of a command, possibly holding one level of sub-options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandOption {
    #[serde(rename = "type")]
    pub kind: u8,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<OptionChoice>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<CommandOption>,
}

/// A fixed value a user may pick for an option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionChoice {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ChoiceValue>,
}

/// The typed value of a choice. Exactly one kind is ever present.
///
/// Deserialization tries integer before float, so `2` decodes as
/// [`ChoiceValue::Integer`] and `2.0` or `2.5` as [`ChoiceValue::Float`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChoiceValue {
    String(String),
    Integer(i64),
    Float(f64),
}
