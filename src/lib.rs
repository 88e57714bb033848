//! Discord Application Commands
//!
//! Reconciles declaratively described application commands against the
//! Discord command registry.
//!
//! A command is written down as a [`CommandSpec`] tree, validated, expanded
//! into the registry's canonical JSON form, and written with a single POST.
//! Reads flatten the registry's answer back into the declarative form, so
//! callers only ever deal with [`CommandSpec`] and [`CommandRecord`].
//!
//! # Example
//!
//! ```
//! use discord_commands::{
//!     expand_command, flatten_command, normalize_order, option_kind, ChoiceSpec, CommandSpec,
//!     TopLevelOptionSpec,
//! };
//!
//! let spec = CommandSpec::new("roll", "roll some dice")
//!     .with_option(TopLevelOptionSpec::new("label", "what the roll is for"))
//!     .with_option(
//!         TopLevelOptionSpec::new("sides", "die size")
//!             .kind(option_kind::INTEGER)
//!             .required(true)
//!             .with_choice(ChoiceSpec::int("d6", 6)),
//!     );
//!
//! let command = expand_command(&spec, None);
//!
//! // Required options are moved ahead of optional ones.
//! assert_eq!(command.options[0].name, "sides");
//!
//! // Flattening gives back the spec, in registry order.
//! let record = flatten_command(&command);
//! assert_eq!(record.command, normalize_order(spec));
//! ```
//!
//! # Lifecycle
//!
//! | Operation | Requests | Not found |
//! |-----------|----------|-----------|
//! | [`Reconciler::create`] | POST, GET | error |
//! | [`Reconciler::read`] | GET | `Ok(None)` |
//! | [`Reconciler::update`] | POST, GET | error |
//! | [`Reconciler::delete`] | DELETE | `Ok(())` |
//!
//! # Scopes
//!
//! Commands without a `guild_id` are global. With a `guild_id` they live
//! under `/guilds/{guild_id}/commands` and are only visible in that guild.

mod client;
mod config;
mod declarative;
mod error;
mod reconciler;
mod transform;
mod types;
mod validator;

pub use client::{collection_path, item_path, HttpTransport, RawResponse, RegistryClient, Transport};
pub use config::{ClientConfig, ResolvedConfig, DEFAULT_API_ROOT, DEFAULT_USER_AGENT, HTTP_TIMEOUT};
pub use declarative::{ChoiceSpec, CommandRecord, CommandSpec, OptionSpec, TopLevelOptionSpec};
pub use error::{
    BoxError, ClientError, ConfigError, FieldError, FormatError, Phase, ReconcileError,
    TransportError,
};
pub use reconciler::{requires_replacement, Reconciler, SweepFailure, SweepReport};
pub use transform::{
    expand_choices, expand_command, expand_options, flatten_choices, flatten_command,
    flatten_options, normalize_order, required_first, HasRequired,
};
pub use types::{option_kind, ChoiceValue, Command, CommandOption, OptionChoice};
pub use validator::{
    validate_command, validate_description, validate_identifier, validate_name,
    validate_snowflake, Diagnostics, MAX_ENTRIES,
};
