//! Create, read, update and delete of a single command.
//!
//! Each operation validates its input, converts between declarative and
//! canonical form, and performs its registry round trips in order. Writes
//! are followed by a read so the returned record is what the registry holds.
//! Nothing is retried here; retry policy belongs to the caller.

use serde::Serialize;
use tracing::{info, warn};

use crate::client::{HttpTransport, RegistryClient, Transport};
use crate::config::ClientConfig;
use crate::declarative::{CommandRecord, CommandSpec};
use crate::error::{ConfigError, FormatError, Phase, ReconcileError};
use crate::transform::{expand_command, flatten_command};
use crate::validator::{validate_command, validate_identifier, validate_snowflake};

/// Drives command lifecycles against one application's registry.
pub struct Reconciler<T = HttpTransport> {
    client: RegistryClient<T>,
}

impl Reconciler<HttpTransport> {
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is incomplete or contradictory.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(RegistryClient::new(config)?))
    }
}

impl<T: Transport> Reconciler<T> {
    pub fn new(client: RegistryClient<T>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &RegistryClient<T> {
        &self.client
    }

    /// Create the command described by `spec`, then read it back.
    ///
    /// # Errors
    ///
    /// `Format` before any request if `spec` is invalid; `Client` if the
    /// write or the follow-up read fails.
    pub fn create(&self, spec: &CommandSpec) -> Result<CommandRecord, ReconcileError> {
        let phase = Phase::Create;
        validate_command(spec).map_err(|source| ReconcileError::Format { phase, source })?;

        let guild_id = spec.guild_id.as_deref();
        let written = self
            .client
            .upsert(guild_id, &expand_command(spec, None))
            .map_err(|source| ReconcileError::Client { phase, source })?;
        let id = written_id(phase, written.id)?;

        let record = self.refresh(phase, guild_id, &id)?;
        info!(id = %record.id, name = %record.command.name, "created command");
        Ok(record)
    }

    /// Read a command by id.
    ///
    /// Returns `Ok(None)` when the registry reports the command does not
    /// exist, so callers can drop it from their state.
    ///
    /// # Errors
    ///
    /// `Format` if `id` or `guild_id` is not a snowflake; `Client` for any
    /// other registry failure.
    pub fn read(
        &self,
        guild_id: Option<&str>,
        id: &str,
    ) -> Result<Option<CommandRecord>, ReconcileError> {
        let phase = Phase::Read;
        check_ids(phase, guild_id, id)?;
        let record = self.fetch(phase, guild_id, id)?;
        match &record {
            Some(record) => info!(id, name = %record.command.name, "read command"),
            None => info!(id, "command not found"),
        }
        Ok(record)
    }

    /// Update the command `id` to match `spec`, then read it back.
    ///
    /// The registry matches writes by name, so a `spec` whose name differs
    /// from the stored command's should go through [`requires_replacement`]
    /// and a delete + create instead.
    ///
    /// # Errors
    ///
    /// As [`Reconciler::create`]; also `Format` if `id` is not a snowflake.
    pub fn update(&self, id: &str, spec: &CommandSpec) -> Result<CommandRecord, ReconcileError> {
        let phase = Phase::Update;
        let guild_id = spec.guild_id.as_deref();
        let mut problems = validate_identifier(id, "/id").err();
        if let Err(err) = validate_command(spec) {
            problems = Some(merge(problems, err));
        }
        if let Some(source) = problems {
            return Err(ReconcileError::Format { phase, source });
        }

        let written = self
            .client
            .upsert(guild_id, &expand_command(spec, Some(id)))
            .map_err(|source| ReconcileError::Client { phase, source })?;
        let new_id = written_id(phase, written.id)?;
        if new_id != id {
            warn!(old = id, new = %new_id, "registry assigned a new id on update");
        }

        let record = self.refresh(phase, guild_id, &new_id)?;
        info!(id = %record.id, name = %record.command.name, "updated command");
        Ok(record)
    }

    /// Delete the command `id`. Deleting a command that no longer exists
    /// succeeds.
    ///
    /// # Errors
    ///
    /// `Format` if an id is not a snowflake; `Client` for any registry
    /// failure other than not-found.
    pub fn delete(&self, guild_id: Option<&str>, id: &str) -> Result<(), ReconcileError> {
        let phase = Phase::Delete;
        check_ids(phase, guild_id, id)?;

        match self.client.delete(guild_id, id) {
            Ok(()) => {
                info!(id, "deleted command");
                Ok(())
            }
            Err(err) if err.is_not_found() => {
                warn!(id, "command already gone");
                Ok(())
            }
            Err(source) => Err(ReconcileError::Client { phase, source }),
        }
    }

    /// List every command in a scope in declarative form.
    ///
    /// # Errors
    ///
    /// `Format` if `guild_id` is not a snowflake; `Client` on registry failure.
    pub fn list(&self, guild_id: Option<&str>) -> Result<Vec<CommandRecord>, ReconcileError> {
        let phase = Phase::List;
        check_guild(phase, guild_id)?;
        let commands = self
            .client
            .list(guild_id)
            .map_err(|source| ReconcileError::Client { phase, source })?;
        info!(count = commands.len(), guild_id, "listed commands");
        Ok(commands.iter().map(flatten_command).collect())
    }

    /// Delete every command in a scope whose name starts with `prefix`.
    ///
    /// Individual delete failures are collected in the report rather than
    /// aborting the sweep.
    ///
    /// # Errors
    ///
    /// `Format` on an empty prefix or bad guild id; `Client` if listing fails.
    pub fn sweep(&self, guild_id: Option<&str>, prefix: &str) -> Result<SweepReport, ReconcileError> {
        let phase = Phase::Sweep;
        if prefix.is_empty() {
            return Err(ReconcileError::Format {
                phase,
                source: FormatError::single("/prefix", "sweep prefix must not be empty"),
            });
        }
        check_guild(phase, guild_id)?;

        let commands = self
            .client
            .list(guild_id)
            .map_err(|source| ReconcileError::Client { phase, source })?;

        let mut report = SweepReport::default();
        for command in commands.iter().filter(|c| c.name.starts_with(prefix)) {
            let Some(id) = command.id.as_deref().filter(|id| !id.is_empty()) else {
                warn!(name = %command.name, "sweep skipped command without id");
                report.failed.push(SweepFailure {
                    id: String::new(),
                    name: command.name.clone(),
                    error: "registry listed the command without an id".to_string(),
                });
                continue;
            };
            match self.client.delete(guild_id, id) {
                Ok(()) => report.deleted.push(command.name.clone()),
                Err(err) if err.is_not_found() => report.deleted.push(command.name.clone()),
                Err(err) => {
                    warn!(id, name = %command.name, error = %err, "sweep could not delete command");
                    report.failed.push(SweepFailure {
                        id: id.to_string(),
                        name: command.name.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }
        info!(
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            prefix,
            "sweep finished"
        );
        Ok(report)
    }

    fn fetch(
        &self,
        phase: Phase,
        guild_id: Option<&str>,
        id: &str,
    ) -> Result<Option<CommandRecord>, ReconcileError> {
        match self.client.get(guild_id, id) {
            Ok(command) => Ok(Some(flatten_command(&command))),
            Err(err) if err.is_not_found() => Ok(None),
            Err(source) => Err(ReconcileError::Client { phase, source }),
        }
    }

    fn refresh(
        &self,
        phase: Phase,
        guild_id: Option<&str>,
        id: &str,
    ) -> Result<CommandRecord, ReconcileError> {
        self.fetch(phase, guild_id, id)?
            .ok_or_else(|| ReconcileError::Vanished {
                phase,
                id: id.to_string(),
            })
    }
}

/// Result of [`Reconciler::sweep`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    pub deleted: Vec<String>,
    pub failed: Vec<SweepFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepFailure {
    pub id: String,
    pub name: String,
    pub error: String,
}

/// True if moving from `current` to `desired` cannot be done in place.
///
/// The registry keys writes by name and scope, so renaming a command or
/// moving it between guilds needs a delete and a create.
pub fn requires_replacement(current: &CommandSpec, desired: &CommandSpec) -> bool {
    current.name != desired.name || current.guild_id != desired.guild_id
}

fn written_id(phase: Phase, id: Option<String>) -> Result<String, ReconcileError> {
    id.filter(|id| !id.is_empty())
        .ok_or(ReconcileError::MissingId { phase })
}

fn check_ids(phase: Phase, guild_id: Option<&str>, id: &str) -> Result<(), ReconcileError> {
    let mut problems = validate_identifier(id, "/id").err();
    if let Err(err) = guild_format(guild_id) {
        problems = Some(merge(problems, err));
    }
    match problems {
        Some(source) => Err(ReconcileError::Format { phase, source }),
        None => Ok(()),
    }
}

fn check_guild(phase: Phase, guild_id: Option<&str>) -> Result<(), ReconcileError> {
    guild_format(guild_id).map_err(|source| ReconcileError::Format { phase, source })
}

fn guild_format(guild_id: Option<&str>) -> Result<(), FormatError> {
    let Some(guild_id) = guild_id.filter(|g| !g.is_empty()) else {
        return Ok(());
    };
    let diags = validate_snowflake(guild_id, "guild_id");
    match diags.errors.into_iter().next() {
        Some(message) => Err(FormatError::single("/guild_id", message)),
        None => Ok(()),
    }
}

fn merge(first: Option<FormatError>, second: FormatError) -> FormatError {
    match first {
        Some(mut first) => {
            first.errors.extend(second.errors);
            first
        }
        None => second,
    }
}
