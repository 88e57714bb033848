//! Field validators and whole-command validation.
//!
//! The field validators are pure: they take a raw value and a field label and
//! report every problem they find as [`Diagnostics`]. [`validate_command`]
//! runs them over a whole [`CommandSpec`] tree and folds the results into a
//! single [`FormatError`].

use std::sync::OnceLock;

use regex::Regex;

use crate::declarative::{ChoiceSpec, CommandSpec, OptionSpec, TopLevelOptionSpec};
use crate::error::{FieldError, FormatError};
use crate::types::option_kind;

/// Maximum options per level and choices per option accepted by the registry.
pub const MAX_ENTRIES: usize = 25;

const MAX_DESCRIPTION: usize = 100;

const NAME_DOCS: &str = "https://discord.com/developers/docs/interactions/application-commands#application-command-object-application-command-naming";

fn name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{1,32}$").expect("static regex"))
}

fn snowflake_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]+$").expect("static regex"))
}

/// Outcome of a single field check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub errors: Vec<String>,
}

impl Diagnostics {
    /// Returns true if no errors were reported.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, message: String) {
        self.errors.push(message);
    }
}

/// Check that `value` is a snowflake: one or more decimal digits.
///
/// Snowflakes are 64-bit integers carried as text so they survive JSON
/// number precision limits.
pub fn validate_snowflake(value: &str, key: &str) -> Diagnostics {
    let mut diags = Diagnostics::default();
    if !snowflake_regex().is_match(value) {
        diags.error(format!("{key} is not a snowflake, got: {value}"));
    }
    diags
}

/// Check that `value` is an acceptable command or option name.
///
/// Pattern and case are checked independently, so `"Way-Too-Long...!"` can
/// report both problems at once.
pub fn validate_name(value: &str, key: &str) -> Diagnostics {
    let mut diags = Diagnostics::default();
    if !name_regex().is_match(value) {
        diags.error(format!(
            "{key} unacceptable: `{value}`, must be 1-32 of [a-z0-9_-], refer to documentation: {NAME_DOCS}"
        ));
    }
    if value != value.to_lowercase() {
        diags.error(format!(
            "{key} not lower case: `{value}`, refer to documentation: {NAME_DOCS}"
        ));
    }
    diags
}

/// Check that `value` is 1-100 characters long.
///
/// Length is counted in Unicode scalar values, not bytes. Also used for
/// choice names and string choice values.
pub fn validate_description(value: &str, key: &str) -> Diagnostics {
    let mut diags = Diagnostics::default();
    let length = value.chars().count();
    if length < 1 || length > MAX_DESCRIPTION {
        diags.error(format!(
            "{key} must be 1-{MAX_DESCRIPTION} characters, got: `{value}` (length {length})"
        ));
    }
    diags
}

/// Check a stored identifier before using it in a request path.
pub fn validate_identifier(value: &str, path: &str) -> Result<(), FormatError> {
    let diags = validate_snowflake(value, "id");
    if diags.is_ok() {
        Ok(())
    } else {
        Err(FormatError {
            errors: diags
                .errors
                .into_iter()
                .map(|message| FieldError {
                    path: path.to_string(),
                    message,
                })
                .collect(),
        })
    }
}

/// Validate a whole command tree.
///
/// Collects every problem instead of stopping at the first.
///
/// # Errors
///
/// Returns `FormatError` listing each offending field by JSON Pointer.
pub fn validate_command(spec: &CommandSpec) -> Result<(), FormatError> {
    let mut collector = Collector::default();

    collector.check("/name", validate_name(&spec.name, "command name"));
    collector.check(
        "/description",
        validate_description(&spec.description, "command description"),
    );
    if let Some(guild_id) = &spec.guild_id {
        collector.check("/guild_id", validate_snowflake(guild_id, "guild_id"));
    }

    collector.limit("/option", spec.options.len(), "options");
    for (i, option) in spec.options.iter().enumerate() {
        collector.top_level_option(&format!("/option/{i}"), option);
    }

    collector.finish()
}

#[derive(Default)]
struct Collector {
    errors: Vec<FieldError>,
}

impl Collector {
    fn check(&mut self, path: &str, diags: Diagnostics) {
        self.errors
            .extend(diags.errors.into_iter().map(|message| FieldError {
                path: path.to_string(),
                message,
            }));
    }

    fn push(&mut self, path: &str, message: String) {
        self.errors.push(FieldError {
            path: path.to_string(),
            message,
        });
    }

    fn limit(&mut self, path: &str, count: usize, what: &str) {
        if count > MAX_ENTRIES {
            self.push(
                path,
                format!("at most {MAX_ENTRIES} {what} are allowed, got {count}"),
            );
        }
    }

    fn top_level_option(&mut self, path: &str, option: &TopLevelOptionSpec) {
        self.option_fields(path, option.kind, &option.name, &option.description);
        self.choices(path, &option.choices);

        self.limit(&format!("{path}/option"), option.options.len(), "options");
        for (i, nested) in option.options.iter().enumerate() {
            self.nested_option(&format!("{path}/option/{i}"), nested);
        }
    }

    fn nested_option(&mut self, path: &str, option: &OptionSpec) {
        self.option_fields(path, option.kind, &option.name, &option.description);
        self.choices(path, &option.choices);
    }

    fn option_fields(&mut self, path: &str, kind: u8, name: &str, description: &str) {
        if !option_kind::is_known(kind) {
            self.push(
                &format!("{path}/type"),
                format!("unknown option type {kind}, expected 1-10"),
            );
        }
        self.check(&format!("{path}/name"), validate_name(name, "option name"));
        self.check(
            &format!("{path}/description"),
            validate_description(description, "option description"),
        );
    }

    fn choices(&mut self, path: &str, choices: &[ChoiceSpec]) {
        self.limit(&format!("{path}/choice"), choices.len(), "choices");
        for (i, choice) in choices.iter().enumerate() {
            let path = format!("{path}/choice/{i}");
            self.check(
                &format!("{path}/name"),
                validate_description(&choice.name, "choice name"),
            );
            if let Some(value) = choice.string_value.as_deref().filter(|v| !v.is_empty()) {
                self.check(
                    &format!("{path}/string_value"),
                    validate_description(value, "choice string_value"),
                );
            }
            if choice.float_value.is_some_and(|f| !f.is_finite()) {
                self.push(
                    &format!("{path}/float_value"),
                    "choice float_value must be a finite number".to_string(),
                );
            }
            match choice.populated_slots() {
                1 => {}
                0 => self.push(
                    &path,
                    "choice needs one of string_value, int_value or float_value".to_string(),
                ),
                n => self.push(
                    &path,
                    format!("choice sets {n} values; exactly one of string_value, int_value or float_value is allowed"),
                ),
            }
        }
    }

    fn finish(self) -> Result<(), FormatError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(FormatError {
                errors: self.errors,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_validator() {
        assert!(validate_name("my-cool-command", "name").is_ok());
        assert!(!validate_name("MyUncoolCommand", "name").is_ok());
        assert!(!validate_name("thisislongerthan32characterssoitshouldfails", "name").is_ok());
        assert_eq!(
            validate_name("thisislongerthan32characterssoitshouldfails", "name")
                .errors
                .len(),
            1
        );
    }

    #[test]
    fn name_validator_reports_both_failures() {
        let diags = validate_name("ThisIsLongerThan32CharactersSoItShouldFail", "name");
        assert_eq!(diags.errors.len(), 2);
    }

    #[test]
    fn name_validator_rejects_unicode_word_chars() {
        assert!(!validate_name("héllo", "name").is_ok());
        assert!(!validate_name("", "name").is_ok());
        assert!(!validate_name("has space", "name").is_ok());
    }

    #[test]
    fn description_validator() {
        assert!(!validate_description("", "description").is_ok());
        assert!(validate_description("hello world!", "description").is_ok());
        assert!(!validate_description(&"hello world!".repeat(10), "description").is_ok());
    }

    #[test]
    fn description_counts_characters_not_bytes() {
        // 100 two-byte characters is within limits.
        assert!(validate_description(&"é".repeat(100), "description").is_ok());
        assert!(!validate_description(&"é".repeat(101), "description").is_ok());
    }

    #[test]
    fn snowflake_validator() {
        assert!(validate_snowflake("386659935687147521", "id").is_ok());
        assert!(!validate_snowflake("aaaaaaaaaa", "id").is_ok());
        assert!(!validate_snowflake("", "id").is_ok());
        assert!(!validate_snowflake("-12", "id").is_ok());
    }

    #[test]
    fn validate_identifier_labels_path() {
        let err = validate_identifier("abc", "/id").unwrap_err();
        assert_eq!(err.errors[0].path, "/id");
        assert!(validate_identifier("42", "/id").is_ok());
    }

    #[test]
    fn valid_command_passes() {
        let spec = CommandSpec::new("roll", "roll some dice")
            .in_guild("386659935687147521")
            .with_option(
                TopLevelOptionSpec::new("sides", "die size")
                    .kind(option_kind::INTEGER)
                    .required(true)
                    .with_choice(ChoiceSpec::int("d6", 6))
                    .with_choice(ChoiceSpec::int("d20", 20)),
            );
        assert!(validate_command(&spec).is_ok());
    }

    #[test]
    fn collects_errors_across_tree() {
        let spec = CommandSpec::new("Roll", "")
            .in_guild("not-a-guild")
            .with_option(
                TopLevelOptionSpec::new("group", "a group")
                    .kind(option_kind::SUB_COMMAND_GROUP)
                    .with_option(OptionSpec::new("BadName", "nested").kind(0)),
            );

        let err = validate_command(&spec).unwrap_err();
        let paths: Vec<&str> = err.errors.iter().map(|e| e.path.as_str()).collect();

        assert!(paths.contains(&"/name"));
        assert!(paths.contains(&"/description"));
        assert!(paths.contains(&"/guild_id"));
        assert!(paths.contains(&"/option/0/option/0/type"));
        assert!(paths.contains(&"/option/0/option/0/name"));
    }

    #[test]
    fn choice_with_several_values_is_rejected() {
        let choice = ChoiceSpec {
            name: "both".into(),
            string_value: Some("x".into()),
            int_value: Some(1),
            float_value: None,
        };
        let spec = CommandSpec::new("pick", "pick one")
            .with_option(TopLevelOptionSpec::new("thing", "a thing").with_choice(choice));

        let err = validate_command(&spec).unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert_eq!(err.errors[0].path, "/option/0/choice/0");
        assert!(err.errors[0].message.contains("sets 2 values"));
    }

    #[test]
    fn choice_without_value_is_rejected() {
        let choice = ChoiceSpec {
            name: "nothing".into(),
            ..ChoiceSpec::default()
        };
        let spec = CommandSpec::new("pick", "pick one")
            .with_option(TopLevelOptionSpec::new("thing", "a thing").with_choice(choice));

        let err = validate_command(&spec).unwrap_err();
        assert!(err.errors[0].message.contains("needs one of"));
    }

    #[test]
    fn too_many_options() {
        let mut spec = CommandSpec::new("many", "lots of options");
        for i in 0..26 {
            spec = spec.with_option(TopLevelOptionSpec::new(format!("opt{i}"), "an option"));
        }

        let err = validate_command(&spec).unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert_eq!(err.errors[0].path, "/option");
    }

    #[test]
    fn long_string_choice_value_is_rejected() {
        let spec = CommandSpec::new("pick", "pick one").with_option(
            TopLevelOptionSpec::new("thing", "a thing")
                .with_choice(ChoiceSpec::string("long", "x".repeat(101))),
        );

        let err = validate_command(&spec).unwrap_err();
        assert_eq!(err.errors[0].path, "/option/0/choice/0/string_value");
    }

    #[test]
    fn non_finite_float_choice_is_rejected() {
        for value in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            let spec = CommandSpec::new("pick", "pick one").with_option(
                TopLevelOptionSpec::new("ratio", "a ratio")
                    .kind(option_kind::NUMBER)
                    .with_choice(ChoiceSpec::float("odd", value)),
            );

            let err = validate_command(&spec).unwrap_err();
            assert_eq!(err.errors.len(), 1);
            assert_eq!(err.errors[0].path, "/option/0/choice/0/float_value");
        }
    }

    #[test]
    fn finite_float_choice_passes() {
        let spec = CommandSpec::new("pick", "pick one").with_option(
            TopLevelOptionSpec::new("ratio", "a ratio")
                .kind(option_kind::NUMBER)
                .with_choice(ChoiceSpec::float("half", 0.5)),
        );
        assert!(validate_command(&spec).is_ok());
    }
}
