//! Static table of the slash commands the bot exposes.
//!
//! The table is the single source for argument parsing, permission checks,
//! autocomplete eligibility and the registration JSON shown by `commands`.

use crate::utils::error::{LedgerError, Result};
use serde_json::{json, Value};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    String,
    Number,
}

impl OptionKind {
    /// Application-command option type code used by the platform.
    pub fn code(self) -> u8 {
        match self {
            OptionKind::String => 3,
            OptionKind::Number => 10,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OptionDef {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: OptionKind,
    pub required: bool,
    pub autocomplete: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct CommandDef {
    pub name: &'static str,
    pub description: &'static str,
    pub admin_only: bool,
    pub options: &'static [OptionDef],
}

impl CommandDef {
    pub fn option(&self, name: &str) -> Option<&'static OptionDef> {
        self.options.iter().find(|o| o.name == name)
    }
}

pub const ADD_TITLE: &str = "addtitle";
pub const DELETE_TITLE: &str = "deletetitle";
pub const LIST_TITLES: &str = "listtitles";
pub const RATE: &str = "rate";
pub const RATINGS: &str = "ratings";
pub const MY_RATINGS: &str = "myratings";
pub const TOP_TITLES: &str = "toptitles";

pub static COMMANDS: &[CommandDef] = &[
    CommandDef {
        name: ADD_TITLE,
        description: "Add a new media title to rate",
        admin_only: true,
        options: &[OptionDef {
            name: "name",
            description: "Name of the media title",
            kind: OptionKind::String,
            required: true,
            autocomplete: false,
        }],
    },
    CommandDef {
        name: DELETE_TITLE,
        description: "Delete a media title and its ratings",
        admin_only: true,
        options: &[OptionDef {
            name: "name",
            description: "Name of the media title to delete",
            kind: OptionKind::String,
            required: true,
            autocomplete: true,
        }],
    },
    CommandDef {
        name: LIST_TITLES,
        description: "List all available media titles",
        admin_only: false,
        options: &[],
    },
    CommandDef {
        name: RATE,
        description: "Rate a media title",
        admin_only: false,
        options: &[
            OptionDef {
                name: "title",
                description: "Title to rate",
                kind: OptionKind::String,
                required: true,
                autocomplete: true,
            },
            OptionDef {
                name: "score",
                description: "Score from 0 to 10",
                kind: OptionKind::Number,
                required: true,
                autocomplete: false,
            },
        ],
    },
    CommandDef {
        name: RATINGS,
        description: "See ratings for a title",
        admin_only: false,
        options: &[OptionDef {
            name: "title",
            description: "Title to view ratings",
            kind: OptionKind::String,
            required: true,
            autocomplete: true,
        }],
    },
    CommandDef {
        name: MY_RATINGS,
        description: "See all the media you have rated",
        admin_only: false,
        options: &[],
    },
    CommandDef {
        name: TOP_TITLES,
        description: "Show top 10 highest rated media titles",
        admin_only: false,
        options: &[],
    },
];

pub fn find_command(name: &str) -> Option<&'static CommandDef> {
    COMMANDS.iter().find(|c| c.name == name)
}

fn invalid(message: String) -> LedgerError {
    LedgerError::InvalidCommand { message }
}

fn validate_name(kind: &str, name: &str) -> Result<()> {
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if name.is_empty() || name.len() > 32 || !valid_chars {
        return Err(invalid(format!("{} name '{}' is not a valid slash-command name", kind, name)));
    }
    Ok(())
}

fn validate_description(owner: &str, description: &str) -> Result<()> {
    let len = description.chars().count();
    if len == 0 || len > 100 {
        return Err(invalid(format!(
            "description of '{}' must be 1-100 characters, got {}",
            owner, len
        )));
    }
    Ok(())
}

/// Checks the table against the platform's registration rules. Run once at startup.
pub fn validate_command_table(commands: &[CommandDef]) -> Result<()> {
    let mut seen = HashSet::new();

    for command in commands {
        validate_name("command", command.name)?;
        validate_description(command.name, command.description)?;
        if !seen.insert(command.name) {
            return Err(invalid(format!("duplicate command '{}'", command.name)));
        }

        let mut option_names = HashSet::new();
        let mut optional_seen = false;
        for option in command.options {
            validate_name("option", option.name)?;
            validate_description(option.name, option.description)?;
            if !option_names.insert(option.name) {
                return Err(invalid(format!(
                    "duplicate option '{}' on '{}'",
                    option.name, command.name
                )));
            }
            if option.autocomplete && option.kind != OptionKind::String {
                return Err(invalid(format!(
                    "option '{}' on '{}' cannot autocomplete a non-string value",
                    option.name, command.name
                )));
            }
            if option.required && optional_seen {
                return Err(invalid(format!(
                    "required option '{}' on '{}' follows an optional one",
                    option.name, command.name
                )));
            }
            optional_seen |= !option.required;
        }
    }

    tracing::debug!(commands = commands.len(), "Command table validated");
    Ok(())
}

/// Application-command registration body for the table.
pub fn registration_payload(commands: &[CommandDef]) -> Value {
    let commands: Vec<Value> = commands
        .iter()
        .map(|command| {
            let options: Vec<Value> = command
                .options
                .iter()
                .map(|option| {
                    json!({
                        "type": option.kind.code(),
                        "name": option.name,
                        "description": option.description,
                        "required": option.required,
                        "autocomplete": option.autocomplete,
                    })
                })
                .collect();

            let mut body = json!({
                "type": 1,
                "name": command.name,
                "description": command.description,
                "options": options,
            });
            if command.admin_only {
                // ADMINISTRATOR
                body["default_member_permissions"] = json!("8");
            }
            body
        })
        .collect();

    Value::Array(commands)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_is_valid() {
        assert!(validate_command_table(COMMANDS).is_ok());
        assert_eq!(COMMANDS.len(), 7);
    }

    #[test]
    fn test_duplicate_command_rejected() {
        let table = [COMMANDS[2], COMMANDS[2]];
        assert!(validate_command_table(&table).is_err());
    }

    #[test]
    fn test_autocomplete_on_number_rejected() {
        static OPTIONS: &[OptionDef] = &[OptionDef {
            name: "score",
            description: "Score",
            kind: OptionKind::Number,
            required: true,
            autocomplete: true,
        }];
        let table = [CommandDef {
            name: "rate",
            description: "Rate",
            admin_only: false,
            options: OPTIONS,
        }];
        assert!(validate_command_table(&table).is_err());
    }

    #[test]
    fn test_uppercase_name_rejected() {
        let table = [CommandDef {
            name: "AddTitle",
            description: "Add",
            admin_only: true,
            options: &[],
        }];
        assert!(validate_command_table(&table).is_err());
    }

    #[test]
    fn test_registration_marks_admin_commands() {
        let payload = registration_payload(COMMANDS);
        let commands = payload.as_array().unwrap();

        let add = commands.iter().find(|c| c["name"] == ADD_TITLE).unwrap();
        assert_eq!(add["default_member_permissions"], "8");

        let rate = commands.iter().find(|c| c["name"] == RATE).unwrap();
        assert!(rate.get("default_member_permissions").is_none());
        assert_eq!(rate["options"][1]["type"], 10);
        assert_eq!(rate["options"][0]["autocomplete"], true);
    }
}
