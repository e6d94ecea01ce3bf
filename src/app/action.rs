use crate::app::commands::{
    find_command, OptionKind, ADD_TITLE, DELETE_TITLE, LIST_TITLES, MY_RATINGS, RATE, RATINGS,
    TOP_TITLES,
};
use crate::domain::model::UserId;
use crate::utils::error::{LedgerError, Result};

/// Platform permission bit granting full administrator rights.
pub const ADMINISTRATOR: u64 = 1 << 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
    pub name: String,
    pub is_admin: bool,
}

impl Caller {
    pub fn new(user_id: impl Into<UserId>, name: impl Into<String>, is_admin: bool) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            is_admin,
        }
    }

    pub fn from_permissions(
        user_id: impl Into<UserId>,
        name: impl Into<String>,
        permissions: u64,
    ) -> Self {
        Self::new(user_id, name, permissions & ADMINISTRATOR != 0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    String(String),
    Number(f64),
}

impl OptionValue {
    fn kind(&self) -> OptionKind {
        match self {
            OptionValue::String(_) => OptionKind::String,
            OptionValue::Number(_) => OptionKind::Number,
        }
    }
}

/// A command name plus its named arguments, as received from the platform.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Invocation {
    pub command: String,
    pub options: Vec<(String, OptionValue)>,
}

impl Invocation {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            options: Vec::new(),
        }
    }

    pub fn with_string(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options
            .push((name.into(), OptionValue::String(value.into())));
        self
    }

    pub fn with_number(mut self, name: impl Into<String>, value: f64) -> Self {
        self.options.push((name.into(), OptionValue::Number(value)));
        self
    }

    fn get(&self, name: &str) -> Option<&OptionValue> {
        self.options
            .iter()
            .find(|(option, _)| option == name)
            .map(|(_, value)| value)
    }

    fn string(&self, name: &str) -> Result<String> {
        match self.get(name) {
            Some(OptionValue::String(value)) => Ok(value.clone()),
            _ => Err(missing(&self.command, name)),
        }
    }

    fn number(&self, name: &str) -> Result<f64> {
        match self.get(name) {
            Some(OptionValue::Number(value)) => Ok(*value),
            _ => Err(missing(&self.command, name)),
        }
    }
}

fn missing(command: &str, option: &str) -> LedgerError {
    LedgerError::InvalidCommand {
        message: format!("'{}' requires option '{}'", command, option),
    }
}

/// Request for completions of a partially typed option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutocompleteRequest {
    pub command: String,
    pub option: String,
    pub partial: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    AddTitle { name: String },
    DeleteTitle { name: String },
    ListTitles,
    Rate { title: String, score: f64 },
    GetRatings { title: String },
    MyRatings,
    TopTitles,
}

impl Action {
    /// Checks `invocation` against the command table and builds the typed action.
    pub fn parse(invocation: &Invocation) -> Result<Self> {
        let command = find_command(&invocation.command).ok_or_else(|| {
            LedgerError::InvalidCommand {
                message: format!("unknown command '{}'", invocation.command),
            }
        })?;

        for (name, value) in &invocation.options {
            let option = command.option(name).ok_or_else(|| LedgerError::InvalidCommand {
                message: format!("'{}' has no option '{}'", command.name, name),
            })?;
            if option.kind != value.kind() {
                return Err(LedgerError::InvalidCommand {
                    message: format!(
                        "option '{}' of '{}' expects a {:?} value",
                        name, command.name, option.kind
                    ),
                });
            }
        }

        let action = match command.name {
            ADD_TITLE => Action::AddTitle {
                name: invocation.string("name")?,
            },
            DELETE_TITLE => Action::DeleteTitle {
                name: invocation.string("name")?,
            },
            LIST_TITLES => Action::ListTitles,
            RATE => Action::Rate {
                title: invocation.string("title")?,
                score: invocation.number("score")?,
            },
            RATINGS => Action::GetRatings {
                title: invocation.string("title")?,
            },
            MY_RATINGS => Action::MyRatings,
            TOP_TITLES => Action::TopTitles,
            other => {
                return Err(LedgerError::InvalidCommand {
                    message: format!("no handler for command '{}'", other),
                })
            }
        };

        Ok(action)
    }

    pub fn command_name(&self) -> &'static str {
        match self {
            Action::AddTitle { .. } => ADD_TITLE,
            Action::DeleteTitle { .. } => DELETE_TITLE,
            Action::ListTitles => LIST_TITLES,
            Action::Rate { .. } => RATE,
            Action::GetRatings { .. } => RATINGS,
            Action::MyRatings => MY_RATINGS,
            Action::TopTitles => TOP_TITLES,
        }
    }

    pub fn requires_admin(&self) -> bool {
        find_command(self.command_name()).is_some_and(|c| c.admin_only)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rate() {
        let invocation = Invocation::new("rate")
            .with_string("title", "Naruto")
            .with_number("score", 8.5);

        assert_eq!(
            Action::parse(&invocation).unwrap(),
            Action::Rate {
                title: "Naruto".to_string(),
                score: 8.5
            }
        );
    }

    #[test]
    fn test_parse_rejects_unknown_command() {
        let err = Action::parse(&Invocation::new("purge")).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidCommand { .. }));
    }

    #[test]
    fn test_parse_rejects_missing_option() {
        let invocation = Invocation::new("rate").with_string("title", "Naruto");
        assert!(Action::parse(&invocation).is_err());
    }

    #[test]
    fn test_parse_rejects_wrong_option_type() {
        let invocation = Invocation::new("rate")
            .with_string("title", "Naruto")
            .with_string("score", "nine");
        assert!(Action::parse(&invocation).is_err());
    }

    #[test]
    fn test_parse_rejects_unknown_option() {
        let invocation = Invocation::new("listtitles").with_string("filter", "x");
        assert!(Action::parse(&invocation).is_err());
    }

    #[test]
    fn test_admin_actions() {
        assert!(Action::AddTitle { name: "x".into() }.requires_admin());
        assert!(Action::DeleteTitle { name: "x".into() }.requires_admin());
        assert!(!Action::ListTitles.requires_admin());
        assert!(!Action::TopTitles.requires_admin());
    }

    #[test]
    fn test_caller_admin_bit() {
        assert!(Caller::from_permissions("1", "a", ADMINISTRATOR | 1).is_admin);
        assert!(!Caller::from_permissions("1", "a", 1 << 11).is_admin);
    }
}
