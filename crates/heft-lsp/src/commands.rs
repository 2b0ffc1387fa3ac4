//! `workspace/executeCommand` argument parsing.

use heft_core::{Error, ReportItem, Result};
use heft_orchestrator::Command;
use serde_json::Value;
use std::path::PathBuf;

/// Builds a [`Command`] from an editor command name and its arguments.
pub fn parse_command(name: &str, arguments: &[Value]) -> Result<Command> {
    match name {
        Command::CHECK => Ok(Command::Check),
        Command::TOGGLE => Ok(Command::Toggle),
        Command::SIGN_IN => Ok(Command::SignIn),
        Command::SIGN_OUT => Ok(Command::SignOut),
        Command::SHOW_OUTPUT => {
            let item = match arguments.first() {
                None | Some(Value::Null) => None,
                Some(value) => Some(
                    serde_json::from_value::<ReportItem>(value.clone()).map_err(|source| {
                        Error::JsonError {
                            file: PathBuf::from(Command::SHOW_OUTPUT),
                            source,
                        }
                    })?,
                ),
            };
            Ok(Command::ShowOutput(item))
        }
        Command::OPEN_VULN_PAGE => arguments
            .first()
            .and_then(Value::as_str)
            .map(|package| Command::OpenVulnPage(package.to_string()))
            .ok_or_else(|| Error::MissingArgument {
                command: name.to_string(),
                argument: "packageName".to_string(),
            }),
        other => Err(Error::UnknownCommand(other.to_string())),
    }
}
