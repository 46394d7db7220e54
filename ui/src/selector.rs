use config::{ConnectionConfig, ConnectionError, ConnectionMode, NetworkInput, resolve};
use std::io;

#[derive(Debug, thiserror::Error)]
pub enum SelectError {
    #[error(transparent)]
    Prompt(#[from] io::Error),
    #[error(transparent)]
    Config(ConnectionError),
}

/// Ask which database to use. Incomplete network details are warned about and
/// asked for again; a malformed host ends the selection with an error.
pub fn select_connection() -> Result<ConnectionConfig, SelectError> {
    let mode = ConnectionMode::ALL
        .into_iter()
        .fold(cliclack::select("Choose database"), |select, mode| {
            select.item(mode, mode.label(), "")
        })
        .interact()?;

    let mut input = NetworkInput::default();
    loop {
        if mode == ConnectionMode::Network {
            input = prompt_network(&input)?;
        }

        match resolve(mode, &input) {
            Ok(config) => return Ok(config),
            Err(err) if err.is_fatal() => return Err(SelectError::Config(err)),
            Err(err) => cliclack::log::warning(err)?,
        }
    }
}

fn prompt_network(previous: &NetworkInput) -> io::Result<NetworkInput> {
    let host = text_input("MySQL Host", "localhost", &previous.host)?;
    let user = text_input("MySQL User", "root", &previous.user)?;
    let password: String = cliclack::password("MySQL Password").mask('▪').interact()?;
    let database = text_input("MySQL Database", "student", &previous.database)?;

    Ok(NetworkInput {
        host,
        user,
        password,
        database,
    })
}

fn text_input(prompt: &str, placeholder: &str, previous: &str) -> io::Result<String> {
    let mut input = cliclack::input(prompt).placeholder(placeholder).required(false);
    if !previous.is_empty() {
        input = input.default_input(previous);
    }
    input.interact()
}
