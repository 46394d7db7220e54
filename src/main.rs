use ai::LLM;
use anyhow::Result;
use chat::{ChatSession, SqlAgent};
use config::SqlChatConfig;
use std::path::Path;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Log to a file so the output does not interleave with the prompts.
fn init_tracing(log_level: &str, log_file: &Path) -> WorkerGuard {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let parent = log_file.parent().unwrap_or_else(|| Path::new("."));
    let filename = log_file.file_name().unwrap_or_default();
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(parent, filename));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .init();

    guard
}

/// Log a startup failure and close the page. Returning the error from `main`
/// keeps the log guard alive until it has been flushed.
fn fatal(err: impl std::error::Error + Send + Sync + 'static) -> anyhow::Error {
    error!(error = %err, "cannot start the chat");
    let _ = cliclack::outro_cancel(&err);
    err.into()
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let conf = SqlChatConfig::get_or_default();
    let _guard = init_tracing(&conf.log.level, &conf.log.file_path());

    cliclack::clear_screen()?;
    cliclack::intro(ui::render::TITLE)?;

    let api_key = conf.ai.api_key().map_err(fatal)?;
    let connection = ui::select_connection().map_err(fatal)?;

    let local_path = db::local_database_path(&conf.database.local_file);
    let database = db::connect(&connection, &local_path)
        .await
        .map_err(fatal)?;

    let llm = LLM::new(&conf.ai, api_key);
    let mut session = ChatSession::new(SqlAgent::new(llm, database, conf.agent.clone()));
    info!(dialect = session.dialect(), model = %conf.ai.model, "session started");

    ui::render::page(session.dialect(), session.messages())?;
    loop {
        let Ok(input) = cliclack::input("Ask a question about the database").interact::<String>() else {
            break;
        };

        let command = ui::Command::parse(&input);
        match command {
            ui::Command::Quit => break,
            ui::Command::Nothing => continue,
            ui::Command::Clear => session.reset(),
            ui::Command::Ask(question) => {
                // Failed turns are recorded in the transcript like answers.
                let _ = session.exchange(question, |event| ui::render::event(&event)).await;
                if let Some(reply) = session.messages().last() {
                    ui::render::message(reply);
                }
            }
        }

        if command.redraws_page() {
            ui::render::page(session.dialect(), session.messages())?;
        }
    }

    cliclack::outro("Bye!")?;
    Ok(())
}
