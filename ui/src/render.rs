use chat::{AgentEvent, Message, Role};
use colored::Colorize;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use db::DatabaseResult;
use std::io::{self, Write};

pub const TITLE: &str = "Chat with your SQL database";

/// Redraw the whole page: title, connection banner and every transcript message in order.
pub fn page(dialect: &str, messages: &[Message]) -> io::Result<()> {
    cliclack::clear_screen()?;
    cliclack::intro(format!("💬 {}", TITLE.bold()))?;
    cliclack::log::remark(format!(
        "Connected to {dialect}. Type /clear to reset the chat, /quit to leave."
    ))?;

    for message in messages {
        println!("{}\n", format_message(message));
    }
    Ok(())
}

/// Print one message below whatever is already on screen.
pub fn message(message: &Message) {
    println!("\n{}\n", format_message(message));
}

pub fn format_message(message: &Message) -> String {
    match message.role {
        Role::User => format!("{} {}", "[You]".green().bold(), message.content),
        Role::Assistant => format!("{} {}", "[Assistant]".blue().bold(), message.content),
    }
}

pub fn results_table(result: &DatabaseResult) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(result.column_names());

    for row in &result.rows {
        table.add_row(row.iter().map(db::cell_text));
    }
    table
}

/// Live display of what the agent is doing while it answers.
pub fn event(event: &AgentEvent) {
    match event {
        AgentEvent::Thought(text) => {
            print!("{}", text.blue());
            let _ = io::stdout().flush();
        }
        AgentEvent::Action { tool, input } => {
            println!("\n{} {} {}", "▶".yellow(), tool.yellow().bold(), input.dimmed());
        }
        AgentEvent::Observation {
            table: Some(table), ..
        } => println!("{}", results_table(table)),
        AgentEvent::Observation { output, .. } => println!("{}", output.dimmed()),
    }
}
