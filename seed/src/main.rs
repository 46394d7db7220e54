use anyhow::Context;
use config::SqlChatConfig;
use db::seed::{self, STUDENT_SEED};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    // Same resolution as the chat app, so it finds the file created here.
    let conf = SqlChatConfig::get_or_default();
    let path = db::local_database_path(&conf.database.local_file);
    tracing::info!(path = %path.display(), "seeding local database");

    let pool = seed::open_writable(&path)
        .await
        .with_context(|| format!("Couldn't open {}", path.display()))?;

    let result = seed::seed(&pool, &STUDENT_SEED).await;
    pool.close().await;
    let records = result.with_context(|| format!("Couldn't seed the {} table", STUDENT_SEED.table))?;

    println!("The inserted records are");
    for row in &records.rows {
        println!("{}", db::format_tuple(row));
    }

    Ok(())
}
