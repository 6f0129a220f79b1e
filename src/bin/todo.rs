use std::process::ExitCode;

use clap::{Parser, Subcommand};

use todo_backend::client::{ClientError, ExecutionContext, TodoClient};
use todo_backend::models::Todo;

#[derive(Parser)]
#[command(name = "todo", about = "Manage todos through the todo API")]
struct Cli {
    /// API base URL. Defaults to API_BASE_URL_INTERNAL or the internal service address.
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List todos, newest first
    List,
    /// Add a todo
    Add { title: String },
    /// Flip a todo between done and not done
    Toggle { id: i64 },
    /// Delete a todo
    Rm { id: i64 },
    /// Check that the API is up
    Health,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    todo_backend::init_tracing("warn");

    let cli = Cli::parse();
    let client = match &cli.base_url {
        Some(url) => TodoClient::with_base_url(url.as_str()),
        None => TodoClient::new(&ExecutionContext::Server),
    };

    let result = match client {
        Ok(client) => run(&client, cli.command).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!("command failed: {}", e);
            eprintln!("error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(client: &TodoClient, command: Command) -> Result<(), ClientError> {
    match command {
        Command::List => {
            let todos = client.list().await?;
            if todos.is_empty() {
                println!("No todos yet.");
            }
            for todo in &todos {
                println!("{}", format_todo(todo));
            }
            if !todos.is_empty() {
                println!("{}", format_summary(&todos));
            }
        }
        Command::Add { title } => {
            let todo = client.create(&title).await?;
            println!("{}", format_todo(&todo));
        }
        Command::Toggle { id } => {
            let current = client
                .list()
                .await?
                .into_iter()
                .find(|t| t.id == id)
                .ok_or_else(|| ClientError::InvalidInput(format!("Todo {} not found", id)))?;
            let todo = client.toggle(id, current.completed).await?;
            println!("{}", format_todo(&todo));
        }
        Command::Rm { id } => {
            client.delete(id).await?;
            println!("Deleted {}", id);
        }
        Command::Health => {
            let health = client.health().await?;
            println!("{} (uptime {:.0}s)", health.status, health.uptime);
        }
    }
    Ok(())
}

fn format_todo(todo: &Todo) -> String {
    let mark = if todo.completed { "x" } else { " " };
    let created = todo.created_at.with_timezone(&chrono::Local);
    format!(
        "[{}] {} {} (created {})",
        mark,
        todo.id,
        todo.title,
        created.format("%Y-%m-%d %H:%M")
    )
}

fn format_summary(todos: &[Todo]) -> String {
    let completed = todos.iter().filter(|t| t.completed).count();
    format!("{} todos total, {} completed", todos.len(), completed)
}
