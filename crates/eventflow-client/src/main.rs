//! eventflow CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use eventflow_core::{EventDraft, TracingConfig, init_tracing};

use eventflow_client::cli::{Cli, Command, ConfigAction};
use eventflow_client::commands::events::EventEdits;
use eventflow_client::commands::{self, App};
use eventflow_client::config::ClientConfig;
use eventflow_client::error::ClientResult;
use eventflow_client::render;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing = if cli.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::cli()
    }
    .with_format(cli.log_format);
    if let Err(e) = init_tracing(tracing) {
        eprintln!("warning: logging disabled: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            if let Some(violations) = e.violations() {
                for line in render::format_violations(violations) {
                    eprintln!("{}", line);
                }
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let (config, source) = match cli.config {
        Some(ref path) => (ClientConfig::load_from(path)?, path.clone()),
        None => (ClientConfig::load()?, ClientConfig::default_path()),
    };
    let config = config.with_overrides(cli.api_url, cli.timeout);

    let command = match cli.command {
        Some(Command::Config { action }) => {
            return match action {
                ConfigAction::Dump => commands::config::dump(&config, &source),
                ConfigAction::Path => commands::config::path(&config, &source),
            };
        }
        Some(command) => command,
        None => Command::Upcoming {
            limit: 10,
            json: false,
        },
    };

    let app = App::connect(&config)?;
    let result = dispatch(&app, command).await;
    app.settle(result)
}

async fn dispatch(app: &App, command: Command) -> ClientResult<()> {
    use commands::{auth, events};

    match command {
        Command::Login { username, password } => auth::login(app, &username, &password).await,
        Command::Register {
            username,
            password,
            email,
        } => auth::register(app, &username, &password, email).await,
        Command::Logout => auth::logout(app),
        Command::Whoami => auth::whoami(app).await,
        Command::List { json } => events::list(app, json).await,
        Command::Upcoming { limit, json } => events::upcoming(app, limit, json).await,
        Command::Create {
            title,
            start,
            end,
            description,
            all_day,
            recurrence,
        } => {
            let mut draft = EventDraft::new(title, start, end).with_all_day(all_day);
            if let Some(description) = description {
                draft = draft.with_description(description);
            }
            draft.recurrence = recurrence.apply(draft.recurrence);
            events::create(app, draft).await
        }
        Command::Update {
            id,
            title,
            start,
            end,
            description,
            all_day,
            recurrence,
        } => {
            let edits = EventEdits {
                title,
                start,
                end,
                description,
                all_day,
                recurrence,
            };
            events::update(app, id, edits).await
        }
        Command::Move {
            id,
            from,
            start,
            end,
        } => events::reschedule(app, id, from, start, end).await,
        Command::Delete { id } => events::delete(app, id).await,
        Command::DeleteInstance { id, start } => events::delete_instance(app, id, start).await,
        // handled before connecting
        Command::Config { .. } => Ok(()),
    }
}
