//! Command dispatch: builds the client, runs one command, persists the
//! session.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use pan123_client::{ApiError, Client, DirectoryView, HttpTransport, LoginState, Session};
use pan123_drive::Drive;
use pan123_protocol::{Outcome, RemoteEntry, Report};
use pan123_transfer::{ProgressFn, format_size};
use serde::Serialize;

use crate::cli::{Cli, Command, slot};
use crate::config::Config;
use crate::render;

/// Runs the parsed command line against the live service.
pub async fn run(cli: Cli, mut config: Config, config_path: &Path) -> anyhow::Result<ExitCode> {
    let transport = Arc::new(HttpTransport::new()?);
    let client = Client::new(transport, Session::from_config(&config.session()));

    let code = execute(&client, &cli).await;

    let updated = client.session().to_config();
    if updated != config.session() {
        config.set_session(updated);
        config.save(config_path)?;
    }

    Ok(exit_code(code))
}

async fn execute(client: &Client, cli: &Cli) -> i32 {
    let json = cli.json;
    match &cli.command {
        Command::Login { user, password } => {
            client.update_session(|s| {
                if let Some(user) = user {
                    s.user_name = user.clone();
                }
                if let Some(password) = password {
                    s.password = password.clone();
                }
            });
            emit(outcome(client.login().await, "signed in"), json)
        }
        Command::Logout { forget } => {
            if *forget {
                client.clear_account();
            } else {
                client.logout();
            }
            emit(Outcome::ok("signed out", ()), json)
        }
        Command::Protocol { name } => {
            emit(outcome(client.set_protocol(name), "protocol switched"), json)
        }
        command => {
            if let Err(e) = prepare(client, &cli.cd).await {
                return emit(outcome::<(), _>(Err(e), ""), json);
            }
            authenticated(client, command, json).await
        }
    }
}

/// Commands that need a valid session and, optionally, a position in the
/// remote tree.
async fn authenticated(client: &Client, command: &Command, json: bool) -> i32 {
    let drive = Drive::new(client);
    match command {
        Command::Whoami => {
            let res = client.user_info().await;
            if !json && let Ok(info) = &res {
                println!("{} (uid {})", info.nickname, info.uid);
                println!(
                    "used {} of {}, {} files",
                    format_size(info.space_used),
                    format_size(info.space_permanent),
                    info.file_count
                );
                return 0;
            }
            emit(outcome(res, "account"), json)
        }
        Command::Ls { all } => {
            let res = list(client, *all).await;
            if !json && let Ok(view) = &res {
                println!("{}", client.cwd_path());
                render::print_entries(&view.items);
                println!("{} of {} loaded", view.items.len(), view.total);
                return 0;
            }
            emit(outcome(res, "listing"), json)
        }
        Command::Mkdir { name } => emit(outcome(client.mkdir(name).await, "folder created"), json),
        Command::Upload { path, name, policy } => {
            let cb = render::progress;
            let progress: Option<&ProgressFn> = if json { None } else { Some(&cb) };
            let res = drive
                .upload(path, name.as_deref(), client.cwd_id(), policy.policy(), progress)
                .await;
            if progress.is_some() {
                render::finish_progress();
            }
            emit(Outcome::from_result(res), json)
        }
        Command::Download { index, dir, policy } => {
            let entry = match loaded_entry(client, *index).await {
                Ok(e) => e,
                Err(e) => return emit(outcome::<(), _>(Err(e), ""), json),
            };
            let cb = render::progress;
            let progress: Option<&ProgressFn> = if json { None } else { Some(&cb) };
            let res = drive
                .download_entry(&entry, dir, policy.policy(), progress)
                .await;
            if progress.is_some() {
                render::finish_progress();
            }
            if let Err(e) = &res
                && let Some(path) = e.created_path()
            {
                eprintln!("partial download kept in {}", path.display());
            }
            emit(Outcome::from_result(res), json)
        }
        Command::Link { index } => {
            let res = match loaded_entry(client, *index).await {
                Ok(entry) => drive.resolve_direct_link(&entry).await,
                Err(e) => Err(e.into()),
            };
            if !json && let Ok(url) = &res {
                println!("{url}");
                return 0;
            }
            emit(outcome(res, "direct link"), json)
        }
        Command::Rm { index } => {
            let res = match ensure_loaded(client, slot(*index)).await {
                Ok(()) => client.trash_by_index(slot(*index)).await,
                Err(e) => Err(e),
            };
            let message = match &res {
                Ok(entry) => format!("moved {} to the recycle bin", entry.name),
                Err(_) => String::new(),
            };
            emit(outcome(res, &message), json)
        }
        Command::Share { indices, password } => {
            let slots: Vec<usize> = indices.iter().map(|&i| slot(i)).collect();
            let last = slots.iter().copied().max().unwrap_or_default();
            let res = match ensure_loaded(client, last).await {
                Ok(()) => client.share_by_indices(&slots, password).await,
                Err(e) => Err(e),
            };
            if !json && let Ok(link) = &res {
                println!("{}", link.url);
                if !link.password.is_empty() {
                    println!("extraction code: {}", link.password);
                }
                return 0;
            }
            emit(outcome(res, "share created"), json)
        }
        Command::Recycle => {
            let res = client.list_recycle().await;
            if !json && let Ok(entries) = &res {
                render::print_entries(entries);
                return 0;
            }
            emit(outcome(res, "recycle bin"), json)
        }
        Command::Restore { file_id } => {
            emit(outcome(client.restore(*file_id).await, "restored"), json)
        }
        Command::Login { .. } | Command::Logout { .. } | Command::Protocol { .. } => 0,
    }
}

/// Validates the session and walks the `--cd` path.
async fn prepare(client: &Client, cd: &[u64]) -> Result<(), ApiError> {
    let session = client.session();
    if !session.is_authenticated() && !session.has_credentials() {
        return Err(ApiError::Precondition(
            "not signed in; run `pan123 login --user <name> --password <password>`".into(),
        ));
    }
    if client.init_login_state().await? == LoginState::Relogged {
        tracing::info!("token refreshed");
    }

    client.refresh().await?;
    for &index in cd {
        ensure_loaded(client, slot(index)).await?;
        client.cd(slot(index)).await?;
    }
    Ok(())
}

/// Loads pages until `slot` is in the cache or the directory is exhausted.
async fn ensure_loaded(client: &Client, slot: usize) -> Result<(), ApiError> {
    loop {
        let view = client.file_list();
        if slot < view.items.len() || view.all_loaded {
            return Ok(());
        }
        client.load_more().await?;
    }
}

async fn loaded_entry(client: &Client, index: u64) -> Result<RemoteEntry, ApiError> {
    ensure_loaded(client, slot(index)).await?;
    client.entry_at(slot(index))
}

async fn list(client: &Client, all: bool) -> Result<DirectoryView, ApiError> {
    let mut view = client.file_list();
    while all && !view.all_loaded {
        view = client.load_more().await?;
    }
    Ok(view)
}

fn outcome<T, E: Report>(result: Result<T, E>, message: &str) -> Outcome<T> {
    match result {
        Ok(data) => Outcome::ok(message, data),
        Err(e) => Outcome::failure(e.code(), e.message()),
    }
}

fn emit<T: Serialize>(outcome: Outcome<T>, json: bool) -> i32 {
    render::print_outcome(&outcome, json);
    outcome.code
}

/// `0` success, `2` advisory, `1` failure.
fn exit_code(code: i32) -> ExitCode {
    match code {
        0 => ExitCode::SUCCESS,
        c if c > 0 => ExitCode::from(2),
        _ => ExitCode::FAILURE,
    }
}
