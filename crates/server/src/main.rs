#![forbid(unsafe_code)]

use serde_json::json;
use std::io::BufRead as _;
use std::path::PathBuf;
use vt_server::rpc::{RpcServer, run_stdio};
use vt_server::{AdminAccount, ServerConfig, TaskService, telemetry};
use vt_storage::migrations::MigrationRegistry;
use vt_storage::{OpenOptions, SqliteStore};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

fn usage() -> &'static str {
    "vt_server - VoxTask task service (newline JSON-RPC over stdio)\n\n\
USAGE:\n\
  vt_server [serve] [--storage-dir DIR]\n\
  vt_server migrate [--storage-dir DIR]\n\
  vt_server create-admin --email EMAIL --name NAME [--password PASSWORD] [--storage-dir DIR]\n\
\n\
FLAGS:\n\
  -h, --help       Print this help and exit\n\
  -V, --version    Print version and exit\n\
\n\
ENV:\n\
  VOXTASK_CONFIG_PATH      KEY=VALUE file read before the environment\n\
  VOXTASK_STORAGE_DIR      Store directory (default .voxtask)\n\
  VOXTASK_BUSY_TIMEOUT_MS  SQLite busy timeout (default 5000)\n\
  VOXTASK_LOG              Default log filter; RUST_LOG overrides\n\
\n\
NOTES:\n\
  - create-admin reads the password from stdin when --password is omitted\n"
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Help,
    Version,
    Serve,
    Migrate,
    CreateAdmin {
        email: String,
        name: String,
        password: Option<String>,
    },
}

#[derive(Debug)]
struct Cli {
    command: Command,
    storage_dir: Option<PathBuf>,
}

impl Cli {
    fn bare(command: Command) -> Self {
        Self {
            command,
            storage_dir: None,
        }
    }
}

/// Help and version are recognized only in flag position, never as the value of another flag.
fn parse_cli(args: &[String]) -> Result<Cli, String> {
    let mut subcommand: Option<String> = None;
    let mut storage_dir = None;
    let mut email = None;
    let mut name = None;
    let mut password = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--storage-dir" | "--email" | "--name" | "--password" => {
                let Some(value) = iter.next() else {
                    return Err(format!("{arg} requires a value"));
                };
                match arg.as_str() {
                    "--storage-dir" => storage_dir = Some(PathBuf::from(value)),
                    "--email" => email = Some(value.clone()),
                    "--name" => name = Some(value.clone()),
                    _ => password = Some(value.clone()),
                }
            }
            "-h" | "--help" => return Ok(Cli::bare(Command::Help)),
            "-V" | "--version" => return Ok(Cli::bare(Command::Version)),
            flag if flag.starts_with('-') => return Err(format!("unknown flag {flag}")),
            word => {
                if subcommand.is_some() {
                    return Err(format!("unexpected argument {word}"));
                }
                subcommand = Some(word.to_string());
            }
        }
    }

    let command = match subcommand.as_deref() {
        None | Some("serve") => Command::Serve,
        Some("migrate") => Command::Migrate,
        Some("create-admin") => Command::CreateAdmin {
            email: email.ok_or("create-admin requires --email")?,
            name: name.ok_or("create-admin requires --name")?,
            password,
        },
        Some(other) => return Err(format!("unknown command {other}")),
    };

    Ok(Cli {
        command,
        storage_dir,
    })
}

fn startup_error(code: &str, detail: &dyn std::fmt::Display) -> ! {
    tracing::error!(code, error = %detail, "startup failed");
    eprintln!("STARTUP_ERROR {code} {detail}");
    std::process::exit(1);
}

fn main() {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let cli = match parse_cli(&args) {
        Ok(cli) => cli,
        Err(message) => {
            eprintln!("error: {message}\n\n{}", usage());
            std::process::exit(2);
        }
    };
    match cli.command {
        Command::Help => {
            print!("{}", usage());
            return;
        }
        Command::Version => {
            println!("vt_server {SERVER_VERSION}");
            return;
        }
        _ => {}
    }

    let config = match ServerConfig::load(cli.storage_dir) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("STARTUP_ERROR {err}");
            std::process::exit(1);
        }
    };
    telemetry::init_tracing(&config.log_filter);

    let registry = match MigrationRegistry::builtin() {
        Ok(registry) => registry,
        Err(err) => startup_error(err.code(), &err),
    };
    let options = OpenOptions {
        busy_timeout: config.busy_timeout,
        registry,
    };
    // Opening runs the migration sweep; nothing is served until it succeeds.
    let store = match SqliteStore::open_with(&config.storage_dir, options) {
        Ok(store) => store,
        Err(err) if err.is_migration_failure() => startup_error("MIGRATION_FAILURE", &err),
        Err(err) => startup_error(err.code(), &err),
    };
    let report = store.migration_report().clone();
    tracing::info!(
        storage_dir = %config.storage_dir.display(),
        from_version = report.from_version,
        to_version = report.to_version,
        applied = report.applied.len(),
        "store ready"
    );

    match cli.command {
        Command::Help | Command::Version => {}
        Command::Migrate => {
            println!(
                "{}",
                json!({
                    "schemaVersion": report.to_version,
                    "fromVersion": report.from_version,
                    "applied": report.applied,
                })
            );
        }
        Command::CreateAdmin {
            email,
            name,
            password,
        } => {
            let password = match password {
                Some(password) => password,
                None => read_password_line(),
            };
            let service = TaskService::new(store);
            match service.create_admin(AdminAccount {
                email,
                name,
                password,
            }) {
                Ok(admin) => {
                    tracing::info!(user_id = %admin.id, "admin created");
                    println!("{}", json!({ "id": admin.id, "email": admin.email }));
                }
                Err(err) => {
                    eprintln!("ERROR {} {err}", err.code());
                    std::process::exit(1);
                }
            }
        }
        Command::Serve => {
            let server = RpcServer::new(TaskService::new(store));
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            if let Err(err) = run_stdio(&server, stdin.lock(), stdout.lock()) {
                tracing::error!(error = %err, "stdio transport failed");
                std::process::exit(1);
            }
        }
    }
}

fn read_password_line() -> String {
    let mut line = String::new();
    if let Err(err) = std::io::stdin().lock().read_line(&mut line) {
        eprintln!("ERROR IO failed to read password: {err}");
        std::process::exit(1);
    }
    line.trim_end_matches(['\r', '\n']).to_string()
}
