use clap::{Parser, Subcommand};
use colored::Colorize;
use creatorverse_lib::{Error, Repository};
use sysexits::ExitCode;
use tracing::{Level, error};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod config;
mod creator;
mod watch;

#[derive(Parser, Debug)]
#[command(name = "creatorverse")]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// List all creators, newest first
    List,
    /// Show a single creator
    Show { id: i64 },
    /// Add a new creator
    Add(creator::AddArgs),
    /// Edit an existing creator
    Edit(creator::EditArgs),
    /// Delete a creator
    Delete {
        id: i64,
        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Print the creator list every time it changes
    Watch,
    /// Show or change the connection settings
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    // Human friendly panicking in release mode
    human_panic::setup_panic!();

    // Logging goes to stderr so it never mixes with command output
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::TRACE)
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Unable to set up logging: {e}");
    }

    let cli = Cli::parse();

    // Works without a configured backend
    if let Command::Config(args) = &cli.command {
        return match config::run(args) {
            Ok(()) => ExitCode::Ok,
            Err(e) => report(&e),
        };
    }

    let repo = match Repository::load() {
        Ok(repo) => repo,
        Err(e) => return report(&e),
    };

    let result = match &cli.command {
        Command::List => creator::list(&repo).await,
        Command::Show { id } => creator::show(&repo, (*id).into()).await,
        Command::Add(args) => creator::add(&repo, args).await,
        Command::Edit(args) => creator::edit(&repo, args).await,
        Command::Delete { id, yes } => creator::delete(&repo, (*id).into(), *yes).await,
        Command::Watch => watch::run(&repo).await,
        Command::Config(_) => Ok(()),
    };

    match result {
        Ok(()) => ExitCode::Ok,
        Err(e) => report(&e),
    }
}

fn report(err: &Error) -> ExitCode {
    error!("{err}");
    eprintln!("{}", err.to_string().red());

    match err {
        Error::Validation(_) => ExitCode::DataErr,
        Error::NotFound(_) => ExitCode::NoInput,
        Error::Config(_) => ExitCode::Config,
        Error::LoadList(_)
        | Error::Load(_)
        | Error::Add(_)
        | Error::Update(_)
        | Error::Delete(_)
        | Error::Feed(_) => ExitCode::Unavailable,
    }
}
