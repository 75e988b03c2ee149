use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;

use toggl_connector::config::Config;
use toggl_connector::console::{ConsoleMarkdownList, ConsolePresenter};
use toggl_connector::entries_command::{EntriesArgs, EntriesCommand};
use toggl_connector::logger::setup_logger;
use toggl_connector::toggl::TogglClient;
use toggl_connector::watch_command::{watch_command, WatchArgs};

/// Togglのtime entryを取得・監視するためのCLIアプリケーション。
///
/// # Examples
/// ```
/// $ cargo run -- entries
/// $ cargo run -- watch --interval 30
/// ```
#[derive(Debug, Parser)]
#[clap(version, about)]
struct Args {
    #[clap(short = 'v', long = "verbose", help = "Enable debug logging")]
    verbose: bool,

    #[clap(subcommand)]
    subcommand: SubCommands,
}

/// サブコマンドを表す列挙型。
#[derive(Debug, Subcommand)]
enum SubCommands {
    Entries(EntriesArgs),
    Watch(WatchArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logger(if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    })?;
    let config = Config::from_env().context("Failed to load configuration")?;

    match args.subcommand {
        SubCommands::Entries(entries) => {
            let client = TogglClient::new(&config);
            let time_entries = EntriesCommand::new(&client).run(entries).await?;
            let mut stdout = std::io::stdout();
            ConsoleMarkdownList::new(&mut stdout).show_time_entries(&time_entries)?;
        }
        SubCommands::Watch(watch) => watch_command(watch, &config).await?,
    }

    Ok(())
}
