pub mod config;
pub mod follow;

use clap::{Parser, Subcommand};

use crate::{
    api::TwitterClient,
    config::Config as Credentials,
    error::Result,
    usage,
    utils::gracefully_exit,
};

use self::follow::FollowArgs;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None, author)]
pub struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Follow back a number of your followers.
    Follow(FollowArgs),

    /// Ask Twitter who the authenticating user is
    Whoami {},

    /// Rate limits of the followers endpoints
    Usage {},

    /// Manage config
    Config {
        /// init the config file
        #[arg(long)]
        init: bool,

        /// Open the config in an editor
        #[arg(long, short)]
        edit: bool,

        /// Show the config file.
        #[arg(long)]
        show: bool,

        /// Validate config
        #[arg(long)]
        validate: bool,

        /// Print where the config file lives
        #[arg(long)]
        path: bool,
    },
}

pub async fn run() {
    let args = Args::parse();

    let result = match args.command {
        Commands::Follow(follow_args) => follow::run(follow_args).await,
        Commands::Whoami {} => whoami().await,
        Commands::Usage {} => usage::show().await,
        Commands::Config {
            init,
            edit,
            show,
            validate,
            path,
        } => {
            if edit {
                config::edit()
            } else if show {
                config::show()
            } else if init {
                config::init()
            } else if validate {
                config::validate()
            } else if path {
                config::path()
            } else {
                Args::parse_from(["", "config", "--help"]);
                Ok(())
            }
        }
    };

    if let Err(err) = result {
        gracefully_exit(&format!("Error: {err}"));
    }
}

async fn whoami() -> Result<()> {
    let cfg = Credentials::load()?;
    cfg.validate()?;
    let client = TwitterClient::new(&cfg)?;
    let me = client.verify_credentials().await?;
    println!("{}", serde_json::to_string_pretty(&me)?);
    Ok(())
}
