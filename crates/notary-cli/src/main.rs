use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use notary::{FsContentStore, LocalLedger, LocalWallet, NotaryConfig, WalletContext};
use notary_sqlite::SqliteBook;
use tracing::debug;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "notary")]
#[command(about = "Store documents off-chain and attest their root hash on a ledger")]
#[command(version)]
struct Args {
    /// JSON config file (defaults, then this file, then NOTARY_* variables)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the content store and ledger database
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level or filter directive (debug, info, warn, error, notary=debug)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a file to the content store and print its root hash
    Upload { file: PathBuf },

    /// Download the content stored under a root hash
    Download {
        root_hash: String,
        /// Output path (defaults to the root hash in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Upload a file, attest it, and wait for the record
    Notarize {
        file: PathBuf,
        /// Free-text description stored with the record
        #[arg(short, long, default_value = "")]
        label: String,
    },

    /// Look up the ledger record for a root hash
    Verify {
        root_hash: String,
        /// Base URL for a shareable verification link
        #[arg(long)]
        link: Option<String>,
    },

    /// List records registered by an account, most recent first
    List {
        /// Account address (defaults to the configured wallet)
        #[arg(long)]
        owner: Option<String>,
    },

    /// Print the number of registered records
    Count,

    /// Print the configured wallet address
    Address,

    /// Print records as they are registered
    Watch {
        /// Start with every existing record
        #[arg(long)]
        all: bool,
    },
}

/// Everything a command needs, built once from the resolved config.
pub struct Session {
    pub config: NotaryConfig,
    pub store: Arc<FsContentStore>,
    pub ledger: Arc<LocalLedger<SqliteBook>>,
    pub wallet: WalletContext,
    pub json: bool,
}

impl Session {
    async fn open(config: NotaryConfig, json: bool) -> Result<Self, Box<dyn std::error::Error>> {
        tokio::fs::create_dir_all(&config.data_dir).await?;
        let store = Arc::new(FsContentStore::open(config.blob_dir()).await?);
        let book = SqliteBook::open(config.ledger_path())?;
        let ledger = Arc::new(LocalLedger::new(
            book,
            config.chain.chain_id,
            config.contract(),
        ));

        let mut wallet = WalletContext::new(config.chain.clone());
        if let Some(key) = &config.private_key {
            wallet.connect(Arc::new(LocalWallet::from_hex(key)?));
        }

        Ok(Self {
            config,
            store,
            ledger,
            wallet,
            json,
        })
    }
}

fn load_config(args: &Args) -> Result<NotaryConfig, notary::Error> {
    let mut config = match &args.config {
        Some(path) => NotaryConfig::load(path)?,
        None => NotaryConfig::default(),
    };
    config.apply_env()?;
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // RUST_LOG, when set, takes precedence over --log-level
    notary::tracing::init_with_filter(&args.log_level);

    let config = load_config(&args)?;
    debug!(
        "chain {} ({}), data dir {}",
        config.chain.chain_id,
        config.chain.name,
        config.data_dir.display()
    );
    let session = Session::open(config, args.json).await?;

    match args.command {
        Command::Upload { file } => commands::upload(&session, &file).await,
        Command::Download { root_hash, output } => {
            commands::download(&session, &root_hash, output).await
        }
        Command::Notarize { file, label } => commands::notarize(&session, &file, &label).await,
        Command::Verify { root_hash, link } => {
            commands::verify(&session, &root_hash, link.as_deref()).await
        }
        Command::List { owner } => commands::list(&session, owner.as_deref()).await,
        Command::Count => commands::count(&session).await,
        Command::Address => commands::address(&session),
        Command::Watch { all } => commands::watch(&session, all).await,
    }
}
