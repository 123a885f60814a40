use clap::{Args, Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use paygate::application::gateway::GatewaySessionAdapter;
use paygate::application::initiator::{Handoff, RenewalRequest, TransactionInitiator};
use paygate::application::resolver::{Landing, OutcomeResolver};
use paygate::config::{CheckoutConfig, LogFormat};
use paygate::domain::checkout::{CheckoutEvent, OutcomeSource, ReturnParams};
use paygate::domain::pending::{PendingTransaction, Slot};
use paygate::domain::ports::{BackendRef, StashRef};
use paygate::domain::subject::{OrderTag, SubjectType};
use paygate::infrastructure::hosted_checkout::HostedCheckout;
use paygate::infrastructure::http::HttpBackend;
use paygate::infrastructure::json_file::JsonFileStash;
use paygate::interfaces::console::{ConsoleNavigator, OutcomeReport};
use paygate::interfaces::draft_file::DraftFile;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// File holding pending transactions between runs
    #[arg(long, global = true, default_value = ".paygate-stash.json")]
    stash: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the account type encoded in an order id
    Classify { order_id: String },
    /// Register an agent or service provider and open the checkout
    Begin {
        #[arg(long)]
        subject: SubjectType,
        /// JSON draft with form fields and attachment paths
        #[arg(long)]
        draft: PathBuf,
    },
    /// Renew the subscription of an existing account
    Renew {
        #[arg(long)]
        subject: SubjectType,
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        email: String,
    },
    /// Verify a returning checkout and print the outcome
    Resolve(ResolveArgs),
    /// Show the pending transaction of a slot
    Pending(SlotArgs),
    /// Forget the pending transaction of a slot
    Restart(SlotArgs),
}

#[derive(Args)]
struct ResolveArgs {
    /// Full return URL carrying `order_id` and `tempId`
    #[arg(long, conflicts_with_all = ["order_id", "temp_id"])]
    return_url: Option<String>,
    #[arg(long)]
    order_id: Option<String>,
    #[arg(long)]
    temp_id: Option<String>,
    /// Account type of the landing page, if it has one
    #[arg(long)]
    subject: Option<SubjectType>,
    /// Resolve on the renewal landing page
    #[arg(long)]
    renewal: bool,
}

#[derive(Args)]
struct SlotArgs {
    #[arg(long)]
    subject: SubjectType,
    #[arg(long)]
    renewal: bool,
}

impl SlotArgs {
    fn slot(&self) -> Slot {
        if self.renewal {
            Slot::Renewal
        } else {
            Slot::Registration(self.subject)
        }
    }
}

fn init_logging(config: &CheckoutConfig) {
    let filter = EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match config.logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn open_stash(cli: &Cli) -> Result<StashRef> {
    if let Some(db_path) = &cli.db_path {
        #[cfg(feature = "storage-rocksdb")]
        {
            let stash = paygate::infrastructure::rocksdb::RocksDBStash::open(db_path).into_diagnostic()?;
            return Ok(Arc::new(stash));
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        {
            let _ = db_path;
            eprintln!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to file storage."
            );
        }
    }
    Ok(Arc::new(JsonFileStash::new(&cli.stash)))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    Ok(())
}

fn print_handoff(handoff: &Handoff) -> Result<()> {
    let checkout_url = match &handoff.event {
        CheckoutEvent::Redirected { checkout_url } => Some(checkout_url.as_str()),
        _ => None,
    };
    print_json(&serde_json::json!({
        "tempId": handoff.receipt.temp_id,
        "orderId": handoff.receipt.order_id,
        "paymentSessionId": handoff.receipt.session_token,
        "checkoutUrl": checkout_url,
    }))
}

fn base_dir(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new("."))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = CheckoutConfig::load(cli.config.as_deref()).into_diagnostic()?;
    init_logging(&config);

    match &cli.command {
        Command::Classify { order_id } => {
            match OrderTag::parse(order_id) {
                Some(tag) => println!("{} {}", tag.subject, tag.kind),
                None => println!("unknown"),
            }
            return Ok(());
        }
        Command::Pending(args) => {
            let stash = open_stash(&cli)?;
            let record = PendingTransaction::load(stash.as_ref(), args.slot())
                .await
                .into_diagnostic()?;
            return print_json(&record);
        }
        Command::Restart(args) => {
            let stash = open_stash(&cli)?;
            PendingTransaction::clear(stash.as_ref(), args.slot())
                .await
                .into_diagnostic()?;
            println!("cleared");
            return Ok(());
        }
        _ => {}
    }

    let stash = open_stash(&cli)?;
    let backend: BackendRef = Arc::new(HttpBackend::new(config.backend.clone()).into_diagnostic()?);

    match &cli.command {
        Command::Begin { subject, draft } => {
            let draft = DraftFile::read(draft)
                .await
                .into_diagnostic()?
                .into_draft(base_dir(draft))
                .await
                .into_diagnostic()?;
            let handoff = initiator(&config, backend, stash)
                .begin(draft, *subject)
                .await
                .into_diagnostic()?;
            print_handoff(&handoff)
        }
        Command::Renew {
            subject,
            user_id,
            email,
        } => {
            let renewal = RenewalRequest {
                user_id: user_id.clone(),
                subject: *subject,
                email: email.clone(),
            };
            let handoff = initiator(&config, backend, stash)
                .begin_renewal(renewal)
                .await
                .into_diagnostic()?;
            print_handoff(&handoff)
        }
        Command::Resolve(args) => {
            let params = match &args.return_url {
                Some(url) => ReturnParams::from_url(url).into_diagnostic()?,
                None => ReturnParams {
                    order_id: args.order_id.clone(),
                    temp_id: args.temp_id.clone(),
                },
            };
            let landing = if args.renewal {
                Landing::renewal()
            } else {
                Landing::registration(args.subject)
            };
            let resolver = OutcomeResolver::new(
                backend,
                stash,
                Arc::new(ConsoleNavigator::new(config.pages.clone())),
                landing,
                config.pages.countdown(),
            );
            let outcome = resolver.resolve(OutcomeSource::Redirect(params)).await;
            print_json(&OutcomeReport::new(&outcome, &config.pages))?;
            // Success counts down to the login page before exiting.
            resolver.settle().await;
            Ok(())
        }
        Command::Classify { .. } | Command::Pending(_) | Command::Restart(_) => Ok(()),
    }
}

fn initiator(config: &CheckoutConfig, backend: BackendRef, stash: StashRef) -> TransactionInitiator {
    let widget = Arc::new(HostedCheckout::new(config.gateway.clone()));
    let gateway = Arc::new(GatewaySessionAdapter::new(
        widget,
        config.gateway.session_prefix.clone(),
    ));
    TransactionInitiator::new(backend, stash, gateway, config.gateway.mode)
}
