//! sword-depositor CLI
//!
//! Batch SWORD deposit assistant for editorial platforms

use anyhow::Result;
use clap::{Parser, Subcommand};
use secrecy::SecretString;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use sword_depositor::{
    BatchDepositRequest, BatchDepositor, BatchReport, ConfigLoader, DepositCredentials,
    DepositFlags, DepositManifest, DepositOutcome, DepositPointSource, FilePackageBuilder,
    JsonStatementStore, StatementStore, SwordClient,
    core::traits::DepositClient as _,
};
use tracing_subscriber::EnvFilter;

/// Default statement store location
const DEFAULT_STORE_FILE: &str = ".sword-statements.json";

/// Starter configuration written by `init`
const STARTER_CONFIG: &str = r#"version: "1.0"
context_id: 1
deposit_points:
  - id: 1
    name: Institutional Repository
    url: https://repo.example.edu/sword/deposit/collection
    username: depositor
    # expanded from the environment at load time
    password: ${SWORD_PASSWORD}
    kind: manager
defaults:
  include_editorial: false
  include_galleys: true
timeout_secs: 30
"#;

/// Batch SWORD deposit assistant
#[derive(Parser)]
#[command(name = "sword-depositor")]
#[command(version = "0.1.0")]
#[command(about = "Deposit publications into SWORD repositories", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a batch deposit from a manifest
    Deposit {
        /// Deposit manifest (publications and their package payloads)
        #[arg(value_name = "MANIFEST")]
        manifest: PathBuf,

        /// Deposit point id to submit to
        #[arg(short = 'd', long)]
        deposit_point: i64,

        /// Publication ids to deposit (defaults to every manifest entry)
        #[arg(long = "publication")]
        publications: Vec<i64>,

        /// Username for the deposit point (defaults to the stored one)
        #[arg(long)]
        username: Option<String>,

        /// Password for the deposit point (defaults to the stored one)
        #[arg(long)]
        password: Option<String>,

        /// API key for the deposit point
        #[arg(long)]
        api_key: Option<String>,

        /// Include editorial metadata files
        #[arg(long)]
        include_editorial: bool,

        /// Include galley files
        #[arg(long)]
        include_galleys: bool,

        /// Configuration file (defaults to ./.sword-deposit.yaml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Statement store file
        #[arg(long, default_value = DEFAULT_STORE_FILE)]
        store: PathBuf,
    },

    /// Show recorded statement references for publications
    Status {
        /// Publication ids to inspect
        #[arg(long = "publication", required = true)]
        publications: Vec<i64>,

        /// Dereference each statement IRI against the repository
        #[arg(long)]
        fetch: bool,

        /// Configuration file (defaults to ./.sword-deposit.yaml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Statement store file
        #[arg(long, default_value = DEFAULT_STORE_FILE)]
        store: PathBuf,
    },

    /// Validate the configuration file
    Check {
        /// Configuration file (defaults to ./.sword-deposit.yaml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Write a starter configuration file
    Init {
        /// Target path (defaults to ./.sword-deposit.yaml)
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,

        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("sword_depositor=warn")),
        )
        .init();

    let result = run().await;

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("\n❌ Error");
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Deposit {
            manifest,
            deposit_point,
            publications,
            username,
            password,
            api_key,
            include_editorial,
            include_galleys,
            config,
            store,
        } => {
            let config = ConfigLoader::load(config.as_deref()).await?;
            let validation = ConfigLoader::validate(&config);
            if !validation.valid {
                eprintln!("{}", ConfigLoader::format_validation_result(&validation));
                return Ok(1);
            }

            let manifest = DepositManifest::load(&manifest).await?;
            let publication_ids = if publications.is_empty() {
                manifest.publication_ids()
            } else {
                publications
            };

            let flags = DepositFlags {
                include_editorial: include_editorial || config.defaults.include_editorial,
                include_galleys: include_galleys || config.defaults.include_galleys,
            };
            let credentials = DepositCredentials::new(
                username,
                password.map(|p| SecretString::new(p.into())),
                api_key.map(|k| SecretString::new(k.into())),
            );

            let client = Arc::new(SwordClient::new(Duration::from_secs(config.timeout_secs))?);
            let registry = Arc::new(config.registry());
            let statement_store = Arc::new(JsonStatementStore::new(store));
            let source = Arc::new(manifest.clone());
            let builder = Arc::new(FilePackageBuilder::new(manifest));

            let depositor =
                BatchDepositor::new(source, registry, builder, client, statement_store);

            let report = depositor
                .run_batch(BatchDepositRequest {
                    context_id: config.context_id,
                    publication_ids,
                    deposit_point_id: deposit_point,
                    credentials,
                    flags,
                })
                .await;

            print_report(&report);
            Ok(if report.is_all_success() { 0 } else { 1 })
        }

        Commands::Status {
            publications,
            fetch,
            config,
            store,
        } => {
            let config = ConfigLoader::load(config.as_deref()).await?;
            let registry = config.registry();
            let statement_store = JsonStatementStore::new(store);
            let client = SwordClient::new(Duration::from_secs(config.timeout_secs))?;

            let mut exit_code = 0;
            for publication_id in publications {
                println!("\n📄 Publication {}", publication_id);

                let record = statement_store.record(publication_id).await?;
                if record.is_empty() {
                    println!("   no deposits recorded");
                    continue;
                }

                for (deposit_point_id, href) in record.iter() {
                    let point = registry.by_id(deposit_point_id, config.context_id).await?;
                    let name = point
                        .as_ref()
                        .map(|p| p.name.clone())
                        .unwrap_or_else(|| format!("deposit point #{}", deposit_point_id));
                    println!("   {} -> {}", name, href);

                    if fetch {
                        let Some(point) = point else {
                            println!("      ⚠️  not in configuration, cannot fetch");
                            continue;
                        };
                        let credentials = DepositCredentials::default().resolve(&point);
                        match client.fetch_statement(href, &credentials).await {
                            Ok(body) => {
                                println!("      ✅ statement reachable ({} bytes)", body.len())
                            }
                            Err(e) => {
                                println!("      ❌ {}", e);
                                exit_code = 1;
                            }
                        }
                    }
                }
            }

            println!();
            Ok(exit_code)
        }

        Commands::Check { config } => {
            let config = ConfigLoader::load(config.as_deref()).await?;
            let validation = ConfigLoader::validate(&config);
            println!("{}", ConfigLoader::format_validation_result(&validation));
            Ok(if validation.valid { 0 } else { 1 })
        }

        Commands::Init { path, force } => {
            let path = path.unwrap_or_else(|| {
                PathBuf::from(sword_depositor::core::config_loader::CONFIG_FILENAME)
            });

            if path.exists() && !force {
                eprintln!(
                    "❌ {} already exists (use --force to overwrite)",
                    path.display()
                );
                return Ok(1);
            }

            tokio::fs::write(&path, STARTER_CONFIG).await?;
            println!("📝 Wrote {}", path.display());
            Ok(0)
        }
    }
}

/// Render the structured batch report for the operator
fn print_report(report: &BatchReport) {
    println!("\n{}", "=".repeat(60));
    println!("📊 Deposit Batch Summary ({})", report.batch_id);
    println!("{}", "=".repeat(60));

    println!("\n✅ Deposited: {}", report.successes().count());
    for outcome in report.successes() {
        if let DepositOutcome::Success {
            publication_id,
            deposit_id,
            statement_href,
        } = outcome
        {
            println!("   - publication {} ({})", publication_id, deposit_id);
            println!("     statement: {}", statement_href);
        }
    }

    let failure_count = report.failures().count();
    if failure_count > 0 {
        println!("\n❌ Failed: {}", failure_count);
        for outcome in report.failures() {
            if let DepositOutcome::Failure {
                title,
                message,
                code,
            } = outcome
            {
                println!("   - {}: {} [{}]", title, message, code);
            }
        }
    }

    println!("\n{}", "=".repeat(60));
    println!(
        "Overall Status: {}",
        if report.is_all_success() {
            "✅ SUCCESS"
        } else {
            "❌ FAILED"
        }
    );
    println!("{}\n", "=".repeat(60));
}
