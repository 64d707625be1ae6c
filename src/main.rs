use clap::Parser;
use miette::{IntoDiagnostic, Result};
use settled::application::engine::SettlementEngine;
use settled::domain::money::Amount;
use settled::domain::ports::{SettlementStore, SettlementStoreArc};
use settled::domain::request::NewPaymentRequest;
use settled::error::SettlementError;
use settled::infrastructure::in_memory::InMemoryStore;
use settled::interfaces::csv::account_writer::AccountWriter;
use settled::interfaces::csv::operation_reader::{Operation, OperationKind, OperationReader};
use settled::interfaces::csv::seed_reader;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input operations CSV file
    input: PathBuf,

    /// Accounts seed CSV (id, name, currency, balance)
    #[arg(long)]
    accounts: Option<PathBuf>,

    /// Acts seed CSV (id, contract, amount_gross)
    #[arg(long)]
    acts: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

#[cfg(feature = "storage-rocksdb")]
fn open_persistent(path: &Path) -> Result<SettlementStoreArc> {
    use settled::infrastructure::rocksdb::RocksDbStore;
    Ok(Arc::new(RocksDbStore::open(path).into_diagnostic()?))
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_persistent(_path: &Path) -> Result<SettlementStoreArc> {
    Err(miette::miette!(
        "persistent storage requires the storage-rocksdb feature"
    ))
}

fn required<T>(field: Option<T>, name: &str) -> std::result::Result<T, SettlementError> {
    field.ok_or_else(|| SettlementError::Validation(format!("missing required column '{name}'")))
}

async fn apply(
    engine: &SettlementEngine,
    op: Operation,
) -> std::result::Result<(), SettlementError> {
    match op.op {
        OperationKind::Create => {
            let new = NewPaymentRequest {
                category_id: required(op.category, "category")?,
                amount: Amount::new(required(op.amount, "amount")?)?,
                planned_date: op.date.unwrap_or_else(|| chrono::Utc::now().date_naive()),
                contract_id: op.contract,
                act_id: op.act,
                account_id: op.account,
                comment: op.comment,
                created_by: "cli".to_string(),
            };
            engine.create_request(new).await?;
        }
        OperationKind::Approve => {
            engine
                .approve_request(required(op.request, "request")?)
                .await?;
        }
        OperationKind::Pay => {
            engine
                .pay_request(
                    required(op.request, "request")?,
                    required(op.account, "account")?,
                )
                .await?;
        }
        OperationKind::Cancel => {
            engine
                .cancel_request(required(op.request, "request")?, op.reason)
                .await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let store: SettlementStoreArc = if let Some(db_path) = &cli.db_path {
        open_persistent(db_path)?
    } else {
        Arc::new(InMemoryStore::new())
    };

    if let Some(path) = &cli.accounts {
        let file = File::open(path).into_diagnostic()?;
        for account in seed_reader::read_accounts(file).into_diagnostic()? {
            store.insert_account(account).await.into_diagnostic()?;
        }
    }
    if let Some(path) = &cli.acts {
        let file = File::open(path).into_diagnostic()?;
        for act in seed_reader::read_acts(file).into_diagnostic()? {
            store.insert_act(act).await.into_diagnostic()?;
        }
    }

    let engine = SettlementEngine::new(store);

    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = OperationReader::new(file);
    for op_result in reader.operations() {
        match op_result {
            Ok(op) => {
                if let Err(e) = apply(&engine, op).await {
                    eprintln!("Error processing operation: {}", e);
                }
            }
            Err(e) => {
                eprintln!("Error reading operation: {}", e);
            }
        }
    }

    let accounts = engine.accounts().await.into_diagnostic()?;

    let stdout = io::stdout();
    let mut writer = AccountWriter::new(stdout.lock());
    writer.write_accounts(accounts).into_diagnostic()?;

    Ok(())
}
