//! Subcommand handlers

use std::path::{Path, PathBuf};

use notary::ledger::{self, Ledger};
use notary::storage::{download_to, store_file};
use notary::{Error, Notarizer, Phase, Submission};
use notary_core::{
    format_timestamp, short_hash, Address, Certificate, Lookup, NotarizationRecord, RootHash, TxRef,
};
use notary_sqlite::SqliteBook;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::Session;

type CommandResult = Result<(), Box<dyn std::error::Error>>;

fn print_json<T: Serialize>(value: &T) -> CommandResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn certificate(session: &Session, record: NotarizationRecord, tx: Option<TxRef>) -> Certificate {
    Certificate::new(
        record,
        tx,
        &session.config.chain.name,
        &session.config.chain.explorer_url,
    )
}

pub async fn upload(session: &Session, file: &Path) -> CommandResult {
    let stored = store_file(&*session.store, file).await?;
    if session.json {
        return print_json(&stored);
    }

    println!("Root Hash     {}", stored.root_hash);
    println!("Size          {} bytes", stored.size);
    println!("Storage Tx    {}", stored.tx);
    if stored.already_stored {
        println!("(already stored)");
    }
    Ok(())
}

pub async fn download(session: &Session, root_hash: &str, output: Option<PathBuf>) -> CommandResult {
    let root = RootHash::parse(root_hash)?;
    let output = output.unwrap_or_else(|| PathBuf::from(root.as_str()));
    let written = download_to(&*session.store, &root, &output).await?;
    info!("downloaded {} to {}", root, output.display());
    println!("{} bytes written to {}", written, output.display());
    Ok(())
}

pub async fn notarize(session: &Session, file: &Path, label: &str) -> CommandResult {
    let mut notarizer = Notarizer::new(
        session.store.clone(),
        session.ledger.clone(),
        session.config.timeouts.clone(),
    );

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let stored = notarizer.store_file(file).await?;
    info!("stored {} ({} bytes)", stored.root_hash, stored.size);

    let record = match notarizer.attest(label, &session.wallet).await? {
        Submission::AlreadyConfirmed(record) => {
            println!("Already notarized by this account.");
            record
        }
        Submission::Submitted(tx) => {
            info!("submitted {}", tx);
            match notarizer.await_finality(&cancel).await {
                Ok(record) => record,
                Err(Error::Cancelled) => {
                    println!("Stopped waiting. Transaction {} remains submitted.", tx);
                    println!("Check later with: notary verify {}", stored.root_hash);
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            }
        }
    };

    let tx = match notarizer.phase() {
        Phase::Confirmed { tx, .. } => tx,
        _ => None,
    };
    let cert = certificate(session, record, tx);
    if session.json {
        return print_json(&cert);
    }
    println!("{cert}");
    Ok(())
}

pub async fn verify(session: &Session, root_hash: &str, link: Option<&str>) -> CommandResult {
    let root = RootHash::parse(root_hash)?;
    let lookup = ledger::lookup(&*session.ledger, &root).await?;
    if session.json {
        return print_json(&lookup);
    }

    match lookup {
        Lookup::Registered(record) => {
            let cert = certificate(session, record, None);
            println!("{cert}");
            if let Some(base) = link {
                println!("  Share         {}", cert.verify_link(base));
            }
        }
        Lookup::Unregistered { root_hash } => {
            println!("No record found for {}", short_hash(root_hash.as_str(), 14));
        }
    }
    Ok(())
}

pub async fn list(session: &Session, owner: Option<&str>) -> CommandResult {
    let owner: Address = match owner {
        Some(addr) => addr.parse()?,
        None => session.wallet.address().ok_or(Error::WalletNotConnected)?,
    };
    let records = ledger::documents(&*session.ledger, &owner).await?;
    if session.json {
        return print_json(&records);
    }

    if records.is_empty() {
        println!("No documents notarized by {}", owner);
        return Ok(());
    }
    for record in records {
        let name = if record.filename.is_empty() {
            "(unnamed)"
        } else {
            record.filename.as_str()
        };
        println!(
            "{}  {}  {}",
            format_timestamp(record.timestamp),
            short_hash(record.root_hash.as_str(), 10),
            name
        );
        if !record.label.is_empty() {
            println!("    {}", record.label);
        }
    }
    Ok(())
}

pub async fn count(session: &Session) -> CommandResult {
    let total = session.ledger.total_count().await?;
    if session.json {
        return print_json(&serde_json::json!({ "total": total }));
    }
    println!("{total}");
    Ok(())
}

pub fn address(session: &Session) -> CommandResult {
    match session.wallet.address() {
        Some(address) => println!("{address}"),
        None => println!("No wallet configured (set NOTARY_PRIVATE_KEY)"),
    }
    Ok(())
}

/// Tail the ledger database, printing each record as it lands.
///
/// Uses its own connection so records written by other processes show up.
pub async fn watch(session: &Session, all: bool) -> CommandResult {
    let book = SqliteBook::open(session.config.ledger_path())?;
    let mut seen = if all { 0 } else { book.latest_seq()? };
    let mut ticker = tokio::time::interval(session.config.timeouts.poll_interval);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => return Ok(()),
            _ = ticker.tick() => {}
        }

        for (seq, record) in book.records_after(seen)? {
            seen = seq;
            if session.json {
                println!("{}", serde_json::to_string(&record)?);
            } else {
                println!(
                    "Notarized  {}  {}  by {}  at {}",
                    short_hash(record.root_hash.as_str(), 10),
                    record.filename,
                    record.submitter,
                    format_timestamp(record.timestamp)
                );
            }
        }
    }
}
