// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use clap::{ArgAction, ArgMatches, Command, arg};
use colored::{ColoredString, Colorize};
use davsync_core::{
    CancelHandle, CollectionConfig, Config, DavCollection, SqliteCollection, SyncEngine,
    SyncError, SyncReport, SyncStatus,
};
use davsync_dav::DavClient;
use futures::future::join_all;

use crate::config::open_db;

type Engine = SyncEngine<SqliteCollection, DavCollection>;

/// Runs one sync pass for every selected collection.
#[derive(Debug, Clone, Default)]
pub struct CmdSync {
    /// Collection paths to sync; empty means all configured ones.
    pub collections: Vec<String>,
}

impl CmdSync {
    /// Subcommand name.
    pub const NAME: &str = "sync";

    /// The clap definition of the subcommand.
    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Synchronize configured collections with the server")
            .arg(
                arg!(--collection <PATH> "Only sync the collection at this path, may be repeated")
                    .action(ArgAction::Append),
            )
    }

    /// Reads the subcommand arguments.
    pub fn from(matches: &ArgMatches) -> Self {
        let collections = matches
            .get_many::<String>("collection")
            .map(|paths| paths.cloned().collect())
            .unwrap_or_default();
        Self { collections }
    }

    /// Syncs the selected collections in parallel and prints a summary.
    ///
    /// # Errors
    ///
    /// Returns an error if a selected path is not configured, the local
    /// database cannot be opened, or any pass aborted.
    pub async fn run(self, config: &Config) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "syncing collections...");
        let targets = self.select(&config.collections)?;
        if targets.is_empty() {
            println!("No collections configured");
            return Ok(());
        }

        let db = open_db(config).await?;
        let client = DavClient::new(config.server.clone())?;
        let cancel = CancelHandle::new();

        let mut engines = Vec::with_capacity(targets.len());
        for target in targets {
            let local = db.collection(&target.path, target.kind).await?;
            let remote = DavCollection::new(client.clone(), target.path.as_str(), target.kind);
            let engine = SyncEngine::new(local, remote, config.sync).with_cancel(cancel.clone());
            engines.push((target.path.clone(), engine));
        }

        let watcher = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("interrupted, stopping at the next safe point");
                    cancel.cancel();
                }
            })
        };

        let results = join_all(
            engines
                .into_iter()
                .map(|(path, engine)| async move { (path, sync_collection(engine).await) }),
        )
        .await;
        watcher.abort();

        let mut failed = 0;
        for (path, result) in &results {
            let mark = status_mark(SyncStatus::of(result));
            match result {
                Ok(report) => print_report(&mark, path, report),
                Err(err) => {
                    failed += 1;
                    println!("{mark} {}: {}", path.bold(), err);
                }
            }
        }

        db.close().await;
        if failed > 0 {
            return Err(format!("{failed} of {} collections failed to sync", results.len()).into());
        }
        Ok(())
    }

    fn select<'a>(
        &self,
        configured: &'a [CollectionConfig],
    ) -> Result<Vec<&'a CollectionConfig>, Box<dyn Error>> {
        if self.collections.is_empty() {
            return Ok(configured.iter().collect());
        }

        self.collections
            .iter()
            .map(|path| {
                configured
                    .iter()
                    .find(|c| c.path == *path)
                    .ok_or_else(|| Box::<dyn Error>::from(format!("Collection not configured: {path}")))
            })
            .collect()
    }
}

async fn sync_collection(mut engine: Engine) -> Result<SyncReport, SyncError> {
    refresh_display_name(&engine).await;
    engine.sync().await
}

/// Fetches the display name from the server once, failures are not fatal.
async fn refresh_display_name(engine: &Engine) {
    let local = engine.local();
    match local.record().await {
        Ok(record) if record.display_name.is_some() => return,
        Ok(_) => {}
        Err(err) => {
            tracing::warn!(url = local.url(), error = %err, "failed to read collection record");
            return;
        }
    }

    match engine.remote().display_name().await {
        Ok(Some(name)) => {
            if let Err(err) = local.set_display_name(Some(&name)).await {
                tracing::warn!(url = local.url(), error = %err, "failed to store display name");
            }
        }
        Ok(None) => {}
        Err(err) => {
            tracing::warn!(url = local.url(), error = %err, "failed to fetch display name");
        }
    }
}

fn status_mark(status: SyncStatus) -> ColoredString {
    match status {
        SyncStatus::Success => "✓".green(),
        SyncStatus::Partial => "!".yellow(),
        SyncStatus::Failure => "✗".red(),
    }
}

fn print_report(mark: &ColoredString, path: &str, report: &SyncReport) {
    if report.is_noop() && report.errors.is_empty() {
        let how = if report.fast_path { "unchanged" } else { "up to date" };
        println!("{mark} {}: {how}", path.bold());
    } else {
        println!(
            "{mark} {}: {} inserted, {} updated, {} deleted, {} pushed, {} conflicts, {} skipped",
            path.bold(),
            report.inserted,
            report.updated,
            report.deleted,
            report.pushed,
            report.conflicts,
            report.skipped,
        );
    }

    for item in &report.errors {
        println!("    {} {}: {}", "-".yellow(), item.name, item.error);
    }
    tracing::debug!(path, elapsed = ?report.elapsed, "collection synced");
}
