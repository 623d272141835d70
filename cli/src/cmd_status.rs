// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use clap::{ArgMatches, Command};
use colored::Colorize;
use davsync_core::{CollectionConfig, CollectionRecord, CollectionStats, Config};

use crate::config::open_db;

/// Shows what the local database knows about each configured collection.
#[derive(Debug, Default, Clone, Copy)]
pub struct CmdStatus;

impl CmdStatus {
    /// Subcommand name.
    pub const NAME: &str = "status";

    /// The clap definition of the subcommand.
    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Show collection tags, last sync time and pending local changes")
    }

    /// Reads the subcommand arguments.
    pub fn from(_matches: &ArgMatches) -> Self {
        Self
    }

    /// Prints one block per configured collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the local database cannot be read.
    pub async fn run(self, config: &Config) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "reading collection status...");
        if config.collections.is_empty() {
            println!("No collections configured");
            return Ok(());
        }

        let db = open_db(config).await?;
        let known = db.collections().await?;

        let mut first = true;
        for collection in &config.collections {
            if !first {
                println!();
            }
            first = false;

            match known.iter().find(|r| r.url == collection.path) {
                Some(record) => {
                    let stats = db
                        .collection(&collection.path, collection.kind)
                        .await?
                        .stats()
                        .await?;
                    println!("{}", format_status(collection, record, stats));
                }
                None => println!(
                    "{} ({})\n  {}",
                    collection.path.bold(),
                    collection.kind,
                    "never synced".italic()
                ),
            }
        }

        db.close().await;
        Ok(())
    }
}

fn format_status(
    collection: &CollectionConfig,
    record: &CollectionRecord,
    stats: CollectionStats,
) -> String {
    let title = match &record.display_name {
        Some(name) => format!("{} {} ({})", collection.path.bold(), name, collection.kind),
        None => format!("{} ({})", collection.path.bold(), collection.kind),
    };
    let last_synced = record
        .last_synced()
        .map_or_else(|| "never".to_string(), |t| t.to_string());
    let ctag = record.ctag.as_deref().unwrap_or("-");

    let mut pending = format!("{} entries", stats.live);
    if stats.dirty > 0 || stats.deleted > 0 {
        pending.push_str(&format!(
            ", {} to upload, {} to delete",
            stats.dirty.to_string().yellow(),
            stats.deleted.to_string().yellow()
        ));
    }

    format!("{title}\n  last synced: {last_synced}\n  ctag: {ctag}\n  {pending}")
}
