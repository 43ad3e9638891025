use std::sync::Arc;

use anyhow::{Context, Result};
use depot::{Catalog, DepotConfig, Downloader, Outcome, ReqwestClient, StorageQuantity, StorageUnit};
use tracing::warn;
use url::Url;

#[derive(Debug, clap::Args)]
pub struct SyncCmd {
    /// Artifact URLs to fetch. Defaults to the whole catalog.
    pub urls: Vec<String>,

    /// Download one artifact at a time.
    #[arg(long)]
    pub sequential: bool,

    /// Empty the destination before downloading.
    #[arg(long)]
    pub clean: bool,
}

impl SyncCmd {
    /// Returns `false` when any artifact failed.
    pub async fn run(self, config: DepotConfig) -> Result<bool> {
        let catalog = Arc::new(Catalog::builtin().clone());
        let urls = if self.urls.is_empty() {
            catalog.urls()
        } else {
            self.urls
                .iter()
                .map(|u| Url::parse(u).with_context(|| format!("invalid URL {u:?}")))
                .collect::<Result<Vec<_>>>()?
        };

        let destination = config.destination.clone();
        let client = ReqwestClient::new(config.transfer_timeout()).context("failed to build HTTP client")?;
        let downloader = Downloader::new(config, catalog, client)
            .with_context(|| format!("failed to prepare {}", destination.display()))?;

        if self.clean {
            let removed = downloader.purge().await.context("failed to clean destination")?;
            println!("cleaned {removed} entries from {}", destination.display());
        }

        let token = downloader.cancellation_token();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received; cancelling transfers");
                token.cancel();
            }
        });

        let reports = downloader.do_copy(&urls, !self.sequential).await;
        let mut failed = 0;
        for report in &reports {
            match &report.result {
                Ok(Outcome::Skipped) => println!("present     {}", report.url),
                Ok(Outcome::Downloaded { bytes, evicted }) => println!(
                    "downloaded  {} ({}, {evicted} evicted)",
                    report.url,
                    StorageQuantity::from(*bytes).in_unit(StorageUnit::MB)
                ),
                Err(e) => {
                    failed += 1;
                    println!("failed      {}: {e}", report.url);
                }
            }
        }
        downloader.shutdown().await;

        println!("\nfiles in {}:", destination.display());
        for file in depot_fs::list_files(&destination).context("failed to list destination")? {
            let size = StorageQuantity::from(file.len).in_unit(StorageUnit::MB);
            println!("  {} ({size})", file.path.display());
        }

        if failed > 0 {
            warn!(failed, total = reports.len(), "some artifacts could not be synced");
        }
        Ok(failed == 0)
    }
}
