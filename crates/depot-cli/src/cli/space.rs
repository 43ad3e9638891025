use anyhow::{Context, Result};
use depot::{DepotConfig, DiskProbe, SpaceSample, StorageUnit};

#[derive(Debug, clap::Args)]
pub struct SpaceCmd {}

impl SpaceCmd {
    /// Returns `false` when the destination is below the free-space floor.
    pub async fn run(self, config: DepotConfig) -> Result<bool> {
        let probe = config.probe.build();
        let target = config.destination.clone();
        let metrics = tokio::task::spawn_blocking(move || probe.probe(&target))
            .await
            .context("probe task failed")?
            .with_context(|| format!("failed to probe {}", config.destination.display()))?;

        let sample = SpaceSample::new(metrics);
        let mut names: Vec<_> = sample.metrics().keys().collect();
        names.sort();
        for name in names {
            println!("{name:<12} {}", sample.metrics()[name].in_unit(StorageUnit::MB));
        }

        let available = sample.available().unwrap_or_default();
        let enough = available >= config.min_free_space;
        println!(
            "\nminimum free space {} ({})",
            config.min_free_space,
            if enough { "satisfied" } else { "NOT satisfied" }
        );
        Ok(enough)
    }
}
