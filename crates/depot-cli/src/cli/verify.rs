use anyhow::{Context, Result};
use depot::integrity::{self, Reason, Verdict};
use depot::{Catalog, DepotConfig};

#[derive(Debug, clap::Args)]
pub struct VerifyCmd {}

impl VerifyCmd {
    /// Returns `false` unless every artifact is intact.
    pub async fn run(self, config: DepotConfig) -> Result<bool> {
        let destination = config.destination;
        let verdicts = tokio::task::spawn_blocking(move || {
            Catalog::builtin()
                .all()
                .map(|artifact| (artifact, integrity::check(&destination, artifact)))
                .collect::<Vec<_>>()
        })
        .await
        .context("verification task failed")?;

        let mut intact = true;
        for (artifact, verdict) in verdicts {
            let ok = matches!(verdict, Ok(Verdict::Skip));
            let status = match verdict {
                Ok(Verdict::Skip) => "ok".to_string(),
                Ok(Verdict::NeedsDownload(Reason::Missing)) => "missing".to_string(),
                Ok(Verdict::NeedsDownload(Reason::LengthMismatch { expected, actual })) => {
                    format!("size {actual}, expected {expected}")
                }
                Ok(Verdict::NeedsDownload(Reason::ChecksumMismatch { actual, .. })) => {
                    format!("checksum {actual}")
                }
                Err(e) => format!("error: {e}"),
            };
            intact &= ok;
            println!("{:<26} {:<40} {status}", artifact.family().as_str(), artifact.source().path());
        }
        Ok(intact)
    }
}
