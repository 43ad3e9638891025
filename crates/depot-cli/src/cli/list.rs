use anyhow::Result;
use depot::{Catalog, StorageUnit};

#[derive(Debug, clap::Args)]
#[clap(visible_alias = "ls")]
pub struct ListCmd {}

impl ListCmd {
    pub fn run(self) -> Result<bool> {
        let catalog = Catalog::builtin();
        for family in catalog.families() {
            println!("{family}");
            for artifact in catalog.all().filter(|a| a.family() == family) {
                println!(
                    "  {:<12} {:>16}  {}",
                    artifact.file_name(),
                    artifact.expected_size().in_unit(StorageUnit::MB).to_string(),
                    artifact.source()
                );
            }
        }
        Ok(true)
    }
}
