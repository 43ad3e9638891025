use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use url::Url;

use crate::error::{CatalogError, Result};
use crate::quantity::StorageQuantity;

pub const CHECKSUM_ALGORITHM: &str = "SHA-256";

const AGENTS_BASE: &str = "https://softwareupdate.omnissa.com/hcs-agents-stable/packages/";

/// Logical grouping of artifact versions that share one retention policy.
///
/// The tag doubles as the family's directory name under the destination, so
/// it must be a single path component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Family(Cow<'static, str>);

impl Family {
    pub const DEM_AGENT: Family = Family(Cow::Borrowed("DEM-Agent"));
    pub const APP_VOLUMES_AGENT: Family = Family(Cow::Borrowed("App-Volumes-Agent"));
    pub const HORIZON_ENTERPRISE_AGENT: Family = Family(Cow::Borrowed("Horizon-Enterprise-Agent"));

    pub fn new(tag: impl Into<Cow<'static, str>>) -> Result<Self> {
        let tag = tag.into();
        if tag.is_empty() || tag == "." || tag == ".." || tag.contains(['/', '\\']) {
            return Err(CatalogError::InvalidFamily(tag.into_owned()));
        }
        Ok(Self(tag))
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.pad(&self.0) }
}

/// Immutable descriptor of one downloadable artifact. Identity is [`Artifact::source`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    family:        Family,
    source:        Url,
    suffix:        String,
    expected_size: StorageQuantity,
    checksum:      String,
}

impl Artifact {
    pub fn family(&self) -> &Family { &self.family }

    pub fn source(&self) -> &Url { &self.source }

    pub fn expected_size(&self) -> StorageQuantity { self.expected_size }

    /// Lowercase hex SHA-256 digest.
    pub fn checksum(&self) -> &str { &self.checksum }

    pub fn checksum_algorithm(&self) -> &'static str { CHECKSUM_ALGORITHM }

    /// Last path segment of the source.
    pub fn file_name(&self) -> &str { self.suffix.rsplit('/').next().unwrap_or(&self.suffix) }

    /// Path relative to a destination: `<family>/<suffix>`.
    pub fn relative_path(&self) -> PathBuf {
        let mut path = PathBuf::from(self.family.as_str());
        path.extend(self.suffix.split('/'));
        path
    }

    pub fn local_path(&self, destination: &Path) -> PathBuf {
        destination.join(self.relative_path())
    }
}

/// Ordered, read-only registry of artifacts keyed by source URL.
#[derive(Debug, Clone)]
pub struct Catalog {
    base:      Url,
    artifacts: Vec<Artifact>,
    index:     HashMap<Url, usize>,
}

static BUILTIN: Lazy<Catalog> = Lazy::new(|| {
    builtin_entries().expect("builtin catalog entries are well-formed")
});

fn builtin_entries() -> Result<Catalog> {
    use Family as F;

    Ok(Catalog::builder(AGENTS_BASE)?
        .entry(
            F::DEM_AGENT,
            "10.15.0/2268/agent.tar",
            12_206_080,
            "ee85b69ee51c0ad07cf4cdd6f93ec0228589e62d1c96bdeb26be5c0b9870f7e6",
        )?
        .entry(
            F::DEM_AGENT,
            "10.16.0/2292/agent.tar",
            12_247_040,
            "38bc7498dc45596c8653040d1d236ecb2dd8af0f702c11ac4d28dc4f97c79700",
        )?
        .entry(
            F::APP_VOLUMES_AGENT,
            "4.18.0/2851/Omnissa-AppVolumes-Agent-x64-2506-4.18.0-2851.msi",
            10_895_360,
            "85c75c53505695380836f134284f831276303d6982fc613aa7e234f11352bb2e",
        )?
        .entry(
            F::APP_VOLUMES_AGENT,
            "4.17.0/2117/Omnissa-AppVolumes-Agent-x64-2503-4.17.0-2117.msi",
            10_207_232,
            "4e4f01393ab89201d82a7e13fb7288740f4b5c59131d2b212d5bb4b1a008d567",
        )?
        .entry(
            F::HORIZON_ENTERPRISE_AGENT,
            "8.12.0/23142606/agent.tar",
            280_872_960,
            "db78fe3da791482ff2ecb320434a1f0659c1e4d0c71aed6ffbd29b85cfc65381",
        )?
        .entry(
            F::HORIZON_ENTERPRISE_AGENT,
            "8.16.0/16560454767/agent.tar",
            243_271_680,
            "c968ba5bfcbac2de741c7e17d890f0d14bfbfd28c8e91215bfcd7c8e6ccb2687",
        )?
        .entry(
            F::HORIZON_ENTERPRISE_AGENT,
            "8.15.0/14304348675/agent.tar",
            242_862_080,
            "c36614e224880dba410ccd51c54cc029bbd105dbba5f3aadca57783d0f6a0420",
        )?
        .entry(
            F::HORIZON_ENTERPRISE_AGENT,
            "8.14.0/12994395200/agent.tar",
            257_064_960,
            "e015add0d7216e67335ed3f505331634c27874f747f861460cee6fb7b7d5dcda",
        )?
        .entry(
            F::HORIZON_ENTERPRISE_AGENT,
            "8.13.0/10002333884/agent.tar",
            255_825_920,
            "0a7af36ba4ab21c7a5293ef8475e329ac81c3cbba122186488cb60a56597be17",
        )?
        .build())
}

impl Catalog {
    /// Start a catalog whose entries are resolved against `base`.
    pub fn builder(base: &str) -> Result<CatalogBuilder> {
        let normalized = if base.ends_with('/') { base.to_string() } else { format!("{base}/") };
        let base = Url::parse(&normalized).map_err(|source| CatalogError::InvalidBase {
            url: base.to_string(),
            source,
        })?;
        Ok(CatalogBuilder {
            catalog: Catalog {
                base,
                artifacts: Vec::new(),
                index: HashMap::new(),
            },
        })
    }

    /// The agent packages published on the stable update channel.
    pub fn builtin() -> &'static Catalog { &BUILTIN }

    pub fn base(&self) -> &Url { &self.base }

    pub fn lookup(&self, source: &Url) -> Result<&Artifact> {
        self.index
            .get(source)
            .map(|&i| &self.artifacts[i])
            .ok_or_else(|| CatalogError::NotFound(source.to_string()))
    }

    /// Like [`Catalog::lookup`] for an unparsed URL.
    pub fn resolve(&self, source: &str) -> Result<&Artifact> {
        let url = Url::parse(source).map_err(|_| CatalogError::NotFound(source.to_string()))?;
        self.lookup(&url)
    }

    pub fn family_of(&self, source: &Url) -> Result<&Family> {
        self.lookup(source).map(Artifact::family)
    }

    /// Artifacts in insertion order.
    pub fn all(&self) -> std::slice::Iter<'_, Artifact> { self.artifacts.iter() }

    pub fn urls(&self) -> Vec<Url> { self.all().map(|a| a.source.clone()).collect() }

    /// Distinct families in first-seen order.
    pub fn families(&self) -> Vec<&Family> {
        let mut families: Vec<&Family> = Vec::new();
        for artifact in &self.artifacts {
            if !families.contains(&&artifact.family) {
                families.push(&artifact.family);
            }
        }
        families
    }

    pub fn len(&self) -> usize { self.artifacts.len() }

    pub fn is_empty(&self) -> bool { self.artifacts.is_empty() }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Artifact;
    type IntoIter = std::slice::Iter<'a, Artifact>;

    fn into_iter(self) -> Self::IntoIter { self.all() }
}

pub struct CatalogBuilder {
    catalog: Catalog,
}

impl CatalogBuilder {
    /// Add an artifact published at `<base>/<family>/<suffix>`.
    pub fn entry(
        mut self,
        family: Family,
        suffix: &str,
        size_bytes: i64,
        sha256_hex: &str,
    ) -> Result<Self> {
        let valid_suffix = !suffix.is_empty()
            && suffix
                .split('/')
                .all(|seg| !seg.is_empty() && seg != "." && seg != ".." && !seg.contains('\\'));
        if !valid_suffix {
            return Err(CatalogError::InvalidPath(suffix.to_string()));
        }

        let source = self
            .catalog
            .base
            .join(&format!("{family}/{suffix}"))
            .map_err(|_| CatalogError::InvalidPath(suffix.to_string()))?;

        if size_bytes < 0 {
            return Err(CatalogError::NegativeSize(source.to_string()));
        }

        let checksum = sha256_hex.trim();
        if checksum.len() != 64 || !checksum.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CatalogError::InvalidChecksum(sha256_hex.to_string()));
        }

        if self.catalog.index.contains_key(&source) {
            return Err(CatalogError::Duplicate(source.to_string()));
        }

        self.catalog.index.insert(source.clone(), self.catalog.artifacts.len());
        self.catalog.artifacts.push(Artifact {
            family,
            source,
            suffix: suffix.to_string(),
            expected_size: StorageQuantity::bytes(size_bytes),
            checksum: checksum.to_ascii_lowercase(),
        });
        Ok(self)
    }

    pub fn build(self) -> Catalog { self.catalog }
}
