//! Partition identity and the configured partition universe.
//!
//! A partition is one (industry, country) unit of work. The universe of valid
//! partitions is the cross product of the configured industry and country lists;
//! it is recomputed from configuration on every detection pass, never stored.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use crate::config::CatalogConfig;

/// One (industry, country) unit of work. Ordered by industry, then country.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Partition {
    pub industry: String,
    /// ISO-3166 alpha-2, upper case.
    pub country: String,
}

impl Partition {
    /// Industry is lower-cased, country upper-cased; both trimmed.
    pub fn new(industry: impl AsRef<str>, country: impl AsRef<str>) -> Self {
        Self {
            industry: industry.as_ref().trim().to_lowercase(),
            country: country.as_ref().trim().to_uppercase(),
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.industry, self.country)
    }
}

/// Stored lead count for one partition, read fresh on every detection call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionCount {
    pub partition: Partition,
    pub lead_count: i64,
}

/// The configured industry and country lists.
#[derive(Debug, Clone)]
pub struct PartitionCatalog {
    industries: Vec<String>,
    countries: Vec<String>,
}

impl PartitionCatalog {
    /// Builds the catalog, dropping blank and repeated entries (first occurrence wins).
    pub fn new<I, C>(industries: I, countries: C) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        Self {
            industries: dedup(industries.into_iter().map(|s| s.as_ref().trim().to_lowercase())),
            countries: dedup(countries.into_iter().map(|s| s.as_ref().trim().to_uppercase())),
        }
    }

    pub fn from_config(cfg: &CatalogConfig) -> Self {
        Self::new(&cfg.industries, &cfg.countries)
    }

    pub fn industries(&self) -> &[String] {
        &self.industries
    }

    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    /// Every valid partition, industry-major in configuration order.
    pub fn all_partitions(&self) -> Vec<Partition> {
        let mut out = Vec::with_capacity(self.len());
        for industry in &self.industries {
            for country in &self.countries {
                out.push(Partition {
                    industry: industry.clone(),
                    country: country.clone(),
                });
            }
        }
        out
    }

    pub fn contains(&self, partition: &Partition) -> bool {
        self.industries.contains(&partition.industry) && self.countries.contains(&partition.country)
    }

    pub fn len(&self) -> usize {
        self.industries.len() * self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn dedup(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}
