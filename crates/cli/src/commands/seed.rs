//! Catalog seeding from YAML.
//!
//! Every entry is upserted by name, so the command can be run again after
//! editing the file.
//!
//! ```yaml
//! services:
//!   - name: Hourly Babysitting
//!     care_category: child
//!     hourly_rate: "25.00"
//! packages:
//!   - name: Childcare Basic
//!     care_category: child
//!     tier: basic
//!     monthly_price: "1200.00"
//!     hours_per_month: 40
//!     features: [Background-checked nanny]
//! caregivers:
//!   - name: Grace Okafor
//!     specialty: elderly
//!     years_experience: 12
//!     rating: "4.9"
//! testimonials:
//!   - author: Priya S.
//!     relationship: Daughter of a client
//!     care_category: elderly
//!     quote: Mum looks forward to every visit.
//!     rating: 5
//! ```

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use kindred_core::catalog::MAX_TESTIMONIAL_RATING;
use kindred_core::{CareCategory, PackageTier, Price};
use kindred_portal::db::RepositoryError;
use kindred_portal::db::catalog::{
    CaregiverSeed, CatalogRepository, OfferingSeed, PackageSeed, TestimonialSeed,
};

use super::{ConnectError, connect};

/// Catalog file used when `--file` is not given.
pub const DEFAULT_CATALOG_FILE: &str = "crates/cli/seed/catalog.yaml";

/// Errors from seeding the catalog.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid catalog YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0} validation error(s) found")]
    Invalid(usize),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Top-level layout of the catalog file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogFile {
    pub services: Vec<ServiceEntry>,
    pub packages: Vec<PackageEntry>,
    pub caregivers: Vec<CaregiverEntry>,
    pub testimonials: Vec<TestimonialEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceEntry {
    pub name: String,
    pub care_category: CareCategory,
    pub hourly_rate: Price,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageEntry {
    pub name: String,
    pub care_category: CareCategory,
    pub tier: PackageTier,
    pub monthly_price: Price,
    pub hours_per_month: i32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub features: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaregiverEntry {
    pub name: String,
    pub specialty: CareCategory,
    pub years_experience: i32,
    pub rating: Decimal,
    #[serde(default)]
    pub bio: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestimonialEntry {
    pub author: String,
    #[serde(default)]
    pub relationship: String,
    pub care_category: CareCategory,
    pub quote: String,
    pub rating: i16,
}

const fn default_active() -> bool {
    true
}

impl CatalogFile {
    /// Problems that would make the upserts fail or mislead families.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for service in &self.services {
            if service.name.trim().is_empty() {
                errors.push("service with an empty name".to_string());
            }
            if service.hourly_rate.amount() <= Decimal::ZERO {
                errors.push(format!("{}: hourly_rate must be positive", service.name));
            }
        }
        for package in &self.packages {
            if package.name.trim().is_empty() {
                errors.push("package with an empty name".to_string());
            }
            if package.hours_per_month <= 0 {
                errors.push(format!("{}: hours_per_month must be positive", package.name));
            }
            if package.monthly_price.amount() <= Decimal::ZERO {
                errors.push(format!("{}: monthly_price must be positive", package.name));
            }
        }
        for caregiver in &self.caregivers {
            if caregiver.name.trim().is_empty() {
                errors.push("caregiver with an empty name".to_string());
            }
            if caregiver.rating < Decimal::ZERO || caregiver.rating > Decimal::from(5) {
                errors.push(format!("{}: rating must be between 0 and 5", caregiver.name));
            }
            if caregiver.years_experience < 0 {
                errors.push(format!("{}: years_experience cannot be negative", caregiver.name));
            }
        }
        for testimonial in &self.testimonials {
            if testimonial.author.trim().is_empty() {
                errors.push("testimonial with an empty author".to_string());
            }
            if testimonial.quote.trim().is_empty() {
                errors.push(format!("{}: quote is empty", testimonial.author));
            }
            if !(1..=MAX_TESTIMONIAL_RATING).contains(&testimonial.rating) {
                errors.push(format!(
                    "{}: rating must be between 1 and {MAX_TESTIMONIAL_RATING}",
                    testimonial.author
                ));
            }
        }

        errors
    }
}

/// Position in the file becomes the display order.
fn sort_order(index: usize) -> i32 {
    i32::try_from(index).unwrap_or(i32::MAX)
}

/// Upsert the catalog from `file_path`.
///
/// The file is parsed and validated before connecting to the database.
///
/// # Errors
///
/// Returns `SeedError` if the file is missing or invalid, or if an upsert fails.
pub async fn catalog(file_path: &str) -> Result<(), SeedError> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(SeedError::FileNotFound(file_path.to_string()));
    }

    tracing::info!(path = %file_path, "Loading catalog from file");
    let content = tokio::fs::read_to_string(path).await?;
    let file: CatalogFile = serde_yaml::from_str(&content)?;

    let errors = file.validate();
    if !errors.is_empty() {
        tracing::error!("Catalog validation failed:");
        for err in &errors {
            tracing::error!("  - {err}");
        }
        return Err(SeedError::Invalid(errors.len()));
    }

    let counts = (
        file.services.len(),
        file.packages.len(),
        file.caregivers.len(),
        file.testimonials.len(),
    );

    let pool = connect().await?;
    let repo = CatalogRepository::new(&pool);

    for (index, entry) in file.services.into_iter().enumerate() {
        repo.upsert_offering(&OfferingSeed {
            name: entry.name,
            care_category: entry.care_category,
            hourly_rate: entry.hourly_rate,
            description: entry.description,
            sort_order: sort_order(index),
        })
        .await?;
    }
    for (index, entry) in file.packages.into_iter().enumerate() {
        repo.upsert_package(&PackageSeed {
            name: entry.name,
            care_category: entry.care_category,
            tier: entry.tier,
            monthly_price: entry.monthly_price,
            hours_per_month: entry.hours_per_month,
            description: entry.description,
            features: entry.features,
            sort_order: sort_order(index),
        })
        .await?;
    }
    for entry in file.caregivers {
        repo.upsert_caregiver(&CaregiverSeed {
            name: entry.name,
            specialty: entry.specialty,
            years_experience: entry.years_experience,
            rating: entry.rating,
            bio: entry.bio,
            is_active: entry.is_active,
        })
        .await?;
    }
    for (index, entry) in file.testimonials.into_iter().enumerate() {
        repo.upsert_testimonial(&TestimonialSeed {
            author: entry.author,
            relationship: entry.relationship,
            care_category: entry.care_category,
            quote: entry.quote,
            rating: entry.rating,
            sort_order: sort_order(index),
        })
        .await?;
    }

    tracing::info!("Seeding complete!");
    tracing::info!("  Services: {}", counts.0);
    tracing::info!("  Packages: {}", counts.1);
    tracing::info!("  Caregivers: {}", counts.2);
    tracing::info!("  Testimonials: {}", counts.3);

    Ok(())
}
