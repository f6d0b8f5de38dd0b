//! Catalog repository: monthly packages, hourly offerings, caregivers and
//! testimonials.
//!
//! The portal only reads these tables. Upserts are used by `kindred seed`.

use rust_decimal::Decimal;
use sqlx::PgPool;

use kindred_core::catalog::{Caregiver, MonthlyPackage, ServiceOffering, Testimonial};
use kindred_core::{CareCategory, PackageTier, Price};

use super::RepositoryError;

/// Fields needed to seed a monthly package.
#[derive(Debug, Clone)]
pub struct PackageSeed {
    pub name: String,
    pub care_category: CareCategory,
    pub tier: PackageTier,
    pub monthly_price: Price,
    pub hours_per_month: i32,
    pub description: String,
    pub features: Vec<String>,
    pub sort_order: i32,
}

/// Fields needed to seed an hourly offering.
#[derive(Debug, Clone)]
pub struct OfferingSeed {
    pub name: String,
    pub care_category: CareCategory,
    pub hourly_rate: Price,
    pub description: String,
    pub sort_order: i32,
}

/// Fields needed to seed a caregiver profile.
#[derive(Debug, Clone)]
pub struct CaregiverSeed {
    pub name: String,
    pub specialty: CareCategory,
    pub years_experience: i32,
    pub rating: Decimal,
    pub bio: String,
    pub is_active: bool,
}

/// Fields needed to seed a testimonial.
#[derive(Debug, Clone)]
pub struct TestimonialSeed {
    pub author: String,
    pub relationship: String,
    pub care_category: CareCategory,
    pub quote: String,
    pub rating: i16,
    pub sort_order: i32,
}

const TESTIMONIAL_COLUMNS: &str = "id, author, relationship, care_category, quote, rating, sort_order";

/// Repository for catalog tables.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All monthly packages in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn packages(&self) -> Result<Vec<MonthlyPackage>, RepositoryError> {
        let packages = sqlx::query_as::<_, MonthlyPackage>(
            r"
            SELECT id, name, care_category, tier, monthly_price, hours_per_month,
                   description, features, sort_order
            FROM kindred.monthly_packages
            ORDER BY care_category, sort_order, tier
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(packages)
    }

    /// All hourly offerings in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn offerings(&self) -> Result<Vec<ServiceOffering>, RepositoryError> {
        let offerings = sqlx::query_as::<_, ServiceOffering>(
            r"
            SELECT id, name, care_category, hourly_rate, description, sort_order
            FROM kindred.service_offerings
            ORDER BY care_category, sort_order, name
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(offerings)
    }

    /// Caregivers currently accepting visits, best rated first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active_caregivers(&self) -> Result<Vec<Caregiver>, RepositoryError> {
        let caregivers = sqlx::query_as::<_, Caregiver>(
            r"
            SELECT id, name, specialty, years_experience, rating, bio, is_active
            FROM kindred.caregivers
            WHERE is_active = TRUE
            ORDER BY rating DESC, years_experience DESC, name
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(caregivers)
    }

    /// All testimonials in file order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn testimonials(&self) -> Result<Vec<Testimonial>, RepositoryError> {
        let testimonials = sqlx::query_as::<_, Testimonial>(&format!(
            "SELECT {TESTIMONIAL_COLUMNS} FROM kindred.testimonials ORDER BY sort_order, id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(testimonials)
    }

    /// Insert or update a package keyed by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    pub async fn upsert_package(&self, seed: &PackageSeed) -> Result<MonthlyPackage, RepositoryError> {
        let package = sqlx::query_as::<_, MonthlyPackage>(
            r"
            INSERT INTO kindred.monthly_packages
                (name, care_category, tier, monthly_price, hours_per_month, description, features, sort_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (name) DO UPDATE SET
                care_category = EXCLUDED.care_category,
                tier = EXCLUDED.tier,
                monthly_price = EXCLUDED.monthly_price,
                hours_per_month = EXCLUDED.hours_per_month,
                description = EXCLUDED.description,
                features = EXCLUDED.features,
                sort_order = EXCLUDED.sort_order
            RETURNING id, name, care_category, tier, monthly_price, hours_per_month,
                      description, features, sort_order
            ",
        )
        .bind(&seed.name)
        .bind(seed.care_category)
        .bind(seed.tier)
        .bind(seed.monthly_price)
        .bind(seed.hours_per_month)
        .bind(&seed.description)
        .bind(&seed.features)
        .bind(seed.sort_order)
        .fetch_one(self.pool)
        .await?;

        Ok(package)
    }

    /// Insert or update an offering keyed by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    pub async fn upsert_offering(
        &self,
        seed: &OfferingSeed,
    ) -> Result<ServiceOffering, RepositoryError> {
        let offering = sqlx::query_as::<_, ServiceOffering>(
            r"
            INSERT INTO kindred.service_offerings
                (name, care_category, hourly_rate, description, sort_order)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (name) DO UPDATE SET
                care_category = EXCLUDED.care_category,
                hourly_rate = EXCLUDED.hourly_rate,
                description = EXCLUDED.description,
                sort_order = EXCLUDED.sort_order
            RETURNING id, name, care_category, hourly_rate, description, sort_order
            ",
        )
        .bind(&seed.name)
        .bind(seed.care_category)
        .bind(seed.hourly_rate)
        .bind(&seed.description)
        .bind(seed.sort_order)
        .fetch_one(self.pool)
        .await?;

        Ok(offering)
    }

    /// Insert or update a caregiver keyed by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    pub async fn upsert_caregiver(&self, seed: &CaregiverSeed) -> Result<Caregiver, RepositoryError> {
        let caregiver = sqlx::query_as::<_, Caregiver>(
            r"
            INSERT INTO kindred.caregivers
                (name, specialty, years_experience, rating, bio, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (name) DO UPDATE SET
                specialty = EXCLUDED.specialty,
                years_experience = EXCLUDED.years_experience,
                rating = EXCLUDED.rating,
                bio = EXCLUDED.bio,
                is_active = EXCLUDED.is_active
            RETURNING id, name, specialty, years_experience, rating, bio, is_active
            ",
        )
        .bind(&seed.name)
        .bind(seed.specialty)
        .bind(seed.years_experience)
        .bind(seed.rating)
        .bind(&seed.bio)
        .bind(seed.is_active)
        .fetch_one(self.pool)
        .await?;

        Ok(caregiver)
    }

    /// Insert or update a testimonial keyed by author.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    pub async fn upsert_testimonial(
        &self,
        seed: &TestimonialSeed,
    ) -> Result<Testimonial, RepositoryError> {
        let testimonial = sqlx::query_as::<_, Testimonial>(&format!(
            r"
            INSERT INTO kindred.testimonials
                (author, relationship, care_category, quote, rating, sort_order)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (author) DO UPDATE SET
                relationship = EXCLUDED.relationship,
                care_category = EXCLUDED.care_category,
                quote = EXCLUDED.quote,
                rating = EXCLUDED.rating,
                sort_order = EXCLUDED.sort_order
            RETURNING {TESTIMONIAL_COLUMNS}
            "
        ))
        .bind(&seed.author)
        .bind(&seed.relationship)
        .bind(seed.care_category)
        .bind(&seed.quote)
        .bind(seed.rating)
        .bind(seed.sort_order)
        .fetch_one(self.pool)
        .await?;

        Ok(testimonial)
    }
}
