//! Read-only catalog rows shown on the marketing and pricing pages.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::types::{
    CareCategory, CaregiverId, OfferingId, PackageId, PackageTier, Price, TestimonialId,
};

/// A monthly care package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct MonthlyPackage {
    pub id: PackageId,
    pub name: String,
    pub care_category: CareCategory,
    pub tier: PackageTier,
    pub monthly_price: Price,
    pub hours_per_month: i32,
    pub description: String,
    pub features: Vec<String>,
    pub sort_order: i32,
}

/// An hourly service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct ServiceOffering {
    pub id: OfferingId,
    pub name: String,
    pub care_category: CareCategory,
    pub hourly_rate: Price,
    pub description: String,
    pub sort_order: i32,
}

/// A caregiver profile shown to families.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Caregiver {
    pub id: CaregiverId,
    pub name: String,
    pub specialty: CareCategory,
    pub years_experience: i32,
    /// 0.0 to 5.0, one decimal place.
    pub rating: Decimal,
    pub bio: String,
    pub is_active: bool,
}

/// A family's review of the care they received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Testimonial {
    pub id: TestimonialId,
    pub author: String,
    /// How the author relates to the person cared for, e.g. "Daughter of a client".
    pub relationship: String,
    pub care_category: CareCategory,
    pub quote: String,
    /// Whole stars, 1 to 5.
    pub rating: i16,
    pub sort_order: i32,
}

/// Highest rating a testimonial can carry.
pub const MAX_TESTIMONIAL_RATING: i16 = 5;

impl Testimonial {
    /// Filled and empty stars, `★★★★☆` for a four.
    #[must_use]
    pub fn stars(&self) -> String {
        let filled = usize::try_from(self.rating.clamp(0, MAX_TESTIMONIAL_RATING)).unwrap_or(0);
        let empty = usize::try_from(MAX_TESTIMONIAL_RATING).unwrap_or(0) - filled;
        format!("{}{}", "★".repeat(filled), "☆".repeat(empty))
    }
}

/// Pick up to `limit` testimonials for the home page.
///
/// Childcare and eldercare reviews alternate so both audiences see one near
/// the top. Within a category the file order wins.
#[must_use]
pub fn featured_testimonials(testimonials: Vec<Testimonial>, limit: usize) -> Vec<Testimonial> {
    let (mut child, mut elderly): (Vec<_>, Vec<_>) = testimonials
        .into_iter()
        .partition(|t| t.care_category == CareCategory::Child);
    child.sort_by_key(|t| t.sort_order);
    elderly.sort_by_key(|t| t.sort_order);

    let mut child = child.into_iter();
    let mut elderly = elderly.into_iter();
    let mut featured = Vec::with_capacity(limit);
    while featured.len() < limit {
        match (child.next(), elderly.next()) {
            (None, None) => break,
            (a, b) => featured.extend(a.into_iter().chain(b)),
        }
    }
    featured.truncate(limit);
    featured
}

/// Packages split by care category, each ordered basic to premium.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageShelf {
    pub child: Vec<MonthlyPackage>,
    pub elderly: Vec<MonthlyPackage>,
}

impl PackageShelf {
    #[must_use]
    pub fn partition(packages: Vec<MonthlyPackage>) -> Self {
        let (mut child, mut elderly): (Vec<_>, Vec<_>) = packages
            .into_iter()
            .partition(|p| p.care_category == CareCategory::Child);
        child.sort_by_key(|p| (p.tier, p.sort_order));
        elderly.sort_by_key(|p| (p.tier, p.sort_order));
        Self { child, elderly }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.child.is_empty() && self.elderly.is_empty()
    }
}

/// Split hourly offerings the same way as packages.
#[must_use]
pub fn offerings_by_category(
    offerings: Vec<ServiceOffering>,
) -> (Vec<ServiceOffering>, Vec<ServiceOffering>) {
    let (mut child, mut elderly): (Vec<_>, Vec<_>) = offerings
        .into_iter()
        .partition(|o| o.care_category == CareCategory::Child);
    child.sort_by_key(|o| o.sort_order);
    elderly.sort_by_key(|o| o.sort_order);
    (child, elderly)
}

/// Headline numbers for the caregivers section of the home page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CaregiverStats {
    pub active: usize,
    pub childcare_specialists: usize,
    pub eldercare_specialists: usize,
    pub combined_years: i64,
    /// Mean rating of active caregivers, one decimal place.
    pub average_rating: Option<Decimal>,
}

impl CaregiverStats {
    #[must_use]
    pub fn from_caregivers(caregivers: &[Caregiver]) -> Self {
        let active: Vec<&Caregiver> = caregivers.iter().filter(|c| c.is_active).collect();
        if active.is_empty() {
            return Self::default();
        }

        let rating_sum: Decimal = active.iter().map(|c| c.rating).sum();
        let average_rating = Some(
            (rating_sum / Decimal::from(active.len()))
                .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero),
        );

        Self {
            active: active.len(),
            childcare_specialists: active
                .iter()
                .filter(|c| c.specialty == CareCategory::Child)
                .count(),
            eldercare_specialists: active
                .iter()
                .filter(|c| c.specialty == CareCategory::Elderly)
                .count(),
            combined_years: active.iter().map(|c| i64::from(c.years_experience)).sum(),
            average_rating,
        }
    }
}
