use std::cmp::Ordering;

use serde::Deserialize;

use crate::models::tour::{Difficulty, TourPackage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TourSort {
    PriceAsc,
    PriceDesc,
    Duration,
    Rating,
    Featured,
}

/// Query string of `GET /api/tours`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TourFilter {
    pub difficulty: Option<Difficulty>,
    pub min_days: Option<u32>,
    pub max_days: Option<u32>,
    pub max_price: Option<f64>,
    pub search: Option<String>,
    pub sort: Option<TourSort>,
}

impl TourFilter {
    pub fn matches(&self, tour: &TourPackage) -> bool {
        if self.difficulty.is_some_and(|d| d != tour.difficulty) {
            return false;
        }
        if self.min_days.is_some_and(|min| tour.duration_days < min) {
            return false;
        }
        if self.max_days.is_some_and(|max| tour.duration_days > max) {
            return false;
        }
        if self.max_price.is_some_and(|max| tour.price_usd > max) {
            return false;
        }

        match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(term) => {
                let term = term.to_lowercase();
                tour.title.to_lowercase().contains(&term)
                    || tour.description.to_lowercase().contains(&term)
                    || tour
                        .destinations
                        .iter()
                        .any(|d| d.to_lowercase().contains(&term))
            }
            None => true,
        }
    }
}

/// Filters and orders the catalog in memory. Ties fall back to title so the listing is stable
/// between requests.
pub fn filter_and_sort(tours: Vec<TourPackage>, filter: &TourFilter) -> Vec<TourPackage> {
    let mut tours: Vec<TourPackage> = tours.into_iter().filter(|t| filter.matches(t)).collect();

    if let Some(sort) = filter.sort {
        tours.sort_by(|a, b| compare(sort, a, b).then_with(|| a.title.cmp(&b.title)));
    }
    tours
}

fn compare(sort: TourSort, a: &TourPackage, b: &TourPackage) -> Ordering {
    match sort {
        TourSort::PriceAsc => a.price_usd.total_cmp(&b.price_usd),
        TourSort::PriceDesc => b.price_usd.total_cmp(&a.price_usd),
        TourSort::Duration => a.duration_days.cmp(&b.duration_days),
        TourSort::Rating => b
            .rating
            .unwrap_or(0.0)
            .total_cmp(&a.rating.unwrap_or(0.0)),
        TourSort::Featured => b.featured.cmp(&a.featured),
    }
}
