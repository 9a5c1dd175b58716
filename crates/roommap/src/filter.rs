use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{api::RoomQuery, format::format_inr};

pub const DEFAULT_BUDGET: u32 = 12_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    PriceAsc,
    PriceDesc,
    SlotsDesc,
}

impl SortOrder {
    pub const ALL: [SortOrder; 3] = [Self::PriceAsc, Self::PriceDesc, Self::SlotsDesc];

    pub fn label(&self) -> &'static str {
        match self {
            Self::PriceAsc => "Price: low to high",
            Self::PriceDesc => "Price: high to low",
            Self::SlotsDesc => "Most open slots",
        }
    }
}

impl Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::PriceAsc => "price_asc",
                Self::PriceDesc => "price_desc",
                Self::SlotsDesc => "slots_desc",
            }
        )
    }
}

/// Current values of the search form controls.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchForm {
    pub query: String,
    pub property_type: String,
    pub sort: SortOrder,
    pub budget: Option<u32>,
    pub include_unverified: bool,
    pub findmates_only: bool,
}

impl Default for SearchForm {
    fn default() -> Self {
        Self {
            query: String::new(),
            property_type: String::new(),
            sort: SortOrder::default(),
            budget: Some(DEFAULT_BUDGET),
            include_unverified: false,
            findmates_only: true,
        }
    }
}

impl SearchForm {
    /// Snapshot of the filters as they stand right now.
    pub fn filters(&self) -> FilterState {
        let query = self.query.trim();
        let property_type = self.property_type.trim();

        FilterState {
            query: (!query.is_empty()).then(|| query.to_string()),
            property_type: (!property_type.is_empty()).then(|| property_type.to_string()),
            sort: self.sort,
            max_rent: self.budget,
            include_unverified: self.include_unverified,
            min_available: self.findmates_only.then_some(1),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn budget_label(&self) -> String {
        format_inr(self.budget.unwrap_or(0) as f64)
    }
}

/// Filters derived from the form at query time. Never cached between searches.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterState {
    pub query: Option<String>,
    pub property_type: Option<String>,
    pub sort: SortOrder,
    pub max_rent: Option<u32>,
    pub include_unverified: bool,
    pub min_available: Option<u32>,
}

impl FilterState {
    pub fn to_query(&self, limit: u32) -> RoomQuery {
        RoomQuery {
            limit: Some(limit),
            property_type: self.property_type.clone(),
            sort: Some(self.sort),
            max_rent: self.max_rent,
            q: self.query.clone(),
            include_unverified: Some(u8::from(self.include_unverified)),
            min_available: self.min_available,
            room_id: None,
        }
    }

    /// Status line shown after a successful search, e.g.
    /// `42 total matches · Budget ≤ ₹12,000 · Type: pg`.
    pub fn summary(&self, total: u64) -> String {
        let mut bits = Vec::with_capacity(4);
        if total > 0 {
            bits.push(format!("{total} total matches"));
        }
        if let Some(max_rent) = self.max_rent.filter(|rent| *rent > 0) {
            bits.push(format!("Budget ≤ {}", format_inr(max_rent as f64)));
        }
        if let Some(property_type) = &self.property_type {
            bits.push(format!("Type: {property_type}"));
        }
        if self.min_available.is_some() {
            bits.push("Findmates enabled".to_string());
        }

        bits.join(" · ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_not_a_filter() {
        let form = SearchForm {
            query: "   ".to_string(),
            property_type: String::new(),
            ..Default::default()
        };

        let filters = form.filters();
        assert_eq!(filters.query, None);
        assert_eq!(filters.property_type, None);
        assert_eq!(filters.max_rent, Some(DEFAULT_BUDGET));
        assert_eq!(filters.min_available, Some(1));
    }

    #[test]
    fn query_is_trimmed() {
        let form = SearchForm {
            query: "  powai ".to_string(),
            ..Default::default()
        };
        assert_eq!(form.filters().query.as_deref(), Some("powai"));
    }

    #[test]
    fn reset_restores_defaults() {
        let mut form = SearchForm {
            query: "bandra".to_string(),
            property_type: "hostel".to_string(),
            sort: SortOrder::SlotsDesc,
            budget: Some(5000),
            include_unverified: true,
            findmates_only: false,
        };
        form.reset();
        assert_eq!(form, SearchForm::default());
    }

    #[test]
    fn summary_lists_active_filters() {
        let filters = FilterState {
            property_type: Some("pg".to_string()),
            max_rent: Some(12000),
            min_available: Some(1),
            ..Default::default()
        };

        assert_eq!(
            filters.summary(42),
            "42 total matches · Budget ≤ ₹12,000 · Type: pg · Findmates enabled"
        );
        assert_eq!(FilterState::default().summary(0), "");
    }

    #[test]
    fn sort_order_wire_names() {
        assert_eq!(SortOrder::PriceAsc.to_string(), "price_asc");
        assert_eq!(
            serde_json::to_string(&SortOrder::SlotsDesc).unwrap(),
            "\"slots_desc\""
        );
    }
}
