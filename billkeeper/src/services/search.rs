//! Bill search service
//!
//! Filtering and sorting for the bills list. Runs over the full collection
//! on every call; collections are personal-sized.

use crate::store::{AppStore, Bill, BillStatus};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BillSort {
    #[default]
    DueDate,
    Amount,
    Status,
    Category,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Bills list filter
#[derive(Debug, Clone, Default)]
pub struct BillQuery {
    /// Case-insensitive match over description and category name
    pub text: Option<String>,
    pub status: Option<BillStatus>,
    pub category_id: Option<String>,
    pub sort: BillSort,
    pub order: SortOrder,
}

impl BillQuery {
    pub fn text(query: impl Into<String>) -> Self {
        Self {
            text: Some(query.into()),
            ..Self::default()
        }
    }
}

/// Bills matching `query`, sorted as requested
pub fn search_bills(store: &AppStore, query: &BillQuery) -> Vec<Bill> {
    let needle = query
        .text
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_lowercase);

    let mut results: Vec<Bill> = store
        .bills()
        .iter()
        .filter(|bill| query.status.map_or(true, |status| bill.status == status))
        .filter(|bill| {
            query
                .category_id
                .as_deref()
                .map_or(true, |id| bill.category_id == id)
        })
        .filter(|bill| match &needle {
            Some(needle) => {
                bill.description.to_lowercase().contains(needle)
                    || store
                        .category_name_for(bill)
                        .to_lowercase()
                        .contains(needle)
            }
            None => true,
        })
        .cloned()
        .collect();

    results.sort_by(|a, b| {
        let ordering = compare(store, query.sort, a, b);
        match query.order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });

    results
}

fn compare(store: &AppStore, sort: BillSort, a: &Bill, b: &Bill) -> Ordering {
    match sort {
        BillSort::DueDate => a.due_date.cmp(&b.due_date),
        BillSort::Amount => a.amount.cmp(&b.amount),
        BillSort::Status => a.status.as_str().cmp(b.status.as_str()),
        BillSort::Category => store
            .category_name_for(a)
            .to_lowercase()
            .cmp(&store.category_name_for(b).to_lowercase()),
        BillSort::CreatedAt => a.created_at.cmp(&b.created_at),
    }
    .then_with(|| a.due_date.cmp(&b.due_date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{BillPatch, NewBill, NewCategory};
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    fn seeded_store() -> AppStore {
        let mut store = AppStore::in_memory();

        let utilities = store
            .add_category(NewCategory {
                name: "Utilities".to_string(),
                color: "#FF9500".to_string(),
                icon: "zap".to_string(),
                budget_limit: None,
            })
            .unwrap();

        let bills = [
            ("Electricity Bill", 8900, 15, utilities.id.as_str()),
            ("Internet Service", 7999, 18, "gone"),
            ("Water Bill", 4550, 20, utilities.id.as_str()),
        ];

        for (description, cents, day, category_id) in bills {
            store
                .add_bill(NewBill {
                    amount: Decimal::new(cents, 2),
                    date: Utc::now(),
                    due_date: Utc.with_ymd_and_hms(2024, 2, day, 0, 0, 0).unwrap(),
                    category_id: category_id.to_string(),
                    description: description.to_string(),
                    attachments: Vec::new(),
                    is_recurring: false,
                    recurring_frequency: None,
                    status: BillStatus::Unpaid,
                })
                .unwrap();
        }

        store
    }

    fn descriptions(bills: &[Bill]) -> Vec<&str> {
        bills.iter().map(|b| b.description.as_str()).collect()
    }

    #[test]
    fn test_text_matches_description() {
        let store = seeded_store();
        let results = search_bills(&store, &BillQuery::text("WATER"));
        assert_eq!(descriptions(&results), vec!["Water Bill"]);
    }

    #[test]
    fn test_text_matches_category_name() {
        let store = seeded_store();

        let results = search_bills(&store, &BillQuery::text("utilities"));
        assert_eq!(descriptions(&results), vec!["Electricity Bill", "Water Bill"]);

        let results = search_bills(&store, &BillQuery::text("uncategorized"));
        assert_eq!(descriptions(&results), vec!["Internet Service"]);
    }

    #[test]
    fn test_blank_text_matches_everything() {
        let store = seeded_store();
        assert_eq!(search_bills(&store, &BillQuery::text("  ")).len(), 3);
    }

    #[test]
    fn test_status_filter_and_amount_sort() {
        let mut store = seeded_store();
        let water_id = store
            .bills()
            .iter()
            .find(|b| b.description == "Water Bill")
            .unwrap()
            .id
            .clone();
        store
            .update_bill(&water_id, BillPatch::status(BillStatus::Paid))
            .unwrap();

        let unpaid = search_bills(
            &store,
            &BillQuery {
                status: Some(BillStatus::Unpaid),
                sort: BillSort::Amount,
                order: SortOrder::Descending,
                ..BillQuery::default()
            },
        );
        assert_eq!(
            descriptions(&unpaid),
            vec!["Electricity Bill", "Internet Service"]
        );
    }

    #[test]
    fn test_category_filter_and_due_date_sort() {
        let store = seeded_store();
        let utilities_id = store.categories()[0].id.clone();

        let results = search_bills(
            &store,
            &BillQuery {
                category_id: Some(utilities_id),
                order: SortOrder::Descending,
                ..BillQuery::default()
            },
        );
        assert_eq!(descriptions(&results), vec!["Water Bill", "Electricity Bill"]);
    }
}
