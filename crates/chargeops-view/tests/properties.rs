//! Property tests for the list pipeline

#![allow(clippy::unwrap_used, clippy::cast_possible_wrap)]

use chargeops_core::{EntityKind, Record};
use chargeops_view::enrich::{REPORTS_FIELD, REVIEWS_FIELD, enrich};
use chargeops_view::{Direction, FieldKind, ListView, Selection, SortSpec, UserStats};
use chargeops_view::sort::sort_records;
use chrono::Utc;
use proptest::prelude::*;
use rstest::rstest;

const STATUSES: [&str; 3] = ["Available", "Charging", "Finishing"];

fn charger_strategy() -> impl Strategy<Value = (String, usize, bool, i64)> {
    ("[a-zA-Z ]{0,12}", 0..STATUSES.len(), any::<bool>(), 0i64..6)
}

fn chargers(specs: Vec<(String, usize, bool, i64)>) -> Vec<Record> {
    specs
        .into_iter()
        .enumerate()
        .map(|(i, (name, status, enabled, ratings))| {
            Record::new()
                .with("id", i as i64 + 1)
                .with("name", name)
                .with("status", STATUSES[status])
                .with("enabled", enabled)
                .with("ratings", ratings)
        })
        .collect()
}

fn feedback_strategy() -> impl Strategy<Value = Vec<(i64, i64, bool)>> {
    prop::collection::vec((0i64..5, 1i64..=5, any::<bool>()), 0..40)
}

proptest! {
    /// Filtered records are a subset of the collection and all satisfy the filter
    #[test]
    fn filtered_is_subset(specs in prop::collection::vec(charger_strategy(), 0..40), term in "[a-z]{0,2}", status in 0..STATUSES.len()) {
        let records = chargers(specs);
        let mut view = ListView::for_kind(EntityKind::Charger, 8);
        view.replace_collection(records.clone());
        view.set_term(term.clone());
        view.select("status", Selection::parse(STATUSES[status])).unwrap();

        for row in view.filtered() {
            prop_assert!(records.contains(row));
            prop_assert_eq!(row.text("status"), STATUSES[status]);
            prop_assert!(row.text("name").to_lowercase().contains(&term));
        }
    }

    /// Clearing the term leaves exactly the categorical-only set
    #[test]
    fn clearing_term_restores_categorical_set(specs in prop::collection::vec(charger_strategy(), 0..40), term in "[a-z]{1,3}") {
        let mut view = ListView::for_kind(EntityKind::Charger, 8);
        view.replace_collection(chargers(specs));
        view.select("enabled", Selection::parse("enabled")).unwrap();
        let categorical: Vec<Record> = view.filtered().into_iter().cloned().collect();

        view.set_term(term);
        view.set_term("");
        let restored: Vec<Record> = view.filtered().into_iter().cloned().collect();
        prop_assert_eq!(restored, categorical);
    }

    /// Sorting is idempotent
    #[test]
    fn sort_is_idempotent(specs in prop::collection::vec(charger_strategy(), 0..40), desc in any::<bool>()) {
        let records = chargers(specs);
        let spec = SortSpec {
            field: "ratings".to_string(),
            direction: if desc { Direction::Descending } else { Direction::Ascending },
        };
        let mut once: Vec<&Record> = records.iter().collect();
        sort_records(&mut once, &spec, Some(FieldKind::Number));
        let mut twice = once.clone();
        sort_records(&mut twice, &spec, Some(FieldKind::Number));
        prop_assert_eq!(once, twice);
    }

    /// With unique keys, toggling the direction reverses the order
    #[test]
    fn toggle_reverses_unique_keys(ids in prop::collection::hash_set(0i64..1000, 0..40)) {
        let records: Vec<Record> = ids.into_iter().map(|id| Record::new().with("id", id)).collect();
        let mut spec = SortSpec::ascending("id");
        let mut ascending: Vec<&Record> = records.iter().collect();
        sort_records(&mut ascending, &spec, Some(FieldKind::Number));

        spec.toggle("id");
        let mut descending: Vec<&Record> = records.iter().collect();
        sort_records(&mut descending, &spec, Some(FieldKind::Number));

        descending.reverse();
        prop_assert_eq!(ascending, descending);
    }

    /// Concatenating every page reconstructs the sorted sequence
    #[test]
    fn pages_reconstruct_sorted(specs in prop::collection::vec(charger_strategy(), 0..60), page_size in 1usize..12) {
        let mut view = ListView::for_kind(EntityKind::Charger, page_size);
        view.replace_collection(chargers(specs));

        let sorted: Vec<Record> = view.sorted().into_iter().cloned().collect();
        let mut pages: Vec<Record> = Vec::new();
        loop {
            pages.extend(view.page().rows.into_iter().cloned());
            if !view.next_page() {
                break;
            }
        }
        prop_assert_eq!(pages, sorted);
    }

    /// Any filter or sort change returns to page 1
    #[test]
    fn view_changes_reset_page(specs in prop::collection::vec(charger_strategy(), 17..60), change in 0u8..4) {
        let mut view = ListView::for_kind(EntityKind::Charger, 8);
        view.replace_collection(chargers(specs));
        view.go_to(2).unwrap();

        match change {
            0 => view.set_term("a"),
            1 => view.toggle_sort("ratings"),
            2 => view.select("enabled", Selection::parse("disabled")).unwrap(),
            _ => view.set_sort(SortSpec::descending("name")),
        }
        prop_assert_eq!(view.current_page(), 1);
    }

    /// Reports never exceed reviews, and a low rating always counts as a report
    #[test]
    fn reports_bounded_by_reviews(entries in feedback_strategy()) {
        let records: Vec<Record> = entries
            .iter()
            .map(|(user, rating, technical)| {
                Record::new()
                    .with("userId", *user)
                    .with("rating", *rating)
                    .with("category", if *technical { "Technical Issue" } else { "General" })
            })
            .collect();

        for row in enrich(&records) {
            let reviews = row.number(REVIEWS_FIELD).unwrap();
            let reports = row.number(REPORTS_FIELD).unwrap();
            prop_assert!(reports <= reviews);
            if row.number("rating").unwrap() <= 2.0 {
                prop_assert!(reports >= 1.0);
            }
        }
    }
}

#[test]
fn admin_filter_matches_admin_stat() {
    let users: Vec<Record> = (0..10)
        .map(|i| {
            Record::new()
                .with("id", i)
                .with("name", format!("user{i}"))
                .with("email", format!("user{i}@example.com"))
                .with("role", if i < 3 { "admin" } else { "operator" })
        })
        .collect();

    let mut view = ListView::for_kind(EntityKind::User, 8);
    view.replace_collection(users.clone());
    view.select("role", Selection::parse("admin")).unwrap();

    assert_eq!(view.filtered().len(), 3);
    assert_eq!(UserStats::compute(&users, Utc::now()).admins, 3);
}

#[rstest]
#[case("tesla", 1)]
#[case("TESLA SUPER", 1)]
#[case("supercharger b", 0)]
fn search_finds_tesla(#[case] term: &str, #[case] expected: usize) {
    let mut view = ListView::for_kind(EntityKind::Charger, 8);
    view.replace_collection(vec![
        Record::new().with("id", 1).with("name", "Tesla Supercharger A").with("address", "1 Main St"),
        Record::new().with("id", 2).with("name", "Ionity Hub").with("address", "A7"),
    ]);
    view.set_term(term);
    assert_eq!(view.filtered().len(), expected);
}
