#![forbid(unsafe_code)]

use skiff_core::Identity;
use skiff_dataselect::{property, select, ComparableValue, DataCell, FilterBy, SelectQuery, SortBy};

#[derive(Debug, Clone, PartialEq)]
struct Item {
    id: u32,
    name: String,
    ns: String,
}

impl DataCell for Item {
    fn identity(&self) -> Identity { Identity { name: self.name.clone(), namespace: Some(self.ns.clone()), ..Default::default() } }
    fn property(&self, name: &str) -> Option<ComparableValue> {
        match name {
            property::NAME => Some(self.name.as_str().into()),
            property::NAMESPACE => Some(self.ns.as_str().into()),
            _ => None,
        }
    }
}

fn items() -> Vec<Item> {
    (0..40u32)
        .map(|i| Item { id: i, name: format!("app-{}", i % 7), ns: format!("ns-{}", i % 3) })
        .collect()
}

#[test]
fn repeated_runs_produce_identical_pages() {
    let q = SelectQuery::none()
        .filter_by(FilterBy::contains(property::NAME, "app"))
        .sort_by(SortBy::asc(property::NAMESPACE))
        .sort_by(SortBy::desc(property::NAME))
        .paginate(6, 3);
    let a = select(items(), &q);
    let b = select(items(), &q);
    assert_eq!(a, b);
    assert_eq!(a.total_items, 40);
    assert_eq!(a.items.len(), 6);
}

#[test]
fn equal_keys_keep_insertion_order_across_pages() {
    let q = SelectQuery::none().sort_by(SortBy::asc(property::NAMESPACE));
    let all = select(items(), &q).items;
    for w in all.windows(2) {
        if w[0].ns == w[1].ns { assert!(w[0].id < w[1].id, "stable order broken at {:?}", w); }
    }
    // Concatenated pages equal the unpaginated order.
    let mut paged = Vec::new();
    for page in 1..=7 {
        paged.extend(select(items(), &q.clone().paginate(7, page)).items);
    }
    assert_eq!(paged, all);
}
