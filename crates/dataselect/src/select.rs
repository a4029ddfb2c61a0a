//! Filter → sort → paginate. Each stage is total over its input and moves
//! items without touching them.

use smallvec::SmallVec;

use crate::cell::{ComparableValue, DataCell};
use crate::query::{FilterBy, Pagination, SelectQuery, SortBy};

/// Output of the synchronous stages.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<T> {
    /// Count after filtering, before pagination.
    pub total_items: usize,
    pub items: Vec<T>,
}

pub fn filter<T: DataCell>(items: Vec<T>, by: &[FilterBy]) -> Vec<T> {
    if by.is_empty() { return items; }
    items
        .into_iter()
        .filter(|item| {
            by.iter().all(|f| item.property(&f.property).map(|v| f.matches(&v.render())).unwrap_or(false))
        })
        .collect()
}

/// Stable multi-key sort. Items without a property order before items with it;
/// full ties keep input order.
pub fn sort<T: DataCell>(items: Vec<T>, by: &[SortBy]) -> Vec<T> {
    if by.is_empty() { return items; }
    let mut keyed: Vec<(SmallVec<[Option<ComparableValue>; 2]>, T)> = items
        .into_iter()
        .map(|item| (by.iter().map(|s| item.property(&s.property)).collect(), item))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| {
        let mut ord = std::cmp::Ordering::Equal;
        for (i, s) in by.iter().enumerate() {
            let o = a[i].cmp(&b[i]);
            ord = if s.ascending { o } else { o.reverse() };
            if ord.is_ne() { break; }
        }
        ord
    });
    keyed.into_iter().map(|(_, item)| item).collect()
}

pub fn paginate<T>(items: Vec<T>, pagination: &Pagination) -> Vec<T> {
    match pagination.window(items.len()) {
        None => items,
        Some(range) => items.into_iter().skip(range.start).take(range.len()).collect(),
    }
}

/// Filter and sort, leaving the full ordered list unpaged.
pub fn filter_sort<T: DataCell>(items: Vec<T>, query: &SelectQuery) -> Vec<T> {
    let before = items.len();
    let filtered = filter(items, &query.filter);
    metrics::histogram!("dataselect_items_filtered", (before - filtered.len()) as f64);
    sort(filtered, &query.sort)
}

/// Run the synchronous stages. `total_items` is taken before pagination.
pub fn select<T: DataCell>(items: Vec<T>, query: &SelectQuery) -> Selection<T> {
    let sorted = filter_sort(items, query);
    let total_items = sorted.len();
    let items = paginate(sorted, &query.pagination);
    Selection { total_items, items }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::property;
    use skiff_core::Identity;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        name: &'static str,
        ns: &'static str,
        n: Option<i64>,
    }

    impl DataCell for Row {
        fn identity(&self) -> Identity { Identity { name: self.name.into(), ..Default::default() } }
        fn property(&self, name: &str) -> Option<ComparableValue> {
            match name {
                property::NAME => Some(self.name.into()),
                property::NAMESPACE => Some(self.ns.into()),
                property::COUNT => self.n.map(Into::into),
                _ => None,
            }
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { name: "web-1", ns: "b", n: Some(3) },
            Row { name: "api", ns: "a", n: Some(1) },
            Row { name: "web-2", ns: "a", n: None },
            Row { name: "db", ns: "b", n: Some(3) },
        ]
    }

    fn names(v: &[Row]) -> Vec<&'static str> { v.iter().map(|r| r.name).collect() }

    #[test]
    fn default_query_is_pass_through() {
        let s = select(rows(), &SelectQuery::none());
        assert_eq!(s.total_items, 4);
        assert_eq!(names(&s.items), vec!["web-1", "api", "web-2", "db"]);
    }

    #[test]
    fn filters_are_conjunctive() {
        let q = SelectQuery::none()
            .filter_by(FilterBy::contains(property::NAME, "web"))
            .filter_by(FilterBy::exact(property::NAMESPACE, "a"));
        assert_eq!(names(&select(rows(), &q).items), vec!["web-2"]);
    }

    #[test]
    fn missing_property_never_matches_a_filter() {
        let q = SelectQuery::none().filter_by(FilterBy::exact(property::COUNT, "3"));
        assert_eq!(names(&select(rows(), &q).items), vec!["web-1", "db"]);
        let q = SelectQuery::none().filter_by(FilterBy::exact("bogus", ""));
        assert_eq!(select(rows(), &q).total_items, 0);
    }

    #[test]
    fn sort_keys_tie_break_in_order() {
        let q = SelectQuery::none().sort_by(SortBy::asc(property::NAMESPACE)).sort_by(SortBy::desc(property::NAME));
        assert_eq!(names(&select(rows(), &q).items), vec!["web-2", "api", "web-1", "db"]);
    }

    #[test]
    fn sort_is_stable_on_equal_keys() {
        let q = SelectQuery::none().sort_by(SortBy::desc(property::COUNT));
        // web-1 and db share count 3 and keep their input order; web-2 has no count.
        assert_eq!(names(&select(rows(), &q).items), vec!["web-1", "db", "api", "web-2"]);
        let q = SelectQuery::none().sort_by(SortBy::asc(property::COUNT));
        assert_eq!(names(&select(rows(), &q).items), vec!["web-2", "api", "web-1", "db"]);
    }

    #[test]
    fn total_is_independent_of_pagination() {
        let base = SelectQuery::none().filter_by(FilterBy::contains(property::NAME, "b"));
        for (per, page) in [(0, 0), (1, 1), (2, 1), (2, 2), (10, 1), (1, 99), (-1, 5)] {
            let s = select(rows(), &base.clone().paginate(per, page));
            assert_eq!(s.total_items, 3, "per={per} page={page}");
            if per <= 0 { assert_eq!(s.items.len(), 3); } else { assert!(s.items.len() as i64 <= per); }
        }
    }

    #[test]
    fn pages_slice_the_sorted_list() {
        let q = SelectQuery::none().sort_by(SortBy::asc(property::NAME)).paginate(3, 2);
        let s = select(rows(), &q);
        assert_eq!(names(&s.items), vec!["web-2"]);
        let s = select(rows(), &q.clone().paginate(3, 3));
        assert!(s.items.is_empty());
        assert_eq!(s.total_items, 4);
    }
}
