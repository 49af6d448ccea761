use crate::data::Filter;
use serde::Serialize;
use std::str::FromStr;

pub const DEFAULT_PAGE_NUMBER: u64 = 1;
pub const DEFAULT_PAGE_SIZE: u64 = 10;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ascending" | "asc" => Ok(SortDirection::Ascending),
            "descending" | "desc" => Ok(SortDirection::Descending),
            _ => Err(format!(
                "invalid sort direction: {} (expected ascending or descending)",
                s
            )),
        }
    }
}

/// Everything `get_page` needs: paging window, ordering and the filter conjunction.
/// `sort_by` uses the external (camelCase) field name.
#[derive(Clone, Debug)]
pub struct PageRequest {
    pub page_number: u64,
    pub page_size: u64,
    pub omit_pagination: bool,
    pub sort_by: Option<String>,
    pub sort_direction: SortDirection,
    pub filters: Vec<Filter>,
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page_number: DEFAULT_PAGE_NUMBER,
            page_size: DEFAULT_PAGE_SIZE,
            omit_pagination: false,
            sort_by: None,
            sort_direction: SortDirection::Ascending,
            filters: Vec::new(),
        }
    }
}

impl PageRequest {
    pub fn new(page_number: u64, page_size: u64) -> Self {
        PageRequest {
            page_number,
            page_size,
            ..Default::default()
        }
    }

    pub fn sorted_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_by = Some(field.into());
        self.sort_direction = direction;
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn unpaginated(mut self) -> Self {
        self.omit_pagination = true;
        self
    }

    /// `(LIMIT, OFFSET)` for the requested page. Page numbers below 1 count as 1.
    ///
    /// `None` when the page starts beyond the largest offset PostgreSQL accepts;
    /// no table holds that many rows, so such a page is empty. A page size past
    /// the bigint range is capped, which still covers every row.
    pub fn window(&self) -> Option<(i64, i64)> {
        let skip = (self.page_number.max(1) - 1).checked_mul(self.page_size)?;
        let offset = i64::try_from(skip).ok()?;
        let limit = i64::try_from(self.page_size).unwrap_or(i64::MAX);
        Some((limit, offset))
    }
}

/// One page of results plus the number of rows matching the filters.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64) -> Self {
        Page { items, total }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 10, Some((10, 0)))]
    #[case(2, 10, Some((10, 10)))]
    #[case(5, 3, Some((3, 12)))]
    #[case(0, 10, Some((10, 0)))]
    #[case(1, u64::MAX, Some((i64::MAX, 0)))]
    #[case(2, 1 << 63, None)]
    #[case(3_000_000_000, 4_000_000_000, None)]
    #[case(u64::MAX, u64::MAX, None)]
    fn window_skips_previous_pages(#[case] page: u64, #[case] size: u64, #[case] expected: Option<(i64, i64)>) {
        assert_eq!(PageRequest::new(page, size).window(), expected);
    }

    #[rstest]
    #[case("ascending", SortDirection::Ascending)]
    #[case("DESC", SortDirection::Descending)]
    #[case("descending", SortDirection::Descending)]
    fn sort_direction_parses_names_and_aliases(#[case] input: &str, #[case] expected: SortDirection) {
        assert_eq!(input.parse::<SortDirection>(), Ok(expected));
    }

    #[test]
    fn sort_direction_rejects_unknown_values() {
        assert!("sideways".parse::<SortDirection>().is_err());
    }

    #[test]
    fn page_map_keeps_total() {
        let page = Page::new(vec![1, 2, 3], 42).map(|n| n * 2);
        assert_eq!(page.items, vec![2, 4, 6]);
        assert_eq!(page.total, 42);
    }
}
