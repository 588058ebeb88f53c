//! Immutable PostgREST request specifications.
//!
//! A [`TableQuery`] names a table and accumulates the select list, row
//! filters, ordering and limit. Every builder method borrows the current
//! value and returns a new one, so a partially built query can be shared as
//! a template without one request's filters leaking into another.

use std::fmt;

use url::Url;

use super::client::RestClientError;

/// Path prefix PostgREST serves tables under.
const REST_PATH: [&str; 2] = ["rest", "v1"];

/// Sort direction for [`TableQuery::order`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

impl SortOrder {
    fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterOp {
    Eq,
    Neq,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Filter {
    column: String,
    op: FilterOp,
    value: String,
}

impl Filter {
    fn operand(&self) -> String {
        let op = match self.op {
            FilterOp::Eq => "eq",
            FilterOp::Neq => "neq",
        };
        format!("{op}.{}", self.value)
    }
}

/// Request specification for one table.
///
/// ```
/// use inventory::outbound::rest::{SortOrder, TableQuery};
/// use url::Url;
///
/// let base = Url::parse("https://db.example.test").unwrap();
/// let query = TableQuery::table("transactions")
///     .order("created_at", SortOrder::Descending)
///     .limit(10);
/// let url = query.read_url(&base).unwrap();
/// assert_eq!(
///     url.as_str(),
///     "https://db.example.test/rest/v1/transactions?select=*&order=created_at.desc&limit=10",
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQuery {
    table: String,
    columns: Option<String>,
    filters: Vec<Filter>,
    order: Option<(String, SortOrder)>,
    limit: Option<usize>,
}

impl TableQuery {
    /// Start a query against `table`.
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: None,
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Table name.
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Restrict the returned columns. Defaults to `*`.
    #[must_use]
    pub fn select(&self, columns: impl Into<String>) -> Self {
        Self {
            columns: Some(columns.into()),
            ..self.clone()
        }
    }

    /// Keep rows where `column` equals `value`.
    #[must_use]
    pub fn eq(&self, column: impl Into<String>, value: impl fmt::Display) -> Self {
        self.with_filter(column.into(), FilterOp::Eq, value.to_string())
    }

    /// Keep rows where `column` differs from `value`.
    #[must_use]
    pub fn neq(&self, column: impl Into<String>, value: impl fmt::Display) -> Self {
        self.with_filter(column.into(), FilterOp::Neq, value.to_string())
    }

    /// Sort by `column`. A later call replaces an earlier one.
    #[must_use]
    pub fn order(&self, column: impl Into<String>, direction: SortOrder) -> Self {
        Self {
            order: Some((column.into(), direction)),
            ..self.clone()
        }
    }

    /// Return at most `count` rows.
    #[must_use]
    pub fn limit(&self, count: usize) -> Self {
        Self {
            limit: Some(count),
            ..self.clone()
        }
    }

    fn with_filter(&self, column: String, op: FilterOp, value: String) -> Self {
        let mut next = self.clone();
        next.filters.push(Filter { column, op, value });
        next
    }

    /// URL for a read: select list, filters, ordering and limit.
    ///
    /// # Errors
    ///
    /// [`RestClientError::InvalidUrl`] when `base` cannot carry a path.
    pub fn read_url(&self, base: &Url) -> Result<Url, RestClientError> {
        let mut url = self.table_url(base)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("select", self.columns.as_deref().unwrap_or("*"));
            for filter in &self.filters {
                pairs.append_pair(&filter.column, &filter.operand());
            }
            if let Some((column, direction)) = &self.order {
                pairs.append_pair("order", &format!("{column}.{}", direction.as_str()));
            }
            if let Some(limit) = self.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
        }
        Ok(url)
    }

    /// URL for an insert. Filters, ordering and limit do not apply.
    ///
    /// # Errors
    ///
    /// [`RestClientError::InvalidUrl`] when `base` cannot carry a path.
    pub fn insert_url(&self, base: &Url) -> Result<Url, RestClientError> {
        let mut url = self.table_url(base)?;
        url.query_pairs_mut()
            .append_pair("select", self.columns.as_deref().unwrap_or("*"));
        Ok(url)
    }

    /// URL for an update or delete: filters only.
    ///
    /// # Errors
    ///
    /// [`RestClientError::InvalidUrl`] when `base` cannot carry a path.
    pub fn mutation_url(&self, base: &Url) -> Result<Url, RestClientError> {
        let mut url = self.table_url(base)?;
        if !self.filters.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for filter in &self.filters {
                pairs.append_pair(&filter.column, &filter.operand());
            }
        }
        Ok(url)
    }

    fn table_url(&self, base: &Url) -> Result<Url, RestClientError> {
        let mut url = base.clone();
        url.set_query(None);
        url.path_segments_mut()
            .map_err(|()| RestClientError::invalid_url(format!("{base} cannot be a base URL")))?
            .pop_if_empty()
            .extend(REST_PATH)
            .push(&self.table);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn base() -> Url {
        Url::parse("https://project.example.test").expect("valid base url")
    }

    #[rstest]
    fn renders_filters_order_and_limit(base: Url) {
        let url = TableQuery::table("daily_outbound")
            .eq("product_id", 42)
            .order("id", SortOrder::Ascending)
            .limit(1)
            .read_url(&base)
            .expect("url renders");
        assert_eq!(
            url.as_str(),
            "https://project.example.test/rest/v1/daily_outbound?select=*&product_id=eq.42&order=id.asc&limit=1"
        );
    }

    #[rstest]
    fn select_list_is_form_encoded(base: Url) {
        let url = TableQuery::table("products")
            .select("id,name")
            .read_url(&base)
            .expect("url renders");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs, [("select".to_owned(), "id,name".to_owned())]);
    }

    #[rstest]
    fn templates_do_not_leak_between_requests(base: Url) {
        let template = TableQuery::table("products");
        let first = template.eq("id", 1);
        let second = template.eq("barcode", "2345678901");

        let second_url = second.read_url(&base).expect("url renders");
        assert_eq!(
            second_url.query(),
            Some("select=*&barcode=eq.2345678901")
        );
        assert_ne!(first, second);
        assert_eq!(template, TableQuery::table("products"));
    }

    #[rstest]
    fn mutation_urls_carry_filters_only(base: Url) {
        let query = TableQuery::table("daily_outbound")
            .neq("id", 0)
            .order("id", SortOrder::Descending)
            .limit(3);
        let url = query.mutation_url(&base).expect("url renders");
        assert_eq!(url.query(), Some("id=neq.0"));
        let insert = query.insert_url(&base).expect("url renders");
        assert_eq!(insert.query(), Some("select=*"));
    }

    #[rstest]
    #[case("https://host.test", "https://host.test/rest/v1/products?select=*")]
    #[case("https://host.test/", "https://host.test/rest/v1/products?select=*")]
    #[case("https://host.test/proxy/", "https://host.test/proxy/rest/v1/products?select=*")]
    fn base_paths_are_preserved(#[case] raw: &str, #[case] expected: &str) {
        let base = Url::parse(raw).expect("valid base url");
        let url = TableQuery::table("products")
            .read_url(&base)
            .expect("url renders");
        assert_eq!(url.as_str(), expected);
    }

    #[test]
    fn rejects_cannot_be_a_base_urls() {
        let base = Url::parse("mailto:ops@example.test").expect("valid url");
        let error = TableQuery::table("products")
            .read_url(&base)
            .expect_err("mailto cannot carry a path");
        assert!(matches!(error, RestClientError::InvalidUrl { .. }));
    }
}
