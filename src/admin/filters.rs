//! Parsing of list-view query parameters and their translation into SQL
//! conditions.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::Serialize;
use sqlx::{Postgres, QueryBuilder};
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::admin::options::{FilterChoice, ListFilter, ModelOptions};

pub const SEARCH_PARAM: &str = "q";
pub const PAGE_PARAM: &str = "p";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidFilter(pub String);

impl fmt::Display for InvalidFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvalidFilter {}

#[derive(Debug, Clone, PartialEq)]
enum Bound {
    Bool(bool),
    Id(Uuid),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Equals {
        column: &'static str,
        value: Bound,
    },
    AtLeast {
        column: &'static str,
        value: OffsetDateTime,
    },
    Before {
        column: &'static str,
        value: OffsetDateTime,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppliedFilter {
    pub parameter: String,
    pub raw: String,
    condition: Condition,
}

/// A parsed list-view request: search terms, applied filters and the page.
/// Rows skipped before `page`. `None` for pages below 1 or past what an
/// `i64` offset can address.
pub fn page_offset(page: i64, per_page: i64) -> Option<i64> {
    if page < 1 {
        return None;
    }
    (page - 1).checked_mul(per_page)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChangeListRequest {
    pub query: Option<String>,
    pub terms: Vec<String>,
    pub filters: Vec<AppliedFilter>,
    pub page: i64,
    pub per_page: i64,
}

impl ChangeListRequest {
    /// Parameters that no configured filter reads are ignored.
    pub fn parse(
        options: &ModelOptions,
        params: &HashMap<String, String>,
    ) -> Result<Self, InvalidFilter> {
        let query = params
            .get(SEARCH_PARAM)
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty());
        let terms = match (&query, options.search_fields.is_empty()) {
            (Some(query), false) => query.split_whitespace().map(str::to_string).collect(),
            _ => Vec::new(),
        };

        let page = match params.get(PAGE_PARAM) {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|page| page_offset(*page, options.list_per_page).is_some())
                .ok_or_else(|| InvalidFilter(format!("invalid page: {}", raw)))?,
            None => 1,
        };

        let mut filters = Vec::new();
        for filter in &options.list_filter {
            parse_filter(filter, params, &mut filters)?;
        }

        Ok(Self {
            query,
            terms,
            filters,
            page,
            per_page: options.list_per_page,
        })
    }

    pub fn offset(&self) -> i64 {
        page_offset(self.page, self.per_page).unwrap_or(i64::MAX)
    }

    /// Appends ` AND ...` for every search term and filter. The builder must
    /// already contain a `WHERE` clause.
    pub fn push_conditions(&self, options: &ModelOptions, builder: &mut QueryBuilder<'_, Postgres>) {
        // Every term must match at least one search field.
        for term in &self.terms {
            let pattern = format!("%{}%", escape_like_pattern(term));
            builder.push(" AND (");
            for (index, field) in options.search_fields.iter().enumerate() {
                if index > 0 {
                    builder.push(" OR ");
                }
                builder
                    .push(field.column)
                    .push(" ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" ESCAPE '\\'");
            }
            builder.push(")");
        }

        for filter in &self.filters {
            match &filter.condition {
                Condition::Equals { column, value } => {
                    builder.push(" AND ").push(*column).push(" = ");
                    match value {
                        Bound::Bool(value) => builder.push_bind(*value),
                        Bound::Id(value) => builder.push_bind(*value),
                        Bound::Text(value) => builder.push_bind(value.clone()),
                    };
                }
                Condition::AtLeast { column, value } => {
                    builder.push(" AND ").push(*column).push(" >= ").push_bind(*value);
                }
                Condition::Before { column, value } => {
                    builder.push(" AND ").push(*column).push(" < ").push_bind(*value);
                }
            }
        }
    }

    /// Selected raw values keyed by parameter, for the given filter.
    pub fn selected(&self, filter: &ListFilter) -> BTreeMap<String, String> {
        let parameters = filter.parameters();
        self.filters
            .iter()
            .filter(|applied| parameters.contains(&applied.parameter))
            .map(|applied| (applied.parameter.clone(), applied.raw.clone()))
            .collect()
    }
}

fn parse_filter(
    filter: &ListFilter,
    params: &HashMap<String, String>,
    out: &mut Vec<AppliedFilter>,
) -> Result<(), InvalidFilter> {
    match filter {
        ListFilter::Boolean { field, column } => {
            let parameter = format!("{}__exact", field);
            if let Some(raw) = non_empty(params, &parameter) {
                let value = match raw {
                    "1" | "true" | "True" => true,
                    "0" | "false" | "False" => false,
                    _ => {
                        return Err(InvalidFilter(format!("invalid value for {}: {}", parameter, raw)))
                    }
                };
                out.push(AppliedFilter {
                    parameter,
                    raw: raw.to_string(),
                    condition: Condition::Equals {
                        column: *column,
                        value: Bound::Bool(value),
                    },
                });
            }
        }
        ListFilter::DateRange { field, column } => {
            let gte = format!("{}__range__gte", field);
            if let Some(raw) = non_empty(params, &gte) {
                let date = parse_date(&gte, raw)?;
                out.push(AppliedFilter {
                    parameter: gte,
                    raw: raw.to_string(),
                    condition: Condition::AtLeast {
                        column: *column,
                        value: date.midnight().assume_utc(),
                    },
                });
            }

            let lte = format!("{}__range__lte", field);
            if let Some(raw) = non_empty(params, &lte) {
                let date = parse_date(&lte, raw)?;
                // Inclusive through the end of the given day.
                let end = date
                    .next_day()
                    .ok_or_else(|| InvalidFilter(format!("invalid value for {}: {}", lte, raw)))?;
                out.push(AppliedFilter {
                    parameter: lte,
                    raw: raw.to_string(),
                    condition: Condition::Before {
                        column: *column,
                        value: end.midnight().assume_utc(),
                    },
                });
            }
        }
        ListFilter::Related {
            parameter, column, ..
        } => {
            // `column` is qualified with its table, e.g. `comments.post_id`.
            if let Some(raw) = non_empty(params, parameter) {
                let id = Uuid::parse_str(raw)
                    .map_err(|_| InvalidFilter(format!("invalid value for {}: {}", parameter, raw)))?;
                out.push(AppliedFilter {
                    parameter: parameter.to_string(),
                    raw: raw.to_string(),
                    condition: Condition::Equals {
                        column: *column,
                        value: Bound::Id(id),
                    },
                });
            }
        }
        ListFilter::Choice {
            field,
            column,
            choices,
        } => {
            let parameter = format!("{}__exact", field);
            if let Some(raw) = non_empty(params, &parameter) {
                if !choices.iter().any(|choice| choice.value == raw) {
                    return Err(InvalidFilter(format!("invalid value for {}: {}", parameter, raw)));
                }
                out.push(AppliedFilter {
                    parameter,
                    raw: raw.to_string(),
                    condition: Condition::Equals {
                        column: *column,
                        value: Bound::Text(raw.to_string()),
                    },
                });
            }
        }
    }

    Ok(())
}

fn non_empty<'a>(params: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

fn parse_date(parameter: &str, raw: &str) -> Result<Date, InvalidFilter> {
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .map_err(|_| InvalidFilter(format!("invalid date for {}: {}", parameter, raw)))
}

pub(crate) fn escape_like_pattern(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '%' | '_' | '\\' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// A filter as rendered in the list view sidebar.
#[derive(Debug, Clone, Serialize)]
pub struct FilterSpec {
    pub title: &'static str,
    pub kind: &'static str,
    pub parameters: Vec<String>,
    pub choices: Vec<FilterChoice>,
    pub selected: BTreeMap<String, String>,
}
