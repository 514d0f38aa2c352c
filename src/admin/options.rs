//! Per-model admin options.
//!
//! A [`ModelAdmin`] pairs the untyped [`ModelOptions`] (what can be edited,
//! searched and filtered) with the typed columns of the list view. Columns are
//! plain `(name, label, extractor)` descriptors so every displayed value is
//! visible at the place the model is configured.

use serde::Serialize;
use serde_json::Value;

/// One column of the admin list view.
pub struct Column<T> {
    pub name: &'static str,
    pub label: &'static str,
    extract: fn(&T) -> Value,
}

impl<T> Column<T> {
    pub fn new(name: &'static str, label: &'static str, extract: fn(&T) -> Value) -> Self {
        Self {
            name,
            label,
            extract,
        }
    }

    pub fn value(&self, row: &T) -> Value {
        (self.extract)(row)
    }
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            label: self.label,
            extract: self.extract,
        }
    }
}

/// A field searched with a case-insensitive substring match.
#[derive(Debug, Clone, Copy)]
pub struct SearchField {
    /// Lookup name as shown to admins, e.g. `author__username`.
    pub name: &'static str,
    /// SQL expression matched against, e.g. `users.username`.
    pub column: &'static str,
}

impl SearchField {
    pub const fn new(name: &'static str, column: &'static str) -> Self {
        Self { name, column }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelatedTarget {
    User,
    Post,
}

impl RelatedTarget {
    pub fn table(&self) -> &'static str {
        match self {
            Self::User => "users",
            Self::Post => "posts",
        }
    }

    pub fn label_column(&self) -> &'static str {
        match self {
            Self::User => "username",
            Self::Post => "title",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterChoice {
    pub display: String,
    pub value: String,
}

impl FilterChoice {
    pub fn new(display: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            display: display.into(),
            value: value.into(),
        }
    }
}

/// Sidebar filters of the list view.
#[derive(Debug, Clone)]
pub enum ListFilter {
    /// `{field}__exact=1|0`.
    Boolean {
        field: &'static str,
        column: &'static str,
    },
    /// `{field}__range__gte` / `{field}__range__lte`, calendar dates, inclusive.
    DateRange {
        field: &'static str,
        column: &'static str,
    },
    /// `{parameter}=<uuid>` on the foreign key `column` (qualified, e.g.
    /// `comments.post_id`) of `table`; choices come from the targets that
    /// `table` actually references.
    Related {
        parameter: &'static str,
        table: &'static str,
        column: &'static str,
        target: RelatedTarget,
    },
    /// Dropdown over a closed set, `{field}__exact=<value>`.
    Choice {
        field: &'static str,
        column: &'static str,
        choices: Vec<FilterChoice>,
    },
}

impl ListFilter {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Boolean { field, .. }
            | Self::DateRange { field, .. }
            | Self::Choice { field, .. } => field,
            Self::Related { parameter, .. } => parameter,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Boolean { .. } => "boolean",
            Self::DateRange { .. } => "date_range",
            Self::Related { .. } => "related",
            Self::Choice { .. } => "choice",
        }
    }

    /// Query parameters this filter reads.
    pub fn parameters(&self) -> Vec<String> {
        match self {
            Self::Boolean { field, .. } | Self::Choice { field, .. } => {
                vec![format!("{}__exact", field)]
            }
            Self::DateRange { field, .. } => vec![
                format!("{}__range__gte", field),
                format!("{}__range__lte", field),
            ],
            Self::Related { parameter, .. } => vec![parameter.to_string()],
        }
    }
}

/// Everything about a model's admin that does not depend on its row type.
#[derive(Debug, Clone)]
pub struct ModelOptions {
    pub app_label: &'static str,
    pub model_name: &'static str,
    pub verbose_name_plural: &'static str,
    pub list_display_links: Vec<&'static str>,
    pub fields: Vec<&'static str>,
    pub readonly_fields: Vec<&'static str>,
    pub search_fields: Vec<SearchField>,
    pub list_filter: Vec<ListFilter>,
    pub autocomplete_fields: Vec<&'static str>,
    pub raw_id_fields: Vec<&'static str>,
    pub list_per_page: i64,
}

impl ModelOptions {
    pub fn new(app_label: &'static str, model_name: &'static str) -> Self {
        Self {
            app_label,
            model_name,
            verbose_name_plural: model_name,
            list_display_links: Vec::new(),
            fields: Vec::new(),
            readonly_fields: Vec::new(),
            search_fields: Vec::new(),
            list_filter: Vec::new(),
            autocomplete_fields: Vec::new(),
            raw_id_fields: Vec::new(),
            list_per_page: 100,
        }
    }

    /// `"app_label.model_name"`.
    pub fn key(&self) -> String {
        format!("{}.{}", self.app_label, self.model_name)
    }

    pub fn is_editable(&self, field: &str) -> bool {
        self.fields.iter().any(|name| *name == field)
    }
}

pub struct ModelAdmin<T> {
    pub options: ModelOptions,
    pub list_display: Vec<Column<T>>,
}

impl<T> ModelAdmin<T> {
    pub fn new(options: ModelOptions, list_display: Vec<Column<T>>) -> Self {
        Self {
            options,
            list_display,
        }
    }

    /// Defaults to the first column, as the admin does when no link column is
    /// configured.
    pub fn link_columns(&self) -> Vec<&'static str> {
        if self.options.list_display_links.is_empty() {
            self.list_display.iter().take(1).map(|c| c.name).collect()
        } else {
            self.options.list_display_links.clone()
        }
    }
}
