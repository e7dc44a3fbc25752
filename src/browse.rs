//! Client-side filtering, sorting and pagination of document listings.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::Serialize;

use crate::config::MAX_PAGE_SIZE;
use crate::models::Document;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Uploaded,
    Date,
    Filename,
    Size,
    Total,
    Supplier,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Uploaded => "uploaded",
            SortKey::Date => "date",
            SortKey::Filename => "filename",
            SortKey::Size => "size",
            SortKey::Total => "total",
            SortKey::Supplier => "supplier",
        }
    }

    fn compare(&self, a: &Document, b: &Document) -> Ordering {
        match self {
            SortKey::Uploaded => a.upload_date.cmp(&b.upload_date),
            SortKey::Date => a.doc_date.cmp(&b.doc_date),
            SortKey::Filename => a.filename.to_lowercase().cmp(&b.filename.to_lowercase()),
            SortKey::Size => a.size_bytes.cmp(&b.size_bytes),
            SortKey::Total => a.invoice_total.total_cmp(&b.invoice_total),
            SortKey::Supplier => a
                .supplier_label()
                .to_lowercase()
                .cmp(&b.supplier_label().to_lowercase()),
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "uploaded" | "upload_date" => Ok(SortKey::Uploaded),
            "date" | "doc_date" => Ok(SortKey::Date),
            "filename" | "name" => Ok(SortKey::Filename),
            "size" => Ok(SortKey::Size),
            "total" | "amount" => Ok(SortKey::Total),
            "supplier" => Ok(SortKey::Supplier),
            other => Err(format!(
                "unknown sort field '{}' (expected uploaded, date, filename, size, total or supplier)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order '{}' (expected asc or desc)", other)),
        }
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total: u64,
    pub total_pages: u64,
}

/// Local view options applied on top of the server-side filters.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentQuery {
    /// Case-insensitive substring matched against filename and supplier.
    pub search: Option<String>,
    /// Restrict to one file type ("pdf" or "xml").
    pub filetype: Option<String>,
    pub sort: SortKey,
    pub order: SortOrder,
    /// 1-indexed.
    pub page: usize,
    pub per_page: usize,
}

impl Default for DocumentQuery {
    fn default() -> Self {
        Self {
            search: None,
            filetype: None,
            sort: SortKey::default(),
            order: SortOrder::default(),
            page: 1,
            per_page: 20,
        }
    }
}

impl DocumentQuery {
    fn matches(&self, doc: &Document) -> bool {
        if let Some(ref filetype) = self.filetype {
            if !doc.filetype.eq_ignore_ascii_case(filetype.trim_start_matches('.')) {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                doc.filename.to_lowercase().contains(&needle)
                    || doc.supplier_label().to_lowercase().contains(&needle)
                    || doc
                        .invoice_number
                        .as_deref()
                        .is_some_and(|n| n.to_lowercase().contains(&needle))
            }
            _ => true,
        }
    }

    /// Filter, sort and slice `documents`. Ties keep id order.
    pub fn apply(&self, documents: &[Document]) -> Page<Document> {
        let per_page = self.per_page.clamp(1, MAX_PAGE_SIZE);
        let page = self.page.max(1);

        let mut matched: Vec<&Document> = documents.iter().filter(|d| self.matches(d)).collect();
        matched.sort_by(|a, b| {
            let ord = self.sort.compare(a, b).then_with(|| a.id.cmp(&b.id));
            match self.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });

        let total = matched.len() as u64;
        let total_pages = total.div_ceil(per_page as u64);
        let items = matched
            .into_iter()
            .skip((page - 1).saturating_mul(per_page))
            .take(per_page)
            .cloned()
            .collect();

        Page {
            items,
            page,
            per_page,
            total,
            total_pages,
        }
    }
}
