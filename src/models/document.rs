//! Document models.
//!
//! Documents are owned by the backend; the client only receives, displays
//! and filters them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;

/// An uploaded invoice or document with its parsed metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub filename: String,
    /// File type as reported by the backend ("pdf" or "xml").
    #[serde(default)]
    pub filetype: String,
    #[serde(default)]
    pub pages: Option<u32>,
    #[serde(default)]
    pub xml_root: Option<String>,
    #[serde(default)]
    pub size_bytes: u64,
    #[serde(
        default,
        deserialize_with = "timestamp::deserialize_opt",
        serialize_with = "timestamp::serialize_opt"
    )]
    pub upload_date: Option<DateTime<Utc>>,
    /// Issue date of the invoice itself.
    #[serde(default)]
    pub doc_date: Option<NaiveDate>,
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub invoice_address: Option<String>,
    #[serde(default)]
    pub supplier_rut: Option<String>,
    #[serde(default)]
    pub supplier_name: Option<String>,
    #[serde(default)]
    pub invoice_total: f64,
}

impl Document {
    /// Supplier label for display: name, then RUT, then a dash.
    pub fn supplier_label(&self) -> &str {
        self.supplier_name
            .as_deref()
            .or(self.supplier_rut.as_deref())
            .unwrap_or("-")
    }
}

/// Body of a document upload response: the backend returns the bare document
/// when one was created and a wrapped list otherwise.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UploadResponse {
    Many { documents: Vec<Document> },
    Single(Document),
}

impl UploadResponse {
    pub fn into_documents(self) -> Vec<Document> {
        match self {
            UploadResponse::Many { documents } => documents,
            UploadResponse::Single(doc) => vec![doc],
        }
    }
}

/// A `YYYY-MM` month bound for document date filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DateFilter {
    pub year: i32,
    pub month: u32,
}

impl DateFilter {
    /// Parse a `YYYY-MM` month.
    pub fn parse(raw: &str) -> Option<Self> {
        let (year, month) = raw.trim().split_once('-')?;
        if year.len() != 4 || month.len() != 2 {
            return None;
        }
        let year: i32 = year.parse().ok()?;
        let month: u32 = month.parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, 1)?;
        Some(Self { year, month })
    }

    pub fn as_param(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

/// Server-side filters for the document listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentFilter {
    /// Supplier id (numeric) or exact supplier name.
    pub supplier: Option<String>,
    pub start: Option<DateFilter>,
    pub end: Option<DateFilter>,
    /// Partial invoice number.
    pub invoice: Option<String>,
}

impl DocumentFilter {
    /// Query parameters understood by the listing endpoint.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(ref supplier) = self.supplier {
            pairs.push(("supplier", supplier.clone()));
        }
        if let Some(start) = self.start {
            pairs.push(("start", start.as_param()));
        }
        if let Some(end) = self.end {
            pairs.push(("end", end.as_param()));
        }
        if let Some(ref invoice) = self.invoice {
            pairs.push(("invoice", invoice.clone()));
        }
        pairs
    }

    /// Reject ranges that end before they start.
    pub fn validate(&self) -> Result<(), String> {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if end < start {
                return Err(format!(
                    "end month {} is before start month {}",
                    end.as_param(),
                    start.as_param()
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_deserialize_backend_shape() {
        let json = r#"{
            "id": 12,
            "filename": "factura.xml",
            "filetype": "xml",
            "pages": null,
            "xml_root": "EnvioDTE",
            "size_bytes": 2048,
            "upload_date": "2024-06-01T12:30:00.000001",
            "doc_date": "2024-05-28",
            "invoice_number": "3321",
            "invoice_address": null,
            "supplier_rut": "76.123.456-7",
            "supplier_name": "Comercial Sur",
            "invoice_total": 15990.0
        }"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.id, 12);
        assert_eq!(doc.doc_date, NaiveDate::from_ymd_opt(2024, 5, 28));
        assert_eq!(doc.supplier_label(), "Comercial Sur");
        assert!(doc.upload_date.is_some());
    }

    #[test]
    fn test_upload_response_single_and_many() {
        let single: UploadResponse =
            serde_json::from_str(r#"{"id": 1, "filename": "a.pdf"}"#).unwrap();
        assert_eq!(single.into_documents().len(), 1);

        let many: UploadResponse = serde_json::from_str(
            r#"{"documents": [{"id": 1, "filename": "a.xml"}, {"id": 2, "filename": "a.xml"}]}"#,
        )
        .unwrap();
        let docs = many.into_documents();
        assert_eq!(docs.iter().map(|d| d.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_date_filter_parse() {
        let f = DateFilter::parse("2024-02").unwrap();
        assert_eq!(f.as_param(), "2024-02");
        assert!(DateFilter::parse("2024-13").is_none());
        assert!(DateFilter::parse("2024-1").is_none());
        assert!(DateFilter::parse("march").is_none());
    }

    #[test]
    fn test_filter_query_pairs_and_validate() {
        let filter = DocumentFilter {
            supplier: Some("7".into()),
            start: DateFilter::parse("2024-03"),
            end: DateFilter::parse("2024-01"),
            invoice: None,
        };
        assert_eq!(filter.query_pairs().len(), 3);
        assert!(filter.validate().is_err());
        assert!(DocumentFilter::default().query_pairs().is_empty());
    }
}
