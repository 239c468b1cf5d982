use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Quotation {
    #[schema(example = 1)]
    pub id: u64,
    pub uploaded_by: u64,
    #[schema(example = "Sigma price list Q3")]
    pub title: Option<String>,
    pub notes: Option<String>,
    #[schema(example = "uploads/quotations/9c1d.xlsx")]
    pub file_path: String,
    pub mime_type: Option<String>,
    pub parsed_text: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub uploaded_at: NaiveDateTime,
    pub brand: Option<String>,
    pub make: Option<String>,
    #[schema(example = "64-17-5")]
    pub cas_no: Option<String>,
    pub product_name: Option<String>,
    pub instrument: Option<String>,
    pub chemical: Option<String>,
    pub reagent: Option<String>,
    pub kit: Option<String>,
    pub media: Option<String>,
    pub image_path: Option<String>,
}
