use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ProductData {
    pub id: u64,
    pub quotation_id: u64,
    /// Zero-based row of the source sheet
    pub row_index: u32,
    #[schema(example = "Ethanol absolute")]
    pub item_name: Option<String>,
    #[schema(example = "Merck")]
    pub make: Option<String>,
    #[schema(example = "100983")]
    pub catalog_no: Option<String>,
    #[schema(example = 4520.0)]
    pub rate: Option<f64>,
    pub qty: Option<f64>,
}
