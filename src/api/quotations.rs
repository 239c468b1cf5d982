use crate::{
    auth::auth::AuthUser,
    config::Config,
    error::{AppError, AppResult},
    model::{product_data::ProductData, quotation::Quotation},
    utils::{
        sheet_parser::{self, ParsedSheet, ProductRow},
        uploads::{self, DOCUMENT_EXTENSIONS, IMAGE_EXTENSIONS},
    },
};
use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use sqlx::{MySql, MySqlPool, Transaction};
use std::path::PathBuf;
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};

const LIST_LIMIT: u32 = 50;
const SEARCH_LIMIT: u32 = 100;
// 7 placeholders per row keeps a batch well under the prepared statement limit
const PRODUCT_BATCH: usize = 500;
const TITLE_CHARS: usize = 255;
const MIME_TYPE_CHARS: usize = 100;

const SELECT_QUOTATION: &str = r#"
    SELECT q.id, q.uploaded_by, q.title, q.notes, q.file_path, q.mime_type, q.parsed_text,
           q.uploaded_at, q.brand, q.make, q.cas_no, q.product_name, q.instrument,
           q.chemical, q.reagent, q.kit, q.media, q.image_path
    FROM quotations q
"#;

const SEARCHABLE_QUOTATION_COLUMNS: &[&str] = &[
    "title",
    "notes",
    "parsed_text",
    "brand",
    "make",
    "cas_no",
    "product_name",
    "instrument",
    "chemical",
    "reagent",
    "kit",
    "media",
];

const SEARCHABLE_PRODUCT_COLUMNS: &[&str] = &["item_name", "make", "catalog_no"];

/// Multipart body of a quotation upload
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct UploadQuotationForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    #[schema(example = "Sigma price list Q3")]
    pub title: Option<String>,
    pub notes: Option<String>,
}

/// Multipart body of the bulk endpoints; `ids` may repeat or be comma separated
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct BulkForm {
    #[schema(example = "3,4,9")]
    pub ids: String,
    /// Only for bulk-image: png, jpg or jpeg
    #[schema(value_type = Option<String>, format = Binary)]
    pub image: Option<Vec<u8>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    #[schema(example = "Uploaded")]
    pub message: String,
    pub id: u64,
    #[schema(example = 24)]
    pub products: usize,
    /// Set when the file was stored but its contents could not be read
    pub parse_error: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuotationDetail {
    pub quotation: Quotation,
    pub products: Vec<ProductData>,
}

#[derive(Deserialize, IntoParams)]
pub struct SearchQuery {
    /// Free text; matched against document text, summary fields and product rows
    pub q: Option<String>,
}

/// Collects ids from repeated and/or comma separated values, ignoring junk.
fn parse_ids(values: &[String]) -> Vec<u64> {
    let mut ids: Vec<u64> = values
        .iter()
        .flat_map(|v| v.split(','))
        .filter_map(|part| part.trim().parse::<u64>().ok())
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn non_empty(value: &str) -> Option<&str> {
    Some(value.trim()).filter(|v| !v.is_empty())
}

/// Browser-supplied content types are informational; oversized ones are dropped.
fn stored_mime(content_type: Option<&str>) -> Option<&str> {
    content_type.filter(|m| m.chars().count() <= MIME_TYPE_CHARS)
}

/// `AND q.uploaded_by = ?` for everyone but admins
fn ownership_clause(auth: &AuthUser) -> &'static str {
    if auth.is_admin() { "" } else { " AND q.uploaded_by = ?" }
}

async fn parse_stored(stored: &str, ext: &str) -> Result<ParsedSheet, String> {
    let path = PathBuf::from(stored);
    let ext = ext.to_string();

    web::block(move || sheet_parser::parse_file(&path, &ext))
        .await
        .map_err(|e| e.to_string())?
        .map_err(|e| e.to_string())
}

async fn insert_products(
    tx: &mut Transaction<'_, MySql>,
    quotation_id: u64,
    products: &[ProductRow],
) -> AppResult<()> {
    for batch in products.chunks(PRODUCT_BATCH) {
        let sql = format!(
            "INSERT INTO product_data (quotation_id, row_index, item_name, make, catalog_no, rate, qty) VALUES {}",
            vec!["(?, ?, ?, ?, ?, ?, ?)"; batch.len()].join(", ")
        );

        let mut q = sqlx::query(&sql);
        for p in batch {
            q = q
                .bind(quotation_id)
                .bind(p.row_index)
                .bind(p.item_name.as_deref())
                .bind(p.make.as_deref())
                .bind(p.catalog_no.as_deref())
                .bind(p.rate)
                .bind(p.qty);
        }
        q.execute(&mut **tx).await?;
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/quotations",
    responses(
        (status = 200, description = "Newest 50 quotations visible to the caller", body = [Quotation]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Quotations"
)]
pub async fn index(auth: AuthUser, pool: web::Data<MySqlPool>) -> AppResult<HttpResponse> {
    let sql = format!(
        "{SELECT_QUOTATION} WHERE 1 = 1{} ORDER BY q.uploaded_at DESC, q.id DESC LIMIT ?",
        ownership_clause(&auth)
    );

    let mut q = sqlx::query_as::<_, Quotation>(&sql);
    if !auth.is_admin() {
        q = q.bind(auth.user_id);
    }
    let records = q.bind(LIST_LIMIT).fetch_all(pool.get_ref()).await?;

    Ok(HttpResponse::Ok().json(records))
}

#[utoipa::path(
    get,
    path = "/api/quotations/{quotation_id}",
    params(("quotation_id" = u64, Path, description = "Quotation id")),
    responses(
        (status = 200, description = "Quotation with its product rows", body = QuotationDetail),
        (status = 404, description = "Not found or not visible")
    ),
    security(("bearer_auth" = [])),
    tag = "Quotations"
)]
pub async fn get(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let quotation_id = path.into_inner();
    let sql = format!("{SELECT_QUOTATION} WHERE q.id = ?{}", ownership_clause(&auth));

    let mut q = sqlx::query_as::<_, Quotation>(&sql).bind(quotation_id);
    if !auth.is_admin() {
        q = q.bind(auth.user_id);
    }
    let quotation = q
        .fetch_optional(pool.get_ref())
        .await?
        .ok_or_else(|| AppError::NotFound("Quotation not found".into()))?;

    let products = sqlx::query_as::<_, ProductData>(
        r#"
        SELECT id, quotation_id, row_index, item_name, make, catalog_no, rate, qty
        FROM product_data
        WHERE quotation_id = ?
        ORDER BY row_index
        "#,
    )
    .bind(quotation_id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(QuotationDetail { quotation, products }))
}

#[utoipa::path(
    post,
    path = "/api/quotations/upload",
    request_body(content = UploadQuotationForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Stored; spreadsheet rows or PDF text extracted when possible", body = UploadResponse),
        (status = 400, description = "No file, file type not allowed, or title too long"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Quotations"
)]
pub async fn upload(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let mut form = uploads::read_multipart(payload, config.max_upload_bytes).await?;
    let file = form
        .take_file("file")
        .ok_or_else(|| AppError::BadRequest("Select a file".into()))?;
    let ext = file.check_extension(DOCUMENT_EXTENSIONS)?.to_string();
    let title = form.text_within("title", TITLE_CHARS)?;

    let stored = uploads::save(&config.upload_dir, "quotations", &file).await?;

    let mut parse_error = None;
    let sheet = if sheet_parser::is_parseable(&ext) {
        match parse_stored(&stored, &ext).await {
            Ok(sheet) => sheet,
            Err(e) => {
                // the document is still worth keeping
                warn!(file = %file.original_name, error = %e, "Quotation parse failed");
                parse_error = Some(e);
                ParsedSheet::default()
            }
        }
    } else {
        ParsedSheet::default()
    };
    let summary = &sheet.summary;

    let mut tx = pool.begin().await?;

    let inserted = sqlx::query(
        r#"
        INSERT INTO quotations
            (uploaded_by, title, notes, file_path, mime_type, parsed_text, uploaded_at,
             brand, make, cas_no, product_name, instrument, chemical, reagent, kit, media)
        VALUES (?, ?, ?, ?, ?, ?, UTC_TIMESTAMP(), ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(auth.user_id)
    .bind(title)
    .bind(form.text("notes"))
    .bind(&stored)
    .bind(stored_mime(file.content_type.as_deref()))
    .bind(non_empty(&sheet.parsed_text))
    .bind(summary.brand.as_deref())
    .bind(summary.make.as_deref())
    .bind(summary.cas_no.as_deref())
    .bind(summary.product_name.as_deref())
    .bind(summary.instrument.as_deref())
    .bind(summary.chemical.as_deref())
    .bind(summary.reagent.as_deref())
    .bind(summary.kit.as_deref())
    .bind(summary.media.as_deref())
    .execute(&mut *tx)
    .await?;

    let quotation_id = inserted.last_insert_id();
    insert_products(&mut tx, quotation_id, &sheet.products).await?;
    tx.commit().await?;

    info!(
        quotation_id,
        user_id = auth.user_id,
        products = sheet.products.len(),
        header_row = ?sheet.header_row,
        "Quotation uploaded"
    );

    Ok(HttpResponse::Created().json(UploadResponse {
        message: "Uploaded".to_string(),
        id: quotation_id,
        products: sheet.products.len(),
        parse_error,
    }))
}

#[utoipa::path(
    get,
    path = "/api/quotations/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "At most 100 matches, newest first", body = [Quotation]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Quotations"
)]
pub async fn search(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<SearchQuery>,
) -> AppResult<HttpResponse> {
    let Some(term) = query.q.as_deref().and_then(non_empty) else {
        return Ok(HttpResponse::Ok().json(Vec::<Quotation>::new()));
    };
    let pattern = like_pattern(term);

    let quotation_matches = SEARCHABLE_QUOTATION_COLUMNS
        .iter()
        .map(|c| format!("q.{c} LIKE ?"))
        .collect::<Vec<_>>()
        .join(" OR ");
    let product_matches = SEARCHABLE_PRODUCT_COLUMNS
        .iter()
        .map(|c| format!("p.{c} LIKE ?"))
        .collect::<Vec<_>>()
        .join(" OR ");

    let sql = format!(
        r#"{SELECT_QUOTATION}
        WHERE ({quotation_matches}
               OR EXISTS (SELECT 1 FROM product_data p WHERE p.quotation_id = q.id AND ({product_matches})))
        {}
        ORDER BY q.uploaded_at DESC, q.id DESC
        LIMIT ?"#,
        ownership_clause(&auth)
    );

    let mut q = sqlx::query_as::<_, Quotation>(&sql);
    for _ in 0..SEARCHABLE_QUOTATION_COLUMNS.len() + SEARCHABLE_PRODUCT_COLUMNS.len() {
        q = q.bind(&pattern);
    }
    if !auth.is_admin() {
        q = q.bind(auth.user_id);
    }
    let results = q.bind(SEARCH_LIMIT).fetch_all(pool.get_ref()).await?;

    tracing::debug!(user_id = auth.user_id, term, hits = results.len(), "Quotation search");

    Ok(HttpResponse::Ok().json(results))
}

#[utoipa::path(
    post,
    path = "/api/quotations/bulk-delete",
    request_body(content = BulkForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Deleted", body = Object, example = json!({
            "message": "Deleted 2 item(s)", "count": 2
        })),
        (status = 400, description = "No items selected")
    ),
    security(("bearer_auth" = [])),
    tag = "Quotations"
)]
pub async fn bulk_delete(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let form = uploads::read_multipart(payload, config.max_upload_bytes).await?;
    let ids = parse_ids(form.all("ids"));
    if ids.is_empty() {
        return Err(AppError::BadRequest("No items selected".into()));
    }

    let sql = format!(
        "DELETE q FROM quotations q WHERE q.id IN ({}){}",
        placeholders(ids.len()),
        ownership_clause(&auth)
    );
    let mut q = sqlx::query(&sql);
    for id in &ids {
        q = q.bind(*id);
    }
    if !auth.is_admin() {
        q = q.bind(auth.user_id);
    }
    let count = q.execute(pool.get_ref()).await?.rows_affected();

    info!(user_id = auth.user_id, requested = ids.len(), count, "Quotations deleted");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": format!("Deleted {count} item(s)"),
        "count": count,
    })))
}

#[utoipa::path(
    post,
    path = "/api/quotations/bulk-image",
    request_body(content = BulkForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image attached", body = Object, example = json!({
            "message": "Updated image for 2 item(s)", "count": 2, "image_path": "uploads/quotation_images/1f9e.png"
        })),
        (status = 400, description = "No items selected, or missing or non-image file")
    ),
    security(("bearer_auth" = [])),
    tag = "Quotations"
)]
pub async fn bulk_image(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let mut form = uploads::read_multipart(payload, config.max_upload_bytes).await?;
    let ids = parse_ids(form.all("ids"));
    if ids.is_empty() {
        return Err(AppError::BadRequest("No items selected".into()));
    }

    let image = form
        .take_file("image")
        .ok_or_else(|| AppError::BadRequest("Please choose an image".into()))?;
    image.check_extension(IMAGE_EXTENSIONS)?;
    let image_path = uploads::save(&config.upload_dir, "quotation_images", &image).await?;

    let sql = format!(
        "UPDATE quotations q SET q.image_path = ? WHERE q.id IN ({}){}",
        placeholders(ids.len()),
        ownership_clause(&auth)
    );
    let mut q = sqlx::query(&sql).bind(&image_path);
    for id in &ids {
        q = q.bind(*id);
    }
    if !auth.is_admin() {
        q = q.bind(auth.user_id);
    }
    let count = q.execute(pool.get_ref()).await?.rows_affected();

    info!(user_id = auth.user_id, count, image = %image_path, "Quotation image updated");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": format!("Updated image for {count} item(s)"),
        "count": count,
        "image_path": image_path,
    })))
}
