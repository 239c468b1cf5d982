use crate::{
    auth::auth::AuthUser,
    config::Config,
    error::{AppError, AppResult},
    model::expense::{Expense, ExpenseStatus},
    utils::uploads::{self, DOCUMENT_EXTENSIONS},
};
use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

const DEFAULT_CURRENCY: &str = "INR";
const CATEGORY_CHARS: usize = 50;
const CAPTION_CHARS: usize = 255;

/// Multipart body of an expense claim
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct SubmitExpenseForm {
    #[schema(example = "1250.50")]
    pub amount: String,
    #[schema(example = "INR")]
    pub currency: Option<String>,
    #[schema(example = "Travel")]
    pub category: Option<String>,
    #[schema(example = "Cab to client site")]
    pub caption: Option<String>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub attachment: Option<Vec<u8>>,
}

#[derive(Deserialize, IntoParams)]
pub struct ExpenseFilter {
    /// SUBMITTED, APPROVED or REJECTED
    pub status: Option<String>,
}

fn parse_claim_amount(raw: Option<&str>) -> AppResult<f64> {
    let raw = raw.ok_or_else(|| AppError::BadRequest("amount is required".into()))?;
    let amount = raw
        .replace(',', "")
        .parse::<f64>()
        .map_err(|_| AppError::BadRequest(format!("Invalid amount: {raw}")))?;

    if !amount.is_finite() || amount <= 0.0 {
        return Err(AppError::BadRequest("amount must be greater than zero".into()));
    }
    Ok(amount)
}

fn claim_currency(raw: Option<&str>) -> AppResult<String> {
    let currency = raw.unwrap_or(DEFAULT_CURRENCY).to_ascii_uppercase();
    if currency.chars().count() > 10 {
        return Err(AppError::BadRequest("currency is limited to 10 characters".into()));
    }
    Ok(currency)
}

const SELECT_EXPENSE: &str = r#"
    SELECT id, user_id, amount, currency, category, caption, file_path, status,
           submitted_at, reviewed_by, reviewed_at
    FROM expenses
"#;

#[utoipa::path(
    get,
    path = "/api/expenses",
    responses(
        (status = 200, description = "The caller's expenses", body = [Expense]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Expenses"
)]
pub async fn my_expenses(auth: AuthUser, pool: web::Data<MySqlPool>) -> AppResult<HttpResponse> {
    let sql = format!("{SELECT_EXPENSE} WHERE user_id = ? ORDER BY submitted_at DESC, id DESC");

    let expenses = sqlx::query_as::<_, Expense>(&sql)
        .bind(auth.user_id)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(expenses))
}

#[utoipa::path(
    post,
    path = "/api/expenses",
    request_body(content = SubmitExpenseForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Expense submitted", body = Object, example = json!({
            "message": "Expense submitted", "status": "SUBMITTED"
        })),
        (status = 400, description = "Missing or invalid amount, overlong text, or bad attachment"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Expenses"
)]
pub async fn submit_expense(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let mut form = uploads::read_multipart(payload, config.max_upload_bytes).await?;

    let amount = parse_claim_amount(form.text("amount"))?;
    let currency = claim_currency(form.text("currency"))?;

    let attachment = form.take_file("attachment");
    let category = form.text_within("category", CATEGORY_CHARS)?;
    let caption = form.text_within("caption", CAPTION_CHARS)?;

    let file_path = match attachment {
        Some(file) => {
            file.check_extension(DOCUMENT_EXTENSIONS)?;
            Some(uploads::save(&config.upload_dir, "expenses", &file).await?)
        }
        None => None,
    };

    sqlx::query(
        r#"
        INSERT INTO expenses (user_id, amount, currency, category, caption, file_path, status, submitted_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, UTC_TIMESTAMP())
        "#,
    )
    .bind(auth.user_id)
    .bind(amount)
    .bind(&currency)
    .bind(category)
    .bind(caption)
    .bind(file_path.as_deref())
    .bind(ExpenseStatus::Submitted.as_ref())
    .execute(pool.get_ref())
    .await?;

    tracing::info!(user_id = auth.user_id, amount, %currency, receipt = file_path.is_some(), "Expense submitted");

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Expense submitted",
        "status": ExpenseStatus::Submitted,
    })))
}

#[utoipa::path(
    get,
    path = "/api/expenses/manage",
    params(ExpenseFilter),
    responses(
        (status = 200, description = "All expenses, newest first", body = [Expense]),
        (status = 400, description = "Unknown status"),
        (status = 403, description = "Admins only")
    ),
    security(("bearer_auth" = [])),
    tag = "Expenses"
)]
pub async fn manage(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ExpenseFilter>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let status = query
        .status
        .as_deref()
        .map(|s| {
            s.parse::<ExpenseStatus>()
                .map_err(|_| AppError::BadRequest(format!("Unknown status: {s}")))
        })
        .transpose()?;

    let where_sql = if status.is_some() { " WHERE status = ?" } else { "" };
    let sql = format!("{SELECT_EXPENSE}{where_sql} ORDER BY submitted_at DESC, id DESC");

    let mut q = sqlx::query_as::<_, Expense>(&sql);
    if let Some(s) = status {
        q = q.bind(s.to_string());
    }

    Ok(HttpResponse::Ok().json(q.fetch_all(pool.get_ref()).await?))
}

async fn review(
    auth: &AuthUser,
    pool: &MySqlPool,
    expense_id: u64,
    outcome: ExpenseStatus,
) -> AppResult<()> {
    auth.require_admin()?;

    let result = sqlx::query(
        r#"
        UPDATE expenses
        SET status = ?, reviewed_by = ?, reviewed_at = UTC_TIMESTAMP()
        WHERE id = ? AND status = ?
        "#,
    )
    .bind(outcome.as_ref())
    .bind(auth.user_id)
    .bind(expense_id)
    .bind(ExpenseStatus::Submitted.as_ref())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        let found = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM expenses WHERE id = ?")
            .bind(expense_id)
            .fetch_one(pool)
            .await?;

        return Err(if found > 0 {
            AppError::Conflict("Expense already reviewed".into())
        } else {
            AppError::NotFound("Expense not found".into())
        });
    }

    tracing::info!(expense_id, reviewed_by = auth.user_id, %outcome, "Expense reviewed");
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/expenses/{expense_id}/approve",
    params(("expense_id" = u64, Path, description = "Expense id")),
    responses(
        (status = 200, description = "Approved", body = Object, example = json!({"message": "Approved"})),
        (status = 403, description = "Admins only"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Already reviewed")
    ),
    security(("bearer_auth" = [])),
    tag = "Expenses"
)]
pub async fn approve(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    review(&auth, pool.get_ref(), path.into_inner(), ExpenseStatus::Approved).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Approved" })))
}

#[utoipa::path(
    post,
    path = "/api/expenses/{expense_id}/reject",
    params(("expense_id" = u64, Path, description = "Expense id")),
    responses(
        (status = 200, description = "Rejected", body = Object, example = json!({"message": "Rejected"})),
        (status = 403, description = "Admins only"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Already reviewed")
    ),
    security(("bearer_auth" = [])),
    tag = "Expenses"
)]
pub async fn reject(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    review(&auth, pool.get_ref(), path.into_inner(), ExpenseStatus::Rejected).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Rejected" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::jwt::generate_access_token, model::role::Role};
    use actix_web::{App, http::StatusCode, test::TestRequest};

    #[test]
    fn amount_is_required_and_positive() {
        assert!(matches!(parse_claim_amount(None), Err(AppError::BadRequest(_))));
        assert!(parse_claim_amount(Some("0")).is_err());
        assert!(parse_claim_amount(Some("-12")).is_err());
        assert!(parse_claim_amount(Some("twelve")).is_err());
        assert!(parse_claim_amount(Some("NaN")).is_err());
        assert_eq!(parse_claim_amount(Some("1,250.50")).unwrap(), 1250.5);
    }

    #[test]
    fn currency_defaults_to_inr() {
        assert_eq!(claim_currency(None).unwrap(), "INR");
        assert_eq!(claim_currency(Some("usd")).unwrap(), "USD");
        assert!(claim_currency(Some("NOT-A-CURRENCY")).is_err());
    }

    #[actix_web::test]
    async fn overlong_category_is_rejected_before_the_receipt_is_stored() {
        let mut config = Config::for_tests();
        config.upload_dir = std::env::temp_dir()
            .join(format!("office_desk_expense_{}", uuid::Uuid::new_v4().to_simple()))
            .to_string_lossy()
            .into_owned();
        let token = generate_access_token(7, "asha@example.com", Role::Employee, &config.jwt_secret, 60).unwrap();
        // never connects: validation fails first
        let pool = MySqlPool::connect_lazy(&config.database_url).unwrap();

        let app = actix_web::test::init_service(
            App::new()
                .app_data(web::Data::new(config.clone()))
                .app_data(web::Data::new(pool))
                .route("/api/expenses", web::post().to(submit_expense)),
        )
        .await;

        let category = "c".repeat(CATEGORY_CHARS + 1);
        let (content_type, body) = uploads::multipart_body(
            &[("amount", "120"), ("category", category.as_str())],
            Some(("attachment", "receipt.pdf", &b"%PDF-1.4"[..])),
        );
        let req = TestRequest::post()
            .uri("/api/expenses")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .insert_header(("Content-Type", content_type))
            .set_payload(body)
            .to_request();

        let resp = actix_web::test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(!std::path::Path::new(&config.upload_dir).join("expenses").exists());
    }
}
