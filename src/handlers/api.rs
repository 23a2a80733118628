use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Json, Response};
use tracing::debug;

use crate::error::ApiResult;
use crate::handlers::dashboard::DashboardParams;
use crate::services::dashboard::{render, RenderSpec};
use crate::services::receipt_parser::{parse_receipt, write_csv, Receipt};
use crate::state::AppState;

pub async fn dashboard(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> ApiResult<Json<RenderSpec>> {
    let dataset = state.load_dataset()?;
    let spec = render(
        &dataset,
        params.month.as_deref(),
        params.category.as_deref(),
        &state.config.money_format(),
    )?;
    Ok(Json(spec))
}

pub async fn receipt_preview(body: String) -> ApiResult<Json<Receipt>> {
    let receipt = parse_receipt(&body)?;
    debug!(ticket_id = %receipt.ticket_id, items = receipt.items.len(), "Receipt preview");
    Ok(Json(receipt))
}

pub async fn receipt_csv(body: String) -> ApiResult<Response> {
    let receipt = parse_receipt(&body)?;

    let mut csv = Vec::new();
    write_csv(&receipt.items, &mut csv)?;

    let disposition = format!("attachment; filename=\"ticket-{}.csv\"", receipt.ticket_id);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}
