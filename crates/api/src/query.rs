use serde::Deserialize;

/// Pagination parameters (`?limit=&offset=`).
///
/// Values are clamped with `clamp_limit` / `clamp_offset` before they reach
/// the repository layer.
#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
