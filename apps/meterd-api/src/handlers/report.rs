//! 报表导出 handlers
//!
//! - POST /api/report/csv
//!
//! 把提交的 labels/values 导出为 CSV 附件下载。

use crate::AppState;
use crate::middleware::require_user;
use api_contract::ReportRequest;
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};

pub async fn report_csv(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ReportRequest>,
) -> Response {
    if let Err(response) = require_user(&state, &headers) {
        return response;
    }

    let mut csv = String::new();
    csv.push_str(&format!(
        "# {} ({}/{})\n",
        escape_csv(&req.title),
        escape_csv(&req.metric),
        escape_csv(&req.series)
    ));
    csv.push_str("Date,Value\n");
    for (label, value) in req.labels.iter().zip(req.values.iter()) {
        csv.push_str(&format!("{},{}\n", escape_csv(label), value));
    }

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"period_report.csv\"",
            ),
        ],
        csv,
    )
        .into_response()
}

/// 含分隔符/引号/换行的字段加引号转义。
fn escape_csv(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::escape_csv;

    #[test]
    fn escape_csv_quotes_when_needed() {
        assert_eq!(escape_csv("plain"), "plain");
        assert_eq!(escape_csv("a,b"), "\"a,b\"");
        assert_eq!(escape_csv("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
