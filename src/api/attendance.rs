use crate::{auth::auth::AuthUser, error::ApiError, model::attendance::Attendance};
use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use tracing::error;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct MarkAttendance {
    #[schema(example = "2024-05-01", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "Present")]
    pub status: String,
}

/// Mark own attendance
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = MarkAttendance,
    responses(
        (status = 200, description = "Attendance marked"),
        (status = 422, description = "Already marked for that date, or bad status"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile linked")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn mark_attendance(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<MarkAttendance>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = auth.employee_profile()?.to_string();

    if !matches!(payload.status.as_str(), "Present" | "Absent") {
        return Err(ApiError::Validation(
            "Status must be Present or Absent".into(),
        ));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO attendance (employee_id, date, status)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(&employee_id)
    .bind(payload.date)
    .bind(&payload.status)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => Ok(HttpResponse::Ok().json(json!({
            "message": "Attendance marked"
        }))),
        Err(e) => {
            // One row per employee per day
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return Err(ApiError::Validation(
                        "Attendance already marked for this date".into(),
                    ));
                }
            }

            error!(error = %e, %employee_id, "Failed to mark attendance");
            Err(e.into())
        }
    }
}

/// Attendance history for an employee
#[utoipa::path(
    get,
    path = "/api/attendance/{employee_id}",
    params(("employee_id" = String, Path, description = "Derived employee ID")),
    responses(
        (status = 200, description = "Attendance rows", body = [Attendance]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn attendance_for_employee(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = path.into_inner();
    auth.require_self_or_admin(&employee_id)?;

    let rows = sqlx::query_as::<_, Attendance>(
        "SELECT * FROM attendance WHERE employee_id = ? ORDER BY date",
    )
    .bind(&employee_id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(rows))
}
