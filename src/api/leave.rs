use crate::{
    auth::auth::AuthUser,
    error::ApiError,
    model::leave::{Leave, LeaveStatus},
};
use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use std::time::Duration;
use tracing::{error, warn};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "ENG_0004")]
    pub employee_id: String,
    #[schema(example = "2024-05-01", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "Medical")]
    pub reason: String,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateLeaveStatus {
    #[schema(example = "Approved")]
    pub status: String,
}

/* =========================
Submit leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leaves",
    request_body = CreateLeave,
    responses(
        (status = 201, description = "Pending leave created with the employee's name denormalized onto it", body = Leave),
        (status = 404, description = "Employee does not exist; nothing is written"),
        (status = 422, description = "Empty reason"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<CreateLeave>,
) -> Result<HttpResponse, ApiError> {
    // Employees may only file for themselves; admins for anyone.
    auth.require_self_or_admin(&payload.employee_id)?;

    if payload.reason.trim().is_empty() {
        return Err(ApiError::Validation("Reason must not be empty".into()));
    }

    // The employee must exist at submission time. Their name is copied
    // onto the request and frozen there; later renames don't touch it.
    let employee_name: Option<String> =
        sqlx::query_scalar("SELECT name FROM employees WHERE employee_id = ?")
            .bind(&payload.employee_id)
            .fetch_optional(pool.get_ref())
            .await?;

    let Some(employee_name) = employee_name else {
        return Err(ApiError::NotFound(format!(
            "Employee {} not found",
            payload.employee_id
        )));
    };

    let result = sqlx::query(
        r#"
        INSERT INTO leaves (employee_id, employee_name, date, reason, status)
        VALUES (?, ?, ?, ?, 'Pending')
        "#,
    )
    .bind(&payload.employee_id)
    .bind(&employee_name)
    .bind(payload.date)
    .bind(payload.reason.trim())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id = %payload.employee_id, "Failed to create leave request");
        ApiError::from(e)
    })?;

    let leave = sqlx::query_as::<_, Leave>("SELECT * FROM leaves WHERE id = ?")
        .bind(result.last_insert_rowid())
        .fetch_one(pool.get_ref())
        .await?;

    Ok(HttpResponse::Created().json(leave))
}

/* =========================
Pending queue (Admin)
========================= */
#[utoipa::path(
    get,
    path = "/api/leaves",
    responses(
        (status = 200, description = "All pending leave requests", body = [Leave]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn list_pending(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let leaves =
        sqlx::query_as::<_, Leave>("SELECT * FROM leaves WHERE status = 'Pending' ORDER BY id")
            .fetch_all(pool.get_ref())
            .await?;

    Ok(HttpResponse::Ok().json(leaves))
}

/* =========================
Per-employee history
========================= */
#[utoipa::path(
    get,
    path = "/api/leaves/employee/{employee_id}",
    params(("employee_id" = String, Path, description = "Derived employee ID")),
    responses(
        (status = 200, description = "Pending and Approved leaves for the employee, each tagged with its status", body = [Leave]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leaves_for_employee(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = path.into_inner();
    auth.require_self_or_admin(&employee_id)?;

    // Rejected requests were deleted, so this is Pending + Approved.
    let leaves = sqlx::query_as::<_, Leave>("SELECT * FROM leaves WHERE employee_id = ? ORDER BY id")
        .bind(&employee_id)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(leaves))
}

const APPROVE_MAX_ATTEMPTS: u32 = 3;

fn is_transient(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut => true,
        // SQLITE_BUSY / SQLITE_LOCKED
        sqlx::Error::Database(db) => matches!(db.code().as_deref(), Some("5") | Some("6")),
        _ => false,
    }
}

/// The approve transition, retried with short backoff on transient store
/// errors only. Validation and authorization failures are never retried.
async fn approve_leave(pool: &SqlitePool, leave_id: i64) -> Result<u64, ApiError> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match sqlx::query("UPDATE leaves SET status = 'Approved' WHERE id = ? AND status = 'Pending'")
            .bind(leave_id)
            .execute(pool)
            .await
        {
            Ok(res) => return Ok(res.rows_affected()),
            Err(e) if attempt < APPROVE_MAX_ATTEMPTS && is_transient(&e) => {
                warn!(error = %e, leave_id, attempt, "Transient failure approving leave, retrying");
                actix_web::rt::time::sleep(Duration::from_millis(50 * attempt as u64)).await;
            }
            Err(e) => {
                error!(error = %e, leave_id, "Approve leave failed");
                return Err(e.into());
            }
        }
    }
}

/* =========================
Status transition (Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leaves/{id}",
    params(("id" = i64, Path, description = "Leave request ID")),
    request_body = UpdateLeaveStatus,
    responses(
        (status = 200, description = "Transition applied"),
        (status = 400, description = "Unrecognized status value; state unchanged"),
        (status = 404, description = "Leave request not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn update_leave_status(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    payload: web::Json<UpdateLeaveStatus>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let leave_id = path.into_inner();

    match LeaveStatus::parse(&payload.status) {
        Some(LeaveStatus::Approved) => {
            let affected = approve_leave(pool.get_ref(), leave_id).await?;

            if affected == 0 {
                return Err(ApiError::NotFound(
                    "Leave request not found or already processed".into(),
                ));
            }

            Ok(HttpResponse::Ok().json(json!({ "message": "Leave approved" })))
        }
        Some(LeaveStatus::Rejected) => {
            // Rejection keeps no history: the row is gone. Repeats land
            // on an absent row and report NotFound.
            let result =
                sqlx::query("DELETE FROM leaves WHERE id = ? AND status = 'Pending'")
                    .bind(leave_id)
                    .execute(pool.get_ref())
                    .await
                    .map_err(|e| {
                        error!(error = %e, leave_id, "Reject leave failed");
                        ApiError::from(e)
                    })?;

            if result.rows_affected() == 0 {
                return Err(ApiError::NotFound(
                    "Leave request not found or already processed".into(),
                ));
            }

            Ok(HttpResponse::Ok().json(json!({ "message": "Leave rejected" })))
        }
        _ => Err(ApiError::InvalidArgument(format!(
            "Unrecognized leave status: {}",
            payload.status
        ))),
    }
}
