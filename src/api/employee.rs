use crate::{
    auth::auth::AuthUser,
    error::ApiError,
    model::employee::Employee,
    utils::db_utils::{build_update_sql, execute_update},
    utils::{email_cache, email_filter},
};
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tracing::error;
use utoipa::ToSchema;

/// Columns a partial update may touch. `employee_id` is deliberately
/// absent: the derived ID is immutable once assigned.
const EMPLOYEE_UPDATE_COLUMNS: &[&str] = &[
    "name",
    "email",
    "department",
    "salary",
    "phone_number",
    "sex",
    "qualifications",
    "role",
    "date_of_birth",
    "joining_date",
    "experience",
    "experienced_role",
];

#[derive(Deserialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "Asha Rahman")]
    pub name: Option<String>,
    #[schema(example = "asha@company.com", format = "email")]
    pub email: Option<String>,
    #[schema(example = "Engineering")]
    pub department: Option<String>,
    #[schema(example = 85000.0)]
    pub salary: Option<f64>,
    #[schema(example = "+8801712345678")]
    pub phone_number: Option<String>,
    #[schema(example = "Female")]
    pub sex: Option<String>,
    #[schema(example = "BSc CSE")]
    pub qualifications: Option<String>,
    #[schema(example = "Employee")]
    pub role: Option<String>,
    #[schema(example = "1994-03-12")]
    pub date_of_birth: Option<String>,
    #[schema(example = "2021-06-01")]
    pub joining_date: Option<String>,
    #[schema(example = "5 years")]
    pub experience: Option<String>,
    #[schema(example = "Backend Developer", nullable = true)]
    pub experienced_role: Option<String>,
}

/// A fully validated create payload; every field here is required.
#[derive(Debug)]
pub struct NewEmployee {
    pub name: String,
    pub email: String,
    pub department: String,
    pub salary: f64,
    pub phone_number: String,
    pub sex: String,
    pub qualifications: String,
    pub role: String,
    pub date_of_birth: String,
    pub joining_date: String,
    pub experience: String,
    pub experienced_role: Option<String>,
}

impl CreateEmployee {
    pub fn validate(self) -> Result<NewEmployee, ApiError> {
        fn required(field: &'static str, value: Option<String>) -> Result<String, ApiError> {
            match value {
                Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
                _ => Err(ApiError::Validation(format!(
                    "Missing required field: {}",
                    field
                ))),
            }
        }

        let email = required("email", self.email)?.to_lowercase();
        if !email.contains('@') {
            return Err(ApiError::Validation("Invalid email address".into()));
        }

        Ok(NewEmployee {
            name: required("name", self.name)?,
            email,
            department: required("department", self.department)?,
            salary: self
                .salary
                .ok_or_else(|| ApiError::Validation("Missing required field: salary".into()))?,
            phone_number: required("phone_number", self.phone_number)?,
            sex: required("sex", self.sex)?,
            qualifications: required("qualifications", self.qualifications)?,
            role: required("role", self.role)?,
            date_of_birth: required("date_of_birth", self.date_of_birth)?,
            joining_date: required("joining_date", self.joining_date)?,
            experience: required("experience", self.experience)?,
            experienced_role: self.experienced_role,
        })
    }
}

/// `ENG` from `Engineering`, `SAL` from `Sales`. Departments shorter than
/// three characters keep what they have.
pub fn department_prefix(department: &str) -> String {
    department.chars().take(3).collect::<String>().to_uppercase()
}

/// true  => email AVAILABLE
/// false => email TAKEN
pub async fn is_email_available(email: &str, pool: &SqlitePool) -> Result<bool, sqlx::Error> {
    let email = email.to_lowercase();

    // Cuckoo filter: a negative is definitive
    if !email_filter::might_exist(&email) {
        return Ok(true);
    }

    // Moka cache: fast positive
    if email_cache::is_taken(&email).await {
        return Ok(false);
    }

    // Database fallback
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM employees WHERE email = ? LIMIT 1)",
    )
    .bind(&email)
    .fetch_one(pool)
    .await?;

    Ok(!exists)
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created with its derived ID", body = Employee),
        (status = 422, description = "Missing required field or duplicate email"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<CreateEmployee>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let new = payload.into_inner().validate()?;

    if !is_email_available(&new.email, pool.get_ref()).await? {
        return Err(ApiError::Validation(format!(
            "Email {} already exists",
            new.email
        )));
    }

    let mut tx = pool.begin().await?;

    // Atomic per-department serial: the upsert increments and returns in
    // one statement, so concurrent creates never share a serial.
    let serial: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO department_counters (department, last_serial)
        VALUES (?, 1)
        ON CONFLICT (department) DO UPDATE SET last_serial = last_serial + 1
        RETURNING last_serial
        "#,
    )
    .bind(&new.department)
    .fetch_one(&mut *tx)
    .await?;

    let employee_id = format!("{}_{:04}", department_prefix(&new.department), serial);

    let result = sqlx::query(
        r#"
        INSERT INTO employees
            (employee_id, name, email, department, salary, phone_number,
             sex, qualifications, role, date_of_birth, joining_date,
             experience, experienced_role)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&employee_id)
    .bind(&new.name)
    .bind(&new.email)
    .bind(&new.department)
    .bind(new.salary)
    .bind(&new.phone_number)
    .bind(&new.sex)
    .bind(&new.qualifications)
    .bind(&new.role)
    .bind(&new.date_of_birth)
    .bind(&new.joining_date)
    .bind(&new.experience)
    .bind(&new.experienced_role)
    .execute(&mut *tx)
    .await;

    let inserted_id = match result {
        Ok(res) => res.last_insert_rowid(),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            // Two distinct departments can derive the same prefix
            // ("Engineering" / "English" are both ENG) with independent
            // counters, so the employee_id index can fire here too.
            if db_err.message().contains("employees.employee_id") {
                return Err(ApiError::Validation(format!(
                    "Employee ID {} already assigned to another department",
                    employee_id
                )));
            }
            return Err(ApiError::Validation(format!(
                "Email {} already exists",
                new.email
            )));
        }
        Err(e) => {
            error!(error = %e, %employee_id, "Failed to create employee");
            return Err(e.into());
        }
    };

    tx.commit().await?;

    email_filter::insert(&new.email);
    email_cache::mark_taken(&new.email).await;

    let employee = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = ?")
        .bind(inserted_id)
        .fetch_one(pool.get_ref())
        .await?;

    Ok(HttpResponse::Created().json(employee))
}

/// List all employees
#[utoipa::path(
    get,
    path = "/api/employees",
    responses(
        (status = 200, description = "All employee records", body = [Employee]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let employees = sqlx::query_as::<_, Employee>("SELECT * FROM employees ORDER BY id")
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(employees))
}

/// Look up an employee by derived ID
#[utoipa::path(
    get,
    path = "/api/employees/search/{employee_id}",
    params(("employee_id" = String, Path, description = "Derived employee ID, e.g. ENG_0004")),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn search_employee(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = path.into_inner();
    auth.require_self_or_admin(&employee_id)?;

    let employee =
        sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE employee_id = ?")
            .bind(&employee_id)
            .fetch_optional(pool.get_ref())
            .await?;

    match employee {
        Some(emp) => Ok(HttpResponse::Ok().json(emp)),
        None => Err(ApiError::NotFound(format!(
            "Employee {} not found",
            employee_id
        ))),
    }
}

/// Update Employee (partial merge by store ID)
#[utoipa::path(
    put,
    path = "/api/employees/{id}",
    params(("id" = i64, Path, description = "Employee store ID")),
    request_body = Object,
    responses(
        (status = 200, description = "Updated record", body = Employee),
        (status = 404, description = "Employee not found"),
        (status = 422, description = "Unknown or immutable field in payload"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let id = path.into_inner();
    let mut payload = body.into_inner();

    // Emails are stored lowercased; normalize before the value reaches
    // the SQL builder so the unique index and the fast path agree.
    let new_email = match payload.get("email") {
        Some(Value::String(e)) => {
            let e = e.trim().to_lowercase();
            if !e.contains('@') {
                return Err(ApiError::Validation("Invalid email address".into()));
            }
            payload["email"] = Value::String(e.clone());
            Some(e)
        }
        Some(_) => return Err(ApiError::Validation("Invalid email address".into())),
        None => None,
    };

    let old_email: Option<String> = if new_email.is_some() {
        sqlx::query_scalar("SELECT email FROM employees WHERE id = ?")
            .bind(id)
            .fetch_optional(pool.get_ref())
            .await?
    } else {
        None
    };

    let update = build_update_sql("employees", &payload, EMPLOYEE_UPDATE_COLUMNS, "id", id)?;

    let affected = execute_update(pool.get_ref(), update)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                ApiError::Validation("Email already exists".into())
            }
            other => ApiError::from(other),
        })?;

    if affected == 0 {
        return Err(ApiError::NotFound(format!("Employee {} not found", id)));
    }

    // The old address is free again; the fast path must forget it or a
    // later create reusing it would be rejected without a store lookup.
    if let Some(new_email) = new_email {
        if let Some(old_email) = old_email.filter(|old| *old != new_email) {
            email_filter::remove(&old_email);
            email_cache::EMAIL_CACHE.invalidate(&old_email).await;
        }
        email_filter::insert(&new_email);
        email_cache::mark_taken(&new_email).await;
    }

    let employee = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = ?")
        .bind(id)
        .fetch_one(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(employee))
}

/// Delete Employee
#[utoipa::path(
    delete,
    path = "/api/employees/{id}",
    params(("id" = i64, Path, description = "Employee store ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Employee not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn delete_employee(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let id = path.into_inner();

    // Leave rows referencing this employee stay put: the name they carry
    // was denormalized at submission, so they remain readable.
    let email: Option<String> = sqlx::query_scalar("SELECT email FROM employees WHERE id = ?")
        .bind(id)
        .fetch_optional(pool.get_ref())
        .await?;

    let Some(email) = email else {
        return Err(ApiError::NotFound(format!("Employee {} not found", id)));
    };

    sqlx::query("DELETE FROM employees WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await?;

    email_filter::remove(&email);
    email_cache::EMAIL_CACHE.invalidate(&email.to_lowercase()).await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully deleted"
    })))
}

#[derive(Serialize, sqlx::FromRow, ToSchema)]
pub struct ReportRow {
    pub employee_id: String,
    pub name: String,
    pub email: String,
    pub department: String,
    pub role: String,
}

/// Row data for the external report renderer. Rendering itself happens
/// outside this service.
#[utoipa::path(
    get,
    path = "/api/employees/report",
    responses(
        (status = 200, description = "Rows for the report renderer", body = [ReportRow]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn report_employees(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let rows = sqlx::query_as::<_, ReportRow>(
        "SELECT employee_id, name, email, department, role FROM employees ORDER BY department, employee_id",
    )
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_is_first_three_letters_uppercased() {
        assert_eq!(department_prefix("Engineering"), "ENG");
        assert_eq!(department_prefix("sales"), "SAL");
        assert_eq!(department_prefix("hr"), "HR");
    }

    fn full_payload() -> CreateEmployee {
        CreateEmployee {
            name: Some("Asha Rahman".into()),
            email: Some("Asha@Company.com".into()),
            department: Some("Engineering".into()),
            salary: Some(85000.0),
            phone_number: Some("+8801712345678".into()),
            sex: Some("Female".into()),
            qualifications: Some("BSc CSE".into()),
            role: Some("Employee".into()),
            date_of_birth: Some("1994-03-12".into()),
            joining_date: Some("2021-06-01".into()),
            experience: Some("5 years".into()),
            experienced_role: None,
        }
    }

    #[test]
    fn validate_lowercases_email() {
        let new = full_payload().validate().unwrap();
        assert_eq!(new.email, "asha@company.com");
    }

    #[test]
    fn validate_reports_the_missing_field() {
        let mut payload = full_payload();
        payload.department = None;
        let err = payload.validate().unwrap_err();
        match err {
            ApiError::Validation(msg) => assert!(msg.contains("department")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn blank_fields_count_as_missing() {
        let mut payload = full_payload();
        payload.name = Some("   ".into());
        assert!(payload.validate().is_err());
    }
}
