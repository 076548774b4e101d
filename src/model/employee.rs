use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_id": "ENG_0001",
        "name": "Asha Rahman",
        "email": "asha@company.com",
        "department": "Engineering",
        "salary": 85000.0,
        "phone_number": "+8801712345678",
        "sex": "Female",
        "qualifications": "BSc CSE",
        "role": "Employee",
        "date_of_birth": "1994-03-12",
        "joining_date": "2021-06-01",
        "experience": "5 years",
        "experienced_role": "Backend Developer"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: i64,

    /// Derived domain ID, immutable once assigned:
    /// `<first 3 letters of department, uppercased>_<4-digit serial>`.
    #[schema(example = "ENG_0001")]
    pub employee_id: String,

    #[schema(example = "Asha Rahman")]
    pub name: String,

    #[schema(example = "asha@company.com")]
    pub email: String,

    #[schema(example = "Engineering")]
    pub department: String,

    #[schema(example = 85000.0)]
    pub salary: f64,

    #[schema(example = "+8801712345678")]
    pub phone_number: String,

    #[schema(example = "Female")]
    pub sex: String,

    #[schema(example = "BSc CSE")]
    pub qualifications: String,

    #[schema(example = "Employee")]
    pub role: String,

    #[schema(example = "1994-03-12")]
    pub date_of_birth: String,

    #[schema(example = "2021-06-01")]
    pub joining_date: String,

    #[schema(example = "5 years")]
    pub experience: String,

    #[schema(example = "Backend Developer", nullable = true)]
    pub experienced_role: Option<String>,
}
