#[macro_use]
mod common;

use actix_web::test;
use serde_json::{json, Value};

use common::{admin_token, authed, employee_payload, employee_token, test_config, test_pool};

/// Creates an employee and yields their derived employee_id.
macro_rules! create_employee {
    ($app:expr, $token:expr, $name:expr, $email:expr) => {{
        let req = authed(test::TestRequest::post().uri("/api/employees"), $token)
            .set_json(employee_payload($name, $email, "Engineering"))
            .to_request();
        let resp = test::call_service($app, req).await;
        assert_eq!(resp.status(), 201);
        let body: Value = test::read_body_json(resp).await;
        body["employee_id"].as_str().unwrap().to_string()
    }};
}

#[actix_web::test]
async fn submit_denormalizes_the_employee_name() {
    let pool = test_pool().await;
    let config = test_config();
    let app = init_app!(pool, config);
    let admin = admin_token(&config);

    let employee_id = create_employee!(&app, &admin, "Asha", "asha@leave.test");
    let emp = employee_token(&config, &employee_id);

    let req = authed(test::TestRequest::post().uri("/api/leaves"), &emp)
        .set_json(json!({"employee_id": employee_id, "date": "2024-05-01", "reason": "Medical"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["employee_name"], "Asha");
    assert_eq!(body["status"], "Pending");
}

#[actix_web::test]
async fn submit_for_unknown_employee_writes_nothing() {
    let pool = test_pool().await;
    let config = test_config();
    let app = init_app!(pool, config);
    let admin = admin_token(&config);

    let req = authed(test::TestRequest::post().uri("/api/leaves"), &admin)
        .set_json(json!({"employee_id": "ZZZ_9999", "date": "2024-05-01", "reason": "Medical"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);

    let req = authed(test::TestRequest::get().uri("/api/leaves"), &admin).to_request();
    let pending: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert!(pending.as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn approve_archives_and_clears_the_pending_queue() {
    let pool = test_pool().await;
    let config = test_config();
    let app = init_app!(pool, config);
    let admin = admin_token(&config);

    let employee_id = create_employee!(&app, &admin, "Asha", "asha@approve.test");

    let req = authed(test::TestRequest::post().uri("/api/leaves"), &admin)
        .set_json(json!({"employee_id": employee_id, "date": "2024-05-01", "reason": "Medical"}))
        .to_request();
    let created: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let leave_id = created["id"].as_i64().unwrap();

    let req = authed(
        test::TestRequest::put().uri(&format!("/api/leaves/{}", leave_id)),
        &admin,
    )
    .set_json(json!({"status": "Approved"}))
    .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);

    // Gone from the pending queue.
    let req = authed(test::TestRequest::get().uri("/api/leaves"), &admin).to_request();
    let pending: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert!(pending.as_array().unwrap().is_empty());

    // Exactly one Approved record with matching fields.
    let req = authed(
        test::TestRequest::get().uri(&format!("/api/leaves/employee/{}", employee_id)),
        &admin,
    )
    .to_request();
    let history: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let rows = history.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["status"], "Approved");
    assert_eq!(rows[0]["employee_id"], employee_id);
    assert_eq!(rows[0]["date"], "2024-05-01");
    assert_eq!(rows[0]["reason"], "Medical");

    // A second approval finds no pending row.
    let req = authed(
        test::TestRequest::put().uri(&format!("/api/leaves/{}", leave_id)),
        &admin,
    )
    .set_json(json!({"status": "Approved"}))
    .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);
}

#[actix_web::test]
async fn reject_vanishes_without_history() {
    let pool = test_pool().await;
    let config = test_config();
    let app = init_app!(pool, config);
    let admin = admin_token(&config);

    let employee_id = create_employee!(&app, &admin, "Asha", "asha@reject.test");

    let req = authed(test::TestRequest::post().uri("/api/leaves"), &admin)
        .set_json(json!({"employee_id": employee_id, "date": "2024-06-10", "reason": "Travel"}))
        .to_request();
    let created: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let leave_id = created["id"].as_i64().unwrap();

    let req = authed(
        test::TestRequest::put().uri(&format!("/api/leaves/{}", leave_id)),
        &admin,
    )
    .set_json(json!({"status": "Rejected"}))
    .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);

    // No trace anywhere.
    let req = authed(test::TestRequest::get().uri("/api/leaves"), &admin).to_request();
    let pending: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert!(pending.as_array().unwrap().is_empty());

    let req = authed(
        test::TestRequest::get().uri(&format!("/api/leaves/employee/{}", employee_id)),
        &admin,
    )
    .to_request();
    let history: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert!(history.as_array().unwrap().is_empty());

    // Rejecting again is NotFound, not a crash.
    let req = authed(
        test::TestRequest::put().uri(&format!("/api/leaves/{}", leave_id)),
        &admin,
    )
    .set_json(json!({"status": "Rejected"}))
    .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);
}

#[actix_web::test]
async fn unrecognized_status_leaves_state_unchanged() {
    let pool = test_pool().await;
    let config = test_config();
    let app = init_app!(pool, config);
    let admin = admin_token(&config);

    let employee_id = create_employee!(&app, &admin, "Asha", "asha@badstatus.test");

    let req = authed(test::TestRequest::post().uri("/api/leaves"), &admin)
        .set_json(json!({"employee_id": employee_id, "date": "2024-07-01", "reason": "Family"}))
        .to_request();
    let created: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let leave_id = created["id"].as_i64().unwrap();

    let req = authed(
        test::TestRequest::put().uri(&format!("/api/leaves/{}", leave_id)),
        &admin,
    )
    .set_json(json!({"status": "Vacation"}))
    .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);

    // Still pending.
    let req = authed(test::TestRequest::get().uri("/api/leaves"), &admin).to_request();
    let pending: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(pending.as_array().unwrap().len(), 1);
    assert_eq!(pending[0]["status"], "Pending");
}

#[actix_web::test]
async fn employees_submit_for_themselves_only_and_never_decide() {
    let pool = test_pool().await;
    let config = test_config();
    let app = init_app!(pool, config);
    let admin = admin_token(&config);

    let own = create_employee!(&app, &admin, "Self", "self@roles.test");
    let other = create_employee!(&app, &admin, "Other", "other@roles.test");
    let emp = employee_token(&config, &own);

    // For someone else: forbidden.
    let req = authed(test::TestRequest::post().uri("/api/leaves"), &emp)
        .set_json(json!({"employee_id": other, "date": "2024-05-01", "reason": "Medical"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    // For themselves: fine.
    let req = authed(test::TestRequest::post().uri("/api/leaves"), &emp)
        .set_json(json!({"employee_id": own, "date": "2024-05-01", "reason": "Medical"}))
        .to_request();
    let created: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let leave_id = created["id"].as_i64().unwrap();

    // Deciding is an admin capability.
    let req = authed(
        test::TestRequest::put().uri(&format!("/api/leaves/{}", leave_id)),
        &emp,
    )
    .set_json(json!({"status": "Approved"}))
    .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    // So is reading the pending queue.
    let req = authed(test::TestRequest::get().uri("/api/leaves"), &emp).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);
}

#[actix_web::test]
async fn denormalized_name_survives_a_rename() {
    let pool = test_pool().await;
    let config = test_config();
    let app = init_app!(pool, config);
    let admin = admin_token(&config);

    let req = authed(test::TestRequest::post().uri("/api/employees"), &admin)
        .set_json(employee_payload("Asha", "asha@rename.test", "Engineering"))
        .to_request();
    let created: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let id = created["id"].as_i64().unwrap();
    let employee_id = created["employee_id"].as_str().unwrap().to_string();

    let req = authed(test::TestRequest::post().uri("/api/leaves"), &admin)
        .set_json(json!({"employee_id": employee_id, "date": "2024-05-01", "reason": "Medical"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 201);

    // Rename after submission.
    let req = authed(
        test::TestRequest::put().uri(&format!("/api/employees/{}", id)),
        &admin,
    )
    .set_json(json!({"name": "Asha Renamed"}))
    .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);

    // The copy on the leave is frozen at submission time.
    let req = authed(
        test::TestRequest::get().uri(&format!("/api/leaves/employee/{}", employee_id)),
        &admin,
    )
    .to_request();
    let history: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(history[0]["employee_name"], "Asha");
}
