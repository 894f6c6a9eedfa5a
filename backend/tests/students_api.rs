use axum::http::StatusCode;
use eduportal_backend::models::RecordStatus;
use serde_json::json;

mod support;

use support::TestApp;

#[tokio::test]
async fn adding_a_student_creates_record_and_login() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    let (status, body) = app
        .call(
            "POST",
            "/api/students/add",
            Some(&admin),
            Some(json!({ "student_name": "Priya Nair", "section": "b" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let student = &body["student"];
    assert_eq!(student["section"], "B");
    assert_eq!(student["username"], "priya.nair");
    assert_eq!(student["default_password"], "stud123");
    assert!(student["id"].as_str().unwrap().starts_with("STU_"));
    assert!(student["registration_id"].as_str().unwrap().starts_with("REG-"));

    let users = app.state.repos.users.read().await.unwrap();
    let user = users.get("priya.nair").unwrap();
    assert_eq!(user.id, student["id"].as_str().unwrap());
    assert_eq!(user.created_by.as_deref(), Some("ADMIN"));

    let (status, body) = app
        .call("GET", "/api/students/list", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["login_id"], "priya.nair");
}

#[tokio::test]
async fn duplicate_names_get_numbered_usernames() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (_, first) = app.create_student(&admin, "Sam Roy", "A").await;
    let (_, second) = app.create_student(&admin, "Sam Roy", "A").await;
    assert_eq!(first, "sam.roy");
    assert_eq!(second, "sam.roy1");
}

#[tokio::test]
async fn add_requires_name_and_section() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (status, body) = app
        .call(
            "POST",
            "/api/students/add",
            Some(&admin),
            Some(json!({ "student_name": "No Section" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Student name and section are required");
}

#[tokio::test]
async fn view_includes_credentials_for_admin_only() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (id, _) = app.create_student(&admin, "Dev Patel", "A").await;
    let faculty_name = app.create_faculty(&admin, "Uma Shah").await;
    let faculty = app.login(&faculty_name, "acad123").await;

    let uri = format!("/api/students/{}/view", id);
    let (status, body) = app.call("GET", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["student"]["student_name"], "Dev Patel");
    assert!(body["student"]["password_hash"].is_string());
    assert_eq!(body["student"]["profile_completed"], false);

    let (status, body) = app.call("GET", &uri, Some(&faculty), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["student"].get("password_hash").is_none());

    let (status, body) = app
        .call("GET", "/api/students/STU_missing/view", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Student not found");
}

#[tokio::test]
async fn update_applies_partial_fields_and_rejects_bad_contacts() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (id, _) = app.create_student(&admin, "Ira Bose", "A").await;
    let uri = format!("/api/students/{}", id);

    let (status, body) = app
        .call("PUT", &uri, Some(&admin), Some(json!({ "email": "not-an-email" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid email format");

    let (status, body) = app
        .call("PUT", &uri, Some(&admin), Some(json!({ "phone": "12345" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid phone number format");

    let (status, body) = app
        .call(
            "PUT",
            &uri,
            Some(&admin),
            Some(json!({
                "section": "c",
                "email": "IRA@School.Test",
                "phone": "98765-43210",
                "first_name": "<b>Ira</b>",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let student = &body["student"];
    assert_eq!(student["section"], "C");
    assert_eq!(student["email"], "ira@school.test");
    assert_eq!(student["phone"], "98765-43210");
    assert_eq!(student["first_name"], "&lt;b&gt;Ira&lt;/b&gt;");
    assert_eq!(student["student_name"], "Ira Bose");
}

#[tokio::test]
async fn students_cannot_manage_students() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (id, username) = app.create_student(&admin, "Zoya Khan", "A").await;
    let student = app.login(&username, "stud123").await;

    let (status, _) = app
        .call(
            "POST",
            "/api/students/add",
            Some(&student),
            Some(json!({ "student_name": "Intruder", "section": "A" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .call("DELETE", &format!("/api/students/{}", id), Some(&student), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .call("GET", "/api/students/list", Some(&student), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn delete_is_soft_and_deactivates_login() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (id, username) = app.create_student(&admin, "Arjun Pal", "A").await;

    let (status, body) = app
        .call("DELETE", &format!("/api/students/{}", id), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Student deleted successfully");

    let students = app.state.repos.students.read().await.unwrap();
    assert_eq!(students.0.get(&id).unwrap().status, RecordStatus::Inactive);
    let users = app.state.repos.users.read().await.unwrap();
    assert_eq!(users.get(&username).unwrap().status, RecordStatus::Inactive);

    let (status, _) = app
        .call(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "username": username, "password": "stud123" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let activities = app.activities(&admin).await;
    assert_eq!(activities[0]["action"], "STUDENT_DELETED");
    assert_eq!(activities[0]["description"], "Student Arjun Pal deleted");
}
