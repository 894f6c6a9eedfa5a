use axum::http::StatusCode;
use serde_json::{json, Value};

mod support;

use support::{another_day, class_payload, json_request, not_today, TestApp};
use tower::ServiceExt;

async fn add_class(app: &TestApp, token: &str, payload: Value) -> (StatusCode, Value) {
    app.call("POST", "/api/timetable/add", Some(token), Some(payload))
        .await
}

#[tokio::test]
async fn added_class_is_normalised_and_listed() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let day = not_today(&app.state.config);

    let (status, body) = add_class(
        &app,
        &admin,
        class_payload(day, "a", "2:00 PM", "15:30", "Algebra"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let entry = &body["timetable_entry"];
    assert_eq!(entry["section"], "A");
    assert_eq!(entry["start_time"], "14:00");
    assert_eq!(entry["end_time"], "15:30");
    assert_eq!(entry["created_by"], "ADMIN");
    assert!(entry["id"].as_str().unwrap().starts_with("TT_"));

    let (status, body) = app
        .call("GET", "/api/timetable/list", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let classes = body["data"][day.as_str()].as_array().unwrap();
    assert_eq!(classes.len(), 1);
    assert_eq!(classes[0]["class_name"], "Algebra");
    assert_eq!(body["data"].as_object().unwrap().len(), 6);
}

#[tokio::test]
async fn overlapping_class_in_same_section_is_rejected() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let day = not_today(&app.state.config);

    let (status, _) = add_class(&app, &admin, class_payload(day, "A", "09:00", "10:00", "Physics")).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = add_class(&app, &admin, class_payload(day, "a", "09:30", "10:30", "Chemistry")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "SCHEDULE_CLASH");
    assert_eq!(body["details"]["conflicting_class"], "Physics");
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Time clash detected! Physics is scheduled from"));

    // Touching intervals and other sections do not clash.
    let (status, _) = add_class(&app, &admin, class_payload(day, "A", "10:00", "11:00", "Biology")).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = add_class(&app, &admin, class_payload(day, "B", "09:15", "09:45", "History")).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn invalid_entries_are_rejected_in_order() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let day = not_today(&app.state.config);

    let mut missing_section = class_payload(day, "A", "09:00", "10:00", "Art");
    missing_section["section"] = json!("");
    let (status, body) = add_class(&app, &admin, missing_section).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "All required fields including section must be provided"
    );

    let (status, body) = add_class(&app, &admin, class_payload(day, "A", "25:00", "26:00", "Art")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid time format");

    let (status, body) = add_class(&app, &admin, class_payload(day, "A", "11:00", "10:00", "Art")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "End time must be after start time");

    let mut sunday = class_payload(day, "A", "09:00", "10:00", "Art");
    sunday["day"] = json!("Sunday");
    let (status, body) = add_class(&app, &admin, sunday).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid day");
}

#[tokio::test]
async fn students_cannot_modify_timetable_and_nothing_is_audited() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (_, username) = app.create_student(&admin, "Tara Joshi", "A").await;
    let student = app.login(&username, "stud123").await;
    let day = not_today(&app.state.config);
    let before = app.activities(&admin).await.len();

    let (status, body) = add_class(&app, &student, class_payload(day, "A", "09:00", "10:00", "Art")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Unauthorized");

    let timetable = app.state.repos.timetable.read().await.unwrap();
    assert!(timetable.entries().next().is_none());
    assert_eq!(app.activities(&admin).await.len(), before);

    // Reading stays open to every signed-in role.
    let (status, _) = app
        .call("GET", "/api/timetable/list", Some(&student), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn faculty_can_manage_classes() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let faculty_name = app.create_faculty(&admin, "Lata Menon").await;
    let faculty = app.login(&faculty_name, "acad123").await;
    let day = not_today(&app.state.config);

    let (status, body) = add_class(&app, &faculty, class_payload(day, "C", "08:00", "09:00", "Botany")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["timetable_entry"]["created_by"], faculty_name.as_str());

    let activities = app.activities(&admin).await;
    assert_eq!(activities[0]["action"], "TIMETABLE_ADDED");
    assert_eq!(activities[0]["user"], faculty_name.as_str());
    assert_eq!(activities[0]["entity_type"], "Timetable");
}

#[tokio::test]
async fn update_moves_entry_to_new_day_and_excludes_itself_from_clash() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let first = not_today(&app.state.config);
    let second = another_day(&app.state.config, first);

    let (_, body) = add_class(&app, &admin, class_payload(first, "A", "09:00", "10:00", "Geometry")).await;
    let id = body["timetable_entry"]["id"].as_str().unwrap().to_string();

    // Shifting within its own slot is not a clash with itself.
    let (status, body) = app
        .call(
            "PUT",
            &format!("/api/timetable/{}", id),
            Some(&admin),
            Some(json!({ "start_time": "09:30", "end_time": "10:30" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timetable_entry"]["start_time"], "09:30");

    let (status, body) = app
        .call(
            "PUT",
            &format!("/api/timetable/{}", id),
            Some(&admin),
            Some(json!({ "day": second.as_str().to_lowercase() })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Timetable entry updated");

    let timetable = app.state.repos.timetable.read().await.unwrap();
    assert!(timetable.day(first).is_empty());
    let moved = timetable.day(second);
    assert_eq!(moved.len(), 1);
    assert_eq!(moved[0].id, id);
    assert_eq!(moved[0].class_name, "Geometry");
    assert!(moved[0].updated_at.is_some());
}

#[tokio::test]
async fn update_into_occupied_slot_clashes() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let day = not_today(&app.state.config);

    add_class(&app, &admin, class_payload(day, "A", "09:00", "10:00", "Early")).await;
    let (_, body) = add_class(&app, &admin, class_payload(day, "A", "11:00", "12:00", "Late")).await;
    let id = body["timetable_entry"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .call(
            "PUT",
            &format!("/api/timetable/{}", id),
            Some(&admin),
            Some(json!({ "start_time": "09:30" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["details"]["conflicting_class"], "Early");
}

#[tokio::test]
async fn unknown_entries_are_not_found() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    let (status, body) = app
        .call(
            "PUT",
            "/api/timetable/TT_missing",
            Some(&admin),
            Some(json!({ "class_name": "Ghost" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Timetable entry not found");

    let (status, _) = app
        .call("DELETE", "/api/timetable/TT_missing", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_entry_and_audits() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let day = not_today(&app.state.config);
    let (_, body) = add_class(&app, &admin, class_payload(day, "D", "13:00", "14:00", "Poetry")).await;
    let id = body["timetable_entry"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .call("DELETE", &format!("/api/timetable/{}", id), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Class deleted successfully");

    let timetable = app.state.repos.timetable.read().await.unwrap();
    assert!(timetable.day(day).is_empty());
    let activities = app.activities(&admin).await;
    assert_eq!(activities[0]["action"], "TIMETABLE_DELETED");
    assert_eq!(activities[0]["entity_id"], id.as_str());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adds_for_one_slot_store_a_single_class() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let day = not_today(&app.state.config);

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let router = app.router.clone();
            let request = json_request(
                "POST",
                "/api/timetable/add",
                Some(&admin),
                Some(class_payload(day, "A", "09:00", "10:00", &format!("Class {}", i))),
            );
            tokio::spawn(async move { router.oneshot(request).await.unwrap().status() })
        })
        .collect();

    let mut created = 0;
    let mut clashed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            StatusCode::CREATED => created += 1,
            StatusCode::CONFLICT => clashed += 1,
            other => panic!("unexpected status {}", other),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(clashed, 15);

    let timetable = app.state.repos.timetable.read().await.unwrap();
    assert_eq!(timetable.day(day).len(), 1);
}
