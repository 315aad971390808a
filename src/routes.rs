use crate::{
    api::{attendance, calendar, employee, leave_request},
    config::Config,
};
use actix_web::web;

/// Largest attendance sheet accepted by the upload route.
const SHEET_LIMIT_BYTES: usize = 4 * 1024 * 1024;

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    cfg.service(
        web::scope(&config.api_prefix)
            .service(
                web::scope("/employee")
                    // /employee
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    // /employee/{id}
                    .service(web::resource("/{id}").route(web::get().to(employee::get_employee))),
            )
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::leave_list))
                            .route(web::post().to(leave_request::create_leave)),
                    )
                    // before /{id} so it is not taken for an id
                    .service(
                        web::resource("/stats").route(web::get().to(leave_request::leave_stats)),
                    )
                    // /leave/{id}
                    .service(web::resource("/{id}").route(web::get().to(leave_request::get_leave)))
                    // /leave/{id}/attachments
                    .service(
                        web::resource("/{id}/attachments")
                            .route(web::get().to(leave_request::leave_attachments)),
                    )
                    // /leave/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(leave_request::approve_leave)),
                    )
                    // /leave/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(leave_request::reject_leave)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(web::resource("").route(web::get().to(attendance::presence_list)))
                    // /attendance/upload
                    .service(
                        web::resource("/upload")
                            .app_data(web::PayloadConfig::new(SHEET_LIMIT_BYTES))
                            .route(web::post().to(attendance::upload_attendance)),
                    )
                    // /attendance/month
                    .service(
                        web::resource("/month").route(web::delete().to(attendance::clear_month)),
                    )
                    // /attendance/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::delete().to(attendance::delete_attendance)),
                    )
                    // /attendance/{id}/correct
                    .service(
                        web::resource("/{id}/correct")
                            .route(web::put().to(attendance::correct_attendance)),
                    )
                    // /attendance/{id}/corrections
                    .service(
                        web::resource("/{id}/corrections")
                            .route(web::get().to(attendance::attendance_corrections)),
                    ),
            )
            .service(
                web::scope("/calendar")
                    // /calendar
                    .service(web::resource("").route(web::get().to(calendar::calendar)))
                    // /calendar/{date}
                    .service(web::resource("/{date}").route(web::get().to(calendar::daily))),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::session::ROLE_HEADER;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use serde_json::{Value, json};

    macro_rules! app {
        ($pool:expr) => {{
            let config = Config::default();
            test::init_service(
                App::new()
                    .app_data(web::Data::new($pool.clone()))
                    .app_data(web::Data::new(config.clone()))
                    .configure(|cfg| configure(cfg, &config)),
            )
            .await
        }};
    }

    fn admin(req: test::TestRequest) -> test::TestRequest {
        req.insert_header((ROLE_HEADER, "admin"))
    }

    fn leave_body(name: &str) -> Value {
        json!({
            "name": name,
            "division": "Research",
            "leave_type": "Sick-Leave",
            "submitted_on": "2024-04-28",
            "start_date": "2024-05-01",
            "duration": 3,
            "supporting_doc": "data:image/jpeg;base64,/9j/4A=="
        })
    }

    #[actix_web::test]
    async fn admin_routes_reject_employees() {
        let pool = test_pool().await;
        let app = app!(pool);

        let req = test::TestRequest::get().uri("/api/leave").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = admin(test::TestRequest::get().uri("/api/leave")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn submit_approve_and_see_absence_on_calendar() {
        let pool = test_pool().await;
        let app = app!(pool);

        // employees may submit
        let req = test::TestRequest::post()
            .uri("/api/leave")
            .set_json(leave_body("Budi"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let id = body["id"].as_i64().unwrap();
        assert_eq!(body["status"], "Pending");

        let req = admin(test::TestRequest::put().uri(&format!("/api/leave/{id}/approve")))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "Approved");
        assert_eq!(body["expanded_days"], 3);

        let req = admin(test::TestRequest::put().uri(&format!("/api/leave/{id}/approve")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let req = admin(test::TestRequest::get().uri("/api/calendar?from=2024-05-01&to=2024-05-31"))
            .to_request();
        let feed: Value = test::call_and_read_body_json(&app, req).await;
        let feed = feed.as_array().unwrap();
        assert_eq!(feed.len(), 3);
        assert_eq!(feed[0]["date"], "2024-05-01");
        assert_eq!(feed[0]["absent"], 1);
        assert_eq!(feed[0]["present"], 0);
        assert_eq!(feed[0]["title"], "P:0 L:0 A:1");

        let req = admin(test::TestRequest::get().uri("/api/calendar/2024-05-02?detail=absent"))
            .to_request();
        let day: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(day["summary"]["absent"], 1);
        assert_eq!(day["absences"][0]["name"], "Budi");
        assert!(day.get("attendance").is_none());
    }

    #[actix_web::test]
    async fn leave_stats_route_is_not_an_id() {
        let pool = test_pool().await;
        let app = app!(pool);

        let req = test::TestRequest::post()
            .uri("/api/leave")
            .set_json(leave_body("Sari"))
            .to_request();
        test::call_service(&app, req).await;

        let req = admin(test::TestRequest::get().uri("/api/leave/stats")).to_request();
        let stats: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(stats, json!([{ "leave_type": "Sick-Leave", "count": 1 }]));
    }

    #[actix_web::test]
    async fn attachments_come_back_as_data_uris() {
        let pool = test_pool().await;
        let app = app!(pool);

        let req = test::TestRequest::post()
            .uri("/api/leave")
            .set_json(leave_body("Sari"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let id = body["id"].as_i64().unwrap();

        let req = admin(test::TestRequest::get().uri(&format!("/api/leave/{id}/attachments")))
            .to_request();
        let links: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(links["supporting_doc"], "data:image/jpeg;base64,/9j/4A==");
        assert_eq!(links["approval_doc"], Value::Null);
    }

    #[actix_web::test]
    async fn upload_then_list_presence_and_daily_late_detail() {
        let pool = test_pool().await;
        let app = app!(pool);
        let sheet = "ID,Nama,Jenis,2,3\n\
                     7,Budi,datang,08:00,09:30\n\
                     7,Budi,pulang,17:00,17:00\n";

        let req = admin(test::TestRequest::post().uri("/api/attendance/upload?year=2024&month=5"))
            .insert_header(("content-type", "text/csv"))
            .set_payload(sheet)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = admin(test::TestRequest::post().uri("/api/attendance/upload?year=2024&month=5"))
            .insert_header(("content-type", "text/csv"))
            .set_payload(sheet)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let req = admin(test::TestRequest::get().uri("/api/attendance?year=2024&month=5"))
            .to_request();
        let listing: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listing["uploaded"], true);
        let data = listing["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[1]["status"], "Late");
        assert_eq!(data[1]["late"], true);
        assert_eq!(data[1]["division"], "No Data");

        let req = admin(test::TestRequest::get().uri("/api/calendar/2024-05-03?detail=late"))
            .to_request();
        let day: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(day["summary"], json!({ "present": 1, "late": 1, "absent": 0 }));
        assert_eq!(day["attendance"][0]["clock_in"], "09:30");
    }

    #[actix_web::test]
    async fn xlsx_upload_is_read_from_the_first_worksheet() {
        let pool = test_pool().await;
        let app = app!(pool);

        let req = admin(test::TestRequest::post().uri("/api/attendance/upload?year=2024&month=5"))
            .insert_header((
                "content-type",
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            ))
            .set_payload(crate::reconcile::sheet::tests::workbook())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["inserted"], 2);

        let req = admin(test::TestRequest::get().uri("/api/attendance?year=2024&month=5"))
            .to_request();
        let listing: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listing["data"][0]["clock_in"], "08:00");
        assert_eq!(listing["data"][0]["clock_out"], "17:30");
        assert_eq!(listing["data"][1]["late"], true);
    }

    #[actix_web::test]
    async fn unknown_sheet_type_is_unsupported_media() {
        let pool = test_pool().await;
        let app = app!(pool);

        let req = admin(test::TestRequest::post().uri("/api/attendance/upload?year=2024&month=5"))
            .insert_header(("content-type", "application/pdf"))
            .set_payload("%PDF-1.4")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[actix_web::test]
    async fn correction_route_keeps_an_audit_trail() {
        let pool = test_pool().await;
        let app = app!(pool);

        let req = admin(test::TestRequest::post().uri("/api/attendance/upload?year=2024&month=5"))
            .set_payload("ID,Nama,Jenis,2\n7,Budi,datang,8.05\n")
            .to_request();
        test::call_service(&app, req).await;

        let req = admin(test::TestRequest::get().uri("/api/attendance?year=2024&month=5"))
            .to_request();
        let listing: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listing["data"][0]["status"], "Invalid-Time");
        let id = listing["data"][0]["id"].as_i64().unwrap();

        let req = admin(test::TestRequest::put().uri(&format!("/api/attendance/{id}/correct")))
            .set_json(json!({ "status": "On-Time", "reason": "Sheet typo" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = admin(test::TestRequest::get().uri(&format!("/api/attendance/{id}/corrections")))
            .to_request();
        let trail: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(trail[0]["old_status"], "Invalid-Time");
        assert_eq!(trail[0]["new_status"], "On-Time");
    }

    #[actix_web::test]
    async fn bad_inputs_map_to_client_errors() {
        let pool = test_pool().await;
        let app = app!(pool);

        let req = admin(test::TestRequest::get().uri("/api/calendar/2024-02-30")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = admin(test::TestRequest::get().uri("/api/calendar?from=2024-05-02&to=2024-05-01"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = admin(test::TestRequest::delete().uri("/api/attendance/42")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = admin(test::TestRequest::get().uri("/api/leave/42")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn employee_directory_round_trip() {
        let pool = test_pool().await;
        let app = app!(pool);
        let budi = json!({ "id": 7, "name": "Budi", "division": "Research" });

        let req = admin(test::TestRequest::post().uri("/api/employee"))
            .set_json(&budi)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let req = admin(test::TestRequest::post().uri("/api/employee"))
            .set_json(&budi)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

        let req = admin(test::TestRequest::get().uri("/api/employee/7")).to_request();
        let found: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(found, budi);
    }
}
