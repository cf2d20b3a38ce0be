#[cfg(test)]
mod integration_tests {
    use crate::config::{SEED_PASSWORD, SEED_USERNAME};
    use crate::handlers::auth::{LoginRequest, RegisterRequest};
    use crate::schemas::ApiResponse;
    use crate::test_utils::test_utils::setup_test_app;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use tempfile::TempDir;

    const SAMPLE_CSV: &str = "\
OrderID,Year,Month,Region,Product,Quantity,Revenue
1,2023,Jan,East,A,2,100
1,2023,Jan,East,B,1,50
2,2023,Feb,West,A,3,300
";

    const MULTI_YEAR_CSV: &str = "\
OrderID,Year,Month,Region,Product,Quantity,Revenue
1,2023,Jan,East,A,2,100
1,2023,Jan,East,B,1,50
2,2023,Feb,West,A,3,300
3,2024,Jan,West,C,1,70
";

    /// Test server that keeps cookies between requests, like a browser.
    async fn setup_server() -> (TestServer, TempDir) {
        let (app, data_dir) = setup_test_app().await;
        let mut server = TestServer::new(app).unwrap();
        server.do_save_cookies();
        (server, data_dir)
    }

    /// Register an account and log the server's session in as that user.
    async fn register_and_login(server: &TestServer, username: &str, display_name: &str) {
        let register = RegisterRequest {
            username: username.to_string(),
            display_name: display_name.to_string(),
            password: "secret-pass".to_string(),
        };
        let response = server.post("/api/v1/auth/register").json(&register).await;
        response.assert_status(StatusCode::CREATED);

        let login = LoginRequest {
            username: username.to_string(),
            password: "secret-pass".to_string(),
        };
        let response = server.post("/api/v1/auth/login").json(&login).await;
        response.assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_check() {
        let (server, _data_dir) = setup_server().await;

        let response = server.get("/health").await;

        response.assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_register_account() {
        let (server, _data_dir) = setup_server().await;

        let request = RegisterRequest {
            username: "alice".to_string(),
            display_name: "Alice Example".to_string(),
            password: "hunter2".to_string(),
        };

        let response = server.post("/api/v1/auth/register").json(&request).await;

        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<serde_json::Value> = response.json();
        assert!(body.success);
        assert_eq!(body.message, "Account registered successfully");
        assert_eq!(body.data["username"], "alice");
        assert_eq!(body.data["display_name"], "Alice Example");
    }

    #[tokio::test]
    async fn test_register_then_login_returns_display_name() {
        let (server, _data_dir) = setup_server().await;

        let register = RegisterRequest {
            username: "bob".to_string(),
            display_name: "Bob the Builder".to_string(),
            password: "can-we-fix-it".to_string(),
        };
        server
            .post("/api/v1/auth/register")
            .json(&register)
            .await
            .assert_status(StatusCode::CREATED);

        let login = LoginRequest {
            username: "bob".to_string(),
            password: "can-we-fix-it".to_string(),
        };
        let response = server.post("/api/v1/auth/login").json(&login).await;

        response.assert_status(StatusCode::OK);
        let body: ApiResponse<serde_json::Value> = response.json();
        assert!(body.success);
        assert_eq!(body.data["display_name"], "Bob the Builder");

        // The session is now authenticated as bob.
        let session: ApiResponse<serde_json::Value> = server.get("/api/v1/session").await.json();
        assert_eq!(session.data["authenticated"], true);
        assert_eq!(session.data["username"], "bob");
        assert_eq!(session.data["stage"], "authenticated");
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let (server, _data_dir) = setup_server().await;

        let request = RegisterRequest {
            username: "carol".to_string(),
            display_name: "Carol".to_string(),
            password: "first-password".to_string(),
        };
        server
            .post("/api/v1/auth/register")
            .json(&request)
            .await
            .assert_status(StatusCode::CREATED);

        // Same username, different other fields: always rejected.
        let duplicate = RegisterRequest {
            username: "carol".to_string(),
            display_name: "Another Carol".to_string(),
            password: "other-password".to_string(),
        };
        let response = server.post("/api/v1/auth/register").json(&duplicate).await;

        response.assert_status(StatusCode::CONFLICT);
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "DUPLICATE_USERNAME");
    }

    #[tokio::test]
    async fn test_register_with_empty_field_is_rejected() {
        let (server, _data_dir) = setup_server().await;

        let request = RegisterRequest {
            username: "dave".to_string(),
            display_name: "Dave".to_string(),
            password: "".to_string(),
        };
        let response = server.post("/api/v1/auth/register").json(&request).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_login_with_wrong_password_is_invalid_password() {
        let (server, _data_dir) = setup_server().await;

        let register = RegisterRequest {
            username: "erin".to_string(),
            display_name: "Erin".to_string(),
            password: "right-password".to_string(),
        };
        server
            .post("/api/v1/auth/register")
            .json(&register)
            .await
            .assert_status(StatusCode::CREATED);

        let login = LoginRequest {
            username: "erin".to_string(),
            password: "wrong-password".to_string(),
        };
        let response = server.post("/api/v1/auth/login").json(&login).await;

        // An existing user with a wrong password is INVALID_PASSWORD,
        // never USER_NOT_FOUND.
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "INVALID_PASSWORD");
    }

    #[tokio::test]
    async fn test_login_with_unknown_user() {
        let (server, _data_dir) = setup_server().await;

        let login = LoginRequest {
            username: "nobody".to_string(),
            password: "irrelevant".to_string(),
        };
        let response = server.post("/api/v1/auth/login").json(&login).await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "USER_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_seed_admin_account_can_log_in() {
        let (server, _data_dir) = setup_server().await;

        let login = LoginRequest {
            username: SEED_USERNAME.to_string(),
            password: SEED_PASSWORD.to_string(),
        };
        let response = server.post("/api/v1/auth/login").json(&login).await;

        response.assert_status(StatusCode::OK);
        let body: ApiResponse<serde_json::Value> = response.json();
        assert_eq!(body.data["username"], "admin");
    }

    #[tokio::test]
    async fn test_session_stage_machine() {
        let (server, _data_dir) = setup_server().await;

        // A fresh session starts on the landing stage.
        let session: ApiResponse<serde_json::Value> = server.get("/api/v1/session").await.json();
        assert_eq!(session.data["stage"], "landing");
        assert_eq!(session.data["authenticated"], false);

        // Requesting the dashboard moves it to unauthenticated.
        let session: ApiResponse<serde_json::Value> =
            server.post("/api/v1/session/dashboard").await.json();
        assert_eq!(session.data["stage"], "unauthenticated");
        assert_eq!(session.data["authenticated"], false);

        // Registering alone does not change the stage.
        let register = RegisterRequest {
            username: "frank".to_string(),
            display_name: "Frank".to_string(),
            password: "pass".to_string(),
        };
        server
            .post("/api/v1/auth/register")
            .json(&register)
            .await
            .assert_status(StatusCode::CREATED);
        let session: ApiResponse<serde_json::Value> = server.get("/api/v1/session").await.json();
        assert_eq!(session.data["stage"], "unauthenticated");

        // Logging in authenticates the session.
        let login = LoginRequest {
            username: "frank".to_string(),
            password: "pass".to_string(),
        };
        server
            .post("/api/v1/auth/login")
            .json(&login)
            .await
            .assert_status(StatusCode::OK);
        let session: ApiResponse<serde_json::Value> = server.get("/api/v1/session").await.json();
        assert_eq!(session.data["stage"], "authenticated");
        assert_eq!(session.data["username"], "frank");

        // Logout resets to the landing state.
        server.post("/api/v1/auth/logout").await.assert_status(StatusCode::OK);
        let session: ApiResponse<serde_json::Value> = server.get("/api/v1/session").await.json();
        assert_eq!(session.data["stage"], "landing");
        assert_eq!(session.data["authenticated"], false);
        assert_eq!(session.data["username"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_dataset_routes_require_authentication() {
        let (server, _data_dir) = setup_server().await;

        let response = server.get("/api/v1/datasets/alice").await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "NOT_AUTHENTICATED");
    }

    #[tokio::test]
    async fn test_dataset_of_another_user_is_forbidden() {
        let (server, _data_dir) = setup_server().await;
        register_and_login(&server, "alice", "Alice").await;

        let response = server.get("/api/v1/datasets/bob").await;

        response.assert_status(StatusCode::FORBIDDEN);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_upload_and_dataset_status() {
        let (server, _data_dir) = setup_server().await;
        register_and_login(&server, "alice", "Alice").await;

        // Nothing stored yet.
        let status: ApiResponse<serde_json::Value> =
            server.get("/api/v1/datasets/alice").await.json();
        assert_eq!(status.data["status"], "pending_upload");

        // Upload the dataset.
        let response = server
            .post("/api/v1/datasets/alice")
            .text(SAMPLE_CSV)
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<serde_json::Value> = response.json();
        assert_eq!(body.data["status"], "ready");
        assert_eq!(body.data["existing"], false);
        assert_eq!(body.data["summary"]["rows"], 3);
        assert_eq!(body.data["summary"]["years"][0], 2023);

        // The dataset is now loaded on later requests.
        let status: ApiResponse<serde_json::Value> =
            server.get("/api/v1/datasets/alice").await.json();
        assert_eq!(status.data["status"], "ready");
        assert_eq!(status.data["summary"]["rows"], 3);
    }

    #[tokio::test]
    async fn test_second_upload_keeps_the_first_dataset() {
        let (server, _data_dir) = setup_server().await;
        register_and_login(&server, "alice", "Alice").await;

        server
            .post("/api/v1/datasets/alice")
            .text(SAMPLE_CSV)
            .await
            .assert_status(StatusCode::CREATED);

        // A second upload does not replace the stored dataset.
        let response = server
            .post("/api/v1/datasets/alice")
            .text(MULTI_YEAR_CSV)
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<serde_json::Value> = response.json();
        assert_eq!(body.data["existing"], true);
        assert_eq!(body.data["summary"]["rows"], 3);
    }

    #[tokio::test]
    async fn test_upload_with_missing_column() {
        let (server, _data_dir) = setup_server().await;
        register_and_login(&server, "alice", "Alice").await;

        let response = server
            .post("/api/v1/datasets/alice")
            .text("OrderID,Year,Month,Region,Product,Quantity\n1,2023,Jan,East,A,2\n")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "MISSING_REQUIRED_COLUMN");
        assert!(body["error"].as_str().unwrap().contains("Revenue"));
    }

    #[tokio::test]
    async fn test_filter_options_come_from_the_dataset() {
        let (server, _data_dir) = setup_server().await;
        register_and_login(&server, "alice", "Alice").await;

        server
            .post("/api/v1/datasets/alice")
            .text(MULTI_YEAR_CSV)
            .await
            .assert_status(StatusCode::CREATED);

        let response = server.get("/api/v1/datasets/alice/filters").await;

        response.assert_status(StatusCode::OK);
        let body: ApiResponse<serde_json::Value> = response.json();
        assert_eq!(body.data["years"], serde_json::json!([2023, 2024]));
        assert_eq!(
            body.data["regions"],
            serde_json::json!(["All", "East", "West"])
        );
    }

    #[tokio::test]
    async fn test_metrics_for_the_worked_example() {
        let (server, _data_dir) = setup_server().await;
        register_and_login(&server, "alice", "Alice").await;

        server
            .post("/api/v1/datasets/alice")
            .text(SAMPLE_CSV)
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .get("/api/v1/datasets/alice/metrics?year=2023&region=All")
            .await;

        response.assert_status(StatusCode::OK);
        let body: ApiResponse<serde_json::Value> = response.json();
        let metrics = &body.data["metrics"];

        assert_eq!(metrics["total_revenue"], "450");
        assert_eq!(metrics["total_orders"], 2);
        assert_eq!(metrics["units_sold"], "6");
        assert_eq!(metrics["average_order_value"], "225");

        assert_eq!(
            metrics["regional_breakdown"],
            serde_json::json!([
                { "region": "East", "revenue": "150" },
                { "region": "West", "revenue": "300" },
            ])
        );

        // Preview carries the raw filtered rows, capped at 20.
        assert_eq!(body.data["preview"].as_array().unwrap().len(), 3);
        assert_eq!(body.data["preview"][0]["order_id"], "1");
    }

    #[tokio::test]
    async fn test_metrics_with_region_filter() {
        let (server, _data_dir) = setup_server().await;
        register_and_login(&server, "alice", "Alice").await;

        server
            .post("/api/v1/datasets/alice")
            .text(SAMPLE_CSV)
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .get("/api/v1/datasets/alice/metrics?year=2023&region=East")
            .await;

        response.assert_status(StatusCode::OK);
        let body: ApiResponse<serde_json::Value> = response.json();
        let metrics = &body.data["metrics"];

        assert_eq!(metrics["total_revenue"], "150");
        assert_eq!(metrics["total_orders"], 1);
        assert_eq!(metrics["units_sold"], "3");
        assert_eq!(metrics["regional_breakdown"].as_array().unwrap().len(), 1);

        let preview = body.data["preview"].as_array().unwrap();
        assert_eq!(preview.len(), 2);
        assert!(preview.iter().all(|row| row["region"] == "East"));
    }

    #[tokio::test]
    async fn test_metrics_for_an_empty_filtered_set() {
        let (server, _data_dir) = setup_server().await;
        register_and_login(&server, "alice", "Alice").await;

        server
            .post("/api/v1/datasets/alice")
            .text(MULTI_YEAR_CSV)
            .await
            .assert_status(StatusCode::CREATED);

        // 2024 has only West rows, so (2024, East) filters everything out.
        let response = server
            .get("/api/v1/datasets/alice/metrics?year=2024&region=East")
            .await;

        response.assert_status(StatusCode::OK);
        let body: ApiResponse<serde_json::Value> = response.json();
        let metrics = &body.data["metrics"];

        assert_eq!(metrics["total_revenue"], "0");
        assert_eq!(metrics["total_orders"], 0);
        assert_eq!(metrics["units_sold"], "0");
        assert_eq!(metrics["average_order_value"], "0");
        assert!(metrics["monthly_series"].as_array().unwrap().is_empty());
        assert!(metrics["top_products"].as_array().unwrap().is_empty());
        assert!(metrics["regional_breakdown"].as_array().unwrap().is_empty());
        assert!(body.data["preview"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_metrics_before_upload() {
        let (server, _data_dir) = setup_server().await;
        register_and_login(&server, "alice", "Alice").await;

        let response = server
            .get("/api/v1/datasets/alice/metrics?year=2023&region=All")
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "DATASET_NOT_UPLOADED");
    }

    #[tokio::test]
    async fn test_metrics_are_cached_per_filter() {
        let (server, _data_dir) = setup_server().await;
        register_and_login(&server, "alice", "Alice").await;

        server
            .post("/api/v1/datasets/alice")
            .text(SAMPLE_CSV)
            .await
            .assert_status(StatusCode::CREATED);

        let first: ApiResponse<serde_json::Value> = server
            .get("/api/v1/datasets/alice/metrics?year=2023&region=All")
            .await
            .json();
        assert_eq!(first.message, "Metrics computed successfully");

        let second: ApiResponse<serde_json::Value> = server
            .get("/api/v1/datasets/alice/metrics?year=2023&region=All")
            .await
            .json();
        assert_eq!(second.message, "Metrics retrieved from cache");
        assert_eq!(second.data, first.data);
    }
}
