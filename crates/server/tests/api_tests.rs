use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};
use server::config::ConfigCatalog;
use server::{create_router, state::AppState};
use tempfile::TempDir;

fn config_json(experiment_id: &str) -> Value {
    json!({
        "phases": ["phase_1", "phase_2"],
        "phase_1": {
            "ui_components": ["images", "draw", "describe"],
            "images": ["a.png", "b.png"]
        },
        "phase_2": {
            "ui_components": ["draw", "describe"],
            "images": [null],
            "sampling": true
        },
        "metadata": {"experiment_id": experiment_id, "stimuli_set": "S12"}
    })
}

fn write_config(root: &std::path::Path, rel: &str, experiment_id: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, config_json(experiment_id).to_string()).unwrap();
}

async fn setup_test_server() -> (TestServer, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let configs = temp_dir.path().join("configs");
    write_config(&configs, "priors_S12/all/batch_0_shuffle_0.json", "priors_v0");
    write_config(&configs, "priors_S12/all/batch_1_shuffle_0.json", "priors_v0");

    let static_dir = temp_dir.path().join("static");
    std::fs::create_dir_all(static_dir.join("images/stim")).unwrap();
    std::fs::write(static_dir.join("images/stim/a.png"), b"png").unwrap();

    let db_path = temp_dir.path().join("test.db");
    let db_url = format!("sqlite:{}", db_path.display());
    let pool = db::create_pool(&db_url).await.expect("Failed to create pool");
    db::run_migrations(&pool).await.expect("Failed to run migrations");

    let catalog = ConfigCatalog::load(&configs, "all").expect("Failed to load catalog");
    let state = AppState::new(pool, catalog).with_static_dir(static_dir);
    let server = TestServer::new(create_router(state)).expect("Failed to create test server");

    (server, temp_dir)
}

fn session(user_id: &str, completed: bool) -> Value {
    let mut doc = config_json("priors_v0");
    doc["metadata"]["user_id"] = json!(user_id);
    doc["phase_1"]["strokes"] = json!([[{"path": "M0,0L1,1"}]]);
    doc["phase_1"]["user_descriptions"] = json!(["a line"]);
    if completed {
        doc["metadata"]["completed"] = json!(true);
    }
    doc
}

mod health {
    use super::*;

    #[tokio::test]
    async fn test_health_endpoint() {
        let (server, _temp_dir) = setup_test_server().await;

        let response = server.get("/health").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["condition"], "all");
        assert_eq!(body["configs"], 2);
    }

    #[tokio::test]
    async fn test_openapi_document() {
        let (server, _temp_dir) = setup_test_server().await;

        let response = server.get("/api/openapi.json").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert!(body["paths"]["/record_data"]["post"].is_object());
        assert!(body["paths"]["/experiment_config"]["get"].is_object());
    }

    #[tokio::test]
    async fn test_static_files() {
        let (server, _temp_dir) = setup_test_server().await;

        let response = server.get("/static/images/stim/a.png").await;
        response.assert_status_ok();
        assert_eq!(response.as_bytes().as_ref(), b"png");
    }
}

mod experiment_config {
    use super::*;

    #[tokio::test]
    async fn test_stamps_participant_metadata() {
        let (server, _temp_dir) = setup_test_server().await;

        let response = server
            .get("/experiment_config")
            .add_query_param("user_id", "p-17")
            .add_query_param("study_id", "study-1")
            .add_query_param("session_id", "sess-9")
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["phases"], json!(["phase_1", "phase_2"]));
        assert_eq!(body["metadata"]["experiment_id"], "priors_v0");
        assert_eq!(body["metadata"]["user_id"], "p-17");
        assert_eq!(body["metadata"]["study_id"], "study-1");
        assert_eq!(body["metadata"]["session_id"], "sess-9");
        assert_eq!(body["metadata"]["condition"], "all");
        assert_eq!(body["metadata"]["stimuli_set"], "S12");
    }

    #[tokio::test]
    async fn test_generates_user_id_when_missing() {
        let (server, _temp_dir) = setup_test_server().await;

        let body: Value = server.get("/experiment_config").await.json();
        let user_id = body["metadata"]["user_id"].as_str().unwrap();
        assert!(uuid::Uuid::parse_str(user_id).is_ok());
    }

    #[tokio::test]
    async fn test_assignment_is_stable_per_user() {
        let (server, _temp_dir) = setup_test_server().await;

        let first: Value = server
            .get("/experiment_config")
            .add_query_param("user_id", "repeat")
            .await
            .json();
        let second: Value = server
            .get("/experiment_config")
            .add_query_param("user_id", "repeat")
            .await
            .json();
        assert_eq!(first, second);
    }
}

mod records {
    use super::*;

    #[tokio::test]
    async fn test_record_then_fetch_results() {
        let (server, _temp_dir) = setup_test_server().await;

        let response = server.post("/record_data").json(&session("p-1", false)).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Successfully updated record");

        let response = server
            .get("/user_results")
            .add_query_param("user_id", "p-1")
            .add_query_param("experiment_id", "priors_v0")
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["phase_1"]["user_descriptions"], json!(["a line"]));
    }

    #[tokio::test]
    async fn test_completed_session_is_frozen() {
        let (server, _temp_dir) = setup_test_server().await;

        server
            .post("/record_data")
            .json(&session("p-2", true))
            .await
            .assert_status_ok();

        let mut late = session("p-2", false);
        late["phase_1"]["user_descriptions"] = json!(["overwritten"]);
        let body: Value = server.post("/record_data").json(&late).await.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "User already completed experiment");

        let stored: Value = server
            .get("/user_results")
            .add_query_param("user_id", "p-2")
            .add_query_param("experiment_id", "priors_v0")
            .await
            .json();
        assert_eq!(stored["phase_1"]["user_descriptions"], json!(["a line"]));
    }

    #[tokio::test]
    async fn test_admin_is_filed_under_test() {
        let (server, _temp_dir) = setup_test_server().await;

        server
            .post("/record_data")
            .json(&session("admin", false))
            .await
            .assert_status_ok();

        server
            .get("/user_results")
            .add_query_param("user_id", "admin")
            .add_query_param("experiment_id", "priors_v0")
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .get("/user_results")
            .add_query_param("user_id", "admin")
            .add_query_param("experiment_id", "test")
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn test_missing_ids_are_rejected() {
        let (server, _temp_dir) = setup_test_server().await;

        let response = server
            .post("/record_data")
            .json(&config_json("priors_v0"))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "bad_request");
    }

    #[tokio::test]
    async fn test_unknown_results_are_not_found() {
        let (server, _temp_dir) = setup_test_server().await;

        let response = server
            .get("/user_results")
            .add_query_param("user_id", "nobody")
            .add_query_param("experiment_id", "priors_v0")
            .await;
        response.assert_status_not_found();
        let body: Value = response.json();
        assert_eq!(body["error"], "not_found");
    }
}
