//! Application router configuration.

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};

use crate::{
    AppState,
    api::{add_transaction_json, check_transaction, get_all_transactions},
    dashboard::get_dashboard_page,
    endpoints,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    report::get_report,
    transaction::{
        get_add_transaction_page, get_transactions_page, submit_add_transaction_form,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let view_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::TRANSACTIONS_VIEW, get(get_transactions_page))
        .route(
            endpoints::ADD_TRANSACTION_VIEW,
            get(get_add_transaction_page).post(submit_add_transaction_form),
        )
        .route(endpoints::REPORT, get(get_report))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let api_routes = Router::new()
        .route(endpoints::CHECK_API, post(check_transaction))
        .route(endpoints::ADD_FORM_API, post(add_transaction_json))
        .route(endpoints::ALL_TRANSACTIONS_API, get(get_all_transactions));

    view_routes
        .merge(api_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}


#[cfg(test)]
mod router_tests {
    use std::sync::{Arc, Mutex};

    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{
        AppState, build_router,
        db::initialize,
        endpoints,
        features::FeatureValidator,
        test_utils::StubScorer,
        transaction::SQLiteTransactionStore,
    };

    fn test_server() -> TestServer {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let store = SQLiteTransactionStore::new(Arc::new(Mutex::new(connection)));
        let state = AppState::new(
            FeatureValidator::new(),
            Arc::new(StubScorer::returning(true)),
            Arc::new(store),
            "Etc/UTC",
        );

        TestServer::try_new(build_router(state)).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn pages_render() {
        let server = test_server();

        for endpoint in [
            endpoints::DASHBOARD_VIEW,
            endpoints::TRANSACTIONS_VIEW,
            endpoints::ADD_TRANSACTION_VIEW,
            endpoints::REPORT,
        ] {
            let response = server.get(endpoint).await;

            assert_eq!(response.status_code(), StatusCode::OK, "GET {endpoint}");
        }
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let server = test_server();

        let response = server.get("/does/not/exist").await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn error_page_is_500() {
        let server = test_server();

        let response = server.get(endpoints::INTERNAL_ERROR_VIEW).await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn checked_transaction_shows_up_everywhere() {
        let server = test_server();

        server
            .post(endpoints::CHECK_API)
            .json(&json!({ "features": [0.5, -1.0, 149.62] }))
            .await
            .assert_json(&json!({ "fraud": true }));

        let all: Vec<Value> = server.get(endpoints::ALL_TRANSACTIONS_API).await.json();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0]["features"], json!([0.5, -1.0, 149.62]));

        let list = server
            .get(&format!("{}?verdict=fraud", endpoints::TRANSACTIONS_VIEW))
            .await
            .text();
        assert!(list.contains("data-transaction-id=\"1\""));

        let report = server.get(endpoints::REPORT).await.text();
        assert!(report.contains("Total Transactions,1"));
        assert!(report.contains("1,Fraud,"));
    }

    #[tokio::test]
    async fn add_form_redirects_to_list() {
        let server = test_server();

        let response = server
            .post(endpoints::ADD_TRANSACTION_VIEW)
            .form(&[("features", "1.0, 2.5, -3.0")])
            .await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), endpoints::TRANSACTIONS_VIEW);
    }
}
