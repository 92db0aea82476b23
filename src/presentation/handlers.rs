// HTTP request handlers
use crate::application::dashboard_service::{CreateDashboard, CreateFromTemplate, UpdateDashboard};
use crate::application::templates::TemplateCatalog;
use crate::domain::widget::WidgetCategory;
use crate::infrastructure::http_response::{json_response, ApiError};
use crate::presentation::app_state::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

type HandlerResult = Result<Response, ApiError>;

#[derive(Deserialize)]
pub struct WidgetQuery {
    pub category: Option<String>,
}

#[derive(Serialize)]
struct CategoryCount {
    category: WidgetCategory,
    count: usize,
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

/// Health check endpoint
pub async fn health_check() -> Response {
    json_response(StatusCode::OK, json!({"status": "ok"}))
}

pub async fn list_dashboards(State(state): State<Arc<AppState>>) -> HandlerResult {
    let dashboards = state.dashboard_service.list().await?;
    Ok(json_response(StatusCode::OK, dashboards))
}

pub async fn get_dashboard(Path(id): Path<String>, State(state): State<Arc<AppState>>) -> HandlerResult {
    let dashboard = state.dashboard_service.get(&id).await?;
    Ok(json_response(StatusCode::OK, dashboard))
}

pub async fn create_dashboard(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateDashboard>, JsonRejection>,
) -> HandlerResult {
    let record = state.dashboard_service.create(body(payload)?).await?;
    Ok(json_response(StatusCode::CREATED, record))
}

/// Body is optional; an empty body uses the template's own name. A body that is
/// present must be a valid request.
pub async fn create_from_template(
    Path(template_id): Path<String>,
    State(state): State<Arc<AppState>>,
    payload: Bytes,
) -> HandlerResult {
    let request = if payload.iter().all(u8::is_ascii_whitespace) {
        CreateFromTemplate::default()
    } else {
        body(Json::<CreateFromTemplate>::from_bytes(&payload))?
    };
    let record = state
        .dashboard_service
        .create_from_template(&template_id, request)
        .await?;
    Ok(json_response(StatusCode::CREATED, record))
}

pub async fn update_dashboard(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UpdateDashboard>, JsonRejection>,
) -> HandlerResult {
    let record = state.dashboard_service.update(&id, body(payload)?).await?;
    Ok(json_response(StatusCode::OK, record))
}

pub async fn delete_dashboard(Path(id): Path<String>, State(state): State<Arc<AppState>>) -> HandlerResult {
    state.dashboard_service.delete(&id).await?;
    Ok(json_response(StatusCode::OK, json!({"id": id})))
}

pub async fn list_widgets(Query(query): Query<WidgetQuery>, State(state): State<Arc<AppState>>) -> HandlerResult {
    let widgets: Vec<_> = match query.category {
        Some(raw) => {
            let category: WidgetCategory = raw.parse().map_err(ApiError::BadRequest)?;
            state.registry.by_category(category)
        }
        None => state.registry.all().iter().collect(),
    };
    Ok(json_response(StatusCode::OK, widgets))
}

pub async fn widget_categories(State(state): State<Arc<AppState>>) -> Response {
    let counts: Vec<CategoryCount> = state
        .registry
        .category_counts()
        .into_iter()
        .map(|(category, count)| CategoryCount { category, count })
        .collect();
    json_response(StatusCode::OK, counts)
}

pub async fn list_templates() -> Response {
    json_response(StatusCode::OK, TemplateCatalog::list())
}

#[cfg(test)]
mod tests {
    use crate::application::dashboard_service::DashboardService;
    use crate::application::widget_registry::WidgetRegistry;
    use crate::infrastructure::json_file_repository::JsonFileRepository;
    use crate::presentation::app_state::AppState;
    use crate::presentation::router::build_router;
    use serde_json::{json, Value};
    use std::sync::Arc;

    async fn spawn_server() -> String {
        let registry = Arc::new(WidgetRegistry::with_defaults());
        let state = Arc::new(AppState {
            dashboard_service: DashboardService::new(Arc::new(JsonFileRepository::in_memory()), registry.clone()),
            registry,
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, build_router(state)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_health() {
        let base = spawn_server().await;
        let resp = reqwest::get(format!("{}/api/health", base)).await.unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["data"]["status"], json!("ok"));
    }

    #[tokio::test]
    async fn test_dashboard_crud_flow() {
        let base = spawn_server().await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{}/api/dashboards", base))
            .json(&json!({"name": "Evening", "isDefault": true}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        let created: Value = resp.json().await.unwrap();
        let id = created["data"]["id"].as_str().unwrap().to_string();
        assert_eq!(created["data"]["version"], json!(1));
        assert_eq!(created["data"]["layout"]["version"], json!("1.0"));

        let resp = client
            .put(format!("{}/api/dashboards/{}", base, id))
            .json(&json!({"name": "Night", "version": 1}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let resp = client
            .put(format!("{}/api/dashboards/{}", base, id))
            .json(&json!({"name": "Late", "version": 1}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 409);
        let conflict: Value = resp.json().await.unwrap();
        assert_eq!(conflict["success"], json!(false));

        let list: Value = client
            .get(format!("{}/api/dashboards", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(list["data"].as_array().unwrap().len(), 1);
        assert_eq!(list["data"][0]["name"], json!("Night"));

        let resp = client
            .delete(format!("{}/api/dashboards/{}", base, id))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let resp = client
            .get(format!("{}/api/dashboards/{}", base, id))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn test_validation_errors_are_400() {
        let base = spawn_server().await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{}/api/dashboards", base))
            .json(&json!({"name": ""}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);

        let resp = client
            .post(format!("{}/api/dashboards", base))
            .json(&json!({"title": "missing name"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["success"], json!(false));
        assert!(body["error"].is_string());

        let resp = client
            .get(format!("{}/api/widgets?category=plants", base))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
    }

    #[tokio::test]
    async fn test_from_template_rejects_malformed_body() {
        let base = spawn_server().await;
        let client = reqwest::Client::new();
        let url = format!("{}/api/dashboards/from-template/inventory-management", base);

        let resp = client.post(&url).json(&json!({"name": 123})).send().await.unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["success"], json!(false));

        let resp = client
            .post(&url)
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);

        let resp = client.post(&url).json(&json!({"name": "Stash"})).send().await.unwrap();
        assert_eq!(resp.status(), 201);
        let created: Value = resp.json().await.unwrap();
        assert_eq!(created["data"]["name"], json!("Stash"));

        let dashboards: Value = client
            .get(format!("{}/api/dashboards", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(dashboards["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_templates_and_widgets() {
        let base = spawn_server().await;
        let client = reqwest::Client::new();

        let templates: Value = client
            .get(format!("{}/api/templates", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(templates["data"]
            .as_array()
            .unwrap()
            .iter()
            .any(|t| t["id"] == json!("inventory-management")));

        let resp = client
            .post(format!("{}/api/dashboards/from-template/inventory-management", base))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        let created: Value = resp.json().await.unwrap();
        assert_eq!(created["data"]["name"], json!("Inventory Management"));

        let resp = client
            .post(format!("{}/api/dashboards/from-template/unknown", base))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);

        let widgets: Value = client
            .get(format!("{}/api/widgets?category=inventory", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let widgets = widgets["data"].as_array().unwrap();
        assert!(!widgets.is_empty());
        assert!(widgets.iter().all(|w| w["category"] == json!("inventory")));

        let categories: Value = client
            .get(format!("{}/api/widgets/categories", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(categories["data"].as_array().unwrap().len(), 5);
    }
}
