use crate::body::{self, ResponseBody};
use crate::health::{HealthCheck, Status};
use headers::{ContentType, HeaderMapExt};
use hyper::{Response, StatusCode};

pub async fn get(health: &HealthCheck) -> Response<ResponseBody> {
    let report = health.report().await;
    let status = match report.status {
        Status::Healthy => StatusCode::OK,
        Status::Degraded => StatusCode::TOO_MANY_REQUESTS,
        Status::Unhealthy => StatusCode::INTERNAL_SERVER_ERROR,
    };

    match serde_json::to_vec(&report) {
        Ok(json) => {
            log::debug!("GET /health -> [{:?}]", report.status);
            let mut resp = Response::new(body::full(json));
            *resp.status_mut() = status;
            resp.headers_mut().typed_insert(ContentType::json());
            resp
        }
        Err(e) => {
            log::error!("GET /health -> [serialization error] {}", e);
            let mut resp = Response::new(body::empty());
            *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            resp
        }
    }
}
