use crate::body::{self, ResponseBody};
use crate::directed::redir::{Action, Rules};
use crate::health::{self, HealthCheck};
use headers::{ContentType, HeaderMapExt};
use hyper::body::Incoming;
use hyper::http::HeaderValue;
use hyper::{header, Request, Response, StatusCode};
use std::sync::Arc;

pub struct State {
    pub rules: Rules,
    pub health: Arc<HealthCheck>,
}

pub async fn respond_to_request(req: Request<Incoming>, state: &State) -> Response<ResponseBody> {
    match route(&req, &state.rules) {
        Some(resp) => resp,
        None => health::routes::get(&state.health).await,
    }
}

/// Answers from the rule table, or `None` when the request is for the health reporter.
fn route<B>(req: &Request<B>, rules: &Rules) -> Option<Response<ResponseBody>> {
    let host = request_host(req);
    let path = req.uri().path();

    Some(match rules.try_match(host, path) {
        Action::Redirect(to) => match HeaderValue::from_str(&to) {
            Ok(location) => {
                log::info!("{} {}{} -> {}", req.method(), host, path, to);
                let mut resp = Response::new(body::empty());
                *resp.status_mut() = StatusCode::TEMPORARY_REDIRECT;
                resp.headers_mut().insert(header::LOCATION, location);
                resp
            }
            Err(e) => {
                log::warn!(
                    "{} {}{} -> [invalid location] {:?} : {}",
                    req.method(),
                    host,
                    path,
                    to,
                    e
                );
                let mut resp = Response::new(body::empty());
                *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                resp
            }
        },
        Action::Respond { status, body: text } => {
            log::info!("{} {}{} -> [{}]", req.method(), host, path, status);
            let mut resp = Response::new(body::full(text.to_owned()));
            *resp.status_mut() = status;
            resp.headers_mut().typed_insert(ContentType::text_utf8());
            resp
        }
        Action::Health => return None,
        Action::NotFound => {
            log::warn!("{} {}{} -> [no match]", req.method(), host, path);
            let mut resp = Response::new(body::empty());
            *resp.status_mut() = StatusCode::NOT_FOUND;
            resp
        }
    })
}

/// Host from an absolute-form or HTTP/2 request target, otherwise from the `Host` header.
fn request_host<B>(req: &Request<B>) -> &str {
    match req.uri().host() {
        Some(host) => host,
        None => req
            .headers()
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .unwrap_or(""),
    }
}
