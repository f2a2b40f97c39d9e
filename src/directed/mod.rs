use crate::err::Error;
use crate::health::{HealthCheck, VersionInfo};
use crate::http::{self, ServerConfig};
use crate::opt;
use crate::signal;
use crate::tcp;
use routes::{respond_to_request, State};
use std::sync::Arc;

mod articles;
pub mod estate;
mod redir;
mod routes;

pub async fn main(options: opt::Options) -> Result<(), Error> {
    log::info!("Config on startup: {:?}", options);

    let opt::Options {
        verbose: _,
        bind_addr,
        healthcheck_critical_timeout,
        healthcheck_interval,
        api_response_profile,
        header_read_timeout,
        graceful_shutdown_timeout,
    } = options;

    let version = VersionInfo::from_build_env()?;
    log::info!(
        "Version {} (commit {}, built {})",
        version.version,
        version.git_commit,
        version.build_time
    );

    let health = Arc::new(HealthCheck::new(
        version,
        healthcheck_critical_timeout,
        healthcheck_interval,
        Vec::new(),
    ));
    let checks = health.start();

    let state = State {
        rules: estate::rules(api_response_profile),
        health,
    };

    log::info!("Binding to {}", *bind_addr);
    let listener = tcp::bind(*bind_addr).await?;

    let config = ServerConfig {
        header_read_timeout,
        graceful_shutdown_timeout,
    };
    http::run_simple_server(
        listener,
        state,
        respond_to_request,
        config,
        signal::shutdown(),
    )
    .await?;

    if let Some(checks) = checks {
        checks.abort();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opt::ApiProfile;
    use std::net::SocketAddr;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::oneshot;

    async fn fetch(addr: SocketAddr, host: &str, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let req = format!(
            "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
            path, host
        );
        stream.write_all(req.as_bytes()).await.unwrap();
        let mut resp = String::new();
        stream.read_to_string(&mut resp).await.unwrap();
        resp
    }

    #[tokio::test]
    async fn serves_redirects_and_health() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let version = VersionInfo::new(None, None, "0.0.0").unwrap();
        let state = State {
            rules: estate::rules(ApiProfile::Gone),
            health: Arc::new(HealthCheck::new(
                version,
                Duration::from_secs(60),
                Duration::from_secs(10),
                Vec::new(),
            )),
        };
        let config = ServerConfig {
            header_read_timeout: Duration::from_secs(5),
            graceful_shutdown_timeout: Duration::from_secs(1),
        };
        let (stop, stopped) = oneshot::channel::<()>();
        let server = tokio::spawn(crate::http::run_simple_server(
            listener,
            state,
            respond_to_request,
            config,
            async move {
                let _ = stopped.await;
            },
        ));

        let resp = fetch(addr, "visual.ons.gov.uk", "/wp-content/uploads/a/b/c").await;
        assert!(resp.starts_with("HTTP/1.1 307 Temporary Redirect\r\n"), "{}", resp);
        assert!(
            resp.contains("\r\nlocation: https://static.ons.gov.uk/visual/a/b/c\r\n"),
            "{}",
            resp
        );

        let resp = fetch(addr, "web.ons.gov.uk", "/ons/api/a/b/c").await;
        assert!(resp.starts_with("HTTP/1.1 410 Gone\r\n"), "{}", resp);
        assert!(resp.ends_with(estate::API_RESPONSE), "{}", resp);
        assert!(!resp.contains("location:"), "{}", resp);

        let resp = fetch(addr, "unknown.example", "/somewhere").await;
        assert!(resp.starts_with("HTTP/1.1 307 Temporary Redirect\r\n"), "{}", resp);
        assert!(
            resp.contains(&format!("\r\nlocation: {}\r\n", estate::LANDING_PAGE)),
            "{}",
            resp
        );

        let resp = fetch(addr, "anything.example", "/health").await;
        assert!(resp.starts_with("HTTP/1.1 200 OK\r\n"), "{}", resp);
        assert!(resp.contains("\r\ncontent-type: application/json\r\n"), "{}", resp);
        assert!(resp.contains("\"status\":\"OK\""), "{}", resp);

        stop.send(()).unwrap();
        server.await.unwrap().unwrap();
    }
}
