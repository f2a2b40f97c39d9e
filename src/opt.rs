use clap::{ArgAction, Parser, ValueEnum};
use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::ops::Deref;
use std::str::FromStr;
use std::time::Duration;

/// Redirect requests for a retired web estate to their replacements
#[derive(Parser, Debug)]
#[clap(version, about)]
pub struct Options {
    /// Logging verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(
        long,
        env = "BIND_ADDR",
        default_value = ":24600",
        help = "Socket address to listen on (--help for more)",
        long_help = r"Socket address to listen on:
    - a bare port binds every interface, IPv6 and IPv4
Examples:
    - :24600
    - 127.0.0.1:3000
    - [2001:db8::1]:8080"
    )]
    pub bind_addr: BindAddr,

    /// How long a health check may keep failing before it is critical
    #[arg(
        long,
        env = "HEALTHCHECK_CRITICAL_TIMEOUT",
        default_value = "1m",
        value_parser = humantime::parse_duration
    )]
    pub healthcheck_critical_timeout: Duration,

    /// Time between background health check runs
    #[arg(
        long,
        env = "HEALTHCHECK_INTERVAL",
        default_value = "10s",
        value_parser = humantime::parse_duration
    )]
    pub healthcheck_interval: Duration,

    /// Response given by retired API endpoints
    #[arg(
        long,
        env = "API_RESPONSE_PROFILE",
        value_enum,
        default_value_t = ApiProfile::Gone
    )]
    pub api_response_profile: ApiProfile,

    /// Deadline for a client to send complete request headers
    #[arg(
        long,
        env = "HEADER_READ_TIMEOUT",
        default_value = "5s",
        value_parser = humantime::parse_duration
    )]
    pub header_read_timeout: Duration,

    /// Time allowed for open connections to finish after a shutdown signal
    #[arg(
        long,
        env = "GRACEFUL_SHUTDOWN_TIMEOUT",
        default_value = "10s",
        value_parser = humantime::parse_duration
    )]
    pub graceful_shutdown_timeout: Duration,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum ApiProfile {
    /// 410 Gone
    Gone,
    /// 400 Bad Request, as the first deployment answered
    BadRequest,
}

/// Listen address that also accepts the `:port` shorthand.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BindAddr(SocketAddr);

impl Deref for BindAddr {
    type Target = SocketAddr;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(thiserror::Error, Debug)]
#[error("invalid bind address {addr:?}: {source}")]
pub struct InvalidBindAddr {
    addr: String,
    source: std::num::ParseIntError,
}

impl FromStr for BindAddr {
    type Err = Box<dyn std::error::Error + Send + Sync>;

    fn from_str(arg: &str) -> Result<Self, Self::Err> {
        match arg.strip_prefix(':') {
            Some(port) => {
                let port = port.parse::<u16>().map_err(|source| InvalidBindAddr {
                    addr: arg.to_string(),
                    source,
                })?;
                Ok(Self(SocketAddr::new(
                    IpAddr::V6(Ipv6Addr::UNSPECIFIED),
                    port,
                )))
            }
            None => Ok(Self(arg.parse()?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, FromArgMatches};

    /// Parses `args` without consulting the process environment.
    fn parse<const N: usize>(args: [&str; N]) -> Options {
        let matches = Options::command()
            .mut_args(|arg| arg.env(None::<&str>))
            .try_get_matches_from(args)
            .unwrap();
        Options::from_arg_matches(&matches).unwrap()
    }

    #[test]
    fn verify_cli() {
        Options::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let opts = parse(["legacy-redirector"]);
        assert_eq!(opts.bind_addr.port(), 24600);
        assert_eq!(opts.bind_addr.ip(), IpAddr::V6(Ipv6Addr::UNSPECIFIED));
        assert_eq!(opts.healthcheck_critical_timeout, Duration::from_secs(60));
        assert_eq!(opts.healthcheck_interval, Duration::from_secs(10));
        assert_eq!(opts.api_response_profile, ApiProfile::Gone);
    }

    #[test]
    fn flags() {
        let opts = parse([
            "legacy-redirector",
            "--bind-addr",
            "127.0.0.1:8080",
            "--healthcheck-interval",
            "1m 30s",
            "--api-response-profile",
            "bad-request",
        ]);
        assert_eq!(*opts.bind_addr, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(opts.healthcheck_interval, Duration::from_secs(90));
        assert_eq!(opts.api_response_profile, ApiProfile::BadRequest);
    }

    #[test]
    fn bind_addr_shorthand() {
        let addr = BindAddr::from_str(":80").unwrap();
        assert_eq!(*addr, "[::]:80".parse::<SocketAddr>().unwrap());
        assert_eq!(
            *BindAddr::from_str("0.0.0.0:80").unwrap(),
            "0.0.0.0:80".parse::<SocketAddr>().unwrap()
        );
        assert!(BindAddr::from_str(":http").is_err());
        assert!(BindAddr::from_str("localhost").is_err());
    }
}
