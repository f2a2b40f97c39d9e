use crate::directed::articles::ArticleRedirectTable;
use http::StatusCode;
use std::borrow::Cow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostMatcher {
    /// Exactly this hostname
    Exact(String),
    /// One alphabetic label followed by this base domain
    Subdomain(String),
    Any,
}

impl HostMatcher {
    pub fn exact(host: &str) -> Self {
        Self::Exact(host.to_ascii_lowercase())
    }

    pub fn subdomain(base: &str) -> Self {
        Self::Subdomain(base.to_ascii_lowercase())
    }

    /// `host` must already be normalized with [`normalize_host`].
    fn matches(&self, host: &str) -> bool {
        match self {
            HostMatcher::Exact(exact) => host == exact,
            HostMatcher::Subdomain(base) => host
                .strip_suffix(base.as_str())
                .and_then(|label| label.strip_suffix('.'))
                .is_some_and(|label| {
                    !label.is_empty() && label.bytes().all(|b| b.is_ascii_lowercase())
                }),
            HostMatcher::Any => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathMatcher {
    /// Exactly this path, nothing captured
    Exact(String),
    /// Starts with this prefix, captures what follows it
    Prefix(String),
    /// Starts with this prefix, captures the next segment as the slug and what follows it
    Segment(String),
    Any,
}

/// Parts of a path captured by a [`PathMatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Captures<'p> {
    pub slug: &'p str,
    pub rest: &'p str,
}

impl PathMatcher {
    fn matches<'p>(&self, path: &'p str) -> Option<Captures<'p>> {
        match self {
            PathMatcher::Exact(exact) => (path == exact).then(Captures::default),
            PathMatcher::Prefix(prefix) => path.strip_prefix(prefix.as_str()).map(|rest| Captures {
                slug: "",
                rest,
            }),
            PathMatcher::Segment(prefix) => {
                let tail = path.strip_prefix(prefix.as_str())?;
                let (slug, rest) = tail.split_at(tail.find('/').unwrap_or(tail.len()));
                Some(Captures { slug, rest })
            }
            PathMatcher::Any => Some(Captures {
                slug: "",
                rest: path,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handler {
    /// 307 to a fixed location
    FixedRedirect(String),
    /// 307 to this prefix followed by the captured remainder
    TemplatedRedirect(String),
    /// 410 with a plain text body
    ApiGone(String),
    /// 400 with a plain text body
    ApiBadRequest(String),
    /// 307 to the article table entry for the captured slug,
    /// or to its archived copy if there is none
    ArticleLookup {
        root: String,
        archive_prefix: String,
    },
    /// Served by the health reporter
    Health,
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub host: HostMatcher,
    pub path: PathMatcher,
    pub handler: Handler,
}

impl Rule {
    pub fn new(host: HostMatcher, path: PathMatcher, handler: Handler) -> Self {
        Self {
            host,
            path,
            handler,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action<'a> {
    Redirect(Cow<'a, str>),
    Respond { status: StatusCode, body: &'a str },
    Health,
    NotFound,
}

/// Ordered redirect rules; the first rule whose host and path both match wins.
#[derive(Debug)]
pub struct Rules {
    rules: Vec<Rule>,
    articles: ArticleRedirectTable,
}

impl Rules {
    pub fn new(rules: Vec<Rule>, articles: ArticleRedirectTable) -> Self {
        Self { rules, articles }
    }

    pub fn try_match<'a>(&'a self, host: &str, path: &str) -> Action<'a> {
        let host = normalize_host(host);
        let path = clean_path(path);
        let path: &str = &path;
        let found = self.rules.iter().find_map(|rule| {
            if !rule.host.matches(&host) {
                return None;
            }
            rule.path.matches(path).map(|captures| (rule, captures))
        });
        match found {
            Some((rule, captures)) => self.apply(&rule.handler, captures),
            None => Action::NotFound,
        }
    }

    fn apply<'a>(&'a self, handler: &'a Handler, captures: Captures<'_>) -> Action<'a> {
        match handler {
            Handler::FixedRedirect(to) => Action::Redirect(Cow::Borrowed(to.as_str())),
            Handler::TemplatedRedirect(prefix) => {
                Action::Redirect(Cow::Owned(format!("{}{}", prefix, captures.rest)))
            }
            Handler::ApiGone(body) => Action::Respond {
                status: StatusCode::GONE,
                body: body.as_str(),
            },
            Handler::ApiBadRequest(body) => Action::Respond {
                status: StatusCode::BAD_REQUEST,
                body: body.as_str(),
            },
            Handler::ArticleLookup {
                root,
                archive_prefix,
            } => {
                let Captures { slug, rest } = captures;
                if slug.is_empty() {
                    Action::Redirect(Cow::Borrowed(root.as_str()))
                } else if let Some(to) = self.articles.get(slug) {
                    Action::Redirect(Cow::Borrowed(to))
                } else {
                    Action::Redirect(Cow::Owned(format!("{}{}{}", archive_prefix, slug, rest)))
                }
            }
            Handler::Health => Action::Health,
        }
    }
}

/// Lowercases the host and drops any port.
pub fn normalize_host(host: &str) -> Cow<'_, str> {
    let host = match host.rfind(':') {
        // a colon inside an ipv6 literal is not a port separator
        Some(i) if !host[i..].contains(']') => &host[..i],
        _ => host,
    };
    if host.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Owned(host.to_ascii_lowercase())
    } else {
        Cow::Borrowed(host)
    }
}

/// Collapses repeated slashes and resolves `.` and `..` segments, keeping a trailing slash.
pub fn clean_path(path: &str) -> Cow<'_, str> {
    let dirty = path.contains("//")
        || path.split('/').any(|segment| segment == "." || segment == "..");
    if !path.starts_with('/') || !dirty {
        return Cow::Borrowed(path);
    }

    let mut segments = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }

    let mut cleaned = String::with_capacity(path.len());
    for segment in segments {
        cleaned.push('/');
        cleaned.push_str(segment);
    }
    if cleaned.is_empty() || path.ends_with('/') {
        cleaned.push('/');
    }
    Cow::Owned(cleaned)
}
