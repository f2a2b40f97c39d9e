use crate::directed::articles::ArticleRedirectTable;
use crate::directed::redir::{Handler, HostMatcher, PathMatcher, Rule, Rules};
use crate::opt::ApiProfile;

pub const LANDING_PAGE: &str = "https://www.ons.gov.uk/help/localstatistics";
pub const API_RESPONSE: &str = "This service is no longer available. Please visit https://www.ons.gov.uk/help/localstatistics for more information.";
pub const ONS_ROOT: &str = "https://www.ons.gov.uk";
pub const VISUAL_ARCHIVE: &str =
    "http://webarchive.nationalarchives.gov.uk/20171102124620/https://visual.ons.gov.uk/";

const HEALTH_PATH: &str = "/health";

const NESS: &str = "neighbourhood.statistics.gov.uk";
const NESS_CONTENT: &str = "https://www.ons.gov.uk/visualisations/nesscontent/";
const VISUAL_UPLOADS: &str = "https://static.ons.gov.uk/visual/";

/// Redirect rules for the retired statistics estate, most specific first.
pub fn rules(profile: ApiProfile) -> Rules {
    let api = || match profile {
        ApiProfile::Gone => Handler::ApiGone(API_RESPONSE.to_string()),
        ApiProfile::BadRequest => Handler::ApiBadRequest(API_RESPONSE.to_string()),
    };
    let prefix = |p: &str| PathMatcher::Prefix(p.to_string());
    let landing = || Handler::FixedRedirect(LANDING_PAGE.to_string());
    let ness_content = || Handler::TemplatedRedirect(NESS_CONTENT.to_string());

    let rules = vec![
        Rule::new(
            HostMatcher::Any,
            PathMatcher::Exact(HEALTH_PATH.to_string()),
            Handler::Health,
        ),
        // NeSS website
        Rule::new(HostMatcher::exact(NESS), prefix("/HTMLDocs/"), ness_content()),
        Rule::new(HostMatcher::subdomain(NESS), prefix("/HTMLDocs/"), ness_content()),
        // NeSS API
        Rule::new(HostMatcher::exact(NESS), prefix("/NDE2/"), api()),
        Rule::new(HostMatcher::subdomain(NESS), prefix("/NDE2/"), api()),
        // WDA website
        Rule::new(
            HostMatcher::exact("web.ons.gov.uk"),
            prefix("/ons/apiservice/web/"),
            landing(),
        ),
        // WDA API
        Rule::new(
            HostMatcher::exact("web.ons.gov.uk"),
            prefix("/ons/apiservice/"),
            api(),
        ),
        Rule::new(HostMatcher::exact("web.ons.gov.uk"), prefix("/ons/api/"), api()),
        Rule::new(HostMatcher::exact("data.ons.gov.uk"), prefix("/"), api()),
        // visual.ons.gov.uk
        Rule::new(
            HostMatcher::exact("visual.ons.gov.uk"),
            prefix("/wp-content/uploads/"),
            Handler::TemplatedRedirect(VISUAL_UPLOADS.to_string()),
        ),
        Rule::new(
            HostMatcher::exact("visual.ons.gov.uk"),
            PathMatcher::Segment("/".to_string()),
            Handler::ArticleLookup {
                root: ONS_ROOT.to_string(),
                archive_prefix: VISUAL_ARCHIVE.to_string(),
            },
        ),
        // everything else
        Rule::new(HostMatcher::Any, PathMatcher::Any, landing()),
    ];

    let articles = ArticleRedirectTable::visual();
    log::debug!(
        "Loaded {} redirect rules and {} article redirects ({:?} profile)",
        rules.len(),
        articles.len(),
        profile
    );

    Rules::new(rules, articles)
}
