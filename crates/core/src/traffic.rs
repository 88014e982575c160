//! Traffic-source classification.
//!
//! A strict priority waterfall evaluated per event, first match wins:
//! campaign-tracking parameters → paid, search-engine referrer →
//! organic_search, missing/own-host referrer → direct, anything else →
//! referral. Sessions freeze the classification of their first event.

use serde::{Deserialize, Serialize};
use url::Url;

/// Campaign-tracking query parameters. Presence of any marks the visit
/// as paid regardless of the referrer.
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "gclid",
    "fbclid",
    "msclkid",
];

/// Fixed allow-list of search-engine referrer domains.
const SEARCH_ENGINES: &[(&str, &str)] = &[
    ("google.com", "google"),
    ("google.co.uk", "google"),
    ("google.ca", "google"),
    ("google.de", "google"),
    ("google.fr", "google"),
    ("google.com.au", "google"),
    ("bing.com", "bing"),
    ("yahoo.com", "yahoo"),
    ("duckduckgo.com", "duckduckgo"),
    ("baidu.com", "baidu"),
    ("yandex.com", "yandex"),
    ("yandex.ru", "yandex"),
    ("ecosia.org", "ecosia"),
];

/// Traffic channel buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Paid,
    OrganicSearch,
    Referral,
    Direct,
}

impl Channel {
    /// Returns the channel as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::OrganicSearch => "organic_search",
            Self::Referral => "referral",
            Self::Direct => "direct",
        }
    }
}

/// Classified traffic source for one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficSource {
    pub channel: Channel,
    pub source: String,
    pub medium: String,
    pub campaign: String,
}

impl TrafficSource {
    fn direct() -> Self {
        Self {
            channel: Channel::Direct,
            source: "(direct)".into(),
            medium: "(none)".into(),
            campaign: String::new(),
        }
    }
}

/// Classify one event's traffic source from its page URL and referrer.
pub fn classify(page_url: &str, referrer: Option<&str>) -> TrafficSource {
    let page = Url::parse(page_url).ok();

    // Campaign-tracking parameters on the page reference win outright.
    if let Some(ref page) = page {
        let mut source = None;
        let mut medium = None;
        let mut campaign = None;
        let mut tracked = false;

        for (key, value) in page.query_pairs() {
            let key = key.to_ascii_lowercase();
            if TRACKING_PARAMS.contains(&key.as_str()) {
                tracked = true;
            }
            match key.as_str() {
                "utm_source" => source = Some(value.to_string()),
                "utm_medium" => medium = Some(value.to_string()),
                "utm_campaign" => campaign = Some(value.to_string()),
                _ => {}
            }
        }

        if tracked {
            return TrafficSource {
                channel: Channel::Paid,
                source: source.unwrap_or_else(|| "(not set)".into()),
                medium: medium.unwrap_or_else(|| "cpc".into()),
                campaign: campaign.unwrap_or_default(),
            };
        }
    }

    // No referrer (or an unusable one) means direct.
    let referrer = match referrer.map(str::trim) {
        Some(r) if !r.is_empty() => r,
        _ => return TrafficSource::direct(),
    };

    let ref_host = match host_of(referrer) {
        Some(h) => h,
        None => return TrafficSource::direct(),
    };

    // Known search-engine referrer.
    if let Some(engine) = search_engine(&ref_host) {
        return TrafficSource {
            channel: Channel::OrganicSearch,
            source: engine.into(),
            medium: "organic".into(),
            campaign: String::new(),
        };
    }

    // A referrer on the page's own host is internal navigation.
    if let Some(page_host) = page.as_ref().and_then(|p| p.host_str()).map(strip_www) {
        if page_host == ref_host {
            return TrafficSource::direct();
        }
    }

    // Anything else with a live external referrer.
    TrafficSource {
        channel: Channel::Referral,
        source: ref_host,
        medium: "referral".into(),
        campaign: String::new(),
    }
}

/// Extract the normalized host of a referrer string.
///
/// Referrers arrive both as full URLs and as bare hosts; bare hosts are
/// retried with an https prefix.
fn host_of(referrer: &str) -> Option<String> {
    let parsed = Url::parse(referrer)
        .ok()
        .filter(|u| u.host_str().is_some())
        .or_else(|| Url::parse(&format!("https://{}", referrer)).ok());

    parsed
        .as_ref()
        .and_then(|u| u.host_str())
        .map(strip_www)
        .filter(|h| !h.is_empty())
}

fn strip_www(host: &str) -> String {
    host.strip_prefix("www.").unwrap_or(host).to_ascii_lowercase()
}

/// Match a normalized host against the search-engine allow-list.
fn search_engine(host: &str) -> Option<&'static str> {
    SEARCH_ENGINES.iter().find_map(|(domain, name)| {
        if host == *domain || host.ends_with(&format!(".{}", domain)) {
            Some(*name)
        } else {
            None
        }
    })
}
