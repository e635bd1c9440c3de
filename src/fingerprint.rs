use crate::http::{HttpClient, HttpResponse};
use crate::types::{Target, Technology};
use log::{debug, info};

/// Well-known install paths and the platform a 200 on them suggests.
const TECH_PATHS: &[(&str, &str)] = &[
    ("wp-admin", "WordPress"),
    ("joomla", "Joomla"),
    ("drupal", "Drupal"),
    ("laravel", "Laravel"),
];

/// Body substrings (lowercase) and the front-end framework they hint at.
const FRAMEWORK_MARKERS: &[(&str, &str)] = &[
    ("react", "ReactJS"),
    ("angular", "Angular"),
    ("vue", "Vue.js"),
];

#[derive(Debug, Clone, Default)]
pub struct TechnologyFingerprinter;

impl TechnologyFingerprinter {
    pub fn new() -> Self {
        Self
    }

    /// Inspect one response for platform hints. Pure: the same response
    /// always yields the same list in the same order.
    pub fn inspect(&self, response: &HttpResponse) -> Vec<Technology> {
        let mut technologies = Vec::new();

        if let Some(server) = response.header("server") {
            technologies.push(format!("Server: {}", server));
        }
        if let Some(powered_by) = response.header("x-powered-by") {
            technologies.push(format!("Powered By: {}", powered_by));
        }
        if response
            .cookie_names()
            .iter()
            .any(|name| name.to_lowercase().contains("php"))
        {
            technologies.push("PHP detected from cookies".to_string());
        }

        let body_lower = response.body.to_lowercase();
        for (marker, label) in FRAMEWORK_MARKERS {
            if body_lower.contains(marker) {
                technologies.push(label.to_string());
            }
        }

        technologies
    }

    /// Request each well-known install path and label the platform when the
    /// response is exactly 200. A failing path is skipped, not fatal.
    pub async fn probe_paths(&self, client: &dyn HttpClient, target: &Target) -> Vec<Technology> {
        let mut technologies = Vec::new();

        for (path, label) in TECH_PATHS {
            let url = target.url_for(path);
            match client.get(&url).await {
                Ok(response) if response.status == 200 => {
                    info!("Detected {} via {}", label, url);
                    technologies.push(label.to_string());
                }
                Ok(response) => {
                    debug!("{} returned {}", url, response.status);
                }
                Err(e) => {
                    debug!("Technology probe {} failed: {}", url, e);
                }
            }
        }

        technologies
    }
}
