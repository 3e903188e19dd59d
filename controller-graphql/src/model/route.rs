use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Prefix of a route's `parent_ref` when the route belongs to an app.
pub const ROUTE_PARENT_REF_PREFIX: &str = "controller/apps/";

/// The `parent_ref` routes of the given app are stored under.
pub fn route_parent_ref(app_id: &str) -> String {
    format!("{ROUTE_PARENT_REF_PREFIX}{app_id}")
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Route {
    /// `http` or `tcp`.
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub parent_ref: String,
    pub service: String,
    pub leader: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,

    // http routes
    pub domain: String,
    pub certificate: Option<Certificate>,
    pub sticky: bool,
    pub path: String,

    // tcp routes
    pub port: i32,
}

impl Route {
    /// The owning app, when `parent_ref` points at one.
    pub fn app_id(&self) -> Option<&str> {
        self.parent_ref.strip_prefix(ROUTE_PARENT_REF_PREFIX)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Certificate {
    pub id: String,
    pub cert: String,
    pub key: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_id_requires_the_app_prefix() {
        let route = Route {
            parent_ref: route_parent_ref("a1"),
            ..Default::default()
        };
        assert_eq!(route.app_id(), Some("a1"));

        let route = Route {
            parent_ref: "dashboard/a1".into(),
            ..Default::default()
        };
        assert_eq!(route.app_id(), None);
    }
}
