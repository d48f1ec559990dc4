use std::time::Duration;

use battle_tracker_shared::models::LocationSpec;
use battle_tracker_shared::table::Notes;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct GraphQLRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLResponse<T> {
    pub data: Option<T>,
    pub errors: Option<Vec<GraphQLError>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLError {
    pub message: String,
}

fn origin() -> Result<String, String> {
    let window = web_sys::window().ok_or("No browser window")?;
    window
        .location()
        .origin()
        .map_err(|_| "Page origin unavailable".to_string())
}

/// Resolve a server path like `/static/map.jpg` against `origin`.
pub fn absolute_url(origin: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        path.to_string()
    } else if path.starts_with('/') {
        format!("{}{}", origin, path)
    } else {
        format!("{}/{}", origin, path)
    }
}

/// URL of a unit icon asset under the server's icon directory.
pub fn icon_url(icon_base_url: &str, asset: &str) -> String {
    if icon_base_url.ends_with('/') {
        format!("{}{}", icon_base_url, asset)
    } else {
        format!("{}/{}", icon_base_url, asset)
    }
}

async fn query<T: for<'de> Deserialize<'de>>(
    query_str: &str,
    variables: Option<serde_json::Value>,
) -> Result<T, String> {
    let req = GraphQLRequest {
        query: query_str.to_string(),
        variables,
    };

    let resp = reqwest::Client::new()
        .post(absolute_url(&origin()?, "/graphql"))
        .json(&req)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let gql_resp: GraphQLResponse<T> = resp.json().await.map_err(|e| e.to_string())?;

    if let Some(errors) = gql_resp.errors {
        if let Some(first) = errors.into_iter().next() {
            return Err(first.message);
        }
    }

    gql_resp.data.ok_or_else(|| "No data returned".to_string())
}

// Types mirroring the GraphQL schema

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerConfigData {
    pub map_image: String,
    pub icon_base_url: String,
    pub poll_interval_secs: u64,
    pub locations: Vec<LocationSpec>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetData {
    pub units: Vec<Vec<String>>,
    pub notes: Notes,
    pub fetched_at: String,
}

// API functions

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerConfigResponse {
    pub tracker_config: TrackerConfigData,
}

pub async fn fetch_tracker_config() -> Result<TrackerConfigData, String> {
    let resp: TrackerConfigResponse = query(
        r#"query { trackerConfig { mapImage iconBaseUrl pollIntervalSecs locations { name x y } } }"#,
        None,
    )
    .await?;
    Ok(resp.tracker_config)
}

#[derive(Deserialize)]
pub struct SheetResponse {
    pub sheet: SheetData,
}

pub async fn fetch_sheet() -> Result<SheetData, String> {
    let resp: SheetResponse = query(
        r#"query { sheet { units notes { title items } fetchedAt } }"#,
        None,
    )
    .await?;
    Ok(resp.sheet)
}

/// Upper bound on a single icon preload. A load that stalls past this is
/// reported as failed so its pending spawn is released.
pub const ICON_LOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetch an icon so the browser has it cached before the icon is placed.
pub async fn preload_icon(url: &str) -> Result<(), String> {
    let resp = reqwest::Client::new()
        .get(absolute_url(&origin()?, url))
        .timeout(ICON_LOAD_TIMEOUT)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                format!("{} timed out after {}s", url, ICON_LOAD_TIMEOUT.as_secs())
            } else {
                e.to_string()
            }
        })?;
    if !resp.status().is_success() {
        return Err(format!("{} returned HTTP {}", url, resp.status().as_u16()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icon_load_timeout_is_shorter_than_a_poll() {
        assert!(ICON_LOAD_TIMEOUT > Duration::ZERO);
        assert!(ICON_LOAD_TIMEOUT < Duration::from_secs(30));
    }

    #[test]
    fn test_graphql_request_omits_null_variables() {
        let req = GraphQLRequest {
            query: "query { sheet { units } }".to_string(),
            variables: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["query"], "query { sheet { units } }");
        assert!(json.get("variables").is_none());
    }

    #[test]
    fn test_tracker_config_response_deserializes() {
        let json = r#"{"trackerConfig":{"mapImage":"/static/map.jpg","iconBaseUrl":"/static/icons/","pollIntervalSecs":30,"locations":[{"name":"USMA","x":0.5,"y":0.25}]}}"#;
        let resp: TrackerConfigResponse = serde_json::from_str(json).unwrap();
        let cfg = resp.tracker_config;
        assert_eq!(cfg.map_image, "/static/map.jpg");
        assert_eq!(cfg.poll_interval_secs, 30);
        assert_eq!(cfg.locations, vec![LocationSpec::new("USMA", 0.5, 0.25)]);
    }

    #[test]
    fn test_sheet_response_deserializes() {
        let json = r#"{"sheet":{"units":[["BN","30","USMA","12:00"]],"notes":{"title":"Phase I","items":["Stand by"]},"fetchedAt":"2024-05-01T12:00:00+00:00"}}"#;
        let resp: SheetResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.sheet.units[0][2], "USMA");
        assert_eq!(resp.sheet.notes.title, "Phase I");
        assert_eq!(resp.sheet.notes.items, vec!["Stand by"]);
    }

    #[test]
    fn test_graphql_error_response() {
        let json = r#"{"data":null,"errors":[{"message":"The caller does not have permission (HTTP 403)"}]}"#;
        let resp: GraphQLResponse<SheetResponse> = serde_json::from_str(json).unwrap();
        assert!(resp.data.is_none());
        assert_eq!(
            resp.errors.unwrap()[0].message,
            "The caller does not have permission (HTTP 403)"
        );
    }

    #[test]
    fn test_absolute_url() {
        assert_eq!(
            absolute_url("http://localhost:3000", "/static/map.jpg"),
            "http://localhost:3000/static/map.jpg"
        );
        assert_eq!(
            absolute_url("http://localhost:3000", "graphql"),
            "http://localhost:3000/graphql"
        );
        assert_eq!(
            absolute_url("http://localhost:3000", "https://cdn.example.com/a.svg"),
            "https://cdn.example.com/a.svg"
        );
    }

    #[test]
    fn test_icon_url() {
        assert_eq!(icon_url("/static/icons/", "bn_platoon.svg"), "/static/icons/bn_platoon.svg");
        assert_eq!(icon_url("/static/icons", "bn_team.svg"), "/static/icons/bn_team.svg");
    }
}
