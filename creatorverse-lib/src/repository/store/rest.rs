use async_trait::async_trait;
use reqwest::{
    Client, RequestBuilder, Response, StatusCode,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde::Deserialize;
use tracing::debug;

use crate::repository::{
    config::{ConfigError, CoreConfig},
    entities::{Creator, CreatorId, NewCreator},
    store::{RecordStore, Result, StoreError},
};

/// PostgREST error code for "the result contains 0 rows" on a single object request.
const NO_ROWS: &str = "PGRST116";
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// A [`RecordStore`] backed by a PostgREST endpoint, such as the one in front of a Supabase
/// project.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    endpoint: String,
}

/// The error body PostgREST returns on failure.
#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl RestStore {
    pub fn new(cfg: &CoreConfig) -> std::result::Result<Self, ConfigError> {
        let key = cfg.anon_key()?;
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(key).map_err(|_| ConfigError::Missing("anon_key"))?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|_| ConfigError::Missing("anon_key"))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/rest/v1/{}", cfg.supabase_url()?, cfg.table),
        })
    }

    fn by_id(&self, builder: RequestBuilder, id: CreatorId) -> RequestBuilder {
        builder.query(&[("id", format!("eq.{id}"))])
    }
}

#[async_trait]
impl RecordStore for RestStore {
    async fn select_all(&self) -> Result<Vec<Creator>> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }

    async fn select_by_id(&self, id: CreatorId) -> Result<Creator> {
        let response = self
            .by_id(self.client.get(&self.endpoint), id)
            .query(&[("select", "*")])
            .header(ACCEPT, SINGLE_OBJECT)
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }

    async fn insert(&self, fields: &NewCreator) -> Result<Creator> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Prefer", "return=representation")
            .json(&[fields])
            .send()
            .await?;

        let created: Vec<Creator> = check(response).await?.json().await?;
        let creator = created
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Other("insert returned no rows".into()))?;

        debug!("Inserted creator {}", creator.id());

        Ok(creator)
    }

    async fn update(&self, id: CreatorId, fields: &NewCreator) -> Result<()> {
        let response = self
            .by_id(self.client.patch(&self.endpoint), id)
            .header("Prefer", "return=minimal")
            .json(fields)
            .send()
            .await?;

        check(response).await?;
        debug!("Updated creator {id}");

        Ok(())
    }

    async fn delete(&self, id: CreatorId) -> Result<()> {
        let response = self
            .by_id(self.client.delete(&self.endpoint), id)
            .send()
            .await?;

        check(response).await?;
        debug!("Deleted creator {id}");

        Ok(())
    }
}

/// Turn an unsuccessful response into a [`StoreError`].
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(classify(status, &body))
}

fn classify(status: StatusCode, body: &str) -> StoreError {
    match serde_json::from_str::<ApiError>(body) {
        Ok(ApiError {
            code: Some(code), ..
        }) if code == NO_ROWS => StoreError::NotFound,
        Ok(ApiError {
            message: Some(message),
            ..
        }) => StoreError::Other(message),
        _ => StoreError::Other(status.to_string()),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_new_builds_table_endpoint() {
        let store = RestStore::new(&CoreConfig::mock()).unwrap();

        assert_eq!(store.endpoint, "https://example.supabase.co/rest/v1/creators");
    }

    #[test]
    fn test_new_requires_key() {
        let cfg = CoreConfig {
            anon_key: None,
            ..CoreConfig::mock()
        };

        assert!(matches!(
            RestStore::new(&cfg),
            Err(ConfigError::Missing("anon_key"))
        ));
    }

    #[test]
    fn test_classify_no_rows() {
        let body = r#"{"code":"PGRST116","details":"The result contains 0 rows","hint":null,"message":"JSON object requested, multiple (or no) rows returned"}"#;

        assert_eq!(classify(StatusCode::NOT_ACCEPTABLE, body), StoreError::NotFound);
    }

    #[test]
    fn test_classify_message() {
        let body = r#"{"code":"23502","details":null,"hint":null,"message":"null value in column \"name\" violates not-null constraint"}"#;

        assert_eq!(
            classify(StatusCode::BAD_REQUEST, body),
            StoreError::Other("null value in column \"name\" violates not-null constraint".into())
        );
    }

    #[test]
    fn test_classify_unparseable_body() {
        assert_eq!(
            classify(StatusCode::BAD_GATEWAY, "<html>"),
            StoreError::Other("502 Bad Gateway".into())
        );
    }
}
