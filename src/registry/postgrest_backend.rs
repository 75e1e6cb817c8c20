//! PostgREST (Supabase REST) registration registry.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::push::DeviceRegistration;

use super::{registrations_from_rows, RegistrationRegistry, RegistryError};

#[derive(Debug, Deserialize)]
struct RegistrationRow {
    token: String,
    platform: String,
}

pub struct PostgrestRegistry {
    client: reqwest::Client,
    table_url: String,
    service_key: String,
}

impl PostgrestRegistry {
    pub fn new(client: reqwest::Client, base_url: String, service_key: String, table: String) -> Self {
        let table_url = format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table);
        Self {
            client,
            table_url,
            service_key,
        }
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, RegistryError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(RegistryError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl RegistrationRegistry for PostgrestRegistry {
    fn backend_type(&self) -> &'static str {
        "postgrest"
    }

    async fn active_registrations(
        &self,
        user_id: &str,
    ) -> Result<Vec<DeviceRegistration>, RegistryError> {
        let user_filter = format!("eq.{}", user_id);
        let request = self.client.get(&self.table_url).query(&[
            ("select", "token,platform"),
            ("user_id", user_filter.as_str()),
            ("is_active", "eq.true"),
        ]);

        let response = Self::check(self.authorized(request).send().await?).await?;
        let rows: Vec<RegistrationRow> = response.json().await?;

        Ok(registrations_from_rows(
            rows.into_iter().map(|row| (row.token, row.platform)),
        ))
    }

    async fn deactivate(&self, token: &str) -> Result<(), RegistryError> {
        let token_filter = format!("eq.{}", token);
        let request = self
            .client
            .patch(&self.table_url)
            .query(&[("token", token_filter.as_str()), ("is_active", "eq.true")])
            .header("Prefer", "return=minimal")
            .json(&json!({ "is_active": false }));

        Self::check(self.authorized(request).send().await?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::Platform;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn registry(server: &MockServer) -> PostgrestRegistry {
        PostgrestRegistry::new(
            reqwest::Client::new(),
            format!("{}/", server.uri()),
            "service-role-key".to_string(),
            "fcm_tokens".to_string(),
        )
    }

    #[tokio::test]
    async fn test_fetch_active_registrations() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/fcm_tokens"))
            .and(query_param("user_id", "eq.u1"))
            .and(query_param("is_active", "eq.true"))
            .and(header("apikey", "service-role-key"))
            .and(header("authorization", "Bearer service-role-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "token": "t1", "platform": "ios" },
                { "token": "t2", "platform": "android" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let registrations = registry(&server).active_registrations("u1").await.unwrap();
        assert_eq!(registrations.len(), 2);
        assert_eq!(registrations[0], DeviceRegistration::active("t1", Platform::Ios));
    }

    #[tokio::test]
    async fn test_fetch_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let result = registry(&server).active_registrations("u1").await;
        assert!(matches!(
            result,
            Err(RegistryError::Status { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_deactivate_patches_only_active_row() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/fcm_tokens"))
            .and(query_param("token", "eq.dead-token"))
            .and(query_param("is_active", "eq.true"))
            .and(body_json(serde_json::json!({ "is_active": false })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        registry(&server).deactivate("dead-token").await.unwrap();
    }
}
