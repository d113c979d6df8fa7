//! New Relic GraphQL API client implementation using reqwest.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde_json::{Value, json};
use url::Url;

use crate::domain::{AccountId, AppError, LicenseKey, PlatformApiConfig};
use crate::ports::{LinkedAccount, PlatformApi};

const API_KEY_HEADER: &str = "API-Key";

const ACCOUNT_QUERY: &str = "query ($accountId: Int!) {
  actor { account(id: $accountId) { id name } }
}";

const LICENSE_KEY_QUERY: &str = "query ($accountId: Int!) {
  actor { account(id: $accountId) { licenseKey } }
}";

const LINKED_ACCOUNTS_QUERY: &str = "query ($accountId: Int!) {
  actor { account(id: $accountId) { cloud { linkedAccounts { id name externalId } } } }
}";

const LINK_ACCOUNT_MUTATION: &str = "mutation ($accountId: Int!, $name: String!, $arn: String!) {
  cloudLinkAccount(accountId: $accountId, accounts: { aws: [{ name: $name, arn: $arn }] }) {
    linkedAccounts { id name externalId }
    errors { message }
  }
}";

const ENABLE_INTEGRATION_MUTATION: &str = "mutation ($accountId: Int!, $linkedAccountId: Int!) {
  cloudConfigureIntegration(
    accountId: $accountId
    integrations: { aws: [{ lambda: [{ linkedAccountId: $linkedAccountId }] }] }
  ) {
    errors { message }
  }
}";

/// HTTP transport for the New Relic GraphQL API.
///
/// Scoped to one account id / API key pair; every call is a single POST to
/// the region's GraphQL endpoint.
#[derive(Clone)]
pub struct HttpPlatformClient {
    account_id: AccountId,
    api_key: String,
    endpoint: Url,
    client: Client,
}

impl std::fmt::Debug for HttpPlatformClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPlatformClient")
            .field("account_id", &self.account_id)
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: Value,
}

impl HttpPlatformClient {
    /// Create a new client for the given account and configuration.
    pub fn new(
        account_id: AccountId,
        api_key: String,
        config: &PlatformApiConfig,
    ) -> Result<Self, AppError> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| AppError::ApiError {
            message: format!("Invalid API endpoint '{}': {}", config.endpoint, e),
            status: None,
        })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::ApiError {
                message: format!("Failed to create HTTP client: {}", e),
                status: None,
            })?;

        Ok(Self {
            account_id,
            api_key,
            endpoint,
            client,
        })
    }

    fn post_query(&self, query: &str, variables: Value) -> Result<Value, AppError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(API_KEY_HEADER, &self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .json(&GraphqlRequest { query, variables })
            .send()
            .map_err(|e| AppError::ApiError {
                message: format!("HTTP request failed: {}", e),
                status: None,
            })?;

        let status = response.status();
        let body_text = response.text().unwrap_or_default();

        if !status.is_success() {
            let message = extract_error_message(&body_text).unwrap_or_else(|| {
                if body_text.trim().is_empty() {
                    "API request failed".to_string()
                } else {
                    body_text.clone()
                }
            });
            return Err(AppError::ApiError {
                message,
                status: Some(status.as_u16()),
            });
        }

        let body: Value = serde_json::from_str(&body_text).map_err(|e| AppError::ApiError {
            message: format!("Failed to parse response: {}", e),
            status: Some(status.as_u16()),
        })?;

        if let Some(message) = first_graphql_error(&body) {
            return Err(AppError::ApiError {
                message,
                status: Some(status.as_u16()),
            });
        }

        Ok(body)
    }

    fn account_variables(&self) -> Value {
        json!({ "accountId": self.account_id.value() })
    }
}

impl PlatformApi for HttpPlatformClient {
    fn validate_credentials(&self) -> Result<(), AppError> {
        let body = self.post_query(ACCOUNT_QUERY, self.account_variables())?;
        let account = body.pointer("/data/actor/account");
        if account.is_none_or(Value::is_null) {
            return Err(AppError::ApiError {
                message: format!(
                    "Could not validate credentials for account {}; check the account id and API key",
                    self.account_id
                ),
                status: None,
            });
        }
        Ok(())
    }

    fn retrieve_license_key(&self) -> Result<LicenseKey, AppError> {
        let body = self.post_query(LICENSE_KEY_QUERY, self.account_variables())?;
        body.pointer("/data/actor/account/licenseKey")
            .and_then(Value::as_str)
            .map(LicenseKey::new)
            .ok_or_else(|| AppError::ApiError {
                message: format!("No license key returned for account {}", self.account_id),
                status: None,
            })
    }

    fn linked_account_by_name(&self, name: &str) -> Result<Option<LinkedAccount>, AppError> {
        let body = self.post_query(LINKED_ACCOUNTS_QUERY, self.account_variables())?;
        let accounts = body
            .pointer("/data/actor/account/cloud/linkedAccounts")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Ok(accounts
            .iter()
            .filter_map(parse_linked_account)
            .find(|account| account.name == name))
    }

    fn create_linked_account(
        &self,
        name: &str,
        role_arn: &str,
    ) -> Result<LinkedAccount, AppError> {
        let variables = json!({
            "accountId": self.account_id.value(),
            "name": name,
            "arn": role_arn,
        });
        let body = self.post_query(LINK_ACCOUNT_MUTATION, variables)?;

        if let Some(message) = first_mutation_error(&body, "/data/cloudLinkAccount/errors") {
            return Err(AppError::ApiError {
                message,
                status: None,
            });
        }

        body.pointer("/data/cloudLinkAccount/linkedAccounts/0")
            .and_then(parse_linked_account)
            .ok_or_else(|| AppError::ApiError {
                message: format!("Linking AWS account '{}' returned no linked account", name),
                status: None,
            })
    }

    fn enable_lambda_integration(&self, linked_account_id: i64) -> Result<(), AppError> {
        let variables = json!({
            "accountId": self.account_id.value(),
            "linkedAccountId": linked_account_id,
        });
        let body = self.post_query(ENABLE_INTEGRATION_MUTATION, variables)?;

        if let Some(message) =
            first_mutation_error(&body, "/data/cloudConfigureIntegration/errors")
        {
            return Err(AppError::ApiError {
                message,
                status: None,
            });
        }
        Ok(())
    }
}

fn parse_linked_account(value: &Value) -> Option<LinkedAccount> {
    Some(LinkedAccount {
        id: value.get("id")?.as_i64()?,
        name: value.get("name")?.as_str()?.to_string(),
        external_id: value.get("externalId")?.as_str()?.to_string(),
    })
}

/// First error message from a top-level GraphQL `errors` array, if any.
fn first_graphql_error(body: &Value) -> Option<String> {
    body.get("errors")?
        .as_array()?
        .first()?
        .get("message")?
        .as_str()
        .map(ToOwned::to_owned)
}

/// First error message from a mutation-level `errors` array, if any.
fn first_mutation_error(body: &Value, pointer: &str) -> Option<String> {
    body.pointer(pointer)?
        .as_array()?
        .first()?
        .get("message")?
        .as_str()
        .map(ToOwned::to_owned)
}

fn extract_error_message(body: &str) -> Option<String> {
    if body.trim().is_empty() {
        return None;
    }
    let parsed = serde_json::from_str::<Value>(body).ok()?;
    if let Some(message) = first_graphql_error(&parsed) {
        return Some(message);
    }
    parsed
        .get("message")
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
}
