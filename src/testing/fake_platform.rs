use std::sync::{Arc, Mutex};

use crate::domain::{AppError, LicenseKey};
use crate::ports::{LinkedAccount, PlatformApi};

/// Journal entry for `FakePlatformApi`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    ValidateCredentials,
    RetrieveLicenseKey,
    LinkedAccountByName(String),
    CreateLinkedAccount { name: String, role_arn: String },
    EnableLambdaIntegration { linked_account_id: i64 },
}

/// Recording fake for the New Relic control plane.
#[derive(Clone)]
pub struct FakePlatformApi {
    pub calls: Arc<Mutex<Vec<PlatformCall>>>,
    pub existing_account: Option<LinkedAccount>,
    pub license_key: LicenseKey,
    pub credentials_error: Option<String>,
}

impl FakePlatformApi {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(vec![])),
            existing_account: None,
            license_key: LicenseKey::new("fake-license-key"),
            credentials_error: None,
        }
    }

    pub fn with_existing_account(mut self, account: LinkedAccount) -> Self {
        self.existing_account = Some(account);
        self
    }

    pub fn with_invalid_credentials(mut self) -> Self {
        self.credentials_error = Some("API key is invalid".to_string());
        self
    }

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: PlatformCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl PlatformApi for FakePlatformApi {
    fn validate_credentials(&self) -> Result<(), AppError> {
        self.record(PlatformCall::ValidateCredentials);
        match &self.credentials_error {
            Some(message) => Err(AppError::ApiError {
                message: message.clone(),
                status: Some(401),
            }),
            None => Ok(()),
        }
    }

    fn retrieve_license_key(&self) -> Result<LicenseKey, AppError> {
        self.record(PlatformCall::RetrieveLicenseKey);
        Ok(self.license_key.clone())
    }

    fn linked_account_by_name(&self, name: &str) -> Result<Option<LinkedAccount>, AppError> {
        self.record(PlatformCall::LinkedAccountByName(name.to_string()));
        Ok(self
            .existing_account
            .as_ref()
            .filter(|account| account.name == name)
            .cloned())
    }

    fn create_linked_account(
        &self,
        name: &str,
        role_arn: &str,
    ) -> Result<LinkedAccount, AppError> {
        self.record(PlatformCall::CreateLinkedAccount {
            name: name.to_string(),
            role_arn: role_arn.to_string(),
        });
        Ok(LinkedAccount {
            id: 777,
            name: name.to_string(),
            external_id: "123456789012".to_string(),
        })
    }

    fn enable_lambda_integration(&self, linked_account_id: i64) -> Result<(), AppError> {
        self.record(PlatformCall::EnableLambdaIntegration { linked_account_id });
        Ok(())
    }
}
