use std::sync::{Arc, Mutex};

use crate::domain::{AccountId, AppError, IngestionSettings, IngestionUpdate, LicenseKey};
use crate::ports::{IntegrationManager, IntegrationRole};

/// Journal entry for `FakeIntegrationManager`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagerCall {
    CallerAccountId,
    CreateIntegrationRole {
        role_policy: Option<String>,
        account: AccountId,
    },
    RemoveIntegrationRole {
        account: AccountId,
    },
    InstallLogIngestion {
        license_key: LicenseKey,
        settings: IngestionSettings,
    },
    UpdateLogIngestion {
        license_key: Option<LicenseKey>,
        settings: IngestionUpdate,
    },
    RemoveLogIngestion,
    InstallLicenseKey {
        policy_name: Option<String>,
    },
    UpdateLicenseKey,
    RemoveLicenseKey,
}

/// Recording fake for AWS-side integration resources.
#[derive(Clone)]
pub struct FakeIntegrationManager {
    pub calls: Arc<Mutex<Vec<ManagerCall>>>,
    pub caller_account: String,
}

impl FakeIntegrationManager {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(vec![])),
            caller_account: "123456789012".to_string(),
        }
    }

    pub fn with_caller_account(mut self, account: impl Into<String>) -> Self {
        self.caller_account = account.into();
        self
    }

    pub fn calls(&self) -> Vec<ManagerCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: ManagerCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl IntegrationManager for FakeIntegrationManager {
    fn caller_account_id(&self) -> Result<String, AppError> {
        self.record(ManagerCall::CallerAccountId);
        Ok(self.caller_account.clone())
    }

    fn create_integration_role(
        &self,
        role_policy: Option<&str>,
        account: AccountId,
    ) -> Result<IntegrationRole, AppError> {
        self.record(ManagerCall::CreateIntegrationRole {
            role_policy: role_policy.map(ToOwned::to_owned),
            account,
        });
        Ok(IntegrationRole {
            name: format!("NewRelicLambdaIntegrationRole_{}", account),
            arn: format!(
                "arn:aws:iam::{}:role/NewRelicLambdaIntegrationRole_{}",
                self.caller_account, account
            ),
        })
    }

    fn remove_integration_role(&self, account: AccountId) -> Result<(), AppError> {
        self.record(ManagerCall::RemoveIntegrationRole { account });
        Ok(())
    }

    fn install_log_ingestion(
        &self,
        license_key: &LicenseKey,
        settings: &IngestionSettings,
    ) -> Result<(), AppError> {
        self.record(ManagerCall::InstallLogIngestion {
            license_key: license_key.clone(),
            settings: settings.clone(),
        });
        Ok(())
    }

    fn update_log_ingestion(
        &self,
        license_key: Option<&LicenseKey>,
        settings: &IngestionUpdate,
    ) -> Result<(), AppError> {
        self.record(ManagerCall::UpdateLogIngestion {
            license_key: license_key.cloned(),
            settings: settings.clone(),
        });
        Ok(())
    }

    fn remove_log_ingestion(&self) -> Result<(), AppError> {
        self.record(ManagerCall::RemoveLogIngestion);
        Ok(())
    }

    fn install_license_key(
        &self,
        _license_key: &LicenseKey,
        policy_name: Option<&str>,
    ) -> Result<(), AppError> {
        self.record(ManagerCall::InstallLicenseKey {
            policy_name: policy_name.map(ToOwned::to_owned),
        });
        Ok(())
    }

    fn update_license_key(
        &self,
        _license_key: &LicenseKey,
        _policy_name: Option<&str>,
    ) -> Result<(), AppError> {
        self.record(ManagerCall::UpdateLicenseKey);
        Ok(())
    }

    fn remove_license_key(&self) -> Result<(), AppError> {
        self.record(ManagerCall::RemoveLicenseKey);
        Ok(())
    }
}
