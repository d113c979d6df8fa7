//! `integrations install` command implementation.
//!
//! Links the caller's AWS account to a New Relic account and installs the
//! log-ingestion function. Steps, in order:
//! 1. Permission preflight (skippable)
//! 2. Credential validation against the New Relic API
//! 3. Linked-account validation (an existing link must point at the
//!    caller's AWS account)
//! 4. Integration-role creation
//! 5. Linked-account creation + Lambda integration enablement (first
//!    install only)
//! 6. Log-ingestion install and license-key secret install

use crate::domain::{AccountId, AppError, IngestionSettings};
use crate::ports::{IntegrationManager, IntegrationRole, PermissionGate, PlatformApi};

/// Options for `integrations install`.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    pub account_id: AccountId,
    pub linked_account_name: String,
    pub role_policy: Option<String>,
    pub ingestion: IngestionSettings,
    pub skip_permissions_check: bool,
}

/// Output of `integrations install`.
#[derive(Debug, Clone)]
pub struct InstallOutput {
    /// Whether a new linked account was created on the New Relic side.
    pub linked_account_created: bool,
    /// The integration role the install ended up with.
    pub role: IntegrationRole,
}

/// Execute `integrations install`.
pub fn execute(
    platform: &impl PlatformApi,
    manager: &impl IntegrationManager,
    gate: &impl PermissionGate,
    options: InstallOptions,
) -> Result<InstallOutput, AppError> {
    if !options.skip_permissions_check {
        gate.ensure_install_permissions()?;
    }

    platform.validate_credentials()?;

    let existing = platform.linked_account_by_name(&options.linked_account_name)?;
    if let Some(account) = &existing {
        let caller = manager.caller_account_id()?;
        if caller != account.external_id {
            return Err(AppError::AccountMismatch {
                linked: account.external_id.clone(),
                caller,
            });
        }
    }

    let role = manager.create_integration_role(options.role_policy.as_deref(), options.account_id)?;

    let linked_account_created = match existing {
        Some(_) => false,
        None => {
            let linked =
                platform.create_linked_account(&options.linked_account_name, &role.arn)?;
            platform.enable_lambda_integration(linked.id)?;
            true
        }
    };

    let license_key = platform.retrieve_license_key()?;
    manager.install_log_ingestion(&license_key, &options.ingestion)?;
    manager.install_license_key(&license_key, None)?;

    Ok(InstallOutput {
        linked_account_created,
        role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::LinkedAccount;
    use crate::testing::{
        FakeIntegrationManager, FakePermissionGate, FakePlatformApi, ManagerCall, PlatformCall,
    };

    fn options() -> InstallOptions {
        InstallOptions {
            account_id: AccountId::new(12345678).unwrap(),
            linked_account_name: "test_linked_account".to_string(),
            role_policy: None,
            ingestion: IngestionSettings::default(),
            skip_permissions_check: false,
        }
    }

    #[test]
    fn install_runs_the_full_sequence_with_defaults() {
        let platform = FakePlatformApi::new();
        let manager = FakeIntegrationManager::new();
        let gate = FakePermissionGate::new();

        let output = execute(&platform, &manager, &gate, options()).unwrap();

        assert!(output.linked_account_created);
        assert_eq!(gate.install_check_count(), 1);

        let platform_calls = platform.calls();
        assert_eq!(platform_calls[0], PlatformCall::ValidateCredentials);
        assert!(platform_calls.contains(&PlatformCall::LinkedAccountByName(
            "test_linked_account".to_string()
        )));
        assert!(platform_calls.contains(&PlatformCall::CreateLinkedAccount {
            name: "test_linked_account".to_string(),
            role_arn: output.role.arn.clone(),
        }));
        assert!(
            platform_calls
                .contains(&PlatformCall::EnableLambdaIntegration { linked_account_id: 777 })
        );
        assert!(platform_calls.contains(&PlatformCall::RetrieveLicenseKey));

        let manager_calls = manager.calls();
        assert!(manager_calls.contains(&ManagerCall::CreateIntegrationRole {
            role_policy: None,
            account: AccountId::new(12345678).unwrap(),
        }));
        let install = manager_calls
            .iter()
            .find_map(|call| match call {
                ManagerCall::InstallLogIngestion { settings, .. } => Some(settings.clone()),
                _ => None,
            })
            .expect("log ingestion should be installed");
        assert_eq!(install.memory_size, 128);
        assert_eq!(install.timeout, 30);
        assert!(!install.enable_logs);
        assert!(
            manager_calls.contains(&ManagerCall::InstallLicenseKey { policy_name: None })
        );
    }

    #[test]
    fn role_is_created_before_the_linked_account_references_it() {
        let platform = FakePlatformApi::new();
        let manager = FakeIntegrationManager::new();
        let gate = FakePermissionGate::new();

        let output = execute(&platform, &manager, &gate, options()).unwrap();

        let linked_arn = platform
            .calls()
            .iter()
            .find_map(|call| match call {
                PlatformCall::CreateLinkedAccount { role_arn, .. } => Some(role_arn.clone()),
                _ => None,
            })
            .expect("linked account should be created");
        assert_eq!(linked_arn, output.role.arn);
    }

    #[test]
    fn install_skips_permission_check_when_flagged() {
        let platform = FakePlatformApi::new();
        let manager = FakeIntegrationManager::new();
        let gate = FakePermissionGate::denying(&["cloudformation:CreateStack"]);

        let opts = InstallOptions {
            skip_permissions_check: true,
            ..options()
        };
        execute(&platform, &manager, &gate, opts).unwrap();
        assert_eq!(gate.install_check_count(), 0);
    }

    #[test]
    fn permission_denial_stops_the_install_before_any_api_call() {
        let platform = FakePlatformApi::new();
        let manager = FakeIntegrationManager::new();
        let gate = FakePermissionGate::denying(&["iam:CreateRole"]);

        let err = execute(&platform, &manager, &gate, options()).unwrap_err();
        assert!(matches!(err, AppError::PermissionsDenied { .. }));
        assert!(platform.calls().is_empty());
        assert!(manager.calls().is_empty());
    }

    #[test]
    fn invalid_credentials_fail_before_touching_aws() {
        let platform = FakePlatformApi::new().with_invalid_credentials();
        let manager = FakeIntegrationManager::new();
        let gate = FakePermissionGate::new();

        let err = execute(&platform, &manager, &gate, options()).unwrap_err();
        assert!(matches!(err, AppError::ApiError { status: Some(401), .. }));
        assert!(manager.calls().is_empty());
    }

    #[test]
    fn existing_linked_account_for_same_aws_account_is_reused() {
        let platform = FakePlatformApi::new().with_existing_account(LinkedAccount {
            id: 42,
            name: "test_linked_account".to_string(),
            external_id: "123456789012".to_string(),
        });
        let manager = FakeIntegrationManager::new();
        let gate = FakePermissionGate::new();

        let output = execute(&platform, &manager, &gate, options()).unwrap();

        assert!(!output.linked_account_created);
        assert!(manager.calls().contains(&ManagerCall::CallerAccountId));
        let platform_calls = platform.calls();
        assert!(!platform_calls
            .iter()
            .any(|call| matches!(call, PlatformCall::CreateLinkedAccount { .. })));
        assert!(!platform_calls
            .iter()
            .any(|call| matches!(call, PlatformCall::EnableLambdaIntegration { .. })));
        // Log ingestion is still (re)installed.
        assert!(manager
            .calls()
            .iter()
            .any(|call| matches!(call, ManagerCall::InstallLogIngestion { .. })));
    }

    #[test]
    fn mismatched_linked_account_is_a_hard_error() {
        let platform = FakePlatformApi::new().with_existing_account(LinkedAccount {
            id: 42,
            name: "test_linked_account".to_string(),
            external_id: "999999999999".to_string(),
        });
        let manager = FakeIntegrationManager::new();
        let gate = FakePermissionGate::new();

        let err = execute(&platform, &manager, &gate, options()).unwrap_err();
        match err {
            AppError::AccountMismatch { linked, caller } => {
                assert_eq!(linked, "999999999999");
                assert_eq!(caller, "123456789012");
            }
            other => panic!("unexpected error: {}", other),
        }
        // Nothing was created on either side.
        assert!(!manager
            .calls()
            .iter()
            .any(|call| matches!(call, ManagerCall::CreateIntegrationRole { .. })));
    }

    #[test]
    fn role_policy_is_forwarded_to_role_creation() {
        let platform = FakePlatformApi::new();
        let manager = FakeIntegrationManager::new();
        let gate = FakePermissionGate::new();

        let opts = InstallOptions {
            role_policy: Some("ReadOnlyPolicy".to_string()),
            ..options()
        };
        execute(&platform, &manager, &gate, opts).unwrap();

        assert!(manager.calls().contains(&ManagerCall::CreateIntegrationRole {
            role_policy: Some("ReadOnlyPolicy".to_string()),
            account: AccountId::new(12345678).unwrap(),
        }));
    }
}
