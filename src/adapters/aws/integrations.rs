//! AWS-side integration resources, managed through CloudFormation.
//!
//! Three stacks are involved:
//! - `NewRelicLambdaIntegrationRole-<account>` carrying the IAM role New
//!   Relic assumes,
//! - `NewRelicLogIngestion` carrying the log-ingestion function, deployed
//!   from the Serverless Application Repository template,
//! - `NewRelicLicenseKeySecret` carrying the managed license-key secret.

use std::sync::Arc;
use std::time::Duration;

use aws_sdk_cloudformation::error::SdkError;
use aws_sdk_cloudformation::operation::describe_stacks::DescribeStacksError;
use aws_sdk_cloudformation::types::{
    Capability, ChangeSetStatus, ChangeSetType, Parameter, StackStatus,
};
use chrono::Utc;

use crate::adapters::aws::{AwsSession, sdk_error_details};
use crate::domain::{AccountId, AppError, IngestionSettings, IngestionUpdate, LicenseKey};
use crate::ports::{IntegrationManager, IntegrationRole};

const INGEST_STACK_NAME: &str = "NewRelicLogIngestion";
const LICENSE_KEY_STACK_NAME: &str = "NewRelicLicenseKeySecret";
const INGEST_FUNCTION_NAME: &str = "newrelic-log-ingestion";
const SAR_APPLICATION_ID: &str =
    "arn:aws:serverlessrepo:us-east-1:463657938898:applications/NewRelic-log-ingestion";

const INTEGRATION_ROLE_TEMPLATE: &str = include_str!("templates/integration-role.yaml");
const LICENSE_KEY_TEMPLATE: &str = include_str!("templates/license-key-secret.yaml");

const STACK_POLL_INTERVAL: Duration = Duration::from_secs(10);
const STACK_POLL_ATTEMPTS: u32 = 120;
const CHANGE_SET_POLL_INTERVAL: Duration = Duration::from_secs(5);
const CHANGE_SET_POLL_ATTEMPTS: u32 = 60;

/// CloudFormation-backed implementation of [`IntegrationManager`].
pub struct AwsIntegrationManager {
    session: Arc<AwsSession>,
    cloudformation: aws_sdk_cloudformation::Client,
    iam: aws_sdk_iam::Client,
    lambda: aws_sdk_lambda::Client,
    sts: aws_sdk_sts::Client,
    sar: aws_sdk_serverlessapplicationrepository::Client,
}

impl AwsIntegrationManager {
    pub fn new(session: Arc<AwsSession>) -> Self {
        let config = session.config();
        Self {
            cloudformation: aws_sdk_cloudformation::Client::new(config),
            iam: aws_sdk_iam::Client::new(config),
            lambda: aws_sdk_lambda::Client::new(config),
            sts: aws_sdk_sts::Client::new(config),
            sar: aws_sdk_serverlessapplicationrepository::Client::new(config),
            session,
        }
    }

    /// Status of a CloudFormation stack, or `None` when it does not exist.
    fn stack_status(&self, stack_name: &str) -> Result<Option<StackStatus>, AppError> {
        let result = self.session.block_on(
            self.cloudformation
                .describe_stacks()
                .stack_name(stack_name)
                .send(),
        );
        match result {
            Ok(output) => Ok(output
                .stacks()
                .first()
                .and_then(|stack| stack.stack_status())
                .cloned()),
            Err(err) if stack_absent(&err) => Ok(None),
            Err(err) => Err(AppError::CloudError {
                operation: "cloudformation:DescribeStacks".to_string(),
                details: sdk_error_details(err),
            }),
        }
    }

    fn get_role(&self, role_name: &str) -> Result<Option<IntegrationRole>, AppError> {
        let result = self
            .session
            .block_on(self.iam.get_role().role_name(role_name).send());
        match result {
            Ok(output) => {
                let role = output.role().ok_or_else(|| AppError::CloudError {
                    operation: "iam:GetRole".to_string(),
                    details: format!("empty response for role '{}'", role_name),
                })?;
                Ok(Some(IntegrationRole {
                    name: role.role_name().to_string(),
                    arn: role.arn().to_string(),
                }))
            }
            Err(SdkError::ServiceError(context))
                if context.err().is_no_such_entity_exception() =>
            {
                Ok(None)
            }
            Err(err) => Err(AppError::CloudError {
                operation: "iam:GetRole".to_string(),
                details: sdk_error_details(err),
            }),
        }
    }

    fn function_exists(&self, function_name: &str) -> Result<bool, AppError> {
        let result = self.session.block_on(
            self.lambda
                .get_function()
                .function_name(function_name)
                .send(),
        );
        match result {
            Ok(_) => Ok(true),
            Err(SdkError::ServiceError(context))
                if context.err().is_resource_not_found_exception() =>
            {
                Ok(false)
            }
            Err(err) => Err(AppError::CloudError {
                operation: "lambda:GetFunction".to_string(),
                details: sdk_error_details(err),
            }),
        }
    }

    fn create_role_stack(
        &self,
        stack_name: &str,
        role_policy: Option<&str>,
        account: AccountId,
    ) -> Result<(), AppError> {
        self.session
            .block_on(
                self.cloudformation
                    .create_stack()
                    .stack_name(stack_name)
                    .template_body(INTEGRATION_ROLE_TEMPLATE)
                    .parameters(
                        Parameter::builder()
                            .parameter_key("NewRelicAccountNumber")
                            .parameter_value(account.to_string())
                            .build(),
                    )
                    .parameters(
                        Parameter::builder()
                            .parameter_key("PolicyName")
                            .parameter_value(role_policy.unwrap_or(""))
                            .build(),
                    )
                    .capabilities(Capability::CapabilityNamedIam)
                    .send(),
            )
            .map_err(|err| AppError::CloudError {
                operation: "cloudformation:CreateStack".to_string(),
                details: sdk_error_details(err),
            })?;

        println!("Waiting for stack creation to complete, this may take a minute...");
        self.wait_for_stack(stack_name, StackStatus::CreateComplete)
    }

    /// Poll until the stack reaches `target`, a failure state, or the
    /// attempt limit runs out.
    fn wait_for_stack(&self, stack_name: &str, target: StackStatus) -> Result<(), AppError> {
        for _ in 0..STACK_POLL_ATTEMPTS {
            match self.stack_status(stack_name)? {
                Some(status) if status == target => return Ok(()),
                Some(status) if is_failure_state(&status) => {
                    return Err(AppError::StackStateConflict {
                        stack: stack_name.to_string(),
                        status: status.as_str().to_string(),
                    });
                }
                Some(_) => {}
                // A deleted stack stops being visible by name.
                None if target == StackStatus::DeleteComplete => return Ok(()),
                None => {
                    return Err(AppError::CloudError {
                        operation: "cloudformation:DescribeStacks".to_string(),
                        details: format!("stack '{}' disappeared while waiting", stack_name),
                    });
                }
            }
            std::thread::sleep(STACK_POLL_INTERVAL);
        }
        Err(AppError::CloudError {
            operation: "cloudformation:DescribeStacks".to_string(),
            details: format!("timed out waiting for stack '{}'", stack_name),
        })
    }

    fn sar_template_url(&self) -> Result<String, AppError> {
        println!("Fetching the log-ingestion CloudFormation template");
        let output = self
            .session
            .block_on(
                self.sar
                    .create_cloud_formation_template()
                    .application_id(SAR_APPLICATION_ID)
                    .send(),
            )
            .map_err(|err| AppError::CloudError {
                operation: "serverlessrepo:CreateCloudFormationTemplate".to_string(),
                details: sdk_error_details(err),
            })?;
        output
            .template_url()
            .map(ToOwned::to_owned)
            .ok_or_else(|| AppError::CloudError {
                operation: "serverlessrepo:CreateCloudFormationTemplate".to_string(),
                details: "template URL missing from response".to_string(),
            })
    }

    fn apply_ingest_change_set(
        &self,
        license_key: Option<&LicenseKey>,
        settings: &IngestionUpdate,
        mode: ChangeSetType,
    ) -> Result<(), AppError> {
        let template_url = self.sar_template_url()?;
        let (parameters, capabilities) = ingest_parameters(license_key, settings, &mode);

        let change_set_name =
            format!("{}-{}-{}", INGEST_STACK_NAME, mode.as_str(), Utc::now().timestamp());
        println!("Creating change set: {}", change_set_name);

        let created = self
            .session
            .block_on(
                self.cloudformation
                    .create_change_set()
                    .stack_name(INGEST_STACK_NAME)
                    .template_url(template_url)
                    .set_parameters(Some(parameters))
                    .set_capabilities(if capabilities.is_empty() {
                        None
                    } else {
                        Some(capabilities)
                    })
                    .change_set_type(mode.clone())
                    .change_set_name(&change_set_name)
                    .send(),
            )
            .map_err(|err| AppError::CloudError {
                operation: "cloudformation:CreateChangeSet".to_string(),
                details: sdk_error_details(err),
            })?;

        let change_set_id = created
            .id()
            .map(ToOwned::to_owned)
            .ok_or_else(|| AppError::CloudError {
                operation: "cloudformation:CreateChangeSet".to_string(),
                details: "change set id missing from response".to_string(),
            })?;

        self.exec_change_set(&change_set_id, INGEST_STACK_NAME, &mode)
    }

    fn apply_license_key_change_set(
        &self,
        license_key: &LicenseKey,
        policy_name: Option<&str>,
        mode: ChangeSetType,
    ) -> Result<(), AppError> {
        let mut parameters = Vec::new();
        match policy_name {
            Some(policy) => parameters.push(
                Parameter::builder()
                    .parameter_key("PolicyName")
                    .parameter_value(policy)
                    .build(),
            ),
            None if mode == ChangeSetType::Update => parameters.push(
                Parameter::builder()
                    .parameter_key("PolicyName")
                    .use_previous_value(true)
                    .build(),
            ),
            None => {}
        }
        parameters.push(
            Parameter::builder()
                .parameter_key("LicenseKey")
                .parameter_value(license_key.expose())
                .build(),
        );

        let change_set_name = format!(
            "{}-{}-{}",
            LICENSE_KEY_STACK_NAME,
            mode.as_str(),
            Utc::now().timestamp()
        );
        println!("Creating change set: {}", change_set_name);

        let created = self
            .session
            .block_on(
                self.cloudformation
                    .create_change_set()
                    .stack_name(LICENSE_KEY_STACK_NAME)
                    .template_body(LICENSE_KEY_TEMPLATE)
                    .set_parameters(Some(parameters))
                    .capabilities(Capability::CapabilityNamedIam)
                    .change_set_type(mode.clone())
                    .change_set_name(&change_set_name)
                    .send(),
            )
            .map_err(|err| AppError::CloudError {
                operation: "cloudformation:CreateChangeSet".to_string(),
                details: sdk_error_details(err),
            })?;

        let change_set_id = created
            .id()
            .map(ToOwned::to_owned)
            .ok_or_else(|| AppError::CloudError {
                operation: "cloudformation:CreateChangeSet".to_string(),
                details: "change set id missing from response".to_string(),
            })?;

        self.exec_change_set(&change_set_id, LICENSE_KEY_STACK_NAME, &mode)
    }

    fn exec_change_set(
        &self,
        change_set_id: &str,
        stack_name: &str,
        mode: &ChangeSetType,
    ) -> Result<(), AppError> {
        println!("Waiting for change set creation to complete, this may take a minute...");
        match self.wait_for_change_set(change_set_id)? {
            ChangeSetOutcome::NoChanges => {
                println!("No changes detected");
                return Ok(());
            }
            ChangeSetOutcome::Ready => {}
        }

        self.session
            .block_on(
                self.cloudformation
                    .execute_change_set()
                    .change_set_name(change_set_id)
                    .send(),
            )
            .map_err(|err| AppError::CloudError {
                operation: "cloudformation:ExecuteChangeSet".to_string(),
                details: sdk_error_details(err),
            })?;

        println!("Waiting for change set to finish execution, this may take a minute...");
        let target = match mode {
            ChangeSetType::Create => StackStatus::CreateComplete,
            _ => StackStatus::UpdateComplete,
        };
        self.wait_for_stack(stack_name, target)
    }

    fn wait_for_change_set(&self, change_set_id: &str) -> Result<ChangeSetOutcome, AppError> {
        for _ in 0..CHANGE_SET_POLL_ATTEMPTS {
            let described = self
                .session
                .block_on(
                    self.cloudformation
                        .describe_change_set()
                        .change_set_name(change_set_id)
                        .send(),
                )
                .map_err(|err| AppError::CloudError {
                    operation: "cloudformation:DescribeChangeSet".to_string(),
                    details: sdk_error_details(err),
                })?;

            match described.status() {
                Some(ChangeSetStatus::CreateComplete) => return Ok(ChangeSetOutcome::Ready),
                Some(ChangeSetStatus::Failed) => {
                    let reason = described.status_reason().unwrap_or_default().to_string();
                    if is_empty_change_set(&reason) {
                        return Ok(ChangeSetOutcome::NoChanges);
                    }
                    return Err(AppError::CloudError {
                        operation: "cloudformation:CreateChangeSet".to_string(),
                        details: reason,
                    });
                }
                _ => {}
            }
            std::thread::sleep(CHANGE_SET_POLL_INTERVAL);
        }
        Err(AppError::CloudError {
            operation: "cloudformation:DescribeChangeSet".to_string(),
            details: format!("timed out waiting for change set '{}'", change_set_id),
        })
    }

    /// Delete a stack and wait. Returns `false` when the stack was absent.
    fn remove_stack(&self, stack_name: &str, what: &str) -> Result<bool, AppError> {
        if self.stack_status(stack_name)?.is_none() {
            println!(
                "No {} found in region {}, skipping",
                what,
                self.session.region_display()
            );
            return Ok(false);
        }

        println!("Deleting stack '{}'", stack_name);
        self.session
            .block_on(
                self.cloudformation
                    .delete_stack()
                    .stack_name(stack_name)
                    .send(),
            )
            .map_err(|err| AppError::CloudError {
                operation: "cloudformation:DeleteStack".to_string(),
                details: sdk_error_details(err),
            })?;

        println!("Waiting for stack deletion to complete, this may take a minute...");
        self.wait_for_stack(stack_name, StackStatus::DeleteComplete)?;
        Ok(true)
    }
}

impl IntegrationManager for AwsIntegrationManager {
    fn caller_account_id(&self) -> Result<String, AppError> {
        let identity = self
            .session
            .block_on(self.sts.get_caller_identity().send())
            .map_err(|err| AppError::CloudError {
                operation: "sts:GetCallerIdentity".to_string(),
                details: sdk_error_details(err),
            })?;
        identity
            .account()
            .map(ToOwned::to_owned)
            .ok_or_else(|| AppError::CloudError {
                operation: "sts:GetCallerIdentity".to_string(),
                details: "account id missing from response".to_string(),
            })
    }

    fn create_integration_role(
        &self,
        role_policy: Option<&str>,
        account: AccountId,
    ) -> Result<IntegrationRole, AppError> {
        let role_name = format!("NewRelicLambdaIntegrationRole_{}", account);
        let stack_name = format!("NewRelicLambdaIntegrationRole-{}", account);

        if let Some(role) = self.get_role(&role_name)? {
            println!("The integration role '{}' already exists, skipping", role_name);
            return Ok(role);
        }

        match self.stack_status(&stack_name)? {
            None => {
                self.create_role_stack(&stack_name, role_policy, account)?;
                let role = self.get_role(&role_name)?.ok_or_else(|| AppError::CloudError {
                    operation: "iam:GetRole".to_string(),
                    details: format!("role '{}' missing after stack creation", role_name),
                })?;
                println!("Created role '{}'", role.name);
                Ok(role)
            }
            Some(status) => Err(AppError::StackStateConflict {
                stack: stack_name,
                status: status.as_str().to_string(),
            }),
        }
    }

    fn remove_integration_role(&self, account: AccountId) -> Result<(), AppError> {
        let stack_name = format!("NewRelicLambdaIntegrationRole-{}", account);
        self.remove_stack(&stack_name, "New Relic AWS Lambda integration role")?;
        Ok(())
    }

    fn install_log_ingestion(
        &self,
        license_key: &LicenseKey,
        settings: &IngestionSettings,
    ) -> Result<(), AppError> {
        if self.function_exists(INGEST_FUNCTION_NAME)? {
            println!(
                "The '{}' function already exists in region {}, skipping",
                INGEST_FUNCTION_NAME,
                self.session.region_display()
            );
            return Ok(());
        }

        match self.stack_status(INGEST_STACK_NAME)? {
            None => {
                println!(
                    "Setting up the '{}' function in region: {}",
                    INGEST_FUNCTION_NAME,
                    self.session.region_display()
                );
                self.apply_ingest_change_set(
                    Some(license_key),
                    &settings.as_update(),
                    ChangeSetType::Create,
                )
            }
            Some(status) => Err(AppError::StackStateConflict {
                stack: INGEST_STACK_NAME.to_string(),
                status: status.as_str().to_string(),
            }),
        }
    }

    fn update_log_ingestion(
        &self,
        license_key: Option<&LicenseKey>,
        settings: &IngestionUpdate,
    ) -> Result<(), AppError> {
        if !self.function_exists(INGEST_FUNCTION_NAME)? {
            return Err(AppError::Configuration(format!(
                "No '{}' function in region '{}'. \
                 Run 'newrelic-lambda integrations install' to install it.",
                INGEST_FUNCTION_NAME,
                self.session.region_display()
            )));
        }
        if self.stack_status(INGEST_STACK_NAME)?.is_none() {
            return Err(AppError::Configuration(format!(
                "No '{}' stack in region '{}'. This likely means the log-ingestion \
                 function was installed manually. To manage it with this tool, delete \
                 the function and run 'newrelic-lambda integrations install'.",
                INGEST_STACK_NAME,
                self.session.region_display()
            )));
        }
        self.apply_ingest_change_set(license_key, settings, ChangeSetType::Update)
    }

    fn remove_log_ingestion(&self) -> Result<(), AppError> {
        self.remove_stack(INGEST_STACK_NAME, "New Relic AWS Lambda log ingestion")?;
        Ok(())
    }

    fn install_license_key(
        &self,
        license_key: &LicenseKey,
        policy_name: Option<&str>,
    ) -> Result<(), AppError> {
        if self.stack_status(LICENSE_KEY_STACK_NAME)?.is_some() {
            return Ok(());
        }
        println!(
            "Setting up the {} stack in region: {}",
            LICENSE_KEY_STACK_NAME,
            self.session.region_display()
        );
        self.apply_license_key_change_set(license_key, policy_name, ChangeSetType::Create)
    }

    fn update_license_key(
        &self,
        license_key: &LicenseKey,
        policy_name: Option<&str>,
    ) -> Result<(), AppError> {
        // A missing secret is created rather than updated, so an update run
        // converges older installs that predate the managed secret.
        let mode = if self.stack_status(LICENSE_KEY_STACK_NAME)?.is_none() {
            ChangeSetType::Create
        } else {
            ChangeSetType::Update
        };
        self.apply_license_key_change_set(license_key, policy_name, mode)
    }

    fn remove_license_key(&self) -> Result<(), AppError> {
        self.remove_stack(LICENSE_KEY_STACK_NAME, "New Relic license key secret")?;
        Ok(())
    }
}

enum ChangeSetOutcome {
    Ready,
    NoChanges,
}

/// Build change-set parameters for the log-ingestion stack.
///
/// On CREATE, unset values are omitted so the template defaults apply. On
/// UPDATE, unset values are sent as `UsePreviousValue` so the deployed stack
/// keeps them. A custom function role replaces the stack-managed one, which
/// also drops the need for the IAM capability.
fn ingest_parameters(
    license_key: Option<&LicenseKey>,
    settings: &IngestionUpdate,
    mode: &ChangeSetType,
) -> (Vec<Parameter>, Vec<Capability>) {
    let update_mode = *mode != ChangeSetType::Create;
    let mut parameters = Vec::new();

    let mut push = |key: &str, value: Option<String>| match value {
        Some(value) => parameters.push(
            Parameter::builder()
                .parameter_key(key)
                .parameter_value(value)
                .build(),
        ),
        None if update_mode => parameters.push(
            Parameter::builder()
                .parameter_key(key)
                .use_previous_value(true)
                .build(),
        ),
        None => {}
    };

    push(
        "MemorySize",
        settings.memory_size.map(|size| size.to_string()),
    );
    push(
        "NRLicenseKey",
        license_key.map(|key| key.expose().to_string()),
    );
    push(
        "NRLoggingEnabled",
        settings
            .enable_logs
            .map(|enabled| if enabled { "True" } else { "False" }.to_string()),
    );
    push("Timeout", settings.timeout.map(|timeout| timeout.to_string()));

    let mut capabilities = vec![Capability::CapabilityIam];
    match &settings.role_name {
        Some(role_name) => {
            parameters.push(
                Parameter::builder()
                    .parameter_key("FunctionRole")
                    .parameter_value(role_name)
                    .build(),
            );
            capabilities.clear();
        }
        None if update_mode => {
            parameters.push(
                Parameter::builder()
                    .parameter_key("FunctionRole")
                    .use_previous_value(true)
                    .build(),
            );
            capabilities.clear();
        }
        None => {}
    }

    (parameters, capabilities)
}

fn stack_absent(err: &SdkError<DescribeStacksError>) -> bool {
    use aws_sdk_cloudformation::error::ProvideErrorMetadata;
    matches!(err, SdkError::ServiceError(context)
        if context
            .err()
            .meta()
            .message()
            .is_some_and(|message| message.contains("does not exist")))
}

fn is_failure_state(status: &StackStatus) -> bool {
    matches!(
        status,
        StackStatus::CreateFailed
            | StackStatus::DeleteFailed
            | StackStatus::RollbackComplete
            | StackStatus::RollbackFailed
            | StackStatus::UpdateRollbackComplete
            | StackStatus::UpdateRollbackFailed
    )
}

fn is_empty_change_set(reason: &str) -> bool {
    reason.contains("The submitted information didn't contain changes")
        || reason.contains("No updates are to be performed")
}
