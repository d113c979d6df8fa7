//! Permission preflight backed by the IAM policy simulator.

use std::sync::Arc;

use aws_sdk_iam::types::PolicyEvaluationDecisionType;

use crate::adapters::aws::{AwsSession, sdk_error_details};
use crate::domain::AppError;
use crate::ports::PermissionGate;

/// Actions exercised by `integrations install` and `integrations update`.
const INSTALL_ACTIONS: &[&str] = &[
    "cloudformation:CreateChangeSet",
    "cloudformation:CreateStack",
    "cloudformation:DescribeStacks",
    "cloudformation:ExecuteChangeSet",
    "iam:AttachRolePolicy",
    "iam:CreateRole",
    "iam:GetRole",
    "iam:PassRole",
    "lambda:GetFunction",
    "serverlessrepo:CreateCloudFormationTemplate",
];

/// Actions exercised by `integrations uninstall`.
const UNINSTALL_ACTIONS: &[&str] = &[
    "cloudformation:DeleteStack",
    "cloudformation:DescribeStacks",
    "iam:DeleteRole",
    "iam:DetachRolePolicy",
    "lambda:GetFunction",
];

/// Policy-simulator implementation of [`PermissionGate`].
pub struct IamPermissionGate {
    session: Arc<AwsSession>,
    iam: aws_sdk_iam::Client,
    sts: aws_sdk_sts::Client,
}

impl IamPermissionGate {
    pub fn new(session: Arc<AwsSession>) -> Self {
        let config = session.config();
        Self {
            iam: aws_sdk_iam::Client::new(config),
            sts: aws_sdk_sts::Client::new(config),
            session,
        }
    }

    fn caller_policy_arn(&self) -> Result<String, AppError> {
        let identity = self
            .session
            .block_on(self.sts.get_caller_identity().send())
            .map_err(|err| AppError::CloudError {
                operation: "sts:GetCallerIdentity".to_string(),
                details: sdk_error_details(err),
            })?;
        let arn = identity.arn().ok_or_else(|| AppError::CloudError {
            operation: "sts:GetCallerIdentity".to_string(),
            details: "caller ARN missing from response".to_string(),
        })?;
        Ok(simulatable_arn(arn))
    }

    fn check(&self, actions: &[&str]) -> Result<(), AppError> {
        let source_arn = self.caller_policy_arn()?;
        let response = self
            .session
            .block_on(
                self.iam
                    .simulate_principal_policy()
                    .policy_source_arn(source_arn)
                    .set_action_names(Some(
                        actions.iter().map(|action| action.to_string()).collect(),
                    ))
                    .send(),
            )
            .map_err(|err| AppError::CloudError {
                operation: "iam:SimulatePrincipalPolicy".to_string(),
                details: sdk_error_details(err),
            })?;

        let denied: Vec<String> = response
            .evaluation_results()
            .iter()
            .filter(|result| result.eval_decision() != &PolicyEvaluationDecisionType::Allowed)
            .map(|result| result.eval_action_name().to_string())
            .collect();

        if denied.is_empty() {
            Ok(())
        } else {
            Err(AppError::PermissionsDenied { actions: denied })
        }
    }
}

impl PermissionGate for IamPermissionGate {
    fn ensure_install_permissions(&self) -> Result<(), AppError> {
        self.check(INSTALL_ACTIONS)
    }

    fn ensure_uninstall_permissions(&self) -> Result<(), AppError> {
        self.check(UNINSTALL_ACTIONS)
    }
}

/// Rewrite assumed-role session ARNs to the underlying role ARN.
///
/// The policy simulator rejects `sts` assumed-role ARNs, so
/// `arn:aws:sts::123:assumed-role/MyRole/session` becomes
/// `arn:aws:iam::123:role/MyRole`.
fn simulatable_arn(arn: &str) -> String {
    let mut parts = arn.split(':');
    let _arn = parts.next();
    let _partition = parts.next();
    let service = parts.next();
    let _region = parts.next();
    let account = parts.next();
    let resource = parts.next();

    if let (Some("sts"), Some(account), Some(resource)) = (service, account, resource) {
        if let Some(rest) = resource.strip_prefix("assumed-role/") {
            if let Some((role_name, _session_name)) = rest.split_once('/') {
                return format!("arn:aws:iam::{}:role/{}", account, role_name);
            }
        }
    }
    arn.to_string()
}
