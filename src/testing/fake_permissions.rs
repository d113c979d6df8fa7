use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::domain::AppError;
use crate::ports::PermissionGate;

/// Counting fake for the permission preflight.
#[derive(Clone)]
pub struct FakePermissionGate {
    pub install_checks: Arc<AtomicUsize>,
    pub uninstall_checks: Arc<AtomicUsize>,
    pub denied_actions: Option<Vec<String>>,
}

impl FakePermissionGate {
    pub fn new() -> Self {
        Self {
            install_checks: Arc::new(AtomicUsize::new(0)),
            uninstall_checks: Arc::new(AtomicUsize::new(0)),
            denied_actions: None,
        }
    }

    pub fn denying(actions: &[&str]) -> Self {
        Self {
            denied_actions: Some(actions.iter().map(|s| s.to_string()).collect()),
            ..Self::new()
        }
    }

    pub fn install_check_count(&self) -> usize {
        self.install_checks.load(Ordering::SeqCst)
    }

    pub fn uninstall_check_count(&self) -> usize {
        self.uninstall_checks.load(Ordering::SeqCst)
    }

    fn outcome(&self) -> Result<(), AppError> {
        match &self.denied_actions {
            Some(actions) => Err(AppError::PermissionsDenied {
                actions: actions.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl PermissionGate for FakePermissionGate {
    fn ensure_install_permissions(&self) -> Result<(), AppError> {
        self.install_checks.fetch_add(1, Ordering::SeqCst);
        self.outcome()
    }

    fn ensure_uninstall_permissions(&self) -> Result<(), AppError> {
        self.uninstall_checks.fetch_add(1, Ordering::SeqCst);
        self.outcome()
    }
}
