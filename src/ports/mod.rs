mod confirmation;
mod integration_manager;
mod permission_gate;
mod platform_api;

pub use confirmation::ConfirmationPrompt;
pub use integration_manager::{IntegrationManager, IntegrationRole};
pub use permission_gate::PermissionGate;
pub use platform_api::{LinkedAccount, PlatformApi};
