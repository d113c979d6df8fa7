//! Recording fakes for command-level tests.

mod fake_manager;
mod fake_permissions;
mod fake_platform;
mod scripted_prompt;

pub use fake_manager::{FakeIntegrationManager, ManagerCall};
pub use fake_permissions::FakePermissionGate;
pub use fake_platform::{FakePlatformApi, PlatformCall};
pub use scripted_prompt::ScriptedPrompt;
