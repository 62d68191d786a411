//! Domain services. Each operation checks out one pooled connection and runs
//! its repository calls on it.

pub mod defects;
pub mod execution;
pub mod settings;

pub use self::defects::DefectService;
pub use self::execution::{ExecutionService, FinishRequest, TestRunResult};
pub use self::settings::{SettingsService, UserSettingType};
