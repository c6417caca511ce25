//! bosun core library — domain types, layout conventions, reserved keys.
//!
//! Public API surface:
//! - [`types`] — newtypes, descriptor files, response entities
//! - [`layout`] — [`Layout`] path conventions and [`AppLayout`]
//! - [`keys`] — reserved annotation/label keys

pub mod keys;
pub mod layout;
pub mod types;

pub use layout::{AppLayout, Layout};
pub use types::{
    AppConfig, AppDirConfig, AppInstantiation, AppName, Application, ClusterConfig, DeployTarget,
    InstallMode, ProjectName, ResourceKind, RuntimeStatus, SourceKind, SourceRef, StoreId,
    TenantDetail, TenantSummary,
};
