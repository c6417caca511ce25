//! Reserved annotation and label keys stamped on generated objects.

/// Server-assigned secret-store identifier. A client-supplied value is
/// rejected on create.
pub const ANNOTATION_ID: &str = "bosun.dev/id";

/// Audit timestamps, RFC 3339 UTC.
pub const ANNOTATION_CREATED_AT: &str = "bosun.dev/created-at";
pub const ANNOTATION_UPDATED_AT: &str = "bosun.dev/updated-at";
pub const ANNOTATION_LAST_SYNCED: &str = "bosun.dev/last-synced";

/// Application metadata carried on descriptor files.
pub const ANNOTATION_APP_CODE: &str = "bosun.dev/app-code";
pub const ANNOTATION_DESCRIPTION: &str = "bosun.dev/description";

/// The default destination server recorded on a project's AppProject.
pub const ANNOTATION_DEFAULT_DEST_SERVER: &str = "bosun.dev/default-dest-server";

/// ArgoCD ordering/pruning annotations.
pub const ANNOTATION_SYNC_WAVE: &str = "argocd.argoproj.io/sync-wave";
pub const ANNOTATION_SYNC_OPTIONS: &str = "argocd.argoproj.io/sync-options";

/// Labels on every generated object.
pub const LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";
pub const LABEL_NAME: &str = "app.kubernetes.io/name";
pub const MANAGED_BY: &str = "bosun";
