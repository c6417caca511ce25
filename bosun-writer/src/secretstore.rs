//! Secret-store operations.
//!
//! Stores are `ss-<id>.yaml` files under the meta repository's
//! cluster-resources tree, one per store, keyed by a server-assigned
//! UUID carried in the `bosun.dev/id` annotation next to three audit
//! timestamps. Update is read-patch-recreate with the force flag, so
//! every write path funnels through create.

use bosun_core::keys;
use bosun_core::types::StoreId;
use bosun_manifest::{SecretStore, KIND_SECRET_STORE};
use bosun_repo::{CloneMode, RepoFs};
use chrono::{SecondsFormat, Utc};
use uuid::Uuid;

use crate::error::WriterError;
use crate::RepoWriter;

/// Partial update; only present fields change.
#[derive(Debug, Clone, Default)]
pub struct StorePatch {
    pub name: Option<String>,
    pub server: Option<String>,
    pub path: Option<String>,
    pub auth: Option<serde_yaml::Value>,
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl RepoWriter {
    /// Creates a secret store. Without `force` the store must not carry
    /// an identifier (ids are assigned here) and an existing file for the
    /// assigned id is a conflict; with `force` the existing file is
    /// overwritten, which is how update persists.
    pub fn create_secret_store(
        &self,
        mut store: SecretStore,
        force: bool,
    ) -> Result<SecretStore, WriterError> {
        if !store.is_vault_only() {
            return Err(WriterError::UnsupportedProvider);
        }
        if !force && store.id().is_some() {
            return Err(WriterError::ClientSuppliedId);
        }
        if store.id().is_none() {
            let stamp = now();
            store.set_annotation(keys::ANNOTATION_ID, Uuid::new_v4().to_string());
            store.set_annotation(keys::ANNOTATION_CREATED_AT, stamp.clone());
            store.set_annotation(keys::ANNOTATION_UPDATED_AT, stamp.clone());
            store.set_annotation(keys::ANNOTATION_LAST_SYNCED, stamp);
        }
        let id = store.id().map(str::to_owned).unwrap_or_default();

        let meta = self.open_meta(CloneMode::Write)?;
        let file = self
            .layout
            .secret_store_file(&self.layout.default_context, &id);
        if !force && meta.fs.exists(&file) {
            return Err(WriterError::StoreExists { id });
        }

        meta.fs.write(&file, store.to_yaml()?)?;
        let revision = meta
            .repo
            .persist(&format!("chore: added secret store '{}'", store.name()))?;
        tracing::info!(store = store.name(), id = id.as_str(), %revision, "added secret store");
        Ok(store)
    }

    /// Applies the present fields of the patch, stamps `updated-at`, and
    /// re-creates with force.
    pub fn update_secret_store(
        &self,
        id: &StoreId,
        patch: &StorePatch,
    ) -> Result<SecretStore, WriterError> {
        let meta = self.open_meta(CloneMode::Read)?;
        let mut store = self.read_store(&meta.fs, id)?;

        if let Some(name) = &patch.name {
            store.metadata.name = name.clone();
        }
        if let Some(vault) = store.spec.provider.vault.as_mut() {
            if let Some(server) = &patch.server {
                vault.server = server.clone();
            }
            if let Some(path) = &patch.path {
                vault.path = Some(path.clone());
            }
            if let Some(auth) = &patch.auth {
                vault.auth = auth.clone();
            }
        }
        store.set_annotation(keys::ANNOTATION_UPDATED_AT, now());

        self.create_secret_store(store, true)
    }

    /// Idempotent: deleting an absent store succeeds without a push.
    pub fn delete_secret_store(&self, id: &StoreId) -> Result<Option<String>, WriterError> {
        let meta = self.open_meta(CloneMode::Write)?;
        let file = self
            .layout
            .secret_store_file(&self.layout.default_context, &id.0);
        if !meta.fs.exists(&file) {
            tracing::debug!(id = id.0.as_str(), "secret store already absent");
            return Ok(None);
        }
        meta.fs.remove_file(&file)?;
        let revision = meta
            .repo
            .persist(&format!("chore: deleted secret store '{}'", id.0))?;
        tracing::info!(id = id.0.as_str(), %revision, "deleted secret store");
        Ok(Some(revision))
    }

    /// Lists every parseable store, skipping files that are not valid
    /// SecretStore documents rather than failing the whole listing.
    pub fn list_secret_stores(&self) -> Result<Vec<SecretStore>, WriterError> {
        let meta = self.open_meta(CloneMode::Read)?;
        let pattern = self
            .layout
            .secret_store_glob(&self.layout.default_context);
        let mut stores = Vec::new();
        for path in meta.fs.glob(&pattern)? {
            let text = meta.fs.read_to_string(&path)?;
            let store = match SecretStore::parse(&text) {
                Ok(store) => store,
                Err(err) => {
                    tracing::warn!(file = %path.display(), error = %err, "skipping unparseable secret store");
                    continue;
                }
            };
            if store.kind != KIND_SECRET_STORE {
                tracing::warn!(file = %path.display(), kind = store.kind.as_str(), "skipping non-store document");
                continue;
            }
            stores.push(store);
        }
        Ok(stores)
    }

    pub fn get_secret_store(&self, id: &StoreId) -> Result<SecretStore, WriterError> {
        let meta = self.open_meta(CloneMode::Read)?;
        self.read_store(&meta.fs, id)
    }

    fn read_store(&self, fs: &RepoFs, id: &StoreId) -> Result<SecretStore, WriterError> {
        let file = self
            .layout
            .secret_store_file(&self.layout.default_context, &id.0);
        if !fs.exists(&file) {
            return Err(WriterError::StoreNotFound { id: id.0.clone() });
        }
        let store = SecretStore::parse(&fs.read_to_string(&file)?)?;
        if store.kind != KIND_SECRET_STORE {
            return Err(WriterError::StoreNotFound { id: id.0.clone() });
        }
        Ok(store)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{FakeOpener, META_URL};
    use bosun_manifest::VaultProvider;
    use bosun_repo::RepoRef;
    use std::sync::Arc;

    fn writer(opener: &Arc<FakeOpener>) -> RepoWriter {
        RepoWriter::new(opener.clone(), RepoRef::new(META_URL))
    }

    fn vault_store(name: &str) -> SecretStore {
        SecretStore::new(
            name,
            VaultProvider {
                server: "https://vault.example.com".into(),
                path: Some("secret".into()),
                version: "v2".into(),
                auth: serde_yaml::Value::Null,
            },
        )
    }

    /// Parses as the store shape but carries a foreign kind.
    const OTHER_KIND_DOC: &[u8] = b"\
apiVersion: v1
kind: ConfigMap
metadata:
  name: cm
spec:
  provider:
    vault:
      server: https://vault.example.com
";

    #[test]
    fn create_assigns_id_and_audit_timestamps() {
        let opener = FakeOpener::new();
        let writer = writer(&opener);

        let stored = writer.create_secret_store(vault_store("creds"), false).unwrap();
        let id = stored.id().unwrap().to_string();
        assert_eq!(Uuid::parse_str(&id).unwrap().get_version_num(), 4);

        let created = &stored.metadata.annotations[keys::ANNOTATION_CREATED_AT];
        assert_eq!(
            created,
            &stored.metadata.annotations[keys::ANNOTATION_UPDATED_AT]
        );
        assert_eq!(
            created,
            &stored.metadata.annotations[keys::ANNOTATION_LAST_SYNCED]
        );
        assert!(created.ends_with('Z'));

        let fs = opener.seed_fs(META_URL);
        let file = format!("bootstrap/cluster-resources/in-cluster/ss-{}.yaml", id);
        assert!(fs.exists(&file));
        assert_eq!(
            opener.persisted(META_URL),
            vec!["chore: added secret store 'creds'".to_string()]
        );
    }

    #[test]
    fn client_supplied_id_is_rejected() {
        let opener = FakeOpener::new();
        let writer = writer(&opener);

        let mut store = vault_store("creds");
        store.set_annotation(keys::ANNOTATION_ID, "my-own-id");
        let err = writer.create_secret_store(store, false).unwrap_err();
        assert!(matches!(err, WriterError::ClientSuppliedId));
        assert!(opener.persisted(META_URL).is_empty());
    }

    #[test]
    fn non_vault_provider_is_rejected() {
        let opener = FakeOpener::new();
        let writer = writer(&opener);

        let text = "\
apiVersion: external-secrets.io/v1beta1
kind: SecretStore
metadata:
  name: aws-ps
spec:
  provider:
    aws:
      region: eu-west-1
";
        let store = SecretStore::parse(text).unwrap();
        let err = writer.create_secret_store(store, false).unwrap_err();
        assert!(matches!(err, WriterError::UnsupportedProvider));
    }

    #[test]
    fn update_patches_only_present_fields() {
        let opener = FakeOpener::new();
        let writer = writer(&opener);

        let stored = writer.create_secret_store(vault_store("creds"), false).unwrap();
        let id = StoreId::from(stored.id().unwrap());
        let created_at = stored.metadata.annotations[keys::ANNOTATION_CREATED_AT].clone();

        let patch = StorePatch {
            server: Some("https://vault-2.example.com".to_string()),
            ..StorePatch::default()
        };
        let updated = writer.update_secret_store(&id, &patch).unwrap();

        assert_eq!(updated.name(), "creds");
        assert_eq!(updated.id(), Some(id.0.as_str()));
        let vault = updated.spec.provider.vault.as_ref().unwrap();
        assert_eq!(vault.server, "https://vault-2.example.com");
        assert_eq!(vault.path.as_deref(), Some("secret"));
        assert_eq!(
            updated.metadata.annotations[keys::ANNOTATION_CREATED_AT],
            created_at
        );

        let read_back = writer.get_secret_store(&id).unwrap();
        assert_eq!(read_back, updated);
    }

    #[test]
    fn update_of_a_missing_store_is_not_found() {
        let opener = FakeOpener::new();
        let writer = writer(&opener);

        let err = writer
            .update_secret_store(&StoreId::from("nope"), &StorePatch::default())
            .unwrap_err();
        assert!(matches!(err, WriterError::StoreNotFound { .. }));
    }

    #[test]
    fn delete_is_idempotent() {
        let opener = FakeOpener::new();
        let writer = writer(&opener);

        let stored = writer.create_secret_store(vault_store("creds"), false).unwrap();
        let id = StoreId::from(stored.id().unwrap());

        let revision = writer.delete_secret_store(&id).unwrap();
        assert!(revision.is_some());
        assert_eq!(
            opener.persisted(META_URL).last().unwrap(),
            &format!("chore: deleted secret store '{}'", id.0)
        );

        let pushes = opener.persisted(META_URL).len();
        let revision = writer.delete_secret_store(&id).unwrap();
        assert!(revision.is_none());
        assert_eq!(opener.persisted(META_URL).len(), pushes);
    }

    #[test]
    fn list_skips_files_that_are_not_stores() {
        let opener = FakeOpener::new();
        let writer = writer(&opener);
        let fs = opener.seed_fs(META_URL);

        writer.create_secret_store(vault_store("creds"), false).unwrap();
        fs.write(
            "bootstrap/cluster-resources/in-cluster/ss-junk.yaml",
            b": not yaml [",
        )
        .unwrap();
        fs.write(
            "bootstrap/cluster-resources/in-cluster/ss-other.yaml",
            OTHER_KIND_DOC,
        )
        .unwrap();

        let stores = writer.list_secret_stores().unwrap();
        assert_eq!(stores.len(), 1);
        assert_eq!(stores[0].name(), "creds");
    }

    #[test]
    fn get_rejects_a_non_store_document() {
        let opener = FakeOpener::new();
        let writer = writer(&opener);
        let fs = opener.seed_fs(META_URL);
        fs.write("bootstrap/cluster-resources/in-cluster/ss-x.yaml", OTHER_KIND_DOC)
            .unwrap();

        let err = writer.get_secret_store(&StoreId::from("x")).unwrap_err();
        assert!(matches!(err, WriterError::StoreNotFound { .. }));
    }
}
