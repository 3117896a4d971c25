//! Permission resolution service.
//!
//! Computes the effective permission set for a user by traversing the
//! User -> Group -> Role -> Permission graph, and answers the narrow
//! "may user U do A on M?" question the permission gate asks. Resolved
//! sets are cached per user; every assignment mutation fires the
//! invalidation hook so a check never serves a pre-mutation grant.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::permission::ActionKind;

/// Effective permission set: module name to sorted, deduplicated actions.
pub type PermissionSet = BTreeMap<String, BTreeSet<ActionKind>>;

/// Permission resolution and enforcement queries.
pub struct AccessControlService {
    db: SqlitePool,
    cache: RwLock<HashMap<i64, Arc<PermissionSet>>>,
    // Bumped by invalidate(); a set resolved against an older generation
    // is stale and must not enter the cache.
    generation: AtomicU64,
}

impl AccessControlService {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            cache: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Resolve the effective permission set for a user.
    ///
    /// The graph traversal is a single join filtered by user id; grouping
    /// the flat (module, action) rows by module is a fold over the result,
    /// not a second query. A user with no group memberships resolves to an
    /// empty map.
    pub async fn resolve(&self, user_id: i64) -> Result<Arc<PermissionSet>> {
        if let Some(cached) = self.cached(user_id) {
            return Ok(cached);
        }

        let generation = self.generation.load(Ordering::Acquire);

        let rows: Vec<(String, ActionKind)> = sqlx::query_as(
            r#"
            SELECT DISTINCT m.name, p.action
            FROM permissions p
            JOIN role_permissions rp ON p.id = rp.permission_id
            JOIN group_roles gr ON rp.role_id = gr.role_id
            JOIN user_groups ug ON gr.group_id = ug.group_id
            JOIN modules m ON p.module_id = m.id
            WHERE ug.user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        let resolved = Arc::new(fold_permission_rows(rows));
        self.store(user_id, generation, resolved.clone());

        Ok(resolved)
    }

    /// Check whether a user holds the (module, action) capability.
    ///
    /// Answers from the cached permission set when one exists; otherwise
    /// runs the narrow single-predicate form of the resolve join. Module
    /// matching is case-sensitive and an unknown module name simply yields
    /// false.
    pub async fn check(&self, user_id: i64, module: &str, action: ActionKind) -> Result<bool> {
        if let Some(cached) = self.cached(user_id) {
            return Ok(cached.get(module).is_some_and(|a| a.contains(&action)));
        }

        let allowed: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM permissions p
                JOIN role_permissions rp ON p.id = rp.permission_id
                JOIN group_roles gr ON rp.role_id = gr.role_id
                JOIN user_groups ug ON gr.group_id = ug.group_id
                JOIN modules m ON p.module_id = m.id
                WHERE ug.user_id = ? AND m.name = ? AND p.action = ?
            )
            "#,
        )
        .bind(user_id)
        .bind(module)
        .bind(action)
        .fetch_one(&self.db)
        .await?;

        Ok(allowed)
    }

    /// Whether a module with this exact name is registered.
    ///
    /// The gate uses this to distinguish "capability isn't modeled" (400)
    /// from "you lack it" (403).
    pub async fn module_exists(&self, module: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM modules WHERE name = ?)")
                .bind(module)
                .fetch_one(&self.db)
                .await?;

        Ok(exists)
    }

    /// Invalidation hook fired by every assignment mutation.
    ///
    /// A single group-role or role-permission edge change can alter the
    /// effective set of many users, so the whole cache is dropped rather
    /// than tracking reverse reachability. The generation bump comes
    /// first: an in-flight resolve that already queried pre-mutation rows
    /// will see the newer generation and discard its result.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.cache
            .write()
            .expect("permission cache lock poisoned")
            .clear();
    }

    fn cached(&self, user_id: i64) -> Option<Arc<PermissionSet>> {
        self.cache
            .read()
            .expect("permission cache lock poisoned")
            .get(&user_id)
            .cloned()
    }

    /// Insert a resolved set unless an invalidation landed after it was
    /// computed. Checked under the write lock so a concurrent clear
    /// cannot slip between the comparison and the insert.
    fn store(&self, user_id: i64, generation: u64, resolved: Arc<PermissionSet>) {
        let mut cache = self.cache.write().expect("permission cache lock poisoned");
        if self.generation.load(Ordering::Acquire) == generation {
            cache.insert(user_id, resolved);
        }
    }
}

/// Group flat (module, action) rows into module -> action set.
fn fold_permission_rows(rows: Vec<(String, ActionKind)>) -> PermissionSet {
    rows.into_iter()
        .fold(PermissionSet::new(), |mut acc, (module, action)| {
            acc.entry(module).or_default().insert(action);
            acc
        })
}
