//! # Access Policy
//!
//! The single gate every composer runs before reading content: resolve
//! whether the viewer administers the board, then enforce the action's
//! level and point thresholds for everyone else.

use std::sync::Arc;

use domains::{AccessOracle, AppError, BoardAction, BoardConfig, SecretScope, Status, Uid};

/// Outcome of a successful gate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clearance {
    pub viewer_uid: Uid,
    pub is_admin: bool,
}

impl Clearance {
    pub fn secret_scope(&self) -> SecretScope {
        match (self.is_admin, self.viewer_uid) {
            (true, _) => SecretScope::All,
            (false, 0) => SecretScope::None,
            (false, uid) => SecretScope::Writer(uid),
        }
    }

    pub fn can_read(&self, status: Status, writer_uid: Uid) -> bool {
        self.secret_scope().admits(status, writer_uid)
    }

    /// Secret content is readable by its writer and by admins only.
    pub fn check_secret(&self, status: Status, writer_uid: Uid) -> domains::Result<()> {
        if self.can_read(status, writer_uid) {
            Ok(())
        } else {
            Err(AppError::forbidden("secret post"))
        }
    }
}

#[derive(Clone)]
pub struct AccessPolicy {
    oracle: Arc<dyn AccessOracle>,
}

impl AccessPolicy {
    pub fn new(oracle: Arc<dyn AccessOracle>) -> Self {
        Self { oracle }
    }

    /// Site root, then group admin, then board admin. Anonymous viewers are
    /// never admins and cost no lookups.
    pub async fn is_admin(&self, viewer_uid: Uid, config: &BoardConfig) -> domains::Result<bool> {
        if viewer_uid == 0 {
            return Ok(false);
        }
        if self.oracle.is_site_admin(viewer_uid).await? {
            return Ok(true);
        }
        if config.group_uid > 0 && self.oracle.is_group_admin(config.group_uid, viewer_uid).await? {
            return Ok(true);
        }
        Ok(config.uid > 0 && config.admin_uid == viewer_uid)
    }

    /// Admins pass unconditionally. Others need the action's level and, for
    /// charged actions, enough points to cover the charge. Nothing is deducted.
    pub async fn authorize(
        &self,
        viewer_uid: Uid,
        config: &BoardConfig,
        action: BoardAction,
    ) -> domains::Result<Clearance> {
        let is_admin = self.is_admin(viewer_uid, config).await?;
        let clearance = Clearance { viewer_uid, is_admin };
        if is_admin {
            return Ok(clearance);
        }

        let required_level = config.level_for(action);
        let cost = config.point_for(action);
        if required_level == 0 && cost >= 0 {
            return Ok(clearance);
        }

        let (level, point) = if viewer_uid == 0 {
            (0, 0)
        } else {
            self.oracle.level_and_point(viewer_uid).await?
        };
        if level < required_level {
            tracing::debug!(viewer_uid, level, required_level, ?action, "level gate refused");
            return Err(AppError::forbidden("level too low"));
        }
        if cost < 0 && point.saturating_add(cost) < 0 {
            return Err(AppError::forbidden("not enough points"));
        }
        Ok(clearance)
    }
}
