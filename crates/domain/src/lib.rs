//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod access;
mod directory;
mod target;

pub use access::{
    AdminCapability, AuditAction, EffectivePermission, OverrideChange, PermissionDefinition,
    PermissionEffect, PermissionSource, RolePermissionRule, UserPermissionOverride,
};
pub use directory::DirectoryMember;
pub use target::{
    ModalityTarget, PeriodSplit, TargetAuditAction, TargetAuditRecord, TargetChanges, split_period,
};
