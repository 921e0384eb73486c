use atrium_core::{AppError, AppResult, PrincipalId};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

/// One time-bounded version of a modality goal.
///
/// The (principal, location, modality) key holds exactly one row with
/// `is_current = true`; superseded versions are retired, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalityTarget {
    /// Stable row identifier.
    pub target_id: Uuid,
    /// MLO the goal belongs to.
    pub principal_id: PrincipalId,
    /// Location the goal is scoped to.
    pub location_id: Uuid,
    /// Imaging modality the goal is scoped to.
    pub modality_type_id: Uuid,
    /// Reporting period label, e.g. `"2025"` or `"2025-Q2"`.
    pub target_period: String,
    /// First day the version applies to (inclusive).
    pub period_start: NaiveDate,
    /// Last day the version applies to (inclusive).
    pub period_end: NaiveDate,
    /// Goal for completed scans.
    pub target_scans: i64,
    /// Goal for inbound referrals.
    pub target_referrals: i64,
    /// Goal for generated revenue.
    pub target_revenue: f64,
    /// Version ordinal within the key, starting at 1.
    pub version: i32,
    /// Whether this is the live version for its key.
    pub is_current: bool,
    /// Successor row id once superseded.
    pub superseded_by: Option<Uuid>,
    /// Supersession timestamp in RFC3339.
    pub superseded_at: Option<String>,
}

impl ModalityTarget {
    /// Applies the requested goal changes in place.
    pub fn apply_changes(&mut self, changes: &TargetChanges) {
        if let Some(target_scans) = changes.target_scans {
            self.target_scans = target_scans;
        }
        if let Some(target_referrals) = changes.target_referrals {
            self.target_referrals = target_referrals;
        }
        if let Some(target_revenue) = changes.target_revenue {
            self.target_revenue = target_revenue;
        }
    }

    /// Returns the audit snapshot of the versioned fields.
    #[must_use]
    pub fn values_snapshot(&self) -> Value {
        json!({
            "period_start": self.period_start,
            "period_end": self.period_end,
            "target_scans": self.target_scans,
            "target_referrals": self.target_referrals,
            "target_revenue": self.target_revenue,
            "version": self.version,
        })
    }
}

/// Requested goal updates for one target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetChanges {
    /// New scans goal, if changing.
    pub target_scans: Option<i64>,
    /// New referrals goal, if changing.
    pub target_referrals: Option<i64>,
    /// New revenue goal, if changing.
    pub target_revenue: Option<f64>,
}

impl TargetChanges {
    /// Validates that the update changes something and stays in range.
    pub fn validate(&self) -> AppResult<()> {
        if self.target_scans.is_none()
            && self.target_referrals.is_none()
            && self.target_revenue.is_none()
        {
            return Err(AppError::Validation(
                "target update must change at least one goal value".to_owned(),
            ));
        }

        if self.target_scans.is_some_and(|value| value < 0) {
            return Err(AppError::Validation(
                "target_scans must not be negative".to_owned(),
            ));
        }

        if self.target_referrals.is_some_and(|value| value < 0) {
            return Err(AppError::Validation(
                "target_referrals must not be negative".to_owned(),
            ));
        }

        if self
            .target_revenue
            .is_some_and(|value| !value.is_finite() || value < 0.0)
        {
            return Err(AppError::Validation(
                "target_revenue must be a non-negative number".to_owned(),
            ));
        }

        Ok(())
    }
}

/// Mutation kind recorded in the target audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetAuditAction {
    /// Values changed in place; no history existed to protect.
    Updated,
    /// A new version replaced the row from an effective date onward.
    Superseded,
}

impl TargetAuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Updated => "updated",
            Self::Superseded => "superseded",
        }
    }
}

impl std::str::FromStr for TargetAuditAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "updated" => Ok(Self::Updated),
            "superseded" => Ok(Self::Superseded),
            _ => Err(AppError::Validation(format!(
                "unknown target audit action '{value}'"
            ))),
        }
    }
}

/// Append-only log entry paired with one target mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetAuditRecord {
    /// Stable record identifier.
    pub audit_id: Uuid,
    /// Target row the mutation applied to.
    pub target_id: Uuid,
    /// Owner of the target, denormalized for history filtering.
    pub principal_id: PrincipalId,
    /// Mutation kind.
    pub action: TargetAuditAction,
    /// Administrator who performed the mutation.
    pub changed_by: PrincipalId,
    /// Versioned fields before the mutation.
    pub old_values: Value,
    /// Versioned fields after the mutation.
    pub new_values: Value,
    /// Optional human-readable note.
    pub notes: Option<String>,
    /// Record timestamp in RFC3339.
    pub created_at: String,
}

/// Date boundaries produced by splitting a target period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodSplit {
    /// New last day of the version being superseded.
    pub truncated_end: NaiveDate,
    /// First day of the successor version.
    pub successor_start: NaiveDate,
    /// Last day of the successor version, the original period end.
    pub successor_end: NaiveDate,
}

/// Splits `[period_start, period_end]` at an effective date strictly
/// inside it.
///
/// The two segments are contiguous, non-overlapping, and together cover
/// the original period.
pub fn split_period(
    period_start: NaiveDate,
    period_end: NaiveDate,
    effective_date: NaiveDate,
) -> AppResult<PeriodSplit> {
    if effective_date <= period_start {
        return Err(AppError::Validation(format!(
            "effective date {effective_date} must be after the period start {period_start}"
        )));
    }
    if effective_date > period_end {
        return Err(AppError::Validation(format!(
            "effective date {effective_date} must not be after the period end {period_end}"
        )));
    }

    let truncated_end = effective_date
        .checked_sub_days(Days::new(1))
        .ok_or_else(|| {
            AppError::Validation(format!("effective date {effective_date} is out of range"))
        })?;

    Ok(PeriodSplit {
        truncated_end,
        successor_start: effective_date,
        successor_end: period_end,
    })
}
