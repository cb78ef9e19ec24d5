//! Scope resolution — translating an authenticated session into the
//! per-request `QueryContext`.
//!
//! The server boundary verifies tokens and builds a [`Session`] from claims;
//! core logic never reads raw credentials. There is no implicit or
//! thread-local identity anywhere in the codebase.

use serde::Deserialize;

use crate::error::CostwatchError;
use crate::types::OrgId;

/// Role granting cross-organization (global) scope.
pub const SUPERADMIN_ROLE: &str = "superadmin";

// ── Session ───────────────────────────────────────────────────

/// Verified caller identity plus organization memberships, as attested by
/// the auth provider. Built once per request at the server boundary.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub display_name: Option<String>,
    pub roles: Vec<String>,
    /// Organizations the caller belongs to, in membership order.
    pub org_memberships: Vec<OrgId>,
    /// The caller's currently selected organization, if any.
    pub active_org_id: Option<OrgId>,
}

/// Claims shape expected from the identity provider.
/// Deserialized by the server JWT middleware.
#[derive(Debug, Deserialize)]
pub struct SessionClaims {
    pub sub: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub roles: Option<Vec<String>>,
    #[serde(default)]
    pub orgs: Option<Vec<String>>,
    #[serde(default)]
    pub active_org: Option<String>,
}

impl Session {
    /// Construct from validated JWT claims at the server boundary.
    pub fn from_claims(claims: &SessionClaims) -> Result<Self, CostwatchError> {
        let user_id = claims
            .sub
            .clone()
            .ok_or_else(|| CostwatchError::Unauthorized("missing sub claim".into()))?;
        Ok(Self {
            user_id,
            display_name: claims.name.clone(),
            roles: claims.roles.clone().unwrap_or_default(),
            org_memberships: claims
                .orgs
                .clone()
                .unwrap_or_default()
                .into_iter()
                .map(OrgId)
                .collect(),
            active_org_id: claims.active_org.clone().map(OrgId),
        })
    }

    /// Construct explicitly for in-process use (tests, background jobs).
    /// Caller is responsible for populating roles and memberships correctly.
    pub fn in_process(user_id: impl Into<String>, roles: Vec<String>, orgs: Vec<OrgId>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: None,
            roles,
            org_memberships: orgs,
            active_org_id: None,
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_superadmin(&self) -> bool {
        self.has_role(SUPERADMIN_ROLE)
    }
}

// ── QueryContext ──────────────────────────────────────────────

/// Breadth of organizations a caller may query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Restricted to specific organizations.
    Org,
    /// May query across all organizations.
    Global,
}

/// The set of organizations a context may reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrgs {
    /// Unrestricted — only valid under [`Scope::Global`].
    All,
    /// Ordered membership list; non-empty under [`Scope::Org`].
    Only(Vec<OrgId>),
}

impl AllowedOrgs {
    pub fn contains(&self, org: &OrgId) -> bool {
        match self {
            Self::All => true,
            Self::Only(orgs) => orgs.contains(org),
        }
    }

    pub fn first(&self) -> Option<&OrgId> {
        match self {
            Self::All => None,
            Self::Only(orgs) => orgs.first(),
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        matches!(self, Self::All)
    }
}

/// Per-request authorization context. Immutable once constructed; rebuilt
/// on every request so it reflects live membership state — never cached.
#[derive(Debug, Clone)]
pub struct QueryContext {
    pub scope: Scope,
    pub allowed_orgs: AllowedOrgs,
    pub can_compare_orgs: bool,
    /// Audit/personalization metadata — never an authorization input.
    pub caller_id: String,
    pub caller_display_name: Option<String>,
    pub active_org_id: Option<OrgId>,
}

impl QueryContext {
    /// Single-organization scope. `allowed` must be non-empty; callers go
    /// through [`resolve_context`], which guarantees it.
    pub fn org_scoped(
        caller_id: impl Into<String>,
        caller_display_name: Option<String>,
        allowed: Vec<OrgId>,
        active_org_id: Option<OrgId>,
    ) -> Self {
        debug_assert!(!allowed.is_empty(), "ORG scope requires at least one org");
        Self {
            scope: Scope::Org,
            allowed_orgs: AllowedOrgs::Only(allowed),
            can_compare_orgs: false,
            caller_id: caller_id.into(),
            caller_display_name,
            active_org_id,
        }
    }

    /// Cross-organization scope, unrestricted.
    pub fn global(
        caller_id: impl Into<String>,
        caller_display_name: Option<String>,
        active_org_id: Option<OrgId>,
    ) -> Self {
        Self {
            scope: Scope::Global,
            allowed_orgs: AllowedOrgs::All,
            can_compare_orgs: true,
            caller_id: caller_id.into(),
            caller_display_name,
            active_org_id,
        }
    }

    /// Tenant-isolation predicate: may this context read `org`'s data?
    pub fn may_access(&self, org: &OrgId) -> bool {
        match self.scope {
            Scope::Global => true,
            Scope::Org => self.allowed_orgs.contains(org),
        }
    }

    /// Organization used when a template's `orgId` parameter is omitted:
    /// the active organization, else the first allowed one. `None` for an
    /// unrestricted context with no active organization — callers must then
    /// supply `orgId` explicitly.
    pub fn default_org(&self) -> Option<&OrgId> {
        self.active_org_id.as_ref().or_else(|| self.allowed_orgs.first())
    }
}

// ── Resolution ────────────────────────────────────────────────

/// Translate a session's current membership state into a `QueryContext`.
///
/// Pure function of the session; no side effects. Must be called fresh per
/// request — memberships can change between requests.
///
/// Returns `None` when the principal has neither an elevated role nor any
/// organization membership. Authorization failure is an expected case here,
/// not exceptional control flow; the caller surfaces the error.
pub fn resolve_context(session: &Session) -> Option<QueryContext> {
    if session.is_superadmin() {
        return Some(QueryContext::global(
            session.user_id.clone(),
            session.display_name.clone(),
            session.active_org_id.clone(),
        ));
    }

    if session.org_memberships.is_empty() {
        tracing::debug!(
            user = %session.user_id,
            "no resolvable scope: no memberships and no elevated role"
        );
        return None;
    }

    // An active org outside the membership list is stale claim data; fall
    // back to the first membership rather than widening access.
    let active = session
        .active_org_id
        .clone()
        .filter(|org| session.org_memberships.contains(org))
        .or_else(|| session.org_memberships.first().cloned());

    Some(QueryContext::org_scoped(
        session.user_id.clone(),
        session.display_name.clone(),
        session.org_memberships.clone(),
        active,
    ))
}
