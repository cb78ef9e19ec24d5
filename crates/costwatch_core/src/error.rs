use thiserror::Error;

use crate::registry::TemplateName;
use crate::types::OrgId;

/// Error taxonomy for the assistant query core.
///
/// Every failure crossing the core boundary is one of these values — nothing
/// from the store layer or the session layer propagates past the executor as
/// a raw error.
#[derive(Debug, Error)]
pub enum CostwatchError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("unknown template: {0}")]
    UnknownTemplate(String),

    #[error("template {0} is not available in this scope")]
    TemplateUnavailable(TemplateName),

    #[error("access denied to organization {0}")]
    OrgAccessDenied(OrgId),

    #[error("no organization in scope for template {0}")]
    NoOrgInScope(TemplateName),

    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    // Message is deliberately opaque — the underlying cause is logged
    // server-side, never echoed to callers.
    #[error("query execution failed")]
    Fetch(#[source] anyhow::Error),
}

impl CostwatchError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::UnknownTemplate(_) => 404,
            Self::TemplateUnavailable(_) | Self::OrgAccessDenied(_) => 403,
            Self::NoOrgInScope(_) | Self::InvalidParams(_) => 400,
            Self::Fetch(_) => 500,
        }
    }

    /// Denials worth distinguishing in logs — a foreign `orgId` or a
    /// scope-gated template may indicate a probing attempt rather than a
    /// malformed request.
    pub fn is_security_denial(&self) -> bool {
        matches!(
            self,
            Self::TemplateUnavailable(_) | Self::OrgAccessDenied(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── http_status: exhaustive variant coverage ──────────────────

    #[test]
    fn http_status_unauthorized() {
        assert_eq!(CostwatchError::Unauthorized("x".into()).http_status(), 401);
    }

    #[test]
    fn http_status_unknown_template() {
        assert_eq!(
            CostwatchError::UnknownTemplate("x".into()).http_status(),
            404
        );
    }

    #[test]
    fn http_status_template_unavailable() {
        assert_eq!(
            CostwatchError::TemplateUnavailable(TemplateName::CrossOrgSpending).http_status(),
            403
        );
    }

    #[test]
    fn http_status_org_access_denied() {
        assert_eq!(
            CostwatchError::OrgAccessDenied(OrgId::from("org-b")).http_status(),
            403
        );
    }

    #[test]
    fn http_status_no_org_in_scope() {
        assert_eq!(
            CostwatchError::NoOrgInScope(TemplateName::CurrentPrice).http_status(),
            400
        );
    }

    #[test]
    fn http_status_invalid_params() {
        assert_eq!(CostwatchError::InvalidParams("x".into()).http_status(), 400);
    }

    #[test]
    fn http_status_fetch() {
        let err = CostwatchError::Fetch(anyhow::anyhow!("pool exhausted"));
        assert_eq!(err.http_status(), 500);
    }

    // ── Display ─────────────────────────────────────────────────

    #[test]
    fn display_unknown_template() {
        let e = CostwatchError::UnknownTemplate("price_of_tea".into());
        assert_eq!(e.to_string(), "unknown template: price_of_tea");
    }

    #[test]
    fn display_org_access_denied() {
        let e = CostwatchError::OrgAccessDenied(OrgId::from("org-b"));
        assert_eq!(e.to_string(), "access denied to organization org-b");
    }

    #[test]
    fn display_fetch_is_opaque() {
        let e = CostwatchError::Fetch(anyhow::anyhow!("connection refused to 10.0.0.3:5432"));
        assert_eq!(e.to_string(), "query execution failed");
    }

    // ── Security classification ──────────────────────────────────

    #[test]
    fn security_denials_classified() {
        assert!(CostwatchError::OrgAccessDenied(OrgId::from("org-b")).is_security_denial());
        assert!(
            CostwatchError::TemplateUnavailable(TemplateName::CrossOrgItemPrices)
                .is_security_denial()
        );
        assert!(!CostwatchError::InvalidParams("x".into()).is_security_denial());
        assert!(!CostwatchError::UnknownTemplate("x".into()).is_security_denial());
    }
}
