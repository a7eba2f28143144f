use uuid::Uuid;

use crate::entities::token::Claims;
use crate::errors::{AppError, AuthError};
use crate::repositories::shared_access::SharedAccessRepository;

/// The authenticated user performing a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub username: String,
}

impl Actor {
    pub fn new(id: Uuid, username: impl Into<String>) -> Self {
        Actor { id, username: username.into() }
    }

    pub fn from_claims(claims: &Claims) -> Result<Self, AuthError> {
        let id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidUserId)?;
        Ok(Actor::new(id, claims.username.clone()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Any grant at all lets a delegate browse the owner's gallery.
    View,
    Upload,
    Comment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDecision {
    pub allowed: bool,
    /// Name the actor is shown as inside the owner's gallery.
    pub alias: String,
}

/// Decides what an actor may do inside another user's gallery. Read-only.
pub struct AccessEvaluator<R>
where
    R: SharedAccessRepository,
{
    pub grants: R,
}

impl<R> AccessEvaluator<R>
where
    R: SharedAccessRepository,
{
    pub fn new(grants: R) -> Self {
        AccessEvaluator { grants }
    }

    pub async fn authorize(
        &self,
        actor: &Actor,
        owner_id: &Uuid,
        capability: Capability,
    ) -> Result<AccessDecision, AppError> {
        if actor.id == *owner_id {
            return Ok(AccessDecision { allowed: true, alias: actor.username.clone() });
        }

        let Some(grant) = self.grants.find_grant(owner_id, &actor.id).await? else {
            return Ok(AccessDecision { allowed: false, alias: actor.username.clone() });
        };

        let allowed = match capability {
            Capability::View => true,
            Capability::Upload => grant.can_upload,
            Capability::Comment => grant.can_comment,
        };
        let alias = if grant.alias.trim().is_empty() {
            actor.username.clone()
        } else {
            grant.alias
        };

        Ok(AccessDecision { allowed, alias })
    }

    /// Like `authorize`, but a denial is a `ForbiddenAccess` error. Returns the alias.
    pub async fn require(
        &self,
        actor: &Actor,
        owner_id: &Uuid,
        capability: Capability,
    ) -> Result<String, AppError> {
        let decision = self.authorize(actor, owner_id, capability).await?;
        if !decision.allowed {
            tracing::warn!(
                actor_id = %actor.id,
                owner_id = %owner_id,
                ?capability,
                "access denied"
            );
            return Err(AppError::ForbiddenAccess);
        }
        Ok(decision.alias)
    }
}
