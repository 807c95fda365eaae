use std::collections::HashSet;

use chrono::Utc;
use tracing::{info, warn};

use crate::game_manager::storage_error;
use game_core::{PinPolicy, has_secondary_prefix};
use game_persistence::repositories::LinkRepository;
use game_types::{GameError, Identity, LinkPin, LinkStatus, LinkedAccount, PinIssued, UnlinkSummary};

/// PIN based pairing of a primary (app) identity with a secondary
/// (voice assistant) identity.
pub struct LinkManager {
    links: LinkRepository,
    policy: PinPolicy,
    secondary_prefix: String,
}

impl LinkManager {
    pub fn new(links: LinkRepository, secondary_prefix: impl Into<String>) -> Self {
        Self::with_policy(links, PinPolicy::default(), secondary_prefix)
    }

    pub fn with_policy(
        links: LinkRepository,
        policy: PinPolicy,
        secondary_prefix: impl Into<String>,
    ) -> Self {
        Self {
            links,
            policy,
            secondary_prefix: secondary_prefix.into(),
        }
    }

    /// Replace any PIN the caller already holds with a fresh one.
    pub async fn generate_pin(&self, identity: &Identity) -> Result<PinIssued, GameError> {
        if !identity.is_authenticated() {
            return Err(GameError::AuthenticationRequired);
        }

        let owner = identity.id.as_str();

        let replaced: Vec<String> = self
            .links
            .pins_for_owner(owner)
            .await
            .map_err(storage_error("Failed to load existing PINs"))?
            .into_iter()
            .map(|pin| pin.code)
            .collect();

        if !replaced.is_empty() {
            self.links
                .delete_pins_for_owner(owner)
                .await
                .map_err(storage_error("Failed to delete existing PINs"))?;
        }

        let mut taken: HashSet<String> = self
            .links
            .all_pin_codes()
            .await
            .map_err(storage_error("Failed to load PIN codes"))?
            .into_iter()
            .collect();
        taken.extend(replaced);

        let code = self
            .policy
            .generate_code(&mut rand::rng(), |code| taken.contains(code))
            .ok_or(GameError::PinGenerationFailed)?;

        let pin = LinkPin {
            code,
            owner_identity: owner.to_string(),
            created_at: Utc::now(),
        };

        self.links
            .insert_pin(&pin)
            .await
            .map_err(storage_error("Failed to store PIN"))?;

        info!("Issued link PIN for {}", owner);

        Ok(PinIssued {
            expires_in_seconds: self.policy.validity.num_seconds(),
            expires_at: self.policy.expires_at(&pin),
            pin: pin.code,
        })
    }

    /// Redeem a PIN on behalf of `secondary_identity`. PINs are single use.
    pub async fn validate_pin_and_link(
        &self,
        code: &str,
        secondary_identity: &str,
    ) -> Result<LinkedAccount, GameError> {
        let code = code.trim();

        let pin = self
            .links
            .find_pin(code)
            .await
            .map_err(storage_error("Failed to look up PIN"))?
            .ok_or(GameError::InvalidPin)?;

        let now = Utc::now();
        if self.policy.is_expired(&pin, now) {
            warn!("Rejected expired PIN owned by {}", pin.owner_identity);
            self.links
                .delete_pin(code)
                .await
                .map_err(storage_error("Failed to delete expired PIN"))?;
            return Err(GameError::ExpiredPin);
        }

        let link = LinkedAccount {
            secondary_identity: secondary_identity.to_string(),
            primary_identity: pin.owner_identity,
            linked_at: now,
        };

        self.links
            .upsert_link(&link)
            .await
            .map_err(storage_error("Failed to store account link"))?;
        self.links
            .delete_pin(code)
            .await
            .map_err(storage_error("Failed to consume PIN"))?;

        info!(
            "Linked {} to {}",
            link.secondary_identity, link.primary_identity
        );

        Ok(link)
    }

    pub async fn unlink(&self, identity: &Identity) -> Result<UnlinkSummary, GameError> {
        if !identity.is_authenticated() {
            return Err(GameError::AuthenticationRequired);
        }

        let existing = self
            .links
            .find_links_by_primary(&identity.id)
            .await
            .map_err(storage_error("Failed to load account links"))?;

        if existing.is_empty() {
            return Err(GameError::NoLinkExists);
        }

        let (links_removed, pins_removed) = self
            .links
            .unlink_primary(&identity.id)
            .await
            .map_err(storage_error("Failed to unlink accounts"))?;

        info!(
            "Unlinked {}: {} links, {} pending PINs removed",
            identity.id, links_removed, pins_removed
        );

        Ok(UnlinkSummary {
            links_removed,
            pins_removed,
        })
    }

    /// The identity games and statistics are stored under. Secondary
    /// identities are used as-is; a linked primary identity maps to its most
    /// recently linked secondary identity.
    pub async fn effective_identity(&self, identity: &str) -> Result<String, GameError> {
        if has_secondary_prefix(identity, &self.secondary_prefix) {
            return Ok(identity.to_string());
        }

        let as_secondary = self
            .links
            .find_link_by_secondary(identity)
            .await
            .map_err(storage_error("Failed to resolve identity"))?;
        if as_secondary.is_some() {
            return Ok(identity.to_string());
        }

        let links = self
            .links
            .find_links_by_primary(identity)
            .await
            .map_err(storage_error("Failed to resolve identity"))?;

        Ok(links
            .into_iter()
            .next()
            .map(|link| link.secondary_identity)
            .unwrap_or_else(|| identity.to_string()))
    }

    pub async fn link_status(&self, identity: &str) -> Result<LinkStatus, GameError> {
        let as_primary = self
            .links
            .find_links_by_primary(identity)
            .await
            .map_err(storage_error("Failed to load link status"))?
            .into_iter()
            .next();

        let link = match as_primary {
            Some(link) => Some(link),
            None => self
                .links
                .find_link_by_secondary(identity)
                .await
                .map_err(storage_error("Failed to load link status"))?,
        };

        Ok(match link {
            Some(link) => LinkStatus {
                linked: true,
                secondary_identity: Some(link.secondary_identity),
                primary_identity: Some(link.primary_identity),
                linked_at: Some(link.linked_at),
            },
            None => LinkStatus {
                linked: false,
                secondary_identity: None,
                primary_identity: None,
                linked_at: None,
            },
        })
    }

    pub async fn cleanup_expired_pins(&self) -> Result<u64, GameError> {
        let cutoff = self.policy.expiry_cutoff(Utc::now());
        let removed = self
            .links
            .delete_expired_pins(cutoff)
            .await
            .map_err(storage_error("Failed to clean up expired PINs"))?;

        if removed > 0 {
            info!("Removed {} expired link PINs", removed);
        }

        Ok(removed)
    }
}
