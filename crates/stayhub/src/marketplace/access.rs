use super::domain::{Actor, Booking, Listing, Review, Role};
use super::error::MarketplaceError;

/// Ownership checks applied before every mutation. Each check is side-effect free so a refusal
/// never leaves a partially applied change behind.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessGuard;

impl AccessGuard {
    pub fn ensure_can_book(&self, actor: &Actor) -> Result<(), MarketplaceError> {
        if actor.role == Role::Tenant {
            Ok(())
        } else {
            Err(forbidden(format!(
                "only tenants may request bookings ({} role)",
                actor.role.label()
            )))
        }
    }

    pub fn ensure_listing_owner(
        &self,
        actor: &Actor,
        listing: &Listing,
    ) -> Result<(), MarketplaceError> {
        if actor.id == listing.owner_id {
            Ok(())
        } else {
            Err(forbidden(format!(
                "only the owner of listing {} may decide its bookings",
                listing.id.0
            )))
        }
    }

    pub fn ensure_booking_tenant(
        &self,
        actor: &Actor,
        booking: &Booking,
    ) -> Result<(), MarketplaceError> {
        if actor.id == booking.tenant_id {
            Ok(())
        } else {
            Err(forbidden(format!(
                "only the tenant of booking {} may review it",
                booking.id.0
            )))
        }
    }

    pub fn ensure_review_owner(&self, actor: &Actor, review: &Review) -> Result<(), MarketplaceError> {
        if actor.id == review.owner_id {
            Ok(())
        } else {
            Err(forbidden(format!(
                "only the listing owner may reply to review {}",
                review.id.0
            )))
        }
    }

    /// Completion and manual recomputes come from trusted back-office processes.
    pub fn ensure_admin(&self, actor: &Actor) -> Result<(), MarketplaceError> {
        if actor.is_admin() {
            Ok(())
        } else {
            Err(forbidden("administrator role required".to_string()))
        }
    }

    pub fn ensure_can_cancel(&self, actor: &Actor, booking: &Booking) -> Result<(), MarketplaceError> {
        if actor.is_admin() || actor.id == booking.tenant_id {
            Ok(())
        } else {
            Err(forbidden(format!(
                "only the tenant of booking {} may cancel it",
                booking.id.0
            )))
        }
    }

    pub fn ensure_can_view_booking(
        &self,
        actor: &Actor,
        booking: &Booking,
        listing: Option<&Listing>,
    ) -> Result<(), MarketplaceError> {
        let is_owner = listing.is_some_and(|listing| listing.owner_id == actor.id);
        if actor.is_admin() || actor.id == booking.tenant_id || is_owner {
            Ok(())
        } else {
            Err(forbidden(format!("booking {} is not visible to caller", booking.id.0)))
        }
    }

    pub fn ensure_can_view_listing_bookings(
        &self,
        actor: &Actor,
        listing: &Listing,
    ) -> Result<(), MarketplaceError> {
        if actor.is_admin() || actor.id == listing.owner_id {
            Ok(())
        } else {
            Err(forbidden(format!(
                "only the owner of listing {} may list its bookings",
                listing.id.0
            )))
        }
    }
}

fn forbidden(message: String) -> MarketplaceError {
    MarketplaceError::Forbidden(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marketplace::domain::{BookingId, BookingStatus, ListingId, UserId};
    use chrono::{NaiveDate, Utc};

    fn listing() -> Listing {
        Listing::new("lst-1", "owner-1", "Quiet room near campus")
    }

    fn booking() -> Booking {
        let now = Utc::now();
        Booking {
            id: BookingId("bkg-1".to_string()),
            listing_id: ListingId("lst-1".to_string()),
            tenant_id: UserId("tenant-1".to_string()),
            status: BookingStatus::Pending,
            move_in_date: NaiveDate::from_ymd_opt(2025, 9, 1).expect("valid date"),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn owners_and_admins_cannot_book() {
        let guard = AccessGuard;
        assert!(guard.ensure_can_book(&Actor::new("t", Role::Tenant)).is_ok());
        assert!(guard.ensure_can_book(&Actor::new("o", Role::Owner)).is_err());
        assert!(guard.ensure_can_book(&Actor::new("a", Role::Admin)).is_err());
    }

    #[test]
    fn listing_owner_check_ignores_role() {
        let guard = AccessGuard;
        let listing = listing();
        assert!(guard
            .ensure_listing_owner(&Actor::new("owner-1", Role::Owner), &listing)
            .is_ok());
        assert!(matches!(
            guard.ensure_listing_owner(&Actor::new("admin-1", Role::Admin), &listing),
            Err(MarketplaceError::Forbidden(_))
        ));
    }

    #[test]
    fn booking_visibility_covers_tenant_owner_and_admin() {
        let guard = AccessGuard;
        let booking = booking();
        let listing = listing();

        for actor in [
            Actor::new("tenant-1", Role::Tenant),
            Actor::new("owner-1", Role::Owner),
            Actor::new("ops", Role::Admin),
        ] {
            assert!(guard
                .ensure_can_view_booking(&actor, &booking, Some(&listing))
                .is_ok());
        }
        assert!(guard
            .ensure_can_view_booking(&Actor::new("tenant-2", Role::Tenant), &booking, Some(&listing))
            .is_err());
        assert!(guard
            .ensure_can_view_booking(&Actor::new("owner-1", Role::Owner), &booking, None)
            .is_err());
    }
}
