//! Load trigger policy.
//!
//! Decides, for a session context change, whether the cache must fetch a
//! batch for the selected restaurant.

use crate::domain::RestaurantId;
use crate::domain::session::SessionContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerDecision {
    /// Fetch a batch for this restaurant.
    Load(RestaurantId),
    /// Data for this restaurant is already cached.
    CacheHit(RestaurantId),
    /// A load was already triggered for this restaurant.
    AlreadyTriggered,
    NoRestaurant,
    NoSession,
}

/// Load only when a restaurant is selected, a user session exists, and the
/// restaurant differs from the last triggered one while having no cached data.
pub fn evaluate(
    context: &SessionContext,
    last_triggered: Option<&RestaurantId>,
    is_cached: impl Fn(&RestaurantId) -> bool,
) -> TriggerDecision {
    let Some(restaurant_id) = context.restaurant_id() else {
        return TriggerDecision::NoRestaurant;
    };
    if !context.has_user() {
        return TriggerDecision::NoSession;
    }
    if is_cached(restaurant_id) {
        return TriggerDecision::CacheHit(restaurant_id.clone());
    }
    if last_triggered == Some(restaurant_id) {
        return TriggerDecision::AlreadyTriggered;
    }
    TriggerDecision::Load(restaurant_id.clone())
}

#[cfg(test)]
mod tests {
    use crate::domain::session::{SelectedRestaurant, UserSession};

    use super::*;

    fn context(restaurant: Option<&str>, user: bool) -> SessionContext {
        SessionContext::new(
            restaurant.map(|id| SelectedRestaurant::new(id).expect("valid restaurant")),
            user.then(|| UserSession::new("chef")),
        )
    }

    #[test]
    fn loads_new_restaurant_with_session() {
        let decision = evaluate(&context(Some("a"), true), None, |_| false);
        assert_eq!(decision, TriggerDecision::Load(RestaurantId::new("a")));
    }

    #[test]
    fn requires_restaurant_and_session() {
        assert_eq!(
            evaluate(&context(None, true), None, |_| false),
            TriggerDecision::NoRestaurant
        );
        assert_eq!(
            evaluate(&context(Some("a"), false), None, |_| false),
            TriggerDecision::NoSession
        );
    }

    #[test]
    fn cached_restaurant_is_a_hit() {
        let last = RestaurantId::new("b");
        let decision = evaluate(&context(Some("a"), true), Some(&last), |id| id.as_str() == "a");
        assert_eq!(decision, TriggerDecision::CacheHit(RestaurantId::new("a")));
    }

    #[test]
    fn same_restaurant_is_not_retriggered() {
        let last = RestaurantId::new("a");
        let decision = evaluate(&context(Some("a"), true), Some(&last), |_| false);
        assert_eq!(decision, TriggerDecision::AlreadyTriggered);
    }
}
