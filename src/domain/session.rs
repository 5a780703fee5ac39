//! Session inputs supplied by the surrounding application.
//!
//! The cache never reads ambient state: the caller hands it the currently
//! selected restaurant and user on every change.

use brigade_api_types::RestaurantId;

use super::error::DomainError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedRestaurant {
    pub restaurant_id: RestaurantId,
    pub name: Option<String>,
}

impl SelectedRestaurant {
    pub fn new(restaurant_id: impl Into<RestaurantId>) -> Result<Self, DomainError> {
        let restaurant_id = restaurant_id.into();
        if restaurant_id.is_empty() {
            return Err(DomainError::empty_id("restaurant id"));
        }
        Ok(Self {
            restaurant_id,
            name: None,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSession {
    pub user: String,
}

impl UserSession {
    pub fn new(user: impl Into<String>) -> Self {
        Self { user: user.into() }
    }
}

/// Snapshot of the selected restaurant and signed-in user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    pub selected: Option<SelectedRestaurant>,
    pub user: Option<UserSession>,
}

impl SessionContext {
    pub fn new(selected: Option<SelectedRestaurant>, user: Option<UserSession>) -> Self {
        Self { selected, user }
    }

    pub fn restaurant_id(&self) -> Option<&RestaurantId> {
        self.selected.as_ref().map(|selected| &selected.restaurant_id)
    }

    pub fn has_user(&self) -> bool {
        self.user.is_some()
    }

    /// True when both a restaurant and a user are present.
    pub fn is_active(&self) -> bool {
        self.restaurant_id().is_some() && self.has_user()
    }

    pub fn logged_out(&self) -> Self {
        Self {
            selected: self.selected.clone(),
            user: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_restaurant_id_is_rejected() {
        let err = SelectedRestaurant::new("").expect_err("empty id must fail");
        assert!(matches!(err, DomainError::EmptyId { field: "restaurant id" }));
    }

    #[test]
    fn active_requires_restaurant_and_user() {
        let selected = SelectedRestaurant::new("r1").expect("valid restaurant");
        let only_restaurant = SessionContext::new(Some(selected.clone()), None);
        assert!(!only_restaurant.is_active());

        let both = SessionContext::new(Some(selected), Some(UserSession::new("chef")));
        assert!(both.is_active());
        assert!(!both.logged_out().is_active());
    }
}
