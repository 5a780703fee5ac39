//! Direct and derived allergy sets.
//!
//! An ingredient's allergies are its own links plus everything inherited from
//! its sub-ingredients, transitively. A menu item's allergies are its own links
//! plus the full set of each of its ingredients. Sub-ingredient links form a
//! DAG by convention only, so traversal tracks visited ids and stops on cycles.

use std::collections::{BTreeSet, HashMap, HashSet};

use brigade_api_types::{Ingredient, MenuItem, Recipe};

pub type AllergySet = BTreeSet<String>;

/// Precomputed allergy sets for every ingredient of one collection.
#[derive(Debug, Clone, Default)]
pub struct AllergyIndex {
    by_ingredient: HashMap<String, AllergySet>,
}

impl AllergyIndex {
    pub fn build(ingredients: &[Ingredient]) -> Self {
        let by_id: HashMap<&str, &Ingredient> = ingredients
            .iter()
            .map(|ingredient| (ingredient.id.as_str(), ingredient))
            .collect();

        let by_ingredient = ingredients
            .iter()
            .map(|ingredient| {
                (
                    ingredient.id.clone(),
                    collect_ingredient_allergies(ingredient, &by_id),
                )
            })
            .collect();

        Self { by_ingredient }
    }

    /// Allergy set of a known ingredient; unknown ids have none.
    pub fn ingredient(&self, id: &str) -> AllergySet {
        self.by_ingredient.get(id).cloned().unwrap_or_default()
    }

    pub fn menu_item(&self, item: &MenuItem) -> AllergySet {
        let mut set: AllergySet = item
            .menu_item_allergies
            .iter()
            .map(|link| link.allergy_id.clone())
            .collect();
        for link in &item.menu_item_ingredients {
            if let Some(inherited) = self.by_ingredient.get(&link.ingredient_id) {
                set.extend(inherited.iter().cloned());
            }
        }
        set
    }

    pub fn recipe(&self, recipe: &Recipe) -> AllergySet {
        let mut set = AllergySet::new();
        for link in &recipe.recipe_ingredients {
            if let Some(inherited) = self.by_ingredient.get(&link.ingredient_id) {
                set.extend(inherited.iter().cloned());
            }
        }
        set
    }
}

/// Direct plus derived allergies of one ingredient, resolving sub-ingredients
/// through `by_id`.
pub fn collect_ingredient_allergies(
    ingredient: &Ingredient,
    by_id: &HashMap<&str, &Ingredient>,
) -> AllergySet {
    let mut set = AllergySet::new();
    let mut visited: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&Ingredient> = vec![ingredient];

    while let Some(current) = stack.pop() {
        if !visited.insert(current.id.as_str()) {
            continue;
        }
        set.extend(
            current
                .ingredient_allergies
                .iter()
                .map(|link| link.allergy_id.clone()),
        );
        for sub_id in &current.sub_ingredients {
            if let Some(sub) = by_id.get(sub_id.as_str()) {
                stack.push(*sub);
            }
        }
    }

    set
}

#[cfg(test)]
mod tests {
    use brigade_api_types::{AllergyLink, IngredientLink, RestaurantId};

    use super::*;

    fn ingredient(id: &str, allergies: &[&str], subs: &[&str]) -> Ingredient {
        Ingredient {
            id: id.to_string(),
            restaurant_id: RestaurantId::new("r1"),
            name: id.to_string(),
            description: None,
            ingredient_allergies: allergies
                .iter()
                .map(|allergy| AllergyLink {
                    allergy_id: (*allergy).to_string(),
                })
                .collect(),
            categories: Vec::new(),
            sub_ingredients: subs.iter().map(|sub| (*sub).to_string()).collect(),
            created_at: None,
            updated_at: None,
        }
    }

    fn ids(set: &AllergySet) -> Vec<&str> {
        set.iter().map(String::as_str).collect()
    }

    #[test]
    fn derived_allergies_follow_sub_ingredients_transitively() {
        let ingredients = vec![
            ingredient("pesto", &[], &["basil-mix"]),
            ingredient("basil-mix", &["tree-nut"], &["cheese"]),
            ingredient("cheese", &["dairy"], &[]),
        ];
        let index = AllergyIndex::build(&ingredients);

        assert_eq!(ids(&index.ingredient("pesto")), vec!["dairy", "tree-nut"]);
        assert_eq!(ids(&index.ingredient("cheese")), vec!["dairy"]);
    }

    #[test]
    fn cyclic_sub_ingredients_terminate() {
        let ingredients = vec![
            ingredient("a", &["gluten"], &["b"]),
            ingredient("b", &["soy"], &["a"]),
        ];
        let index = AllergyIndex::build(&ingredients);

        assert_eq!(ids(&index.ingredient("a")), vec!["gluten", "soy"]);
        assert_eq!(ids(&index.ingredient("b")), vec!["gluten", "soy"]);
    }

    #[test]
    fn menu_item_combines_direct_and_ingredient_allergies() {
        let ingredients = vec![
            ingredient("bun", &["gluten"], &[]),
            ingredient("patty", &[], &[]),
        ];
        let index = AllergyIndex::build(&ingredients);
        let item = MenuItem {
            id: "burger".into(),
            restaurant_id: RestaurantId::new("r1"),
            name: "Burger".into(),
            description: None,
            price: None,
            menu_item_ingredients: vec![
                IngredientLink {
                    ingredient_id: "bun".into(),
                },
                IngredientLink {
                    ingredient_id: "missing".into(),
                },
            ],
            menu_item_allergies: vec![AllergyLink {
                allergy_id: "sesame".into(),
            }],
            menu_section_id: None,
            created_at: None,
        };

        assert_eq!(ids(&index.menu_item(&item)), vec!["gluten", "sesame"]);
    }
}
