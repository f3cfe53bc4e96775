use serde::{Deserialize, Serialize};

/// A menu category as returned by `GET /categories/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// How a menu item points at its category.
///
/// The menu serializer renders the category with its display name while
/// older endpoints send the primary key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryRef {
    Id(u64),
    Name(String),
}

impl CategoryRef {
    pub fn matches(&self, category: &Category) -> bool {
        match self {
            CategoryRef::Id(id) => *id == category.id,
            CategoryRef::Name(name) => name.eq_ignore_ascii_case(&category.name),
        }
    }

    /// Display label, resolving ids against the known categories.
    pub fn label(&self, categories: &[Category]) -> String {
        match self {
            CategoryRef::Name(name) => name.clone(),
            CategoryRef::Id(id) => categories
                .iter()
                .find(|c| c.id == *id)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| "No Category".to_string()),
        }
    }
}

/// A sellable menu item. Immutable from the cart's point of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: u64,
    pub name: String,

    #[serde(deserialize_with = "super::decimal::deserialize")]
    pub price: f64,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub category: Option<CategoryRef>,

    #[serde(default = "default_available")]
    pub available: bool,

    #[serde(default)]
    pub image: Option<String>,
}

fn default_available() -> bool {
    true
}

impl MenuItem {
    pub fn new(id: u64, name: &str, price: f64) -> Self {
        Self {
            id,
            name: name.to_string(),
            price,
            description: None,
            category: None,
            available: true,
            image: None,
        }
    }

    pub fn in_category(&self, category: &Category) -> bool {
        self.category
            .as_ref()
            .map(|c| c.matches(category))
            .unwrap_or(false)
    }
}

/// A list endpoint payload: either DRF-paginated or a flat array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Paginated { results: Vec<T> },
    Flat(Vec<T>),
}

impl<T> Listing<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Paginated { results } => results,
            Listing::Flat(items) => items,
        }
    }
}

/// Filters for `GET /menu/`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MenuQuery {
    pub category: Option<u64>,
    pub search: Option<String>,
    pub available_only: bool,
}

impl MenuQuery {
    pub fn category(id: u64) -> Self {
        Self {
            category: Some(id),
            ..Self::default()
        }
    }

    /// A blank search term means "everything".
    pub fn search(term: &str) -> Self {
        let term = term.trim();
        Self {
            search: (!term.is_empty()).then(|| term.to_string()),
            ..Self::default()
        }
    }

    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(id) = self.category {
            pairs.push(("category", id.to_string()));
        }
        if let Some(term) = &self.search {
            pairs.push(("search", term.clone()));
        }
        if self.available_only {
            pairs.push(("available", "true".to_string()));
        }
        pairs
    }
}

/// Partial update for `PATCH /menu/<id>/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MenuItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Sent as a two-decimal string to match the server's `DecimalField`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<u64>,
}

impl MenuItemPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One page of items, 1-indexed. Out-of-range pages are empty.
pub fn paginate(items: &[MenuItem], page: usize, per_page: usize) -> &[MenuItem] {
    if page == 0 || per_page == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(per_page);
    if start >= items.len() {
        return &[];
    }
    let end = (start + per_page).min(items.len());
    &items[start..end]
}

pub fn page_count(total: usize, per_page: usize) -> usize {
    if per_page == 0 {
        return 0;
    }
    total.div_ceil(per_page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_accepts_string_and_number() {
        let json = r#"[
            {"id": 1, "name": "Jollof Rice", "price": "25.00", "category": "Rice Dish", "available": true},
            {"id": 2, "name": "Banku", "price": 35, "category": 4}
        ]"#;
        let items: Vec<MenuItem> = serde_json::from_str(json).unwrap();
        assert!((items[0].price - 25.0).abs() < 1e-9);
        assert!((items[1].price - 35.0).abs() < 1e-9);
        assert_eq!(items[0].category, Some(CategoryRef::Name("Rice Dish".to_string())));
        assert_eq!(items[1].category, Some(CategoryRef::Id(4)));
        assert!(items[1].available);
    }

    #[test]
    fn test_bad_price_is_rejected() {
        let json = r#"{"id": 1, "name": "Mystery", "price": "abc"}"#;
        assert!(serde_json::from_str::<MenuItem>(json).is_err());
    }

    #[test]
    fn test_listing_paginated_and_flat() {
        let paginated: Listing<Category> =
            serde_json::from_str(r#"{"count": 1, "results": [{"id": 1, "name": "Drink"}]}"#)
                .unwrap();
        assert_eq!(paginated.into_vec().len(), 1);

        let flat: Listing<Category> =
            serde_json::from_str(r#"[{"id": 1, "name": "Drink"}, {"id": 2, "name": "Main"}]"#)
                .unwrap();
        assert_eq!(flat.into_vec().len(), 2);
    }

    #[test]
    fn test_category_matching() {
        let drinks = Category {
            id: 3,
            name: "Drink".to_string(),
            description: None,
        };
        let mut item = MenuItem::new(1, "Sobolo", 10.0);
        assert!(!item.in_category(&drinks));

        item.category = Some(CategoryRef::Id(3));
        assert!(item.in_category(&drinks));

        item.category = Some(CategoryRef::Name("drink".to_string()));
        assert!(item.in_category(&drinks));
    }

    #[test]
    fn test_query_pairs() {
        assert!(MenuQuery::default().to_query_pairs().is_empty());
        assert!(MenuQuery::search("   ").to_query_pairs().is_empty());
        assert_eq!(
            MenuQuery::search(" waakye ").to_query_pairs(),
            vec![("search", "waakye".to_string())]
        );

        let query = MenuQuery {
            category: Some(2),
            search: None,
            available_only: true,
        };
        assert_eq!(
            query.to_query_pairs(),
            vec![("category", "2".to_string()), ("available", "true".to_string())]
        );
    }

    #[test]
    fn test_paginate() {
        let items: Vec<MenuItem> = (1..=14)
            .map(|i| MenuItem::new(i, &format!("Item {}", i), 1.0))
            .collect();

        assert_eq!(paginate(&items, 1, 6).len(), 6);
        assert_eq!(paginate(&items, 3, 6).len(), 2);
        assert_eq!(paginate(&items, 3, 6)[0].id, 13);
        assert!(paginate(&items, 4, 6).is_empty());
        assert!(paginate(&items, 0, 6).is_empty());
        assert_eq!(page_count(items.len(), 6), 3);
        assert_eq!(page_count(0, 6), 0);
    }
}
