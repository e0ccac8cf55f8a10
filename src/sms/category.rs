//! Category guesses derived from merchant names.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::Error;

/// The spending categories the extractor can guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    /// Restaurants, cafes and food delivery.
    Food,
    /// Ride hailing, public transport and fuel.
    Transportation,
    /// Online and retail shopping.
    Shopping,
    /// Streaming services and cinemas.
    Entertainment,
    /// Grocery stores and delivery.
    Groceries,
    /// Utilities and recharges.
    Bills,
    /// Hospitals, clinics and pharmacies.
    Healthcare,
}

impl Category {
    /// The string used when the category is stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "FOOD",
            Category::Transportation => "TRANSPORTATION",
            Category::Shopping => "SHOPPING",
            Category::Entertainment => "ENTERTAINMENT",
            Category::Groceries => "GROCERIES",
            Category::Bills => "BILLS",
            Category::Healthcare => "HEALTHCARE",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for Category {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "FOOD" => Ok(Category::Food),
            "TRANSPORTATION" => Ok(Category::Transportation),
            "SHOPPING" => Ok(Category::Shopping),
            "ENTERTAINMENT" => Ok(Category::Entertainment),
            "GROCERIES" => Ok(Category::Groceries),
            "BILLS" => Ok(Category::Bills),
            "HEALTHCARE" => Ok(Category::Healthcare),
            other => Err(Error::InvalidCategory(other.to_owned())),
        }
    }
}

/// A group of merchant keywords that map to a category.
///
/// Matching is a case-insensitive substring test, so "food" matches
/// "Foodhall Mumbai".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    /// The category assigned when a keyword matches.
    pub category: Category,
    /// Lower-case keywords searched for in the merchant name.
    pub keywords: Vec<String>,
}

impl CategoryRule {
    /// Create a rule from a category and its keywords.
    pub fn new(category: Category, keywords: &[&str]) -> Self {
        Self {
            category,
            keywords: keywords.iter().map(|keyword| keyword.to_lowercase()).collect(),
        }
    }

    /// Whether any keyword appears in `merchant`.
    ///
    /// `merchant` must already be lower case.
    fn matches(&self, merchant: &str) -> bool {
        self.keywords
            .iter()
            .any(|keyword| merchant.contains(keyword.to_lowercase().as_str()))
    }
}

/// Guess the category of a merchant from ordered keyword groups.
///
/// The first group with a matching keyword wins, so the order of `rules`
/// decides merchants that match more than one group.
pub fn infer_category(merchant: &str, rules: &[CategoryRule]) -> Option<Category> {
    let merchant = merchant.to_lowercase();

    rules
        .iter()
        .find(|rule| rule.matches(&merchant))
        .map(|rule| rule.category)
}

/// The default keyword groups, in evaluation order.
pub fn default_category_rules() -> Vec<CategoryRule> {
    vec![
        CategoryRule::new(
            Category::Food,
            &[
                "swiggy",
                "zomato",
                "restaurant",
                "food",
                "cafe",
                "pizza",
                "burger",
            ],
        ),
        CategoryRule::new(
            Category::Transportation,
            &["uber", "ola", "rapido", "metro", "bus", "petrol", "fuel"],
        ),
        CategoryRule::new(
            Category::Shopping,
            &["amazon", "flipkart", "myntra", "ajio", "shop", "store"],
        ),
        CategoryRule::new(
            Category::Entertainment,
            &[
                "netflix", "prime", "hotstar", "spotify", "movie", "pvr", "inox",
            ],
        ),
        CategoryRule::new(
            Category::Groceries,
            &["bigbasket", "dmart", "grocery", "vegetables"],
        ),
        CategoryRule::new(
            Category::Bills,
            &["electricity", "water", "gas", "bill", "recharge"],
        ),
        CategoryRule::new(
            Category::Healthcare,
            &["hospital", "clinic", "pharmacy", "medicine", "doctor"],
        ),
    ]
}
