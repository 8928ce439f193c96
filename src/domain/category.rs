//! Fixed category catalogue shared by expenses and incomes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::common::Displayable;

/// Spending or earning category a transaction is filed under.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Category {
    Bills,
    Clothes,
    Cosmetics,
    Drinks,
    Food,
    Gifts,
    Groceries,
    Home,
    Investment,
    Party,
    Pension,
    Pets,
    Salary,
    Services,
    Travels,
    #[default]
    Others,
}

impl Category {
    pub const ALL: [Category; 16] = [
        Category::Bills,
        Category::Clothes,
        Category::Cosmetics,
        Category::Drinks,
        Category::Food,
        Category::Gifts,
        Category::Groceries,
        Category::Home,
        Category::Investment,
        Category::Party,
        Category::Pension,
        Category::Pets,
        Category::Salary,
        Category::Services,
        Category::Travels,
        Category::Others,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::Bills => "Bills",
            Category::Clothes => "Clothes",
            Category::Cosmetics => "Cosmetics",
            Category::Drinks => "Drinks",
            Category::Food => "Food",
            Category::Gifts => "Gifts",
            Category::Groceries => "Groceries",
            Category::Home => "Home",
            Category::Investment => "Investment",
            Category::Party => "Party",
            Category::Pension => "Pension",
            Category::Pets => "Pets",
            Category::Salary => "Salary",
            Category::Services => "Services",
            Category::Travels => "Travels",
            Category::Others => "Others",
        }
    }

    /// Icon identifier used by clients when rendering the category.
    pub fn icon(self) -> &'static str {
        match self {
            Category::Bills => "receipt",
            Category::Clothes => "tshirt-crew-outline",
            Category::Cosmetics => "home",
            Category::Drinks => "glass-cocktail",
            Category::Food => "food",
            Category::Gifts => "gift-outline",
            Category::Groceries => "cart-outline",
            Category::Home => "home-outline",
            Category::Investment => "chart-line",
            Category::Party => "balloon",
            Category::Pension => "account-plus",
            Category::Pets => "dog",
            Category::Salary => "credit-card-plus",
            Category::Services => "monitor-cellphone",
            Category::Travels => "airplane",
            Category::Others => "all-inclusive",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Displayable for Category {
    fn display_label(&self) -> String {
        self.name().to_string()
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|category| category.name().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("unknown category `{}`", value))
    }
}
