use core::str::FromStr;

use serde::{Deserialize, Serialize};

use pantry_core::DomainError;

/// Catalog category of a pantry item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PantryCategory {
    Beverage,
    Snacks,
    Biscuits,
    Juices,
    Dairy,
    Fruits,
    Vegetables,
    Bread,
    Condiments,
    Cereals,
    Chocolate,
    Coffee,
    Tea,
    Nuts,
    Soups,
    Sauces,
    Frozen,
    ReadyToEat,
    Miscellaneous,
}

impl PantryCategory {
    pub const ALL: [PantryCategory; 19] = [
        PantryCategory::Beverage,
        PantryCategory::Snacks,
        PantryCategory::Biscuits,
        PantryCategory::Juices,
        PantryCategory::Dairy,
        PantryCategory::Fruits,
        PantryCategory::Vegetables,
        PantryCategory::Bread,
        PantryCategory::Condiments,
        PantryCategory::Cereals,
        PantryCategory::Chocolate,
        PantryCategory::Coffee,
        PantryCategory::Tea,
        PantryCategory::Nuts,
        PantryCategory::Soups,
        PantryCategory::Sauces,
        PantryCategory::Frozen,
        PantryCategory::ReadyToEat,
        PantryCategory::Miscellaneous,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PantryCategory::Beverage => "Beverage",
            PantryCategory::Snacks => "Snacks",
            PantryCategory::Biscuits => "Biscuits",
            PantryCategory::Juices => "Juices",
            PantryCategory::Dairy => "Dairy",
            PantryCategory::Fruits => "Fruits",
            PantryCategory::Vegetables => "Vegetables",
            PantryCategory::Bread => "Bread",
            PantryCategory::Condiments => "Condiments",
            PantryCategory::Cereals => "Cereals",
            PantryCategory::Chocolate => "Chocolate",
            PantryCategory::Coffee => "Coffee",
            PantryCategory::Tea => "Tea",
            PantryCategory::Nuts => "Nuts",
            PantryCategory::Soups => "Soups",
            PantryCategory::Sauces => "Sauces",
            PantryCategory::Frozen => "Frozen",
            PantryCategory::ReadyToEat => "ReadyToEat",
            PantryCategory::Miscellaneous => "Miscellaneous",
        }
    }
}

impl core::fmt::Display for PantryCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PantryCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        PantryCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DomainError::validation(format!("unknown category '{wanted}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("tea".parse::<PantryCategory>().unwrap(), PantryCategory::Tea);
        assert_eq!(
            " readytoeat ".parse::<PantryCategory>().unwrap(),
            PantryCategory::ReadyToEat
        );
    }

    #[test]
    fn display_round_trips_for_every_category() {
        for category in PantryCategory::ALL {
            assert_eq!(category.to_string().parse::<PantryCategory>().unwrap(), category);
        }
    }

    #[test]
    fn unknown_category_is_a_validation_error() {
        assert!(matches!(
            "Cutlery".parse::<PantryCategory>(),
            Err(DomainError::Validation(_))
        ));
    }
}
