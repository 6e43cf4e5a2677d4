//! Core recipe and size tables, converted from the config schema once at
//! startup and immutable afterwards.

/// Physical pump outputs. Ingredient indices 0..=3 map 1:1 to pumps 1..=4.
pub const PUMP_COUNT: usize = 4;

/// Ingredients per recipe: the four concentrates plus reserved water.
pub const INGREDIENT_COUNT: usize = 5;

/// The water slot. Carried through the plan computation for diagnostics;
/// there is no pump behind it in the current hardware configuration.
pub const WATER_INDEX: usize = 4;

/// A named drink formula. Each ratio is ounces of concentrate per ounce of
/// finished drink. Ratios are non-negative but deliberately unnormalized:
/// the table may under- or over-fill and that is preserved as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub name: String,
    pub ratios: [f32; INGREDIENT_COUNT],
}

/// A named target volume for the finished drink.
#[derive(Debug, Clone, PartialEq)]
pub struct Size {
    pub name: String,
    pub ounces: f32,
}

impl From<&refresher_config::Recipe> for Recipe {
    fn from(r: &refresher_config::Recipe) -> Self {
        Recipe {
            name: r.name.clone(),
            ratios: r.ratios,
        }
    }
}

impl From<&refresher_config::Size> for Size {
    fn from(s: &refresher_config::Size) -> Self {
        Size {
            name: s.name.clone(),
            ounces: s.ounces,
        }
    }
}

/// The formulas and cup sizes shipped on the prototype.
pub fn default_tables() -> (Vec<Recipe>, Vec<Size>) {
    let recipes = refresher_config::default_recipes()
        .iter()
        .map(Recipe::from)
        .collect();
    let sizes = refresher_config::default_sizes()
        .iter()
        .map(Size::from)
        .collect();
    (recipes, sizes)
}
