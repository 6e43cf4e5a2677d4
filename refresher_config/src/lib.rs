#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and recipe-table parsing for the dispensing controller.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated once
//!   at startup; every field has a default matching the original hardware
//!   deployment, so an empty file (or no file) yields a working machine.
//! - The recipe CSV loader enforces exact headers so an operator-edited
//!   spreadsheet export cannot silently shift ratio columns.
use serde::Deserialize;

/// Ingredients per recipe: four concentrate pumps plus the reserved water
/// slot at index 4 (computed for diagnostics, never actuated).
pub const INGREDIENTS: usize = 5;

/// Menu letters map recipe selectors 'A'..='D' to at most four table rows.
pub const MAX_RECIPES: usize = 4;

/// Size selectors 'W'..='Z' address exactly four entries.
pub const SIZE_COUNT: usize = 4;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Pins {
    pub pump1: u8,
    pub pump2: u8,
    pub pump3: u8,
    pub pump4: u8,
    /// Reserved for a future tap-water solenoid relay; unused today.
    pub water_valve: Option<u8>,
}

impl Default for Pins {
    fn default() -> Self {
        Self {
            pump1: 11,
            pump2: 10,
            pump3: 9,
            pump4: 8,
            water_valve: None,
        }
    }
}

impl Pins {
    pub fn pump_pins(&self) -> [u8; 4] {
        [self.pump1, self.pump2, self.pump3, self.pump4]
    }
}

/// Command channel settings: which serial device carries the button node's
/// characters, and how often the controller polls for one.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Channel {
    /// Serial device path; absent means the interactive stdin source.
    pub device: Option<String>,
    pub baud: u32,
    /// Tick rate of the input-check-and-dispatch loop.
    pub poll_hz: u32,
}

impl Default for Channel {
    fn default() -> Self {
        Self {
            device: None,
            baud: 9600,
            poll_hz: 20,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Dispense {
    /// Ounces per second any pump delivers at the fixed duty level.
    pub flow_rate_oz_per_s: f32,
    /// PWM duty level applied whenever a pump runs.
    pub pump_power: u8,
}

impl Default for Dispense {
    fn default() -> Self {
        Self {
            flow_rate_oz_per_s: 2.5,
            pump_power: 255,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Recipe {
    pub name: String,
    /// Ounces of concentrate per ounce of finished drink, one entry per
    /// ingredient. Entries need not sum to 1; the table may deliberately
    /// under- or over-fill.
    pub ratios: [f32; INGREDIENTS],
}

#[derive(Debug, Deserialize, Clone)]
pub struct Size {
    pub name: String,
    pub ounces: f32,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub pins: Pins,
    pub channel: Channel,
    pub dispense: Dispense,
    pub recipes: Vec<Recipe>,
    pub sizes: Vec<Size>,
    pub logging: Logging,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pins: Pins::default(),
            channel: Channel::default(),
            dispense: Dispense::default(),
            recipes: default_recipes(),
            sizes: default_sizes(),
            logging: Logging::default(),
        }
    }
}

/// The formulas shipped on the prototype. Menu order is button order.
pub fn default_recipes() -> Vec<Recipe> {
    vec![
        Recipe {
            name: "test drink".into(),
            ratios: [0.25, 0.25, 0.25, 0.25, 0.0],
        },
        Recipe {
            name: "lemonade".into(),
            ratios: [0.5, 0.0, 0.0, 0.5, 0.0],
        },
        Recipe {
            name: "passionfruit lemonade".into(),
            ratios: [0.0, 0.25, 0.25, 0.0, 0.0],
        },
        Recipe {
            name: "mango dragonfruit".into(),
            ratios: [0.0, 0.0, 0.0, 0.5, 0.0],
        },
    ]
}

pub fn default_sizes() -> Vec<Size> {
    vec![
        Size {
            name: "tall".into(),
            ounces: 12.0,
        },
        Size {
            name: "grande".into(),
            ounces: 16.0,
        },
        Size {
            name: "venti".into(),
            ounces: 20.0,
        },
        Size {
            name: "trenta".into(),
            ounces: 30.0,
        },
    ]
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Channel
        if self.channel.poll_hz == 0 {
            eyre::bail!("channel.poll_hz must be > 0");
        }
        if self.channel.baud == 0 {
            eyre::bail!("channel.baud must be > 0");
        }

        // Dispense
        if !(self.dispense.flow_rate_oz_per_s.is_finite() && self.dispense.flow_rate_oz_per_s > 0.0)
        {
            eyre::bail!("dispense.flow_rate_oz_per_s must be finite and > 0");
        }
        if self.dispense.pump_power == 0 {
            eyre::bail!("dispense.pump_power must be > 0");
        }

        // Recipe table
        if self.recipes.is_empty() {
            eyre::bail!("at least one recipe is required");
        }
        if self.recipes.len() > MAX_RECIPES {
            eyre::bail!(
                "at most {} recipes are addressable (menu letters A-D), got {}",
                MAX_RECIPES,
                self.recipes.len()
            );
        }
        for (i, r) in self.recipes.iter().enumerate() {
            if r.name.trim().is_empty() {
                eyre::bail!("recipe {} has an empty name", i);
            }
            for (j, ratio) in r.ratios.iter().enumerate() {
                if !ratio.is_finite() || *ratio < 0.0 {
                    eyre::bail!(
                        "recipe '{}' ingredient {} ratio must be finite and >= 0, got {}",
                        r.name,
                        j,
                        ratio
                    );
                }
            }
        }

        // Size table
        if self.sizes.len() != SIZE_COUNT {
            eyre::bail!(
                "exactly {} sizes are required (selectors W-Z), got {}",
                SIZE_COUNT,
                self.sizes.len()
            );
        }
        for s in &self.sizes {
            if s.name.trim().is_empty() {
                eyre::bail!("size entries must be named");
            }
            if !(s.ounces.is_finite() && s.ounces > 0.0) {
                eyre::bail!("size '{}' ounces must be finite and > 0", s.name);
            }
        }

        Ok(())
    }
}

/// Recipe CSV schema.
///
/// Expected headers:
/// name,pump1,pump2,pump3,pump4,water
///
/// Example:
/// name,pump1,pump2,pump3,pump4,water
/// lemonade,0.5,0,0,0.5,0
#[derive(Debug, Deserialize, Clone)]
struct RecipeRow {
    name: String,
    pump1: f32,
    pump2: f32,
    pump3: f32,
    pump4: f32,
    water: f32,
}

impl From<RecipeRow> for Recipe {
    fn from(r: RecipeRow) -> Self {
        Recipe {
            name: r.name,
            ratios: [r.pump1, r.pump2, r.pump3, r.pump4, r.water],
        }
    }
}

pub fn load_recipes_csv(path: &std::path::Path) -> eyre::Result<Vec<Recipe>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open recipe CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["name", "pump1", "pump2", "pump3", "pump4", "water"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "recipe CSV must have headers 'name,pump1,pump2,pump3,pump4,water', got: {}",
            actual.join(",")
        );
    }

    let mut recipes = Vec::new();
    for (idx, rec) in rdr.deserialize::<RecipeRow>().enumerate() {
        match rec {
            Ok(row) => recipes.push(Recipe::from(row)),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }

    if recipes.is_empty() {
        eyre::bail!("recipe CSV {:?} contains no rows", path);
    }
    if recipes.len() > MAX_RECIPES {
        eyre::bail!(
            "recipe CSV {:?} has {} rows; at most {} are addressable",
            path,
            recipes.len(),
            MAX_RECIPES
        );
    }

    Ok(recipes)
}
