use serde::{Deserialize, Serialize};

/// A cached food with macros per 100 g.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Food {
    pub fdc_id: i64,
    pub description: String,
    pub brand_owner: Option<String>,
    pub kcal_per_100g: f64,
    pub protein_g_per_100g: f64,
    pub carb_g_per_100g: f64,
    pub fat_g_per_100g: f64,
    #[serde(default)]
    pub archived: bool,
}

impl Food {
    pub fn new(fdc_id: i64, description: impl Into<String>) -> Self {
        Self {
            fdc_id,
            description: description.into(),
            brand_owner: None,
            kcal_per_100g: 0.0,
            protein_g_per_100g: 0.0,
            carb_g_per_100g: 0.0,
            fat_g_per_100g: 0.0,
            archived: false,
        }
    }

    pub fn with_brand_owner(mut self, brand_owner: impl Into<String>) -> Self {
        self.brand_owner = Some(brand_owner.into());
        self
    }

    /// Sets kcal, protein, carbohydrate and fat per 100 g.
    pub fn with_macros(mut self, kcal: f64, protein: f64, carb: f64, fat: f64) -> Self {
        self.kcal_per_100g = kcal;
        self.protein_g_per_100g = protein;
        self.carb_g_per_100g = carb;
        self.fat_g_per_100g = fat;
        self
    }
}
