/// The two Busan open-data listings the collector knows about
use crate::models::Category;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    /// `FoodService/getFoodKr`
    Restaurants,
    /// `InfoOfficeService/getInfoOfficeKr`
    TouristSpots,
}

impl Dataset {
    pub const ALL: [Dataset; 2] = [Dataset::Restaurants, Dataset::TouristSpots];

    /// Path relative to the data API base URL
    pub fn endpoint(&self) -> &'static str {
        match self {
            Dataset::Restaurants => "/FoodService/getFoodKr",
            Dataset::TouristSpots => "/InfoOfficeService/getInfoOfficeKr",
        }
    }

    /// Top-level key wrapping each page in the response body
    pub fn wrapper_key(&self) -> &'static str {
        match self {
            Dataset::Restaurants => "getFoodKr",
            Dataset::TouristSpots => "getInfoOfficeKr",
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Dataset::Restaurants => Category::Restaurant,
            Dataset::TouristSpots => Category::TouristSpot,
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Dataset::Restaurants => "busan_restaurants.json",
            Dataset::TouristSpots => "busan_tourist_spots.json",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Dataset::Restaurants => "restaurants",
            Dataset::TouristSpots => "tourist spots",
        }
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
