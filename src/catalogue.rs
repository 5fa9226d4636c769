//! Static catalogue: regions, districts, crops, soils, map coordinates and
//! every UI string the dashboard renders.
//!
//! All entries are canonical English keys. Display forms come from the
//! current [`UiTextSet`](crate::i18n::UiTextSet).

use serde::Serialize;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Product name. Never translated.
pub const BRAND: &str = "FarmX";

/// Opening assistant line of every chat transcript.
pub const GREETING: &str =
    "Hello! I am FarmX Assistant. Ask me anything about crop care, market trends, or prices.";

/// Assistant line shown when a chat reply could not be fetched.
pub const CHAT_APOLOGY: &str = "Sorry, something went wrong. Please check your connection.";

/// Region whose districts are offered as sub-regions.
pub const DISTRICT_REGION: &str = "Karnataka";

pub const SUPPORTED_REGIONS: &[&str] = &[
    "Andhra Pradesh",
    "Arunachal Pradesh",
    "Assam",
    "Bihar",
    "Chhattisgarh",
    "Goa",
    "Gujarat",
    "Haryana",
    "Himachal Pradesh",
    "Jharkhand",
    "Karnataka",
    "Kerala",
    "Madhya Pradesh",
    "Maharashtra",
    "Manipur",
    "Meghalaya",
    "Mizoram",
    "Nagaland",
    "Odisha",
    "Punjab",
    "Rajasthan",
    "Sikkim",
    "Tamil Nadu",
    "Telangana",
    "Tripura",
    "Uttar Pradesh",
    "Uttarakhand",
    "West Bengal",
    "Andaman and Nicobar Islands",
    "Chandigarh",
    "Dadra and Nagar Haveli and Daman and Diu",
    "Delhi",
    "Jammu and Kashmir",
    "Ladakh",
    "Lakshadweep",
    "Puducherry",
];

pub const KARNATAKA_DISTRICTS: &[&str] = &[
    "Bagalkot",
    "Ballari",
    "Belagavi",
    "Bengaluru Rural",
    "Bengaluru Urban",
    "Bidar",
    "Chamarajanagar",
    "Chikkaballapur",
    "Chikkamagaluru",
    "Chitradurga",
    "Dakshina Kannada",
    "Davanagere",
    "Dharwad",
    "Gadag",
    "Hassan",
    "Haveri",
    "Kalaburagi",
    "Kodagu",
    "Kolar",
    "Koppal",
    "Mandya",
    "Mysuru",
    "Raichur",
    "Ramanagara",
    "Shivamogga",
    "Tumakuru",
    "Udupi",
    "Uttara Kannada",
    "Vijayapura",
    "Vijayanagara",
    "Yadgir",
];

pub const SUPPORTED_CROPS: &[&str] = &[
    "Wheat",
    "Rice",
    "Maize",
    "Cotton",
    "Sugarcane",
    "Soybean",
    "Groundnut",
    "Mustard",
    "Chickpea",
    "Pigeon Pea",
    "Ragi",
    "Jowar",
    "Bajra",
    "Onion",
    "Tomato",
    "Potato",
    "Chilli",
    "Turmeric",
    "Coffee",
    "Tea",
    "Banana",
    "Mango",
    "Coconut",
    "Arecanut",
];

pub const SOIL_TYPES: &[&str] = &[
    "Alluvial Soil",
    "Black Soil (Regur)",
    "Red Soil",
    "Laterite Soil",
    "Arid / Desert Soil",
    "Saline / Alkaline Soil",
    "Peaty / Marshy Soil",
    "Forest / Mountain Soil",
    "Loamy Soil",
    "Clay Soil",
    "Sandy Soil",
];

/// Map centre used when nothing is selected.
pub const INDIA_CENTER: (f64, f64) = (22.5937, 78.9629);

/// (name, latitude, longitude) for regions and districts the map can zoom to.
const REGION_COORDINATES: &[(&str, f64, f64)] = &[
    ("Andhra Pradesh", 15.9129, 79.7400),
    ("Arunachal Pradesh", 28.2180, 94.7278),
    ("Assam", 26.2006, 92.9376),
    ("Bihar", 25.0961, 85.3131),
    ("Chhattisgarh", 21.2787, 81.8661),
    ("Goa", 15.2993, 74.1240),
    ("Gujarat", 22.2587, 71.1924),
    ("Haryana", 29.0588, 76.0856),
    ("Himachal Pradesh", 31.1048, 77.1734),
    ("Jharkhand", 23.6102, 85.2799),
    ("Karnataka", 15.3173, 75.7139),
    ("Kerala", 10.8505, 76.2711),
    ("Madhya Pradesh", 22.9734, 78.6569),
    ("Maharashtra", 19.7515, 75.7139),
    ("Manipur", 24.6637, 93.9063),
    ("Meghalaya", 25.4670, 91.3662),
    ("Mizoram", 23.1645, 92.9376),
    ("Nagaland", 26.1584, 94.5624),
    ("Odisha", 20.9517, 85.0985),
    ("Punjab", 31.1471, 75.3412),
    ("Rajasthan", 27.0238, 74.2179),
    ("Sikkim", 27.5330, 88.5122),
    ("Tamil Nadu", 11.1271, 78.6569),
    ("Telangana", 18.1124, 79.0193),
    ("Tripura", 23.9408, 91.9882),
    ("Uttar Pradesh", 26.8467, 80.9462),
    ("Uttarakhand", 30.0668, 79.0193),
    ("West Bengal", 22.9868, 87.8550),
    ("Andaman and Nicobar Islands", 11.7401, 92.6586),
    ("Chandigarh", 30.7333, 76.7794),
    ("Dadra and Nagar Haveli and Daman and Diu", 20.3974, 72.8328),
    ("Delhi", 28.7041, 77.1025),
    ("Jammu and Kashmir", 33.7782, 76.5762),
    ("Ladakh", 34.1526, 77.5771),
    ("Lakshadweep", 10.5667, 72.6417),
    ("Puducherry", 11.9416, 79.8083),
    ("Bagalkot", 16.1691, 75.6615),
    ("Ballari", 15.1394, 76.9214),
    ("Belagavi", 15.8497, 74.4977),
    ("Bengaluru Rural", 13.2846, 77.6078),
    ("Bengaluru Urban", 12.9716, 77.5946),
    ("Bidar", 17.9104, 77.5199),
    ("Chamarajanagar", 11.9261, 76.9437),
    ("Chikkaballapur", 13.4355, 77.7315),
    ("Chikkamagaluru", 13.3161, 75.7720),
    ("Chitradurga", 14.2251, 76.3980),
    ("Dakshina Kannada", 12.8438, 75.2479),
    ("Davanagere", 14.4644, 75.9218),
    ("Dharwad", 15.4589, 75.0078),
    ("Gadag", 15.4315, 75.6355),
    ("Hassan", 13.0072, 76.0960),
    ("Haveri", 14.7951, 75.3991),
    ("Kalaburagi", 17.3297, 76.8343),
    ("Kodagu", 12.3375, 75.8069),
    ("Kolar", 13.1367, 78.1292),
    ("Koppal", 15.3459, 76.1548),
    ("Mandya", 12.5218, 76.8951),
    ("Mysuru", 12.2958, 76.6394),
    ("Raichur", 16.2076, 77.3463),
    ("Ramanagara", 12.7159, 77.2810),
    ("Shivamogga", 13.9299, 75.5681),
    ("Tumakuru", 13.3379, 77.1173),
    ("Udupi", 13.3409, 74.7421),
    ("Uttara Kannada", 14.7937, 74.6869),
    ("Vijayapura", 16.8302, 75.7100),
    ("Vijayanagara", 15.2689, 76.3909),
    ("Yadgir", 16.7700, 77.1376),
];

/// Interface strings rendered by the dashboard.
const INTERFACE_TEXTS: &[&str] = &[
    "FarmX",
    "AI Agricultural Advisor for India",
    "AI-powered insights for modern farming.",
    "Welcome to FarmX",
    "Your AI partner in agriculture. Select your region and a crop to receive a detailed market forecast and data-driven recommendations to maximize your yield and profits.",
    "Region (State/District)",
    "e.g., Maharashtra or Pune",
    "No regions found. You can still enter a custom region.",
    "District (Optional)",
    "Select a district",
    "Crop",
    "Get Forecast",
    "Analyzing...",
    "Translating...",
    "Analyzing Market Data...",
    "This may take a moment.",
    "Error",
    "Please select a region and crop first.",
    "Please provide both a region and a crop.",
    // Forecast card
    "Quick Overview",
    "Read Aloud",
    "Stop Reading",
    "FarmX Confidence:",
    "Historical Data (Last 2 Years)",
    "Month",
    "Price/Quintal (₹)",
    "Market Status",
    "6-Month Forecast",
    "Expected Demand",
    "Price Range",
    "Oversupply Risk",
    "FarmX Recommendation",
    "Best Planting Time:",
    "Best Selling Time:",
    "Target Markets:",
    "Why This Recommendation?",
    "Data Sources:",
    "High",
    "Medium",
    "Low",
    // Market trends
    "Latest Market Insights",
    "Refresh",
    "Refresh market trends",
    "No current market trends to display.",
    "Could not load market trends. Please try again later.",
    "Previous trend",
    "Next trend",
    "Go to trend",
    // Crop doctor
    "Crop Doctor",
    "AI Pest & Disease Scanner",
    "Upload a photo of your crop to instantly identify pests and diseases.",
    "Take Photo",
    "Upload Image",
    "Remove Image",
    "Identify Issue",
    "Analyzing Image...",
    "Detected Crop",
    "Confidence Score",
    "Action Steps",
    // Seed recommender
    "Seed Variety Recommender",
    "Find the best seeds for your soil and region.",
    "Soil Type (Optional)",
    "Select soil type",
    "Find Best Seeds",
    "Finding Seeds...",
    "Best Match",
    "Alternative Option",
    "Budget Friendly",
    "Yield:",
    "Maturity:",
    "Cost:",
    "Resistance:",
    "Pro Tip:",
    // Climate map
    "Regional Climate & Terrain",
    "Current Weather",
    "Max Temp",
    "Precipitation",
    "Select a region to see weather",
    // Chat
    "FarmX Assistant",
    "Open Chat Assistant",
    "Close Chat",
    "Ask about crops, prices...",
    "Send Message",
    GREETING,
    CHAT_APOLOGY,
];

/// Every key the UI text set is translated for, in a stable order, without duplicates.
pub fn ui_texts() -> &'static [&'static str] {
    static TEXTS: OnceLock<Vec<&'static str>> = OnceLock::new();
    TEXTS.get_or_init(|| {
        let mut seen = HashSet::new();
        INTERFACE_TEXTS
            .iter()
            .chain(SUPPORTED_REGIONS)
            .chain(KARNATAKA_DISTRICTS)
            .chain(SUPPORTED_CROPS)
            .chain(SOIL_TYPES)
            .copied()
            .filter(|text| seen.insert(*text))
            .collect()
    })
}

pub fn coordinates(name: &str) -> Option<(f64, f64)> {
    REGION_COORDINATES
        .iter()
        .find(|(region, _, _)| *region == name)
        .map(|(_, lat, lng)| (*lat, *lng))
}

pub fn is_district(name: &str) -> bool {
    KARNATAKA_DISTRICTS.contains(&name)
}

/// Catalogue contents as served on `GET /catalogue`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogueView {
    pub regions: &'static [&'static str],
    pub districts: &'static [&'static str],
    pub crops: &'static [&'static str],
    pub soil_types: &'static [&'static str],
    pub languages: Vec<&'static crate::i18n::LanguageConfig>,
}

impl CatalogueView {
    pub fn new() -> Self {
        Self {
            regions: SUPPORTED_REGIONS,
            districts: KARNATAKA_DISTRICTS,
            crops: SUPPORTED_CROPS,
            soil_types: SOIL_TYPES,
            languages: crate::i18n::LanguageRegistry::get().list_enabled(),
        }
    }
}

impl Default for CatalogueView {
    fn default() -> Self {
        Self::new()
    }
}
