// Sightseeing suggestions for the destination cities, shown from the console menu.

use crate::reference::City;

pub fn recommendations(city: City) -> &'static [&'static str] {
    match city {
        City::Beijing => &[
            "Forbidden City Museum",
            "Badaling Great Wall",
            "Tiananmen Square",
            "Summer Palace",
        ],
        City::Shanghai => &[
            "The Bund",
            "Shanghai Disneyland",
            "Shanghai Wildlife Park",
            "Oriental Pearl Tower",
        ],
        City::Guangzhou => &[
            "Shamian Street",
            "Baiyun Mountain",
            "White Goose Pool",
            "Pearl River Night Cruise",
        ],
        City::Nanjing => &[
            "Dr. Sun Yat-sen's Mausoleum",
            "Qinhuai River",
            "Ming Xiaoling Mausoleum",
            "Confucius Temple",
        ],
        City::Shenzhen => &[
            "Lianhua Mountain Park",
            "Shenzhen Bay Park",
            "Happy Valley",
            "Window of the World",
        ],
        City::Chengdu => &[
            "Dujiangyan Irrigation System",
            "Mount Qingcheng",
            "Jinli Ancient Street",
            "Chunxi Road",
        ],
        City::Wuhan => &[
            "Yellow Crane Tower",
            "East Lake Greenway",
            "Hubei Provincial Museum",
            "Chu River Han Street",
        ],
        City::Wuxi => &[
            "Taihu Lake",
            "Li Garden",
            "Lingshan Grand Buddha",
            "Three Kingdoms City",
        ],
    }
}

// Cities that have a guide entry, in menu order
pub fn cities() -> &'static [City] {
    &City::ALL
}

pub fn render_guide(city: City) -> String {
    let mut out = format!("Recommended attractions in {}:\n", city);
    for (i, spot) in recommendations(city).iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", i + 1, spot));
    }
    out
}
