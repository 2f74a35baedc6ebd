//! Flag state lookup from the Maritime Identification Digits (the first three
//! digits of a ship station MMSI).

/// Country for the MID prefix of `mmsi`, or `None` when the prefix is not a
/// ship-station MID we know about.
pub fn flag_for_mmsi(mmsi: &str) -> Option<&'static str> {
    let mid: u16 = mmsi.get(..3)?.parse().ok()?;
    country_for_mid(mid)
}

fn country_for_mid(mid: u16) -> Option<&'static str> {
    let country = match mid {
        201 => "Albania",
        202 => "Andorra",
        203 => "Austria",
        204 | 255 | 263 => "Portugal",
        205 => "Belgium",
        206 => "Belarus",
        207 => "Bulgaria",
        208 => "Vatican City",
        209 | 210 | 212 => "Cyprus",
        211 | 218 => "Germany",
        213 => "Georgia",
        214 => "Moldova",
        215 | 229 | 248 | 249 | 256 => "Malta",
        216 => "Armenia",
        219 | 220 => "Denmark",
        224 | 225 => "Spain",
        226..=228 => "France",
        230 => "Finland",
        231 => "Faroe Islands",
        232..=235 => "United Kingdom",
        236 => "Gibraltar",
        237 | 239..=241 => "Greece",
        238 => "Croatia",
        242 => "Morocco",
        243 => "Hungary",
        244..=246 => "Netherlands",
        247 => "Italy",
        250 => "Ireland",
        251 => "Iceland",
        252 => "Liechtenstein",
        253 => "Luxembourg",
        254 => "Monaco",
        257..=259 => "Norway",
        261 => "Poland",
        262 => "Montenegro",
        264 => "Romania",
        265 | 266 => "Sweden",
        267 => "Slovakia",
        268 => "San Marino",
        269 => "Switzerland",
        270 => "Czech Republic",
        271 => "Turkey",
        272 => "Ukraine",
        273 => "Russia",
        274 => "North Macedonia",
        275 => "Latvia",
        276 => "Estonia",
        277 => "Lithuania",
        278 => "Slovenia",
        279 => "Serbia",
        303 | 338 | 366..=369 => "United States",
        304 | 305 => "Antigua and Barbuda",
        308..=311 => "Bahamas",
        314 => "Barbados",
        316 => "Canada",
        341 => "Saint Kitts and Nevis",
        345 => "Mexico",
        351..=357 | 370..=373 => "Panama",
        375..=377 => "Saint Vincent and the Grenadines",
        403 => "Saudi Arabia",
        412..=414 => "China",
        416 => "Taiwan",
        419 => "India",
        422 => "Iran",
        428 => "Israel",
        431 | 432 => "Japan",
        440 | 441 => "South Korea",
        445 => "North Korea",
        470 => "United Arab Emirates",
        477 => "Hong Kong",
        503 => "Australia",
        512 => "New Zealand",
        525 => "Indonesia",
        533 => "Malaysia",
        538 => "Marshall Islands",
        548 => "Philippines",
        563..=566 => "Singapore",
        574 => "Vietnam",
        601 => "South Africa",
        622 => "Egypt",
        636 | 637 => "Liberia",
        701 => "Argentina",
        710 => "Brazil",
        725 => "Chile",
        730 => "Colombia",
        _ => return None,
    };
    Some(country)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_prefixes() {
        assert_eq!(flag_for_mmsi("219005000"), Some("Denmark"));
        assert_eq!(flag_for_mmsi("265547250"), Some("Sweden"));
        assert_eq!(flag_for_mmsi("636019825"), Some("Liberia"));
        assert_eq!(flag_for_mmsi("305484000"), Some("Antigua and Barbuda"));
    }

    #[test]
    fn test_unmapped_prefix_leaves_flag_unset() {
        assert_eq!(flag_for_mmsi("123456789"), None);
        assert_eq!(flag_for_mmsi("99"), None);
        assert_eq!(flag_for_mmsi("abc456789"), None);
    }
}
