//! Local Climate Zone metadata: labels, names and display colours.
//!
//! Built types are numbered 1..10, natural types 101..107 (shown as A..G).

/// Display label, e.g. `LCZ 3` or `LCZ B` for 102.
pub fn label(code: i64) -> String {
    if code >= 100 {
        let letter = u32::try_from(code - 101)
            .ok()
            .and_then(|offset| char::from_u32('A' as u32 + offset))
            .filter(char::is_ascii_uppercase);
        match letter {
            Some(letter) => format!("LCZ {}", letter),
            None => format!("LCZ {}", code),
        }
    } else {
        format!("LCZ {}", code)
    }
}

/// Descriptive name of a zone.
pub fn name(code: i64) -> Option<&'static str> {
    let name = match code {
        1 => "Compact high-rise",
        2 => "Compact mid-rise",
        3 => "Compact low-rise",
        4 => "Open high-rise",
        5 => "Open mid-rise",
        6 => "Open low-rise",
        7 => "Lightweight low-rise",
        8 => "Large low-rise",
        9 => "Sparsely built",
        10 => "Heavy industry",
        101 => "Dense trees",
        102 => "Scattered trees",
        103 => "Bush, scrub",
        104 => "Low plants",
        105 => "Bare rock or paved",
        106 => "Bare soil or sand",
        107 => "Water",
        _ => return None,
    };
    Some(name)
}

/// Standard display colour of a zone as `#rrggbb`.
pub fn color_hex(code: i64) -> Option<&'static str> {
    let color = match code {
        1 => "#8b0101",
        2 => "#cc0200",
        3 => "#fc0001",
        4 => "#be4c03",
        5 => "#ff6602",
        6 => "#ff9856",
        7 => "#fbed08",
        8 => "#bcbcba",
        9 => "#ffcca7",
        10 => "#57555a",
        101 => "#006700",
        102 => "#05aa05",
        103 => "#648423",
        104 => "#bbdb7a",
        105 => "#010101",
        106 => "#fdf6ae",
        107 => "#6d67fd",
        _ => return None,
    };
    Some(color)
}

/// Colour for unclassified values.
pub const UNCLASSIFIED_HEX: &str = "#cccccc";

/// Fine-grained colour ramp for a single ICU temperature delta (°C).
pub fn icu_color_hex(delta: Option<f64>) -> &'static str {
    const RAMP: [(f64, &str); 10] = [
        (-2.0, "#313695"),
        (-1.0, "#4575b4"),
        (-0.5, "#74add1"),
        (0.0, "#abd9e9"),
        (0.5, "#e0f3f8"),
        (1.0, "#ffffbf"),
        (1.5, "#fee090"),
        (2.0, "#fdae61"),
        (3.0, "#f46d43"),
        (4.0, "#d73027"),
    ];

    let Some(delta) = delta else {
        return UNCLASSIFIED_HEX;
    };

    RAMP.iter()
        .find(|(limit, _)| delta < *limit)
        .map_or("#a50026", |&(_, color)| color)
}

/// Parses `#rrggbb` into RGB components.
pub fn parse_hex(hex: &str) -> Option<[u8; 3]> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}
