use crate::models::cv::YearMonth;
use crate::models::user::Locale;
use crate::render::templates::{DateStyle, TemplateStyle};

const FR_MONTHS: [&str; 12] = [
    "janvier", "février", "mars", "avril", "mai", "juin", "juillet", "août", "septembre",
    "octobre", "novembre", "décembre",
];
const FR_MONTHS_SHORT: [&str; 12] = [
    "janv.", "févr.", "mars", "avr.", "mai", "juin", "juil.", "août", "sept.", "oct.", "nov.",
    "déc.",
];
const EN_MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];
const EN_MONTHS_SHORT: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub fn format_month(date: YearMonth, style: DateStyle, locale: Locale) -> String {
    let Some(month) = date.month else {
        return date.year.to_string();
    };
    let idx = (month as usize).saturating_sub(1).min(11);
    match style {
        DateStyle::Numeric => format!("{:02}.{}", month, date.year),
        DateStyle::FullMonth => {
            let names = match locale {
                Locale::Fr => &FR_MONTHS,
                Locale::En => &EN_MONTHS,
            };
            format!("{} {}", names[idx], date.year)
        }
        DateStyle::ShortMonth => {
            let names = match locale {
                Locale::Fr => &FR_MONTHS_SHORT,
                Locale::En => &EN_MONTHS_SHORT,
            };
            format!("{} {}", names[idx], date.year)
        }
    }
}

pub fn present_marker(style: &TemplateStyle, locale: Locale) -> String {
    let marker = match locale {
        Locale::Fr => "Présent",
        Locale::En => "Present",
    };
    if style.lowercase_present {
        marker.to_lowercase()
    } else {
        marker.to_string()
    }
}

/// Formats a start/end pair. A current position ends with the localized
/// present marker whatever its end date says.
pub fn format_period(
    start: Option<YearMonth>,
    end: Option<YearMonth>,
    current: bool,
    style: &TemplateStyle,
    locale: Locale,
) -> String {
    let start = start.map(|d| format_month(d, style.date_style, locale));
    let end = if current {
        Some(present_marker(style, locale))
    } else {
        end.map(|d| format_month(d, style.date_style, locale))
    };
    match (start, end) {
        (Some(s), Some(e)) => format!("{s}{}{e}", style.range_separator),
        (Some(s), None) => s,
        (None, Some(e)) => e,
        (None, None) => String::new(),
    }
}
