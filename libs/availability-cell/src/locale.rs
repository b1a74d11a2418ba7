use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Display locale for every user-facing string the cell produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    #[default]
    Vietnamese,
    English,
}

impl Locale {
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "vi" | "vi-vn" | "vietnamese" => Locale::Vietnamese,
            "en" | "en-us" | "en-gb" | "english" => Locale::English,
            other => {
                warn!("Unknown display locale {:?}, falling back to Vietnamese", other);
                Locale::Vietnamese
            }
        }
    }

    pub fn today_label(self) -> &'static str {
        match self {
            Locale::Vietnamese => "Hôm Nay",
            Locale::English => "Today",
        }
    }

    pub fn tomorrow_label(self) -> &'static str {
        match self {
            Locale::Vietnamese => "Ngày Mai",
            Locale::English => "Tomorrow",
        }
    }

    pub fn weekday_label(self, weekday: Weekday) -> &'static str {
        match (self, weekday) {
            (Locale::Vietnamese, Weekday::Sun) => "CN",
            (Locale::Vietnamese, Weekday::Mon) => "T2",
            (Locale::Vietnamese, Weekday::Tue) => "T3",
            (Locale::Vietnamese, Weekday::Wed) => "T4",
            (Locale::Vietnamese, Weekday::Thu) => "T5",
            (Locale::Vietnamese, Weekday::Fri) => "T6",
            (Locale::Vietnamese, Weekday::Sat) => "T7",
            (Locale::English, Weekday::Sun) => "Sun",
            (Locale::English, Weekday::Mon) => "Mon",
            (Locale::English, Weekday::Tue) => "Tue",
            (Locale::English, Weekday::Wed) => "Wed",
            (Locale::English, Weekday::Thu) => "Thu",
            (Locale::English, Weekday::Fri) => "Fri",
            (Locale::English, Weekday::Sat) => "Sat",
        }
    }

    pub fn date_label(self, date: NaiveDate) -> String {
        match self {
            Locale::Vietnamese => date.format("%d/%m").to_string(),
            Locale::English => date.format("%m/%d").to_string(),
        }
    }

    pub fn unnamed_doctor(self) -> &'static str {
        match self {
            Locale::Vietnamese => "Bác sĩ chưa có tên",
            Locale::English => "Unnamed doctor",
        }
    }

    pub fn general_specialty(self) -> &'static str {
        match self {
            Locale::Vietnamese => "Đa khoa",
            Locale::English => "General practice",
        }
    }

    pub fn contact_for_price(self) -> &'static str {
        match self {
            Locale::Vietnamese => "Liên hệ",
            Locale::English => "Contact us",
        }
    }

    /// VND has no minor unit, so amounts are rounded to whole dong.
    pub fn format_vnd(self, amount: f64) -> String {
        let rounded = amount.round();
        let sign = if rounded < 0.0 { "-" } else { "" };
        let digits = format!("{}", rounded.abs() as u64);

        let separator = match self {
            Locale::Vietnamese => '.',
            Locale::English => ',',
        };
        let grouped = group_thousands(&digits, separator);

        match self {
            Locale::Vietnamese => format!("{}{}\u{a0}₫", sign, grouped),
            Locale::English => format!("{}₫{}", sign, grouped),
        }
    }
}

fn group_thousands(digits: &str, separator: char) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(ch);
    }
    grouped
}
