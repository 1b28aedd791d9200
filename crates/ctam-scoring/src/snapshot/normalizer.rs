use crate::scoring::domain::ItemStatus;

pub(crate) fn clean_text(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lower-cased status key with spaces and dashes folded to underscores.
pub(crate) fn status_key(value: &str) -> String {
    clean_text(value)
        .to_lowercase()
        .replace([' ', '-'], "_")
}

pub(crate) fn item_status(value: &str) -> Option<ItemStatus> {
    match status_key(value).as_str() {
        "pass" | "passed" | "ผ่าน" => Some(ItemStatus::Pass),
        "partial" | "partially_passed" | "ผ่านบางส่วน" => Some(ItemStatus::Partial),
        "fail" | "failed" | "ไม่ผ่าน" => Some(ItemStatus::Fail),
        _ => None,
    }
}

pub(crate) fn flag(value: &str) -> Option<bool> {
    match status_key(value).as_str() {
        "" | "false" | "f" | "0" | "no" | "n" => Some(false),
        "true" | "t" | "1" | "yes" | "y" => Some(true),
        _ => None,
    }
}
