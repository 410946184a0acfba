//! Thai reading of baht amounts, printed under the grand total of every document.

const DIGITS: [&str; 10] = ["ศูนย์", "หนึ่ง", "สอง", "สาม", "สี่", "ห้า", "หก", "เจ็ด", "แปด", "เก้า"];
const POSITIONS: [&str; 6] = ["", "สิบ", "ร้อย", "พัน", "หมื่น", "แสน"];

pub const UNREADABLE: &str = "ไม่สามารถแปลงได้";

/// Reads up to six digits. `after_higher` says whether a non-zero digit
/// precedes this group, which turns a trailing one into "เอ็ด".
fn read_group(digits: &[u8], after_higher: bool) -> String {
    let len = digits.len();
    let mut out = String::new();
    let mut seen_nonzero = after_higher;
    for (i, &digit) in digits.iter().enumerate() {
        let position = len - i - 1;
        if digit == 0 {
            continue;
        }
        let word = match (position, digit) {
            (0, 1) if seen_nonzero => "เอ็ด",
            (1, 2) => "ยี่",
            (1, 1) => "",
            _ => DIGITS[digit as usize],
        };
        out.push_str(word);
        out.push_str(POSITIONS[position]);
        seen_nonzero = true;
    }
    out
}

fn read_integer(value: u64) -> String {
    let digits: Vec<u8> = value.to_string().bytes().map(|b| b - b'0').collect();
    // split into millions from the right, most significant first
    let mut groups: Vec<&[u8]> = digits.rchunks(6).collect();
    groups.reverse();

    let mut out = String::new();
    let mut seen_nonzero = false;
    let last = groups.len() - 1;
    for (i, group) in groups.iter().enumerate() {
        out.push_str(&read_group(group, seen_nonzero));
        seen_nonzero |= group.iter().any(|&d| d != 0);
        if i < last {
            out.push_str("ล้าน");
        }
    }
    out
}

/// Thai text for a baht amount, e.g. `1200.0` -> "หนึ่งพันสองร้อยบาทถ้วน".
pub fn baht_text(amount: f64) -> String {
    if !amount.is_finite() {
        return UNREADABLE.to_string();
    }
    let cents = (amount.abs() * 100.0).round() as u64;
    let baht = cents / 100;
    let satang = cents % 100;

    let mut out = String::new();
    if amount < 0.0 && cents > 0 {
        out.push_str("ลบ");
    }
    if baht == 0 {
        out.push_str("ศูนย์บาท");
    } else {
        out.push_str(&read_integer(baht));
        out.push_str("บาท");
    }
    if satang == 0 {
        out.push_str("ถ้วน");
    } else {
        let digits = [(satang / 10) as u8, (satang % 10) as u8];
        out.push_str(&read_group(&digits, false));
        out.push_str("สตางค์");
    }
    out
}
