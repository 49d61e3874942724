//! Ordering of dotted version strings.
//!
//! Versions are split into items at `.`, `_` and `+`. A `-` or a switch
//! between digits and letters opens a nested sub-list, so `1.0-rc1` reads as
//! `[1, 0, [rc, [1]]]`. Null items (`0`, release qualifiers, empty lists) are
//! trimmed from the end of every list, which makes `1.0 == 1.0.0` and
//! `1.0-SNAPSHOT == 1.0.0-SNAPSHOT`. Numeric items compare by value,
//! qualifiers by their well-known rank, and `9 < 10`, `1.0-SNAPSHOT < 1.0`.

use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Item {
    /// Digits without leading zeros (`"0"` for zero)
    Number(String),
    /// Lowercased qualifier text
    Qualifier(String),
    /// Everything after a `-` or a digit/letter switch
    List(Vec<Item>),
}

const RELEASE_RANK: u8 = 5;

impl Item {
    fn number(digits: &str) -> Self {
        let trimmed = digits.trim_start_matches('0');
        if trimmed.is_empty() {
            Item::Number("0".to_string())
        } else {
            Item::Number(trimmed.to_string())
        }
    }

    /// Items equivalent to an absent trailing item.
    fn is_null(&self) -> bool {
        match self {
            Item::Number(digits) => digits == "0",
            Item::Qualifier(text) => qualifier_rank(text) == RELEASE_RANK,
            Item::List(items) => items.is_empty(),
        }
    }
}

fn qualifier_rank(text: &str) -> u8 {
    match text {
        "alpha" | "a" => 0,
        "beta" | "b" => 1,
        "milestone" | "m" => 2,
        "rc" | "cr" => 3,
        "snapshot" => 4,
        "" | "ga" | "final" | "release" => RELEASE_RANK,
        "sp" => 6,
        _ => 7,
    }
}

/// Drop trailing null items, looking through nested lists that are not null.
fn normalize(items: &mut Vec<Item>) {
    let mut idx = items.len();
    while idx > 0 {
        idx -= 1;
        if items[idx].is_null() {
            items.remove(idx);
        } else if !matches!(items[idx], Item::List(_)) {
            break;
        }
    }
}

fn flush(current: &mut String, digits: bool, list: &mut Vec<Item>) {
    if current.is_empty() {
        return;
    }
    if digits {
        list.push(Item::number(current));
    } else {
        list.push(Item::Qualifier(current.clone()));
    }
    current.clear();
}

fn tokenize(version: &str) -> Vec<Item> {
    // Each nested list is the last element of the one below it
    let mut stack: Vec<Vec<Item>> = vec![Vec::new()];
    let mut current = String::new();
    let mut digits = false;

    for ch in version.trim().chars() {
        match ch {
            '.' | '_' | '+' => {
                if let Some(list) = stack.last_mut() {
                    flush(&mut current, digits, list);
                }
            }
            '-' => {
                if let Some(list) = stack.last_mut() {
                    flush(&mut current, digits, list);
                }
                stack.push(Vec::new());
            }
            _ => {
                let is_digit = ch.is_ascii_digit();
                if !current.is_empty() && is_digit != digits {
                    if let Some(list) = stack.last_mut() {
                        flush(&mut current, digits, list);
                    }
                    stack.push(Vec::new());
                }
                digits = is_digit;
                current.push(ch.to_ascii_lowercase());
            }
        }
    }
    if let Some(list) = stack.last_mut() {
        flush(&mut current, digits, list);
    }

    let mut items = Vec::new();
    while let Some(mut list) = stack.pop() {
        if !items.is_empty() {
            list.push(Item::List(items));
        }
        normalize(&mut list);
        items = list;
    }
    items
}

fn compare_numbers(left: &str, right: &str) -> Ordering {
    left.len().cmp(&right.len()).then_with(|| left.cmp(right))
}

fn compare_qualifiers(left: &str, right: &str) -> Ordering {
    qualifier_rank(left)
        .cmp(&qualifier_rank(right))
        .then_with(|| left.cmp(right))
}

fn compare_lists(left: &[Item], right: &[Item]) -> Ordering {
    let len = left.len().max(right.len());
    (0..len)
        .map(|idx| compare_items(left.get(idx), right.get(idx)))
        .find(|ordering| *ordering != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

fn compare_items(left: Option<&Item>, right: Option<&Item>) -> Ordering {
    match (left, right) {
        (None, None) => Ordering::Equal,
        (Some(Item::Number(l)), Some(Item::Number(r))) => compare_numbers(l, r),
        (Some(Item::Qualifier(l)), Some(Item::Qualifier(r))) => compare_qualifiers(l, r),
        (Some(Item::List(l)), Some(Item::List(r))) => compare_lists(l, r),
        (Some(Item::Number(_)), Some(_)) => Ordering::Greater,
        (Some(_), Some(Item::Number(_))) => Ordering::Less,
        (Some(Item::List(_)), Some(Item::Qualifier(_))) => Ordering::Greater,
        (Some(Item::Qualifier(_)), Some(Item::List(_))) => Ordering::Less,
        (Some(item), None) => compare_with_absent(item),
        (None, Some(item)) => compare_with_absent(item).reverse(),
    }
}

fn compare_with_absent(item: &Item) -> Ordering {
    match item {
        Item::Number(digits) => compare_numbers(digits, "0"),
        Item::Qualifier(text) => compare_qualifiers(text, ""),
        Item::List(items) => compare_items(items.first(), None),
    }
}

/// Componentwise comparison of two version strings.
pub fn compare_versions(left: &str, right: &str) -> Ordering {
    compare_lists(&tokenize(left), &tokenize(right))
}
