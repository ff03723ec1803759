use chrono::NaiveDate;

/// Display number for a new order: `R-{YYMMDD}-{seq}`.
///
/// `seq` starts at `existing_orders + 1`, zero-padded to three digits. When
/// that number is already taken (after deletions) `seq` keeps increasing until
/// `is_taken` reports a free one.
pub fn generate_number(
    date: NaiveDate,
    existing_orders: usize,
    is_taken: impl Fn(&str) -> bool,
) -> String {
    let prefix = date.format("%y%m%d");
    let mut seq = existing_orders + 1;
    loop {
        let number = format!("R-{prefix}-{seq:03}");
        if !is_taken(&number) {
            return number;
        }
        seq += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feb_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
    }

    #[test]
    fn first_order_of_the_day() {
        assert_eq!(generate_number(feb_first(), 0, |_| false), "R-240201-001");
    }

    #[test]
    fn sequence_follows_collection_size() {
        assert_eq!(generate_number(feb_first(), 41, |_| false), "R-240201-042");
        assert_eq!(generate_number(feb_first(), 1234, |_| false), "R-240201-1235");
    }

    #[test]
    fn skips_numbers_already_in_use() {
        let taken = ["R-240201-002", "R-240201-003"];
        let number = generate_number(feb_first(), 1, |n| taken.contains(&n));
        assert_eq!(number, "R-240201-004");
    }
}
