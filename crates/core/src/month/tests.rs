use super::*;
use time::Month;

#[test]
fn year_month_validation() {
    assert_eq!(
        YearMonth::new(2025, 0).unwrap_err(),
        YearMonthError::MonthOutOfRange
    );
    assert_eq!(
        YearMonth::new(2025, 13).unwrap_err(),
        YearMonthError::MonthOutOfRange
    );
    assert_eq!(
        YearMonth::new(0, 6).unwrap_err(),
        YearMonthError::YearOutOfRange
    );
    assert!(YearMonth::new(2025, 12).is_ok());
}

#[test]
fn ordering_is_chronological() {
    let jan = YearMonth::new(2025, 1).unwrap();
    let dec_prior = YearMonth::new(2024, 12).unwrap();
    let feb = YearMonth::new(2025, 2).unwrap();
    assert!(dec_prior < jan);
    assert!(jan < feb);
}

#[test]
fn next_and_minus_roll_across_year_ends() {
    let dec = YearMonth::new(2024, 12).unwrap();
    assert_eq!(dec.next(), YearMonth::new(2025, 1).unwrap());

    let feb = YearMonth::new(2025, 2).unwrap();
    assert_eq!(feb.minus_months(3), YearMonth::new(2024, 11).unwrap());
    assert_eq!(feb.minus_months(0), feb);
    assert_eq!(feb.minus_months(14), YearMonth::new(2023, 12).unwrap());
}

#[test]
fn months_since_is_signed() {
    let jan = YearMonth::new(2025, 1).unwrap();
    let apr = YearMonth::new(2025, 4).unwrap();
    assert_eq!(apr.months_since(jan), 3);
    assert_eq!(jan.months_since(apr), -3);
    assert_eq!(jan.months_since(jan), 0);
}

#[test]
fn month_boundaries_follow_the_calendar() {
    let feb_leap = YearMonth::new(2024, 2).unwrap();
    assert_eq!(
        feb_leap.first_day(),
        Date::from_calendar_date(2024, Month::February, 1).unwrap()
    );
    assert_eq!(
        feb_leap.last_day(),
        Date::from_calendar_date(2024, Month::February, 29).unwrap()
    );

    let feb = YearMonth::new(2025, 2).unwrap();
    assert_eq!(feb.last_day().day(), 28);

    let dec = YearMonth::new(2025, 12).unwrap();
    assert_eq!(dec.last_day().day(), 31);
}

#[test]
fn key_round_trips() {
    let ym = YearMonth::new(2025, 3).unwrap();
    assert_eq!(ym.key(), "2025-03");
    assert_eq!(YearMonth::parse("2025-03").unwrap(), ym);
    assert_eq!(
        YearMonth::parse("2025-3").unwrap(),
        YearMonth::new(2025, 3).unwrap()
    );
    assert_eq!(
        YearMonth::parse("march").unwrap_err(),
        YearMonthError::InvalidKey
    );
    assert_eq!(
        YearMonth::parse("2025-00").unwrap_err(),
        YearMonthError::MonthOutOfRange
    );
}

#[test]
fn labels_spell_out_the_month() {
    assert_eq!(YearMonth::new(2025, 3).unwrap().label(), "March 2025");
    assert_eq!(YearMonth::new(2024, 12).unwrap().label(), "December 2024");
}

#[test]
fn range_is_inclusive_and_ordered() {
    let first = YearMonth::new(2024, 11).unwrap();
    let last = YearMonth::new(2025, 2).unwrap();
    let months: Vec<String> = YearMonth::range(first, last).map(YearMonth::key).collect();
    assert_eq!(months, vec!["2024-11", "2024-12", "2025-01", "2025-02"]);

    assert_eq!(YearMonth::range(last, first).count(), 0);
    assert_eq!(YearMonth::range(first, first).count(), 1);
}

#[test]
fn minutes_render_compactly() {
    assert_eq!(format_minutes(0), "0m");
    assert_eq!(format_minutes(45), "45m");
    assert_eq!(format_minutes(60), "1h");
    assert_eq!(format_minutes(450), "7h 30m");
    assert_eq!(format_minutes(-90), "-1h 30m");
    assert_eq!(format_minutes(-60), "-1h");
}
