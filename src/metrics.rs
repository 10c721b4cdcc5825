use time::Date;

/// Whole years between `birth_date` and `today`, one less when the
/// birthday has not yet come around this year.
pub fn age_on(birth_date: Date, today: Date) -> i32 {
    let birthday_passed = (u8::from(today.month()), today.day())
        >= (u8::from(birth_date.month()), birth_date.day());
    today.year() - birth_date.year() - if birthday_passed { 0 } else { 1 }
}

/// Body Mass Index: weight (kg) over squared height (m), rounded to 2 decimals.
pub fn bmi(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    round_to(weight_kg / (height_m * height_m), 2)
}

/// Basal Metabolic Rate via Mifflin-St Jeor, rounded to the nearest integer.
/// Gender is free text; anything that is not "male" (case-insensitive) gets
/// the female offset.
pub fn bmr(gender: &str, weight_kg: f64, height_cm: f64, age_years: i32) -> f64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * age_years as f64;
    let offset = if gender.eq_ignore_ascii_case("male") {
        5.0
    } else {
        -161.0
    };
    (base + offset).round()
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn age_decrements_before_birthday() {
        let bd = date!(2000 - 06 - 15);
        assert_eq!(age_on(bd, date!(2024 - 06 - 14)), 23);
        assert_eq!(age_on(bd, date!(2024 - 06 - 15)), 24);
        assert_eq!(age_on(bd, date!(2024 - 06 - 16)), 24);
    }

    #[test]
    fn age_handles_month_boundary() {
        let bd = date!(1990 - 12 - 31);
        assert_eq!(age_on(bd, date!(2020 - 12 - 30)), 29);
        assert_eq!(age_on(bd, date!(2020 - 12 - 31)), 30);
        assert_eq!(age_on(bd, date!(2021 - 01 - 01)), 30);
    }

    #[test]
    fn bmi_rounds_to_two_decimals() {
        assert_eq!(bmi(70.0, 175.0), 22.86);
        assert_eq!(bmi(65.0, 170.0), 22.49);
    }

    #[test]
    fn bmi_of_zero_weight_is_zero() {
        assert_eq!(bmi(0.0, 175.0), 0.0);
    }

    #[test]
    fn bmr_male_offset() {
        // 700 + 1093.75 - 125 + 5 = 1673.75 -> 1674
        assert_eq!(bmr("Male", 70.0, 175.0, 25), 1674.0);
        assert_eq!(bmr("MALE", 70.0, 175.0, 25), 1674.0);
    }

    #[test]
    fn bmr_female_offset_for_everything_else() {
        // 700 + 1093.75 - 125 - 161 = 1507.75 -> 1508
        assert_eq!(bmr("female", 70.0, 175.0, 25), 1508.0);
        assert_eq!(bmr("other", 70.0, 175.0, 25), 1508.0);
    }
}
