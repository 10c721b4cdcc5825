use time::OffsetDateTime;

use crate::metrics;
use crate::store::{NewWeightRecord, Store, StoreError, Student, WeightRecord};

/// Append a weigh-in for `student`, deriving BMI and BMR from the stored
/// height, gender and birth date at the time of the call.
pub async fn record_weigh_in(
    store: &dyn Store,
    student: &Student,
    weight: f64,
) -> Result<WeightRecord, StoreError> {
    let today = OffsetDateTime::now_utc().date();
    let age = metrics::age_on(student.birth_date, today);
    let bmi = metrics::bmi(weight, student.height);
    let bmr = metrics::bmr(&student.gender, weight, student.height, age);
    store
        .add_weight_record(NewWeightRecord {
            student_id: student.id,
            weight,
            bmi,
            bmr,
        })
        .await
}
