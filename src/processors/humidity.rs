use crate::models::ObservationTable;

const MAGNUS_B: f64 = 17.625;
const MAGNUS_C: f64 = 243.04;

/// Relative humidity in percent from air temperature and dew point (°C),
/// rounded to one decimal. Null when either input is null.
pub fn relative_humidity(temperature: Option<f64>, dew_point: Option<f64>) -> Option<f64> {
    let (t, td) = (temperature?, dew_point?);
    let rh = 100.0 * (MAGNUS_B * td / (MAGNUS_C + td)).exp() / (MAGNUS_B * t / (MAGNUS_C + t)).exp();
    rh.is_finite().then(|| (rh * 10.0).round() / 10.0)
}

/// Fill the `rh` column of every row and add it to the schema
pub fn add_relative_humidity(table: &mut ObservationTable) {
    for row in table.rows_mut() {
        row.rh = relative_humidity(row.temp, row.dew_point);
    }
    table.set_includes_rh(true);
}
