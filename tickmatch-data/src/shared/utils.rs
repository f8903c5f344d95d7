// Round to a fixed number of decimal places, half away from zero.
pub fn round_dp(value: f64, places: u32) -> f64 {
    let scaling_factor = 10f64.powi(places as i32);
    (value * scaling_factor).round() / scaling_factor
}
