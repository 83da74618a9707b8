/// Time primitives
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Default)]
pub struct Time(pub f64); // seconds

impl Time {
    pub fn seconds(self) -> f64 {
        self.0
    }

    pub fn millis(self) -> f64 {
        self.0 * 1000.0
    }
}

impl std::ops::Add<f64> for Time {
    type Output = Self;

    fn add(self, dt_s: f64) -> Self::Output {
        Time(self.0 + dt_s)
    }
}
