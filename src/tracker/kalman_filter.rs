//! Constant-velocity Kalman filter over `[cx, cy, s, r, vx, vy, vs]`.
//!
//! The measurement is `[cx, cy, s, r]` (center, area, aspect ratio); the aspect
//! ratio is assumed constant so it carries no velocity term.

use nalgebra::{SMatrix, SVector};

pub type StateMean = SVector<f64, 7>;
pub type StateCovariance = SMatrix<f64, 7, 7>;
pub type Measurement = SVector<f64, 4>;

#[derive(Debug, Clone)]
pub struct KalmanFilter {
    motion_mat: SMatrix<f64, 7, 7>,
    update_mat: SMatrix<f64, 4, 7>,
    process_noise: SMatrix<f64, 7, 7>,
    measurement_noise: SMatrix<f64, 4, 4>,
    initial_covariance: StateCovariance,
}

impl Default for KalmanFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl KalmanFilter {
    pub fn new() -> Self {
        let mut motion_mat = SMatrix::<f64, 7, 7>::identity();
        for i in 0..3 {
            motion_mat[(i, 4 + i)] = 1.0;
        }

        let mut update_mat = SMatrix::<f64, 4, 7>::zeros();
        for i in 0..4 {
            update_mat[(i, i)] = 1.0;
        }

        let mut measurement_noise = SMatrix::<f64, 4, 4>::identity();
        measurement_noise[(2, 2)] = 10.0;
        measurement_noise[(3, 3)] = 10.0;

        // Unobserved velocities start out very uncertain.
        let mut initial_covariance = StateCovariance::identity();
        for i in 4..7 {
            initial_covariance[(i, i)] = 1000.0;
        }
        initial_covariance *= 10.0;

        let mut process_noise = SMatrix::<f64, 7, 7>::identity();
        for i in 4..7 {
            process_noise[(i, i)] = 0.01;
        }
        process_noise[(6, 6)] *= 0.01;

        Self {
            motion_mat,
            update_mat,
            process_noise,
            measurement_noise,
            initial_covariance,
        }
    }

    /// Create the initial state from an unassociated measurement.
    pub fn initiate(&self, measurement: [f64; 4]) -> (StateMean, StateCovariance) {
        let mut mean = StateMean::zeros();
        for (i, value) in measurement.iter().enumerate() {
            mean[i] = *value;
        }
        (mean, self.initial_covariance)
    }

    /// Advance the state one frame using the motion model only.
    pub fn predict(
        &self,
        mean: &StateMean,
        covariance: &StateCovariance,
    ) -> (StateMean, StateCovariance) {
        let mut mean = *mean;
        // Area cannot shrink below zero.
        if mean[6] + mean[2] <= 0.0 {
            mean[6] = 0.0;
        }

        let new_mean = self.motion_mat * mean;
        let new_covariance =
            self.motion_mat * covariance * self.motion_mat.transpose() + self.process_noise;

        (new_mean, new_covariance)
    }

    /// Project the state distribution into measurement space.
    pub fn project(
        &self,
        mean: &StateMean,
        covariance: &StateCovariance,
    ) -> (Measurement, SMatrix<f64, 4, 4>) {
        let projected_mean = self.update_mat * mean;
        let projected_cov =
            self.update_mat * covariance * self.update_mat.transpose() + self.measurement_noise;
        (projected_mean, projected_cov)
    }

    /// Correct the state with a measurement.
    ///
    /// Returns `None` if the innovation covariance is singular, in which case
    /// the caller keeps its predicted state.
    pub fn update(
        &self,
        mean: &StateMean,
        covariance: &StateCovariance,
        measurement: [f64; 4],
    ) -> Option<(StateMean, StateCovariance)> {
        let (projected_mean, projected_cov) = self.project(mean, covariance);
        let s_inv = projected_cov.try_inverse()?;

        let innovation = Measurement::from_column_slice(&measurement) - projected_mean;
        let kalman_gain = covariance * self.update_mat.transpose() * s_inv; // 7x4

        let new_mean = mean + kalman_gain * innovation;

        // Joseph form keeps the covariance symmetric positive definite.
        let i_kh = StateCovariance::identity() - kalman_gain * self.update_mat;
        let new_covariance = i_kh * covariance * i_kh.transpose()
            + kalman_gain * self.measurement_noise * kalman_gain.transpose();

        Some((new_mean, new_covariance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_initiate() {
        let kf = KalmanFilter::new();
        let (mean, cov) = kf.initiate([100.0, 200.0, 2500.0, 0.5]);
        assert_eq!(mean[0], 100.0);
        assert_eq!(mean[3], 0.5);
        assert_eq!(mean[4], 0.0);
        assert_relative_eq!(cov[(0, 0)], 10.0);
        assert_relative_eq!(cov[(5, 5)], 10_000.0);
    }

    #[test]
    fn test_predict_moves_by_velocity() {
        let kf = KalmanFilter::new();
        let (mut mean, cov) = kf.initiate([100.0, 100.0, 400.0, 1.0]);
        mean[4] = 10.0;
        mean[5] = -5.0;

        let (predicted, predicted_cov) = kf.predict(&mean, &cov);
        assert_relative_eq!(predicted[0], 110.0);
        assert_relative_eq!(predicted[1], 95.0);
        assert_relative_eq!(predicted[2], 400.0);
        assert_relative_eq!(predicted[3], 1.0);

        // Uncertainty grows without a measurement.
        assert!(predicted_cov.trace() > cov.trace());
    }

    #[test]
    fn test_predict_clamps_shrinking_scale() {
        let kf = KalmanFilter::new();
        let (mut mean, cov) = kf.initiate([0.0, 0.0, 10.0, 1.0]);
        mean[6] = -20.0;
        let (predicted, _) = kf.predict(&mean, &cov);
        assert_eq!(predicted[6], 0.0);
        assert_relative_eq!(predicted[2], 10.0);
    }

    #[test]
    fn test_update_pulls_toward_measurement() {
        let kf = KalmanFilter::new();
        let (mean, cov) = kf.initiate([100.0, 100.0, 400.0, 1.0]);
        let (mean, cov) = kf.predict(&mean, &cov);

        let (updated, updated_cov) = kf.update(&mean, &cov, [110.0, 104.0, 420.0, 1.0]).unwrap();
        assert!(updated[0] > 100.0 && updated[0] < 110.0);
        assert!(updated[1] > 100.0 && updated[1] < 104.0);
        assert!(updated[2] > 400.0 && updated[2] < 420.0);

        // Uncertainty shrinks after a measurement.
        assert!(updated_cov.trace() < cov.trace());
    }

    #[test]
    fn test_velocity_is_learned() {
        let kf = KalmanFilter::new();
        let (mut mean, mut cov) = kf.initiate([0.0, 0.0, 100.0, 1.0]);
        for step in 1..=20 {
            (mean, cov) = kf.predict(&mean, &cov);
            (mean, cov) = kf.update(&mean, &cov, [5.0 * step as f64, 0.0, 100.0, 1.0]).unwrap();
        }
        assert_relative_eq!(mean[4], 5.0, epsilon = 0.5);
        let (predicted, _) = kf.predict(&mean, &cov);
        assert_relative_eq!(predicted[0], 105.0, epsilon = 1.0);
    }
}
